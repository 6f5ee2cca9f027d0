//! State Machine Runtime
//!
//! Typed state machines for interaction phases. A state type declares its own
//! transition table through [`StateTransitions`]; [`StateMachine`] adds
//! entry/exit actions and a bounded transition history on top.
//!
//! ```rust
//! use headtab_core::fsm::{StateMachine, StateTransitions};
//!
//! #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
//! enum Door { Open, Closed }
//!
//! #[derive(Clone, Copy, Debug)]
//! enum Push { Open, Close }
//!
//! impl StateTransitions for Door {
//!     type Event = Push;
//!     fn on_event(&self, event: Push) -> Option<Self> {
//!         match (self, event) {
//!             (Door::Closed, Push::Open) => Some(Door::Open),
//!             (Door::Open, Push::Close) => Some(Door::Closed),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let mut door = StateMachine::new(Door::Closed);
//! assert_eq!(door.send(Push::Open), Some(Door::Open));
//! assert_eq!(door.send(Push::Open), None);
//! ```

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt::Debug;
use std::hash::Hash;

/// Maximum number of transitions kept in the history
const HISTORY_LIMIT: usize = 64;

/// A state type with a transition table
pub trait StateTransitions:
    Clone + Copy + PartialEq + Eq + Hash + Send + Sync + Debug + 'static
{
    /// Events this machine reacts to
    type Event: Copy + Debug + Send;

    /// Handle an event and return the new state, or None if no transition
    fn on_event(&self, event: Self::Event) -> Option<Self>;
}

/// An action run on entering or leaving a state
pub type Action<S> = Box<dyn FnMut(S) + Send>;

/// A state machine instance
pub struct StateMachine<S: StateTransitions> {
    current: S,
    entry_callbacks: FxHashMap<S, SmallVec<[Action<S>; 1]>>,
    exit_callbacks: FxHashMap<S, SmallVec<[Action<S>; 1]>>,
    /// History of state transitions (for debugging)
    history: Vec<(S, S::Event, S)>,
}

impl<S: StateTransitions> StateMachine<S> {
    pub fn new(initial: S) -> Self {
        Self {
            current: initial,
            entry_callbacks: FxHashMap::default(),
            exit_callbacks: FxHashMap::default(),
            history: Vec::new(),
        }
    }

    /// Get the current state
    pub fn current(&self) -> S {
        self.current
    }

    /// Check if we're in a specific state
    pub fn is_in(&self, state: S) -> bool {
        self.current == state
    }

    /// Check if an event can trigger a transition from the current state
    pub fn can_send(&self, event: S::Event) -> bool {
        self.current.on_event(event).is_some()
    }

    /// Send an event. Returns the new state if a transition happened.
    ///
    /// Exit actions of the old state run before entry actions of the new one;
    /// both receive the state on the other side of the transition.
    pub fn send(&mut self, event: S::Event) -> Option<S> {
        let from = self.current;
        let Some(to) = from.on_event(event) else {
            tracing::trace!(state = ?from, ?event, "event ignored");
            return None;
        };
        tracing::trace!(?from, ?event, ?to, "transition");

        if let Some(callbacks) = self.exit_callbacks.get_mut(&from) {
            for callback in callbacks.iter_mut() {
                callback(to);
            }
        }

        self.current = to;
        if self.history.len() == HISTORY_LIMIT {
            self.history.remove(0);
        }
        self.history.push((from, event, to));

        if let Some(callbacks) = self.entry_callbacks.get_mut(&to) {
            for callback in callbacks.iter_mut() {
                callback(from);
            }
        }

        Some(to)
    }

    /// Register an entry callback for a state; it receives the previous state
    pub fn on_enter<F: FnMut(S) + Send + 'static>(&mut self, state: S, callback: F) {
        self.entry_callbacks
            .entry(state)
            .or_default()
            .push(Box::new(callback));
    }

    /// Register an exit callback for a state; it receives the next state
    pub fn on_exit<F: FnMut(S) + Send + 'static>(&mut self, state: S, callback: F) {
        self.exit_callbacks
            .entry(state)
            .or_default()
            .push(Box::new(callback));
    }

    /// Get transition history
    pub fn history(&self) -> &[(S, S::Event, S)] {
        &self.history
    }

    /// Clear transition history
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

impl<S: StateTransitions + Default> Default for StateMachine<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    enum Touch {
        #[default]
        Idle,
        Tracking,
        Dragging,
    }

    #[derive(Clone, Copy, Debug)]
    enum Input {
        Down,
        Move,
        Up,
    }

    impl StateTransitions for Touch {
        type Event = Input;

        fn on_event(&self, event: Input) -> Option<Self> {
            match (self, event) {
                (Touch::Idle, Input::Down) => Some(Touch::Tracking),
                (Touch::Tracking, Input::Move) => Some(Touch::Dragging),
                (Touch::Tracking | Touch::Dragging, Input::Up) => Some(Touch::Idle),
                _ => None,
            }
        }
    }

    #[test]
    fn test_simple_transitions() {
        let mut fsm = StateMachine::<Touch>::default();

        assert_eq!(fsm.send(Input::Down), Some(Touch::Tracking));
        assert_eq!(fsm.send(Input::Move), Some(Touch::Dragging));
        assert_eq!(fsm.send(Input::Up), Some(Touch::Idle));
        assert!(fsm.is_in(Touch::Idle));
    }

    #[test]
    fn test_invalid_event_no_transition() {
        let mut fsm = StateMachine::new(Touch::Idle);

        assert_eq!(fsm.send(Input::Move), None);
        assert_eq!(fsm.current(), Touch::Idle);
        assert!(fsm.history().is_empty());
    }

    #[test]
    fn test_entry_exit_callbacks() {
        let entered_from = Arc::new(Mutex::new(Vec::new()));
        let exited_to = Arc::new(Mutex::new(Vec::new()));

        let mut fsm = StateMachine::new(Touch::Idle);
        let entered_clone = entered_from.clone();
        fsm.on_enter(Touch::Dragging, move |from| {
            entered_clone.lock().unwrap().push(from);
        });
        let exited_clone = exited_to.clone();
        fsm.on_exit(Touch::Dragging, move |to| {
            exited_clone.lock().unwrap().push(to);
        });

        fsm.send(Input::Down);
        fsm.send(Input::Move);
        fsm.send(Input::Up);

        assert_eq!(*entered_from.lock().unwrap(), vec![Touch::Tracking]);
        assert_eq!(*exited_to.lock().unwrap(), vec![Touch::Idle]);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut fsm = StateMachine::new(Touch::Idle);
        for _ in 0..HISTORY_LIMIT {
            fsm.send(Input::Down);
            fsm.send(Input::Up);
        }

        assert_eq!(fsm.history().len(), HISTORY_LIMIT);
        let (from, _, to) = fsm.history()[HISTORY_LIMIT - 1];
        assert_eq!((from, to), (Touch::Tracking, Touch::Idle));

        fsm.clear_history();
        assert!(fsm.history().is_empty());
    }

    #[test]
    fn test_can_send() {
        let fsm = StateMachine::new(Touch::Idle);

        assert!(fsm.can_send(Input::Down));
        assert!(!fsm.can_send(Input::Up));
    }
}
