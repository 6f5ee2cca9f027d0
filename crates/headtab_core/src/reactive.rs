//! Reactive signal graph
//!
//! Signals hold shared values, derived values are lazily recomputed pure
//! functions of signals, and effects are re-run whenever a signal they read
//! changes. Reads performed inside a derived computation or an effect are
//! tracked automatically, so dependencies never have to be declared by hand.
//!
//! The graph has a single writer: `set`, `update` and `batch` take
//! `&mut self`, while derived values and effects only ever see
//! `&ReactiveGraph`. Effects therefore cannot write back into the graph; they
//! observe and hand work to their owner.

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::marker::PhantomData;

new_key_type! {
    /// Untyped identifier of a signal
    pub struct SignalId;
    /// Untyped identifier of a derived value
    pub struct DerivedId;
    /// Identifier of an effect
    pub struct EffectId;
}

type AnyValue = Box<dyn Any + Send>;
type ComputeFn = Box<dyn Fn(&ReactiveGraph) -> AnyValue + Send>;
type EffectFn = Box<dyn FnMut(&ReactiveGraph) + Send>;

/// Typed handle to a signal
pub struct Signal<T> {
    id: SignalId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Signal<T> {
    pub fn id(&self) -> SignalId {
        self.id
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Signal<T> {}

impl<T> PartialEq for Signal<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Signal<T> {}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signal").field(&self.id).finish()
    }
}

/// Typed handle to a derived value
pub struct Derived<T> {
    id: DerivedId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Derived<T> {
    pub fn id(&self) -> DerivedId {
        self.id
    }
}

impl<T> Clone for Derived<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Derived<T> {}

impl<T> fmt::Debug for Derived<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Derived").field(&self.id).finish()
    }
}

/// Handle to a registered effect
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Effect {
    id: EffectId,
}

impl Effect {
    pub fn id(&self) -> EffectId {
        self.id
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Subscriber {
    Derived(DerivedId),
    Effect(EffectId),
}

struct SignalNode {
    value: AnyValue,
    version: u64,
}

struct DerivedNode {
    compute: ComputeFn,
    cached: RefCell<Option<AnyValue>>,
    dirty: Cell<bool>,
    deps: RefCell<FxHashSet<SignalId>>,
}

struct EffectNode {
    run: Option<EffectFn>,
    deps: FxHashSet<SignalId>,
    /// Creation sequence; pending effects run in this order
    order: u64,
}

/// The reactive graph owning every signal, derived value and effect
pub struct ReactiveGraph {
    signals: SlotMap<SignalId, SignalNode>,
    derived: SlotMap<DerivedId, DerivedNode>,
    effects: SlotMap<EffectId, EffectNode>,
    subscribers: RefCell<FxHashMap<SignalId, SmallVec<[Subscriber; 4]>>>,
    /// Stack of dependency sets being collected (innermost last)
    tracking: RefCell<Vec<FxHashSet<SignalId>>>,
    pending: Vec<EffectId>,
    batch_depth: u32,
    next_order: u64,
}

impl ReactiveGraph {
    pub fn new() -> Self {
        Self {
            signals: SlotMap::with_key(),
            derived: SlotMap::with_key(),
            effects: SlotMap::with_key(),
            subscribers: RefCell::new(FxHashMap::default()),
            tracking: RefCell::new(Vec::new()),
            pending: Vec::new(),
            batch_depth: 0,
            next_order: 0,
        }
    }

    // =========================================================================
    // Signals
    // =========================================================================

    /// Create a signal holding `value`
    pub fn create_signal<T: Send + 'static>(&mut self, value: T) -> Signal<T> {
        let id = self.signals.insert(SignalNode {
            value: Box::new(value),
            version: 0,
        });
        Signal {
            id,
            _marker: PhantomData,
        }
    }

    /// Read a signal, recording it as a dependency of the running computation
    pub fn get<T: Clone + 'static>(&self, signal: Signal<T>) -> Option<T> {
        self.with(signal, T::clone)
    }

    /// Borrow a signal's value through a closure
    pub fn with<T: 'static, R>(&self, signal: Signal<T>, f: impl FnOnce(&T) -> R) -> Option<R> {
        let node = self.signals.get(signal.id)?;
        self.track(signal.id);
        node.value.downcast_ref::<T>().map(f)
    }

    /// Read a signal without recording a dependency
    pub fn peek<T: Clone + 'static>(&self, signal: Signal<T>) -> Option<T> {
        self.signals
            .get(signal.id)?
            .value
            .downcast_ref::<T>()
            .cloned()
    }

    /// Number of times the signal's value has changed
    pub fn version<T>(&self, signal: Signal<T>) -> Option<u64> {
        self.signals.get(signal.id).map(|node| node.version)
    }

    /// Write a signal. Returns `true` if the value changed.
    ///
    /// Writing an equal value is a no-op and notifies nobody.
    pub fn set<T: PartialEq + Send + 'static>(&mut self, signal: Signal<T>, value: T) -> bool {
        let Some(node) = self.signals.get_mut(signal.id) else {
            return false;
        };
        let Some(slot) = node.value.downcast_mut::<T>() else {
            return false;
        };
        if *slot == value {
            return false;
        }
        *slot = value;
        node.version += 1;
        self.mark_changed(signal.id);
        true
    }

    /// Modify a signal in place. Returns `true` if the value changed.
    pub fn update<T: Clone + PartialEq + Send + 'static>(
        &mut self,
        signal: Signal<T>,
        f: impl FnOnce(&mut T),
    ) -> bool {
        let Some(mut value) = self.peek(signal) else {
            return false;
        };
        f(&mut value);
        self.set(signal, value)
    }

    /// Group several writes so effects run once, after the last write
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.batch_depth += 1;
        let result = f(self);
        self.batch_depth -= 1;
        if self.batch_depth == 0 {
            self.flush_effects();
        }
        result
    }

    /// Remove a signal. Dependents keep their last computed value.
    pub fn remove_signal<T>(&mut self, signal: Signal<T>) {
        self.signals.remove(signal.id);
        self.subscribers.borrow_mut().remove(&signal.id);
    }

    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    // =========================================================================
    // Derived values
    // =========================================================================

    /// Create a lazily evaluated value computed from other signals
    pub fn create_derived<T, F>(&mut self, compute: F) -> Derived<T>
    where
        T: Send + 'static,
        F: Fn(&ReactiveGraph) -> T + Send + 'static,
    {
        let id = self.derived.insert(DerivedNode {
            compute: Box::new(move |g| Box::new(compute(g)) as AnyValue),
            cached: RefCell::new(None),
            dirty: Cell::new(true),
            deps: RefCell::new(FxHashSet::default()),
        });
        Derived {
            id,
            _marker: PhantomData,
        }
    }

    /// Read a derived value, recomputing it if any dependency changed
    pub fn get_derived<T: Clone + 'static>(&self, derived: Derived<T>) -> Option<T> {
        let node = self.derived.get(derived.id)?;

        if node.dirty.get() || node.cached.borrow().is_none() {
            self.tracking.borrow_mut().push(FxHashSet::default());
            let value = (node.compute)(self);
            let deps = self.tracking.borrow_mut().pop().unwrap_or_default();

            let old = std::mem::replace(&mut *node.deps.borrow_mut(), deps.clone());
            self.resubscribe(Subscriber::Derived(derived.id), &old, &deps);
            *node.cached.borrow_mut() = Some(value);
            node.dirty.set(false);
        }

        // A computation reading this value depends on its signals too
        if let Some(frame) = self.tracking.borrow_mut().last_mut() {
            frame.extend(node.deps.borrow().iter().copied());
        }

        node.cached
            .borrow()
            .as_ref()
            .and_then(|value| value.downcast_ref::<T>())
            .cloned()
    }

    // =========================================================================
    // Effects
    // =========================================================================

    /// Register an effect. It runs once immediately and again whenever a
    /// signal it read during its last run changes.
    pub fn create_effect<F>(&mut self, run: F) -> Effect
    where
        F: FnMut(&ReactiveGraph) + Send + 'static,
    {
        let order = self.next_order;
        self.next_order += 1;
        let id = self.effects.insert(EffectNode {
            run: Some(Box::new(run)),
            deps: FxHashSet::default(),
            order,
        });
        self.run_effect(id);
        Effect { id }
    }

    /// Unregister an effect
    pub fn dispose_effect(&mut self, effect: Effect) {
        if let Some(node) = self.effects.remove(effect.id) {
            self.resubscribe(
                Subscriber::Effect(effect.id),
                &node.deps,
                &FxHashSet::default(),
            );
        }
        self.pending.retain(|id| *id != effect.id);
    }

    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn track(&self, id: SignalId) {
        if let Some(frame) = self.tracking.borrow_mut().last_mut() {
            frame.insert(id);
        }
    }

    fn mark_changed(&mut self, id: SignalId) {
        let subs = self
            .subscribers
            .borrow()
            .get(&id)
            .cloned()
            .unwrap_or_default();

        for sub in subs {
            match sub {
                Subscriber::Derived(derived) => {
                    if let Some(node) = self.derived.get(derived) {
                        node.dirty.set(true);
                    }
                }
                Subscriber::Effect(effect) => {
                    if !self.pending.contains(&effect) {
                        self.pending.push(effect);
                    }
                }
            }
        }

        if self.batch_depth == 0 {
            self.flush_effects();
        }
    }

    fn flush_effects(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let mut pending = std::mem::take(&mut self.pending);
        tracing::trace!(count = pending.len(), "flushing effects");
        pending.sort_by_key(|id| self.effects.get(*id).map(|node| node.order));
        for id in pending {
            self.run_effect(id);
        }
    }

    fn run_effect(&mut self, id: EffectId) {
        let Some(mut run) = self.effects.get_mut(id).and_then(|node| node.run.take()) else {
            return;
        };

        self.tracking.borrow_mut().push(FxHashSet::default());
        run(&*self);
        let deps = self.tracking.borrow_mut().pop().unwrap_or_default();

        if let Some(node) = self.effects.get_mut(id) {
            node.run = Some(run);
            let old = std::mem::replace(&mut node.deps, deps.clone());
            self.resubscribe(Subscriber::Effect(id), &old, &deps);
        }
    }

    fn resubscribe(
        &self,
        sub: Subscriber,
        old: &FxHashSet<SignalId>,
        new: &FxHashSet<SignalId>,
    ) {
        let mut subscribers = self.subscribers.borrow_mut();
        for id in old.difference(new) {
            if let Some(list) = subscribers.get_mut(id) {
                list.retain(|s| *s != sub);
            }
        }
        for id in new.difference(old) {
            let list = subscribers.entry(*id).or_default();
            if !list.contains(&sub) {
                list.push(sub);
            }
        }
    }
}

impl Default for ReactiveGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_signal_get_set() {
        let mut graph = ReactiveGraph::new();
        let count = graph.create_signal(0i32);

        assert_eq!(graph.get(count), Some(0));
        assert!(graph.set(count, 5));
        assert_eq!(graph.get(count), Some(5));
        assert_eq!(graph.version(count), Some(1));
    }

    #[test]
    fn test_equal_write_is_noop() {
        let mut graph = ReactiveGraph::new();
        let offset = graph.create_signal(10.0f64);
        let runs = Arc::new(Mutex::new(0));

        let runs_clone = runs.clone();
        graph.create_effect(move |g| {
            let _ = g.get(offset);
            *runs_clone.lock().unwrap() += 1;
        });

        assert!(!graph.set(offset, 10.0));
        assert_eq!(*runs.lock().unwrap(), 1);
        assert_eq!(graph.version(offset), Some(0));
    }

    #[test]
    fn test_derived_recomputes_lazily() {
        let mut graph = ReactiveGraph::new();
        let base = graph.create_signal(2i32);
        let calls = Arc::new(Mutex::new(0));

        let calls_clone = calls.clone();
        let squared = graph.create_derived(move |g| {
            *calls_clone.lock().unwrap() += 1;
            let v = g.get(base).unwrap_or(0);
            v * v
        });

        assert_eq!(*calls.lock().unwrap(), 0);
        assert_eq!(graph.get_derived(squared), Some(4));
        assert_eq!(graph.get_derived(squared), Some(4));
        assert_eq!(*calls.lock().unwrap(), 1);

        graph.set(base, 3);
        assert_eq!(graph.get_derived(squared), Some(9));
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[test]
    fn test_effect_tracks_derived_dependencies() {
        let mut graph = ReactiveGraph::new();
        let base = graph.create_signal(1i32);
        let doubled = graph.create_derived(move |g| g.get(base).unwrap_or(0) * 2);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = seen.clone();
        graph.create_effect(move |g| {
            seen_clone
                .lock()
                .unwrap()
                .push(g.get_derived(doubled).unwrap_or(0));
        });

        graph.set(base, 4);
        assert_eq!(*seen.lock().unwrap(), vec![2, 8]);
    }

    #[test]
    fn test_effect_dependencies_follow_branches() {
        let mut graph = ReactiveGraph::new();
        let use_a = graph.create_signal(true);
        let a = graph.create_signal(1i32);
        let b = graph.create_signal(10i32);
        let runs = Arc::new(Mutex::new(0));

        let runs_clone = runs.clone();
        graph.create_effect(move |g| {
            *runs_clone.lock().unwrap() += 1;
            if g.get(use_a).unwrap_or(false) {
                let _ = g.get(a);
            } else {
                let _ = g.get(b);
            }
        });

        // b is not a dependency yet
        graph.set(b, 11);
        assert_eq!(*runs.lock().unwrap(), 1);

        graph.set(use_a, false);
        assert_eq!(*runs.lock().unwrap(), 2);

        // a is no longer a dependency
        graph.set(a, 2);
        assert_eq!(*runs.lock().unwrap(), 2);
        graph.set(b, 12);
        assert_eq!(*runs.lock().unwrap(), 3);
    }

    #[test]
    fn test_batch_runs_effect_once() {
        let mut graph = ReactiveGraph::new();
        let x = graph.create_signal(0i32);
        let y = graph.create_signal(0i32);
        let runs = Arc::new(Mutex::new(0));

        let runs_clone = runs.clone();
        graph.create_effect(move |g| {
            let _ = g.get(x);
            let _ = g.get(y);
            *runs_clone.lock().unwrap() += 1;
        });

        graph.batch(|g| {
            g.set(x, 1);
            g.set(y, 2);
        });
        assert_eq!(*runs.lock().unwrap(), 2);
    }

    #[test]
    fn test_effects_run_in_creation_order() {
        let mut graph = ReactiveGraph::new();
        let trigger = graph.create_signal(0i32);
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = order.clone();
            graph.create_effect(move |g| {
                if g.get(trigger).unwrap_or(0) > 0 {
                    order.lock().unwrap().push(tag);
                }
            });
        }

        graph.set(trigger, 1);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_dispose_effect() {
        let mut graph = ReactiveGraph::new();
        let value = graph.create_signal(0i32);
        let runs = Arc::new(Mutex::new(0));

        let runs_clone = runs.clone();
        let effect = graph.create_effect(move |g| {
            let _ = g.get(value);
            *runs_clone.lock().unwrap() += 1;
        });
        graph.dispose_effect(effect);
        graph.set(value, 1);

        assert_eq!(*runs.lock().unwrap(), 1);
        assert_eq!(graph.effect_count(), 0);
    }

    #[test]
    fn test_peek_does_not_track() {
        let mut graph = ReactiveGraph::new();
        let value = graph.create_signal(0i32);
        let runs = Arc::new(Mutex::new(0));

        let runs_clone = runs.clone();
        graph.create_effect(move |g| {
            let _ = g.peek(value);
            *runs_clone.lock().unwrap() += 1;
        });
        graph.set(value, 1);

        assert_eq!(*runs.lock().unwrap(), 1);
    }
}
