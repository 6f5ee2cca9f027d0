//! headtab Core Runtime
//!
//! This crate provides the foundational primitives the collapsible tab engine
//! is built on:
//!
//! - **Reactive Signals**: Fine-grained, dependency-tracked shared state
//! - **State Machines**: Typed state machines for interaction phases
//! - **Gesture Events**: The pan/touch/scroll event vocabulary
//!
//! # Example
//!
//! ```rust
//! use headtab_core::reactive::ReactiveGraph;
//!
//! let mut graph = ReactiveGraph::new();
//!
//! // Create a signal
//! let offset = graph.create_signal(0.0f64);
//!
//! // Create a derived value
//! let header = graph.create_derived(move |g| {
//!     -g.get(offset).unwrap_or(0.0).clamp(0.0, 100.0)
//! });
//!
//! // Update the signal
//! graph.set(offset, 40.0);
//! assert_eq!(graph.get_derived(header), Some(-40.0));
//! ```

pub mod events;
pub mod fsm;
pub mod reactive;

pub use events::{PanEvent, PanPhase, ScrollEvent, TouchEvent, TouchPhase, TouchTarget};
pub use fsm::{StateMachine, StateTransitions};
pub use reactive::{Derived, DerivedId, Effect, EffectId, ReactiveGraph, Signal, SignalId};
