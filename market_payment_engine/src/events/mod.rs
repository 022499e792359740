//! Stateless pub-sub for engine events.
//!
//! Hooks registered in [`EventHooks`] are turned into [`EventHandlers`], whose [`EventProducers`] are handed to the
//! APIs. An API publishes an event only after the transaction that caused it has committed. Handlers receive a copy
//! of the event and nothing else; they cannot reach back into the engine.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
