//! Turn-resolution loop
//!
//! Alternates model calls and tool execution until the model answers in
//! plain text. The decision of what to do after each model response is a
//! pure function over `TurnState`; the resolver performs the I/O.

mod error;
mod resolver;
mod state;

#[cfg(test)]
mod proptests;
#[cfg(test)]
pub(crate) mod testing;

pub use error::ChatError;
pub use resolver::{TurnConfig, TurnResolver};
