//! Turn orchestration: wires the agent loop, tool registry, and event
//! parser together and drives one turn to completion.

pub mod driver;

pub use driver::{TurnDriver, TurnHandle};
