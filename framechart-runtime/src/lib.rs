#[macro_use]
extern crate lazy_static;

pub mod datasets;
pub mod expression;
pub mod interpreter;
pub mod stats;

pub use interpreter::{LocalInterpreter, LocalInterpreterOpts};
