//! Command-line front end: wires configuration, transport, and sinks into a
//! ready-to-use dispatch manager.

pub mod engine;
pub mod input;

pub use engine::Engine;
pub use input::{LineReport, SubmitLine, parse_line};
