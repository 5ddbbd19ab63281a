//! Orchestration: the conversion engine and its batch fan-out.

pub mod engine;

pub use engine::{CancelToken, ConversionEngine, ConversionReport, Status};
