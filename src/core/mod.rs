//! Core conversion pipeline: analyze a reference implementation, scaffold it
//! for a tier, verify the result.

pub mod analyze;
pub mod convert;
pub mod diag;
pub mod hint;
pub mod lexer;
pub mod parse;
pub mod policy;
pub mod scan;
pub mod tree;
pub mod unit;
pub mod verify;
