// PageMark shared type definitions
// Each submodule defines types used across the crate.

pub mod errors;
pub mod marker;
pub mod message;
pub mod settings;
