//! Salsa inputs.

pub mod source;
