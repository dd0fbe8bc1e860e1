//! Configuration types
//!
//! Board-agnostic configuration structures. The firmware build validates
//! `machine.toml` against these types and embeds the result as postcard
//! binary data.

pub mod machine;

pub use machine::*;
