//! JSON configuration for the voter and the demo binary.
//!
//! Every field is optional; anything left out keeps the library default.

pub mod demo;
pub mod voting;
