//! Ports (traits) implemented by the server's adapters

pub mod storage;

pub use storage::*;
