//! HBnB Core Library
//!
//! Entity model, the storage port and the error type shared by the HBnB
//! API server and its storage engines.

pub mod error;
pub mod ports;
pub mod types;

pub use error::{HbnbError, Result};
pub use ports::Storage;
pub use types::*;
