//! Domain layer for the taxometr routing core
//!
//! Contains the value objects shared by route parsing, geocoding and
//! location resolution. This layer performs no I/O.

pub mod errors;
pub mod value_objects;

pub use errors::DomainError;
pub use value_objects::*;
