//! Data models shared by the core and the HTTP layer.
//!
//! Field names serialize in snake_case and match the JSON the API
//! returns to clients.

mod drug;
mod medication;

pub use drug::*;
pub use medication::*;
