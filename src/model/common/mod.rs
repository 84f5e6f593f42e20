//! Types and helpers shared between the API and DB layers.

pub mod device;
pub mod finance;
pub mod text;
