//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in a DB-friendly way, e.g.:
//!
//! - IDs and datetimes are serialised in MongoDB's own format.

pub mod admin;
pub mod ballot;
pub mod category;
pub mod expense;
pub mod participant;
pub mod purchase;
pub mod registration;
pub mod shop;
