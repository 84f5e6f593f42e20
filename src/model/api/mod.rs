//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - IDs are serialised as hex strings.
//! - Field names are camelCase on the wire.

pub mod admin;
pub mod auth;
pub mod ballot;
pub mod category;
pub mod date;
pub mod expense;
pub mod id;
pub mod participant;
pub mod phone;
pub mod purchase;
pub mod registration;
pub mod results;
pub mod shop;
pub mod upload;
