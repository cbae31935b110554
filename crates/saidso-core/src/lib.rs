//! Saidso Core — domain models, repository traits, and shared error
//! types for the identity subsystem.
//!
//! This crate has no I/O of its own: storage lives behind the
//! repository traits in [`repository`], and outbound side effects
//! (email, binary objects) behind the collaborator ports in [`ports`].

pub mod error;
pub mod models;
pub mod ports;
pub mod repository;

pub use error::{SaidsoError, SaidsoResult};
