//! Core domain model for stanza.
//!
//! This crate defines the chart, library, lyrics and corpus-hierarchy
//! records, the CSV codec used for every persisted table, and the object
//! store the pipeline reads its inputs from and writes its artifacts to.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod model;
pub mod store;
pub mod table;

pub use error::{Error, Result};
