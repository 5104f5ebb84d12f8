//! Nsforge Core - Foundation error taxonomy
//!
//! This crate provides the error type shared by the nsforge library and CLI.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;

pub use error::{Error, Result};
