//! Natural-language task intake and daily digests.
//!
//! Free text goes through a language model ([`extract`]), relative due
//! dates are resolved ([`timestamp::normalize`]), and stored tasks are
//! grouped into overdue / today / upcoming / no-due buckets
//! ([`agenda::bucketize`]) for the digest pushed to chat ([`render`]).

pub mod agenda;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod push;
pub mod render;
pub mod service;
pub mod store;
pub mod timestamp;
pub mod types;

pub use error::{AppError, ConfigError, Result};
