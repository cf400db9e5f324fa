//! Publisher credentials.
//!
//! [`Credentials`] is read from a static JSON file kept out of version control.

mod config;

pub use config::Credentials;
