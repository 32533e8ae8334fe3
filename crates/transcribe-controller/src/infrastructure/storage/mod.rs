//! Storage infrastructure: configuration and user data persistence.
//!
//! - `config`     – Reads the TOML configuration file, applies environment
//!   overrides and validates the result.  A missing file means defaults.
//! - `user_store` – Persists the operator's user id as a small JSON document.

pub mod config;
pub mod user_store;
