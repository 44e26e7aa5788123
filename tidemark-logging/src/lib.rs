//! Logging setup for Tidemark
//!
//! All crates log through `tracing`; this crate installs the global
//! subscriber from [`tidemark_config::LoggingConfig`].

pub mod init;

pub use init::{build_env_filter, init_logging, init_simple_tracing};
