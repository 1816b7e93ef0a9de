//! Configuration module for Doc-Digest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Only `[source]` is mandatory; every other section falls back to defaults that
//! match a single Gemini-backed run over a docs site.
//!
//! # Example
//!
//! ```no_run
//! use doc_digest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("digest.toml")).unwrap();
//! println!("Throttle: {}ms", config.dispatcher.throttle_ms);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CredentialsConfig, DispatcherConfig, OutputConfig, RetryConfig, SourceConfig,
    SummarizerConfig, UserAgentConfig, DEFAULT_SYSTEM_PROMPT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
