//! Configuration module for es-runner.
//!
//! This module handles parsing, validation, and access to configuration
//! settings for transient Elasticsearch server instances. Configurations
//! can be built in code or loaded from JSON files or strings.
//!
//! # Examples
//!
//! Loading a configuration from a file:
//!
//! ```no_run
//! use es_runner::config::Config;
//!
//! let config = Config::from_file("es-runner.json").unwrap();
//! println!("Server command: {}", config.command);
//! ```
//!
//! Creating a configuration programmatically:
//! ```
//! use es_runner::{ElasticsearchServer, config::Config};
//! use std::time::Duration;
//!
//! let config = Config {
//!     startup_timeout: Duration::from_secs(60),
//!     ..Config::default()
//! };
//! let server = ElasticsearchServer::with_config(config);
//! ```
mod parser;
pub mod validator;

pub use parser::Config;
pub use validator::validate_config;
