//! stackmap - template-driven extraction of service infrastructure
//!
//! A template mirrors the shape of a service's configuration file, with
//! `{{ ... }}` leaves naming where each value lands in the output [`Record`].
//! The template is compiled once into an [`Engine`] and replayed against any
//! number of structurally similar documents.
//!
//! ```
//! use stackmap::Engine;
//!
//! let engine = Engine::new(br#"
//! database:
//!   url: {{ parse .postgresql.host:.postgresql.port/$ }}
//!   name: {{ all.postgresql.database.name }}
//! "#).unwrap();
//!
//! let record = engine
//!     .extract(b"database:\n  url: db.internal:5432/orders\n  name: orders\n")
//!     .unwrap();
//!
//! let postgresql = &record.postgresql().instances()[0];
//! assert_eq!(postgresql.host.as_deref(), Some("db.internal"));
//! assert_eq!(postgresql.port, Some(5432));
//! ```
//!
//! # Project Structure
//!
//! - [`extract`]: template compiler, document walker and the output record
//! - [`source`]: configured sources that pick the first usable config file
//! - [`config`]: environment and sources-file configuration
//! - [`fs`]: file system abstraction with an in-memory mock

pub mod cli;
pub mod config;
pub mod extract;
pub mod fs;
pub mod source;
pub mod util;

pub use config::{ConfigError, SourceConfig, SourcesConfig, StackmapConfig};
pub use extract::{Engine, ExtractError, Record, Setter, SetterTree};
pub use source::{Extraction, SourceError, YamlSource};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const NAME: &str = env!("CARGO_PKG_NAME");
