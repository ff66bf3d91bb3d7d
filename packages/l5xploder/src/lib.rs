//! L5X exploder - Split controller exports into a directory tree and back.
//!
//! This crate turns one large L5X document into many small files that
//! diff well under version control, and rebuilds an equivalent document
//! from those files.
//!
//! # Example
//!
//! ```
//! use l5xploder::config;
//!
//! // Validate an input path and derive a file name
//! assert!(config::validate_l5x_path("Line1.L5X").is_ok());
//! assert_eq!(config::sanitize_file_name("Local:1:I"), "Local_1_I");
//! ```
//!
//! # Architecture
//!
//! The exploder is organized into several modules:
//!
//! - [`config`]: Configuration constants and validation
//! - [`error`]: Error types and Result alias
//! - [`options`]: Options record stored with an exploded tree
//! - [`tree`]: Node tree and path selectors
//! - [`xml`]: Markup reader and writer
//! - [`registry`]: Reserved output paths of one run
//! - [`transform`]: Reversible node transformers
//! - [`serializer`]: Custom file formats for node families
//! - [`schema`]: Split rules and the default controller schema
//! - [`persistence`]: Storage backends and the exploded tree store
//! - [`explode`] / [`implode`]: The two tree walks
//! - [`service`]: File-level entry points
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod config;
pub mod error;
pub mod explode;
pub mod implode;
pub mod options;
pub mod persistence;
pub mod registry;
pub mod retry;
pub mod schema;
pub mod serializer;
pub mod service;
pub mod transform;
pub mod tree;
pub mod xml;

// Re-export main functions
pub use service::{explode_file, implode_file};

// Re-export commonly used items
pub use error::{PloderError, Result};
pub use explode::Exploder;
pub use implode::Imploder;
pub use options::{SerializationFormat, SerializationOptions};
pub use persistence::{ExplodedStore, PersistenceBackend};
pub use schema::{create_l5x_schema, NameStrategy, SplitRule, SplitSchema};
pub use tree::{Document, Node};
