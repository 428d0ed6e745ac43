//! schema-gen library
//!
//! Flattens a glTF JSON-Schema directory into one resolved document and
//! renders it as JSON or as C string literals for embedding in a loader.

pub mod config;
pub mod embed;
pub mod generate;

pub use config::{GenConfig, OutputConfig, OutputFormat};
pub use generate::{check_output, generate, resolve_schema_dir, write_output};
