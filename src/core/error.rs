// This module defines the error types for loopsel using the thiserror crate for idiomatic
// Rust error handling. ConfigError covers everything that can go wrong while reading
// param.json: the file cannot be read, it is not valid JSON, a value has the wrong type,
// or one of the required keys is absent. A missing key is fatal for the tool and must be
// detected before any loop traversal starts. LoopselError aggregates the failure modes of
// the command-line driver (configuration, unreadable or unparsable IR input, unknown
// function names, unsupported input formats). The selector itself never fails: empty
// results are ordinary outcomes and are not represented here.

//! Error types for loopsel.
//!
//! Using thiserror for more idiomatic error handling.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a target configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing parameter in param.json: {key}")]
    MissingField {
        key: &'static str,
    },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid param.json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("param.json must contain a JSON object at the top level")]
    NotAnObject,
}

/// Errors surfaced by the command-line driver.
#[derive(Error, Debug)]
pub enum LoopselError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to read {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {reason}")]
    Parse {
        path: PathBuf,
        reason: String,
    },

    #[error("Function not found: {name}")]
    FunctionNotFound {
        name: String,
    },

    #[error("Unsupported input format: {reason}")]
    UnsupportedInput {
        reason: String,
    },

    #[error("Failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode mapping plan: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
