//! Error types for the protoc-gen-decls crate.

use std::path::PathBuf;

/// Errors that can occur while translating a schema into declarations.
///
/// Every variant is terminal for the current run: the plugin boundary turns
/// it into the response's error string and emits no files.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The serialized request (or descriptor set) could not be decoded.
    #[error("failed to decode request: {0}")]
    Decode(#[from] prost::DecodeError),

    /// A field, method, or dependency refers to something not in the schema.
    #[error("{context}: unresolvable reference to '{target}'")]
    UnresolvedReference { context: String, target: String },

    /// A file was requested for generation but not supplied in the request.
    #[error("file '{name}' requested for generation but not present in request")]
    UnknownFile { name: String },

    /// The request names no files to generate.
    #[error("no files to generate")]
    NoFilesToGenerate,

    /// Two distinct packages imported by one file map to the same module alias.
    #[error("{file}: packages '{first}' and '{second}' both map to import alias '{alias}'")]
    AliasCollision {
        file: String,
        alias: String,
        first: String,
        second: String,
    },

    /// Two generated files would be written under the same name.
    #[error("'{first}' and '{second}' both render to output file '{output}'")]
    OutputCollision {
        output: String,
        first: String,
        second: String,
    },

    /// Two declarations of one output file render to the same name.
    #[error("{file}: '{first}' and '{second}' both render as '{name}'")]
    NameCollision {
        file: String,
        name: String,
        first: String,
        second: String,
    },

    /// Invalid plugin parameter or output pattern.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Failed to read an input file from disk.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write a generated file.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON serialization error while dumping the schema model.
    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_reference_names_both_sides() {
        let err = Error::UnresolvedReference {
            context: "field pkg.Person.friend".to_string(),
            target: ".pkg.Missing".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("pkg.Person.friend"));
        assert!(msg.contains(".pkg.Missing"));
    }

    #[test]
    fn alias_collision_mentions_alias() {
        let err = Error::AliasCollision {
            file: "a.proto".to_string(),
            alias: "foo_bar".to_string(),
            first: "foo.bar".to_string(),
            second: "foo_bar".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "a.proto: packages 'foo.bar' and 'foo_bar' both map to import alias 'foo_bar'"
        );
    }

    #[test]
    fn name_collision_names_both_entities() {
        let err = Error::NameCollision {
            file: "x.proto".to_string(),
            name: "Outer_Inner".to_string(),
            first: ".x.Outer.Inner".to_string(),
            second: ".x.Outer_Inner".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "x.proto: '.x.Outer.Inner' and '.x.Outer_Inner' both render as 'Outer_Inner'"
        );
    }
}
