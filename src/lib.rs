//! Generate type declarations from Protocol Buffer schemas.
//!
//! `protoc-gen-decls` is a `protoc` plugin that turns the messages, enums and
//! services of `.proto` files into static type declarations for TypeScript,
//! Flow or Elm. It can also run standalone on a descriptor set written by
//! `protoc --descriptor_set_out`.
//!
//! # Features
//!
//! - One declaration file per schema file, named by a configurable pattern
//! - Nested messages and enums as nested namespaces (TypeScript) or
//!   flattened names (Flow, Elm)
//! - Cross-package references qualified by a module alias, with the import
//!   block derived from actual use
//! - Required/optional members inferred from field and message annotations
//! - Callback or async-iterator signatures for streaming methods
//! - Source comments carried over to the declarations
//! - Deterministic output: byte-identical across runs
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//!
//! use prost::Message;
//! use protoc_gen_decls::descriptor::{CodeGeneratorRequest, FileDescriptorSet};
//!
//! let bytes = std::fs::read("schema.pb").expect("descriptor set");
//! let set = FileDescriptorSet::decode(bytes.as_slice())?;
//! let request = CodeGeneratorRequest {
//!     file_to_generate: vec!["search.proto".to_string()],
//!     parameter: Some("target=flow,int_enums".to_string()),
//!     proto_file: set.file,
//! };
//! let generated = protoc_gen_decls::plugin::run(&request)?;
//! protoc_gen_decls::codegen::write_files(&generated.files, Path::new("out/"))?;
//! eprintln!("Generated {} files", generated.stats.files_generated);
//! # Ok::<(), protoc_gen_decls::error::Error>(())
//! ```

pub mod codegen;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod imports;
pub mod names;
pub mod optionality;
pub mod plugin;
pub mod schema;
pub mod signature;
pub mod target;
pub mod type_map;
