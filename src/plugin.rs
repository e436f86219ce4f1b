//! Host boundary: code generator request in, response out.
//!
//! Any failure becomes the response's error string; a response never
//! carries both an error and files.

use std::io::{Read, Write};

use prost::Message;
use prost_types::compiler::CodeGeneratorResponse;
use prost_types::compiler::code_generator_response::{Feature, File as ResponseFile};
use tracing::{debug, error};

use crate::codegen::{self, Generated};
use crate::config::Options;
use crate::descriptor::{CodeGeneratorRequest, decode_request};
use crate::error::{Error, Result};
use crate::schema::{FileId, Schema};

/// Run the generator on a decoded request.
pub fn run(request: &CodeGeneratorRequest) -> Result<Generated> {
    let options = Options::from_parameter(request.parameter.as_deref())?;
    debug!(?options, "parsed parameters");

    if request.file_to_generate.is_empty() {
        return Err(Error::NoFilesToGenerate);
    }

    let schema = Schema::from_descriptors(&request.proto_file)?;
    if options.dump_request_descriptor {
        let dump = serde_json::to_string_pretty(&schema)?;
        debug!(schema = %dump, "resolved schema model");
    }

    let targets = request
        .file_to_generate
        .iter()
        .map(|name| {
            schema
                .file_by_name(name)
                .ok_or_else(|| Error::UnknownFile { name: name.clone() })
        })
        .collect::<Result<Vec<FileId>>>()?;

    codegen::generate(&schema, &targets, &options)
}

/// Decode a serialized request, run it, and build the response.
pub fn respond(input: &[u8]) -> CodeGeneratorResponse {
    let outcome = decode_request(input)
        .map_err(Error::from)
        .and_then(|request| run(&request));

    match outcome {
        Ok(generated) => CodeGeneratorResponse {
            error: None,
            supported_features: Some(Feature::Proto3Optional as u64),
            file: generated
                .files
                .into_iter()
                .map(|f| ResponseFile {
                    name: Some(f.name),
                    content: Some(f.content),
                    ..Default::default()
                })
                .collect(),
        },
        Err(e) => {
            error!(error = %e, "generation failed");
            CodeGeneratorResponse {
                error: Some(e.to_string()),
                supported_features: Some(Feature::Proto3Optional as u64),
                file: Vec::new(),
            }
        }
    }
}

/// Plugin mode: request from `input`, response to `output`.
///
/// Only I/O failures are returned; generation errors travel in the response.
pub fn serve(mut input: impl Read, mut output: impl Write) -> std::io::Result<()> {
    let mut buf = Vec::new();
    input.read_to_end(&mut buf)?;
    let response = respond(&buf);
    output.write_all(&response.encode_to_vec())?;
    output.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tests::{field, file, message};

    fn request(parameter: Option<&str>, files: &[&str]) -> CodeGeneratorRequest {
        CodeGeneratorRequest {
            file_to_generate: files.iter().map(|s| s.to_string()).collect(),
            parameter: parameter.map(str::to_string),
            proto_file: vec![file(
                "person.proto",
                "people",
                vec![message("Person", vec![field("name", 1, 9, None)])],
            )],
        }
    }

    #[test]
    fn successful_response_has_files_only() {
        let bytes = request(None, &["person.proto"]).encode_to_vec();
        let response = respond(&bytes);
        assert_eq!(response.error, None);
        assert_eq!(response.file.len(), 1);
        assert_eq!(response.file[0].name.as_deref(), Some("people.person.d.ts"));
        assert_eq!(response.supported_features, Some(1));
    }

    #[test]
    fn error_response_has_no_files() {
        let bytes = request(Some("bogus=1"), &["person.proto"]).encode_to_vec();
        let response = respond(&bytes);
        assert!(response.file.is_empty());
        assert!(response.error.unwrap().contains("bogus"));
    }

    #[test]
    fn missing_target_file() {
        let err = run(&request(None, &["other.proto"])).unwrap_err();
        assert!(matches!(err, Error::UnknownFile { ref name } if name == "other.proto"));
    }

    #[test]
    fn empty_file_list() {
        let err = run(&request(None, &[])).unwrap_err();
        assert!(matches!(err, Error::NoFilesToGenerate));
    }

    #[test]
    fn schema_dump_does_not_change_output() {
        let plain = run(&request(None, &["person.proto"])).unwrap();
        let dumped = run(&request(Some("dump_request_descriptor"), &["person.proto"])).unwrap();
        assert_eq!(plain.files, dumped.files);
    }

    #[test]
    fn undecodable_input() {
        let response = respond(&[0xff, 0xff, 0xff]);
        assert!(response.error.unwrap().starts_with("failed to decode request"));
    }

    #[test]
    fn serve_round_trips_through_streams() {
        let bytes = request(None, &["person.proto"]).encode_to_vec();
        let mut out = Vec::new();
        serve(bytes.as_slice(), &mut out).unwrap();
        let response = CodeGeneratorResponse::decode(out.as_slice()).unwrap();
        assert_eq!(response.file.len(), 1);
    }
}
