//! Wire-level subset of `plugin.proto` and `descriptor.proto`.
//!
//! Only the descriptor fields the translator reads are declared. Options
//! messages are kept as raw bytes so extension fields survive decoding;
//! [`ExtensionSet`] scans them into field-number keyed raw values without
//! knowing which extensions exist. Meaning is assigned later by
//! [`crate::optionality::AnnotationTable`].

use std::collections::BTreeMap;

use prost::DecodeError;
use prost::Message;
use prost::bytes::Buf;
use prost::encoding::{WireType, decode_key, decode_varint};
use serde::Serialize;

/// `google.protobuf.compiler.CodeGeneratorRequest`.
#[derive(Clone, PartialEq, Message)]
pub struct CodeGeneratorRequest {
    #[prost(string, repeated, tag = "1")]
    pub file_to_generate: Vec<String>,
    #[prost(string, optional, tag = "2")]
    pub parameter: Option<String>,
    #[prost(message, repeated, tag = "15")]
    pub proto_file: Vec<FileDescriptorProto>,
}

/// `google.protobuf.FileDescriptorSet`, as written by `protoc --descriptor_set_out`.
#[derive(Clone, PartialEq, Message)]
pub struct FileDescriptorSet {
    #[prost(message, repeated, tag = "1")]
    pub file: Vec<FileDescriptorProto>,
}

#[derive(Clone, PartialEq, Message)]
pub struct FileDescriptorProto {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub package: Option<String>,
    #[prost(string, repeated, tag = "3")]
    pub dependency: Vec<String>,
    #[prost(message, repeated, tag = "4")]
    pub message_type: Vec<DescriptorProto>,
    #[prost(message, repeated, tag = "5")]
    pub enum_type: Vec<EnumDescriptorProto>,
    #[prost(message, repeated, tag = "6")]
    pub service: Vec<ServiceDescriptorProto>,
    #[prost(message, optional, tag = "9")]
    pub source_code_info: Option<SourceCodeInfo>,
    #[prost(string, optional, tag = "12")]
    pub syntax: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct DescriptorProto {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(message, repeated, tag = "2")]
    pub field: Vec<FieldDescriptorProto>,
    #[prost(message, repeated, tag = "3")]
    pub nested_type: Vec<DescriptorProto>,
    #[prost(message, repeated, tag = "4")]
    pub enum_type: Vec<EnumDescriptorProto>,
    /// Raw `MessageOptions`.
    #[prost(bytes = "vec", optional, tag = "7")]
    pub options: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, Message)]
pub struct FieldDescriptorProto {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(int32, optional, tag = "3")]
    pub number: Option<i32>,
    #[prost(int32, optional, tag = "4")]
    pub label: Option<i32>,
    #[prost(int32, optional, tag = "5")]
    pub r#type: Option<i32>,
    #[prost(string, optional, tag = "6")]
    pub type_name: Option<String>,
    /// Raw `FieldOptions`.
    #[prost(bytes = "vec", optional, tag = "8")]
    pub options: Option<Vec<u8>>,
    #[prost(string, optional, tag = "10")]
    pub json_name: Option<String>,
    #[prost(bool, optional, tag = "17")]
    pub proto3_optional: Option<bool>,
}

#[derive(Clone, PartialEq, Message)]
pub struct EnumDescriptorProto {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(message, repeated, tag = "2")]
    pub value: Vec<EnumValueDescriptorProto>,
}

#[derive(Clone, PartialEq, Message)]
pub struct EnumValueDescriptorProto {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(int32, optional, tag = "2")]
    pub number: Option<i32>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ServiceDescriptorProto {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(message, repeated, tag = "2")]
    pub method: Vec<MethodDescriptorProto>,
}

#[derive(Clone, PartialEq, Message)]
pub struct MethodDescriptorProto {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub input_type: Option<String>,
    #[prost(string, optional, tag = "3")]
    pub output_type: Option<String>,
    #[prost(bool, optional, tag = "5")]
    pub client_streaming: Option<bool>,
    #[prost(bool, optional, tag = "6")]
    pub server_streaming: Option<bool>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SourceCodeInfo {
    #[prost(message, repeated, tag = "1")]
    pub location: Vec<Location>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Location {
    #[prost(int32, repeated, tag = "1")]
    pub path: Vec<i32>,
    #[prost(int32, repeated, tag = "2")]
    pub span: Vec<i32>,
    #[prost(string, optional, tag = "3")]
    pub leading_comments: Option<String>,
    #[prost(string, optional, tag = "4")]
    pub trailing_comments: Option<String>,
}

/// Field numbers inside `descriptor.proto` used to build source-info paths.
pub mod path {
    pub const FILE_MESSAGE: i32 = 4;
    pub const FILE_ENUM: i32 = 5;
    pub const FILE_SERVICE: i32 = 6;
    pub const MESSAGE_FIELD: i32 = 2;
    pub const MESSAGE_NESTED: i32 = 3;
    pub const MESSAGE_ENUM: i32 = 4;
    pub const ENUM_VALUE: i32 = 2;
    pub const SERVICE_METHOD: i32 = 2;
}

/// `MessageOptions.map_entry`.
pub const MAP_ENTRY_OPTION: u32 = 7;

/// One undecoded value of an options field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RawValue {
    Varint(u64),
    Fixed32(u32),
    Fixed64(u64),
    Bytes(Vec<u8>),
}

/// Options message fields keyed by field number, in wire order per number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExtensionSet {
    fields: BTreeMap<u32, Vec<RawValue>>,
}

impl ExtensionSet {
    /// Scan an encoded options message.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut buf = bytes;
        let mut fields: BTreeMap<u32, Vec<RawValue>> = BTreeMap::new();

        while buf.has_remaining() {
            let (number, wire_type) = decode_key(&mut buf)?;
            let value = match wire_type {
                WireType::Varint => RawValue::Varint(decode_varint(&mut buf)?),
                WireType::SixtyFourBit => {
                    if buf.remaining() < 8 {
                        return Err(DecodeError::new("buffer underflow"));
                    }
                    RawValue::Fixed64(buf.get_u64_le())
                }
                WireType::ThirtyTwoBit => {
                    if buf.remaining() < 4 {
                        return Err(DecodeError::new("buffer underflow"));
                    }
                    RawValue::Fixed32(buf.get_u32_le())
                }
                WireType::LengthDelimited => {
                    let len = usize::try_from(decode_varint(&mut buf)?)
                        .map_err(|_| DecodeError::new("length overflow"))?;
                    if buf.remaining() < len {
                        return Err(DecodeError::new("buffer underflow"));
                    }
                    let value = buf[..len].to_vec();
                    buf.advance(len);
                    RawValue::Bytes(value)
                }
                WireType::StartGroup | WireType::EndGroup => {
                    return Err(DecodeError::new("groups are not supported in options"));
                }
            };
            fields.entry(number).or_default().push(value);
        }

        Ok(Self { fields })
    }

    /// Decode optional raw options bytes; absent options give an empty set.
    pub fn from_options(options: Option<&[u8]>) -> Result<Self, DecodeError> {
        options.map_or_else(|| Ok(Self::default()), Self::decode)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Last occurrence of a scalar bool field (proto "last one wins").
    pub fn bool_value(&self, number: u32) -> Option<bool> {
        self.varints(number).last().map(|v| *v != 0)
    }

    /// All varint values of a field, expanding packed encodings.
    pub fn varints(&self, number: u32) -> Vec<u64> {
        let mut out = Vec::new();
        for value in self.fields.get(&number).into_iter().flatten() {
            match value {
                RawValue::Varint(v) => out.push(*v),
                RawValue::Bytes(packed) => {
                    let mut buf = packed.as_slice();
                    while buf.has_remaining() {
                        match decode_varint(&mut buf) {
                            Ok(v) => out.push(v),
                            Err(_) => break,
                        }
                    }
                }
                RawValue::Fixed32(_) | RawValue::Fixed64(_) => {}
            }
        }
        out
    }

    /// A message-typed field, merging every occurrence as protobuf does.
    pub fn message(&self, number: u32) -> Result<Option<ExtensionSet>, DecodeError> {
        let Some(values) = self.fields.get(&number) else {
            return Ok(None);
        };
        let mut merged = Vec::new();
        for value in values {
            if let RawValue::Bytes(bytes) = value {
                merged.extend_from_slice(bytes);
            }
        }
        Self::decode(&merged).map(Some)
    }
}

/// Decode a plugin request from its wire form.
pub fn decode_request(bytes: &[u8]) -> Result<CodeGeneratorRequest, DecodeError> {
    CodeGeneratorRequest::decode(bytes)
}

/// Decode a descriptor set from its wire form.
pub fn decode_descriptor_set(bytes: &[u8]) -> Result<FileDescriptorSet, DecodeError> {
    FileDescriptorSet::decode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Message)]
    struct Inner {
        #[prost(bool, optional, tag = "1")]
        required: Option<bool>,
    }

    #[derive(Clone, PartialEq, Message)]
    struct Options {
        #[prost(bool, optional, tag = "7")]
        map_entry: Option<bool>,
        #[prost(int32, repeated, tag = "1052")]
        packed: Vec<i32>,
        #[prost(int32, repeated, packed = "false", tag = "1053")]
        unpacked: Vec<i32>,
        #[prost(message, optional, tag = "50201")]
        inner: Option<Inner>,
        #[prost(fixed64, optional, tag = "9")]
        fixed: Option<u64>,
    }

    #[test]
    fn scans_scalar_and_message_fields() {
        let bytes = Options {
            map_entry: Some(true),
            inner: Some(Inner {
                required: Some(true),
            }),
            fixed: Some(42),
            ..Default::default()
        }
        .encode_to_vec();

        let set = ExtensionSet::decode(&bytes).unwrap();
        assert_eq!(set.bool_value(MAP_ENTRY_OPTION), Some(true));
        assert_eq!(set.get_fixed64_for_test(9), Some(42));
        let inner = set.message(50201).unwrap().unwrap();
        assert_eq!(inner.bool_value(1), Some(true));
        assert!(set.message(1).unwrap().is_none());
    }

    #[test]
    fn expands_packed_and_unpacked_varints() {
        let bytes = Options {
            packed: vec![2, 3],
            unpacked: vec![5, 2],
            ..Default::default()
        }
        .encode_to_vec();

        let set = ExtensionSet::decode(&bytes).unwrap();
        assert_eq!(set.varints(1052), vec![2, 3]);
        assert_eq!(set.varints(1053), vec![5, 2]);
    }

    #[test]
    fn absent_options_are_empty() {
        let set = ExtensionSet::from_options(None).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.bool_value(7), None);
    }

    #[test]
    fn truncated_options_fail() {
        // Field 1, length-delimited, claims 5 bytes but has 1.
        assert!(ExtensionSet::decode(&[0x0a, 0x05, 0x01]).is_err());
    }

    impl ExtensionSet {
        fn get_fixed64_for_test(&self, number: u32) -> Option<u64> {
            self.fields.get(&number)?.iter().find_map(|v| match v {
                RawValue::Fixed64(x) => Some(*x),
                _ => None,
            })
        }
    }
}
