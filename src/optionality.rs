//! Decides whether a field is rendered as required or optional.
//!
//! Annotations are read from the raw options of fields and messages. Which
//! extension numbers carry which meaning comes from an [`AnnotationTable`]
//! built from configuration, so nothing here depends on a global registry.
//!
//! # Precedence
//!
//! The most specific annotation wins and fully overrides the others:
//!
//! 1. Field-level override: the custom field options extension's `required`
//!    flag, or failing that an explicit validator `msg_exists` flag.
//! 2. Field behavior list: required iff it contains `REQUIRED`.
//! 3. Message-level default: `required`, or a `field_behavior` of `REQUIRED`.
//! 4. Optional.

use serde::Serialize;
use tracing::warn;

use crate::config::Options;
use crate::descriptor::ExtensionSet;
use crate::schema::{Field, Message};

/// `google.api.field_behavior` on `FieldOptions`.
pub const FIELD_BEHAVIOR_EXT: u32 = 1052;

/// `google.api.FieldBehavior.REQUIRED`.
pub const FIELD_BEHAVIOR_REQUIRED: u64 = 2;

/// Validator field rules on `FieldOptions`.
pub const VALIDATOR_FIELD_EXT: u32 = 65020;

const VALIDATOR_MSG_EXISTS: u32 = 4;
const OPTIONS_REQUIRED: u32 = 1;
const OPTIONS_FIELD_BEHAVIOR: u32 = 2;

/// Extension numbers and their meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnnotationTable {
    pub field_options: u32,
    pub message_options: u32,
    pub field_behavior: u32,
    pub validator: u32,
}

impl AnnotationTable {
    pub fn new(options: &Options) -> Self {
        Self {
            field_options: options.field_options_ext,
            message_options: options.message_options_ext,
            field_behavior: FIELD_BEHAVIOR_EXT,
            validator: VALIDATOR_FIELD_EXT,
        }
    }
}

/// Which rule decided a field's requiredness, with its verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requiredness {
    FieldOverride(bool),
    FieldBehavior(bool),
    MessageDefault(bool),
    Unannotated,
}

impl Requiredness {
    pub fn is_required(self) -> bool {
        match self {
            Self::FieldOverride(r) | Self::FieldBehavior(r) | Self::MessageDefault(r) => r,
            Self::Unannotated => false,
        }
    }
}

/// Walk the precedence chain for `field`, a member of `message`.
pub fn resolve(table: &AnnotationTable, message: &Message, field: &Field) -> Requiredness {
    if let Some(required) = field_override(table, field) {
        return Requiredness::FieldOverride(required);
    }

    let behaviors = field.options.varints(table.field_behavior);
    if !behaviors.is_empty() {
        return Requiredness::FieldBehavior(behaviors.contains(&FIELD_BEHAVIOR_REQUIRED));
    }

    if let Some(defaults) = nested(&message.options, table.message_options, &message.full_name) {
        let required = defaults.bool_value(OPTIONS_REQUIRED).unwrap_or(false)
            || defaults
                .varints(OPTIONS_FIELD_BEHAVIOR)
                .contains(&FIELD_BEHAVIOR_REQUIRED);
        return Requiredness::MessageDefault(required);
    }

    Requiredness::Unannotated
}

pub fn is_required(table: &AnnotationTable, message: &Message, field: &Field) -> bool {
    resolve(table, message, field).is_required()
}

fn field_override(table: &AnnotationTable, field: &Field) -> Option<bool> {
    if let Some(custom) = nested(&field.options, table.field_options, &field.name) {
        return Some(custom.bool_value(OPTIONS_REQUIRED).unwrap_or(false));
    }
    nested(&field.options, table.validator, &field.name)
        .and_then(|rules| rules.bool_value(VALIDATOR_MSG_EXISTS))
}

/// A message-typed extension; a malformed payload counts as absent.
fn nested(options: &ExtensionSet, number: u32, owner: &str) -> Option<ExtensionSet> {
    match options.message(number) {
        Ok(found) => found,
        Err(error) => {
            warn!(owner, extension = number, %error, "ignoring malformed annotation");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_FIELD_OPTIONS_EXT, DEFAULT_MESSAGE_OPTIONS_EXT};
    use crate::schema::{Cardinality, Comments, FileId, WireType};

    fn key(number: u32, wire_type: u32) -> Vec<u8> {
        varint(u64::from(number << 3 | wire_type))
    }

    fn varint(mut v: u64) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            let byte = (v & 0x7f) as u8;
            v >>= 7;
            if v == 0 {
                out.push(byte);
                return out;
            }
            out.push(byte | 0x80);
        }
    }

    fn bool_field(number: u32, value: bool) -> Vec<u8> {
        let mut out = key(number, 0);
        out.push(u8::from(value));
        out
    }

    fn submessage(number: u32, body: &[u8]) -> Vec<u8> {
        let mut out = key(number, 2);
        out.extend(varint(body.len() as u64));
        out.extend_from_slice(body);
        out
    }

    fn options(bytes: &[u8]) -> ExtensionSet {
        ExtensionSet::decode(bytes).unwrap()
    }

    fn test_field(opts: &[u8]) -> Field {
        Field {
            name: "f".to_string(),
            json_name: "f".to_string(),
            number: 1,
            wire: WireType::String,
            cardinality: Cardinality::Singular,
            options: options(opts),
            comments: Comments::default(),
        }
    }

    fn test_message(opts: &[u8]) -> Message {
        Message {
            name: "M".to_string(),
            full_name: ".pkg.M".to_string(),
            file: FileId::default(),
            parent: None,
            fields: Vec::new(),
            nested_messages: Vec::new(),
            nested_enums: Vec::new(),
            map_entry: false,
            options: options(opts),
            comments: Comments::default(),
        }
    }

    fn table() -> AnnotationTable {
        AnnotationTable::new(&Options::default())
    }

    #[test]
    fn unannotated_is_optional() {
        let r = resolve(&table(), &test_message(&[]), &test_field(&[]));
        assert_eq!(r, Requiredness::Unannotated);
        assert!(!r.is_required());
    }

    #[test]
    fn field_behavior_required() {
        let mut opts = key(FIELD_BEHAVIOR_EXT, 0);
        opts.extend(varint(FIELD_BEHAVIOR_REQUIRED));
        let r = resolve(&table(), &test_message(&[]), &test_field(&opts));
        assert_eq!(r, Requiredness::FieldBehavior(true));
    }

    #[test]
    fn packed_field_behavior_without_required() {
        // OUTPUT_ONLY (3), IMMUTABLE (5), packed.
        let opts = submessage(FIELD_BEHAVIOR_EXT, &[3, 5]);
        let r = resolve(&table(), &test_message(&[]), &test_field(&opts));
        assert_eq!(r, Requiredness::FieldBehavior(false));
    }

    #[test]
    fn message_default_applies_to_unannotated_fields() {
        let msg = submessage(DEFAULT_MESSAGE_OPTIONS_EXT, &bool_field(1, true));
        assert!(is_required(&table(), &test_message(&msg), &test_field(&[])));

        let behavior = submessage(DEFAULT_MESSAGE_OPTIONS_EXT, &[0x10, 0x02]);
        assert!(is_required(&table(), &test_message(&behavior), &test_field(&[])));
    }

    #[test]
    fn field_override_beats_message_default() {
        let msg = submessage(DEFAULT_MESSAGE_OPTIONS_EXT, &bool_field(1, true));
        let field = submessage(DEFAULT_FIELD_OPTIONS_EXT, &bool_field(1, false));
        let r = resolve(&table(), &test_message(&msg), &test_field(&field));
        assert_eq!(r, Requiredness::FieldOverride(false));
    }

    #[test]
    fn field_override_beats_field_behavior() {
        let mut field = key(FIELD_BEHAVIOR_EXT, 0);
        field.extend(varint(FIELD_BEHAVIOR_REQUIRED));
        field.extend(submessage(DEFAULT_FIELD_OPTIONS_EXT, &bool_field(1, false)));
        assert!(!is_required(&table(), &test_message(&[]), &test_field(&field)));
    }

    #[test]
    fn validator_msg_exists() {
        let field = submessage(VALIDATOR_FIELD_EXT, &bool_field(VALIDATOR_MSG_EXISTS, true));
        let r = resolve(&table(), &test_message(&[]), &test_field(&field));
        assert_eq!(r, Requiredness::FieldOverride(true));
    }

    #[test]
    fn validator_without_msg_exists_falls_through() {
        // Only an unrelated rule (field 1) is set.
        let field = submessage(VALIDATOR_FIELD_EXT, &bool_field(1, true));
        let msg = submessage(DEFAULT_MESSAGE_OPTIONS_EXT, &bool_field(1, true));
        let r = resolve(&table(), &test_message(&msg), &test_field(&field));
        assert_eq!(r, Requiredness::MessageDefault(true));
    }

    #[test]
    fn configured_extension_numbers() {
        let options = Options {
            field_options_ext: 60000,
            ..Options::default()
        };
        let table = AnnotationTable::new(&options);
        let field = submessage(60000, &bool_field(1, true));
        assert!(is_required(&table, &test_message(&[]), &test_field(&field)));

        // The default number now means nothing.
        let field = submessage(DEFAULT_FIELD_OPTIONS_EXT, &bool_field(1, true));
        assert!(!is_required(&table, &test_message(&[]), &test_field(&field)));
    }

    #[test]
    fn malformed_annotation_is_ignored() {
        // Length-delimited payload holding a truncated varint.
        let field = submessage(DEFAULT_FIELD_OPTIONS_EXT, &[0x08, 0x80]);
        let r = resolve(&table(), &test_message(&[]), &test_field(&field));
        assert_eq!(r, Requiredness::Unannotated);
    }
}
