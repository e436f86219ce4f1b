//! Resolved schema model.
//!
//! Built once per run from the descriptors in the plugin request. Every
//! cross-file reference (field types, method inputs/outputs, dependencies)
//! is resolved here to an arena handle, so the translator never looks
//! anything up by name. After construction the model is read-only and is
//! shared freely between file-level workers.

use std::collections::HashMap;

use serde::Serialize;

use crate::descriptor::{
    DescriptorProto, EnumDescriptorProto, ExtensionSet, FieldDescriptorProto,
    FileDescriptorProto, MAP_ENTRY_OPTION, ServiceDescriptorProto, path,
};
use crate::error::{Error, Result};

/// Handle of a [`File`] inside a [`Schema`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FileId(usize);

/// Handle of a [`Message`] inside a [`Schema`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MessageId(usize);

/// Handle of an [`Enum`] inside a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EnumId(usize);

/// A message or enum a field can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeRef {
    Message(MessageId),
    Enum(EnumId),
}

/// The whole schema: every file in the request plus the message and enum arenas.
#[derive(Debug, Default, Serialize)]
pub struct Schema {
    files: Vec<File>,
    messages: Vec<Message>,
    enums: Vec<Enum>,
}

/// One `.proto` file.
#[derive(Debug, Serialize)]
pub struct File {
    /// Path as given by the host (e.g. `"api/v1/person.proto"`).
    pub name: String,

    /// Package name; empty when the file declares none.
    pub package: String,

    /// `"proto2"`, `"proto3"`, or empty.
    pub syntax: String,

    /// Top-level messages in declaration order.
    pub messages: Vec<MessageId>,

    /// Top-level enums in declaration order.
    pub enums: Vec<EnumId>,

    pub services: Vec<Service>,

    /// Directly imported files, in the order the file imports them.
    pub dependencies: Vec<FileId>,
}

/// A message, possibly nested inside another message.
#[derive(Debug, Serialize)]
pub struct Message {
    pub name: String,

    /// Fully-qualified name with leading dot (e.g. `".pkg.Outer.Inner"`).
    pub full_name: String,

    pub file: FileId,

    /// Enclosing message for nested declarations.
    pub parent: Option<MessageId>,

    /// Fields in declaration order. Never reordered.
    pub fields: Vec<Field>,

    pub nested_messages: Vec<MessageId>,
    pub nested_enums: Vec<EnumId>,

    /// Synthetic `XxxEntry` message backing a map field.
    pub map_entry: bool,

    /// Raw `MessageOptions` fields, including extensions.
    pub options: ExtensionSet,

    pub comments: Comments,
}

/// A message field.
#[derive(Debug, Serialize)]
pub struct Field {
    /// Name as declared in the schema.
    pub name: String,

    /// JSON-style alternate name (lowerCamelCase unless overridden).
    pub json_name: String,

    pub number: i32,
    pub wire: WireType,
    pub cardinality: Cardinality,

    /// Raw `FieldOptions` fields, including extensions.
    pub options: ExtensionSet,

    pub comments: Comments,
}

/// Scalar or structural type tag of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WireType {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
    Enum(EnumId),
    Message(MessageId),
    /// Groups and any type tag the translator does not understand.
    Unsupported,
}

impl WireType {
    /// Whether the value is a 64-bit integer.
    pub fn is_64_bit_integer(self) -> bool {
        matches!(
            self,
            WireType::Int64
                | WireType::Uint64
                | WireType::Sint64
                | WireType::Fixed64
                | WireType::Sfixed64
        )
    }
}

/// Whether a field holds one value, a sequence, or a key-value mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Cardinality {
    Singular,
    Repeated,
    Map { key: WireType, value: WireType },
}

/// An enum, possibly nested inside a message.
#[derive(Debug, Serialize)]
pub struct Enum {
    pub name: String,
    pub full_name: String,
    pub file: FileId,
    pub parent: Option<MessageId>,

    /// Values in declaration order, not numeric order.
    pub values: Vec<EnumValue>,

    pub comments: Comments,
}

#[derive(Debug, Serialize)]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
    pub comments: Comments,
}

#[derive(Debug, Serialize)]
pub struct Service {
    pub name: String,
    pub methods: Vec<Method>,
    pub comments: Comments,
}

#[derive(Debug, Serialize)]
pub struct Method {
    pub name: String,
    pub input: MessageId,
    pub output: MessageId,
    pub client_streaming: bool,
    pub server_streaming: bool,
    pub comments: Comments,
}

/// Source comments attached to a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Comments {
    pub leading: Option<String>,
    pub trailing: Option<String>,
}

impl Schema {
    pub fn file(&self, id: FileId) -> &File {
        &self.files[id.0]
    }

    pub fn message(&self, id: MessageId) -> &Message {
        &self.messages[id.0]
    }

    pub fn enumeration(&self, id: EnumId) -> &Enum {
        &self.enums[id.0]
    }

    /// All files with their handles, in request order.
    pub fn files(&self) -> impl Iterator<Item = (FileId, &File)> {
        self.files.iter().enumerate().map(|(i, f)| (FileId(i), f))
    }

    /// Look up a file by the name the host used for it.
    ///
    /// Only the plugin boundary uses this, to map `file_to_generate` entries.
    pub fn file_by_name(&self, name: &str) -> Option<FileId> {
        self.files.iter().position(|f| f.name == name).map(FileId)
    }

    /// File that declares a message or enum.
    pub fn file_of(&self, target: TypeRef) -> FileId {
        match target {
            TypeRef::Message(id) => self.message(id).file,
            TypeRef::Enum(id) => self.enumeration(id).file,
        }
    }

    /// Build the model from the request's file descriptors.
    ///
    /// Fails with [`Error::UnresolvedReference`] when a field, method, or
    /// dependency names something that is not in `files`.
    pub fn from_descriptors(files: &[FileDescriptorProto]) -> Result<Schema> {
        Builder::default().build(files)
    }
}

// ── Construction ───────────────────────────────────────────────────────

/// Message descriptor waiting for its fields to be resolved.
struct Pending<'a> {
    id: MessageId,
    proto: &'a DescriptorProto,
    path: Vec<i32>,
}

#[derive(Default)]
struct Builder<'a> {
    schema: Schema,
    symbols: HashMap<String, TypeRef>,
    descriptors: HashMap<MessageId, &'a DescriptorProto>,
    pending: Vec<(FileId, Pending<'a>)>,
}

const LABEL_REPEATED: i32 = 3;

impl<'a> Builder<'a> {
    fn build(mut self, files: &'a [FileDescriptorProto]) -> Result<Schema> {
        let comment_indexes: Vec<CommentIndex> = files.iter().map(CommentIndex::new).collect();

        // Pass 1: allocate every declaration and register its full name.
        for (proto, comments) in files.iter().zip(&comment_indexes) {
            let file_id = FileId(self.schema.files.len());
            let package = proto.package.clone().unwrap_or_default();
            let prefix = if package.is_empty() {
                String::new()
            } else {
                format!(".{package}")
            };

            let mut enums = Vec::new();
            for (i, e) in proto.enum_type.iter().enumerate() {
                let p = vec![path::FILE_ENUM, i as i32];
                enums.push(self.declare_enum(e, &prefix, file_id, None, &p, comments));
            }
            let mut messages = Vec::new();
            for (i, m) in proto.message_type.iter().enumerate() {
                let p = vec![path::FILE_MESSAGE, i as i32];
                messages.push(self.declare_message(m, &prefix, file_id, None, p, comments)?);
            }

            self.schema.files.push(File {
                name: proto.name.clone().unwrap_or_default(),
                package,
                syntax: proto.syntax.clone().unwrap_or_default(),
                messages,
                enums,
                services: Vec::new(),
                dependencies: Vec::new(),
            });
        }

        // Pass 2: resolve fields, services, and dependencies.
        let pending = std::mem::take(&mut self.pending);
        for (file_id, item) in &pending {
            let fields = self.resolve_fields(item, &comment_indexes[file_id.0])?;
            self.schema.messages[item.id.0].fields = fields;
        }

        for (i, (proto, comments)) in files.iter().zip(&comment_indexes).enumerate() {
            let file_id = FileId(i);

            let mut dependencies = Vec::new();
            for dep in &proto.dependency {
                let id = self
                    .schema
                    .files
                    .iter()
                    .position(|f| &f.name == dep)
                    .ok_or_else(|| Error::UnresolvedReference {
                        context: format!("import in {}", self.schema.files[i].name),
                        target: dep.clone(),
                    })?;
                dependencies.push(FileId(id));
            }

            let mut services = Vec::new();
            for (s, svc) in proto.service.iter().enumerate() {
                services.push(self.resolve_service(svc, file_id, s as i32, comments)?);
            }

            let file = &mut self.schema.files[i];
            file.dependencies = dependencies;
            file.services = services;
        }

        Ok(self.schema)
    }

    fn declare_enum(
        &mut self,
        proto: &EnumDescriptorProto,
        scope: &str,
        file: FileId,
        parent: Option<MessageId>,
        path: &[i32],
        comments: &CommentIndex,
    ) -> EnumId {
        let id = EnumId(self.schema.enums.len());
        let name = proto.name.clone().unwrap_or_default();
        let full_name = format!("{scope}.{name}");

        let values = proto
            .value
            .iter()
            .enumerate()
            .map(|(i, v)| EnumValue {
                name: v.name.clone().unwrap_or_default(),
                number: v.number.unwrap_or_default(),
                comments: comments.at(&child_path(path, path::ENUM_VALUE, i)),
            })
            .collect();

        self.symbols.insert(full_name.clone(), TypeRef::Enum(id));
        self.schema.enums.push(Enum {
            name,
            full_name,
            file,
            parent,
            values,
            comments: comments.at(path),
        });
        id
    }

    fn declare_message(
        &mut self,
        proto: &'a DescriptorProto,
        scope: &str,
        file: FileId,
        parent: Option<MessageId>,
        path: Vec<i32>,
        comments: &CommentIndex,
    ) -> Result<MessageId> {
        let id = MessageId(self.schema.messages.len());
        let name = proto.name.clone().unwrap_or_default();
        let full_name = format!("{scope}.{name}");
        let options = ExtensionSet::from_options(proto.options.as_deref())?;
        let map_entry = options.bool_value(MAP_ENTRY_OPTION).unwrap_or(false);

        self.symbols.insert(full_name.clone(), TypeRef::Message(id));
        self.descriptors.insert(id, proto);
        self.schema.messages.push(Message {
            name,
            full_name: full_name.clone(),
            file,
            parent,
            fields: Vec::new(),
            nested_messages: Vec::new(),
            nested_enums: Vec::new(),
            map_entry,
            options,
            comments: comments.at(&path),
        });

        let mut nested_enums = Vec::new();
        for (i, e) in proto.enum_type.iter().enumerate() {
            let p = child_path(&path, path::MESSAGE_ENUM, i);
            nested_enums.push(self.declare_enum(e, &full_name, file, Some(id), &p, comments));
        }
        let mut nested_messages = Vec::new();
        for (i, m) in proto.nested_type.iter().enumerate() {
            let p = child_path(&path, path::MESSAGE_NESTED, i);
            nested_messages.push(self.declare_message(m, &full_name, file, Some(id), p, comments)?);
        }

        let message = &mut self.schema.messages[id.0];
        message.nested_enums = nested_enums;
        message.nested_messages = nested_messages;

        self.pending.push((file, Pending { id, proto, path }));
        Ok(id)
    }

    fn resolve_fields(&self, item: &Pending<'a>, comments: &CommentIndex) -> Result<Vec<Field>> {
        let owner = &self.schema.messages[item.id.0].full_name;
        let mut fields = Vec::with_capacity(item.proto.field.len());

        for (i, proto) in item.proto.field.iter().enumerate() {
            let name = proto.name.clone().unwrap_or_default();
            let wire = self.resolve_wire(proto, owner)?;

            let repeated = proto.label == Some(LABEL_REPEATED);
            let cardinality = match wire {
                WireType::Message(target) if repeated && self.schema.messages[target.0].map_entry => {
                    self.map_cardinality(target)?
                }
                _ if repeated => Cardinality::Repeated,
                _ => Cardinality::Singular,
            };

            fields.push(Field {
                json_name: proto
                    .json_name
                    .clone()
                    .unwrap_or_else(|| crate::names::to_json_name(&name)),
                name,
                number: proto.number.unwrap_or_default(),
                wire,
                cardinality,
                options: ExtensionSet::from_options(proto.options.as_deref())?,
                comments: comments.at(&child_path(&item.path, path::MESSAGE_FIELD, i)),
            });
        }

        Ok(fields)
    }

    fn map_cardinality(&self, entry: MessageId) -> Result<Cardinality> {
        let entry_message = &self.schema.messages[entry.0];
        let proto = self.descriptors[&entry];
        let by_number = |n: i32| proto.field.iter().find(|f| f.number == Some(n));

        let (Some(key), Some(value)) = (by_number(1), by_number(2)) else {
            return Err(Error::UnresolvedReference {
                context: format!("map entry {}", entry_message.full_name),
                target: "key/value fields".to_string(),
            });
        };
        Ok(Cardinality::Map {
            key: self.resolve_wire(key, &entry_message.full_name)?,
            value: self.resolve_wire(value, &entry_message.full_name)?,
        })
    }

    fn resolve_wire(&self, proto: &FieldDescriptorProto, owner: &str) -> Result<WireType> {
        let wire = match proto.r#type {
            Some(1) => WireType::Double,
            Some(2) => WireType::Float,
            Some(3) => WireType::Int64,
            Some(4) => WireType::Uint64,
            Some(5) => WireType::Int32,
            Some(6) => WireType::Fixed64,
            Some(7) => WireType::Fixed32,
            Some(8) => WireType::Bool,
            Some(9) => WireType::String,
            Some(12) => WireType::Bytes,
            Some(13) => WireType::Uint32,
            Some(15) => WireType::Sfixed32,
            Some(16) => WireType::Sfixed64,
            Some(17) => WireType::Sint32,
            Some(18) => WireType::Sint64,
            Some(11) | Some(14) | None if proto.type_name.is_some() => {
                match self.lookup(proto, owner)? {
                    TypeRef::Message(id) => WireType::Message(id),
                    TypeRef::Enum(id) => WireType::Enum(id),
                }
            }
            Some(11) | Some(14) => {
                return Err(Error::UnresolvedReference {
                    context: field_context(owner, proto),
                    target: "<missing type name>".to_string(),
                });
            }
            _ => WireType::Unsupported,
        };
        Ok(wire)
    }

    fn lookup(&self, proto: &FieldDescriptorProto, owner: &str) -> Result<TypeRef> {
        let type_name = proto.type_name.as_deref().unwrap_or_default();
        self.symbol(type_name)
            .ok_or_else(|| Error::UnresolvedReference {
                context: field_context(owner, proto),
                target: type_name.to_string(),
            })
    }

    /// Look up a fully-qualified type name; the leading dot is optional.
    fn symbol(&self, type_name: &str) -> Option<TypeRef> {
        match type_name.strip_prefix('.') {
            Some(_) => self.symbols.get(type_name).copied(),
            None => self.symbols.get(&format!(".{type_name}")).copied(),
        }
    }

    fn resolve_service(
        &self,
        proto: &ServiceDescriptorProto,
        file: FileId,
        index: i32,
        comments: &CommentIndex,
    ) -> Result<Service> {
        let name = proto.name.clone().unwrap_or_default();
        let service_path = [path::FILE_SERVICE, index];
        let mut methods = Vec::with_capacity(proto.method.len());

        for (i, m) in proto.method.iter().enumerate() {
            let method_name = m.name.clone().unwrap_or_default();
            let context = format!(
                "method {}.{name}.{method_name}",
                self.schema.files[file.0].package
            );
            methods.push(Method {
                input: self.lookup_message(m.input_type.as_deref(), &context)?,
                output: self.lookup_message(m.output_type.as_deref(), &context)?,
                name: method_name,
                client_streaming: m.client_streaming.unwrap_or(false),
                server_streaming: m.server_streaming.unwrap_or(false),
                comments: comments.at(&child_path(&service_path, path::SERVICE_METHOD, i)),
            });
        }

        Ok(Service {
            name,
            methods,
            comments: comments.at(&service_path),
        })
    }

    fn lookup_message(&self, type_name: Option<&str>, context: &str) -> Result<MessageId> {
        let type_name = type_name.unwrap_or_default();
        match self.symbol(type_name) {
            Some(TypeRef::Message(id)) => Ok(id),
            _ => Err(Error::UnresolvedReference {
                context: context.to_string(),
                target: type_name.to_string(),
            }),
        }
    }
}

fn field_context(owner: &str, proto: &FieldDescriptorProto) -> String {
    format!(
        "field {}.{}",
        owner.trim_start_matches('.'),
        proto.name.as_deref().unwrap_or_default()
    )
}

fn child_path(parent: &[i32], kind: i32, index: usize) -> Vec<i32> {
    let mut p = parent.to_vec();
    p.push(kind);
    p.push(index as i32);
    p
}

/// Comments from a file's `source_code_info`, keyed by descriptor path.
struct CommentIndex {
    by_path: HashMap<Vec<i32>, Comments>,
}

impl CommentIndex {
    fn new(file: &FileDescriptorProto) -> Self {
        let mut by_path = HashMap::new();
        for location in file.source_code_info.iter().flat_map(|s| &s.location) {
            if location.leading_comments.is_none() && location.trailing_comments.is_none() {
                continue;
            }
            by_path.insert(
                location.path.clone(),
                Comments {
                    leading: location.leading_comments.clone(),
                    trailing: location.trailing_comments.clone(),
                },
            );
        }
        Self { by_path }
    }

    fn at(&self, path: &[i32]) -> Comments {
        self.by_path.get(path).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::descriptor::{Location, MethodDescriptorProto, SourceCodeInfo};

    pub(crate) fn field(name: &str, number: i32, ty: i32, type_name: Option<&str>) -> FieldDescriptorProto {
        FieldDescriptorProto {
            name: Some(name.to_string()),
            number: Some(number),
            label: Some(1),
            r#type: Some(ty),
            type_name: type_name.map(str::to_string),
            ..Default::default()
        }
    }

    pub(crate) fn repeated(mut f: FieldDescriptorProto) -> FieldDescriptorProto {
        f.label = Some(LABEL_REPEATED);
        f
    }

    pub(crate) fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
        DescriptorProto {
            name: Some(name.to_string()),
            field: fields,
            ..Default::default()
        }
    }

    pub(crate) fn file(name: &str, package: &str, messages: Vec<DescriptorProto>) -> FileDescriptorProto {
        FileDescriptorProto {
            name: Some(name.to_string()),
            package: Some(package.to_string()),
            message_type: messages,
            syntax: Some("proto3".to_string()),
            ..Default::default()
        }
    }

    fn map_entry(name: &str, key: FieldDescriptorProto, value: FieldDescriptorProto) -> DescriptorProto {
        // MessageOptions { map_entry: true } encoded by hand: field 7, varint 1.
        DescriptorProto {
            name: Some(name.to_string()),
            field: vec![key, value],
            options: Some(vec![0x38, 0x01]),
            ..Default::default()
        }
    }

    #[test]
    fn resolves_nested_and_cross_file_references() {
        let common = file("common.proto", "common", vec![message("Money", vec![])]);
        let mut outer = message(
            "Order",
            vec![
                field("total", 1, 11, Some(".common.Money")),
                field("line", 2, 11, Some(".shop.Order.Line")),
            ],
        );
        outer.nested_type.push(message("Line", vec![field("sku", 1, 9, None)]));
        let mut shop = file("shop.proto", "shop", vec![outer]);
        shop.dependency.push("common.proto".to_string());

        let schema = Schema::from_descriptors(&[common, shop]).unwrap();
        let shop_id = schema.file_by_name("shop.proto").unwrap();
        let shop = schema.file(shop_id);
        assert_eq!(shop.dependencies, vec![schema.file_by_name("common.proto").unwrap()]);

        let order = schema.message(shop.messages[0]);
        assert_eq!(order.full_name, ".shop.Order");
        let WireType::Message(money) = order.fields[0].wire else {
            panic!("expected message reference");
        };
        assert_eq!(schema.message(money).name, "Money");
        assert_eq!(schema.file_of(TypeRef::Message(money)), FileId(0));

        let WireType::Message(line) = order.fields[1].wire else {
            panic!("expected message reference");
        };
        assert_eq!(schema.message(line).parent, Some(shop.messages[0]));
    }

    #[test]
    fn repeated_map_entry_becomes_map() {
        let mut m = message(
            "Scores",
            vec![repeated(field("by_name", 1, 11, Some(".s.Scores.ByNameEntry")))],
        );
        m.nested_type.push(map_entry(
            "ByNameEntry",
            field("key", 1, 9, None),
            field("value", 2, 5, None),
        ));
        let schema = Schema::from_descriptors(&[file("s.proto", "s", vec![m])]).unwrap();
        let scores = schema.message(schema.file(FileId(0)).messages[0]);

        assert_eq!(
            scores.fields[0].cardinality,
            Cardinality::Map {
                key: WireType::String,
                value: WireType::Int32
            }
        );
        assert!(schema.message(scores.nested_messages[0]).map_entry);
    }

    #[test]
    fn unresolvable_field_reference_fails() {
        let m = message("Person", vec![field("friend", 1, 11, Some(".pkg.Missing"))]);
        let err = Schema::from_descriptors(&[file("p.proto", "pkg", vec![m])]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("pkg.Person.friend"), "{msg}");
        assert!(msg.contains(".pkg.Missing"), "{msg}");
    }

    #[test]
    fn missing_dependency_fails() {
        let mut f = file("p.proto", "pkg", vec![]);
        f.dependency.push("nowhere.proto".to_string());
        assert!(matches!(
            Schema::from_descriptors(&[f]),
            Err(Error::UnresolvedReference { .. })
        ));
    }

    #[test]
    fn group_is_unsupported() {
        let m = message("Legacy", vec![field("g", 1, 10, None)]);
        let schema = Schema::from_descriptors(&[file("l.proto", "l", vec![m])]).unwrap();
        let legacy = schema.message(schema.file(FileId(0)).messages[0]);
        assert_eq!(legacy.fields[0].wire, WireType::Unsupported);
    }

    #[test]
    fn enum_values_keep_declaration_order() {
        let mut f = file("e.proto", "e", vec![]);
        f.enum_type.push(EnumDescriptorProto {
            name: Some("Letter".to_string()),
            value: vec![
                crate::descriptor::EnumValueDescriptorProto {
                    name: Some("B".to_string()),
                    number: Some(2),
                },
                crate::descriptor::EnumValueDescriptorProto {
                    name: Some("A".to_string()),
                    number: Some(1),
                },
            ],
        });
        let schema = Schema::from_descriptors(&[f]).unwrap();
        let letter = schema.enumeration(schema.file(FileId(0)).enums[0]);
        let names: Vec<_> = letter.values.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["B", "A"]);
    }

    #[test]
    fn methods_resolve_and_unknown_input_fails() {
        let mut f = file("svc.proto", "svc", vec![message("Req", vec![]), message("Res", vec![])]);
        f.service.push(ServiceDescriptorProto {
            name: Some("Echo".to_string()),
            method: vec![MethodDescriptorProto {
                name: Some("Say".to_string()),
                input_type: Some(".svc.Req".to_string()),
                output_type: Some(".svc.Res".to_string()),
                client_streaming: None,
                server_streaming: Some(true),
            }],
        });
        let schema = Schema::from_descriptors(std::slice::from_ref(&f)).unwrap();
        let method = &schema.file(FileId(0)).services[0].methods[0];
        assert_eq!(schema.message(method.output).name, "Res");
        assert!(method.server_streaming);
        assert!(!method.client_streaming);

        f.service[0].method[0].input_type = Some(".svc.Nope".to_string());
        assert!(Schema::from_descriptors(&[f]).is_err());
    }

    #[test]
    fn method_types_resolve_without_leading_dot() {
        let mut f = file("svc.proto", "svc", vec![message("Req", vec![]), message("Res", vec![])]);
        f.service.push(ServiceDescriptorProto {
            name: Some("Echo".to_string()),
            method: vec![MethodDescriptorProto {
                name: Some("Say".to_string()),
                input_type: Some("svc.Req".to_string()),
                output_type: Some(".svc.Res".to_string()),
                client_streaming: None,
                server_streaming: None,
            }],
        });
        let schema = Schema::from_descriptors(&[f]).unwrap();
        let method = &schema.file(FileId(0)).services[0].methods[0];
        assert_eq!(schema.message(method.input).name, "Req");
        assert_eq!(schema.message(method.output).name, "Res");
    }

    #[test]
    fn comments_attach_by_path() {
        let mut f = file(
            "c.proto",
            "c",
            vec![message("Person", vec![field("name", 1, 9, None)])],
        );
        f.source_code_info = Some(SourceCodeInfo {
            location: vec![
                Location {
                    path: vec![4, 0],
                    leading_comments: Some(" A person.\n".to_string()),
                    ..Default::default()
                },
                Location {
                    path: vec![4, 0, 2, 0],
                    trailing_comments: Some(" full name\n".to_string()),
                    ..Default::default()
                },
            ],
        });
        let schema = Schema::from_descriptors(&[f]).unwrap();
        let person = schema.message(schema.file(FileId(0)).messages[0]);
        assert_eq!(person.comments.leading.as_deref(), Some(" A person.\n"));
        assert_eq!(person.fields[0].comments.trailing.as_deref(), Some(" full name\n"));
    }

    #[test]
    fn json_name_falls_back_to_camel_case() {
        let m = message("P", vec![field("page_number", 1, 5, None)]);
        let schema = Schema::from_descriptors(&[file("p.proto", "p", vec![m])]).unwrap();
        let p = schema.message(schema.file(FileId(0)).messages[0]);
        assert_eq!(p.fields[0].json_name, "pageNumber");
    }
}
