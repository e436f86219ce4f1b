//! Maps schema field types to target-independent type expressions.
//!
//! # Type Mapping Table
//!
//! | Wire type | Scalar | Notes |
//! |-----------|--------|-------|
//! | `double`, `float` | `Float` | |
//! | `int32`, `uint32`, `sint32`, `fixed32`, `sfixed32` | `Integer` | |
//! | `int64`, `uint64`, `sint64`, `fixed64`, `sfixed64` | `Integer` | `String` with `int64_string` |
//! | `bool` | `Boolean` | |
//! | `string` | `String` | |
//! | `bytes` | `Bytes` | |
//! | enum / message | named reference | qualified via [`crate::names`] |
//! | group, unknown | `Unknown` | rendered as an explicit placeholder |
//!
//! Repeated fields wrap the element in [`TypeExpr::Repeated`]; map fields
//! become [`TypeExpr::Map`] with key and value mapped independently. The
//! expressions are rendered by a [`crate::target::TypeSystem`].

use serde::Serialize;
use tracing::warn;

use crate::config::Options;
use crate::error::Result;
use crate::imports::ImportTracker;
use crate::names::{Qualification, QualifiedName, qualified_name};
use crate::schema::{Cardinality, Field, FileId, Schema, TypeRef, WireType};
use crate::target::for_target;

/// Target-independent primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Scalar {
    Float,
    Integer,
    Boolean,
    String,
    Bytes,
    /// Placeholder for wire types without a mapping.
    Unknown,
    /// Absence of a value (callback and streaming return types).
    Void,
}

/// A type expression in the shared type AST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TypeExpr {
    Primitive(Scalar),
    Named(QualifiedName),
    Repeated(Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
    /// Inline record type.
    Object(Vec<Member>),
    Function {
        params: Vec<Member>,
        returns: Box<TypeExpr>,
    },
    /// Asynchronous sequence of values.
    Iterator(Box<TypeExpr>),
}

/// A named slot of an object type or a function parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    pub name: String,
    pub required: bool,
    pub ty: TypeExpr,
}

impl Member {
    /// A required member, as used for parameters.
    pub fn required(name: &str, ty: TypeExpr) -> Self {
        Self {
            name: name.to_string(),
            required: true,
            ty,
        }
    }
}

/// Map a wire type to its scalar, or `None` for enum and message references.
///
/// 64-bit integers become [`Scalar::String`] when `int64_string` is set;
/// no other mapping depends on configuration.
pub fn scalar_for(wire: WireType, options: &Options) -> Option<Scalar> {
    let scalar = match wire {
        WireType::Double | WireType::Float => Scalar::Float,

        WireType::Int32
        | WireType::Uint32
        | WireType::Sint32
        | WireType::Fixed32
        | WireType::Sfixed32 => Scalar::Integer,

        w if w.is_64_bit_integer() => {
            if options.int64_string {
                Scalar::String
            } else {
                Scalar::Integer
            }
        }

        WireType::Bool => Scalar::Boolean,
        WireType::String => Scalar::String,
        WireType::Bytes => Scalar::Bytes,

        WireType::Enum(_) | WireType::Message(_) => return None,

        _ => Scalar::Unknown,
    };
    Some(scalar)
}

/// Maps the fields of one schema file.
///
/// Every reference into another file is recorded in the file's
/// [`ImportTracker`], whether or not the target qualifies it.
pub struct TypeMapper<'a> {
    schema: &'a Schema,
    options: &'a Options,
    current: FileId,
    qualification: Qualification,
}

impl<'a> TypeMapper<'a> {
    pub fn new(schema: &'a Schema, options: &'a Options, current: FileId) -> Self {
        Self {
            schema,
            options,
            current,
            qualification: for_target(options.target).qualification(),
        }
    }

    /// Map a field's wire type and cardinality.
    pub fn map_field(&self, field: &Field, imports: &mut ImportTracker) -> Result<TypeExpr> {
        let ty = match field.cardinality {
            Cardinality::Singular => self.map_wire(field.wire, imports)?,
            Cardinality::Repeated => {
                TypeExpr::Repeated(Box::new(self.map_wire(field.wire, imports)?))
            }
            Cardinality::Map { key, value } => {
                let key = match key {
                    // Keys travel as strings; a boolean index type is not expressible.
                    WireType::Bool => TypeExpr::Primitive(Scalar::String),
                    other => self.map_wire(other, imports)?,
                };
                TypeExpr::Map(Box::new(key), Box::new(self.map_wire(value, imports)?))
            }
        };

        if contains_unknown(&ty) {
            warn!(
                field = %field.name,
                file = %self.schema.file(self.current).name,
                "unsupported wire type rendered as unknown"
            );
        }
        Ok(ty)
    }

    /// Map a single (non-repeated) value type.
    pub fn map_wire(&self, wire: WireType, imports: &mut ImportTracker) -> Result<TypeExpr> {
        if let Some(scalar) = scalar_for(wire, self.options) {
            return Ok(TypeExpr::Primitive(scalar));
        }
        match wire {
            WireType::Enum(id) => self.named(TypeRef::Enum(id), imports),
            WireType::Message(id) => self.named(TypeRef::Message(id), imports),
            _ => Ok(TypeExpr::Primitive(Scalar::Unknown)),
        }
    }

    /// Reference a message or enum by its qualified name.
    pub fn named(&self, target: TypeRef, imports: &mut ImportTracker) -> Result<TypeExpr> {
        let name = qualified_name(self.schema, target, self.current, self.qualification);
        let file = self.schema.file_of(target);
        if file != self.current {
            imports.record(self.schema, file)?;
        }
        Ok(TypeExpr::Named(name))
    }
}

/// Whether an expression contains the unknown placeholder anywhere.
pub fn contains_unknown(ty: &TypeExpr) -> bool {
    match ty {
        TypeExpr::Primitive(s) => *s == Scalar::Unknown,
        TypeExpr::Named(_) => false,
        TypeExpr::Repeated(inner) | TypeExpr::Iterator(inner) => contains_unknown(inner),
        TypeExpr::Map(k, v) => contains_unknown(k) || contains_unknown(v),
        TypeExpr::Object(members) => members.iter().any(|m| contains_unknown(&m.ty)),
        TypeExpr::Function { params, returns } => {
            params.iter().any(|m| contains_unknown(&m.ty)) || contains_unknown(returns)
        }
    }
}
