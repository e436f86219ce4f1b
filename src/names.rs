//! Name resolution and case conversion.
//!
//! # Qualification rules
//!
//! | Referenced entity | Rendered as |
//! |-------------------|-------------|
//! | top-level, same file | `Person` |
//! | nested, same file | `Person.Address` (chain of ancestor names) |
//! | other file, same package | `Person.Address` by package, `<alias>.Person.Address` by file |
//! | other package | `<alias>.Person.Address` |
//!
//! Targets whose files of one package share a scope qualify
//! [`Qualification::ByPackage`]; targets where every file is its own module
//! qualify [`Qualification::ByFile`].
//!
//! The module alias is derived from the referenced file's package with every
//! run of non-alphanumeric characters collapsed to one `_`
//! (`google.protobuf` → `google_protobuf`).

use serde::Serialize;

use crate::schema::{FileId, Schema, TypeRef};

/// A possibly module-qualified name, split so each target can join the
/// nesting chain with its own separator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualifiedName {
    /// Import alias when the entity lives in another package.
    pub module: Option<String>,

    /// Ancestor names followed by the entity's own name.
    pub path: Vec<String>,
}

impl QualifiedName {
    /// Join the chain with `separator`, prefixing `module.` when present.
    pub fn join(&self, separator: &str) -> String {
        let local = self.path.join(separator);
        match &self.module {
            Some(module) => format!("{module}.{local}"),
            None => local,
        }
    }
}

/// When a reference to another file carries its module alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualification {
    /// Only references into another package.
    ByPackage,
    /// Every reference into another file.
    ByFile,
}

/// Compute the name of `target` as seen from `current`.
pub fn qualified_name(
    schema: &Schema,
    target: TypeRef,
    current: FileId,
    qualification: Qualification,
) -> QualifiedName {
    let target_id = schema.file_of(target);
    let target_file = schema.file(target_id);
    let qualify = match qualification {
        Qualification::ByPackage => target_file.package != schema.file(current).package,
        Qualification::ByFile => target_id != current,
    };
    let module = qualify.then(|| module_alias(&target_file.package));
    QualifiedName {
        module,
        path: nesting_chain(schema, target),
    }
}

/// Ancestor message names followed by the entity's own name.
pub fn nesting_chain(schema: &Schema, target: TypeRef) -> Vec<String> {
    let (name, mut parent) = match target {
        TypeRef::Message(id) => {
            let m = schema.message(id);
            (m.name.clone(), m.parent)
        }
        TypeRef::Enum(id) => {
            let e = schema.enumeration(id);
            (e.name.clone(), e.parent)
        }
    };

    let mut chain = vec![name];
    while let Some(id) = parent {
        let m = schema.message(id);
        chain.push(m.name.clone());
        parent = m.parent;
    }
    chain.reverse();
    chain
}

/// Module alias for a package: runs of non-alphanumerics become one `_`.
///
/// - `"google.protobuf"` → `"google_protobuf"`
/// - `"acme/api..v1"` → `"acme_api_v1"`
/// - `""` → `"none"`
pub fn module_alias(package: &str) -> String {
    if package.is_empty() {
        return "none".to_string();
    }
    let mut alias = String::with_capacity(package.len());
    let mut in_separator = false;
    for c in package.chars() {
        if c.is_ascii_alphanumeric() {
            alias.push(c);
            in_separator = false;
        } else if !in_separator {
            alias.push('_');
            in_separator = true;
        }
    }
    alias
}

/// protoc's default JSON name: underscores dropped, next letter uppercased.
///
/// - `"page_number"` → `"pageNumber"`
/// - `"result_per_page"` → `"resultPerPage"`
pub fn to_json_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Uppercase the first character.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Lowercase the first character.
pub fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().chain(chars).collect(),
    }
}
