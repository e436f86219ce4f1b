//! Declaration emission from a resolved [`Schema`].
//!
//! Each requested schema file becomes one declaration file containing, in
//! order:
//! - a generated-code header
//! - the import block for references into other files
//! - enums, messages (with nested declarations) and services, optionally
//!   wrapped in a package namespace
//!
//! The output is deterministic: files are rendered in file-name order and
//! every declaration, field, enum value and method keeps its schema order.

use std::collections::BTreeMap;
use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::{Options, OutputNameContext};
use crate::error::{Error, Result};
use crate::imports::ImportTracker;
use crate::names::nesting_chain;
use crate::optionality::{self, AnnotationTable};
use crate::schema::{EnumId, Field, File, FileId, MessageId, Schema, Service, TypeRef};
use crate::signature::build_signature;
use crate::target::{
    FieldDecl, INDENT, MethodDecl, TypeSystem, ValueDecl, comment_lines, for_target,
};
use crate::type_map::{TypeMapper, contains_unknown};

/// Statistics collected during generation for reporting.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GenerationStats {
    pub files_generated: usize,
    pub messages_generated: usize,
    pub enums_generated: usize,
    pub services_generated: usize,
    pub unknown_types_defaulted: usize,
    pub unused_imports: usize,
}

impl GenerationStats {
    fn absorb(&mut self, other: &Self) {
        self.files_generated += other.files_generated;
        self.messages_generated += other.messages_generated;
        self.enums_generated += other.enums_generated;
        self.services_generated += other.services_generated;
        self.unknown_types_defaulted += other.unknown_types_defaulted;
        self.unused_imports += other.unused_imports;
    }
}

/// One rendered output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub name: String,
    pub content: String,
}

/// Result of a generation run.
#[derive(Debug, Clone, Default)]
pub struct Generated {
    pub files: Vec<GeneratedFile>,
    pub stats: GenerationStats,
}

/// Render declarations for the `targets` files of `schema`.
///
/// Files are rendered in parallel but returned in file-name order. Fails
/// on the first error of any file, or when two files render to the same
/// output name.
pub fn generate(schema: &Schema, targets: &[FileId], options: &Options) -> Result<Generated> {
    let table = AnnotationTable::new(options);

    let mut order = targets.to_vec();
    order.sort_by(|a, b| schema.file(*a).name.cmp(&schema.file(*b).name));
    order.dedup();

    let rendered: Vec<(GeneratedFile, GenerationStats)> = order
        .par_iter()
        .map(|&id| render_file(schema, id, options, &table))
        .collect::<Result<_>>()?;

    let mut owners: BTreeMap<&str, &str> = BTreeMap::new();
    for ((file, _), &id) in rendered.iter().zip(&order) {
        let source = schema.file(id).name.as_str();
        if let Some(first) = owners.insert(file.name.as_str(), source) {
            return Err(Error::OutputCollision {
                output: file.name.clone(),
                first: first.to_string(),
                second: source.to_string(),
            });
        }
    }

    let mut generated = Generated::default();
    for (file, stats) in rendered {
        generated.stats.absorb(&stats);
        generated.files.push(file);
    }

    info!(
        language = %options.target,
        files = generated.stats.files_generated,
        messages = generated.stats.messages_generated,
        enums = generated.stats.enums_generated,
        services = generated.stats.services_generated,
        "generated declarations"
    );
    Ok(generated)
}

/// Render one schema file.
pub fn render_file(
    schema: &Schema,
    id: FileId,
    options: &Options,
    table: &AnnotationTable,
) -> Result<(GeneratedFile, GenerationStats)> {
    let file = schema.file(id);
    let target = for_target(options.target);
    let name = options.outpattern.render(&OutputNameContext {
        file_name: &file.name,
        package: &file.package,
    });

    let mut emitter = Emitter {
        schema,
        file,
        options,
        table,
        target,
        mapper: TypeMapper::new(schema, options, id),
        imports: ImportTracker::new(id),
        declared: BTreeMap::new(),
        out: Writer::default(),
        stats: GenerationStats {
            files_generated: 1,
            ..GenerationStats::default()
        },
    };
    emitter.emit_file(file)?;

    let imports = emitter.imports.imports(schema);
    for import in imports.iter().filter(|i| !i.used) {
        debug!(file = %file.name, import = %import.file_name, "import not used");
        emitter.stats.unused_imports += 1;
    }

    let mut head = Writer::default();
    head.lines(&target.header(file));
    head.blank();
    if !imports.is_empty() {
        for import in &imports {
            head.line(&target.import_line(import));
        }
        head.blank();
    }

    let mut content = head.finish();
    content.push_str(&emitter.out.finish());
    let content = format!("{}\n", content.trim_end());

    debug!(
        file = %file.name,
        output = %name,
        pattern = options.outpattern.as_str(),
        imports = imports.len(),
        "rendered file"
    );
    Ok((GeneratedFile { name, content }, emitter.stats))
}

/// Write generated files under `output_dir`, creating directories as needed.
pub fn write_files(files: &[GeneratedFile], output_dir: &Path) -> Result<()> {
    for file in files {
        write_file(&output_dir.join(&file.name), &file.content)?;
    }
    Ok(())
}

// ── Emitter ────────────────────────────────────────────────────────────

struct Emitter<'a> {
    schema: &'a Schema,
    file: &'a File,
    options: &'a Options,
    table: &'a AnnotationTable,
    target: &'static dyn TypeSystem,
    mapper: TypeMapper<'a>,
    imports: ImportTracker,
    /// Rendered declaration names in this file, with the entity that took each.
    declared: BTreeMap<String, String>,
    out: Writer,
    stats: GenerationStats,
}

impl<'a> Emitter<'a> {
    fn emit_file(&mut self, file: &'a File) -> Result<()> {
        let scope = self.target.namespace(&file.package, self.options);
        if let Some(scope) = &scope {
            self.out.line(&scope.open);
            self.out.indent += 1;
        }

        for &id in &file.enums {
            self.emit_enum(id)?;
        }
        for &id in &file.messages {
            self.emit_message(id)?;
        }
        for service in &file.services {
            self.emit_service(service)?;
        }

        if let Some(scope) = &scope {
            self.out.close(&scope.close);
        }
        Ok(())
    }

    /// Declared name: the full chain for hoisting targets, else the simple name.
    fn declared_name(&self, target: TypeRef) -> String {
        let chain = nesting_chain(self.schema, target);
        if self.target.hoists_nested() {
            chain.join(self.target.name_separator())
        } else {
            chain.last().cloned().unwrap_or_default()
        }
    }

    /// Reserve a rendered name; a second entity claiming it is an error.
    fn claim(&mut self, name: String, origin: String) -> Result<()> {
        match self.declared.get(&name) {
            Some(first) => Err(Error::NameCollision {
                file: self.file.name.clone(),
                name,
                first: first.clone(),
                second: origin,
            }),
            None => {
                self.declared.insert(name, origin);
                Ok(())
            }
        }
    }

    /// Scope-qualified key of a declaration within this file.
    fn scope_key(&self, target: TypeRef) -> String {
        nesting_chain(self.schema, target).join(self.target.name_separator())
    }

    fn leading(&mut self, text: Option<&str>) {
        self.out.lines(&comment_lines(self.target, text));
    }

    fn emit_enum(&mut self, id: EnumId) -> Result<()> {
        let schema = self.schema;
        let enumeration = schema.enumeration(id);
        let name = self.declared_name(TypeRef::Enum(id));
        self.claim(self.scope_key(TypeRef::Enum(id)), enumeration.full_name.clone())?;
        for value in &enumeration.values {
            if let Some(constructor) = self.target.value_constructor(&name, &value.name) {
                let origin = format!("{}.{}", enumeration.full_name, value.name);
                self.claim(constructor, origin)?;
            }
        }
        let values: Vec<ValueDecl> = enumeration
            .values
            .iter()
            .map(|v| ValueDecl {
                name: v.name.clone(),
                number: v.number,
                comments: v.comments.clone(),
            })
            .collect();

        self.leading(enumeration.comments.leading.as_deref());
        self.out
            .lines(&self.target.enum_decl(&name, &values, self.options.int_enums));
        self.out.blank();
        self.stats.enums_generated += 1;
        Ok(())
    }

    fn emit_message(&mut self, id: MessageId) -> Result<()> {
        let schema = self.schema;
        let message = schema.message(id);
        if message.map_entry {
            return Ok(());
        }
        self.claim(self.scope_key(TypeRef::Message(id)), message.full_name.clone())?;

        let mut fields = Vec::with_capacity(message.fields.len());
        for field in &message.fields {
            let ty = self.mapper.map_field(field, &mut self.imports)?;
            if contains_unknown(&ty) {
                self.stats.unknown_types_defaulted += 1;
            }
            fields.push(FieldDecl {
                name: member_name(field, self.options.original_names),
                required: optionality::is_required(self.table, message, field),
                ty,
                comments: field.comments.clone(),
            });
        }

        self.leading(message.comments.leading.as_deref());
        let name = self.declared_name(TypeRef::Message(id));
        self.out.lines(&self.target.message_decl(&name, &fields));
        self.out.blank();
        self.stats.messages_generated += 1;

        let nested: Vec<MessageId> = message
            .nested_messages
            .iter()
            .copied()
            .filter(|m| !schema.message(*m).map_entry)
            .collect();
        if nested.is_empty() && message.nested_enums.is_empty() {
            return Ok(());
        }

        let scope = self.target.nested_scope(&message.name);
        if let Some(scope) = &scope {
            self.out.line(&scope.open);
            self.out.indent += 1;
        }
        for &e in &message.nested_enums {
            self.emit_enum(e)?;
        }
        for m in nested {
            self.emit_message(m)?;
        }
        if let Some(scope) = &scope {
            self.out.close(&scope.close);
            self.out.blank();
        }
        Ok(())
    }

    fn emit_service(&mut self, service: &Service) -> Result<()> {
        let name = service_name(&service.name);
        let origin = match self.file.package.as_str() {
            "" => service.name.clone(),
            package => format!("{package}.{}", service.name),
        };
        self.claim(name.clone(), format!("service {origin}"))?;

        let mut methods = Vec::with_capacity(service.methods.len());
        for method in &service.methods {
            let input = self
                .mapper
                .named(TypeRef::Message(method.input), &mut self.imports)?;
            let output = self
                .mapper
                .named(TypeRef::Message(method.output), &mut self.imports)?;
            methods.push(MethodDecl {
                signature: build_signature(method, input, output, self.options.async_iterators),
                comments: method.comments.clone(),
            });
        }

        self.leading(service.comments.leading.as_deref());
        self.out
            .lines(&self.target.service_decl(&name, &methods));
        self.out.blank();
        self.stats.services_generated += 1;
        Ok(())
    }
}

fn member_name(field: &Field, original_names: bool) -> String {
    if original_names {
        field.name.clone()
    } else {
        field.json_name.clone()
    }
}

/// `Search` → `SearchService`.
fn service_name(name: &str) -> String {
    format!("{name}Service")
}

/// Line buffer with block indentation.
#[derive(Debug, Default)]
struct Writer {
    buf: String,
    indent: usize,
}

impl Writer {
    fn line(&mut self, text: &str) {
        if text.is_empty() {
            self.buf.push('\n');
            return;
        }
        for _ in 0..self.indent {
            self.buf.push_str(INDENT);
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    fn lines(&mut self, lines: &[String]) {
        for line in lines {
            self.line(line);
        }
    }

    /// Single blank separator; never doubled.
    fn blank(&mut self) {
        if !self.buf.is_empty() && !self.buf.ends_with("\n\n") {
            self.buf.push('\n');
        }
    }

    /// Dedent and close a block, dropping the trailing separator.
    fn close(&mut self, text: &str) {
        while self.buf.ends_with("\n\n") {
            self.buf.pop();
        }
        self.indent = self.indent.saturating_sub(1);
        self.line(text);
    }

    fn finish(self) -> String {
        self.buf
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::Write {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(path, content).map_err(|e| Error::Write {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_indents_and_closes_blocks() {
        let mut w = Writer::default();
        w.line("declare namespace pkg {");
        w.indent += 1;
        w.line("export interface A {");
        w.line("}");
        w.blank();
        w.blank();
        w.close("}");
        assert_eq!(
            w.finish(),
            "declare namespace pkg {\n    export interface A {\n    }\n}\n"
        );
    }

    #[test]
    fn service_suffix() {
        assert_eq!(service_name("Search"), "SearchService");
        assert_eq!(service_name("SearchService"), "SearchServiceService");
    }
}
