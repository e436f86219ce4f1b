//! Target type systems.
//!
//! Every target renders the shared [`TypeExpr`] AST and lays out the
//! declaration blocks the emitter asks for. Declarations come back as lines
//! without outer indentation; the emitter owns nesting.
//!
//! | Concept | TypeScript | Flow | Elm |
//! |---------|-----------|------|-----|
//! | float, integer | `number` | `number` | `Float`, `Int` |
//! | bytes | `Uint8Array` | `string` | `String` |
//! | unknown | `any /*unknown*/` | `any /*unknown*/` | `String {- unknown -}` |
//! | repeated | `Array<T>` | `Array<T>` | `List T` |
//! | map | `{ [key: K]: V }` | `{ [key: K]: V }` | `Dict K V` |
//! | optional member | `name?: T` | `name?: T` | `name : Maybe T` |
//! | nested declaration | `export namespace Outer` | `Outer_Inner` | `Outer_Inner` |

use crate::config::{Options, Target};
use crate::imports::Import;
use crate::names::{Qualification, QualifiedName, capitalize, lower_first};
use crate::schema::{Comments, File};
use crate::signature::Signature;
use crate::type_map::{Member, Scalar, TypeExpr};

/// One level of declaration indentation.
pub const INDENT: &str = "    ";

const GENERATED_NOTICE: &str = "Code generated by protoc-gen-decls. DO NOT EDIT.";

/// Opening and closing line of a block that indents its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub open: String,
    pub close: String,
}

/// A message field as the emitter hands it to a target.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub required: bool,
    pub ty: TypeExpr,
    pub comments: Comments,
}

#[derive(Debug, Clone)]
pub struct ValueDecl {
    pub name: String,
    pub number: i32,
    pub comments: Comments,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub signature: Signature,
    pub comments: Comments,
}

/// Rendering rules of one output language.
pub trait TypeSystem: Send + Sync {
    fn scalar(&self, scalar: Scalar) -> &'static str;
    fn named(&self, name: &QualifiedName) -> String;
    fn repeated(&self, element: &TypeExpr) -> String;
    fn map(&self, key: &TypeExpr, value: &TypeExpr) -> String;
    fn iterator(&self, element: &TypeExpr) -> String;
    fn object(&self, members: &[Member]) -> String;
    fn function(&self, params: &[Member], returns: &TypeExpr) -> String;

    fn render(&self, ty: &TypeExpr) -> String {
        match ty {
            TypeExpr::Primitive(scalar) => self.scalar(*scalar).to_string(),
            TypeExpr::Named(name) => self.named(name),
            TypeExpr::Repeated(element) => self.repeated(element),
            TypeExpr::Map(key, value) => self.map(key, value),
            TypeExpr::Object(members) => self.object(members),
            TypeExpr::Function { params, returns } => self.function(params, returns),
            TypeExpr::Iterator(element) => self.iterator(element),
        }
    }

    /// Separator between the names of a nesting chain.
    fn name_separator(&self) -> &'static str;

    /// Whether nested declarations are lifted to the enclosing scope.
    fn hoists_nested(&self) -> bool;

    /// Which references to other files carry the module alias.
    fn qualification(&self) -> Qualification;

    /// Module-level value name an enum value introduces, if any.
    fn value_constructor(&self, _enum_name: &str, _value: &str) -> Option<String> {
        None
    }

    /// A single comment line; `text` is used verbatim.
    fn comment(&self, text: &str) -> String;

    fn header(&self, file: &File) -> Vec<String>;
    fn import_line(&self, import: &Import) -> String;

    /// Package-level wrapper, if any.
    fn namespace(&self, _package: &str, _options: &Options) -> Option<Scope> {
        None
    }

    /// Wrapper for the declarations nested in message `name`.
    fn nested_scope(&self, _name: &str) -> Option<Scope> {
        None
    }

    fn enum_decl(&self, name: &str, values: &[ValueDecl], int_enums: bool) -> Vec<String>;
    fn message_decl(&self, name: &str, fields: &[FieldDecl]) -> Vec<String>;
    fn service_decl(&self, name: &str, methods: &[MethodDecl]) -> Vec<String>;
    fn method_member(&self, signature: &Signature) -> String;
}

static TYPESCRIPT: TypeScript = TypeScript;
static FLOW: Flow = Flow;
static ELM: Elm = Elm;

pub fn for_target(target: Target) -> &'static dyn TypeSystem {
    match target {
        Target::TypeScript => &TYPESCRIPT,
        Target::Flow => &FLOW,
        Target::Elm => &ELM,
    }
}

/// Leading comment text as comment lines.
pub fn comment_lines(target: &dyn TypeSystem, text: Option<&str>) -> Vec<String> {
    let Some(text) = text else {
        return Vec::new();
    };
    text.trim_end_matches('\n')
        .split('\n')
        .map(|line| target.comment(line.trim_end()))
        .collect()
}

/// Trailing comment folded onto one line, with a separating space.
fn trailing(target: &dyn TypeSystem, comments: &Comments) -> String {
    match comments.trailing.as_deref() {
        Some(text) if !text.trim().is_empty() => {
            let folded = text.split_whitespace().collect::<Vec<_>>().join(" ");
            format!(" {}", target.comment(&format!(" {folded}")))
        }
        _ => String::new(),
    }
}

/// Member lines with leading comments above and trailing comments after.
fn members<T>(
    target: &dyn TypeSystem,
    items: &[T],
    comments: impl Fn(&T) -> &Comments,
    line: impl Fn(usize, &T) -> String,
) -> Vec<String> {
    let mut out = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let c = comments(item);
        for l in comment_lines(target, c.leading.as_deref()) {
            out.push(format!("{INDENT}{l}"));
        }
        out.push(format!("{INDENT}{}{}", line(i, item), trailing(target, c)));
    }
    out
}

// ── TypeScript ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct TypeScript;

impl TypeScript {
    fn slot(&self, name: &str, required: bool, ty: &TypeExpr) -> String {
        format!("{name}{}: {}", if required { "" } else { "?" }, self.render(ty))
    }
}

impl TypeSystem for TypeScript {
    fn scalar(&self, scalar: Scalar) -> &'static str {
        js_scalar(scalar)
    }

    fn named(&self, name: &QualifiedName) -> String {
        name.join(".")
    }

    fn repeated(&self, element: &TypeExpr) -> String {
        format!("Array<{}>", self.render(element))
    }

    fn map(&self, key: &TypeExpr, value: &TypeExpr) -> String {
        format!("{{ [key: {}]: {} }}", self.render(key), self.render(value))
    }

    fn iterator(&self, element: &TypeExpr) -> String {
        format!("AsyncIterator<{}>", self.render(element))
    }

    fn object(&self, members: &[Member]) -> String {
        let inner: Vec<String> = members
            .iter()
            .map(|m| self.slot(&m.name, m.required, &m.ty))
            .collect();
        format!("{{ {} }}", inner.join(", "))
    }

    fn function(&self, params: &[Member], returns: &TypeExpr) -> String {
        let params: Vec<String> = params
            .iter()
            .map(|m| self.slot(&m.name, m.required, &m.ty))
            .collect();
        format!("({}) => {}", params.join(", "), self.render(returns))
    }

    fn name_separator(&self) -> &'static str {
        "."
    }

    fn hoists_nested(&self) -> bool {
        false
    }

    fn qualification(&self) -> Qualification {
        Qualification::ByPackage
    }

    fn comment(&self, text: &str) -> String {
        format!("//{text}")
    }

    fn header(&self, file: &File) -> Vec<String> {
        vec![
            format!("// {GENERATED_NOTICE}"),
            format!("// source: {}", file.name),
        ]
    }

    fn import_line(&self, import: &Import) -> String {
        let line = format!("import * as {} from \"{}\";", import.alias, import.path);
        if import.used {
            line
        } else {
            format!("// {line} // imported but not used")
        }
    }

    fn namespace(&self, package: &str, options: &Options) -> Option<Scope> {
        if !options.declare_namespace || package.is_empty() {
            return None;
        }
        Some(Scope {
            open: format!("declare namespace {package} {{"),
            close: "}".to_string(),
        })
    }

    fn nested_scope(&self, name: &str) -> Option<Scope> {
        Some(Scope {
            open: format!("export namespace {name} {{"),
            close: "}".to_string(),
        })
    }

    fn enum_decl(&self, name: &str, values: &[ValueDecl], int_enums: bool) -> Vec<String> {
        let mut out = vec![format!("export enum {name} {{")];
        out.extend(members(self, values, |v| &v.comments, |_, v| {
            if int_enums {
                format!("{} = {},", v.name, v.number)
            } else {
                format!("{} = \"{}\",", v.name, v.name)
            }
        }));
        out.push("}".to_string());
        out
    }

    fn message_decl(&self, name: &str, fields: &[FieldDecl]) -> Vec<String> {
        let mut out = vec![format!("export interface {name} {{")];
        out.extend(members(self, fields, |f| &f.comments, |_, f| {
            format!("{};", self.slot(&f.name, f.required, &f.ty))
        }));
        out.push("}".to_string());
        out
    }

    fn service_decl(&self, name: &str, methods: &[MethodDecl]) -> Vec<String> {
        js_service_decl(self, name, methods)
    }

    fn method_member(&self, signature: &Signature) -> String {
        let params: Vec<String> = signature
            .params
            .iter()
            .map(|m| self.slot(&m.name, m.required, &m.ty))
            .collect();
        format!(
            "{}({}): {};",
            signature.name,
            params.join(", "),
            self.render(&signature.returns)
        )
    }
}

// ── Flow ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct Flow;

impl Flow {
    fn slot(&self, name: &str, required: bool, ty: &TypeExpr) -> String {
        format!("{name}{}: {}", if required { "" } else { "?" }, self.render(ty))
    }
}

impl TypeSystem for Flow {
    fn scalar(&self, scalar: Scalar) -> &'static str {
        match scalar {
            Scalar::Bytes => "string",
            other => js_scalar(other),
        }
    }

    fn named(&self, name: &QualifiedName) -> String {
        name.join("_")
    }

    fn repeated(&self, element: &TypeExpr) -> String {
        format!("Array<{}>", self.render(element))
    }

    fn map(&self, key: &TypeExpr, value: &TypeExpr) -> String {
        format!("{{ [key: {}]: {} }}", self.render(key), self.render(value))
    }

    fn iterator(&self, element: &TypeExpr) -> String {
        format!("AsyncIterator<{}>", self.render(element))
    }

    fn object(&self, members: &[Member]) -> String {
        let inner: Vec<String> = members
            .iter()
            .map(|m| self.slot(&m.name, m.required, &m.ty))
            .collect();
        format!("{{ {} }}", inner.join(", "))
    }

    fn function(&self, params: &[Member], returns: &TypeExpr) -> String {
        let params: Vec<String> = params
            .iter()
            .map(|m| self.slot(&m.name, m.required, &m.ty))
            .collect();
        format!("({}) => {}", params.join(", "), self.render(returns))
    }

    fn name_separator(&self) -> &'static str {
        "_"
    }

    fn hoists_nested(&self) -> bool {
        true
    }

    fn qualification(&self) -> Qualification {
        Qualification::ByFile
    }

    fn comment(&self, text: &str) -> String {
        format!("//{text}")
    }

    fn header(&self, file: &File) -> Vec<String> {
        vec![
            "/* @flow */".to_string(),
            "/* eslint-disable */".to_string(),
            format!("// {GENERATED_NOTICE}"),
            format!("// source: {}", file.name),
        ]
    }

    fn import_line(&self, import: &Import) -> String {
        let line = format!("import * as {} from '{}';", import.alias, import.path);
        if import.used {
            line
        } else {
            format!("// {line} // imported but not used")
        }
    }

    fn enum_decl(&self, name: &str, values: &[ValueDecl], int_enums: bool) -> Vec<String> {
        if values.is_empty() {
            return vec![format!("export type {name} = empty;")];
        }
        let last = values.len() - 1;
        let mut out = vec![format!("export type {name} =")];
        out.extend(members(self, values, |v| &v.comments, |i, v| {
            let end = if i == last { ";" } else { "" };
            if int_enums {
                format!("| {}{end}", v.number)
            } else {
                format!("| \"{}\"{end}", v.name)
            }
        }));
        out
    }

    fn message_decl(&self, name: &str, fields: &[FieldDecl]) -> Vec<String> {
        let mut out = vec![format!("export type {name} = {{")];
        out.extend(members(self, fields, |f| &f.comments, |_, f| {
            format!("{},", self.slot(&f.name, f.required, &f.ty))
        }));
        out.push("};".to_string());
        out
    }

    fn service_decl(&self, name: &str, methods: &[MethodDecl]) -> Vec<String> {
        js_service_decl(self, name, methods)
    }

    fn method_member(&self, signature: &Signature) -> String {
        let params: Vec<String> = signature
            .params
            .iter()
            .map(|m| self.slot(&m.name, m.required, &m.ty))
            .collect();
        format!(
            "{}({}): {};",
            signature.name,
            params.join(", "),
            self.render(&signature.returns)
        )
    }
}

fn js_scalar(scalar: Scalar) -> &'static str {
    match scalar {
        Scalar::Float | Scalar::Integer => "number",
        Scalar::Boolean => "boolean",
        Scalar::String => "string",
        Scalar::Bytes => "Uint8Array",
        Scalar::Unknown => "any /*unknown*/",
        Scalar::Void => "void",
    }
}

fn js_service_decl(target: &dyn TypeSystem, name: &str, methods: &[MethodDecl]) -> Vec<String> {
    let mut out = vec![format!("export interface {name} {{")];
    out.extend(members(target, methods, |m| &m.comments, |_, m| {
        target.method_member(&m.signature)
    }));
    out.push("}".to_string());
    out
}

// ── Elm ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct Elm;

impl Elm {
    /// Render in argument position, parenthesizing type applications.
    fn arg(&self, ty: &TypeExpr) -> String {
        match ty {
            TypeExpr::Repeated(_)
            | TypeExpr::Map(..)
            | TypeExpr::Iterator(_)
            | TypeExpr::Function { .. } => format!("({})", self.render(ty)),
            _ => self.render(ty),
        }
    }

    fn slot(&self, name: &str, required: bool, ty: &TypeExpr) -> String {
        let ty = if required {
            self.render(ty)
        } else {
            format!("Maybe {}", self.arg(ty))
        };
        format!("{} : {ty}", lower_first(name))
    }

    /// `{ a : A` / `, b : B` / `}` record layout; `{}` when empty.
    fn record<T>(
        &self,
        items: &[T],
        comments: impl Fn(&T) -> &Comments,
        line: impl Fn(&T) -> String,
    ) -> Vec<String> {
        if items.is_empty() {
            return vec![format!("{INDENT}{{}}")];
        }
        let mut out = members(self, items, comments, |i, item| {
            let lead = if i == 0 { "{" } else { "," };
            format!("{lead} {}", line(item))
        });
        out.push(format!("{INDENT}}}"));
        out
    }
}

/// Union constructor of an enum value, prefixed with its type:
/// `Corpus` / `WEB` → `Corpus_WEB`.
fn elm_constructor(enum_name: &str, value: &str) -> String {
    capitalize(&format!("{enum_name}_{value}"))
}

/// Elm module name for a schema file: `foo/bar.proto` → `Foo.Bar`.
pub fn elm_module_name(file_name: &str) -> String {
    let stem = file_name.strip_suffix(".proto").unwrap_or(file_name);
    stem.split('/')
        .filter(|s| !s.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(".")
}

impl TypeSystem for Elm {
    fn scalar(&self, scalar: Scalar) -> &'static str {
        match scalar {
            Scalar::Float => "Float",
            Scalar::Integer => "Int",
            Scalar::Boolean => "Bool",
            Scalar::String => "String",
            Scalar::Bytes => "String",
            Scalar::Unknown => "String {- unknown -}",
            Scalar::Void => "()",
        }
    }

    fn named(&self, name: &QualifiedName) -> String {
        let local = name.path.join("_");
        match &name.module {
            Some(module) => format!("{}.{local}", capitalize(module)),
            None => local,
        }
    }

    fn repeated(&self, element: &TypeExpr) -> String {
        format!("List {}", self.arg(element))
    }

    fn map(&self, key: &TypeExpr, value: &TypeExpr) -> String {
        format!("Dict {} {}", self.arg(key), self.arg(value))
    }

    fn iterator(&self, element: &TypeExpr) -> String {
        format!("List {}", self.arg(element))
    }

    fn object(&self, members: &[Member]) -> String {
        let inner: Vec<String> = members
            .iter()
            .map(|m| self.slot(&m.name, m.required, &m.ty))
            .collect();
        format!("{{ {} }}", inner.join(", "))
    }

    fn function(&self, params: &[Member], returns: &TypeExpr) -> String {
        let mut parts: Vec<String> = params.iter().map(|m| self.arg(&m.ty)).collect();
        if parts.is_empty() {
            parts.push("()".to_string());
        }
        parts.push(self.render(returns));
        parts.join(" -> ")
    }

    fn name_separator(&self) -> &'static str {
        "_"
    }

    fn hoists_nested(&self) -> bool {
        true
    }

    fn qualification(&self) -> Qualification {
        Qualification::ByFile
    }

    fn comment(&self, text: &str) -> String {
        format!("--{text}")
    }

    fn header(&self, file: &File) -> Vec<String> {
        vec![
            format!("-- {GENERATED_NOTICE}"),
            format!("-- source: {}", file.name),
            String::new(),
            format!("module {} exposing (..)", elm_module_name(&file.name)),
            String::new(),
            "import Dict exposing (Dict)".to_string(),
        ]
    }

    fn import_line(&self, import: &Import) -> String {
        let line = format!(
            "import {} as {}",
            elm_module_name(&import.file_name),
            capitalize(&import.alias)
        );
        if import.used {
            line
        } else {
            format!("-- {line} -- imported but not used")
        }
    }

    fn enum_decl(&self, name: &str, values: &[ValueDecl], _int_enums: bool) -> Vec<String> {
        if values.is_empty() {
            return vec![format!("type alias {name} ="), format!("{INDENT}Never")];
        }
        let mut out = vec![format!("type {name}")];
        out.extend(members(self, values, |v| &v.comments, |i, v| {
            let lead = if i == 0 { "=" } else { "|" };
            format!("{lead} {}", elm_constructor(name, &v.name))
        }));
        out
    }

    fn value_constructor(&self, enum_name: &str, value: &str) -> Option<String> {
        Some(elm_constructor(enum_name, value))
    }

    fn message_decl(&self, name: &str, fields: &[FieldDecl]) -> Vec<String> {
        let mut out = vec![format!("type alias {name} =")];
        out.extend(self.record(fields, |f| &f.comments, |f| {
            self.slot(&f.name, f.required, &f.ty)
        }));
        out
    }

    fn service_decl(&self, name: &str, methods: &[MethodDecl]) -> Vec<String> {
        let mut out = vec![format!("type alias {name} =")];
        out.extend(self.record(methods, |m| &m.comments, |m| {
            self.method_member(&m.signature)
        }));
        out
    }

    fn method_member(&self, signature: &Signature) -> String {
        let ty = self.function(&signature.params, &signature.returns);
        format!("{} : {ty}", lower_first(&signature.name))
    }
}
