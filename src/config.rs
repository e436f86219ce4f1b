//! Generator configuration.
//!
//! The host passes a flat parameter string (`key=value` pairs joined by
//! commas, a bare key meaning `true`). It is parsed exactly once per run into
//! an immutable [`Options`] value that every component reads.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};

/// Default extension number of the custom field options (`{ bool required = 1; }`).
pub const DEFAULT_FIELD_OPTIONS_EXT: u32 = 50201;

/// Default extension number of the custom message field defaults
/// (`{ bool required = 1; FieldBehavior field_behavior = 2; }`).
pub const DEFAULT_MESSAGE_OPTIONS_EXT: u32 = 50202;

/// Output language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    #[default]
    TypeScript,
    Flow,
    Elm,
}

impl Target {
    /// Output name pattern used when `outpattern` is not given.
    pub fn default_outpattern(self) -> &'static str {
        match self {
            Target::TypeScript => "{dir}/{package}.{base}.d.ts",
            Target::Flow => "{dir}/{base}Types.js",
            Target::Elm => "{Dir}/{Base}.elm",
        }
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ts" | "typescript" => Ok(Target::TypeScript),
            "flow" => Ok(Target::Flow),
            "elm" => Ok(Target::Elm),
            other => Err(Error::Config(format!(
                "unknown target '{other}' (expected ts, flow, or elm)"
            ))),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Target::TypeScript => "typescript",
            Target::Flow => "flow",
            Target::Elm => "elm",
        })
    }
}

/// Every recognized generator option, with its effective value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Options {
    pub target: Target,
    /// Wrap package contents in `declare namespace <package>`.
    pub declare_namespace: bool,
    /// Iterator-style rather than callback-style streaming signatures.
    pub async_iterators: bool,
    /// Enum members as integer literals instead of string literals.
    pub int_enums: bool,
    /// Schema-declared field names verbatim instead of JSON names.
    pub original_names: bool,
    /// 64-bit integer fields as strings.
    pub int64_string: bool,
    pub outpattern: OutputPattern,
    /// Log the resolved schema model as JSON before generating.
    pub dump_request_descriptor: bool,
    pub field_options_ext: u32,
    pub message_options_ext: u32,
}

impl Default for Options {
    fn default() -> Self {
        let target = Target::default();
        Self {
            target,
            declare_namespace: true,
            async_iterators: false,
            int_enums: false,
            original_names: true,
            int64_string: false,
            outpattern: OutputPattern::default_for(target),
            dump_request_descriptor: false,
            field_options_ext: DEFAULT_FIELD_OPTIONS_EXT,
            message_options_ext: DEFAULT_MESSAGE_OPTIONS_EXT,
        }
    }
}

impl Options {
    /// Parse the plugin parameter string.
    ///
    /// `None` and the empty string both yield the defaults. The output
    /// pattern default follows the selected target unless `outpattern` is
    /// given explicitly, regardless of the order of the keys.
    pub fn from_parameter(parameter: Option<&str>) -> Result<Self> {
        let mut opts = Options::default();
        let mut outpattern: Option<String> = None;

        let parameter = parameter.unwrap_or_default();
        for part in parameter.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = match part.split_once('=') {
                Some((k, v)) => (k.trim(), Some(v.trim())),
                None => (part, None),
            };

            match key {
                "target" => opts.target = require_value(key, value)?.parse()?,
                "declare_namespace" => opts.declare_namespace = parse_bool(key, value)?,
                "async_iterators" => opts.async_iterators = parse_bool(key, value)?,
                "int_enums" => opts.int_enums = parse_bool(key, value)?,
                "original_names" => opts.original_names = parse_bool(key, value)?,
                "int64_string" => opts.int64_string = parse_bool(key, value)?,
                "dump_request_descriptor" => {
                    opts.dump_request_descriptor = parse_bool(key, value)?
                }
                "outpattern" => outpattern = Some(require_value(key, value)?.to_string()),
                "field_options_ext" => opts.field_options_ext = parse_number(key, value)?,
                "message_options_ext" => opts.message_options_ext = parse_number(key, value)?,
                other => {
                    return Err(Error::Config(format!("unknown parameter '{other}'")));
                }
            }
        }

        opts.outpattern = match outpattern {
            Some(p) => OutputPattern::parse(&p)?,
            None => OutputPattern::default_for(opts.target),
        };
        Ok(opts)
    }
}

fn require_value<'a>(key: &str, value: Option<&'a str>) -> Result<&'a str> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::Config(format!("parameter '{key}' requires a value"))),
    }
}

fn parse_bool(key: &str, value: Option<&str>) -> Result<bool> {
    let Some(value) = value else {
        return Ok(true);
    };
    match value.to_ascii_lowercase().as_str() {
        "" | "1" | "t" | "true" => Ok(true),
        "0" | "f" | "false" => Ok(false),
        other => Err(Error::Config(format!(
            "parameter '{key}' expects a boolean, got '{other}'"
        ))),
    }
}

fn parse_number(key: &str, value: Option<&str>) -> Result<u32> {
    let value = require_value(key, value)?;
    value.parse().map_err(|_| {
        Error::Config(format!(
            "parameter '{key}' expects a field number, got '{value}'"
        ))
    })
}

// ── Output name pattern ────────────────────────────────────────────────

/// A placeholder understood by [`OutputPattern`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    Dir,
    CapitalDir,
    Base,
    CapitalBase,
    Package,
    PackagePath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// Parsed output filename template.
///
/// Placeholders: `{dir}`, `{Dir}`, `{base}`, `{Base}`, `{package}`,
/// `{package_path}`. `{Dir}` capitalizes every directory segment and
/// `{Base}` the file base, matching Elm module paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPattern {
    source: String,
    #[serde(skip)]
    segments: Vec<Segment>,
}

/// Values substituted into an [`OutputPattern`] for one schema file.
#[derive(Debug, Clone, Copy)]
pub struct OutputNameContext<'a> {
    /// Schema file name as given by the host (e.g. `"foo/bar.proto"`).
    pub file_name: &'a str,
    pub package: &'a str,
}

impl OutputPattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut rest = pattern;

        while let Some(open) = rest.find('{') {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                return Err(Error::Config(format!(
                    "unterminated placeholder in outpattern '{pattern}'"
                )));
            };
            let placeholder = match &after[..close] {
                "dir" => Placeholder::Dir,
                "Dir" => Placeholder::CapitalDir,
                "base" => Placeholder::Base,
                "Base" => Placeholder::CapitalBase,
                "package" => Placeholder::Package,
                "package_path" => Placeholder::PackagePath,
                other => {
                    return Err(Error::Config(format!(
                        "unknown placeholder '{{{other}}}' in outpattern '{pattern}'"
                    )));
                }
            };
            segments.push(Segment::Placeholder(placeholder));
            rest = &after[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    fn default_for(target: Target) -> Self {
        // The built-in patterns only use known placeholders.
        Self::parse(target.default_outpattern()).unwrap_or_else(|_| Self {
            source: String::new(),
            segments: Vec::new(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Render the output filename for one schema file.
    pub fn render(&self, ctx: &OutputNameContext<'_>) -> String {
        let (dir, file) = match ctx.file_name.rsplit_once('/') {
            Some((dir, file)) => (dir, file),
            None => (".", ctx.file_name),
        };
        let base = file.strip_suffix(".proto").unwrap_or(file);
        let package = if ctx.package.is_empty() {
            "none"
        } else {
            ctx.package
        };

        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Placeholder(Placeholder::Dir) => out.push_str(dir),
                Segment::Placeholder(Placeholder::CapitalDir) => {
                    let segments: Vec<String> =
                        dir.split('/').map(crate::names::capitalize).collect();
                    out.push_str(&segments.join("/"))
                }
                Segment::Placeholder(Placeholder::Base) => out.push_str(base),
                Segment::Placeholder(Placeholder::CapitalBase) => {
                    out.push_str(&crate::names::capitalize(base))
                }
                Segment::Placeholder(Placeholder::Package) => out.push_str(package),
                Segment::Placeholder(Placeholder::PackagePath) => {
                    out.push_str(&package.replace('.', "/"))
                }
            }
        }

        match out.strip_prefix("./") {
            Some(stripped) => stripped.to_string(),
            None => out,
        }
    }
}
