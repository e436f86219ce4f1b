//! Per-file tracking of cross-file references.
//!
//! A tracker is created for each generated file. The type mapper records
//! every other file it references, and the emitter renders the import block
//! once the whole file has been walked:
//!
//! - declared dependencies in declaration order, commented out when unused
//! - recorded files missing from the dependency list, appended by file name

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::names::module_alias;
use crate::schema::{FileId, Schema};
use crate::target::TypeSystem;

/// One rendered import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub alias: String,
    /// Path relative to the importing file, without the `.proto` extension.
    pub path: String,
    /// Schema name of the imported file.
    pub file_name: String,
    pub used: bool,
}

#[derive(Debug)]
pub struct ImportTracker {
    current: FileId,
    used: BTreeSet<FileId>,
    /// alias -> package that claimed it
    aliases: BTreeMap<String, String>,
}

impl ImportTracker {
    pub fn new(current: FileId) -> Self {
        Self {
            current,
            used: BTreeSet::new(),
            aliases: BTreeMap::new(),
        }
    }

    /// Note a reference into `file`; returns the alias to qualify it with.
    ///
    /// Fails when a different package already claimed the same alias.
    pub fn record(&mut self, schema: &Schema, file: FileId) -> Result<String> {
        let package = &schema.file(file).package;
        let alias = module_alias(package);
        match self.aliases.get(&alias) {
            Some(first) if first != package => {
                return Err(Error::AliasCollision {
                    file: schema.file(self.current).name.clone(),
                    alias,
                    first: first.clone(),
                    second: package.clone(),
                });
            }
            Some(_) => {}
            None => {
                self.aliases.insert(alias.clone(), package.clone());
            }
        }
        self.used.insert(file);
        Ok(alias)
    }

    pub fn is_used(&self, file: FileId) -> bool {
        self.used.contains(&file)
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    /// Imports of the current file in output order.
    pub fn imports(&self, schema: &Schema) -> Vec<Import> {
        let current = schema.file(self.current);
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();

        for &dep in &current.dependencies {
            if seen.insert(dep) {
                out.push(self.import(schema, dep));
            }
        }

        let mut undeclared: Vec<FileId> = self
            .used
            .iter()
            .copied()
            .filter(|id| !seen.contains(id))
            .collect();
        undeclared.sort_by(|a, b| schema.file(*a).name.cmp(&schema.file(*b).name));
        out.extend(undeclared.into_iter().map(|id| self.import(schema, id)));
        out
    }

    /// Rendered import lines in output order.
    pub fn render(&self, schema: &Schema, target: &dyn TypeSystem) -> Vec<String> {
        self.imports(schema)
            .iter()
            .map(|import| target.import_line(import))
            .collect()
    }

    fn import(&self, schema: &Schema, id: FileId) -> Import {
        let file = schema.file(id);
        Import {
            alias: module_alias(&file.package),
            path: relative_import_path(&schema.file(self.current).name, &file.name),
            file_name: file.name.clone(),
            used: self.used.contains(&id),
        }
    }
}

/// Path from the directory of `from` to `to`, with `.proto` stripped.
///
/// Paths that do not climb out of the directory start with `./`.
pub fn relative_import_path(from: &str, to: &str) -> String {
    let mut from_dir: Vec<&str> = from.split('/').collect();
    from_dir.pop();
    let to_parts: Vec<&str> = to.split('/').collect();
    let (to_dir, to_base) = to_parts.split_at(to_parts.len() - 1);

    let common = from_dir
        .iter()
        .zip(to_dir)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; from_dir.len() - common];
    if parts.is_empty() {
        parts.push(".");
    }
    parts.extend_from_slice(&to_dir[common..]);
    parts.extend_from_slice(to_base);

    let joined = parts.join("/");
    joined
        .strip_suffix(".proto")
        .map(str::to_string)
        .unwrap_or(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Target;
    use crate::schema::tests::{file, message};
    use crate::target::for_target;

    #[test]
    fn relative_paths() {
        assert_eq!(relative_import_path("a.proto", "b.proto"), "./b");
        assert_eq!(
            relative_import_path("foo/bar.proto", "foo/common/paging.proto"),
            "./common/paging"
        );
        assert_eq!(
            relative_import_path("foo/bar.proto", "google/protobuf/timestamp.proto"),
            "../google/protobuf/timestamp"
        );
        assert_eq!(relative_import_path("a/b/c.proto", "a/d.proto"), "../d");
    }

    fn schema() -> Schema {
        let ts = file("google/protobuf/timestamp.proto", "google.protobuf", vec![message("Timestamp", vec![])]);
        let dur = file("google/protobuf/duration.proto", "google.protobuf", vec![message("Duration", vec![])]);
        let clash = file("google_protobuf.proto", "google_protobuf", vec![message("Clash", vec![])]);
        let loose = file("loose.proto", "loose", vec![message("Loose", vec![])]);
        let mut main = file("app/main.proto", "app", vec![]);
        main.dependency = vec![
            "google/protobuf/timestamp.proto".to_string(),
            "google/protobuf/duration.proto".to_string(),
        ];
        Schema::from_descriptors(&[ts, dur, clash, loose, main]).unwrap()
    }

    #[test]
    fn unused_dependencies_are_kept_in_order() {
        let schema = schema();
        let main = schema.file_by_name("app/main.proto").unwrap();
        let dur = schema.file_by_name("google/protobuf/duration.proto").unwrap();
        let mut tracker = ImportTracker::new(main);
        assert_eq!(tracker.record(&schema, dur).unwrap(), "google_protobuf");

        let imports = tracker.imports(&schema);
        let summary: Vec<(&str, bool)> = imports
            .iter()
            .map(|i| (i.path.as_str(), i.used))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("../google/protobuf/timestamp", false),
                ("../google/protobuf/duration", true),
            ]
        );

        let lines = tracker.render(&schema, for_target(Target::TypeScript));
        assert_eq!(
            lines[0],
            "// import * as google_protobuf from \"../google/protobuf/timestamp\"; // imported but not used"
        );
        assert_eq!(
            lines[1],
            "import * as google_protobuf from \"../google/protobuf/duration\";"
        );
    }

    #[test]
    fn undeclared_references_are_appended() {
        let schema = schema();
        let main = schema.file_by_name("app/main.proto").unwrap();
        let loose = schema.file_by_name("loose.proto").unwrap();
        let mut tracker = ImportTracker::new(main);
        tracker.record(&schema, loose).unwrap();

        let imports = tracker.imports(&schema);
        assert_eq!(imports.len(), 3);
        assert_eq!(imports[2].alias, "loose");
        assert_eq!(imports[2].path, "../loose");
        assert!(imports[2].used);
    }

    #[test]
    fn repeated_references_yield_one_entry() {
        let schema = schema();
        let main = schema.file_by_name("app/main.proto").unwrap();
        let loose = schema.file_by_name("loose.proto").unwrap();
        let mut tracker = ImportTracker::new(main);
        for _ in 0..3 {
            tracker.record(&schema, loose).unwrap();
        }

        let imports = tracker.imports(&schema);
        assert_eq!(imports.iter().filter(|i| i.file_name == "loose.proto").count(), 1);
    }

    #[test]
    fn alias_collision_between_packages() {
        let schema = schema();
        let main = schema.file_by_name("app/main.proto").unwrap();
        let mut tracker = ImportTracker::new(main);
        tracker
            .record(&schema, schema.file_by_name("google/protobuf/timestamp.proto").unwrap())
            .unwrap();
        // A second file of the same package shares the alias.
        tracker
            .record(&schema, schema.file_by_name("google/protobuf/duration.proto").unwrap())
            .unwrap();

        let err = tracker
            .record(&schema, schema.file_by_name("google_protobuf.proto").unwrap())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::AliasCollision { ref alias, .. } if alias == "google_protobuf"
        ));
    }
}
