//! Rule dispatch
//!
//! `call_out` runs one rule against one object; `call_in` runs one rule
//! against one repository subdirectory, pulling file content through the
//! source cache so each file decodes at most once per sync.

use rbxfs_fs::RelPath;
use rbxfs_tree::{ClassCatalog, ObjectId, RefTable, Tree};
use tracing::warn;

use crate::action::{InSelection, OutMap};
use crate::error::{Error, FileErrors, Result};
use crate::source::{SourceCache, SourceMap};

use super::{Direction, Registry, Rule};

/// Shared lookups for one sync invocation.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub registry: &'a Registry,
    pub catalog: Option<&'a ClassCatalog>,
}

/// Run an out-rule's pattern on `object`, then its filter on whatever the
/// pattern selected. An empty pattern result short-circuits the filter.
pub fn call_out(
    ctx: &RuleContext<'_>,
    rule: &Rule,
    tree: &Tree,
    object: ObjectId,
) -> Result<Vec<OutMap>> {
    if rule.direction != Direction::Out {
        return Err(Error::Dispatch {
            message: format!("expected a sync-out rule, got `{}`", rule.label()),
        });
    }
    let pattern = ctx.registry.out_pattern(&rule.pattern.name).ok_or_else(|| {
        Error::Dispatch {
            message: format!("unknown pattern function `{}`", rule.pattern.name),
        }
    })?;
    let filter = ctx.registry.out_filter(&rule.filter.name).ok_or_else(|| {
        Error::Dispatch {
            message: format!("unknown filter function `{}`", rule.filter.name),
        }
    })?;

    let selected = pattern
        .run(&rule.pattern.args, tree, ctx.catalog, object)
        .map_err(|message| Error::Pattern {
            rule: rule.label(),
            message,
        })?;
    if selected.is_empty() {
        return Ok(Vec::new());
    }

    filter
        .run(&rule.filter.args, tree, object, &selected)
        .map_err(|message| Error::Filter {
            rule: rule.label(),
            message,
        })
}

/// Run an in-rule's pattern on the subdirectory, decode every matched file
/// through the cache, then run the filter over the sources.
///
/// Decode failures are accumulated per file and returned together; one
/// broken file does not hide the others' errors.
pub fn call_in(
    ctx: &RuleContext<'_>,
    rule: &Rule,
    cache: &mut SourceCache,
    subdir: &RelPath,
    tree: &mut Tree,
    refs: &mut RefTable,
) -> Result<Vec<InSelection>> {
    if rule.direction != Direction::In {
        return Err(Error::Dispatch {
            message: format!("expected a sync-in rule, got `{}`", rule.label()),
        });
    }
    let pattern = ctx.registry.in_pattern(&rule.pattern.name).ok_or_else(|| {
        Error::Dispatch {
            message: format!("unknown pattern function `{}`", rule.pattern.name),
        }
    })?;
    let filter = ctx.registry.in_filter(&rule.filter.name).ok_or_else(|| {
        Error::Dispatch {
            message: format!("unknown filter function `{}`", rule.filter.name),
        }
    })?;

    let dir = subdir.to_native(cache.root());
    let files = pattern
        .run(&rule.pattern.args, &dir, ctx.catalog)
        .map_err(|message| Error::Pattern {
            rule: rule.label(),
            message,
        })?;
    if files.is_empty() {
        return Ok(Vec::new());
    }

    let mut bundles: Vec<FileErrors> = Vec::new();
    let mut available: Vec<String> = Vec::new();
    for name in files {
        let rel = subdir.file_path(&name);
        match cache.ensure(&rel, &name, tree, refs) {
            Ok(Some(_)) => available.push(name),
            Ok(None) => {
                // Directory without a readable sidecar; already logged.
            }
            Err(error) => {
                warn!(file = %rel, %error, "failed to decode source");
                let mut bundle = FileErrors::new(rel, "decoding");
                bundle.push(error);
                bundles.push(bundle);
            }
        }
    }
    if !bundles.is_empty() {
        return Err(Error::Aggregate(bundles));
    }

    let mut sources: Vec<SourceMap<'_>> = Vec::with_capacity(available.len());
    for name in &available {
        let rel = subdir.file_path(name);
        if let Some(entry) = cache.get(&rel) {
            sources.push(SourceMap {
                file: name.clone(),
                is_dir: entry.is_dir,
                source: &entry.source,
            });
        }
    }

    filter
        .run(&rule.filter.args, &sources)
        .map_err(|message| Error::Filter {
            rule: rule.label(),
            message,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::parse_rules;
    use std::fs;
    use tempfile::TempDir;

    fn parse_one(text: &str) -> Rule {
        let registry = Registry::new();
        let (mut rules, issues) = parse_rules(text, 1, &registry);
        assert!(issues.is_empty(), "{issues:?}");
        rules.remove(0)
    }

    #[test]
    fn test_call_out_direction_mismatch() {
        let registry = Registry::new();
        let ctx = RuleContext {
            registry: &registry,
            catalog: None,
        };
        let rule = parse_one("in File(*) : Children()");
        let mut tree = Tree::new();
        let object = tree.insert("DataModel");
        let err = call_out(&ctx, &rule, &tree, object).unwrap_err();
        assert!(matches!(err, Error::Dispatch { .. }));
    }

    #[test]
    fn test_call_out_empty_pattern_short_circuits() {
        let registry = Registry::new();
        let ctx = RuleContext {
            registry: &registry,
            catalog: None,
        };
        // File(x.exe) would error, but the childless object never reaches it.
        let rule = parse_one("out Child(*) : File(x.exe)");
        let mut tree = Tree::new();
        let object = tree.insert("DataModel");
        let maps = call_out(&ctx, &rule, &tree, object).unwrap();
        assert!(maps.is_empty());
    }

    #[test]
    fn test_call_in_accumulates_decode_errors() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.rbxm"), b"not a document").unwrap();
        fs::write(temp.path().join("b.rbxm"), b"also broken").unwrap();

        let registry = Registry::new();
        let ctx = RuleContext {
            registry: &registry,
            catalog: None,
        };
        let rule = parse_one("in File(*.rbxm) : Children()");
        let mut cache = SourceCache::new(temp.path().to_path_buf());
        let mut tree = Tree::new();
        let mut refs = RefTable::new();

        let err = call_in(
            &ctx,
            &rule,
            &mut cache,
            &RelPath::root(),
            &mut tree,
            &mut refs,
        )
        .unwrap_err();
        match err {
            Error::Aggregate(bundles) => {
                assert_eq!(bundles.len(), 2, "one bundle per broken file");
            }
            other => panic!("expected aggregate, got {other}"),
        }
    }

    #[test]
    fn test_call_in_lists_and_filters() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("init.lua"), b"return {}").unwrap();
        fs::write(temp.path().join("skip.txt"), b"x").unwrap();

        let registry = Registry::new();
        let ctx = RuleContext {
            registry: &registry,
            catalog: None,
        };
        let rule = parse_one("in File(*.lua) : PropertyName()");
        let mut cache = SourceCache::new(temp.path().to_path_buf());
        let mut tree = Tree::new();
        let mut refs = RefTable::new();

        let selections = call_in(
            &ctx,
            &rule,
            &mut cache,
            &RelPath::root(),
            &mut tree,
            &mut refs,
        )
        .unwrap();
        assert_eq!(selections.len(), 1);
        assert_eq!(selections[0].file, "init.lua");
        assert_eq!(selections[0].values.get("init"), Some(&0));
        assert!(cache.get("skip.txt").is_none(), "unmatched file not decoded");
    }
}
