//! Shared sync driver pieces: options, reports, rule and catalog loading

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use rbxfs_fs::layout;
use rbxfs_tree::{ClassCatalog, Tree};

use crate::action::{InAction, OutAction};
use crate::rules::{parse_rules, Registry, Rule};

/// Options for sync operations.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// If true, plan and report actions without touching the filesystem.
    pub dry_run: bool,
}

/// Report from a sync operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    /// Whether the operation completed without per-file errors
    pub success: bool,
    /// Human-readable lines describing what was done (or planned)
    pub actions: Vec<String>,
    /// Non-fatal problems: rule parse issues, skipped scopes
    pub errors: Vec<String>,
}

impl SyncReport {
    pub fn new() -> Self {
        Self {
            success: true,
            actions: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl Default for SyncReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Rules gathered from every scope plus the issues hit while loading.
#[derive(Debug, Default)]
pub(crate) struct LoadedRules {
    pub rules: Vec<Rule>,
    pub issues: Vec<String>,
}

/// Load the standard rule scopes: the user-global file at depth 1, the
/// project file at depth 2. Both are optional; a failure in one scope
/// never unloads the other.
pub(crate) fn load_standard_rules(repo: &Path, registry: &Registry) -> LoadedRules {
    let mut loaded = LoadedRules::default();
    if let Some(global) = layout::global_rules_path() {
        load_scope(&mut loaded, registry, &global, 1, "global");
    }
    load_scope(
        &mut loaded,
        registry,
        &layout::project_rules_path(repo),
        2,
        "project",
    );
    loaded
}

fn load_scope(
    loaded: &mut LoadedRules,
    registry: &Registry,
    path: &Path,
    depth: u32,
    scope: &str,
) {
    if !path.is_file() {
        debug!(scope, path = %path.display(), "no rule file for scope");
        return;
    }
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) => {
            warn!(scope, path = %path.display(), %error, "failed to read rule file");
            loaded.issues.push(format!("{scope} rules: {error}"));
            return;
        }
    };
    let (rules, issues) = parse_rules(&text, depth, registry);
    for issue in issues {
        warn!(scope, %issue, "bad rule line");
        loaded.issues.push(format!("{scope} rules: {issue}"));
    }
    loaded.rules.extend(rules);
}

/// Load the repository's class catalog, if present and readable.
pub(crate) fn load_catalog(repo: &Path) -> Option<ClassCatalog> {
    let path = layout::services_path(repo);
    if !path.is_file() {
        return None;
    }
    match ClassCatalog::load(&path) {
        Ok(catalog) => Some(catalog),
        Err(error) => {
            warn!(path = %path.display(), %error, "failed to load class catalog");
            None
        }
    }
}

/// Render canonical out-actions for dry-run output.
pub(crate) fn render_out_actions(tree: &Tree, actions: &[OutAction]) -> Vec<String> {
    actions
        .iter()
        .enumerate()
        .map(|(index, action)| {
            let kind = if action.map.file.is_dir { "dir " } else { "file" };
            let selections = action
                .map
                .selections
                .iter()
                .map(|s| {
                    format!(
                        "{{obj: {}; C: {:?}; P: {:?}}}",
                        tree.name(s.object),
                        s.children,
                        s.properties
                    )
                })
                .collect::<Vec<_>>()
                .join("; ");
            format!(
                "{index:4} {}; {kind}: {}; sel({:02}): {{{selections}}}",
                action.depth,
                action.full_path(),
                action.map.selections.len()
            )
        })
        .collect()
}

/// Render canonical in-actions for dry-run output.
pub(crate) fn render_in_actions(actions: &[InAction]) -> Vec<String> {
    actions
        .iter()
        .enumerate()
        .map(|(index, action)| {
            let selections = action
                .selections
                .iter()
                .map(|s| {
                    format!(
                        "{{file: {}; I: {}; C: {:?}; P: {:?}; V: {:?}}}",
                        s.file, s.ignore, s.children, s.properties, s.values
                    )
                })
                .collect::<Vec<_>>()
                .join("; ");
            format!(
                "{index:4} {}; `{}`; sel({:02}): {{{selections}}}",
                action.depth,
                action.dir.join_str(),
                action.selections.len()
            )
        })
        .collect()
}
