//! Sync-in planner
//!
//! Walks the place directory, fires every in-rule on every visited
//! subdirectory, and recurses into directory-inducing selections in
//! ascending file name order.

use std::collections::BTreeSet;

use rbxfs_fs::RelPath;
use rbxfs_tree::{RefTable, Tree};
use tracing::debug;

use crate::action::InAction;
use crate::error::Error;
use crate::rules::{call_in, Rule, RuleContext};
use crate::source::SourceCache;

/// Candidate actions plus the rule errors hit while planning.
#[derive(Debug, Default)]
pub struct InPlan {
    pub actions: Vec<InAction>,
    pub errors: Vec<Error>,
}

/// Plan candidate in-actions for the place directory behind `cache`.
///
/// `rules` must already be filtered to the in direction. Sources decode
/// into `tree` through the cache; rule errors are collected, not fatal.
pub fn plan_in(
    ctx: &RuleContext<'_>,
    cache: &mut SourceCache,
    tree: &mut Tree,
    refs: &mut RefTable,
    rules: &[Rule],
) -> InPlan {
    let mut plan = InPlan::default();
    walk(ctx, cache, tree, refs, &RelPath::root(), rules, &mut plan);
    plan
}

fn walk(
    ctx: &RuleContext<'_>,
    cache: &mut SourceCache,
    tree: &mut Tree,
    refs: &mut RefTable,
    subdir: &RelPath,
    rules: &[Rule],
    plan: &mut InPlan,
) {
    let mut subdirs: BTreeSet<String> = BTreeSet::new();

    for rule in rules {
        let selections = match call_in(ctx, rule, cache, subdir, tree, refs) {
            Ok(selections) => selections,
            Err(error) => {
                plan.errors.push(error);
                continue;
            }
        };
        for selection in selections {
            // A non-ignored single-child selection of a directory source
            // marks that directory for recursion.
            if !selection.ignore && selection.children.len() == 1 {
                let rel = subdir.file_path(&selection.file);
                if cache.get(&rel).map(|entry| entry.is_dir).unwrap_or(false) {
                    subdirs.insert(selection.file.clone());
                }
            }
            debug!(depth = rule.depth, dir = %subdir, file = %selection.file, "candidate in-action");
            plan.actions.push(InAction {
                depth: rule.depth,
                dir: subdir.clone(),
                selections: vec![selection],
            });
        }
    }

    for name in subdirs {
        walk(ctx, cache, tree, refs, &subdir.child(&name), rules, plan);
    }
}
