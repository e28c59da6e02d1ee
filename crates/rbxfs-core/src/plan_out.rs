//! Sync-out planner
//!
//! Walks the object tree, fires every out-rule on every visited object,
//! and recurses into children that some rule mapped to a directory. The
//! recursion order is ascending child index, never the order rules
//! happened to produce names, so candidate emission is deterministic.

use std::collections::BTreeMap;

use rbxfs_fs::RelPath;
use rbxfs_tree::{ObjectId, Tree};
use tracing::debug;

use crate::action::OutAction;
use crate::error::Error;
use crate::rules::{call_out, Rule, RuleContext};

/// Candidate actions plus the rule errors hit while planning.
#[derive(Debug, Default)]
pub struct OutPlan {
    pub actions: Vec<OutAction>,
    pub errors: Vec<Error>,
}

/// Plan candidate out-actions for the tree rooted at `root`.
///
/// `rules` must already be filtered to the out direction and ordered by
/// scope load order. Rule failures are collected, not fatal: sibling
/// rules still fire.
pub fn plan_out(
    ctx: &RuleContext<'_>,
    tree: &Tree,
    root: ObjectId,
    rules: &[Rule],
) -> OutPlan {
    let mut plan = OutPlan::default();
    walk(ctx, tree, root, &RelPath::root(), rules, &mut plan);
    plan
}

fn walk(
    ctx: &RuleContext<'_>,
    tree: &Tree,
    object: ObjectId,
    dir: &RelPath,
    rules: &[Rule],
    plan: &mut OutPlan,
) {
    // Child index -> directory name; later rules overwrite earlier ones.
    let mut subdirs: BTreeMap<usize, String> = BTreeMap::new();

    for rule in rules {
        let maps = match call_out(ctx, rule, tree, object) {
            Ok(maps) => maps,
            Err(error) => {
                plan.errors.push(error);
                continue;
            }
        };
        for map in maps {
            if map.file.is_dir {
                // A directory mapping of exactly one child of this object
                // marks that child for recursion.
                for selection in &map.selections {
                    if selection.object == object
                        && selection.children.len() == 1
                        && selection.children[0] < tree.children(object).len()
                    {
                        subdirs.insert(selection.children[0], map.file.name.clone());
                    }
                }
            }
            debug!(depth = rule.depth, dir = %dir, file = %map.file.name, "candidate out-action");
            plan.actions.push(OutAction {
                depth: rule.depth,
                dir: dir.clone(),
                map,
            });
        }
    }

    for (index, name) in subdirs {
        let child = tree.children(object)[index];
        walk(ctx, tree, child, &dir.child(&name), rules, plan);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{parse_rules, Registry};

    fn rules(text: &str) -> Vec<Rule> {
        let registry = Registry::new();
        let (rules, issues) = parse_rules(text, 1, &registry);
        assert!(issues.is_empty(), "{issues:?}");
        rules
    }

    fn folder_tree() -> (Tree, ObjectId) {
        let mut tree = Tree::new();
        let root = tree.insert("DataModel");
        for name in ["B", "A"] {
            let folder = tree.insert("Folder");
            tree.set_name(folder, name);
            tree.set_parent(folder, Some(root)).unwrap();
            let inner = tree.insert("Folder");
            tree.set_name(inner, "Inner");
            tree.set_parent(inner, Some(folder)).unwrap();
        }
        (tree, root)
    }

    #[test]
    fn test_recursion_follows_child_index_order() {
        let (tree, root) = folder_tree();
        let registry = Registry::new();
        let ctx = RuleContext {
            registry: &registry,
            catalog: None,
        };
        let plan = plan_out(
            &ctx,
            &tree,
            root,
            &rules("out Child(Folder) : Directory()"),
        );
        assert!(plan.errors.is_empty());

        let dirs: Vec<String> = plan
            .actions
            .iter()
            .map(|action| action.full_path())
            .collect();
        // Child 0 is "B": its subtree is planned before "A"'s despite the
        // name order.
        assert_eq!(dirs, vec!["B", "A", "B/Inner", "A/Inner"]);
    }

    #[test]
    fn test_rule_errors_do_not_stop_siblings() {
        let (tree, root) = folder_tree();
        let registry = Registry::new();
        let ctx = RuleContext {
            registry: &registry,
            catalog: None,
        };
        // Properties cannot feed Directory(); the second rule still runs.
        let text = "\
out Property(*, Name, *) : Directory()
out Child(Folder) : Directory()
";
        let plan = plan_out(&ctx, &tree, root, &rules(text));
        assert!(!plan.errors.is_empty());
        assert!(plan.actions.iter().any(|a| a.full_path() == "A/Inner"));
    }
}
