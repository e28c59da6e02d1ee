//! Sync-out analyzer
//!
//! Canonicalizes the planner's flat candidate list in six deterministic
//! passes: invalid directory actions are dropped, conflicting directory
//! claims are removed together with everything beneath them, per-item
//! ownership is resolved by scope depth then file order, orphaned actions
//! under vanished directories are discarded, selections are merged per
//! file and per object, and everything is put into one total order.
//!
//! Every grouping container is ordered; no hash iteration order can reach
//! the output.

use std::collections::{BTreeMap, BTreeSet};

use rbxfs_tree::{ObjectId, Selection, Tree};

use crate::action::{OutAction, OutMap};

/// Canonicalize candidate out-actions.
pub fn analyze_out(tree: &Tree, actions: Vec<OutAction>) -> Vec<OutAction> {
    let actions = pass_valid_dirs(tree, actions);
    let actions = pass_dir_conflicts(actions);
    let actions = pass_overrides(actions);
    let actions = pass_orphans(actions);
    let actions = pass_merge_files(actions);
    let actions = pass_merge_objects(actions);
    finalize(tree, actions)
}

/// The single child object a directory action creates, if the action is
/// well-formed: one selection, one child index, index in bounds.
fn dir_action_target(tree: &Tree, action: &OutAction) -> Option<ObjectId> {
    let [selection] = action.map.selections.as_slice() else {
        return None;
    };
    let [child] = selection.children.as_slice() else {
        return None;
    };
    tree.child(selection.object, *child)
}

/// P1: drop directory actions that do not describe exactly one child.
fn pass_valid_dirs(tree: &Tree, actions: Vec<OutAction>) -> Vec<OutAction> {
    actions
        .into_iter()
        .filter(|action| !action.map.file.is_dir || dir_action_target(tree, action).is_some())
        .collect()
}

/// P2: remove directories claimed for different source objects, and every
/// action at or beneath a conflicted path.
fn pass_dir_conflicts(actions: Vec<OutAction>) -> Vec<OutAction> {
    struct DirClaim {
        conflict: bool,
        object: ObjectId,
        child: usize,
    }

    let mut dirs: BTreeMap<String, DirClaim> = BTreeMap::new();
    for action in actions.iter().filter(|a| a.map.file.is_dir) {
        // P1 left only single-selection single-child dir actions.
        let selection = &action.map.selections[0];
        let claim = (selection.object, selection.children[0]);
        let entry = dirs.entry(action.full_path()).or_insert(DirClaim {
            conflict: false,
            object: claim.0,
            child: claim.1,
        });
        if (entry.object, entry.child) != claim {
            entry.conflict = true;
        }
    }

    let conflicted =
        |path: &str| dirs.get(path).map(|claim| claim.conflict).unwrap_or(false);
    actions
        .into_iter()
        .filter(|action| {
            if conflicted(&action.full_path()) {
                return false;
            }
            (1..=action.dir.len()).all(|len| !conflicted(&action.dir.prefix(len).join_str()))
        })
        .collect()
}

#[derive(Debug)]
struct Ordered {
    priority: usize,
    action: OutAction,
}

/// P3: resolve multiple actions claiming the same item. Deeper scope wins;
/// at equal depth the action later in the input wins. Every surviving
/// action carries exactly one single-item selection afterwards.
fn pass_overrides(actions: Vec<OutAction>) -> Vec<OutAction> {
    let mut children: BTreeMap<(ObjectId, usize), Ordered> = BTreeMap::new();
    let mut properties: BTreeMap<(ObjectId, String), Ordered> = BTreeMap::new();

    for (priority, action) in actions.iter().enumerate() {
        for selection in &action.map.selections {
            for &child in &selection.children {
                let key = (selection.object, child);
                if let Some(existing) = children.get(&key) {
                    if existing.action.depth > action.depth {
                        continue;
                    }
                }
                children.insert(
                    key,
                    Ordered {
                        priority,
                        action: OutAction {
                            depth: action.depth,
                            dir: action.dir.clone(),
                            map: OutMap {
                                file: action.map.file.clone(),
                                selections: vec![Selection::with_children(
                                    selection.object,
                                    vec![child],
                                )],
                            },
                        },
                    },
                );
            }
            for property in &selection.properties {
                let key = (selection.object, property.clone());
                if let Some(existing) = properties.get(&key) {
                    if existing.action.depth > action.depth {
                        continue;
                    }
                }
                properties.insert(
                    key,
                    Ordered {
                        priority,
                        action: OutAction {
                            depth: action.depth,
                            dir: action.dir.clone(),
                            map: OutMap {
                                file: action.map.file.clone(),
                                selections: vec![Selection::with_properties(
                                    selection.object,
                                    vec![property.clone()],
                                )],
                            },
                        },
                    },
                );
            }
        }
    }

    let mut ordered: Vec<Ordered> = children
        .into_values()
        .chain(properties.into_values())
        .collect();
    ordered.sort_by_key(|entry| (entry.action.depth, entry.priority));
    ordered.into_iter().map(|entry| entry.action).collect()
}

/// P4: drop actions whose directory chain contains a path no surviving
/// directory action creates.
fn pass_orphans(actions: Vec<OutAction>) -> Vec<OutAction> {
    let dirs: BTreeSet<String> = actions
        .iter()
        .filter(|action| action.map.file.is_dir)
        .map(OutAction::full_path)
        .collect();

    actions
        .into_iter()
        .filter(|action| {
            (1..=action.dir.len()).all(|len| dirs.contains(&action.dir.prefix(len).join_str()))
        })
        .collect()
}

/// P5: one action per full path; selections concatenate. The first action
/// for a path (in P3 order) is the representative.
fn pass_merge_files(actions: Vec<OutAction>) -> Vec<OutAction> {
    let mut combined: BTreeMap<String, OutAction> = BTreeMap::new();
    for action in actions {
        use std::collections::btree_map::Entry;
        match combined.entry(action.full_path()) {
            Entry::Occupied(mut existing) => existing
                .get_mut()
                .map
                .selections
                .extend(action.map.selections),
            Entry::Vacant(slot) => {
                slot.insert(action);
            }
        }
    }
    combined.into_values().collect()
}

/// P6: within each action, merge selections that share a source object.
fn pass_merge_objects(actions: Vec<OutAction>) -> Vec<OutAction> {
    actions
        .into_iter()
        .map(|mut action| {
            let mut combined: BTreeMap<ObjectId, Selection> = BTreeMap::new();
            for selection in std::mem::take(&mut action.map.selections) {
                use std::collections::btree_map::Entry;
                match combined.entry(selection.object) {
                    Entry::Occupied(mut existing) => {
                        existing.get_mut().children.extend(selection.children);
                        existing.get_mut().properties.extend(selection.properties);
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(selection);
                    }
                }
            }
            action.map.selections = combined.into_values().collect();
            action
        })
        .collect()
}

/// Final total ordering: items ascending within selections, selections by
/// the source object's position in the scene tree, actions by path.
fn finalize(tree: &Tree, mut actions: Vec<OutAction>) -> Vec<OutAction> {
    for action in &mut actions {
        for selection in &mut action.map.selections {
            selection.children.sort_unstable();
            selection.properties.sort_unstable();
        }
        action
            .map
            .selections
            .sort_by_key(|selection| tree.child_index(selection.object));
    }
    actions.sort_by_key(OutAction::full_path);
    actions
}
