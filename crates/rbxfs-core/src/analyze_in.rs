//! Sync-in analyzer
//!
//! Three deterministic passes: per-item override resolution (child
//! identity is per source file, property identity per directory), merging
//! per directory and per source file, and a final total ordering.

use std::collections::BTreeMap;

use crate::action::{InAction, InSelection};

/// Canonicalize candidate in-actions.
pub fn analyze_in(actions: Vec<InAction>) -> Vec<InAction> {
    let actions = pass_overrides(actions);
    let actions = pass_merge(actions);
    finalize(actions)
}

#[derive(Debug)]
struct Ordered {
    priority: usize,
    action: InAction,
}

/// P1: resolve competing claims. Deeper scope wins; at equal depth the
/// action later in the input wins. Children conflict per `(file path,
/// index)`; properties and value mappings conflict per `(directory,
/// property name)`.
fn pass_overrides(actions: Vec<InAction>) -> Vec<InAction> {
    let mut children: BTreeMap<(String, usize), Ordered> = BTreeMap::new();
    let mut properties: BTreeMap<(String, String), Ordered> = BTreeMap::new();

    let mut claim = |map: &mut BTreeMap<(String, String), Ordered>,
                     key: (String, String),
                     depth: u32,
                     priority: usize,
                     action: InAction| {
        if let Some(existing) = map.get(&key) {
            if existing.action.depth > depth {
                return;
            }
        }
        map.insert(key, Ordered { priority, action });
    };

    for (priority, action) in actions.iter().enumerate() {
        let dir = action.dir.join_str();
        for selection in &action.selections {
            let path = action.dir.file_path(&selection.file);
            for &child in &selection.children {
                let key = (path.clone(), child);
                if let Some(existing) = children.get(&key) {
                    if existing.action.depth > action.depth {
                        continue;
                    }
                }
                children.insert(
                    key,
                    Ordered {
                        priority,
                        action: InAction {
                            depth: action.depth,
                            dir: action.dir.clone(),
                            selections: vec![InSelection {
                                ignore: selection.ignore,
                                children: vec![child],
                                ..InSelection::new(selection.file.as_str())
                            }],
                        },
                    },
                );
            }
            for property in &selection.properties {
                claim(
                    &mut properties,
                    (dir.clone(), property.clone()),
                    action.depth,
                    priority,
                    InAction {
                        depth: action.depth,
                        dir: action.dir.clone(),
                        selections: vec![InSelection {
                            ignore: selection.ignore,
                            properties: vec![property.clone()],
                            ..InSelection::new(selection.file.as_str())
                        }],
                    },
                );
            }
            for (property, &value) in &selection.values {
                claim(
                    &mut properties,
                    (dir.clone(), property.clone()),
                    action.depth,
                    priority,
                    InAction {
                        depth: action.depth,
                        dir: action.dir.clone(),
                        selections: vec![InSelection {
                            ignore: selection.ignore,
                            values: [(property.clone(), value)].into(),
                            ..InSelection::new(selection.file.as_str())
                        }],
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

/// P2: one action per directory; within it, one selection per
/// `(file, ignore)` with children, properties, and value maps unioned.
fn pass_merge(actions: Vec<InAction>) -> Vec<InAction> {
    use std::collections::btree_map::Entry;

    let mut combined: BTreeMap<String, InAction> = BTreeMap::new();
    for action in actions {
        match combined.entry(action.dir.join_str()) {
            Entry::Occupied(mut existing) => {
                existing.get_mut().selections.extend(action.selections)
            }
            Entry::Vacant(slot) => {
                slot.insert(action);
            }
        }
    }

    combined
        .into_values()
        .map(|mut action| {
            let mut selections: BTreeMap<(String, bool), InSelection> = BTreeMap::new();
            for selection in std::mem::take(&mut action.selections) {
                let key = (selection.file.clone(), selection.ignore);
                match selections.entry(key) {
                    Entry::Occupied(mut existing) => {
                        let merged = existing.get_mut();
                        merged.children.extend(selection.children);
                        merged.properties.extend(selection.properties);
                        merged.values.extend(selection.values);
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(selection);
                    }
                }
            }
            action.selections = selections.into_values().collect();
            action
        })
        .collect()
}

/// Final total ordering: items ascending, selections by `(file, ignore)`
/// with non-ignore first, actions by directory path.
fn finalize(mut actions: Vec<InAction>) -> Vec<InAction> {
    for action in &mut actions {
        for selection in &mut action.selections {
            selection.children.sort_unstable();
            selection.properties.sort_unstable();
        }
        action
            .selections
            .sort_by(|a, b| a.file.cmp(&b.file).then(a.ignore.cmp(&b.ignore)));
    }
    actions.sort_by_key(|action| action.dir.join_str());
    actions
}
