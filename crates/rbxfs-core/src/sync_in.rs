//! Sync-in driver
//!
//! Reassembles each place directory into a place artifact: plans against
//! the filesystem through the source cache, canonicalizes, re-parents
//! decoded objects under a synthetic root, resolves references, marks
//! services, and encodes the result beside the directory.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info, warn};

use rbxfs_format::Format as _;
use rbxfs_fs::{io, layout};
use rbxfs_tree::{PropRef, RefTable, Selection, Tree};

use crate::action::InAction;
use crate::analyze_in::analyze_in;
use crate::error::{Error, FileErrors, Result};
use crate::plan_in::plan_in;
use crate::rules::{filter_direction, Direction, Registry, Rule, RuleContext};
use crate::source::SourceCache;
use crate::sync::{load_catalog, load_standard_rules, render_in_actions, SyncOptions, SyncReport};

/// Reassemble place directories in `repo` into place artifacts.
///
/// With `only_dirs`, restrict the run to the named top-level directories.
pub fn sync_in(
    repo: &Path,
    only_dirs: Option<&[String]>,
    options: &SyncOptions,
) -> Result<SyncReport> {
    if !layout::is_repository(repo) {
        return Err(Error::NotRepository {
            path: repo.to_path_buf(),
        });
    }

    let registry = Registry::new();
    let catalog = load_catalog(repo);
    let loaded = load_standard_rules(repo, &registry);
    let rules = filter_direction(&loaded.rules, Direction::In);

    let mut report = SyncReport::new();
    report.errors.extend(loaded.issues);
    for rule in &rules {
        debug!(%rule, "loaded sync-in rule");
    }

    let mut dirs = layout::dirs_in_repo(repo)?;
    if let Some(only) = only_dirs {
        for requested in only {
            if !dirs.iter().any(|d| d == requested) {
                warn!(dir = %requested, "requested directory not found in repository");
                report
                    .errors
                    .push(format!("directory `{requested}` not found"));
            }
        }
        dirs.retain(|dir| only.iter().any(|o| o == dir));
    }
    if dirs.is_empty() {
        warn!("no directories to sync in");
        report.actions.push("no files to sync".to_string());
        return Ok(report);
    }

    let ctx = RuleContext {
        registry: &registry,
        catalog: catalog.as_ref(),
    };

    let mut bundles: Vec<FileErrors> = Vec::new();
    for dir in &dirs {
        if let Err(bundle) = sync_in_dir(repo, dir, &ctx, &rules, options, &mut report) {
            bundles.push(bundle);
        }
    }

    if !bundles.is_empty() {
        report.success = false;
        return Err(Error::Aggregate(bundles));
    }
    Ok(report)
}

fn sync_in_dir(
    repo: &Path,
    dir: &str,
    ctx: &RuleContext<'_>,
    rules: &[Rule],
    options: &SyncOptions,
    report: &mut SyncReport,
) -> std::result::Result<(), FileErrors> {
    let mut bundle = FileErrors::new(dir, "syncing in");

    let mut tree = Tree::new();
    let mut refs = RefTable::new();
    let mut cache = SourceCache::new(repo.join(dir));

    let plan = plan_in(ctx, &mut cache, &mut tree, &mut refs, rules);
    bundle.errors.extend(plan.errors);

    let actions = analyze_in(plan.actions);
    let place = format!("new-{}", layout::dir_place(dir));
    info!(%dir, %place, actions = actions.len(), "planned sync-in");

    if options.dry_run {
        report.actions.push(format!("sync-in `{dir}/` -> `{place}`"));
        report.actions.extend(render_in_actions(&actions));
    } else {
        if let Err(error) = apply_actions(
            repo, &place, ctx, &cache, &mut tree, &mut refs, &actions, &mut bundle,
        ) {
            bundle.push(error);
        }
        report
            .actions
            .push(format!("synced `{dir}/` -> `{place}`"));
    }

    if bundle.is_empty() {
        Ok(())
    } else {
        Err(bundle)
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_actions(
    repo: &Path,
    place: &str,
    ctx: &RuleContext<'_>,
    cache: &SourceCache,
    tree: &mut Tree,
    refs: &mut RefTable,
    actions: &[InAction],
    bundle: &mut FileErrors,
) -> Result<()> {
    let root = tree.insert("DataModel");

    // Directory path -> the object that directory represents. Actions are
    // sorted by directory, so a parent registers before its children need
    // it.
    let mut dir_map: BTreeMap<String, rbxfs_tree::ObjectId> = BTreeMap::new();
    dir_map.insert(String::new(), root);

    for action in actions {
        let subdir = action.dir.join_str();
        let Some(&parent) = dir_map.get(&subdir) else {
            warn!(dir = %subdir, "no object registered for directory");
            continue;
        };

        for selection in &action.selections {
            if selection.ignore {
                continue;
            }
            let rel = action.dir.file_path(&selection.file);
            let Some(entry) = cache.get(&rel) else {
                warn!(file = %rel, "selection references an uncached source");
                continue;
            };

            if entry.is_dir {
                if let Some(&object) = selection
                    .children
                    .first()
                    .and_then(|&index| entry.source.children.get(index))
                {
                    dir_map.insert(rel.clone(), object);
                }
            }

            for &index in &selection.children {
                let Some(&child) = entry.source.children.get(index) else {
                    warn!(file = %rel, index, "child selection out of bounds");
                    continue;
                };
                if let Err(error) = tree.set_parent(child, Some(parent)) {
                    bundle.push(error.into());
                }
            }

            for name in &selection.properties {
                let Some(value) = entry.source.properties.get(name) else {
                    continue;
                };
                if entry.source.reference_props.contains(name) {
                    if let Some(referent) = value.as_referent() {
                        refs.resolve_or_defer(
                            tree,
                            PropRef {
                                object: parent,
                                property: name.clone(),
                                referent: referent.to_string(),
                            },
                        );
                    }
                } else {
                    tree.set_property(parent, name.clone(), value.clone());
                }
            }

            for (name, &index) in &selection.values {
                let Some(value) = entry.source.values.get(index) else {
                    warn!(file = %rel, index, "value selection out of bounds");
                    continue;
                };
                tree.set_property(parent, name.clone(), value.clone());
            }
        }
    }

    let dropped = refs.finalize(tree);
    if dropped > 0 {
        warn!(dropped, "unresolved references dropped");
    }

    if let Some(catalog) = ctx.catalog {
        let top_level: Vec<_> = tree.children(root).to_vec();
        for object in top_level {
            if catalog.is_service(tree.class_name(object)) {
                tree.set_service(object, true);
            }
        }
    }

    let selection = Selection::with_children(root, (0..tree.children(root).len()).collect());
    let mut buffer = Vec::new();
    rbxfs_format::model::RBXL.encode(tree, &[selection], &mut buffer)?;
    io::write_atomic(&repo.join(place), &buffer)?;
    Ok(())
}
