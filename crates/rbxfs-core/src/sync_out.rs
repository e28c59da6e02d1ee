//! Sync-out driver
//!
//! Decodes each top-level place artifact, plans and canonicalizes its
//! actions, then materializes them under the place's output directory.
//! Failures are collected per place; one broken place never stops the
//! others.

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use rbxfs_format::Format as _;
use rbxfs_fs::{io, layout};
use rbxfs_tree::{ObjectId, RefTable, Tree};

use crate::action::OutAction;
use crate::analyze_out::analyze_out;
use crate::error::{Error, FileErrors, Result};
use crate::plan_out::plan_out;
use crate::rules::{filter_direction, Direction, Registry, Rule, RuleContext};
use crate::sidecar::Sidecar;
use crate::sync::{load_catalog, load_standard_rules, render_out_actions, SyncOptions, SyncReport};

/// Decompose every place artifact in `repo` into its rule-shaped
/// directory tree.
pub fn sync_out(repo: &Path, options: &SyncOptions) -> Result<SyncReport> {
    if !layout::is_repository(repo) {
        return Err(Error::NotRepository {
            path: repo.to_path_buf(),
        });
    }

    let registry = Registry::new();
    let catalog = load_catalog(repo);
    let loaded = load_standard_rules(repo, &registry);
    let rules = filter_direction(&loaded.rules, Direction::Out);

    let mut report = SyncReport::new();
    report.errors.extend(loaded.issues);
    for rule in &rules {
        debug!(%rule, "loaded sync-out rule");
    }

    let places = layout::places_in_repo(repo)?;
    if places.is_empty() {
        warn!("no places to sync out");
        report.actions.push("no files to sync".to_string());
        return Ok(report);
    }

    let ctx = RuleContext {
        registry: &registry,
        catalog: catalog.as_ref(),
    };

    let mut bundles: Vec<FileErrors> = Vec::new();
    for place in &places {
        if let Err(bundle) = sync_out_place(repo, place, &ctx, &rules, options, &mut report) {
            bundles.push(bundle);
        }
    }

    if !bundles.is_empty() {
        report.success = false;
        return Err(Error::Aggregate(bundles));
    }
    Ok(report)
}

fn sync_out_place(
    repo: &Path,
    place: &str,
    ctx: &RuleContext<'_>,
    rules: &[Rule],
    options: &SyncOptions,
    report: &mut SyncReport,
) -> std::result::Result<(), FileErrors> {
    let mut bundle = FileErrors::new(place, "syncing out");

    let mut tree = Tree::new();
    let mut refs = RefTable::new();
    let root = match decode_place(repo, place, &mut tree, &mut refs) {
        Ok(root) => root,
        Err(error) => {
            bundle.push(error);
            return Err(bundle);
        }
    };

    let plan = plan_out(ctx, &tree, root, rules);
    bundle.errors.extend(plan.errors);

    let actions = analyze_out(&tree, plan.actions);
    let dir = layout::place_dir(place);
    info!(%place, %dir, actions = actions.len(), "planned sync-out");

    if options.dry_run {
        report
            .actions
            .push(format!("sync-out `{place}` -> `{dir}/`"));
        report.actions.extend(render_out_actions(&tree, &actions));
    } else {
        apply_actions(repo, &dir, &tree, &actions, &mut bundle);
        report.actions.push(format!(
            "synced `{place}` -> `{dir}/` ({} actions)",
            actions.len()
        ));
    }

    if bundle.is_empty() {
        Ok(())
    } else {
        Err(bundle)
    }
}

/// Decode a place artifact into `tree` and hang its top-level objects
/// under a synthetic DataModel root.
fn decode_place(
    repo: &Path,
    place: &str,
    tree: &mut Tree,
    refs: &mut RefTable,
) -> Result<ObjectId> {
    let ext = place.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
    let format =
        rbxfs_format::place_format(ext).ok_or_else(|| rbxfs_format::Error::Unsupported {
            ext: ext.to_string(),
        })?;

    let path = repo.join(place);
    let mut file = fs::File::open(&path).map_err(|e| rbxfs_fs::Error::io(&path, e))?;
    let source = format.decode(tree, refs, &mut file)?;

    let root = tree.insert("DataModel");
    for child in source.children {
        tree.set_parent(child, Some(root))?;
    }
    Ok(root)
}

fn apply_actions(
    repo: &Path,
    dir: &str,
    tree: &Tree,
    actions: &[OutAction],
    bundle: &mut FileErrors,
) {
    let base = repo.join(dir);
    if let Err(error) = io::create_dir_if_missing(&base) {
        bundle.push(error.into());
        return;
    }

    for action in actions {
        if let Err(error) = apply_action(&base, tree, action) {
            warn!(path = %action.full_path(), %error, "sync-out action failed");
            bundle.push(error);
        }
    }
}

fn apply_action(base: &Path, tree: &Tree, action: &OutAction) -> Result<()> {
    if action.map.file.is_ignore() {
        return Ok(());
    }
    let path = action.dir.to_native(base).join(&action.map.file.name);

    if action.map.file.is_dir {
        io::create_dir_if_missing(&path)?;
        let target = action
            .map
            .selections
            .first()
            .and_then(|s| s.children.first().copied().map(|i| (s.object, i)))
            .and_then(|(object, index)| tree.child(object, index));
        let Some(child) = target else {
            // Analysis leaves exactly one in-bounds child on dir actions.
            warn!(path = %action.full_path(), "directory action without a valid selection");
            return Ok(());
        };
        Sidecar::from_object(tree, child).write(&path)?;
    } else {
        let ext = action
            .map
            .file
            .name
            .rsplit_once('.')
            .map(|(_, e)| e)
            .unwrap_or("");
        let format =
            rbxfs_format::from_extension(ext).ok_or_else(|| rbxfs_format::Error::Unsupported {
                ext: ext.to_string(),
            })?;
        let mut buffer = Vec::new();
        format.encode(tree, &action.map.selections, &mut buffer)?;
        io::write_atomic(&path, &buffer)?;
    }
    Ok(())
}
