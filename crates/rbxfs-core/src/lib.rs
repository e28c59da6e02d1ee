//! Rule-driven sync engine for rbxfs
//!
//! Coordinates the whole pipeline between a place artifact and its
//! rule-shaped directory tree:
//!
//! ```text
//!   sync-out: place bytes -> codec -> tree -> planner -> analyzer -> filesystem
//!   sync-in:  filesystem -> planner (source cache) -> analyzer -> tree -> codec
//! ```
//!
//! The rule language (patterns and filters cascaded across scopes), the
//! two planners, and the multi-pass analyzers live here; codecs, the
//! scene tree, and filesystem primitives come from the layer below:
//!
//! ```text
//!                 rbxfs-cli
//!                     |
//!                 rbxfs-core
//!                     |
//!       +-----------+-----------+
//!       |           |           |
//!   rbxfs-fs   rbxfs-format  rbxfs-tree
//! ```

pub mod action;
pub mod analyze_in;
pub mod analyze_out;
pub mod error;
pub mod plan_in;
pub mod plan_out;
pub mod rules;
pub mod sidecar;
pub mod source;
pub mod sync;
pub mod sync_in;
pub mod sync_out;

pub use action::{FileDef, InAction, InSelection, OutAction, OutMap};
pub use analyze_in::analyze_in;
pub use analyze_out::analyze_out;
pub use error::{Error, FileErrors, Result};
pub use plan_in::{plan_in, InPlan};
pub use plan_out::{plan_out, OutPlan};
pub use rules::{
    call_in, call_out, filter_direction, parse_rules, Arg, ArgClass, ArgFileName, ArgKind,
    ArgName, ArgString, Call, Direction, ParseIssue, Registry, Rule, RuleContext,
};
pub use sidecar::Sidecar;
pub use source::{SourceCache, SourceEntry, SourceMap};
pub use sync::{SyncOptions, SyncReport};
pub use sync_in::sync_in;
pub use sync_out::sync_out;
