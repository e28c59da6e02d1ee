//! Rule language: argument types, parser, registry, dispatch
//!
//! A rule pairs a pattern with a filter under a sync direction and a
//! cascade depth. Patterns select items (children/properties of an object
//! for sync-out, files of a directory for sync-in); filters turn a
//! pattern's selection into file mappings or selection plans.

pub mod args;
pub mod engine;
pub mod parse;
pub mod registry;

pub use args::{Arg, ArgClass, ArgFileName, ArgKind, ArgName, ArgString};
pub use engine::{call_in, call_out, RuleContext};
pub use parse::{parse_rules, ParseIssue};
pub use registry::Registry;

/// Sync direction a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Out,
    In,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Out => write!(f, "out"),
            Self::In => write!(f, "in"),
        }
    }
}

/// A named pattern or filter invocation with its parsed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub name: String,
    pub args: Vec<Arg>,
}

impl std::fmt::Display for Call {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{arg}")?;
        }
        write!(f, ")")
    }
}

/// One parsed rule: direction, cascade depth, pattern and filter calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Scope depth: global = 1, project = 2, per-directory = 3+.
    pub depth: u32,
    pub direction: Direction,
    pub pattern: Call,
    pub filter: Call,
}

impl Rule {
    /// Short form used in error messages, without the depth.
    pub fn label(&self) -> String {
        format!("{} {} : {}", self.direction, self.pattern, self.filter)
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} {} : {}",
            self.depth, self.direction, self.pattern, self.filter
        )
    }
}

/// Keep only the rules of one direction, preserving order.
pub fn filter_direction(rules: &[Rule], direction: Direction) -> Vec<Rule> {
    rules
        .iter()
        .filter(|rule| rule.direction == direction)
        .cloned()
        .collect()
}
