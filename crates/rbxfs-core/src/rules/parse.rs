//! Rule file parser
//!
//! Line-oriented: blank lines and `#` comments are skipped, everything
//! else must be `<direction> <Pattern>(args) : <Filter>(args)`. A bad line
//! becomes a `ParseIssue` carrying its line number; parsing continues, so
//! one typo does not unload a whole scope's rules.

use super::args::{self, ArgKind};
use super::{Call, Direction, Registry, Rule};

/// A per-line parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    /// 1-based line number in the rule file.
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Parse a whole rule file, collecting every line's outcome.
pub fn parse_rules(
    input: &str,
    depth: u32,
    registry: &Registry,
) -> (Vec<Rule>, Vec<ParseIssue>) {
    let mut rules = Vec::new();
    let mut issues = Vec::new();
    for (index, raw) in input.lines().enumerate() {
        let line = raw.trim_start();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_rule_line(line, depth, registry) {
            Ok(rule) => rules.push(rule),
            Err(message) => issues.push(ParseIssue {
                line: index + 1,
                message,
            }),
        }
    }
    (rules, issues)
}

/// Leading `[A-Za-z]+` identifier of `input`.
fn ident(input: &str) -> &str {
    let end = input
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(input.len());
    &input[..end]
}

fn parse_rule_line(line: &str, depth: u32, registry: &Registry) -> Result<Rule, String> {
    let word = ident(line);
    let direction = match word {
        "out" => Direction::Out,
        "in" => Direction::In,
        _ => return Err(format!("unknown rule type `{word}`")),
    };
    let rest = line[word.len()..].trim_start();

    let (rest, pattern) =
        parse_call(rest, |name| registry.pattern_signature(direction, name))?;

    let rest = rest.trim_start();
    let rest = rest
        .strip_prefix(':')
        .ok_or_else(|| "bad syntax: expected `:`".to_string())?;

    let (rest, filter) = parse_call(rest.trim_start(), |name| {
        registry.filter_signature(direction, name)
    })?;

    if !rest.trim_start().is_empty() {
        return Err("unexpected characters beyond filter".to_string());
    }

    Ok(Rule {
        depth,
        direction,
        pattern,
        filter,
    })
}

/// Parse `Name(arg, ...)`; argument parsing is driven by the registry's
/// declared signature for the named function.
fn parse_call<'a>(
    input: &'a str,
    signature: impl Fn(&str) -> Option<&'static [ArgKind]>,
) -> Result<(&'a str, Call), String> {
    let name = ident(input);
    if name.is_empty() {
        return Err("empty function name".to_string());
    }
    let kinds = signature(name).ok_or_else(|| format!("unknown function `{name}`"))?;

    let mut rest = input[name.len()..]
        .strip_prefix('(')
        .ok_or_else(|| format!("function {name}: bad syntax: expected `(`"))?;

    let mut call_args = Vec::with_capacity(kinds.len());
    for (i, kind) in kinds.iter().enumerate() {
        let (arg, consumed) = args::parse_arg(*kind, rest)
            .map_err(|e| format!("function {name}: error parsing argument #{i}: {e}"))?;
        rest = &rest[consumed..];
        call_args.push(arg);

        if i + 1 < kinds.len() {
            if rest.starts_with(')') {
                return Err(format!(
                    "function {name}: expected {} arguments, got {}",
                    kinds.len(),
                    i + 1
                ));
            }
            rest = rest
                .strip_prefix(',')
                .ok_or_else(|| format!("function {name}: bad syntax: expected `,`"))?;
        }
    }

    let rest = rest
        .strip_prefix(')')
        .ok_or_else(|| format!("function {name}: bad syntax: expected `)`"))?;
    Ok((
        rest,
        Call {
            name: name.to_string(),
            args: call_args,
        },
    ))
}
