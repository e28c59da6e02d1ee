//! Rule argument types
//!
//! Four argument kinds appear in rule text. Each parser consumes from the
//! remaining input and reports how many bytes it took; the surrounding
//! call parser supplies the `,` / `)` terminators. `\x` escapes `x`
//! anywhere in an argument body, and parsed arguments are trimmed of
//! surrounding whitespace.

/// Argument kind tag; function signatures are lists of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    String,
    Name,
    Class,
    FileName,
}

/// A literal text argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgString(pub String);

impl std::fmt::Display for ArgString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A name matcher: a bare `*` matches anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgName {
    Any,
    Literal(String),
}

impl ArgName {
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Literal(literal) => literal == name,
        }
    }
}

impl std::fmt::Display for ArgName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => write!(f, "*"),
            Self::Literal(literal) => write!(f, "{literal}"),
        }
    }
}

/// A class matcher; `@` makes it strict (exact class, no subclasses).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgClass {
    pub name: ArgName,
    pub strict: bool,
}

impl std::fmt::Display for ArgClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.strict {
            write!(f, "@{}", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// A file name glob: `*` matches any run of characters, `\` escapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgFileName(pub String);

impl ArgFileName {
    /// Glob-match `name` against this pattern.
    ///
    /// Multiple and consecutive `*` are accepted and may match empty
    /// runs; `\*` matches a literal star.
    pub fn matches(&self, name: &str) -> bool {
        if self.0 == "*" {
            return true;
        }
        let mut pattern = self.0.as_bytes();
        let mut name = name.as_bytes();

        'pattern: while !pattern.is_empty() {
            let mut star = false;
            while let [b'*', rest @ ..] = pattern {
                pattern = rest;
                star = true;
            }

            // Literal chunk up to the next unescaped star.
            let mut chunk = Vec::new();
            let mut i = 0;
            while i < pattern.len() {
                match pattern[i] {
                    b'\\' => {
                        i += 1;
                        if i >= pattern.len() {
                            // Dangling escape; the pattern matches nothing.
                            return false;
                        }
                        chunk.push(pattern[i]);
                        i += 1;
                    }
                    b'*' => break,
                    byte => {
                        chunk.push(byte);
                        i += 1;
                    }
                }
            }

            if star && chunk.is_empty() {
                // Trailing star swallows the rest of the name.
                return true;
            }
            pattern = &pattern[i..];

            if name.starts_with(&chunk) && (name.len() == chunk.len() || !pattern.is_empty()) {
                name = &name[chunk.len()..];
                continue 'pattern;
            }
            if star {
                for offset in 0..name.len() {
                    if name[offset + 1..].starts_with(&chunk) {
                        let tail = &name[offset + 1 + chunk.len()..];
                        if pattern.is_empty() && !tail.is_empty() {
                            continue;
                        }
                        name = tail;
                        continue 'pattern;
                    }
                }
            }
            return false;
        }
        name.is_empty()
    }
}

impl std::fmt::Display for ArgFileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A parsed rule argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    String(ArgString),
    Name(ArgName),
    Class(ArgClass),
    FileName(ArgFileName),
}

impl std::fmt::Display for Arg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(a) => write!(f, "{a}"),
            Self::Name(a) => write!(f, "{a}"),
            Self::Class(a) => write!(f, "{a}"),
            Self::FileName(a) => write!(f, "{a}"),
        }
    }
}

/// Parse one argument of the given kind from the remaining input.
/// Returns the argument and the number of bytes consumed; the terminator
/// (`,` or `)`) is left unconsumed.
pub(crate) fn parse_arg(kind: ArgKind, input: &str) -> Result<(Arg, usize), String> {
    match kind {
        ArgKind::String => {
            let (text, n) = parse_string(input)?;
            Ok((Arg::String(ArgString(text)), n))
        }
        ArgKind::Name => {
            let (name, n) = parse_name(input)?;
            Ok((Arg::Name(name), n))
        }
        ArgKind::Class => {
            let (class, n) = parse_class(input)?;
            Ok((Arg::Class(class), n))
        }
        ArgKind::FileName => {
            let (text, n) = parse_string(input)?;
            Ok((Arg::FileName(ArgFileName(text)), n))
        }
    }
}

fn parse_string(input: &str) -> Result<(String, usize), String> {
    let mut out = String::new();
    let mut chars = input.char_indices();
    let mut consumed = input.len();
    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, escaped)) => out.push(escaped),
                None => return Err("reached end of line while parsing escape".into()),
            },
            ',' | ')' => {
                consumed = idx;
                break;
            }
            _ => out.push(c),
        }
    }
    Ok((out.trim().to_string(), consumed))
}

fn leading_whitespace(input: &str) -> usize {
    input.len() - input.trim_start().len()
}

fn parse_name(input: &str) -> Result<(ArgName, usize), String> {
    let ws = leading_whitespace(input);
    let rest = &input[ws..];
    if rest.is_empty() {
        return Ok((ArgName::Literal(String::new()), ws));
    }

    // A bare `*` (up to the terminator) means "any"; a star embedded in
    // more text is part of a literal.
    if let Some(after_star) = rest.strip_prefix('*') {
        let inner_ws = leading_whitespace(after_star);
        match after_star[inner_ws..].chars().next() {
            Some(',') | Some(')') | None => return Ok((ArgName::Any, ws + 1 + inner_ws)),
            _ => {}
        }
    }

    let (literal, n) = parse_string(rest)?;
    Ok((ArgName::Literal(literal), ws + n))
}

fn parse_class(input: &str) -> Result<(ArgClass, usize), String> {
    let ws = leading_whitespace(input);
    let rest = &input[ws..];
    if rest.is_empty() {
        return Ok((
            ArgClass {
                name: ArgName::Literal(String::new()),
                strict: false,
            },
            ws,
        ));
    }

    if let Some(after_at) = rest.strip_prefix('@') {
        let (name, n) = parse_name(after_at)?;
        Ok((ArgClass { name, strict: true }, ws + 1 + n))
    } else {
        let (name, n) = parse_name(rest)?;
        Ok((ArgClass { name, strict: false }, ws + n))
    }
}
