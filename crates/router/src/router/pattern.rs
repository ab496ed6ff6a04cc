//! Compiles route paths into anchored regular expressions.
//!
//! Supported syntax:
//! - `:name` captures one or more non-slash characters
//! - `:name(regex)` captures whatever `regex` matches
//! - `*` matches the rest of the path, without naming it
//! - anything else must match literally
//!
//! Constraint regexes are used verbatim and are not checked for pathological
//! backtracking; the `regex` crate guarantees linear time matching, but a huge
//! constraint still costs compile time and memory.

use crate::error::PatternError;
use regex::Regex;
use std::fmt;

const PARAM_MATCHER: &str = "[^/]+";
const WILDCARD_MATCHER: &str = ".*";

/// A compiled route path.
#[derive(Clone)]
pub struct PathPattern {
    raw: String,
    fragment: String,
    param_names: Vec<String>,
    matcher: Regex,
}

impl PathPattern {
    /// Compiles `raw` into an anchored matcher plus the ordered list of param names.
    pub fn compile(raw: impl Into<String>) -> Result<Self, PatternError> {
        let raw = raw.into();
        let mut param_names = Vec::new();
        let fragment = compile_fragment(&raw, &mut param_names)?;
        Self::assemble(raw, fragment, param_names)
    }

    /// Returns the same pattern mounted under `prefix`.
    ///
    /// Only the prefix goes through the compiler; the already compiled fragment of
    /// this pattern is reused as is. Prefix params come before the pattern's own.
    pub fn prefixed(&self, prefix: &str) -> Result<Self, PatternError> {
        let mut param_names = Vec::new();
        let mut fragment = compile_fragment(prefix, &mut param_names)?;
        for name in &self.param_names {
            push_param(&mut param_names, name)?;
        }
        fragment.push_str(&self.fragment);
        Self::assemble(format!("{prefix}{}", self.raw), fragment, param_names)
    }

    fn assemble(raw: String, fragment: String, param_names: Vec<String>) -> Result<Self, PatternError> {
        let matcher = Regex::new(&format!("^{fragment}$"))?;
        Ok(Self { raw, fragment, param_names, matcher })
    }

    /// The path as it was declared
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Param names in left to right order
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }

    /// Matches the whole `path`, returning the captured params in declaration order.
    ///
    /// A declared param that captured nothing is returned as an empty string.
    pub fn captures(&self, path: &str) -> Option<Vec<(String, String)>> {
        let captures = self.matcher.captures(path)?;
        let params = self
            .param_names
            .iter()
            .map(|name| {
                let value = captures.name(&group_name(name)).map_or("", |m| m.as_str());
                (name.clone(), value.to_string())
            })
            .collect();
        Some(params)
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathPattern")
            .field("raw", &self.raw)
            .field("matcher", &self.matcher.as_str())
            .field("param_names", &self.param_names)
            .finish()
    }
}

/// Param names are unique within a pattern, so they can name their capture group.
fn group_name(param: &str) -> String {
    format!("__{param}")
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn push_param(param_names: &mut Vec<String>, name: &str) -> Result<(), PatternError> {
    if param_names.iter().any(|existing| existing == name) {
        return Err(PatternError::DuplicateParam { name: name.to_string() });
    }
    param_names.push(name.to_string());
    Ok(())
}

/// Translates `raw` into an unanchored regex fragment, appending param names as they appear.
fn compile_fragment(raw: &str, param_names: &mut Vec<String>) -> Result<String, PatternError> {
    let mut fragment = String::with_capacity(raw.len() * 2);
    let mut chars = raw.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        match c {
            ':' if chars.peek().is_some_and(|&(_, next)| is_name_char(next)) => {
                let start = index + 1;
                let mut end = start;
                while let Some(&(i, next)) = chars.peek() {
                    if !is_name_char(next) {
                        break;
                    }
                    end = i + next.len_utf8();
                    chars.next();
                }
                let name = &raw[start..end];

                let matcher = if chars.peek().is_some_and(|&(_, next)| next == '(') {
                    chars.next();
                    read_constraint(&mut chars, name)?
                } else {
                    PARAM_MATCHER.to_string()
                };

                push_param(param_names, name)?;
                fragment.push_str(&format!("(?P<{}>{matcher})", group_name(name)));
            }
            '*' => fragment.push_str(WILDCARD_MATCHER),
            literal => {
                let mut buf = [0_u8; 4];
                fragment.push_str(&regex::escape(literal.encode_utf8(&mut buf)));
            }
        }
    }

    Ok(fragment)
}

/// Reads a constraint body up to its balancing `)`, the opening `(` already consumed.
fn read_constraint<I>(chars: &mut std::iter::Peekable<I>, name: &str) -> Result<String, PatternError>
where
    I: Iterator<Item = (usize, char)>,
{
    let mut constraint = String::new();
    let mut depth = 0_usize;
    let mut escaped = false;

    for (_, c) in chars.by_ref() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '(' {
            depth += 1;
        } else if c == ')' {
            if depth == 0 {
                return Ok(constraint);
            }
            depth -= 1;
        }
        constraint.push(c);
    }

    Err(PatternError::UnclosedConstraint { param: name.to_string() })
}
