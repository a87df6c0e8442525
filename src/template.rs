//! Placeholder templates.
//!
//! Leaf strings embed named placeholders written as `{identifier}`, e.g.
//! `"确认删除 {n}？"`. Text in braces that is not an identifier (`{ }`,
//! `{1a}`, an unclosed `{`) is literal.

use std::collections::{
    BTreeMap,
    BTreeSet,
};
use std::fmt;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("No value supplied for placeholder '{{{name}}}'")]
    MissingArgument { name: String },
    #[error("Value '{name}' does not match any placeholder")]
    UnusedArgument { name: String },
}

/// Named substitution values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    values: BTreeMap<String, String>,
}

impl Args {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl fmt::Display) {
        self.values.insert(name.into(), value.to_string());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: fmt::Display> FromIterator<(K, V)> for Args {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut args = Self::new();
        for (name, value) in iter {
            args.insert(name, value);
        }
        args
    }
}

/// A piece of a parsed template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Placeholder(&'a str),
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Splits a template into literal text and placeholders.
#[must_use]
pub fn segments(template: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let after = rest.get(open + 1..).unwrap_or_default();
        let name = after
            .find('}')
            .and_then(|close| after.get(..close))
            .filter(|name| is_identifier(name));

        if let Some(name) = name {
            if open > 0 {
                out.push(Segment::Text(rest.get(..open).unwrap_or_default()));
            }
            out.push(Segment::Placeholder(name));
            rest = after.get(name.len() + 1..).unwrap_or_default();
        } else {
            out.push(Segment::Text(rest.get(..=open).unwrap_or_default()));
            rest = after;
        }
    }

    if !rest.is_empty() {
        out.push(Segment::Text(rest));
    }
    out
}

/// The set of placeholder names used by a template.
#[must_use]
pub fn placeholders(template: &str) -> BTreeSet<&str> {
    segments(template)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Placeholder(name) => Some(name),
            Segment::Text(_) => None,
        })
        .collect()
}

/// Returns true if `{` and `}` do not pair up.
#[must_use]
pub fn has_unbalanced_braces(template: &str) -> bool {
    let mut depth = 0_usize;
    for c in template.chars() {
        match c {
            '{' => depth += 1,
            '}' => {
                let Some(next) = depth.checked_sub(1) else {
                    return true;
                };
                depth = next;
            }
            _ => {}
        }
    }
    depth != 0
}

/// Substitutes placeholders, requiring exactly the names the template uses.
pub fn interpolate_strict(template: &str, args: &Args) -> Result<String, TemplateError> {
    let used = placeholders(template);
    if let Some(unused) = args.names().find(|name| !used.contains(name)) {
        return Err(TemplateError::UnusedArgument { name: unused.to_string() });
    }

    let mut result = String::with_capacity(template.len());
    for segment in segments(template) {
        match segment {
            Segment::Text(text) => result.push_str(text),
            Segment::Placeholder(name) => {
                let value = args
                    .get(name)
                    .ok_or_else(|| TemplateError::MissingArgument { name: name.to_string() })?;
                result.push_str(value);
            }
        }
    }
    Ok(result)
}

/// Substitutes the placeholders it has values for. Unmatched tokens stay as-is.
#[must_use]
pub fn interpolate_lenient(template: &str, args: &Args) -> String {
    let mut result = String::with_capacity(template.len());
    for segment in segments(template) {
        match segment {
            Segment::Text(text) => result.push_str(text),
            Segment::Placeholder(name) => match args.get(name) {
                Some(value) => result.push_str(value),
                None => {
                    result.push('{');
                    result.push_str(name);
                    result.push('}');
                }
            },
        }
    }
    result
}
