use std::sync::OnceLock;

use regex::{Captures, Regex};
use thiserror::Error;

/// Failure while expanding `{{ env.VAR }}` placeholders
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExpandError {
    /// Variable is unset and no default was given
    #[error("environment variable not found: `{0}`")]
    MissingVariable(String),

    /// Placeholder used a scope other than `env.`
    #[error("only variables scoped with 'env.' are supported: `{0}`")]
    UnsupportedScope(String),
}

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // `{{ scope.NAME }}` with an optional `| default("value")`
    RE.get_or_init(|| {
        Regex::new(r#"\{\{\s*([A-Za-z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#)
            .expect("placeholder pattern is valid")
    })
}

/// Expand `{{ env.VAR }}` and `{{ env.VAR | default("x") }}` in raw TOML
///
/// Comment lines are left untouched so commented-out secrets do not
/// require their variables to be set.
///
/// # Errors
///
/// Returns the first missing variable or unsupported scope encountered
pub fn expand_env(input: &str) -> Result<String, ExpandError> {
    let expanded = input
        .split('\n')
        .map(expand_line)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(expanded.join("\n"))
}

fn expand_line(line: &str) -> Result<String, ExpandError> {
    if line.trim_start().starts_with('#') {
        return Ok(line.to_owned());
    }

    let mut failure = None;
    let replaced = placeholder().replace_all(line, |caps: &Captures<'_>| {
        match resolve(&caps[1], caps.get(2).map(|m| m.as_str())) {
            Ok(value) => value,
            Err(e) => {
                failure.get_or_insert(e);
                String::new()
            }
        }
    });

    match failure {
        Some(e) => Err(e),
        None => Ok(replaced.into_owned()),
    }
}

fn resolve(key: &str, default: Option<&str>) -> Result<String, ExpandError> {
    let Some(name) = key.strip_prefix("env.").filter(|name| !name.is_empty() && !name.contains('.')) else {
        return Err(ExpandError::UnsupportedScope(key.to_owned()));
    };

    match (std::env::var(name), default) {
        (Ok(value), _) => Ok(value),
        (Err(_), Some(fallback)) => Ok(fallback.to_owned()),
        (Err(_), None) => Err(ExpandError::MissingVariable(name.to_owned())),
    }
}
