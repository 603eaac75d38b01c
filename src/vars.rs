use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

// `{{NAME}}` with optional inner padding, or shell-style `${NAME}`
const REGEX_PATTERNS_PLACEHOLDER: &str =
    r"\{\{\s*(?P<mustache>[A-Za-z_][A-Za-z0-9_.\-]*)\s*\}\}|\$\{(?P<shell>[A-Za-z_][A-Za-z0-9_]*)\}";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(REGEX_PATTERNS_PLACEHOLDER).expect("placeholder pattern"));

/// Lookup chain for placeholder values.
///
/// Command line overrides win over profile variables, which win over the
/// process environment.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    overrides: HashMap<String, String>,
    profile: HashMap<String, String>,
    use_env: bool,
}

impl Variables {
    pub fn new(overrides: HashMap<String, String>, profile: HashMap<String, String>) -> Self {
        Variables {
            overrides,
            profile,
            use_env: true,
        }
    }

    pub fn get(&self, name: &str) -> Option<String> {
        if let Some(v) = self.overrides.get(name).or_else(|| self.profile.get(name)) {
            return Some(v.clone());
        }
        if self.use_env {
            std::env::var(name).ok()
        } else {
            None
        }
    }
}

#[cfg(test)]
impl Variables {
    /// A chain that never consults the process environment.
    pub fn isolated() -> Self {
        Variables::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.overrides.insert(name.to_string(), value.to_string());
        self
    }
}

pub fn replace_vars(text: &str, vars: &Variables) -> String {
    if !text.contains("{{") && !text.contains("${") {
        return text.to_string();
    }

    PLACEHOLDER
        .replace_all(text, |caps: &Captures| {
            let name = caps
                .name("mustache")
                .or_else(|| caps.name("shell"))
                .map(|m| m.as_str())
                .unwrap_or_default();
            vars.get(name).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Parses `NAME=VALUE` pairs given with `-e`.
pub fn parse_assignments(items: &[String]) -> crate::error::Result<HashMap<String, String>> {
    items
        .iter()
        .map(|s| match s.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok((name.trim().to_string(), value.to_string()))
            }
            _ => Err(crate::error::Error::InvalidArgument(format!(
                "expected NAME=VALUE, got '{s}'"
            ))),
        })
        .collect()
}
