//! Environment-variable templating for credentials and commands.
//!
//! Usernames, passwords, and outgoing command text may carry `${VAR}`
//! references that are resolved against the process environment just before
//! use, so credentials never have to live in host definition records.
//!
//! Resolution is deliberately permissive: a missing variable is logged and
//! substituted with an empty string, a blank variable is logged and
//! substituted as-is. Either way the session proceeds and fails visibly at
//! the device instead of silently at startup.

use std::collections::HashMap;

use log::{error, warn};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Matches a `${VAR}` environment reference inside a template string.
static VAR_REF: Lazy<Regex> =
    Lazy::new(
        || match Regex::new(r"\$\{(?<name>[A-Za-z_][A-Za-z0-9_]*)\}") {
            Ok(re) => re,
            Err(err) => panic!("invalid VAR_REF regex: {err}"),
        },
    );

/// Source of environment values for template resolution.
///
/// The engine resolves against [`ProcessEnv`] by default; tests substitute a
/// fixed dictionary to keep resolution deterministic.
pub trait EnvLookup: Send + Sync {
    /// Returns the value of the named variable, if it is set.
    fn get(&self, name: &str) -> Option<String>;
}

/// Lookup against the current process environment. Read-only.
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvLookup for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

/// Resolves `${VAR}` references in usernames, passwords, and command text.
pub struct Templater {
    env: Box<dyn EnvLookup>,
}

impl Templater {
    /// Creates a templater bound to the current process environment.
    pub fn process_env() -> Self {
        Self::with_env(Box::new(ProcessEnv))
    }

    /// Creates a templater bound to an explicit environment lookup.
    pub fn with_env(env: Box<dyn EnvLookup>) -> Self {
        Self { env }
    }

    /// Resolves every `${VAR}` reference in `input`.
    ///
    /// A string without references is returned unchanged. A reference to a
    /// missing variable is logged at error severity, naming the variable, and
    /// substituted with an empty string. A variable that exists but holds
    /// only whitespace is logged at warning severity and substituted
    /// unchanged.
    pub fn resolve(&self, input: &str) -> String {
        if !VAR_REF.is_match(input) {
            return input.to_string();
        }
        VAR_REF
            .replace_all(input, |caps: &Captures| {
                let name = &caps["name"];
                match self.env.get(name) {
                    Some(value) => {
                        if value.trim().is_empty() {
                            warn!("Env var: {name} exists, but holds a blank value");
                        }
                        value
                    }
                    None => {
                        error!("Variable name: {name} is not found in the environment");
                        String::new()
                    }
                }
            })
            .into_owned()
    }
}

impl Default for Templater {
    fn default() -> Self {
        Self::process_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_env(pairs: &[(&str, &str)]) -> Templater {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Templater::with_env(Box::new(env))
    }

    #[test]
    fn plain_string_passes_through_unchanged() {
        let templater = fixed_env(&[]);
        assert_eq!(templater.resolve("show version"), "show version");
    }

    #[test]
    fn reference_resolves_to_environment_value() {
        let templater = fixed_env(&[("HOME", "/root")]);
        assert_eq!(templater.resolve("${HOME}/banner"), "/root/banner");
    }

    #[test]
    fn missing_variable_substitutes_empty_string() {
        let templater = fixed_env(&[]);
        assert_eq!(templater.resolve("${HOME}/banner"), "/banner");
    }

    #[test]
    fn blank_variable_is_substituted_unchanged() {
        let templater = fixed_env(&[("NET_PASSWD", "   ")]);
        assert_eq!(templater.resolve("${NET_PASSWD}"), "   ");
    }

    #[test]
    fn multiple_references_are_all_resolved() {
        let templater = fixed_env(&[("NET_USER", "bob"), ("NET_DOMAIN", "lab")]);
        assert_eq!(
            templater.resolve("${NET_USER}@${NET_DOMAIN}"),
            "bob@lab"
        );
    }

    #[test]
    fn process_env_templater_reads_real_environment() {
        // PATH is set in any reasonable test environment.
        let templater = Templater::process_env();
        let resolved = templater.resolve("${PATH}");
        assert!(!resolved.is_empty());
        assert_ne!(resolved, "${PATH}");
    }
}
