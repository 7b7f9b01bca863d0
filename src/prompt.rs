//! Prompt catalogs and device-output classification.
//!
//! A [`PromptCatalog`] holds the regular-expression fragments one device
//! family emits when it expects input: credential prompts, command prompts,
//! sub-mode prompts, and yes/no confirmations. Fragments arrive unanchored;
//! the compiled [`PromptMatcher`] anchors each one so a match must sit at the
//! end of a line, followed only by optional trailing whitespace.
//!
//! Fragment order is significant: when a line satisfies several fragments the
//! first declared one wins, so catalogs must order fragments from most- to
//! least-specific (credential prompts before command prompts).

use log::error;
use regex::{Regex, RegexSet};
use serde::Deserialize;

use crate::error::EngineError;

/// Banner emitted by a console server when control returns from an attached
/// device to the server itself. Matched internally by every catalog, after
/// all declared fragments.
pub const CONSOLE_SERVER_RETURN: &str = r"Press RETURN to get started\.";

/// Yes/no confirmation prompt fragment of a catalog record.
#[derive(Debug, Clone, Deserialize)]
pub struct YnPrompt {
    /// Fragment matching the device's yes/no confirmation prompt.
    #[serde(rename = "match")]
    pub pattern: String,
}

/// Parsed prompt-pattern definitions for one device family.
///
/// Values are regular-expression fragments without anchors; anchoring is
/// applied when the catalog is compiled. Loaded once per device type and
/// immutable thereafter.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptCatalog {
    /// Login password prompt.
    pub password: String,
    /// Privileged-mode password prompt.
    pub enable_password: String,
    /// Username prompt.
    pub username: String,
    /// Unprivileged command prompt.
    pub command1: String,
    /// Privileged command prompt.
    pub command2: String,
    /// First sub-mode prompt (e.g. configuration mode).
    pub sub1: String,
    /// Second sub-mode prompt (e.g. interface configuration).
    pub sub2: String,
    /// Yes/no confirmation prompt.
    pub yn: YnPrompt,
}

impl PromptCatalog {
    /// Parses a catalog from its JSON record form.
    ///
    /// A parse failure is logged and re-raised: a session cannot run without
    /// its prompt definitions.
    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        serde_json::from_str(text).map_err(|err| {
            error!("Cannot load prompt catalog: {err}");
            EngineError::from(err)
        })
    }

    /// Catalog fragments in declared (precedence) order, with the
    /// engine-internal console-server banner appended last.
    fn fragments(&self) -> Vec<(PromptCategory, &str)> {
        vec![
            (PromptCategory::Password, self.password.as_str()),
            (PromptCategory::EnablePassword, self.enable_password.as_str()),
            (PromptCategory::Username, self.username.as_str()),
            (PromptCategory::Command1, self.command1.as_str()),
            (PromptCategory::Command2, self.command2.as_str()),
            (PromptCategory::Sub1, self.sub1.as_str()),
            (PromptCategory::Sub2, self.sub2.as_str()),
            (PromptCategory::Yn, self.yn.pattern.as_str()),
            (PromptCategory::ConsoleReturn, CONSOLE_SERVER_RETURN),
        ]
    }

    /// Compiles the catalog into a matcher.
    ///
    /// Empty fragments are skipped; an unused slot in a record must not
    /// become a branch that matches every line.
    pub fn compile(&self) -> Result<PromptMatcher, EngineError> {
        let mut patterns = Vec::new();
        for (category, fragment) in self.fragments() {
            if fragment.is_empty() {
                continue;
            }
            let anchored = format!(r"(?:{fragment})\s*$");
            let regex = Regex::new(&anchored).map_err(|err| {
                EngineError::InvalidPromptPattern(format!(
                    "{} fragment does not compile: {}",
                    category.name(),
                    err
                ))
            })?;
            patterns.push((category, regex));
        }
        let set = RegexSet::new(patterns.iter().map(|(_, re)| re.as_str())).map_err(|err| {
            EngineError::InvalidPromptPattern(format!("failed to build prompt set: {err}"))
        })?;
        Ok(PromptMatcher { set, patterns })
    }
}

/// Category a line of device output was classified under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptCategory {
    /// Login password prompt.
    Password,
    /// Privileged-mode password prompt.
    EnablePassword,
    /// Username prompt.
    Username,
    /// Unprivileged command prompt.
    Command1,
    /// Privileged command prompt.
    Command2,
    /// First sub-mode prompt.
    Sub1,
    /// Second sub-mode prompt.
    Sub2,
    /// Yes/no confirmation prompt.
    Yn,
    /// Console-server return banner.
    ConsoleReturn,
}

impl PromptCategory {
    /// Catalog key of this category.
    pub fn name(&self) -> &'static str {
        match self {
            PromptCategory::Password => "password",
            PromptCategory::EnablePassword => "enable_password",
            PromptCategory::Username => "username",
            PromptCategory::Command1 => "command1",
            PromptCategory::Command2 => "command2",
            PromptCategory::Sub1 => "sub1",
            PromptCategory::Sub2 => "sub2",
            PromptCategory::Yn => "yn",
            PromptCategory::ConsoleReturn => "console_return",
        }
    }
}

/// The classification of one line of device output.
///
/// Produced per loop iteration and consumed immediately by reaction logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMatch {
    /// Category the line was classified under.
    pub category: PromptCategory,
    /// The matched prompt text, trailing whitespace trimmed.
    pub text: String,
}

/// Compiled form of a [`PromptCatalog`].
///
/// All fragments live in one `RegexSet`; classification takes the lowest
/// matching index, which is exactly declared-order precedence.
pub struct PromptMatcher {
    set: RegexSet,
    patterns: Vec<(PromptCategory, Regex)>,
}

impl PromptMatcher {
    /// Classifies a single line of device output.
    ///
    /// Returns `None` when no fragment matches at the end of the line.
    pub fn classify(&self, line: &str) -> Option<PromptMatch> {
        let index = self.set.matches(line).iter().next()?;
        let (category, regex) = &self.patterns[index];
        let text = regex.find(line)?.as_str().trim_end().to_string();
        Some(PromptMatch {
            category: *category,
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_test_catalog() -> PromptCatalog {
        PromptCatalog {
            password: r"^Password\s?:".to_string(),
            enable_password: r"^Enable Password\s?:".to_string(),
            username: r"^Username\s?:".to_string(),
            command1: r"^router\d*>".to_string(),
            command2: r"^router\d*#".to_string(),
            sub1: r"^router\d*\(config\)#".to_string(),
            sub2: r"^router\d*\(config-if\)#".to_string(),
            yn: YnPrompt {
                pattern: r"\[y/n\]:".to_string(),
            },
        }
    }

    #[test]
    fn each_fragment_classifies_its_own_line() {
        let matcher = build_test_catalog().compile().expect("catalog compiles");

        let cases = [
            ("Password:", PromptCategory::Password),
            ("Enable Password:", PromptCategory::EnablePassword),
            ("Username:", PromptCategory::Username),
            ("router1>", PromptCategory::Command1),
            ("router1#", PromptCategory::Command2),
            ("router1(config)#", PromptCategory::Sub1),
            ("router1(config-if)#", PromptCategory::Sub2),
            ("save config? [y/n]:", PromptCategory::Yn),
            ("Press RETURN to get started.", PromptCategory::ConsoleReturn),
        ];
        for (line, category) in cases {
            let m = matcher.classify(line).expect("line should classify");
            assert_eq!(m.category, category, "line: {line}");
        }
    }

    #[test]
    fn declared_order_breaks_ties() {
        // Both the password fragment and the command1 fragment satisfy the
        // line; the catalog declares password first, so password wins.
        let mut catalog = build_test_catalog();
        catalog.password = r"word:>".to_string();
        catalog.command1 = r"Password:>".to_string();
        let matcher = catalog.compile().expect("catalog compiles");

        let m = matcher.classify("Password:>").expect("line should classify");
        assert_eq!(m.category, PromptCategory::Password);
    }

    #[test]
    fn match_must_sit_at_end_of_line() {
        let matcher = build_test_catalog().compile().expect("catalog compiles");

        assert!(matcher.classify("Password: enter it now").is_none());
        let m = matcher.classify("Password:   ").expect("trailing whitespace ok");
        assert_eq!(m.category, PromptCategory::Password);
        assert_eq!(m.text, "Password:");
    }

    #[test]
    fn unmatched_line_returns_none() {
        let matcher = build_test_catalog().compile().expect("catalog compiles");
        assert!(matcher.classify("Building configuration...").is_none());
    }

    #[test]
    fn empty_fragments_are_skipped() {
        let mut catalog = build_test_catalog();
        catalog.sub2 = String::new();
        let matcher = catalog.compile().expect("catalog compiles");

        // An empty fragment would otherwise match every line.
        assert!(matcher.classify("anything at all").is_none());
        assert!(matcher.classify("router1#").is_some());
    }

    #[test]
    fn invalid_fragment_is_a_configuration_error() {
        let mut catalog = build_test_catalog();
        catalog.username = r"[".to_string();
        let err = match catalog.compile() {
            Ok(_) => panic!("invalid fragment should fail compilation"),
            Err(err) => err,
        };
        match err {
            EngineError::InvalidPromptPattern(msg) => assert!(msg.contains("username")),
            other => panic!("unexpected error type: {other}"),
        }
    }

    #[test]
    fn catalog_record_parses_from_json() {
        let record = r##"{
            "password": "^Password\\s?:",
            "enable_password": "^Enable Password\\s?:",
            "username": "^Username\\s?:",
            "command1": ">",
            "command2": "#",
            "sub1": "\\(config\\)#",
            "sub2": "\\(config-if\\)#",
            "yn": { "match": "\\[y/n\\]:" }
        }"##;
        let catalog = PromptCatalog::from_json(record).expect("record parses");
        assert_eq!(catalog.yn.pattern, r"\[y/n\]:");
        catalog.compile().expect("parsed catalog compiles");
    }

    #[test]
    fn malformed_record_is_reraised() {
        let err = match PromptCatalog::from_json("{ not json") {
            Ok(_) => panic!("malformed record should fail"),
            Err(err) => err,
        };
        assert!(matches!(err, EngineError::DefinitionLoad(_)));
    }
}
