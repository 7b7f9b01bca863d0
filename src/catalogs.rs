//! Built-in prompt catalogs for common device families.
//!
//! Factory functions pre-configured with the prompt shapes of well-known
//! network operating systems, keyed by the `type` field of a host record.
//! Catalogs loaded from external definition records take the same shape;
//! these exist so the common cases need no record at all.

use crate::prompt::{PromptCatalog, YnPrompt};

/// Built-in catalog names supported by this crate.
pub const BUILTIN_CATALOGS: &[&str] = &["cisco_ios", "juniper_junos"];

/// Returns the built-in catalog for a device type, if one exists.
pub fn catalog_for(device_type: &str) -> Option<PromptCatalog> {
    match device_type {
        "cisco_ios" => Some(cisco_ios()),
        "juniper_junos" => Some(juniper_junos()),
        _ => None,
    }
}

/// Cisco IOS / IOS-XE prompt shapes.
///
/// The login and enable password prompts are identical on IOS; precedence
/// makes that harmless, and [`crate::session::SessionEngine::password_for_mode`]
/// picks the credential by mode, not by category.
pub fn cisco_ios() -> PromptCatalog {
    PromptCatalog {
        password: r"^Password\s?:".to_string(),
        enable_password: r"^Password\s?:".to_string(),
        username: r"^Username\s?:".to_string(),
        command1: r"^[\w.-]+>".to_string(),
        command2: r"^[\w.-]+#".to_string(),
        sub1: r"^[\w.-]+\(config\)#".to_string(),
        sub2: r"^[\w.-]+\(config-[\w-]+\)#".to_string(),
        yn: YnPrompt {
            pattern: r"\[yes/no\]:".to_string(),
        },
    }
}

/// Juniper JunOS prompt shapes.
pub fn juniper_junos() -> PromptCatalog {
    PromptCatalog {
        password: r"^Password\s?:".to_string(),
        enable_password: r"^Password\s?:".to_string(),
        username: r"login\s?:".to_string(),
        command1: r"^[\w.-]+@[\w.-]+%".to_string(),
        command2: r"^[\w.-]+@[\w.-]+>".to_string(),
        sub1: r"^[\w.-]+@[\w.-]+#".to_string(),
        sub2: r"^\[edit[\w\s.-]*\]".to_string(),
        yn: YnPrompt {
            pattern: r"\[yes,no\]".to_string(),
        },
    }
}
