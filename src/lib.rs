//! # netexpect - Expect-style Session Automation for Network Devices
//!
//! `netexpect` automates interactive command-line sessions with network
//! devices (routers, switches) reached via Telnet or SSH. It spawns the
//! system connection client inside a pseudo-terminal and runs a classic
//! expect loop: read device output, classify it against a catalog of prompt
//! patterns, and react (send credentials, send commands, answer yes/no
//! confirmations) until the session naturally ends.
//!
//! ## Features
//!
//! - **Prompt Classification**: One compiled pattern set per device family,
//!   with declared-order precedence between overlapping fragments
//! - **Session State Tracking**: Privileged (enable) mode and pending-exit
//!   handling, including the single post-exit save-confirmation window
//! - **Credential Templating**: `${VAR}` environment references resolved at
//!   send time, with secrets redacted from the log
//! - **Legacy Device Compatibility**: Fixed ssh options for devices that
//!   only speak deprecated key exchanges
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netexpect::host::HostParameter;
//! use netexpect::prompt::PromptCatalog;
//! use netexpect::runner::CommandRunner;
//! use netexpect::session::SessionEngine;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = PromptCatalog::from_json(
//!         r#"{
//!             "password": "^Password\\s?:",
//!             "enable_password": "^Password\\s?:",
//!             "username": "^Username\\s?:",
//!             "command1": "^[\\w-]+>",
//!             "command2": "^[\\w-]+#",
//!             "sub1": "^[\\w-]+\\(config\\)#",
//!             "sub2": "^[\\w-]+\\(config-[\\w-]+\\)#",
//!             "yn": { "match": "\\[yes/no\\]:" }
//!         }"#,
//!     )?;
//!     let host = HostParameter::from_json(
//!         r#"{
//!             "protocol": "ssh",
//!             "ipaddr": "192.0.2.7",
//!             "username": "${NET_USER}",
//!             "password": "${NET_PASSWD}",
//!             "type": "cisco_ios"
//!         }"#,
//!     )?;
//!
//!     let mut engine = SessionEngine::new(host, &catalog)?;
//!     let mut runner = CommandRunner::new(["show version", "show ip route"]);
//!     runner.run(&mut engine).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Main Components
//!
//! - [`session::SessionEngine`] - Owns the spawned client and the expect loop
//! - [`prompt::PromptCatalog`] - Prompt patterns for one device family
//! - [`catalogs`] - Built-in catalogs for common device families
//! - [`host::HostParameter`] - Connection and credential parameters
//! - [`template::Templater`] - `${VAR}` environment templating
//! - [`runner::CommandRunner`] - Stock reaction policy over a command list
//! - [`error::EngineError`] - Error types for setup and the expect loop

pub mod catalogs;
pub mod error;
pub mod host;
pub mod prompt;
pub mod runner;
pub mod session;
pub mod template;
