//! Host parameters and connection command construction.
//!
//! A [`HostParameter`] record describes one device to drive: how to reach it,
//! which credentials to present, and which prompt catalog applies to it. The
//! record is owned by the caller and read-only to the engine for the whole
//! session.

use log::error;
use serde::Deserialize;

use crate::error::EngineError;
use crate::template::Templater;

/// Sentinel value used when a host record carries no enable password.
///
/// Deliberately invalid: a device that asks for an enable password the record
/// does not define fails visibly at its own prompt.
pub const ENABLE_NOT_DEFINED: &str = "_NOT_DEFINED_";

fn default_enable() -> String {
    ENABLE_NOT_DEFINED.to_string()
}

/// Connection and credential parameters for one device.
///
/// Username, password, and enable password may carry `${VAR}` environment
/// references, resolved through the session templater just before use.
#[derive(Debug, Clone, Deserialize)]
pub struct HostParameter {
    /// Connection method, matched case-insensitively: `telnet` or `ssh`.
    pub protocol: String,
    /// Address of the device.
    pub ipaddr: String,
    /// Login username.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Privileged-mode password.
    #[serde(default = "default_enable")]
    pub enable: String,
    /// Device type identifier, selects which prompt catalog applies.
    #[serde(rename = "type")]
    pub device_type: String,
}

impl HostParameter {
    /// Parses a host record from its JSON form.
    ///
    /// A parse failure is logged and re-raised, as for prompt catalogs.
    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        serde_json::from_str(text).map_err(|err| {
            error!("Cannot load host parameter: {err}");
            EngineError::from(err)
        })
    }
}

/// Builds the command line used to spawn the connection client.
///
/// - `telnet` becomes `telnet <ipaddr>`.
/// - `ssh` becomes `ssh -o StrictHostKeyChecking=no
///   -o KexAlgorithms=+diffie-hellman-group1-sha1 -l <username> <ipaddr>`,
///   with the username resolved through the templater. Both `-o` flags are
///   fixed; old device firmware often offers nothing newer than
///   group1-sha1 and presents unstable host keys.
///
/// Any other protocol is a configuration error: it is logged and `None` is
/// returned, and session setup aborts without a process being spawned.
pub fn spawn_command(host: &HostParameter, templater: &Templater) -> Option<String> {
    match host.protocol.to_ascii_lowercase().as_str() {
        "telnet" => Some(format!("telnet {}", host.ipaddr)),
        "ssh" => Some(
            [
                "ssh",
                "-o",
                "StrictHostKeyChecking=no",
                "-o",
                "KexAlgorithms=+diffie-hellman-group1-sha1",
                "-l",
                &templater.resolve(&host.username),
                &host.ipaddr,
            ]
            .join(" "),
        ),
        other => {
            error!("Unknown protocol {other}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn build_test_host(protocol: &str) -> HostParameter {
        HostParameter {
            protocol: protocol.to_string(),
            ipaddr: "10.0.0.1".to_string(),
            username: "bob".to_string(),
            password: "secret".to_string(),
            enable: ENABLE_NOT_DEFINED.to_string(),
            device_type: "cisco_ios".to_string(),
        }
    }

    fn fixed_env(pairs: &[(&str, &str)]) -> Templater {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Templater::with_env(Box::new(env))
    }

    #[test]
    fn telnet_command_is_exact() {
        let cmd = spawn_command(&build_test_host("telnet"), &fixed_env(&[]));
        assert_eq!(cmd.as_deref(), Some("telnet 10.0.0.1"));
    }

    #[test]
    fn ssh_command_carries_fixed_legacy_flags() {
        let cmd = spawn_command(&build_test_host("ssh"), &fixed_env(&[]));
        assert_eq!(
            cmd.as_deref(),
            Some(
                "ssh -o StrictHostKeyChecking=no \
                 -o KexAlgorithms=+diffie-hellman-group1-sha1 -l bob 10.0.0.1"
            )
        );
    }

    #[test]
    fn ssh_username_is_resolved_through_templater() {
        let mut host = build_test_host("ssh");
        host.username = "${NET_USER}".to_string();
        let cmd = spawn_command(&host, &fixed_env(&[("NET_USER", "alice")]));
        assert!(cmd.expect("command built").contains("-l alice 10.0.0.1"));
    }

    #[test]
    fn protocol_match_is_case_insensitive() {
        let cmd = spawn_command(&build_test_host("TELNET"), &fixed_env(&[]));
        assert_eq!(cmd.as_deref(), Some("telnet 10.0.0.1"));
    }

    #[test]
    fn unsupported_protocol_yields_no_command() {
        assert!(spawn_command(&build_test_host("rlogin"), &fixed_env(&[])).is_none());
    }

    #[test]
    fn host_record_parses_with_defaulted_enable() {
        let record = r#"{
            "protocol": "ssh",
            "ipaddr": "192.0.2.7",
            "username": "${NET_USER}",
            "password": "${NET_PASSWD}",
            "type": "cisco_ios"
        }"#;
        let host = HostParameter::from_json(record).expect("record parses");
        assert_eq!(host.enable, ENABLE_NOT_DEFINED);
        assert_eq!(host.device_type, "cisco_ios");
    }

    #[test]
    fn host_record_keeps_explicit_enable() {
        let record = r#"{
            "protocol": "telnet",
            "ipaddr": "192.0.2.7",
            "username": "bob",
            "password": "secret",
            "enable": "${NET_ENABLE}",
            "type": "cisco_ios"
        }"#;
        let host = HostParameter::from_json(record).expect("record parses");
        assert_eq!(host.enable, "${NET_ENABLE}");
    }

    #[test]
    fn malformed_host_record_is_reraised() {
        let err = match HostParameter::from_json("[]") {
            Ok(_) => panic!("malformed record should fail"),
            Err(err) => err,
        };
        assert!(matches!(err, EngineError::DefinitionLoad(_)));
    }
}
