//! Drives a scripted fake device through a full session.
//!
//! Run with `RUST_LOG=debug cargo run --example run_commands` to watch the
//! expect loop classify prompts and write responses. Pass `--ssh-command` to
//! print the connection command that would be built for a real device
//! instead of spawning anything.

use std::time::Duration;

use anyhow::Result;
use netexpect::host::{self, HostParameter};
use netexpect::prompt::PromptCatalog;
use netexpect::runner::CommandRunner;
use netexpect::session::{EngineOptions, SessionEngine};
use netexpect::template::Templater;

const CATALOG_RECORD: &str = r##"{
    "password": "Password\\s?:",
    "enable_password": "Enable Password\\s?:",
    "username": "Username\\s?:",
    "command1": "demo-sw>",
    "command2": "demo-sw#",
    "sub1": "demo-sw\\(config\\)#",
    "sub2": "demo-sw\\(config-if\\)#",
    "yn": { "match": "\\[y/n\\]:" }
}"##;

const HOST_RECORD: &str = r#"{
    "protocol": "ssh",
    "ipaddr": "192.0.2.7",
    "username": "${USER}",
    "password": "demo-password",
    "enable": "demo-enable",
    "type": "demo"
}"#;

const FAKE_DEVICE: &str = "printf 'Username: '; read u\n\
     printf 'Password: '; read p\n\
     printf 'demo-sw> '; read c1\n\
     printf 'Password: '; read ep\n\
     printf 'demo-sw# '; read c2\n\
     echo 'uptime is 4 weeks, 2 days'\n\
     printf 'demo-sw# '; read c3\n\
     printf 'save config? [y/n]: '; read yn\n";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let catalog = PromptCatalog::from_json(CATALOG_RECORD)?;
    let host_param = HostParameter::from_json(HOST_RECORD)?;

    if std::env::args().any(|arg| arg == "--ssh-command") {
        match host::spawn_command(&host_param, &Templater::process_env()) {
            Some(command) => println!("would spawn: {command}"),
            None => println!("no command for protocol {}", host_param.protocol),
        }
        return Ok(());
    }

    let script = std::env::temp_dir().join("netexpect_demo_device.sh");
    std::fs::write(&script, FAKE_DEVICE)?;

    let mut engine = SessionEngine::with_options(
        host_param,
        &catalog,
        EngineOptions {
            timeout: Duration::from_secs(5),
            verbose: true,
        },
    )?;
    engine.spawn_with_command(&format!("sh {}", script.display()))?;

    let mut runner = CommandRunner::new(["show version"]);
    engine.run(|eng, m| runner.apply(eng, m)).await?;

    println!("session ended in phase {:?}", engine.phase());
    std::fs::remove_file(&script)?;
    Ok(())
}
