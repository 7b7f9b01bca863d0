//! Standard reaction policy: play a command list against a device.
//!
//! [`CommandRunner`] implements the stock reaction most sessions want on top
//! of the engine's expect loop: answer credential prompts, escalate to
//! privileged mode once, send queued commands at command prompts, confirm
//! yes/no questions, and send `exit` when the queue runs dry.
//!
//! The policy itself is a pure decision function over the matched category
//! and the current session flags; applying a decision to the engine is kept
//! separate so the policy is testable without a spawned process.

use std::collections::VecDeque;

use log::debug;

use crate::error::EngineError;
use crate::prompt::{PromptCategory, PromptMatch};
use crate::session::SessionEngine;

/// Command written to escalate into privileged mode.
const ENABLE_COMMAND: &str = "enable";

/// What the runner decided to write back for one matched prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction {
    /// Send the host's username (templated).
    SendUsername,
    /// Send the password for the current mode, secret-logged.
    SendPassword,
    /// Send a command (templated).
    SendCommand(String),
    /// Send the enable command and mark the session privileged.
    EnterEnable,
    /// Send a literal answer, no templating (yes/no prompts, banners).
    Answer(String),
}

/// Drives a queued list of commands through one session.
pub struct CommandRunner {
    commands: VecDeque<String>,
}

impl CommandRunner {
    /// Creates a runner over the commands to execute, in order.
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
        }
    }

    /// Commands not yet sent.
    pub fn remaining(&self) -> usize {
        self.commands.len()
    }

    /// Decides the reaction for one matched prompt.
    ///
    /// An unprivileged command prompt first escalates with `enable`; once
    /// the session is privileged, every command-class prompt consumes the
    /// next queued command, or `exit` when the queue is empty.
    pub fn decide(&mut self, category: PromptCategory, enable_mode: bool) -> Reaction {
        match category {
            PromptCategory::Password | PromptCategory::EnablePassword => Reaction::SendPassword,
            PromptCategory::Username => Reaction::SendUsername,
            PromptCategory::Command1 if !enable_mode => Reaction::EnterEnable,
            PromptCategory::Command1
            | PromptCategory::Command2
            | PromptCategory::Sub1
            | PromptCategory::Sub2 => self.next_command(),
            PromptCategory::Yn => Reaction::Answer("y".to_string()),
            PromptCategory::ConsoleReturn => Reaction::Answer(String::new()),
        }
    }

    fn next_command(&mut self) -> Reaction {
        match self.commands.pop_front() {
            Some(command) => Reaction::SendCommand(command),
            None => Reaction::SendCommand("exit".to_string()),
        }
    }

    /// Applies the policy to one matched prompt.
    pub fn apply(
        &mut self,
        engine: &mut SessionEngine,
        matched: &PromptMatch,
    ) -> Result<(), EngineError> {
        let reaction = self.decide(matched.category, engine.state().enable_mode);
        debug!("React to [{}] with {:?}", matched.category.name(), reaction);
        match reaction {
            Reaction::SendUsername => {
                let username = engine.host().username.clone();
                engine.send(&username)
            }
            Reaction::SendPassword => {
                let password = engine.password_for_mode().to_string();
                engine.send_secret(&password)
            }
            Reaction::SendCommand(command) => engine.send(&command),
            Reaction::EnterEnable => {
                engine.send(ENABLE_COMMAND)?;
                engine.set_enable_mode(true);
                Ok(())
            }
            Reaction::Answer(text) => engine.send_raw(&text),
        }
    }

    /// Spawns the engine's session and drives it to completion with this
    /// policy.
    pub async fn run(&mut self, engine: &mut SessionEngine) -> Result<(), EngineError> {
        engine.spawn()?;
        engine.run(|eng, matched| self.apply(eng, matched)).await
    }
}
