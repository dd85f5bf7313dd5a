// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recipient-side preference commands (`/frequency`, `/time`, `/settings`, `/help`).

use std::sync::{Arc, LazyLock};

use kogoto_config::model::RelayConfig;
use kogoto_core::{
    EventContent, InboundEvent, KogotoError, SendingTime, SettingsUpdate, StorageAdapter,
    TransportAdapter, UserSettings,
};
use regex::Regex;
use tracing::{debug, error, info, warn};

static FREQUENCY_CMD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/frequency\s+(\d+)\s*$").expect("frequency command pattern is valid")
});
static TIME_CMD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/time\s+(\d{1,2}):(\d{2})\s*$").expect("time command pattern is valid")
});

const COMMAND_LIST: &str = "/frequency N - how many complaints to collect per delivery\n\
/time HH:MM - daily delivery time\n\
/settings - show the current settings\n\
/help - show this list";

pub const INFO_TEXT: &str =
    "This channel only handles delivery settings. Send /help to see the available commands.";

pub const NOT_CONFIGURED_TEXT: &str =
    "No delivery settings yet. Use /frequency or /time to configure them.";

pub const STORE_FAILURE_TEXT: &str =
    "Sorry, the settings could not be updated. Please try again later.";

/// A parsed recipient message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Frequency(u32),
    Time(SendingTime),
    Settings,
    Help,
    /// Starts with `/` but matches no command or has a malformed argument.
    Invalid,
    /// Plain text without a `/` prefix.
    NotACommand,
}

impl Command {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if !text.starts_with('/') {
            return Command::NotACommand;
        }
        match text {
            "/settings" => return Command::Settings,
            "/help" => return Command::Help,
            _ => {}
        }

        if let Some(caps) = FREQUENCY_CMD.captures(text) {
            return match caps[1].parse::<u32>() {
                Ok(n) if n > 0 => Command::Frequency(n),
                _ => Command::Invalid,
            };
        }
        if let Some(caps) = TIME_CMD.captures(text) {
            let time = match (caps[1].parse::<u8>(), caps[2].parse::<u8>()) {
                (Ok(hour), Ok(minute)) => SendingTime::new(hour, minute).ok(),
                _ => None,
            };
            return time.map_or(Command::Invalid, Command::Time);
        }
        Command::Invalid
    }
}

pub fn help_text() -> String {
    format!("Available commands:\n{COMMAND_LIST}")
}

pub fn invalid_command_text() -> String {
    format!("Invalid command. Available commands:\n{COMMAND_LIST}")
}

fn settings_text(settings: &UserSettings) -> String {
    format!(
        "Current settings:\n- frequency: {}\n- delivery time: {}",
        settings.sending_frequency, settings.sending_time
    )
}

/// What the handler did with one recipient event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientOutcome {
    Ignored,
    Replied { command: Command, text: String },
}

/// Handles text sent on the recipient-side channel.
pub struct RecipientHandler {
    storage: Arc<dyn StorageAdapter>,
    transport: Arc<dyn TransportAdapter>,
    default_frequency: u32,
    default_time: SendingTime,
}

impl RecipientHandler {
    /// `transport` is the recipient-side channel.
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        transport: Arc<dyn TransportAdapter>,
        config: &RelayConfig,
    ) -> Result<Self, KogotoError> {
        let default_time = config.default_sending_time.parse::<SendingTime>().map_err(|e| {
            KogotoError::Config(format!("relay.default_sending_time: {e}"))
        })?;
        Ok(Self {
            storage,
            transport,
            default_frequency: config.default_sending_frequency,
            default_time,
        })
    }

    /// Handles one event. Returns `Err` only when the reply cannot be sent.
    pub async fn handle(&self, event: InboundEvent) -> Result<RecipientOutcome, KogotoError> {
        let InboundEvent::Message(message) = event else {
            return Ok(RecipientOutcome::Ignored);
        };
        let EventContent::Text(text) = &message.content else {
            return Ok(RecipientOutcome::Ignored);
        };
        if message.sender_id.is_empty() {
            return Ok(RecipientOutcome::Ignored);
        }

        let command = Command::parse(text);
        debug!(user_id = %message.sender_id, ?command, "recipient command");
        let reply = self.execute(&message.sender_id, command).await;

        if let Some(token) = message.reply_token.as_deref() {
            self.transport.reply(token, &reply).await?;
        }
        Ok(RecipientOutcome::Replied {
            command,
            text: reply,
        })
    }

    async fn execute(&self, user_id: &str, command: Command) -> String {
        let result = match command {
            Command::Frequency(n) => self.set_frequency(user_id, n).await,
            Command::Time(t) => self.set_time(user_id, t).await,
            Command::Settings => self.show(user_id).await,
            Command::Help => Ok(help_text()),
            Command::Invalid => Ok(invalid_command_text()),
            Command::NotACommand => Ok(INFO_TEXT.to_string()),
        };
        result.unwrap_or_else(|e| {
            error!(user_id, error = %e, "settings command failed");
            STORE_FAILURE_TEXT.to_string()
        })
    }

    async fn set_frequency(&self, user_id: &str, frequency: u32) -> Result<String, KogotoError> {
        let current = self.storage.get_user_settings(user_id).await?;
        let sending_time = current
            .as_ref()
            .and_then(|s| self.stored_time(s))
            .unwrap_or(self.default_time);
        self.storage
            .upsert_user_settings(&SettingsUpdate {
                user_id: user_id.to_string(),
                sending_frequency: frequency,
                sending_time,
            })
            .await?;
        info!(user_id, frequency, "delivery frequency updated");
        Ok(format!("Delivery frequency set to {frequency}."))
    }

    async fn set_time(&self, user_id: &str, time: SendingTime) -> Result<String, KogotoError> {
        let current = self.storage.get_user_settings(user_id).await?;
        let sending_frequency = current
            .map(|s| s.sending_frequency)
            .unwrap_or(self.default_frequency);
        self.storage
            .upsert_user_settings(&SettingsUpdate {
                user_id: user_id.to_string(),
                sending_frequency,
                sending_time: time,
            })
            .await?;
        info!(user_id, time = %time, "delivery time updated");
        Ok(format!("Delivery time set to {time}."))
    }

    async fn show(&self, user_id: &str) -> Result<String, KogotoError> {
        Ok(match self.storage.get_user_settings(user_id).await? {
            Some(settings) => settings_text(&settings),
            None => NOT_CONFIGURED_TEXT.to_string(),
        })
    }

    fn stored_time(&self, settings: &UserSettings) -> Option<SendingTime> {
        match settings.sending_time.parse() {
            Ok(t) => Some(t),
            Err(e) => {
                warn!(user_id = %settings.user_id, error = %e, "replacing invalid stored time");
                None
            }
        }
    }
}
