//! Voice intents handled by the enclosure.
//!
//! Intents are bound through an explicit table built at construction time. Each entry names
//! the intent file registered with the host's intent parser and the handler that runs when
//! the parser matches it.

use std::{collections::HashMap, path::PathBuf};

use enclosure_common::{Message, Topic};
use serde_json::json;

use crate::services::Service;

/// What the handler of an intent does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentHandler {
    /// Bring `service` into the `enable` state, unless it already is.
    Toggle { service: Service, enable: bool },
}

/// One row of the intent table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentBinding {
    /// Intent file registered with the parser.
    pub file: &'static str,
    /// Handler name, reported on handler start/complete events.
    pub handler_name: &'static str,
    pub handler: IntentHandler,
}

impl IntentBinding {
    /// Dialog spoken after the handler changed something.
    #[must_use]
    pub fn done_dialog(&self) -> String {
        let IntentHandler::Toggle { service, enable } = self.handler;
        format!("{}{}", if enable { "Enabled" } else { "Disabled" }, service.label())
    }

    /// Dialog spoken when the target state was already in place.
    #[must_use]
    pub fn already_dialog(&self) -> String {
        format!("Already{}", self.done_dialog())
    }
}

/// The intents this daemon registers.
pub const INTENTS: [IntentBinding; 4] = [
    IntentBinding {
        file: "EnableSSH.intent",
        handler_name: "on_enable_ssh",
        handler: IntentHandler::Toggle {
            service: Service::Ssh,
            enable: true,
        },
    },
    IntentBinding {
        file: "DisableSSH.intent",
        handler_name: "on_disable_ssh",
        handler: IntentHandler::Toggle {
            service: Service::Ssh,
            enable: false,
        },
    },
    IntentBinding {
        file: "EnableAirPlay.intent",
        handler_name: "on_enable_airplay",
        handler: IntentHandler::Toggle {
            service: Service::AirPlay,
            enable: true,
        },
    },
    IntentBinding {
        file: "DisableAirPlay.intent",
        handler_name: "on_disable_airplay",
        handler: IntentHandler::Toggle {
            service: Service::AirPlay,
            enable: false,
        },
    },
];

/// Intent names (`<skill id>:<file>`) mapped to their bindings.
#[derive(Debug, Clone)]
pub struct IntentTable {
    by_name: HashMap<String, IntentBinding>,
}

impl IntentTable {
    #[must_use]
    pub fn new(skill_id: &str) -> Self {
        Self {
            by_name: INTENTS
                .iter()
                .map(|binding| (format!("{skill_id}:{}", binding.file), *binding))
                .collect(),
        }
    }

    #[must_use]
    pub fn get(&self, intent_name: &str) -> Option<&IntentBinding> {
        self.by_name.get(intent_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IntentBinding)> {
        self.by_name.iter().map(|(name, binding)| (name.as_str(), binding))
    }

    /// Handler identifiers as they appear on handler start/complete events.
    pub fn handler_ids<'a>(&'a self, skill_name: &'a str) -> impl Iterator<Item = String> + 'a {
        self.by_name
            .values()
            .map(move |binding| format!("{skill_name}.{}", binding.handler_name))
    }

    /// Registration requests for the host's intent parser.
    ///
    /// The first locale directory containing the intent file wins; when none does, the
    /// file is expected in the first directory.
    #[must_use]
    pub fn registrations(&self, locale_dirs: &[PathBuf]) -> Vec<Message> {
        let mut names: Vec<&String> = self.by_name.keys().collect();
        names.sort();
        names
            .into_iter()
            .filter_map(|name| {
                let binding = self.by_name.get(name)?;
                let file_name = locale_dirs
                    .iter()
                    .map(|dir| dir.join(binding.file))
                    .find(|path| path.exists())
                    .or_else(|| locale_dirs.first().map(|dir| dir.join(binding.file)))?;
                Some(Message::new(
                    Topic::RegisterIntent.as_str(),
                    json!({
                        "file_name": file_name.to_string_lossy(),
                        "name": name,
                    }),
                ))
            })
            .collect()
    }
}
