//! The event reaction table.
//!
//! Maps bus message types to reactions. Each reaction is a side effect: paint a visual,
//! run a system command, speak a phrase, or toggle a service. Reactions run one at a
//! time and to completion; nothing is returned to the bus.

mod intents;
mod state;

pub use intents::*;
pub use state::*;

use core::time::Duration;
use std::{
    collections::{HashMap, HashSet},
    path::PathBuf,
};

use enclosure_common::{CommandRunner, Message, SystemCommand, Topic};
use serde_json::{Value, json};
use thiserror::Error as ThisError;
use tokio::time::sleep;
use tracing::{debug, error, info, trace, warn};

use crate::{
    bus::Outbox,
    config::{EnclosureConfig, PairingConfig},
    dialog::Dialogs,
    display::{Display, Visual},
    pairing,
    services::{Service, ServiceControl},
    settings::{SettingsError, SettingsStore, SkillSettings},
};

/// What happens when a subscribed message arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    ListenerStarted,
    ListenerEnded,
    FailedStt,
    DeviceReady,
    HandlerStarted,
    HandlerComplete,
    AudioOutputStart,
    AudioOutputEnd,
    Shutdown,
    Reboot,
    SettingsChanged,
    Intent(IntentBinding),
}

/// Subscriptions made at initialization, in order.
pub const REACTIONS: [(Topic, Reaction); 11] = [
    (Topic::Wakeword, Reaction::ListenerStarted),
    (Topic::RecordEnd, Reaction::ListenerEnded),
    (Topic::SpeechUnknown, Reaction::FailedStt),
    (Topic::Ready, Reaction::DeviceReady),
    (Topic::HandlerStart, Reaction::HandlerStarted),
    (Topic::HandlerComplete, Reaction::HandlerComplete),
    (Topic::AudioOutputStart, Reaction::AudioOutputStart),
    (Topic::AudioOutputEnd, Reaction::AudioOutputEnd),
    (Topic::SystemShutdown, Reaction::Shutdown),
    (Topic::SystemReboot, Reaction::Reboot),
    (Topic::SettingsChanged, Reaction::SettingsChanged),
];

/// Subscriptions removed again at teardown.
pub const MANUAL_SUBSCRIPTIONS: [Topic; 4] = [
    Topic::HandlerStart,
    Topic::HandlerComplete,
    Topic::AudioOutputStart,
    Topic::AudioOutputEnd,
];

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum SubscribeError {
    #[error("'{0}' is already subscribed")]
    Duplicate(String),
    #[error("cannot subscribe to an empty message type")]
    EmptyTopic,
}

/// The enclosure's reactions to bus events, with the state they share.
pub struct ReactionTable<R> {
    runner: R,
    outbox: Outbox,
    display: Display,
    services: ServiceControl,
    dialogs: Dialogs,
    settings: SettingsStore,
    pairing: PairingConfig,
    shutdown_command: String,
    reboot_command: String,
    farewell_delay: Duration,
    skill_id: String,
    skill_name: String,
    locale_dirs: Vec<PathBuf>,
    intents: IntentTable,
    self_handlers: HashSet<String>,
    subscriptions: HashMap<String, Reaction>,
    state: DeviceState,
}

impl<R: CommandRunner> ReactionTable<R> {
    /// Builds the table; nothing is subscribed until [`Self::initialize`].
    ///
    /// `initial` is the content of the settings store at startup.
    pub fn new(config: &EnclosureConfig, runner: R, outbox: Outbox, initial: &SkillSettings) -> Self {
        let intents = IntentTable::new(&config.skill.id);
        let self_handlers = intents
            .handler_ids(&config.skill.name)
            .chain(config.skill.self_handlers.iter().cloned())
            .collect();
        let locale_dirs = config.locale_dirs();
        Self {
            runner,
            outbox,
            display: Display::new(config),
            services: ServiceControl::new(&config.services, &config.system),
            dialogs: Dialogs::new(locale_dirs.clone()),
            settings: SettingsStore::new(config.settings_file()),
            pairing: config.pairing.clone(),
            shutdown_command: config.system.shutdown_command.clone(),
            reboot_command: config.system.reboot_command.clone(),
            farewell_delay: Duration::from_secs(config.system.farewell_delay_secs),
            skill_id: config.skill.id.clone(),
            skill_name: config.skill.name.clone(),
            locale_dirs,
            intents,
            self_handlers,
            subscriptions: HashMap::new(),
            state: DeviceState::new(initial),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &DeviceState {
        &self.state
    }

    #[must_use]
    pub fn is_subscribed(&self, msg_type: &str) -> bool {
        self.subscriptions.contains_key(msg_type)
    }

    /// Subscribes every reaction and intent handler.
    ///
    /// A failing subscription is logged and aborts the remaining ones; startup continues
    /// with whatever got registered.
    pub fn initialize(&mut self) {
        if let Err(e) = self.subscribe_all() {
            error!(error = %e, "Failed to register enclosure reactions");
        }
    }

    fn subscribe_all(&mut self) -> Result<(), SubscribeError> {
        for (topic, reaction) in REACTIONS {
            self.subscribe(topic.as_str(), reaction)?;
        }
        let intents: Vec<(String, IntentBinding)> = self
            .intents
            .iter()
            .map(|(name, binding)| (name.to_owned(), *binding))
            .collect();
        for (name, binding) in intents {
            self.subscribe(&name, Reaction::Intent(binding))?;
        }
        Ok(())
    }

    /// Registers `reaction` for messages of type `msg_type`.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty message type or one that is already subscribed.
    pub fn subscribe(&mut self, msg_type: &str, reaction: Reaction) -> Result<(), SubscribeError> {
        if msg_type.is_empty() {
            return Err(SubscribeError::EmptyTopic);
        }
        if self.subscriptions.contains_key(msg_type) {
            return Err(SubscribeError::Duplicate(msg_type.to_owned()));
        }
        trace!(msg_type, ?reaction, "Subscribed");
        self.subscriptions.insert(msg_type.to_owned(), reaction);
        Ok(())
    }

    pub fn unsubscribe(&mut self, msg_type: &str) -> Option<Reaction> {
        self.subscriptions.remove(msg_type)
    }

    /// Removes the subscriptions that are not tied to the intent registrations.
    pub fn shutdown(&mut self) {
        for topic in MANUAL_SUBSCRIPTIONS {
            self.unsubscribe(topic.as_str());
        }
    }

    /// Emits the intent registrations for the host's intent parser.
    pub fn register_intents(&self) {
        for msg in self.intents.registrations(&self.locale_dirs) {
            self.emit(msg);
        }
    }

    /// Runs the reaction subscribed to `msg`'s type, if any.
    pub async fn dispatch(&mut self, msg: &Message) {
        let Some(&reaction) = self.subscriptions.get(&msg.msg_type) else {
            trace!(msg_type = %msg.msg_type, "No reaction subscribed");
            return;
        };
        debug!(msg_type = %msg.msg_type, ?reaction, "Dispatching");
        match reaction {
            Reaction::ListenerStarted => self.show(Visual::Listening).await,
            Reaction::ListenerEnded | Reaction::FailedStt => self.show(Visual::Idle).await,
            Reaction::DeviceReady => self.on_ready().await,
            Reaction::HandlerStarted => self.on_handler_started(msg).await,
            Reaction::HandlerComplete => self.on_handler_complete(msg).await,
            Reaction::AudioOutputStart => self.on_audio_output_start().await,
            Reaction::AudioOutputEnd => self.on_audio_output_end().await,
            Reaction::Shutdown => {
                let command = SystemCommand::shell(&self.shutdown_command);
                self.farewell("farewell.shutdown", &command).await;
            }
            Reaction::Reboot => {
                let command = SystemCommand::shell(&self.reboot_command);
                self.farewell("farewell.reboot", &command).await;
            }
            Reaction::SettingsChanged => self.on_remote_settings(msg).await,
            Reaction::Intent(binding) => self.on_intent(binding).await,
        }
    }

    async fn on_ready(&mut self) {
        if !self.state.finish_loading() {
            debug!("Device ready again, ignoring");
            return;
        }
        info!("Device ready");
        if pairing::is_paired(&self.pairing).await {
            self.show(Visual::Idle).await;
            self.speak_dialog("finished.booting").await;
        }
    }

    fn is_self_handler(&self, msg: &Message) -> bool {
        msg.data_str("handler")
            .is_some_and(|handler| self.self_handlers.contains(handler))
    }

    async fn on_handler_started(&mut self, msg: &Message) {
        if self.is_self_handler(msg) {
            return;
        }
        self.show(Visual::Thinking).await;
    }

    async fn on_handler_complete(&mut self, msg: &Message) {
        if self.is_self_handler(msg) {
            return;
        }
        // Once speech has started, the audio end event repaints the idle visual
        if !self.state.is_speaking() {
            self.show(Visual::Idle).await;
        }
    }

    async fn on_audio_output_start(&mut self) {
        self.state.set_speaking(true);
        self.show(Visual::Speaking).await;
    }

    async fn on_audio_output_end(&mut self) {
        self.state.set_speaking(false);
        self.show(Visual::Idle).await;
    }

    async fn farewell(&mut self, dialog: &str, command: &SystemCommand) {
        self.speak_dialog(dialog).await;
        sleep(self.farewell_delay).await;
        info!(%command, "Leaving");
        self.run(command).await;
    }

    /// Applies settings carried by a bus notification, then reconciles.
    async fn on_remote_settings(&mut self, msg: &Message) {
        // Keys look like `<skill id>|<version>`, optionally behind a device prefix
        let ours = msg.data.iter().find_map(|(key, settings)| {
            key.split('|')
                .any(|segment| segment == self.skill_id)
                .then_some(settings)
        });
        if let Some(remote) = ours {
            match SkillSettings::from_value(remote.clone()) {
                Ok(remote) => self.store_remote_settings(&remote).await,
                Err(e) => warn!(error = %e, "Ignoring malformed remote settings"),
            }
        }
        self.on_settings_changed().await;
    }

    async fn store_remote_settings(&self, remote: &SkillSettings) {
        let mut stored = match self.settings.load_written().await {
            Ok(stored) => stored,
            Err(e @ SettingsError::Empty { .. }) => {
                warn!(error = %e, "Settings file is being written, not storing remote settings");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Settings store unreadable, starting from remote values");
                SkillSettings::default()
            }
        };
        for service in Service::ALL {
            if let Some(enabled) = match service {
                Service::Ssh => remote.sshd,
                Service::AirPlay => remote.airplay,
            } {
                stored.set_flag(service, enabled);
            }
        }
        if let Err(e) = self.settings.save(&stored).await {
            warn!(error = %e, "Failed to store remote settings");
        }
    }

    /// Compares the stored flags with the in-memory ones and applies every difference.
    pub async fn on_settings_changed(&mut self) {
        info!("Enclosure settings changed");
        let stored = match self.settings.load_written().await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Failed to read settings, keeping current state");
                return;
            }
        };
        for service in Service::ALL {
            let wanted = stored.flag(service);
            if wanted == self.state.is_enabled(service) {
                debug!(%service, "Setting not changed");
                continue;
            }
            info!(%service, enabled = wanted, "Setting changed");
            self.set_service(service, wanted).await;
        }
    }

    async fn on_intent(&mut self, binding: IntentBinding) {
        let handler = format!("{}.{}", self.skill_name, binding.handler_name);
        self.emit(Message::new(
            Topic::HandlerStart.as_str(),
            json!({ "handler": handler }),
        ));
        match binding.handler {
            IntentHandler::Toggle { service, enable } => {
                if self.state.is_enabled(service) == enable {
                    self.speak_dialog(&binding.already_dialog()).await;
                } else {
                    self.set_service(service, enable).await;
                    self.speak_dialog(&binding.done_dialog()).await;
                }
            }
        }
        self.emit(Message::new(
            Topic::HandlerComplete.as_str(),
            json!({ "handler": handler }),
        ));
    }

    /// Enables `service`.
    pub async fn enable(&mut self, service: Service) {
        self.set_service(service, true).await;
    }

    /// Disables `service`.
    pub async fn disable(&mut self, service: Service) {
        self.set_service(service, false).await;
    }

    async fn set_service(&mut self, service: Service, enabled: bool) {
        info!(%service, enabled, "Switching service");
        for command in self.services.commands(service, enabled) {
            self.run(&command).await;
        }
        self.state.set_enabled(service, enabled);
        if let Err(e) = self.settings.persist_flag(service, enabled).await {
            warn!(error = %e, %service, "Failed to persist service flag");
        }
    }

    async fn show(&self, visual: Visual) {
        match self.display.command(visual) {
            Some(command) => self.run(&command).await,
            None => trace!(?visual, "No viewer configured"),
        }
    }

    async fn run(&self, command: &SystemCommand) {
        if let Err(e) = self.runner.run(command).await {
            warn!(error = %e, "System command failed");
        }
    }

    async fn speak_dialog(&self, key: &str) {
        let utterance = self.dialogs.render(key).await;
        self.speak(&utterance, json!({ "dialog": key, "skill": self.skill_id }));
    }

    fn speak(&self, utterance: &str, meta: Value) {
        debug!(utterance, "Speaking");
        self.emit(Message::speak(utterance, meta).with_context("skill_id", self.skill_id.as_str()));
    }

    fn emit(&self, msg: Message) {
        if self.outbox.send(msg).is_err() {
            debug!("Bus writer gone, message dropped");
        }
    }
}
