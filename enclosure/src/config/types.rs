//! Configuration data types and structures for the enclosure daemon.
//!
//! Every key has a default, so an empty file describes a stock MycroftOS device.

use std::{
    env,
    path::{Component, Path, PathBuf},
};

use serde::Deserialize;

/// Connection to the assistant's message bus.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct BusConfig {
    /// Websocket endpoint of the message bus.
    pub url: String,
    /// Seconds to wait before reconnecting after the bus went away.
    pub reconnect_delay_secs: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8181/core".to_owned(),
            reconnect_delay_secs: 5,
        }
    }
}

/// Identity of the skill towards the host.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SkillConfig {
    /// Skill identifier; prefixes the registered intent names.
    pub id: String,
    /// Skill name; prefixes handler identifiers on handler start/complete events.
    pub name: String,
    /// Install directory holding `ui/`, `locale/` and `settings.json`.
    pub install_dir: String,
    /// Language used to look up dialog and intent files.
    pub lang: String,
    /// Settings store; defaults to `<install_dir>/settings.json`.
    pub settings_path: Option<String>,
    /// Further handler identifiers whose start/complete events are ignored.
    pub self_handlers: Vec<String>,
}

impl Default for SkillConfig {
    fn default() -> Self {
        Self {
            id: "mycroftos-enclosure-skill".to_owned(),
            name: "MycroftOS".to_owned(),
            install_dir: "/opt/mycroft/skills/mycroftos-enclosure-skill".to_owned(),
            lang: "en-us".to_owned(),
            settings_path: None,
            self_handlers: Vec::new(),
        }
    }
}

/// Framebuffer viewer invocation.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Viewer argv; the image path is appended.
    pub viewer: Vec<String>,
    /// Directory of the visuals; defaults to `<install_dir>/ui`.
    pub ui_dir: Option<String>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            viewer: ["fbv", "-f", "-d", "1"].map(str::to_owned).to_vec(),
            ui_dir: None,
        }
    }
}

/// Privileged system actions.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SystemConfig {
    /// Privilege-escalation argv put in front of `systemctl`.
    pub privilege: Vec<String>,
    /// Shell command that halts the machine.
    pub shutdown_command: String,
    /// Shell command that reboots the machine.
    pub reboot_command: String,
    /// Seconds between the farewell phrase and halting/rebooting.
    pub farewell_delay_secs: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            privilege: vec!["sudo".to_owned()],
            shutdown_command: "sudo halt".to_owned(),
            reboot_command: "sudo reboot".to_owned(),
            farewell_delay_secs: 5,
        }
    }
}

/// Services toggled by voice or settings.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServicesConfig {
    /// systemd unit of the AirPlay receiver.
    pub airplay_unit: String,
    /// systemd unit of the SSH daemon.
    pub ssh_unit: String,
    /// When false, SSH enable/disable only tracks the setting without touching the unit.
    pub manage_ssh: bool,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            airplay_unit: "shairport-sync".to_owned(),
            ssh_unit: "sshd".to_owned(),
            manage_ssh: false,
        }
    }
}

/// How to decide whether the device is paired with its backend.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum PairingConfig {
    /// Paired when the identity file holds a device uuid.
    Identity {
        #[serde(default = "default_identity_file")]
        identity_file: String,
    },
    Always,
    Never,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self::Identity {
            identity_file: default_identity_file(),
        }
    }
}

fn default_identity_file() -> String {
    "~/.mycroft/identity/identity2.json".to_owned()
}

/// Root config structure of the enclosure daemon.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EnclosureConfig {
    pub bus: BusConfig,
    pub skill: SkillConfig,
    pub display: DisplayConfig,
    pub system: SystemConfig,
    pub services: ServicesConfig,
    pub pairing: PairingConfig,
}

impl EnclosureConfig {
    /// Makes every path absolute, relative paths being taken relative to the config file.
    #[must_use]
    pub fn resolve_paths(mut self, config_path: &Path) -> Self {
        let resolve = |p: &str| {
            resolve_config_relative_paths(config_path, p)
                .to_string_lossy()
                .into_owned()
        };
        self.skill.install_dir = resolve(&self.skill.install_dir);
        self.skill.settings_path = self.skill.settings_path.as_deref().map(&resolve);
        self.display.ui_dir = self.display.ui_dir.as_deref().map(&resolve);
        if let PairingConfig::Identity {
            ref mut identity_file,
        } = self.pairing
        {
            *identity_file = resolve(identity_file);
        }
        self
    }

    /// Location of the settings store.
    #[must_use]
    pub fn settings_file(&self) -> PathBuf {
        self.skill.settings_path.as_ref().map_or_else(
            || Path::new(&self.skill.install_dir).join("settings.json"),
            PathBuf::from,
        )
    }

    /// Directory holding the visuals.
    #[must_use]
    pub fn ui_dir(&self) -> PathBuf {
        self.display.ui_dir.as_ref().map_or_else(
            || Path::new(&self.skill.install_dir).join("ui"),
            PathBuf::from,
        )
    }

    /// Directories searched for `.dialog` and `.intent` files, in order.
    #[must_use]
    pub fn locale_dirs(&self) -> Vec<PathBuf> {
        let base = Path::new(&self.skill.install_dir);
        vec![
            base.join("locale").join(&self.skill.lang),
            base.join("dialog").join(&self.skill.lang),
            base.join("vocab").join(&self.skill.lang),
        ]
    }
}

/// Resolves a path to an absolute one.
///
/// Absolute paths are returned as-is, `~/` is expanded from `$HOME`, and anything else
/// is joined with the config file's parent directory. The result is normalized to
/// remove redundant components like `./`.
pub fn resolve_config_relative_paths(config_path: &Path, relative_path: &str) -> PathBuf {
    let path = Path::new(relative_path);
    let resolved = if path.is_absolute() {
        path.to_path_buf()
    } else if let Some(rest) = relative_path.strip_prefix("~/")
        && let Some(home) = env::var_os("HOME")
    {
        PathBuf::from(home).join(rest)
    } else {
        config_path
            .parent()
            .map_or_else(|| path.to_path_buf(), |d| d.join(path))
    };

    // We can't use canonicalize() because the file might not exist yet
    normalize_path(&resolved)
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        use Component as C;
        match component {
            C::Normal(c) => {
                result.push(c);
            }
            C::ParentDir => {
                result.pop();
            }
            C::CurDir => {}
            C::RootDir | C::Prefix(_) => {
                result.push(component);
            }
        }
    }
    result
}
