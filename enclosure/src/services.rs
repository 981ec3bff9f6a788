//! Enable/disable actions for the services the device exposes.

use core::fmt;

use enclosure_common::SystemCommand;

use crate::config::{ServicesConfig, SystemConfig};

/// A service toggled by voice or by the settings page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Ssh,
    AirPlay,
}

impl Service {
    pub const ALL: [Self; 2] = [Self::Ssh, Self::AirPlay];

    /// Key of the flag in the settings store.
    #[must_use]
    pub const fn settings_key(self) -> &'static str {
        match self {
            Self::Ssh => "sshd",
            Self::AirPlay => "airplay",
        }
    }

    /// Name used in dialog keys (`EnabledSSH`, `AlreadyDisabledAirPlay`, ...).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ssh => "SSH",
            Self::AirPlay => "AirPlay",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Builds the `systemctl` invocations behind each action.
#[derive(Debug, Clone)]
pub struct ServiceControl {
    privilege: Vec<String>,
    airplay_unit: String,
    ssh_unit: Option<String>,
}

impl ServiceControl {
    #[must_use]
    pub fn new(services: &ServicesConfig, system: &SystemConfig) -> Self {
        Self {
            privilege: system.privilege.clone(),
            airplay_unit: services.airplay_unit.clone(),
            ssh_unit: services.manage_ssh.then(|| services.ssh_unit.clone()),
        }
    }

    /// Commands that bring `service` into the requested state, in execution order.
    ///
    /// SSH yields no commands unless `services.manage_ssh` is set.
    #[must_use]
    pub fn commands(&self, service: Service, enable: bool) -> Vec<SystemCommand> {
        let unit = match service {
            Service::AirPlay => &self.airplay_unit,
            Service::Ssh => match self.ssh_unit {
                Some(ref unit) => unit,
                None => return Vec::new(),
            },
        };
        let verbs = if enable {
            ["enable", "start"]
        } else {
            ["disable", "stop"]
        };
        verbs
            .into_iter()
            .map(|verb| {
                SystemCommand::privileged(&self.privilege, "systemctl")
                    .arg(verb)
                    .arg(unit)
            })
            .collect()
    }
}
