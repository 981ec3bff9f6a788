//! Flags the reaction table keeps between events.

use crate::{services::Service, settings::SkillSettings};

/// Enabled state of the toggleable services, mirrored from the settings store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceFlags {
    ssh: bool,
    airplay: bool,
}

impl ServiceFlags {
    #[must_use]
    pub fn from_settings(settings: &SkillSettings) -> Self {
        Self {
            ssh: settings.flag(Service::Ssh),
            airplay: settings.flag(Service::AirPlay),
        }
    }

    #[must_use]
    pub const fn get(self, service: Service) -> bool {
        match service {
            Service::Ssh => self.ssh,
            Service::AirPlay => self.airplay,
        }
    }

    pub const fn set(&mut self, service: Service, enabled: bool) {
        match service {
            Service::Ssh => self.ssh = enabled,
            Service::AirPlay => self.airplay = enabled,
        }
    }
}

/// Device state owned by the reaction table.
///
/// `loading` goes from true to false once, on the device-ready event. `speaking` follows
/// the audio output start/end events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceState {
    loading: bool,
    speaking: bool,
    services: ServiceFlags,
}

impl DeviceState {
    #[must_use]
    pub fn new(settings: &SkillSettings) -> Self {
        Self {
            loading: true,
            speaking: false,
            services: ServiceFlags::from_settings(settings),
        }
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub const fn is_speaking(&self) -> bool {
        self.speaking
    }

    #[must_use]
    pub const fn is_enabled(&self, service: Service) -> bool {
        self.services.get(service)
    }

    /// Clears `loading`; returns whether it was still set.
    pub(crate) const fn finish_loading(&mut self) -> bool {
        let was_loading = self.loading;
        self.loading = false;
        was_loading
    }

    pub(crate) const fn set_speaking(&mut self, speaking: bool) {
        self.speaking = speaking;
    }

    pub(crate) const fn set_enabled(&mut self, service: Service, enabled: bool) {
        self.services.set(service, enabled);
    }
}
