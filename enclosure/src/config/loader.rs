//! Configuration loading utilities for the enclosure daemon.
//!
//! This module provides functions for reading and parsing
//! configuration files from disk.

use std::path::Path;

use eyre::WrapErr as _;
use tokio::fs;

use crate::config::EnclosureConfig;

/// Reads and parses the daemon config from a TOML file, resolving its paths.
///
/// # Arguments
///
/// * `path` - File path to the TOML configuration file.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed.
pub async fn load<P: AsRef<Path>>(path: P) -> eyre::Result<EnclosureConfig> {
    let path_ref = path.as_ref();
    let content = fs::read_to_string(path_ref).await.wrap_err(format!(
        "Failed to read config file at: {}",
        path_ref.display()
    ))?;
    let config: EnclosureConfig = toml::from_str(&content).wrap_err(format!(
        "Failed to parse config as TOML at: {}",
        path_ref.display()
    ))?;
    Ok(config.resolve_paths(path_ref))
}

#[cfg(test)]
mod tests {
    use std::{env, fs as std_fs, path::PathBuf};

    use super::*;
    use crate::config::PairingConfig;

    #[tokio::test]
    async fn load_enclosure_config_file() {
        let toml_str = r#"
            [bus]
            url = "ws://10.0.0.2:8181/core"

            [skill]
            install_dir = "skill"

            [display]
            viewer = ["fbi", "-T", "1"]

            [system]
            privilege = []
            farewell_delay_secs = 2

            [services]
            airplay_unit = "airplay-receiver"

            [pairing]
            mode = "always"
        "#;
        let tmp = env::temp_dir().join("enclosure_test_config.toml");
        std_fs::write(&tmp, toml_str).unwrap();
        let cfg = load(&tmp).await.unwrap();
        assert_eq!(cfg.bus.url, "ws://10.0.0.2:8181/core");
        assert_eq!(cfg.bus.reconnect_delay_secs, 5);
        assert_eq!(cfg.skill.install_dir, env::temp_dir().join("skill").to_string_lossy());
        assert_eq!(cfg.skill.id, "mycroftos-enclosure-skill");
        assert_eq!(cfg.display.viewer, ["fbi", "-T", "1"]);
        assert!(cfg.system.privilege.is_empty(), "privilege prefix was emptied");
        assert_eq!(cfg.system.farewell_delay_secs, 2);
        assert_eq!(cfg.system.shutdown_command, "sudo halt");
        assert_eq!(cfg.services.airplay_unit, "airplay-receiver");
        assert!(!cfg.services.manage_ssh, "manage_ssh defaults to off");
        assert_eq!(cfg.pairing, PairingConfig::Always);
    }

    #[tokio::test]
    async fn empty_config_uses_defaults() {
        let tmp = env::temp_dir().join("enclosure_test_empty_config.toml");
        std_fs::write(&tmp, "").unwrap();
        let cfg = load(&tmp).await.unwrap();
        assert_eq!(cfg, EnclosureConfig::default().resolve_paths(&tmp));
        assert_eq!(cfg.display.viewer, ["fbv", "-f", "-d", "1"]);
        assert_eq!(cfg.system.reboot_command, "sudo reboot");
    }

    #[tokio::test]
    async fn load_enclosure_config_missing_file() {
        let tmp = env::temp_dir().join("enclosure_does_not_exist.toml");
        let res = load(&tmp).await;
        assert!(res.is_err(), "Expected error for missing file");
    }

    #[tokio::test]
    async fn load_enclosure_config_invalid_toml() {
        let tmp = env::temp_dir().join("enclosure_invalid.toml");
        std_fs::write(&tmp, "not valid toml").unwrap();
        let res = load(&tmp).await;
        assert!(res.is_err(), "Expected error for invalid TOML");
    }

    #[tokio::test]
    async fn unknown_pairing_mode_is_rejected() {
        let tmp = env::temp_dir().join("enclosure_bad_pairing.toml");
        std_fs::write(&tmp, "[pairing]\nmode = \"sometimes\"\n").unwrap();
        let res = load(&tmp).await;
        assert!(res.is_err(), "Expected error for unknown pairing mode");
    }

    #[tokio::test]
    async fn load_example_config() {
        let temp_file = env::temp_dir().join("enclosure_test_example_config.toml");
        std_fs::copy("../docs/examples/example_config.toml", &temp_file).unwrap();
        let cfg = load(&temp_file)
            .await
            .expect("Failed to load example_config.toml");
        assert_eq!(cfg.bus.url, "ws://127.0.0.1:8181/core");
        assert_eq!(
            cfg.settings_file(),
            PathBuf::from("/opt/mycroft/skills/mycroftos-enclosure-skill/settings.json")
        );
        assert_eq!(cfg.services.airplay_unit, "shairport-sync");
        assert!(
            matches!(cfg.pairing, PairingConfig::Identity { .. }),
            "example uses identity pairing"
        );
    }
}
