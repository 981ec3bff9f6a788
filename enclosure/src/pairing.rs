//! Pairing check for the device-ready greeting.

use serde::Deserialize;
use tokio::fs;
use tracing::debug;

use crate::config::PairingConfig;

#[derive(Debug, Deserialize)]
struct Identity {
    #[serde(default)]
    uuid: String,
}

/// Returns `true` when the device counts as paired with its backend.
pub async fn is_paired(config: &PairingConfig) -> bool {
    match *config {
        PairingConfig::Always => true,
        PairingConfig::Never => false,
        PairingConfig::Identity { ref identity_file } => {
            let content = match fs::read_to_string(identity_file).await {
                Ok(content) => content,
                Err(e) => {
                    debug!(%identity_file, %e, "No identity, device is not paired");
                    return false;
                }
            };
            match serde_json::from_str::<Identity>(&content) {
                Ok(identity) => !identity.uuid.trim().is_empty(),
                Err(e) => {
                    debug!(%identity_file, %e, "Unreadable identity, device is not paired");
                    false
                }
            }
        }
    }
}
