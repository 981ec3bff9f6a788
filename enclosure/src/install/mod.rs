//! Installer: sets the daemon up as a systemd service running as the assistant's user.
//!
//! Writes the config file and the bundled locale files when they are missing, then
//! installs, enables and starts the unit.

use std::{
    fs::{self, File},
    io::Write as _,
    os::unix::fs::{self as unix_fs, PermissionsExt as _},
    path::{Path, PathBuf},
};

use clap::Parser;
use enclosure_common::{is_systemd, systemd};
use eyre::WrapErr as _;
use nix::unistd::User;

use crate::{config::EnclosureConfig, locale::BUILTIN_LOCALE};

const SERVICE_FILE_TEMPLATE: &str = include_str!("enclosure.service.tmpl.ini");
const EXAMPLE_CONFIG: &str = include_str!("../../../docs/examples/example_config.toml");

const BINARY_NAME: &str = "enclosure";

/// Arguments for the `install` subcommand.
#[derive(Debug, Parser)]
pub struct Args {
    /// User the service runs as, and owner of the generated files.
    #[arg(env = "SUDO_USER")]
    user: String,

    /// Where to write the config file; defaults to `/home/<user>/.config/enclosure/config.toml`.
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Installs the daemon as a systemd service and creates its config file.
///
/// # Errors
///
/// Returns `Err` if the host does not run systemd, or if any filesystem or service
/// management step fails.
pub fn setup(args: Args) -> eyre::Result<()> {
    if !is_systemd() {
        eyre::bail!("Unsupported init system: expected systemd.");
    }

    let user = args.user;
    let user_info = User::from_name(&user)
        .wrap_err("Failed to get user info")?
        .ok_or_else(|| eyre::eyre!("User {user} not found"))?;
    let owner: Owner = (Some(user_info.uid.as_raw()), Some(user_info.gid.as_raw()));

    let config_location = args
        .config
        .unwrap_or_else(|| PathBuf::from(format!("/home/{user}/.config/{BINARY_NAME}/config.toml")));

    if config_location.exists() {
        println!("Config file already exists at {config_location:?}, not overwriting.");
    } else {
        if let Some(parent_dir) = config_location.parent()
            && !parent_dir.exists()
        {
            fs::create_dir_all(parent_dir).wrap_err("Failed to create config directory")?;
            unix_fs::chown(parent_dir, owner.0, owner.1)?;
        }
        let mut config_file = File::create(&config_location).wrap_err(format!(
            "Failed to create config file at {}",
            config_location.display()
        ))?;
        config_file
            .write_all(EXAMPLE_CONFIG.as_bytes())
            .wrap_err("Failed to write config file")?;
        fs::set_permissions(&config_location, fs::Permissions::from_mode(0o644))?;
        unix_fs::chown(&config_location, owner.0, owner.1)?;
        println!("Created config file at {config_location:?}");
    }

    let config: EnclosureConfig = toml::from_str(
        &fs::read_to_string(&config_location).wrap_err("Failed to read config file")?,
    )
    .wrap_err("Failed to parse config file")?;
    let config = config.resolve_paths(&config_location);
    let locale_dir = Path::new(&config.skill.install_dir)
        .join("locale")
        .join(&config.skill.lang);
    write_locale_files(&locale_dir, owner)?;

    let unit = SERVICE_FILE_TEMPLATE
        .replace("{ description }", env!("CARGO_PKG_DESCRIPTION"))
        .replace("{ user }", &user)
        .replace("{ config_location }", &config_location.to_string_lossy());
    systemd::install_self_as_service(BINARY_NAME, &unit)?;
    systemd::start_and_enable_self_as_service(BINARY_NAME)?;

    Ok(())
}

/// `(uid, gid)` handed to `chown`.
type Owner = (Option<u32>, Option<u32>);

/// Writes every bundled locale file that `dir` does not have yet.
fn write_locale_files(dir: &Path, owner: Owner) -> eyre::Result<()> {
    fs::create_dir_all(dir).wrap_err(format!("Failed to create {}", dir.display()))?;
    unix_fs::chown(dir, owner.0, owner.1)?;
    let mut written = 0_usize;
    for &(name, content) in BUILTIN_LOCALE {
        let path = dir.join(name);
        if path.exists() {
            continue;
        }
        fs::write(&path, content).wrap_err(format!("Failed to write {}", path.display()))?;
        unix_fs::chown(&path, owner.0, owner.1)?;
        written += 1;
    }
    println!("Wrote {written} locale files to {dir:?}");
    Ok(())
}
