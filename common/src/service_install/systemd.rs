use std::{
    env,
    fs::{self, File},
    io::Write as _,
    path::PathBuf,
    process::{Command, Stdio},
};

use super::{IoContext as _, ServiceInstallError, is_superuser};

/// Copies the running binary to `/usr/sbin/<name>` and writes `<name>.service`.
///
/// `{binary}` in `unit_content` is replaced by the installed binary path.
pub fn install_self_as_service(name: &str, unit_content: &str) -> Result<(), ServiceInstallError> {
    if !is_superuser() {
        return Err(ServiceInstallError::NotSuperuser);
    }

    let binary_path = env::current_exe().io_context(|| "Failed to locate own binary".to_owned())?;
    let target_bin = PathBuf::from("/usr/sbin/").join(name);
    let service_name = format!("{name}.service");

    // Stop a potentially running instance before overwriting its binary
    drop(
        Command::new("systemctl")
            .arg("stop")
            .arg(&service_name)
            .stderr(Stdio::null())
            .status(),
    );

    fs::copy(&binary_path, &target_bin)
        .io_context(|| format!("Failed to copy binary to {}", target_bin.display()))?;
    println!("Installed binary to {target_bin:?}");

    let service_file_path = format!("/etc/systemd/system/{service_name}");
    let service_file_content = unit_content.replace("{binary}", &target_bin.to_string_lossy());

    let mut service_file = File::create(&service_file_path)
        .io_context(|| format!("Failed to create {service_file_path}"))?;
    service_file
        .write_all(service_file_content.as_bytes())
        .io_context(|| format!("Failed to write {service_file_path}"))?;
    println!("Created systemd service file at {service_file_path}");

    drop(service_file);

    systemctl(&["daemon-reload"])
}

/// Reloads unit files, then enables and starts `<name>.service`.
pub fn start_and_enable_self_as_service(name: &str) -> Result<(), ServiceInstallError> {
    let service_name = format!("{name}.service");

    systemctl(&["daemon-reload"])?;
    systemctl(&["enable", &service_name])?;
    systemctl(&["start", &service_name])?;

    println!("Service {service_name} started and enabled.");
    Ok(())
}

fn systemctl(args: &[&str]) -> Result<(), ServiceInstallError> {
    let output = Command::new("systemctl")
        .args(args)
        .output()
        .io_context(|| format!("Failed to run systemctl {}", args.join(" ")))?;
    if output.status.success() {
        Ok(())
    } else {
        Err(ServiceInstallError::Systemctl {
            args: args.join(" "),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        })
    }
}
