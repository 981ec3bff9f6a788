//! English dialog and intent files compiled into the binary.
//!
//! They back the dialog renderer when the install directory lacks a file, and `install`
//! writes them into `<install_dir>/locale/en-us/`.

macro_rules! builtin_files {
    ($($name:literal),* $(,)?) => {
        &[$(($name, include_str!(concat!("../locale/en-us/", $name))),)*]
    };
}

/// `(file name, contents)` of every bundled locale file.
pub const BUILTIN_LOCALE: &[(&str, &str)] = builtin_files![
    "finished.booting.dialog",
    "farewell.shutdown.dialog",
    "farewell.reboot.dialog",
    "EnabledSSH.dialog",
    "AlreadyEnabledSSH.dialog",
    "DisabledSSH.dialog",
    "AlreadyDisabledSSH.dialog",
    "EnabledAirPlay.dialog",
    "AlreadyEnabledAirPlay.dialog",
    "DisabledAirPlay.dialog",
    "AlreadyDisabledAirPlay.dialog",
    "EnableSSH.intent",
    "DisableSSH.intent",
    "EnableAirPlay.intent",
    "DisableAirPlay.intent",
];

/// Contents of the bundled file named `file_name`.
#[must_use]
pub fn builtin(file_name: &str) -> Option<&'static str> {
    BUILTIN_LOCALE
        .iter()
        .find(|&&(name, _)| name == file_name)
        .map(|&(_, content)| content)
}
