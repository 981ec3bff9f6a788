//! Settings file watching.
//!
//! The host rewrites `settings.json` when settings change on its side; every such write
//! becomes one notification on an unbounded channel, consumed by the dispatch loop.

use std::{
    ffi::{OsStr, OsString},
    fs,
    path::Path,
};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error};

/// Watches the directory of the settings file and signals `tx` whenever the file is
/// created or modified.
///
/// The directory is watched instead of the file itself so atomic renames are seen. The
/// returned watcher must be kept alive for as long as notifications are wanted.
///
/// # Errors
///
/// Returns an error if the file has no parent directory or the watcher cannot be set up.
pub fn watch_settings_file(
    path: &Path,
    tx: UnboundedSender<()>,
) -> notify::Result<RecommendedWatcher> {
    let dir = path
        .parent()
        .ok_or_else(|| notify::Error::path_not_found().add_path(path.to_path_buf()))?;
    fs::create_dir_all(dir).map_err(notify::Error::io)?;

    let target = path.to_path_buf();
    let file_name = path.file_name().map(OsString::from);

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
                    && event
                        .paths
                        .iter()
                        .any(|p| is_settings_path(p, &target, file_name.as_deref()))
                {
                    debug!(kind = ?event.kind, "Settings file changed");
                    if tx.send(()).is_err() {
                        debug!("Settings listener gone, dropping notification");
                    }
                }
            }
            Err(e) => error!(?e, "Settings watcher error"),
        },
        notify::Config::default(),
    )?;

    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

fn is_settings_path(event_path: &Path, target: &Path, file_name: Option<&OsStr>) -> bool {
    if event_path == target {
        return true;
    }
    // Fallback to filename match (handles path format differences from the backend)
    event_path.file_name().is_some_and(|n| Some(n) == file_name)
}

#[cfg(test)]
mod tests {
    use core::time::Duration;
    use std::{env, process};

    use tokio::{sync::mpsc, time::timeout};

    use super::*;

    #[tokio::test]
    async fn write_triggers_notification() {
        let dir = env::temp_dir().join(format!("enclosure_watch_{}", process::id()));
        drop(fs::remove_dir_all(&dir));
        let path = dir.join("settings.json");
        let (tx, mut rx) = mpsc::unbounded_channel();

        let _watcher = watch_settings_file(&path, tx).unwrap();
        fs::write(&path, r#"{"airplay": true}"#).unwrap();

        let got = timeout(Duration::from_secs(5), rx.recv()).await;
        assert!(matches!(got, Ok(Some(()))), "expected a change notification");
    }

    #[tokio::test]
    async fn unrelated_files_are_ignored() {
        let dir = env::temp_dir().join(format!("enclosure_watch_other_{}", process::id()));
        drop(fs::remove_dir_all(&dir));
        let path = dir.join("settings.json");
        let (tx, mut rx) = mpsc::unbounded_channel();

        let _watcher = watch_settings_file(&path, tx).unwrap();
        fs::write(dir.join("unrelated.txt"), "x").unwrap();

        let got = timeout(Duration::from_millis(500), rx.recv()).await;
        assert!(got.is_err(), "no notification expected, got {got:?}");
    }
}
