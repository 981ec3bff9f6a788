//! Dialog rendering: dialog keys to spoken phrases.

use std::path::PathBuf;

use rand::seq::IndexedRandom as _;
use tokio::fs;
use tracing::debug;

use crate::locale;

/// Looks up `<key>.dialog` in the configured locale directories, then in the bundled files.
#[derive(Debug, Clone)]
pub struct Dialogs {
    dirs: Vec<PathBuf>,
}

impl Dialogs {
    #[must_use]
    pub const fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Renders `key` into a phrase, picking one template line at random.
    ///
    /// Without any template the key itself is spoken, with `.` and `_` read as spaces.
    #[must_use]
    pub async fn render(&self, key: &str) -> String {
        let templates = self.templates(key).await;
        templates
            .choose(&mut rand::rng())
            .cloned()
            .unwrap_or_else(|| key.replace(['.', '_'], " "))
    }

    async fn templates(&self, key: &str) -> Vec<String> {
        let file_name = format!("{key}.dialog");
        for dir in &self.dirs {
            let path = dir.join(&file_name);
            match fs::read_to_string(&path).await {
                Ok(content) => {
                    let lines = template_lines(&content);
                    if !lines.is_empty() {
                        return lines;
                    }
                }
                Err(e) => debug!(?path, %e, "Dialog file not readable"),
            }
        }
        locale::builtin(&file_name).map_or_else(Vec::new, template_lines)
    }
}

fn template_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_owned)
        .collect()
}
