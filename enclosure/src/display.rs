//! Framebuffer visuals.

use std::path::PathBuf;

use enclosure_common::SystemCommand;

use crate::config::EnclosureConfig;

/// One of the images painted on the framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visual {
    Listening,
    Idle,
    Thinking,
    Speaking,
}

impl Visual {
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Listening => "listen.png",
            Self::Idle => "background.png",
            Self::Thinking => "thinking.png",
            Self::Speaking => "speaking.png",
        }
    }
}

/// Turns visuals into viewer invocations.
#[derive(Debug, Clone)]
pub struct Display {
    viewer: Vec<String>,
    ui_dir: PathBuf,
}

impl Display {
    #[must_use]
    pub fn new(config: &EnclosureConfig) -> Self {
        Self {
            viewer: config.display.viewer.clone(),
            ui_dir: config.ui_dir(),
        }
    }

    /// The command painting `visual`, or `None` when no viewer is configured.
    #[must_use]
    pub fn command(&self, visual: Visual) -> Option<SystemCommand> {
        let image = self.ui_dir.join(visual.file_name());
        SystemCommand::from_argv(&self.viewer).map(|cmd| cmd.arg(image.to_string_lossy()))
    }
}
