//! Desktop popups for queue events.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

use vigia_logging::{vigia_debug, vigia_warn};

/// Window geometry hint for backends that open real windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupSize {
    pub width: u32,
    pub height: u32,
}

/// What the popup announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupKind {
    NewDocuments { count: u32 },
    PageUnavailable,
}

impl PopupKind {
    /// Popup title, shared by both kinds.
    pub fn title(&self) -> &'static str {
        "Fila de documentos"
    }

    /// User-facing message body.
    pub fn message(&self) -> String {
        match self {
            PopupKind::NewDocuments { count } => {
                let plural = if *count > 1 { "s" } else { "" };
                format!("Novo documento na caixa de entrada ({count} documento{plural}).")
            }
            PopupKind::PageUnavailable => "P\u{e1}gina indispon\u{ed}vel".to_string(),
        }
    }

    pub fn size(&self) -> PopupSize {
        match self {
            PopupKind::NewDocuments { .. } => PopupSize {
                width: 500,
                height: 260,
            },
            PopupKind::PageUnavailable => PopupSize {
                width: 420,
                height: 240,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("no popup backend on this platform")]
    NoBackend,
    #[error("popup command failed: {0}")]
    Command(String),
}

/// Raises popups for queue events. Implementations decide how a "popup"
/// materialises on the host system.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn open_popup(&self, kind: PopupKind) -> Result<(), NotifyError>;
}

/// System notification command used by [`DesktopNotifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupBackend {
    /// `notify-send`, the freedesktop notification sender.
    NotifySend,
    /// `osascript` with `display notification`.
    OsaScript,
    Unsupported,
}

pub fn detect_backend() -> PopupBackend {
    if cfg!(target_os = "macos") {
        PopupBackend::OsaScript
    } else if cfg!(target_os = "linux") {
        PopupBackend::NotifySend
    } else {
        PopupBackend::Unsupported
    }
}

/// Default notifier: spawns the platform notification command, and for
/// new-document popups optionally plays an alarm sound.
pub struct DesktopNotifier {
    backend: PopupBackend,
    sound_enabled: bool,
    alarm_file: Option<PathBuf>,
}

impl DesktopNotifier {
    pub fn new(sound_enabled: bool, alarm_file: Option<PathBuf>) -> Self {
        Self {
            backend: detect_backend(),
            sound_enabled,
            alarm_file,
        }
    }

    #[cfg(test)]
    fn with_backend(backend: PopupBackend, sound_enabled: bool) -> Self {
        Self {
            backend,
            sound_enabled,
            alarm_file: None,
        }
    }

    async fn play_alarm(&self) {
        let Some(file) = &self.alarm_file else {
            vigia_debug!("Sound enabled but no alarm file configured");
            return;
        };
        let player = if cfg!(target_os = "macos") {
            "afplay"
        } else {
            "paplay"
        };
        // Alarm playback is best effort; popups matter, the sound does not.
        match Command::new(player).arg(file).output().await {
            Ok(output) if output.status.success() => {}
            Ok(output) => {
                vigia_warn!("Alarm player exited with {}", output.status);
            }
            Err(err) => {
                vigia_warn!("Could not play alarm via {}: {}", player, err);
            }
        }
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn open_popup(&self, kind: PopupKind) -> Result<(), NotifyError> {
        let title = kind.title();
        let message = kind.message();

        let result = match self.backend {
            PopupBackend::NotifySend => {
                run_popup_command(
                    Command::new("notify-send")
                        .arg("--app-name=vigia")
                        .arg("--urgency=normal")
                        .arg(title)
                        .arg(&message),
                )
                .await
            }
            PopupBackend::OsaScript => {
                run_popup_command(
                    Command::new("osascript")
                        .arg("-e")
                        .arg(osascript_source(title, &message)),
                )
                .await
            }
            PopupBackend::Unsupported => Err(NotifyError::NoBackend),
        };

        if result.is_ok() && self.sound_enabled && matches!(kind, PopupKind::NewDocuments { .. }) {
            self.play_alarm().await;
        }
        result
    }
}

async fn run_popup_command(command: &mut Command) -> Result<(), NotifyError> {
    let output = command
        .output()
        .await
        .map_err(|err| NotifyError::Command(err.to_string()))?;
    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(NotifyError::Command(format!(
            "{} ({})",
            output.status,
            stderr.trim()
        )))
    }
}

/// AppleScript for one notification, with quoting safe for arbitrary text.
fn osascript_source(title: &str, message: &str) -> String {
    format!(
        "display notification \"{}\" with title \"{}\"",
        applescript_escape(message),
        applescript_escape(title)
    )
}

fn applescript_escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_matches_queue_wording() {
        assert_eq!(
            PopupKind::NewDocuments { count: 1 }.message(),
            "Novo documento na caixa de entrada (1 documento)."
        );
        assert_eq!(
            PopupKind::NewDocuments { count: 4 }.message(),
            "Novo documento na caixa de entrada (4 documentos)."
        );
        assert_eq!(
            PopupKind::PageUnavailable.message(),
            "P\u{e1}gina indispon\u{ed}vel"
        );
    }

    #[test]
    fn popup_sizes_differ_by_kind() {
        assert_eq!(
            PopupKind::NewDocuments { count: 2 }.size(),
            PopupSize {
                width: 500,
                height: 260
            }
        );
        assert_eq!(
            PopupKind::PageUnavailable.size(),
            PopupSize {
                width: 420,
                height: 240
            }
        );
    }

    #[test]
    fn applescript_quoting_is_escaped() {
        let source = osascript_source("Fila \"x\"", "doc \\ y");
        assert_eq!(
            source,
            "display notification \"doc \\\\ y\" with title \"Fila \\\"x\\\"\""
        );
    }

    #[tokio::test]
    async fn unsupported_backend_reports_no_backend() {
        let notifier = DesktopNotifier::with_backend(PopupBackend::Unsupported, true);
        let err = notifier
            .open_popup(PopupKind::NewDocuments { count: 1 })
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::NoBackend));
    }
}
