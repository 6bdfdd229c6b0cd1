//! Notifier implementations for the session cycle.

use std::cell::RefCell;
use std::io::Write;

use tracing::{info, warn};

use crate::storage::NotificationsConfig;
use crate::timer::{Notifier, SoundKind};

/// Emits notifications as tracing events only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) {
        info!(%title, %body, "notification");
    }

    fn play_sound(&self, kind: SoundKind) {
        info!(?kind, "sound");
    }
}

/// Writes notifications to a terminal and rings the bell for sounds.
pub struct TerminalNotifier<W: Write = std::io::Stderr> {
    enabled: bool,
    sound_enabled: bool,
    out: RefCell<W>,
}

impl TerminalNotifier {
    pub fn stderr(config: &NotificationsConfig) -> Self {
        Self::with_writer(config, std::io::stderr())
    }
}

impl<W: Write> TerminalNotifier<W> {
    pub fn with_writer(config: &NotificationsConfig, out: W) -> Self {
        Self {
            enabled: config.enabled,
            sound_enabled: config.sound_enabled,
            out: RefCell::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn write(&self, text: &str) {
        let mut out = self.out.borrow_mut();
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
            warn!(error = %e, "failed to write notification");
        }
    }
}

impl<W: Write> Notifier for TerminalNotifier<W> {
    fn notify(&self, title: &str, body: &str) {
        if self.enabled {
            self.write(&format!("{title}: {body}\n"));
        }
    }

    fn play_sound(&self, kind: SoundKind) {
        if self.sound_enabled {
            // Finishing rings twice so it stands apart from a start.
            let bells = match kind {
                SoundKind::Start => "\x07",
                SoundKind::Finish => "\x07\x07",
            };
            self.write(bells);
        }
    }
}
