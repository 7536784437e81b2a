use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use crate::error::PlaybackError;
use crate::playback::CancelToken;

/// Whether a key press should stop playback: Esc, q, or Ctrl-C.
pub fn is_cancel_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Watches the terminal for a cancel key and fires a [`CancelToken`].
///
/// Raw mode is on while the watcher lives (so Ctrl-C arrives as a key
/// instead of killing the process mid-tone) and is restored on drop.
pub struct KeyWatcher {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl KeyWatcher {
    pub fn spawn(cancel: CancelToken) -> Result<Self, PlaybackError> {
        terminal::enable_raw_mode()?;

        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let handle = thread::spawn(move || watch(&cancel, &stop_flag));

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }
}

impl Drop for KeyWatcher {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        let _ = terminal::disable_raw_mode();
    }
}

fn watch(cancel: &CancelToken, stop: &AtomicBool) {
    while !stop.load(Ordering::Relaxed) && !cancel.is_cancelled() {
        match event::poll(Duration::from_millis(50)) {
            Ok(false) => continue,
            Ok(true) => {}
            Err(e) => {
                tracing::warn!("event poll error: {}", e);
                return;
            }
        }

        match event::read() {
            Ok(Event::Key(key)) if is_cancel_key(&key) => {
                tracing::debug!(?key.code, "cancel key pressed");
                cancel.cancel();
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("event read error: {}", e);
                return;
            }
        }
    }
}
