//! Cancels a running job when the user presses `q` or Ctrl-C.

use std::io::IsTerminal;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use lanprobe_core::scheduler::JobCanceller;
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct KeyWatcher {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl KeyWatcher {
    /// Watches the keyboard on a background thread until dropped. Does
    /// nothing when stdin is not a terminal.
    pub fn spawn(canceller: JobCanceller) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        if !std::io::stdin().is_terminal() {
            return Self { stop, handle: None };
        }

        let stop_flag = stop.clone();
        let handle = thread::spawn(move || {
            if let Err(e) = enable_raw_mode() {
                debug!("Key cancellation unavailable: {e}");
                return;
            }
            while !stop_flag.load(Ordering::Relaxed) && !canceller.is_cancelled() {
                match event::poll(POLL_INTERVAL) {
                    Ok(true) => {
                        if let Ok(Event::Key(key)) = event::read()
                            && is_interrupt(&key)
                        {
                            canceller.cancel();
                            break;
                        }
                    }
                    Ok(false) => {}
                    Err(_) => break,
                }
            }
            let _ = disable_raw_mode();
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }
}

impl Drop for KeyWatcher {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        let _ = disable_raw_mode();
    }
}

fn is_interrupt(key: &KeyEvent) -> bool {
    let is_q = key.code == KeyCode::Char('q');
    let is_ctrl_c = key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
    (is_q || is_ctrl_c) && key.kind == KeyEventKind::Press
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
