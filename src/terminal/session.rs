// src/terminal/session.rs

//! Raw-mode lifecycle for the controlling terminal.
//!
//! `TerminalSession` is a scoped acquisition of the device: entering raw mode
//! saves the original termios attributes and emits the control sequences the
//! editor needs; restoring writes the reverse sequences and puts the saved
//! attributes back. Restoration happens exactly once, whether it is triggered
//! by `restore()`, by `Drop`, or by the panic hook.
//!
//! The panic hook is installed once per process and restores every session
//! registered with it that is still alive.

use std::io::{self, Write};
use std::mem;
use std::os::unix::io::RawFd;
use std::panic;
use std::sync::{Arc, Mutex, Weak};

use log::{debug, error, info, trace, warn};
use once_cell::sync::Lazy;
use termios::{
    tcsetattr, Termios, BRKINT, CS8, CSIZE, ECHO, ECHONL, ICANON, ICRNL, IEXTEN, IGNBRK, IGNCR,
    INLCR, INPCK, ISIG, ISTRIP, IXOFF, IXON, OPOST, PARENB, PARMRK, TCSAFLUSH, VMIN, VTIME,
};

use crate::config::TerminalConfig;
use crate::error::{Error, Result};

// --- ANSI Escape Code Constants ---
const CURSOR_SAVE: &str = "\x1b[s";
const CURSOR_RESTORE: &str = "\x1b[u";
const ALT_SCREEN_ON: &str = "\x1b[?47h";
const ALT_SCREEN_OFF: &str = "\x1b[?47l";
const MOUSE_CLICK_ON: &str = "\x1b[?1000h";
const MOUSE_CLICK_OFF: &str = "\x1b[?1000l";
const MOUSE_DRAG_ON: &str = "\x1b[?1002h";
const MOUSE_DRAG_OFF: &str = "\x1b[?1002l";
const FOCUS_ON: &str = "\x1b[?1004h";
const FOCUS_OFF: &str = "\x1b[?1004l";

/// Geometry reported when the device answers with zero rows or columns.
pub const DEFAULT_COLUMNS: u16 = 80;
pub const DEFAULT_ROWS: u16 = 24;

nix::ioctl_read_bad!(tiocgwinsz, libc::TIOCGWINSZ, libc::winsize);

/// Where the session writes its control sequences.
pub type SessionOutput = Box<dyn Write + Send>;

/// Everything needed to undo a session. Taken out of the `Restorer` by the
/// first restoration, which is what makes restoration happen only once.
struct SavedState {
    fd: RawFd,
    original: Option<Termios>,
    exit_sequence: String,
    out: SessionOutput,
}

struct Restorer {
    state: Mutex<Option<SavedState>>,
}

impl Restorer {
    fn restore(&self) -> Result<()> {
        let saved = match self.state.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(mut saved) = saved else {
            trace!("TerminalSession: already restored.");
            return Ok(());
        };

        // Both halves are attempted even if the first fails.
        let written = saved
            .out
            .write_all(saved.exit_sequence.as_bytes())
            .and_then(|()| saved.out.flush())
            .map_err(|e| Error::device("writing exit sequences", e));

        let reset = match saved.original {
            Some(ref original) => tcsetattr(saved.fd, TCSAFLUSH, original)
                .map_err(|e| Error::device("tcsetattr(restore)", e)),
            None => Ok(()),
        };

        info!("TerminalSession: terminal restored (fd {}).", saved.fd);
        written.and(reset)
    }
}

/// A terminal in raw mode. Dropping the session restores the terminal.
pub struct TerminalSession {
    fd: RawFd,
    restorer: Arc<Restorer>,
}

impl TerminalSession {
    /// Captures the attributes of `fd`, switches it to raw mode and emits the
    /// enter sequences enabled in `config` to `out`.
    ///
    /// Fails with `Error::Device` if the attributes cannot be read or set. If
    /// anything fails after the attributes were captured, the terminal is
    /// restored before the error is returned.
    pub fn enter_raw_mode(
        fd: RawFd,
        out: impl Write + Send + 'static,
        config: &TerminalConfig,
    ) -> Result<Self> {
        let original = if config.raw_mode {
            Some(Termios::from_fd(fd).map_err(|e| Error::device("tcgetattr", e))?)
        } else {
            debug!("TerminalSession: raw mode disabled by configuration.");
            None
        };

        let (enter_sequence, exit_sequence) = control_sequences(config);
        let session = TerminalSession {
            fd,
            restorer: Arc::new(Restorer {
                state: Mutex::new(Some(SavedState {
                    fd,
                    original,
                    exit_sequence,
                    out: Box::new(out),
                })),
            }),
        };

        session
            .write_raw(enter_sequence.as_bytes())
            .map_err(|e| Error::device("writing enter sequences", e))?;

        if let Some(ref original) = original {
            let raw = raw_attributes(original, config.read_timeout_ds);
            tcsetattr(fd, TCSAFLUSH, &raw).map_err(|e| Error::device("tcsetattr(raw)", e))?;
            debug!(
                "TerminalSession: fd {} set to raw mode (VTIME={}).",
                fd, config.read_timeout_ds
            );
        }

        if config.restore_on_panic {
            register_for_panic(&session.restorer);
        }

        info!("TerminalSession: entered on fd {}.", fd);
        Ok(session)
    }

    /// Restores the terminal and ends the session.
    pub fn restore(self) -> Result<()> {
        self.restorer.restore()
        // Drop runs next and finds nothing left to restore.
    }

    pub fn fd(&self) -> RawFd {
        self.fd
    }

    /// Current geometry of the session's device as `(columns, rows)`.
    pub fn size(&self) -> Result<(u16, u16)> {
        terminal_size(self.fd)
    }

    /// Writes bytes to the session output, e.g. for a view drawing on the
    /// terminal. Fails once the session has been restored.
    pub fn write_raw(&self, bytes: &[u8]) -> io::Result<()> {
        let mut guard = match self.restorer.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match guard.as_mut() {
            Some(saved) => {
                saved.out.write_all(bytes)?;
                saved.out.flush()
            }
            None => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "terminal session already restored",
            )),
        }
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if let Err(e) = self.restorer.restore() {
            // Log error, but don't panic in drop.
            error!("TerminalSession: error while restoring in drop: {}", e);
        }
    }
}

/// Queries the geometry of the terminal behind `fd` as `(columns, rows)`.
pub fn terminal_size(fd: RawFd) -> Result<(u16, u16)> {
    // SAFETY: `winsz` is a valid, writable winsize for the duration of the call.
    let winsz = unsafe {
        let mut winsz: libc::winsize = mem::zeroed();
        tiocgwinsz(fd, &mut winsz).map_err(|e| Error::device("ioctl(TIOCGWINSZ)", e))?;
        winsz
    };
    let cols = if winsz.ws_col == 0 {
        DEFAULT_COLUMNS
    } else {
        winsz.ws_col
    };
    let rows = if winsz.ws_row == 0 {
        DEFAULT_ROWS
    } else {
        winsz.ws_row
    };
    Ok((cols, rows))
}

/// Derives the raw-mode attributes from the captured ones.
///
/// Reads return as soon as any byte is available, or with zero bytes after
/// `timeout_ds` deciseconds.
pub fn raw_attributes(original: &Termios, timeout_ds: u8) -> Termios {
    let mut raw = *original;
    raw.c_iflag &= !(IGNBRK | BRKINT | PARMRK | INPCK | ISTRIP | INLCR | IGNCR | ICRNL | IXON | IXOFF);
    raw.c_oflag &= !OPOST;
    raw.c_lflag &= !(ECHO | ECHONL | ICANON | ISIG | IEXTEN);
    raw.c_cflag &= !(CSIZE | PARENB);
    raw.c_cflag |= CS8;
    raw.c_cc[VMIN] = 0;
    raw.c_cc[VTIME] = timeout_ds;
    raw
}

/// Builds the enter and exit sequences. The exit sequence undoes the enter
/// sequence in reverse order.
fn control_sequences(config: &TerminalConfig) -> (String, String) {
    let mut enter = String::new();
    let mut exit = String::new();

    if config.alternate_screen {
        enter.push_str(CURSOR_SAVE);
        enter.push_str(ALT_SCREEN_ON);
    }
    if config.mouse_reporting {
        enter.push_str(MOUSE_CLICK_ON);
        enter.push_str(MOUSE_DRAG_ON);
    }
    if config.focus_reporting {
        enter.push_str(FOCUS_ON);
        exit.push_str(FOCUS_OFF);
    }
    if config.mouse_reporting {
        exit.push_str(MOUSE_DRAG_OFF);
        exit.push_str(MOUSE_CLICK_OFF);
    }
    if config.alternate_screen {
        exit.push_str(ALT_SCREEN_OFF);
        exit.push_str(CURSOR_RESTORE);
    }
    (enter, exit)
}

/// Sessions the panic hook restores. The first access installs the hook.
static PANIC_RESTORERS: Lazy<Mutex<Vec<Weak<Restorer>>>> = Lazy::new(|| {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_after_panic();
        previous(panic_info);
    }));
    debug!("TerminalSession: panic hook installed.");
    Mutex::new(Vec::new())
});

fn register_for_panic(restorer: &Arc<Restorer>) {
    let mut restorers = match PANIC_RESTORERS.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    register(&mut restorers, restorer);
    trace!(
        "TerminalSession: {} sessions registered for panic restore.",
        restorers.len()
    );
}

/// Adds `restorer`, dropping entries whose session is gone.
fn register(restorers: &mut Vec<Weak<Restorer>>, restorer: &Arc<Restorer>) {
    restorers.retain(|weak| weak.strong_count() > 0);
    restorers.push(Arc::downgrade(restorer));
}

fn restore_after_panic() {
    let live: Vec<Arc<Restorer>> = {
        let mut restorers = match PANIC_RESTORERS.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        restorers.drain(..).filter_map(|weak| weak.upgrade()).collect()
    };
    for restorer in live {
        if let Err(e) = restorer.restore() {
            warn!("TerminalSession: restore from panic hook failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restored() -> Arc<Restorer> {
        Arc::new(Restorer {
            state: Mutex::new(None),
        })
    }

    #[test]
    fn registration_prunes_ended_sessions() {
        let mut restorers = Vec::new();
        let kept = restored();
        register(&mut restorers, &kept);
        for _ in 0..3 {
            register(&mut restorers, &restored());
        }

        assert_eq!(restorers.len(), 2);
        register(&mut restorers, &kept);
        assert_eq!(restorers.len(), 2);
        assert!(restorers.iter().all(|weak| weak.strong_count() == 1));
    }
}
