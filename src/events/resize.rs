// src/events/resize.rs

use std::os::unix::io::RawFd;

use log::{debug, warn};
use signal_hook::consts::SIGWINCH;
use signal_hook::iterator::Signals;

use super::bus::EventBus;
use crate::error::Error;
use crate::input::InputEvent;
use crate::terminal::terminal_size;

/// Watches SIGWINCH and pushes `Resize` with the geometry of `fd` on each
/// delivery. Signals arriving in a burst may be coalesced into one event.
///
/// The handler is registered before this returns, so a resize signalled right
/// after the call is not missed.
pub fn spawn_resize_watcher(bus: &mut EventBus, fd: RawFd) -> anyhow::Result<()> {
    let mut signals =
        Signals::new([SIGWINCH]).map_err(|e| Error::device("registering SIGWINCH", e))?;
    let handle = signals.handle();

    bus.spawn_producer_with_stop(
        "resize-watcher",
        move |tx| {
            for _ in signals.forever() {
                let (cols, rows) = match terminal_size(fd) {
                    Ok(size) => size,
                    Err(e) => {
                        warn!("ResizeWatcher: {}", e);
                        continue;
                    }
                };
                debug!("ResizeWatcher: terminal is now {}x{}.", cols, rows);
                if tx.send(InputEvent::Resize { cols, rows }).is_err() {
                    break;
                }
            }
            Ok(())
        },
        move || handle.close(),
    )
}
