// src/input/mod.rs

//! Terminal input: reading the device and decoding what it sends.

pub mod decoder;
pub mod event;

use std::fs::File;
use std::io::{self, Read};
use std::os::fd::{AsFd, AsRawFd, OwnedFd};

use log::{debug, info};

use crate::events::EventBus;

pub use decoder::{decode, InputDecoder};
pub use event::{InputEvent, MouseButton};

/// Reads a terminal device, returning `Ok(0)` when nothing arrives within the
/// read window.
///
/// Raw mode already bounds reads with VTIME; polling first keeps the window
/// bounded when the device is left in canonical mode too, so the reader thread
/// always notices a closed bus.
pub struct DeviceReader {
    file: File,
    timeout_ms: libc::c_int,
}

impl DeviceReader {
    /// `timeout_ds` is in tenths of a second, like VTIME. Zero is treated as
    /// one.
    pub fn new(fd: OwnedFd, timeout_ds: u8) -> Self {
        DeviceReader {
            file: File::from(fd),
            timeout_ms: libc::c_int::from(timeout_ds.max(1)) * 100,
        }
    }

    /// A reader on a duplicate of standard input.
    pub fn stdin(timeout_ds: u8) -> io::Result<Self> {
        let fd = io::stdin().as_fd().try_clone_to_owned()?;
        Ok(DeviceReader::new(fd, timeout_ds))
    }
}

impl Read for DeviceReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut pollfd = libc::pollfd {
            fd: self.file.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        // SAFETY: `pollfd` is a single valid entry for the duration of the call.
        let ready = unsafe { libc::poll(&mut pollfd, 1, self.timeout_ms) };
        match ready {
            r if r < 0 => Err(io::Error::last_os_error()),
            0 => Ok(0),
            _ => self.file.read(buf),
        }
    }
}

/// Starts the input producer: decodes events from `decoder` until the bus
/// closes or the device fails. A device failure is delivered as
/// `InputEvent::Error` before the producer stops.
pub fn spawn_reader<R>(bus: &mut EventBus, mut decoder: InputDecoder<R>) -> anyhow::Result<()>
where
    R: Read + Send + 'static,
{
    bus.spawn_producer("input-reader", move |tx| {
        while !tx.is_closed() {
            let event = decoder.next_event();
            let failed = matches!(event, InputEvent::Error(_));
            if tx.send(event).is_err() {
                debug!("InputReader: bus closed, stopping.");
                break;
            }
            if failed {
                info!("InputReader: device failed, stopping.");
                break;
            }
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests;
