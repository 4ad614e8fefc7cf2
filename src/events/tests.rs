// src/events/tests.rs

use std::io::Write;
use std::os::fd::AsRawFd;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use nix::pty::{openpty, Winsize};
use signal_hook::consts::SIGWINCH;

use super::*;
use crate::config::TerminalConfig;
use crate::input::{spawn_reader, DeviceReader, InputDecoder, InputEvent};
use crate::terminal::TerminalSession;

fn drain(bus: &mut EventBus) -> Vec<InputEvent> {
    let mut events = Vec::new();
    while let Some(event) = bus.recv() {
        events.push(event);
    }
    events
}

#[test_log::test]
fn events_from_two_producers_arrive_once_in_producer_order() -> Result<()> {
    let mut bus = EventBus::new(2);
    bus.spawn_producer("letters", |tx| {
        for c in 'a'..='z' {
            tx.send(InputEvent::Char(c))?;
        }
        Ok(())
    })?;
    bus.spawn_producer("resizes", |tx| {
        for cols in 1..=20 {
            tx.send(InputEvent::Resize { cols, rows: 1 })?;
        }
        Ok(())
    })?;

    let events = drain(&mut bus);

    let letters: Vec<char> = events
        .iter()
        .filter_map(|event| match event {
            InputEvent::Char(c) => Some(*c),
            _ => None,
        })
        .collect();
    let widths: Vec<u16> = events
        .iter()
        .filter_map(|event| match event {
            InputEvent::Resize { cols, .. } => Some(*cols),
            _ => None,
        })
        .collect();
    assert_eq!(letters, ('a'..='z').collect::<Vec<_>>());
    assert_eq!(widths, (1..=20).collect::<Vec<_>>());
    assert_eq!(events.len(), 46);
    Ok(())
}

#[test_log::test]
fn recv_ends_once_every_producer_exited() -> Result<()> {
    let mut bus = EventBus::new(4);
    bus.spawn_producer("single", |tx| {
        tx.send(InputEvent::Timeout)?;
        Ok(())
    })?;

    assert_eq!(bus.recv(), Some(InputEvent::Timeout));
    assert_eq!(bus.recv(), None);
    Ok(())
}

#[test_log::test]
fn close_unblocks_a_producer_stuck_on_a_full_bus() -> Result<()> {
    let mut bus = EventBus::new(1);
    let sent = Arc::new(AtomicUsize::new(0));
    let exited = Arc::new(AtomicBool::new(false));

    let (sent_in, exited_in) = (Arc::clone(&sent), Arc::clone(&exited));
    bus.spawn_producer("flood", move |tx| {
        while tx.send(InputEvent::Timeout).is_ok() {
            sent_in.fetch_add(1, Ordering::SeqCst);
        }
        exited_in.store(true, Ordering::SeqCst);
        Ok(())
    })?;

    // Let the producer fill the queue and block.
    let deadline = Instant::now() + Duration::from_secs(5);
    while sent.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }

    bus.close();

    assert!(bus.is_closed());
    assert!(exited.load(Ordering::SeqCst));
    assert_eq!(bus.recv(), None);
    Ok(())
}

#[test_log::test]
fn close_runs_stop_hooks_before_joining() -> Result<()> {
    let mut bus = EventBus::new(4);
    let (stop_tx, stop_rx) = mpsc::channel::<()>();

    bus.spawn_producer_with_stop(
        "blocked-elsewhere",
        move |_tx| {
            // Blocks until the stop hook drops its end.
            let _ = stop_rx.recv();
            Ok(())
        },
        move || drop(stop_tx),
    )?;

    bus.close();
    bus.close();
    assert!(bus.is_closed());
    Ok(())
}

#[test_log::test]
fn senders_fail_after_close() -> Result<()> {
    let mut bus = EventBus::new(4);
    let sender = bus.sender().expect("fresh bus hands out senders");

    bus.close();

    assert!(sender.is_closed());
    assert_eq!(sender.send(InputEvent::Timeout), Err(BusClosed));
    assert!(bus.spawn_producer("late", |_| Ok(())).is_err());
    Ok(())
}

#[test_log::test]
fn resize_and_keystroke_in_one_window_are_each_delivered_once() -> Result<()> {
    let winsize = Winsize {
        ws_row: 30,
        ws_col: 100,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let pty = openpty(&winsize, None::<&nix::sys::termios::Termios>)?;
    let slave_fd = pty.slave.as_raw_fd();
    let config = TerminalConfig {
        restore_on_panic: false,
        ..TerminalConfig::default()
    };
    let session = TerminalSession::enter_raw_mode(slave_fd, std::io::sink(), &config)?;

    let mut bus = EventBus::new(8);
    spawn_reader(
        &mut bus,
        InputDecoder::new(DeviceReader::new(pty.slave.try_clone()?, 1), 32),
    )?;
    spawn_resize_watcher(&mut bus, slave_fd)?;

    let mut master = std::fs::File::from(pty.master);
    master.write_all(b"x")?;
    signal_hook::low_level::raise(SIGWINCH)?;

    let mut keys = 0;
    let mut resizes = 0;
    let deadline = Instant::now() + Duration::from_secs(5);
    // Keep draining for a while after both arrived to catch duplicates.
    let mut settle_until = None;
    while Instant::now() < deadline {
        if settle_until.is_some_and(|until| Instant::now() >= until) {
            break;
        }
        match bus.recv_timeout(Duration::from_millis(100)) {
            Ok(InputEvent::Char('x')) => keys += 1,
            Ok(InputEvent::Resize { cols, rows }) => {
                assert_eq!((cols, rows), (100, 30));
                resizes += 1;
            }
            Ok(_) | Err(_) => {}
        }
        if keys > 0 && resizes > 0 && settle_until.is_none() {
            settle_until = Some(Instant::now() + Duration::from_millis(300));
        }
    }

    bus.close();
    session.restore()?;

    assert_eq!(keys, 1);
    assert_eq!(resizes, 1);
    Ok(())
}
