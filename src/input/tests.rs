// src/input/tests.rs

use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read, Write};
use std::os::fd::AsRawFd;
use std::time::Duration;

use anyhow::Result;
use nix::pty::{openpty, Winsize};

use super::*;
use crate::config::TerminalConfig;
use crate::events::EventBus;
use crate::keys::{MouseModifiers, CTRL_C, ENTER, ESC, SHIFT_TAB};
use crate::terminal::TerminalSession;

// --- Test Helpers ---

/// Hands out one scripted result per read, then reports timeouts forever.
struct ScriptedReader {
    reads: VecDeque<io::Result<Vec<u8>>>,
}

impl ScriptedReader {
    fn new(reads: Vec<io::Result<Vec<u8>>>) -> Self {
        ScriptedReader {
            reads: reads.into(),
        }
    }
}

impl Read for ScriptedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reads.pop_front() {
            Some(Ok(bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            }
            Some(Err(e)) => Err(e),
            None => Ok(0),
        }
    }
}

fn decoder(reads: Vec<io::Result<Vec<u8>>>) -> InputDecoder<ScriptedReader> {
    InputDecoder::new(ScriptedReader::new(reads), 32)
}

fn mouse(b: u8, x: u8, y: u8) -> Vec<u8> {
    vec![ESC as u8, b'[', b'M', b, x, y]
}

// --- Classification ---

#[test_log::test]
fn shift_tab_sequence_is_one_char() {
    assert_eq!(decode(b"\x1b[Z"), InputEvent::Char(SHIFT_TAB));
}

#[test_log::test]
fn single_bytes_are_chars() {
    assert_eq!(decode(b"a"), InputEvent::Char('a'));
    assert_eq!(decode(&[0x03]), InputEvent::Char(CTRL_C));
    assert_eq!(decode(b"\r"), InputEvent::Char(ENTER));
    assert_eq!(decode(&[ESC as u8]), InputEvent::Char(ESC));
}

#[test_log::test]
fn multibyte_utf8_is_one_char() {
    assert_eq!(decode("é".as_bytes()), InputEvent::Char('é'));
    assert_eq!(decode("€".as_bytes()), InputEvent::Char('€'));
    assert_eq!(decode("🦀".as_bytes()), InputEvent::Char('🦀'));
}

#[test_log::test]
fn unmatched_chunks_are_unknown() {
    assert_eq!(decode(b"\x1b[A"), InputEvent::Unknown(b"\x1b[A".to_vec()));
    assert_eq!(decode(b"ab"), InputEvent::Unknown(b"ab".to_vec()));
    assert_eq!(decode(&[0xc3]), InputEvent::Char('\u{c3}'));
    assert_eq!(decode(&[0xe2, 0x82]), InputEvent::Unknown(vec![0xe2, 0x82]));
}

#[test_log::test]
fn mouse_click_decodes_button_and_coordinates() {
    // Left button at column 0, row 0.
    assert_eq!(
        decode(&mouse(32, 33, 33)),
        InputEvent::MouseClick {
            x: 0,
            y: 0,
            button: MouseButton::Left,
            modifiers: MouseModifiers::empty(),
        }
    );
    // Right button with shift and ctrl at 9,4.
    assert_eq!(
        decode(&mouse(32 + 2 + 4 + 16, 42, 37)),
        InputEvent::MouseClick {
            x: 9,
            y: 4,
            button: MouseButton::Right,
            modifiers: MouseModifiers::SHIFT | MouseModifiers::CONTROL,
        }
    );
}

#[test_log::test]
fn mouse_release_and_wrapped_coordinates() {
    assert_eq!(
        decode(&mouse(32 + 3, 43, 34)),
        InputEvent::MouseRelease { x: 10, y: 1 }
    );
    // Coordinates past 222 arrive as bytes below 33.
    assert_eq!(
        decode(&mouse(32 + 3, 0, 32)),
        InputEvent::MouseRelease { x: 222, y: 254 }
    );
}

#[test_log::test]
fn truncated_mouse_report_is_unknown() {
    assert_eq!(decode(b"\x1b[M"), InputEvent::Unknown(b"\x1b[M".to_vec()));
    assert_eq!(decode(b"\x1b[M !"), InputEvent::Unknown(b"\x1b[M !".to_vec()));
}

// --- Reading ---

#[test_log::test]
fn empty_read_is_one_timeout() {
    let mut decoder = decoder(vec![Ok(Vec::new()), Ok(b"x".to_vec())]);
    assert_eq!(decoder.next_event(), InputEvent::Timeout);
    assert_eq!(decoder.next_event(), InputEvent::Char('x'));
}

#[test_log::test]
fn interrupted_reads_are_retried() {
    let mut decoder = decoder(vec![
        Err(io::Error::from(ErrorKind::Interrupted)),
        Ok(b"q".to_vec()),
    ]);
    assert_eq!(decoder.next_event(), InputEvent::Char('q'));
}

#[test_log::test]
fn read_failures_become_error_events() {
    let mut decoder = decoder(vec![Err(io::Error::from(ErrorKind::BrokenPipe))]);
    match decoder.next_event() {
        InputEvent::Error(e) => assert_eq!(e.kind(), ErrorKind::BrokenPipe),
        other => panic!("expected an error event, got {:?}", other),
    }
}

#[test_log::test]
fn display_uses_key_names() {
    assert_eq!(InputEvent::Char(CTRL_C).to_string(), "^C");
    assert_eq!(InputEvent::Char('x').to_string(), "'x'");
    assert_eq!(InputEvent::Char(SHIFT_TAB).to_string(), "Shift-Tab");
    assert_eq!(
        InputEvent::Resize { cols: 80, rows: 24 }.to_string(),
        "resize to 80x24"
    );
}

// --- Reader producer ---

#[test_log::test]
fn reader_delivers_chunks_in_order_and_stops_after_an_error() {
    let mut bus = EventBus::new(4);
    let decoder = decoder(vec![
        Ok(b"a".to_vec()),
        Ok("ü".as_bytes().to_vec()),
        Err(io::Error::from(ErrorKind::UnexpectedEof)),
    ]);
    spawn_reader(&mut bus, decoder).unwrap();

    let mut events = Vec::new();
    while let Some(event) = bus.recv() {
        events.push(event);
    }

    assert_eq!(
        events,
        vec![
            InputEvent::Char('a'),
            InputEvent::Char('ü'),
            InputEvent::Error(std::sync::Arc::new(io::Error::from(
                ErrorKind::UnexpectedEof
            ))),
        ]
    );
}

#[test_log::test]
fn device_reader_decodes_keys_from_a_pty() -> Result<()> {
    let winsize = Winsize {
        ws_row: 24,
        ws_col: 80,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let pty = openpty(&winsize, None::<&nix::sys::termios::Termios>)?;
    let config = TerminalConfig {
        restore_on_panic: false,
        ..TerminalConfig::default()
    };
    let session = TerminalSession::enter_raw_mode(pty.slave.as_raw_fd(), io::sink(), &config)?;

    let mut bus = EventBus::new(8);
    let reader = DeviceReader::new(pty.slave.try_clone()?, 1);
    spawn_reader(&mut bus, InputDecoder::new(reader, 32))?;

    let mut master = std::fs::File::from(pty.master);
    master.write_all(b"k")?;

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    let mut got = None;
    while std::time::Instant::now() < deadline {
        match bus.recv_timeout(Duration::from_millis(500)) {
            Ok(InputEvent::Timeout) => continue,
            Ok(event) => {
                got = Some(event);
                break;
            }
            Err(_) => continue,
        }
    }
    assert_eq!(got, Some(InputEvent::Char('k')));

    bus.close();
    session.restore()?;
    Ok(())
}
