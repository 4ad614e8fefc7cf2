// src/editor/mod.rs

//! The editor session: one buffer, its cursor and clipboard, and the loop
//! feeding them events from the terminal.
//!
//! ```text
//! TerminalSession ──► input-reader ─┐
//!                                   ├─► EventBus ─► Editor::handle_event ─► View
//! SIGWINCH ─────────► resize-watcher┘
//! ```

use std::collections::HashMap;
use std::io::{self, Write};
use std::os::unix::io::RawFd;
use std::path::Path;

use anyhow::Context;
use log::{debug, error, info, trace, warn};

use crate::buffer::{Buffer, Clipboard, Cursor, History};
use crate::command::{Command, Registry};
use crate::config::{Config, EditorConfig};
use crate::error::{Error, Result};
use crate::events::{spawn_resize_watcher, EventBus};
use crate::input::{spawn_reader, DeviceReader, InputDecoder, InputEvent};
use crate::keys::CTRL_C;
use crate::terminal::{TerminalSession, DEFAULT_COLUMNS, DEFAULT_ROWS};
use crate::view::{NullView, StatusLine, View};

/// Whether the event loop keeps going after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Editor {
    buffer: Buffer,
    cursor: Cursor,
    clipboard: Clipboard,
    history: History,
    registry: Registry,
    keymap: HashMap<char, Command>,
    size: (u16, u16),
}

impl Editor {
    /// An editor on `buffer` with the default command vocabulary and the
    /// key bindings of `config`. Bindings that are not a single key or do not
    /// name a command are skipped with a warning.
    pub fn new(buffer: Buffer, config: &EditorConfig) -> Self {
        let registry = Registry::with_defaults();
        let keymap = build_keymap(&registry, config);
        let cursor = Cursor::new(&buffer);
        Editor {
            buffer,
            cursor,
            clipboard: Clipboard::new(),
            history: History::new(config.undo_limit),
            registry,
            keymap,
            size: (DEFAULT_COLUMNS, DEFAULT_ROWS),
        }
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Terminal geometry as `(columns, rows)`.
    pub fn size(&self) -> (u16, u16) {
        self.size
    }

    pub fn set_size(&mut self, cols: u16, rows: u16) {
        self.size = (cols, rows);
    }

    /// Processes one event to completion.
    ///
    /// Rejected edits are logged and the loop continues; device errors and
    /// invariant violations end it.
    pub fn handle_event(&mut self, event: InputEvent) -> Result<Flow> {
        trace!("Editor: handling {}", event);
        match event {
            InputEvent::Char(CTRL_C) => {
                info!("Editor: interrupt key, quitting.");
                Ok(Flow::Quit)
            }
            InputEvent::Char(c) => match self.keymap.get(&c).copied() {
                Some(command) => self.execute(command),
                None => {
                    debug!("Editor: {} is not bound.", InputEvent::Char(c));
                    Ok(Flow::Continue)
                }
            },
            InputEvent::MouseClick { x, y, .. } => {
                self.cursor
                    .jump(&self.buffer, usize::from(y), usize::from(x));
                Ok(Flow::Continue)
            }
            InputEvent::MouseRelease { .. } | InputEvent::Timeout => Ok(Flow::Continue),
            InputEvent::Resize { cols, rows } => {
                debug!("Editor: resized to {}x{}.", cols, rows);
                self.set_size(cols, rows);
                Ok(Flow::Continue)
            }
            InputEvent::Unknown(bytes) => {
                debug!("Editor: ignoring unknown input {:02x?}", bytes);
                Ok(Flow::Continue)
            }
            InputEvent::Error(e) => Err(Error::device(
                "reading input",
                io::Error::new(e.kind(), e.to_string()),
            )),
        }
    }

    pub fn execute(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Quit => return Ok(Flow::Quit),
            Command::Move(movement) => {
                if let Err(e) = self.cursor.move_to(&self.buffer, movement) {
                    self.recover(e)?;
                }
            }
            Command::Edit(op) => {
                let applied = self.history.apply(
                    &mut self.buffer,
                    op,
                    &mut self.cursor,
                    &mut self.clipboard,
                );
                if let Err(e) = applied {
                    self.recover(e)?;
                }
            }
            Command::Undo => {
                if !self.history.undo(&mut self.buffer, &mut self.cursor)? {
                    info!("Editor: nothing to undo.");
                }
            }
            Command::Redo => {
                if !self.history.redo(&mut self.buffer, &mut self.cursor)? {
                    info!("Editor: nothing to redo.");
                }
            }
        }
        Ok(Flow::Continue)
    }

    /// Drains `bus` until it ends or a command quits, rendering through
    /// `view` into `out` after every event.
    pub fn drive(
        &mut self,
        bus: &mut EventBus,
        view: &mut dyn View,
        out: &mut dyn Write,
    ) -> anyhow::Result<()> {
        view.render(self, out).context("Failed to render")?;
        while let Some(event) = bus.recv() {
            let flow = self.handle_event(event)?;
            view.render(self, out).context("Failed to render")?;
            if flow == Flow::Quit {
                return Ok(());
            }
        }
        info!("Editor: event stream ended.");
        Ok(())
    }

    fn recover(&mut self, e: Error) -> Result<()> {
        match e {
            Error::StaleCursor => {
                warn!("Editor: cursor lost its line, repositioning.");
                self.cursor
                    .jump(&self.buffer, self.cursor.lineno(), self.cursor.colno());
                Ok(())
            }
            e if e.is_rejected_edit() => {
                info!("Editor: {}", e);
                Ok(())
            }
            e => Err(e),
        }
    }
}

fn build_keymap(registry: &Registry, config: &EditorConfig) -> HashMap<char, Command> {
    let mut keymap = HashMap::new();
    for (key, name) in &config.keybindings {
        let mut chars = key.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            warn!("Editor: binding {:?} is not a single key, skipped.", key);
            continue;
        };
        if c == CTRL_C {
            warn!("Editor: ^C always quits, binding to '{}' skipped.", name);
            continue;
        }
        match registry.resolve(name) {
            Some(command) => {
                keymap.insert(c, command);
            }
            None => warn!("Editor: '{}' does not name a command, skipped.", name),
        }
    }
    debug!("Editor: {} key bindings.", keymap.len());
    keymap
}

/// Writes to the terminal through the session, so nothing reaches the device
/// after it has been restored.
struct SessionWriter<'a>(&'a TerminalSession);

impl Write for SessionWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write_raw(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Edits `path` on the controlling terminal until the user quits.
///
/// The bus is closed, joining both producers, before the terminal is
/// restored. The session outlives the bus on every return path.
pub fn run(config: &Config, path: &Path) -> anyhow::Result<()> {
    let buffer = Buffer::load(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    let mut editor = Editor::new(buffer, &config.editor);

    let fd = libc::STDIN_FILENO;
    let session = TerminalSession::enter_raw_mode(fd, io::stdout(), &config.terminal)
        .context("Failed to enter raw mode")?;
    match session.size() {
        Ok((cols, rows)) => editor.set_size(cols, rows),
        Err(e) => warn!("Editor: {}; assuming {}x{}.", e, DEFAULT_COLUMNS, DEFAULT_ROWS),
    }

    let mut bus = EventBus::new(config.bus.capacity);
    let mut view: Box<dyn View> = if config.editor.status_line {
        Box::new(StatusLine::new())
    } else {
        Box::new(NullView)
    };

    let result = start_producers(&mut bus, config, fd).and_then(|()| {
        editor.drive(&mut bus, view.as_mut(), &mut SessionWriter(&session))
    });

    bus.close();
    if let Err(ref e) = result {
        error!("Editor: stopped on error: {:#}", e);
    }
    session.restore().context("Failed to restore the terminal")?;
    result
}

fn start_producers(bus: &mut EventBus, config: &Config, fd: RawFd) -> anyhow::Result<()> {
    let reader = DeviceReader::stdin(config.terminal.read_timeout_ds)
        .context("Failed to open standard input")?;
    spawn_reader(bus, InputDecoder::new(reader, config.input.chunk_size))?;
    spawn_resize_watcher(bus, fd)?;
    Ok(())
}
