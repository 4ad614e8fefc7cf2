// src/lib.rs

//! `chisel`: the engine of a terminal text editor.
//!
//! A raw-mode `TerminalSession`, an `InputDecoder` turning device reads into
//! `InputEvent`s, an `EventBus` merging input with resize signals, and a
//! line-oriented `Buffer` edited through whole-line `Op`s.

pub mod buffer;
pub mod command;
pub mod config;
pub mod editor;
pub mod error;
pub mod events;
pub mod input;
pub mod keys;
pub mod terminal;
pub mod view;

pub use buffer::{Buffer, Clipboard, Cursor, History, Line, LineEnding, LineId, Move, Op, Piece};
pub use command::{Command, Registry};
pub use config::Config;
pub use editor::{Editor, Flow};
pub use error::{Error, Result};
pub use events::EventBus;
pub use input::{InputDecoder, InputEvent};
pub use terminal::TerminalSession;
