// src/terminal/mod.rs

//! The terminal device: raw-mode session lifecycle and geometry queries.

pub mod session;

pub use session::{
    raw_attributes, terminal_size, SessionOutput, TerminalSession, DEFAULT_COLUMNS, DEFAULT_ROWS,
};
