// src/command.rs

//! Command names and the registry resolving them.
//!
//! The registry interns symbol names, groups them into the vocabulary of the
//! command grammar (`verb`, `move`, `edit`, `object`) and maps fully
//! qualified command names such as `"line.insert"` or `"move.up"` to the
//! action they stand for. It is a plain value owned by the editor session.

use std::collections::HashMap;

use log::{debug, trace};
use thiserror::Error;

use crate::buffer::{Move, Op};

/// What a resolved command does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Edit(Op),
    Move(Move),
    Undo,
    Redo,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// Interned but not defined yet.
    Unknown,
    /// A member of at least one group.
    Atom,
    Group,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("symbol '{name}' is already defined as {kind:?}")]
    Redefined { name: String, kind: SymbolKind },
    #[error("command '{0}' is already bound")]
    DuplicateCommand(String),
}

#[derive(Debug)]
struct Symbol {
    name: String,
    kind: SymbolKind,
    members: Vec<SymbolId>,
}

#[derive(Debug, Default)]
pub struct Registry {
    symbols: Vec<Symbol>,
    by_name: HashMap<String, SymbolId>,
    commands: HashMap<String, Command>,
}

const MOVES: [(&str, Move); 8] = [
    ("up", Move::Up),
    ("down", Move::Down),
    ("left", Move::Left),
    ("right", Move::Right),
    ("first", Move::First),
    ("last", Move::Last),
    ("top", Move::Top),
    ("bottom", Move::Bottom),
];

const LINE_EDITS: [(&str, Op); 7] = [
    ("insert", Op::LineInsert),
    ("append", Op::LineAppend),
    ("delete", Op::LineDel),
    ("break", Op::LineBreak),
    ("join", Op::LineJoin),
    ("copy", Op::LineCopy { count: 1 }),
    ("paste", Op::LinePaste),
];

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Registry::default()
    }

    /// The editor vocabulary: every `Move` as `move.<name>`, every `Op` as
    /// `line.<name>`, `line.undo`, `line.redo` and `quit`.
    pub fn with_defaults() -> Self {
        let mut registry = Registry::new();
        let moves: Vec<&str> = MOVES.iter().map(|(name, _)| *name).collect();
        let mut edits: Vec<&str> = LINE_EDITS.iter().map(|(name, _)| *name).collect();
        edits.extend(["undo", "redo"]);

        // A fresh registry has no groups, so these cannot collide.
        let groups: [(&str, &[&str]); 4] = [
            ("verb", &["move", "edit", "quit"][..]),
            ("move", &moves[..]),
            ("edit", &edits[..]),
            ("object", &["cursor", "line"][..]),
        ];
        for (group, members) in groups {
            if let Err(e) = registry.define_group(group, members) {
                debug!("Registry: {}", e);
            }
        }

        for (name, movement) in MOVES {
            registry.insert_command(format!("move.{}", name), Command::Move(movement));
        }
        for (name, op) in LINE_EDITS {
            registry.insert_command(format!("line.{}", name), Command::Edit(op));
        }
        registry.insert_command("line.undo".to_string(), Command::Undo);
        registry.insert_command("line.redo".to_string(), Command::Redo);
        registry.insert_command("quit".to_string(), Command::Quit);

        debug!(
            "Registry: {} symbols, {} commands.",
            registry.symbols.len(),
            registry.commands.len()
        );
        registry
    }

    /// Interns `name`, returning the existing id if it is already known.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = SymbolId(self.symbols.len());
        self.symbols.push(Symbol {
            name: name.to_string(),
            kind: SymbolKind::Unknown,
            members: Vec::new(),
        });
        self.by_name.insert(name.to_string(), id);
        trace!("Registry: interned '{}' as {:?}", name, id);
        id
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, id: SymbolId) -> Option<&str> {
        self.symbols.get(id.0).map(|symbol| symbol.name.as_str())
    }

    pub fn kind(&self, name: &str) -> SymbolKind {
        self.lookup(name)
            .and_then(|id| self.symbols.get(id.0))
            .map_or(SymbolKind::Unknown, |symbol| symbol.kind)
    }

    /// Defines `group` with `members`. A name can be defined as a group only
    /// once; a member of another group may still become a group itself.
    pub fn define_group(&mut self, group: &str, members: &[&str]) -> Result<(), RegistryError> {
        let id = self.intern(group);
        let kind = self.symbols[id.0].kind;
        if kind == SymbolKind::Group {
            return Err(RegistryError::Redefined {
                name: group.to_string(),
                kind,
            });
        }

        let mut member_ids = Vec::with_capacity(members.len());
        for member in members {
            let member_id = self.intern(member);
            let symbol = &mut self.symbols[member_id.0];
            if symbol.kind == SymbolKind::Unknown {
                symbol.kind = SymbolKind::Atom;
            }
            if !member_ids.contains(&member_id) {
                member_ids.push(member_id);
            }
        }

        let symbol = &mut self.symbols[id.0];
        symbol.kind = SymbolKind::Group;
        symbol.members = member_ids;
        debug!("Registry: group '{}' = {:?}", group, members);
        Ok(())
    }

    /// Member names of `group`, in definition order.
    pub fn members(&self, group: &str) -> Option<Vec<&str>> {
        let symbol = self.symbols.get(self.lookup(group)?.0)?;
        if symbol.kind != SymbolKind::Group {
            return None;
        }
        Some(
            symbol
                .members
                .iter()
                .filter_map(|&id| self.name(id))
                .collect(),
        )
    }

    /// Binds a command name. Names can only be bound once.
    pub fn bind(&mut self, name: &str, command: Command) -> Result<(), RegistryError> {
        if self.commands.contains_key(name) {
            return Err(RegistryError::DuplicateCommand(name.to_string()));
        }
        self.insert_command(name.to_string(), command);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Option<Command> {
        let command = self.commands.get(name).copied();
        if command.is_none() {
            trace!("Registry: '{}' does not name a command", name);
        }
        command
    }

    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    fn insert_command(&mut self, name: String, command: Command) {
        for part in name.split('.') {
            self.intern(part);
        }
        self.commands.insert(name, command);
    }
}
