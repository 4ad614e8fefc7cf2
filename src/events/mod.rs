// src/events/mod.rs

//! Merges the input reader and the resize watcher into one ordered stream for
//! a single consumer.

pub mod bus;
pub mod resize;

pub use bus::{BusClosed, BusSender, EventBus};
pub use resize::spawn_resize_watcher;

#[cfg(test)]
mod tests;
