pub mod common;
pub mod local;
pub mod online;

use std::io;

use ratatui::{backend::Backend, Terminal};

use crate::config::Config;
use crate::net::protocol::MatchSettings;

/// How a match is entered from the menu or the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchEntry {
    Create(MatchSettings),
    Join(String),
}

/// A runnable match loop with an idempotent teardown.
pub trait MatchLoop<B: Backend> {
    fn run(&mut self, terminal: &mut Terminal<B>, config: &Config) -> io::Result<()>;
    fn shutdown(&mut self);
}

/// Router-layer registry holding at most one active match loop. Installing
/// a controller tears the previous one down first, so two loops can never
/// fight over the same terminal.
pub struct ControllerSlot<B: Backend> {
    active: Option<Box<dyn MatchLoop<B>>>,
}

impl<B: Backend> ControllerSlot<B> {
    pub fn new() -> Self {
        Self { active: None }
    }

    pub fn install(&mut self, controller: Box<dyn MatchLoop<B>>) -> &mut dyn MatchLoop<B> {
        if let Some(previous) = self.active.as_mut() {
            previous.shutdown();
        }
        self.active = Some(controller);
        self.active.as_mut().expect("just installed").as_mut()
    }

    pub fn clear(&mut self) {
        if let Some(previous) = self.active.as_mut() {
            previous.shutdown();
        }
        self.active = None;
    }
}

impl<B: Backend> Default for ControllerSlot<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> Drop for ControllerSlot<B> {
    fn drop(&mut self) {
        self.clear();
    }
}
