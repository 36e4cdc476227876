//! Ordered list of inputs, edited before a run and frozen when it starts.
//!
//! Whatever front end drives it (the CLI today) only renders this list and
//! forwards move requests to it.

use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlist {
    items: Vec<PathBuf>,
}

/// One reorder request, written `up:<index>` or `down:<index>` (0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Up(usize),
    Down(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid move {0:?}: expected up:<index> or down:<index>")]
pub struct MoveParseError(pub String);

impl FromStr for Move {
    type Err = MoveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || MoveParseError(s.to_string());
        let (direction, index) = s.trim().split_once(':').ok_or_else(err)?;
        let index: usize = index.trim().parse().map_err(|_| err())?;
        match direction.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Move::Up(index)),
            "down" => Ok(Move::Down(index)),
            _ => Err(err()),
        }
    }
}

impl Playlist {
    pub fn new(items: Vec<PathBuf>) -> Self {
        Self { items }
    }

    /// Alphabetical order, as a fresh selection is presented
    pub fn sort(&mut self) {
        self.items.sort();
    }

    /// Swap item `index` with its predecessor; returns its new index
    pub fn move_up(&mut self, index: usize) -> Option<usize> {
        if index == 0 || index >= self.items.len() {
            return None;
        }
        self.items.swap(index, index - 1);
        Some(index - 1)
    }

    /// Swap item `index` with its successor; returns its new index
    pub fn move_down(&mut self, index: usize) -> Option<usize> {
        if index >= self.items.len().saturating_sub(1) {
            return None;
        }
        self.items.swap(index, index + 1);
        Some(index + 1)
    }

    /// Apply a reorder request; out-of-range or boundary moves are no-ops
    pub fn apply(&mut self, mv: Move) -> Option<usize> {
        match mv {
            Move::Up(i) => self.move_up(i),
            Move::Down(i) => self.move_down(i),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Owned copy handed to a run; later edits do not affect it
    pub fn snapshot(&self) -> Vec<PathBuf> {
        self.items.clone()
    }

    /// Numbered listing, one line per file
    pub fn render(&self) -> String {
        self.items
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{:>3}. {}", i, p.display()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
