// Remembers which wish you picked for which fragment
//
// Every fragment you've made a wish with gets its own little leaderboard.
// The top spot is sticky: a newcomer only gets second place, and has to be
// picked again (while second) to take over.

use crate::config::RecencyLookup;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecencyIndex {
    entries: BTreeMap<String, Vec<String>>,
}

impl RecencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the leaderboard for `fragment` after `id` was picked.
    ///
    /// - already first: nothing changes
    /// - second: swaps with first
    /// - anywhere else (or new): slots in second, behind the current leader.
    ///   On an empty board it just becomes first.
    pub fn record(&mut self, fragment: &str, id: &str) {
        let board = self.entries.entry(fragment.to_string()).or_default();

        match board.iter().position(|existing| existing == id) {
            Some(0) => {}
            Some(1) => board.swap(0, 1),
            existing => {
                if let Some(index) = existing {
                    board.remove(index);
                }
                if board.is_empty() {
                    board.push(id.to_string());
                } else {
                    board.insert(1, id.to_string());
                }
            }
        }
    }

    /// Ids remembered for this fragment, best first
    pub fn lookup(&self, fragment: &str, mode: RecencyLookup) -> Vec<String> {
        match mode {
            RecencyLookup::Exact => self.entries.get(fragment).cloned().unwrap_or_default(),
            RecencyLookup::Prefix => {
                // The exact key sorts first among keys sharing the prefix
                let mut ids: Vec<String> = Vec::new();
                let longer = self
                    .entries
                    .range(fragment.to_string()..)
                    .take_while(|(key, _)| key.starts_with(fragment));
                for (_, board) in longer {
                    for id in board {
                        if !ids.contains(id) {
                            ids.push(id.clone());
                        }
                    }
                }
                ids
            }
        }
    }

    /// Forget a wish everywhere. Boards left empty are dropped.
    pub fn purge(&mut self, id: &str) {
        for board in self.entries.values_mut() {
            board.retain(|existing| existing != id);
        }
        self.entries.retain(|_, board| !board.is_empty());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
