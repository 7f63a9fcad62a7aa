//! Per-set card deduplication index
//!
//! Historical card numbering is inconsistent, so a single natural key would
//! let duplicates through. Every card contributes three candidate keys and a
//! hit on ANY of them counts as "already present" - the index deliberately
//! favors skipping a card over inserting it twice.

use crate::database::Card;
use std::collections::HashSet;

/// Multi-key lookup over one set's existing cards
#[derive(Debug, Default)]
pub struct DedupIndex {
    keys: HashSet<String>,
}

impl DedupIndex {
    /// Build the index from all cards currently stored for a set
    pub fn from_cards(cards: &[Card]) -> Self {
        let mut index = Self::default();
        for card in cards {
            index.insert(&card.name, &card.card_number);
        }
        index
    }

    /// Candidate keys for one (name, number) pair.
    ///
    /// Empty components contribute no key, so a card with no catalog number
    /// is still findable by name.
    fn candidate_keys(name: &str, number: &str) -> Vec<String> {
        let name = name.trim().to_lowercase();
        let number = number.trim().to_string();

        let mut keys = Vec::with_capacity(3);
        if !name.is_empty() && !number.is_empty() {
            keys.push(format!("{}::{}", name, number));
        }
        if !name.is_empty() {
            keys.push(name);
        }
        if !number.is_empty() {
            keys.push(number);
        }
        keys
    }

    /// True if any candidate key for this (name, number) is already indexed
    pub fn contains(&self, name: &str, number: &str) -> bool {
        Self::candidate_keys(name, number)
            .iter()
            .any(|k| self.keys.contains(k))
    }

    /// Register a card's keys.
    ///
    /// Called right after each successful insert so later products in the
    /// same batch see it.
    pub fn insert(&mut self, name: &str, number: &str) {
        for key in Self::candidate_keys(name, number) {
            self.keys.insert(key);
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
