// src/specs/tree.rs
//! Bracket tree parser.
//!
//! One greedy left-to-right pass over a journey fragment. Every leaf token is
//! filed under the bracket depth it was found at, so the positional extractors
//! can address "the 3rd token at depth 0" without caring how the payload nests.
//! Brackets are not matched: fragments are cut out of a larger structure, so
//! depth may drift below zero and that is fine.

use std::collections::BTreeMap;

/// Depth → trimmed tokens in scan order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelMap {
    levels: BTreeMap<i32, Vec<String>>,
}

impl LevelMap {
    pub fn parse(s: &str) -> Self {
        let mut map = LevelMap::default();
        let mut buf = String::new();
        let mut depth: i32 = 0;

        for ch in s.chars() {
            match ch {
                '[' => {
                    // Entering from the root keeps the buffer; it glues onto the next token.
                    if depth > 0 {
                        map.flush(depth, &mut buf);
                    }
                    depth += 1;
                }
                ']' => {
                    map.flush(depth, &mut buf);
                    depth -= 1;
                }
                ',' => map.flush(depth, &mut buf),
                _ => buf.push(ch),
            }
        }
        map.flush(depth, &mut buf);
        map
    }

    fn flush(&mut self, depth: i32, buf: &mut String) {
        let token = buf.trim();
        if !token.is_empty() {
            self.levels.entry(depth).or_default().push(token.to_string());
        }
        buf.clear();
    }

    /// Tokens at `depth`; empty when the depth never received one.
    pub fn get(&self, depth: i32) -> &[String] {
        self.levels.get(&depth).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, depth: i32) -> bool {
        self.levels.contains_key(&depth)
    }

    pub fn insert(&mut self, depth: i32, tokens: Vec<String>) {
        self.levels.insert(depth, tokens);
    }

    pub fn remove(&mut self, depth: i32) -> Option<Vec<String>> {
        self.levels.remove(&depth)
    }

    pub fn depths(&self) -> impl Iterator<Item = i32> + '_ {
        self.levels.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
