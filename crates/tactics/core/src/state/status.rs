//! Status list carried by every token.
//!
//! Statuses are turn-based: `remaining_turns` counts down outside the engine,
//! `None` means the status lasts until removed. A status created while a
//! concentration link is active remembers the link's source id so that it is
//! purged together with the link.

use super::TokenId;

/// A single status entry on a token.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusEntry {
    pub id: String,
    pub remaining_turns: Option<u32>,
    /// Token that applied the status.
    pub source: Option<TokenId>,
    /// Concentration source id this status depends on.
    #[cfg_attr(feature = "serde", serde(default))]
    pub concentration_source: Option<String>,
    #[cfg_attr(feature = "serde", serde(default = "default_stacks"))]
    pub stacks: u32,
}

#[cfg(feature = "serde")]
fn default_stacks() -> u32 {
    1
}

impl StatusEntry {
    pub fn new(id: impl Into<String>, remaining_turns: Option<u32>) -> Self {
        Self {
            id: id.into(),
            remaining_turns,
            source: None,
            concentration_source: None,
            stacks: 1,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: TokenId) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn with_concentration(mut self, source_id: impl Into<String>) -> Self {
        self.concentration_source = Some(source_id.into());
        self
    }
}

/// Ordered list of statuses on a token.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct StatusList {
    entries: Vec<StatusEntry>,
}

impl StatusList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&StatusEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut StatusEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    /// Stack count of `id`, zero when absent.
    pub fn stacks(&self, id: &str) -> u32 {
        self.get(id).map_or(0, |e| e.stacks)
    }

    /// Adds a status. An existing entry with the same id is refreshed instead:
    /// it keeps the longer duration and takes over the new sources.
    pub fn apply(&mut self, entry: StatusEntry) {
        if let Some(existing) = self.get_mut(&entry.id) {
            existing.remaining_turns = match (existing.remaining_turns, entry.remaining_turns) {
                (None, _) | (_, None) => None,
                (Some(a), Some(b)) => Some(a.max(b)),
            };
            existing.source = entry.source.or(existing.source);
            if entry.concentration_source.is_some() {
                existing.concentration_source = entry.concentration_source;
            }
            return;
        }
        self.entries.push(entry);
    }

    /// Removes every entry with `id`. Returns how many were removed.
    pub fn remove(&mut self, id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        before - self.entries.len()
    }

    /// Removes every entry tied to the given concentration source.
    pub fn purge_concentration(&mut self, source_id: &str) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|e| e.concentration_source.as_deref() != Some(source_id));
        before - self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<StatusEntry> for StatusList {
    fn from_iter<I: IntoIterator<Item = StatusEntry>>(iter: I) -> Self {
        let mut list = Self::new();
        for entry in iter {
            list.apply(entry);
        }
        list
    }
}
