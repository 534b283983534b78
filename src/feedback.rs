//! Per-section feedback votes, stored the way the sidebar stores them client side:
//! one key per (article, section), holding a short vote label.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::AnalystError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Up,
    Down,
}

impl Vote {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vote::Up => "up",
            Vote::Down => "down",
        }
    }

    pub fn from_str(raw: &str) -> Option<Self> {
        match raw.trim() {
            "up" => Some(Vote::Up),
            "down" => Some(Vote::Down),
            _ => None,
        }
    }
}

pub fn storage_key(article_id: &str, section: &str) -> String {
    format!("feedback_{article_id}_{section}")
}

/// Client-local key/value storage. A missing key means "no vote".
pub trait FeedbackStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), AnalystError>;
    fn remove(&mut self, key: &str) -> Result<(), AnalystError>;
}

pub fn current_vote(store: &dyn FeedbackStore, article_id: &str, section: &str) -> Option<Vote> {
    store
        .get(&storage_key(article_id, section))
        .and_then(|raw| Vote::from_str(&raw))
}

/// Single-choice toggle: repeating the stored vote clears it, any other vote replaces it.
/// Returns the vote in effect afterwards.
pub fn cast_vote(
    store: &mut dyn FeedbackStore,
    article_id: &str,
    section: &str,
    vote: Vote,
) -> Result<Option<Vote>, AnalystError> {
    let key = storage_key(article_id, section);
    if current_vote(store, article_id, section) == Some(vote) {
        store.remove(&key)?;
        return Ok(None);
    }
    store.set(&key, vote.as_str())?;
    Ok(Some(vote))
}

#[derive(Debug, Clone, Default)]
pub struct MemoryFeedbackStore {
    entries: BTreeMap<String, String>,
}

impl MemoryFeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FeedbackStore for MemoryFeedbackStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AnalystError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), AnalystError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// JSON object on disk, rewritten on every change.
#[derive(Debug, Clone)]
pub struct FileFeedbackStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileFeedbackStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AnalystError> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read(&path) {
            Ok(raw) => serde_json::from_slice(&raw)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), AnalystError> {
        let raw = serde_json::to_vec_pretty(&self.entries)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl FeedbackStore for FileFeedbackStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AnalystError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.persist()
    }

    fn remove(&mut self, key: &str) -> Result<(), AnalystError> {
        if self.entries.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }
}
