use crate::error::AppError;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    WorkType,
    JobPost,
    Availability,
}

impl std::str::FromStr for EntityKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work-type" => Ok(EntityKind::WorkType),
            "job-post" => Ok(EntityKind::JobPost),
            "availability" => Ok(EntityKind::Availability),
            other => Err(AppError::BadRequest(format!("unknown entity kind '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityKey {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SaveState {
    Idle,
    Saving,
    Failed { message: String },
}

/// Tracks in-flight saves per entity so the same record is never written by
/// two requests at once.
#[derive(Clone, Default)]
pub struct SaveTracker {
    states: Arc<Mutex<HashMap<EntityKey, SaveState>>>,
}

impl SaveTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<EntityKey, SaveState>> {
        // A panic while holding the lock leaves the map consistent.
        self.states.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn begin(&self, key: EntityKey) -> Result<SaveGuard, AppError> {
        let mut states = self.lock();
        if states.get(&key) == Some(&SaveState::Saving) {
            tracing::warn!(entity = %key, "rejected concurrent save");
            return Err(AppError::Conflict(format!(
                "a save for {key} is already in progress"
            )));
        }
        states.insert(key.clone(), SaveState::Saving);
        Ok(SaveGuard {
            tracker: self.clone(),
            key,
            finished: false,
        })
    }

    pub fn state_of(&self, key: &EntityKey) -> SaveState {
        self.lock().get(key).cloned().unwrap_or(SaveState::Idle)
    }

    /// Idle is the default, so only saving and failed entities are kept.
    fn finish(&self, key: &EntityKey, state: SaveState) {
        let mut states = self.lock();
        if state == SaveState::Idle {
            states.remove(key);
        } else {
            states.insert(key.clone(), state);
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.lock().len()
    }
}

/// Marks its entity as saving until `succeed` or `fail` is called. Dropping an
/// unfinished guard records a failure.
pub struct SaveGuard {
    tracker: SaveTracker,
    key: EntityKey,
    finished: bool,
}

impl SaveGuard {
    pub fn succeed(mut self) {
        self.finished = true;
        self.tracker.finish(&self.key, SaveState::Idle);
    }

    pub fn fail(mut self, message: impl Into<String>) {
        self.finished = true;
        self.tracker.finish(
            &self.key,
            SaveState::Failed {
                message: message.into(),
            },
        );
    }

    /// Settles the guard from the outcome of a store call and passes it through.
    pub fn settle<T>(self, result: Result<T, AppError>) -> Result<T, AppError> {
        match &result {
            Ok(_) => self.succeed(),
            Err(e) => self.fail(e.to_string()),
        }
        result
    }
}

impl Drop for SaveGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.tracker.finish(
                &self.key,
                SaveState::Failed {
                    message: "save was interrupted".to_string(),
                },
            );
        }
    }
}
