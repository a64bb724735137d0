//! Persistence contract with optimistic concurrency on `Process::version_number`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::domain::{Process, ProcessId};

/// Storage abstraction so the service can be exercised against any backend.
///
/// `save` succeeds only when the stored version equals `expected` (both absent for a first
/// write). The returned process carries the newly assigned version.
pub trait ProcessRepository: Send + Sync {
    fn load(&self, id: &ProcessId) -> Result<Option<Process>, RepositoryError>;
    fn save(&self, process: Process, expected: Option<u32>) -> Result<Process, RepositoryError>;
    fn find_by_target(
        &self,
        target_id: &Uuid,
        page: &PageRequest,
    ) -> Result<Page<Process>, RepositoryError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("process {0} not found")]
    NotFound(ProcessId),
    #[error(
        "process {id} was modified concurrently: expected version {}, stored version {}",
        describe_version(.expected),
        describe_version(.current)
    )]
    VersionConflict {
        id: ProcessId,
        expected: Option<u32>,
        current: Option<u32>,
    },
    #[error("invalid pagination token '{0}'")]
    InvalidPaginationToken(String),
    #[error("process store unavailable: {0}")]
    Unavailable(String),
}

fn describe_version(version: &Option<u32>) -> String {
    version.map_or_else(|| "none".to_string(), |value| value.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page_size: usize,
    pub token: Option<String>,
}

impl PageRequest {
    pub fn first(page_size: usize) -> Self {
        Self {
            page_size,
            token: None,
        }
    }

    pub fn after(page_size: usize, token: impl Into<String>) -> Self {
        Self {
            page_size,
            token: Some(token.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub results: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination_token: Option<String>,
}

#[derive(Default)]
struct StoreState {
    records: HashMap<ProcessId, Process>,
    /// Ids in order of first persistence.
    order: Vec<ProcessId>,
}

/// Process store held in memory, used by the service binary and tests.
#[derive(Default)]
pub struct InMemoryProcessStore {
    state: Mutex<StoreState>,
}

impl InMemoryProcessStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, RepositoryError> {
        Ok(self.lock()?.records.len())
    }

    pub fn is_empty(&self) -> Result<bool, RepositoryError> {
        Ok(self.lock()?.records.is_empty())
    }

    #[cfg(test)]
    pub(super) fn poison_for_test(&self) {
        let _guard = self.state.lock().expect("store lock");
        panic!("writer died while holding the process store lock");
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("process store lock poisoned".to_string()))
    }
}

/// Version the next write of `id` receives, or why the write must be refused.
pub(super) fn next_version(
    id: ProcessId,
    exists: bool,
    current: Option<u32>,
    expected: Option<u32>,
) -> Result<u32, RepositoryError> {
    match (exists, expected) {
        (false, None) => Ok(0),
        (false, Some(_)) => Err(RepositoryError::NotFound(id)),
        (true, Some(expected)) if current == Some(expected) => {
            expected.checked_add(1).ok_or_else(|| {
                RepositoryError::Unavailable(format!("process {id} has exhausted its versions"))
            })
        }
        (true, _) => Err(RepositoryError::VersionConflict {
            id,
            expected,
            current,
        }),
    }
}

impl ProcessRepository for InMemoryProcessStore {
    fn load(&self, id: &ProcessId) -> Result<Option<Process>, RepositoryError> {
        Ok(self.lock()?.records.get(id).cloned())
    }

    fn save(&self, process: Process, expected: Option<u32>) -> Result<Process, RepositoryError> {
        let mut state = self.lock()?;
        let id = process.id();
        let exists = state.records.contains_key(&id);
        let current = state.records.get(&id).and_then(Process::version_number);
        let next = next_version(id, exists, current, expected)?;

        let stored = process.with_version(next);
        if !exists {
            state.order.push(id);
        }
        state.records.insert(id, stored.clone());
        Ok(stored)
    }

    fn find_by_target(
        &self,
        target_id: &Uuid,
        page: &PageRequest,
    ) -> Result<Page<Process>, RepositoryError> {
        let state = self.lock()?;
        let matching: Vec<&Process> = state
            .order
            .iter()
            .filter_map(|id| state.records.get(id))
            .filter(|process| &process.target_id() == target_id)
            .collect();

        let start = match &page.token {
            None => 0,
            Some(token) => {
                let position = Uuid::parse_str(token).ok().and_then(|last| {
                    matching
                        .iter()
                        .position(|process| process.id() == ProcessId(last))
                });
                match position {
                    Some(index) => index + 1,
                    None => return Err(RepositoryError::InvalidPaginationToken(token.clone())),
                }
            }
        };

        let page_size = page.page_size.max(1);
        let results: Vec<Process> = matching
            .iter()
            .skip(start)
            .take(page_size)
            .map(|process| (*process).clone())
            .collect();
        let pagination_token = if start + results.len() < matching.len() {
            results.last().map(|process| process.id().to_string())
        } else {
            None
        };

        Ok(Page {
            results,
            pagination_token,
        })
    }
}
