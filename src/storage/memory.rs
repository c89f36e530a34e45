//! In-process gateway with the same transactional semantics as the PostgreSQL backend.
//!
//! Selected with `DATABASE_URL=memory:`. Faults can be injected to exercise failure paths.

use crate::domain::model::Visitor;
use crate::storage::{GatewayError, VisitorGateway, VisitorSession};
use async_trait::async_trait;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Failure modes the memory store can simulate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    /// Opening a session, reading and writing fail as if the database were down.
    Unreachable,
    /// Inserts succeed but the store refuses to commit them.
    RejectCommits,
    /// Reads and writes fail with a non-storage error.
    Corrupted,
}

#[derive(Default)]
struct MemoryState {
    rows: Vec<Visitor>,
    last_id: i32,
    fault: Option<Fault>,
}

#[derive(Clone, Default)]
pub struct MemoryVisitorGateway {
    state: Arc<Mutex<MemoryState>>,
    open_sessions: Arc<AtomicUsize>,
}

impl MemoryVisitorGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets (or clears, with `None`) the active fault.
    pub fn set_fault(&self, fault: Option<Fault>) {
        self.inspect().fault = fault;
    }

    /// Number of sessions handed out and not yet dropped.
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    /// Committed rows, in id order.
    pub fn committed(&self) -> Vec<Visitor> {
        self.inspect().rows.clone()
    }

    // Test-facing accessors see the state even after a session panicked while holding the lock.
    fn inspect(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn lock(state: &Mutex<MemoryState>) -> Result<MutexGuard<'_, MemoryState>, GatewayError> {
    state
        .lock()
        .map_err(|_| anyhow::anyhow!("memory store lock poisoned").into())
}

fn unreachable_error() -> GatewayError {
    GatewayError::Storage(sqlx::Error::Io(io::Error::new(
        io::ErrorKind::ConnectionRefused,
        "connection refused",
    )))
}

fn check_fault(state: &MemoryState) -> Result<(), GatewayError> {
    match state.fault {
        Some(Fault::Unreachable) => Err(unreachable_error()),
        Some(Fault::Corrupted) => Err(anyhow::anyhow!("visitor row failed to decode").into()),
        _ => Ok(()),
    }
}

#[async_trait]
impl VisitorGateway for MemoryVisitorGateway {
    async fn open_session(&self) -> Result<Box<dyn VisitorSession>, GatewayError> {
        {
            let state = lock(&self.state)?;
            if state.fault == Some(Fault::Unreachable) {
                return Err(unreachable_error());
            }
        }
        self.open_sessions.fetch_add(1, Ordering::SeqCst);
        debug!("Creating a new database session");
        Ok(Box::new(MemoryVisitorSession {
            state: Arc::clone(&self.state),
            open_sessions: Arc::clone(&self.open_sessions),
            pending: Vec::new(),
            finished: false,
        }))
    }
}

pub struct MemoryVisitorSession {
    state: Arc<Mutex<MemoryState>>,
    open_sessions: Arc<AtomicUsize>,
    pending: Vec<Visitor>,
    finished: bool,
}

impl MemoryVisitorSession {
    fn ensure_open(&self) -> Result<(), GatewayError> {
        if self.finished {
            return Err(anyhow::anyhow!("database session already finished").into());
        }
        Ok(())
    }
}

#[async_trait]
impl VisitorSession for MemoryVisitorSession {
    async fn list_all(&mut self) -> Result<Vec<Visitor>, GatewayError> {
        self.ensure_open()?;
        let state = lock(&self.state)?;
        check_fault(&state)?;
        // A transaction sees its own uncommitted inserts.
        let mut visitors: Vec<Visitor> = state
            .rows
            .iter()
            .chain(self.pending.iter())
            .cloned()
            .collect();
        visitors.sort_by_key(|v| v.id);
        Ok(visitors)
    }

    async fn insert(&mut self, name: &str) -> Result<Visitor, GatewayError> {
        self.ensure_open()?;
        let mut state = lock(&self.state)?;
        check_fault(&state)?;
        // Ids are drawn like a sequence: a rolled-back insert still consumes one.
        state.last_id += 1;
        let visitor = Visitor {
            id: state.last_id,
            name: name.to_string(),
        };
        self.pending.push(visitor.clone());
        Ok(visitor)
    }

    async fn commit(&mut self) -> Result<(), GatewayError> {
        if self.finished {
            return Ok(());
        }
        let mut state = lock(&self.state)?;
        match state.fault {
            Some(Fault::Unreachable) => return Err(unreachable_error()),
            Some(Fault::RejectCommits) => {
                return Err(GatewayError::Storage(sqlx::Error::Protocol(
                    "commit rejected by store".to_string(),
                )))
            }
            _ => {}
        }
        state.rows.append(&mut self.pending);
        state.rows.sort_by_key(|v| v.id);
        self.finished = true;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), GatewayError> {
        self.pending.clear();
        self.finished = true;
        Ok(())
    }
}

impl Drop for MemoryVisitorSession {
    fn drop(&mut self) {
        self.open_sessions.fetch_sub(1, Ordering::SeqCst);
        debug!(pending = !self.finished, "Closing the database session");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn inserts_are_invisible_until_commit() {
        let gateway = MemoryVisitorGateway::new();
        let mut writer = gateway.open_session().await.unwrap();
        let alice = writer.insert("Alice").await.unwrap();
        assert_eq!(alice.id, 1);

        let mut reader = gateway.open_session().await.unwrap();
        assert!(reader.list_all().await.unwrap().is_empty());
        assert_eq!(writer.list_all().await.unwrap(), vec![alice.clone()]);

        writer.commit().await.unwrap();
        assert_eq!(reader.list_all().await.unwrap(), vec![alice]);
    }

    #[tokio::test]
    async fn dropping_a_session_discards_pending_writes_and_releases_it() {
        let gateway = MemoryVisitorGateway::new();
        {
            let mut session = gateway.open_session().await.unwrap();
            session.insert("Ghost").await.unwrap();
            assert_eq!(gateway.open_sessions(), 1);
        }
        assert_eq!(gateway.open_sessions(), 0);
        assert!(gateway.committed().is_empty());

        let mut session = gateway.open_session().await.unwrap();
        let next = session.insert("Bob").await.unwrap();
        assert_eq!(next.id, 2);
    }

    #[tokio::test]
    async fn rejected_commit_leaves_nothing_behind_after_rollback() {
        let gateway = MemoryVisitorGateway::new();
        gateway.set_fault(Some(Fault::RejectCommits));

        let mut session = gateway.open_session().await.unwrap();
        session.insert("Carol").await.unwrap();
        let err = session.commit().await.unwrap_err();
        assert!(err.is_storage());
        session.rollback().await.unwrap();
        drop(session);

        gateway.set_fault(None);
        assert!(gateway.committed().is_empty());
    }

    #[tokio::test]
    async fn faults_classify_as_storage_or_unexpected() {
        let gateway = MemoryVisitorGateway::new();
        gateway.set_fault(Some(Fault::Unreachable));
        assert!(gateway.open_session().await.err().unwrap().is_storage());

        gateway.set_fault(Some(Fault::Corrupted));
        let mut session = gateway.open_session().await.unwrap();
        assert!(!session.list_all().await.unwrap_err().is_storage());
    }

    #[tokio::test]
    async fn finished_sessions_ignore_repeat_commit_and_rollback() {
        let gateway = MemoryVisitorGateway::new();
        let mut session = gateway.open_session().await.unwrap();
        session.insert("Dana").await.unwrap();
        session.commit().await.unwrap();
        session.commit().await.unwrap();
        session.rollback().await.unwrap();
        assert_eq!(gateway.committed().len(), 1);
        assert!(session.insert("late").await.is_err());
    }

    #[tokio::test]
    async fn inspection_survives_a_poisoned_lock() {
        let gateway = MemoryVisitorGateway::new();
        let mut session = gateway.open_session().await.unwrap();
        session.insert("Erin").await.unwrap();
        session.commit().await.unwrap();
        drop(session);

        let state = Arc::clone(&gateway.state);
        let poisoned = std::thread::spawn(move || {
            let _guard = state.lock().unwrap();
            panic!("poison the store");
        })
        .join();
        assert!(poisoned.is_err());
        assert!(gateway.state.is_poisoned());

        assert_eq!(gateway.committed().len(), 1);
        gateway.set_fault(Some(Fault::Unreachable));
        assert_eq!(gateway.inspect().fault, Some(Fault::Unreachable));
        assert!(!gateway.open_session().await.err().unwrap().is_storage());
    }
}
