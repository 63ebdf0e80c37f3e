//! # Scripted Executor
//!
//! An in-memory [`Database`] for tests. Every statement sent through any of
//! its sessions is recorded with its parameters. Data statements are
//! answered from a queue of scripted results; `BEGIN`, `COMMIT` and
//! `ROLLBACK` are answered with an empty result without consuming the
//! queue. Any statement whose text contains a registered fragment fails,
//! or never returns. Sessions keep the same transaction bookkeeping as the
//! Postgres executor and count themselves as discarded when dropped in a
//! state that would close a real connection.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, MutexGuard};

use crate::error::DbError;
use crate::executor::{Database, QueryResult, Row, Session, SqlParam, TransactionState};

/// A statement as it reached the executor.
#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

#[derive(Debug)]
enum Scripted {
    Rows(Vec<Row>),
    Fail(String),
}

#[derive(Debug, Default)]
struct Script {
    log: Vec<Executed>,
    queue: VecDeque<Scripted>,
    failing_fragments: Vec<String>,
    hanging_fragments: Vec<String>,
    acquisitions: usize,
    discarded: usize,
}

/// Recording, scriptable [`Database`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedDatabase {
    script: Arc<Mutex<Script>>,
}

impl ScriptedDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock()
    }

    /// Queue the rows returned by the next data statement.
    pub fn push_rows(&self, rows: Vec<Row>) -> &Self {
        self.lock().queue.push_back(Scripted::Rows(rows));
        self
    }

    /// Queue a failure for the next data statement.
    pub fn push_failure(&self, message: &str) -> &Self {
        self.lock().queue.push_back(Scripted::Fail(message.to_string()));
        self
    }

    /// Fail every statement whose text contains `fragment`.
    pub fn fail_on(&self, fragment: &str) -> &Self {
        self.lock().failing_fragments.push(fragment.to_string());
        self
    }

    /// Never answer a statement whose text contains `fragment`.
    pub fn hang_on(&self, fragment: &str) -> &Self {
        self.lock().hanging_fragments.push(fragment.to_string());
        self
    }

    /// Everything executed so far.
    pub fn executed(&self) -> Vec<Executed> {
        self.lock().log.clone()
    }

    /// Statement texts executed so far, trimmed.
    pub fn statements(&self) -> Vec<String> {
        self.lock()
            .log
            .iter()
            .map(|e| e.sql.trim().to_string())
            .collect()
    }

    /// Number of sessions handed out.
    pub fn acquisitions(&self) -> usize {
        self.lock().acquisitions
    }

    /// Number of sessions dropped mid-transaction or mid-statement.
    pub fn discarded(&self) -> usize {
        self.lock().discarded
    }
}

#[async_trait]
impl Database for ScriptedDatabase {
    async fn acquire(&self) -> Result<Box<dyn Session>, DbError> {
        self.lock().acquisitions += 1;
        Ok(Box::new(ScriptedSession {
            script: Arc::clone(&self.script),
            state: TransactionState::default(),
        }))
    }
}

struct ScriptedSession {
    script: Arc<Mutex<Script>>,
    state: TransactionState,
}

impl ScriptedSession {
    /// The scripted answer, or `None` for a statement that hangs.
    fn respond(&self, sql: &str, params: &[SqlParam]) -> Option<Result<QueryResult, DbError>> {
        let mut script = self.script.lock();
        script.log.push(Executed {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        if script
            .hanging_fragments
            .iter()
            .any(|fragment| sql.contains(fragment.as_str()))
        {
            return None;
        }
        if let Some(fragment) = script
            .failing_fragments
            .iter()
            .find(|fragment| sql.contains(fragment.as_str()))
        {
            return Some(Err(DbError::Other(format!(
                "scripted failure on {fragment:?}"
            ))));
        }
        let control = matches!(sql.trim(), "BEGIN" | "COMMIT" | "ROLLBACK");
        if control {
            return Some(Ok(QueryResult::empty()));
        }
        Some(match script.queue.pop_front() {
            Some(Scripted::Rows(rows)) => Ok(QueryResult::from_rows(rows)),
            Some(Scripted::Fail(message)) => Err(DbError::Other(message)),
            None => Ok(QueryResult::empty()),
        })
    }
}

#[async_trait]
impl Session for ScriptedSession {
    async fn query(&mut self, sql: &str, params: &[SqlParam]) -> Result<QueryResult, DbError> {
        self.state.started();
        let Some(outcome) = self.respond(sql, params) else {
            return std::future::pending().await;
        };
        self.state.finished(sql, &outcome);
        outcome
    }
}

impl Drop for ScriptedSession {
    fn drop(&mut self) {
        if self.state.must_discard() {
            self.script.lock().discarded += 1;
        }
    }
}
