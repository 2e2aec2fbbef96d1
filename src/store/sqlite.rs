use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::oneshot;

use super::migrations::run_migrations;
use super::SessionStore;
use crate::models::{Session, SessionStatus};

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct StoreInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                error!("Failed to send shutdown to DB thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join DB thread: {join_err:?}");
            }
        }
    }
}

/// SQLite-backed session store. All statements run on a dedicated worker
/// thread; async callers are bridged over a oneshot reply channel.
#[derive(Clone)]
pub struct SqliteSessionStore {
    inner: Arc<StoreInner>,
    db_path: Arc<PathBuf>,
}

impl SqliteSessionStore {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let path_for_thread = db_path.clone();

        let worker = thread::Builder::new()
            .name("shelfwatch-db".into())
            .spawn(move || {
                let mut conn = match Connection::open(&path_for_thread) {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(Err(anyhow::Error::new(err)
                            .context("failed to open SQLite database")));
                        return;
                    }
                };

                if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                    error!("Failed to enable WAL mode: {err}");
                }

                let init_result =
                    run_migrations(&mut conn).context("failed to run database migrations");
                if ready_tx.send(init_result).is_err() {
                    error!("DB initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => {
                            task(&mut conn);
                        }
                        DbCommand::Shutdown => break,
                    }
                }

                info!("Session store thread shutting down");
            })
            .with_context(|| "failed to spawn database worker thread")?;

        ready_rx
            .recv()
            .context("database worker exited before signaling readiness")??;

        info!("Session store initialized at {}", db_path.as_path().display());

        Ok(Self {
            inner: Arc::new(StoreInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.inner.sender.clone();
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("DB caller dropped before receiving result");
            }
        }));

        sender
            .send(command)
            .map_err(|err| anyhow!("failed to send command to DB thread: {err}"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("database thread terminated unexpectedly"))?
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, camera_key, started_at, ended_at, status, items
                 FROM sessions
                 WHERE id = ?1",
            )?;
            stmt.query_row(params![session_id], |row| Ok(row_to_session(row)))
                .optional()
                .with_context(|| "failed to query session")?
                .transpose()
        })
        .await
    }

    pub async fn list_sessions(&self, camera_key: &str) -> Result<Vec<Session>> {
        let camera_key = camera_key.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, camera_key, started_at, ended_at, status, items
                 FROM sessions
                 WHERE camera_key = ?1
                 ORDER BY started_at ASC",
            )?;
            let rows = stmt.query_map(params![camera_key], |row| Ok(row_to_session(row)))?;

            let mut sessions = Vec::new();
            for row in rows {
                sessions.push(row??);
            }
            Ok(sessions)
        })
        .await
    }
}

fn row_to_session(row: &Row) -> Result<Session> {
    let started_at: String = row.get("started_at")?;
    let ended_at: Option<String> = row.get("ended_at")?;
    let status: String = row.get("status")?;
    let items: String = row.get("items")?;

    let session = Session {
        id: row.get("id")?,
        camera_key: row.get("camera_key")?,
        started: parse_datetime(&started_at, "started_at")?,
        ended: parse_optional_datetime(ended_at, "ended_at")?,
        items: serde_json::from_str(&items).context("failed to decode items column")?,
    };

    // The status column is derived data for external readers. A value that
    // disagrees with the timestamps means an unmodeled writer touched the
    // record; fail loudly rather than guess.
    let stored_status = parse_status(&status)?;
    if stored_status != session.status() {
        return Err(anyhow!(
            "session {} has status '{status}' but {} end timestamp",
            session.id,
            if session.ended.is_some() { "an" } else { "no" }
        ));
    }

    Ok(session)
}

fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

fn parse_optional_datetime(value: Option<String>, field: &str) -> Result<Option<DateTime<Utc>>> {
    match value {
        Some(raw) => parse_datetime(&raw, field).map(Some),
        None => Ok(None),
    }
}

fn parse_status(value: &str) -> Result<SessionStatus> {
    match value {
        "IN_PROGRESS" => Ok(SessionStatus::InProgress),
        "COMPLETED" => Ok(SessionStatus::Completed),
        other => Err(anyhow!("unknown session status '{other}'")),
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn upsert(&self, session: &Session) -> Result<()> {
        let record = session.clone();
        self.execute(move |conn| {
            let items =
                serde_json::to_string(&record.items).context("failed to encode items column")?;
            conn.execute(
                "INSERT INTO sessions (id, camera_key, started_at, ended_at, status, items, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                     camera_key = excluded.camera_key,
                     started_at = excluded.started_at,
                     ended_at = excluded.ended_at,
                     status = excluded.status,
                     items = excluded.items,
                     updated_at = excluded.updated_at",
                params![
                    record.id,
                    record.camera_key,
                    record.started.to_rfc3339(),
                    record.ended.as_ref().map(|dt| dt.to_rfc3339()),
                    record.status().as_str(),
                    items,
                    Utc::now().to_rfc3339(),
                ],
            )
            .with_context(|| format!("failed to upsert session {}", record.id))?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            // Deleting an id that is not present is a successful no-op.
            conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id])
                .with_context(|| format!("failed to delete session {session_id}"))?;
            Ok(())
        })
        .await
    }
}
