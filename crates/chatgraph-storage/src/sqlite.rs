//! SQLite implementation of [`TeamStore`].
//!
//! Records map to one row per entity; the user's insertion-ordered channel
//! set persists as a JSON array column. The connection sits behind a
//! `std::sync::Mutex` so the store is `Sync`; every operation is a single
//! short-lived statement, so the lock is never held long.

use std::sync::{Mutex, MutexGuard};

use indexmap::IndexSet;
use rusqlite::{Connection, OptionalExtension};

use chatgraph_core::id::{ChannelId, RemoteId, UserId};
use chatgraph_core::record::{ChannelRecord, UserRecord};

use crate::error::StorageError;
use crate::schema;
use crate::traits::TeamStore;

/// SQLite-backed implementation of [`TeamStore`].
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the store at `path`, applying pending migrations.
    pub fn new(path: &str) -> Result<Self, StorageError> {
        Ok(SqliteStore {
            conn: Mutex::new(schema::open_database(path)?),
        })
    }

    /// Opens an in-memory store (for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        Ok(SqliteStore {
            conn: Mutex::new(schema::open_in_memory()?),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::ConnectionPoisoned)
    }

    fn channel_from_row(
        id: String,
        name: String,
        gc_id: Option<String>,
    ) -> ChannelRecord {
        ChannelRecord {
            id: ChannelId(id),
            name,
            gc_id: gc_id.map(RemoteId),
        }
    }

    fn user_from_row(
        id: String,
        name: String,
        gc_id: Option<String>,
        channels: String,
    ) -> Result<UserRecord, StorageError> {
        let channels: IndexSet<ChannelId> = serde_json::from_str(&channels)?;
        Ok(UserRecord {
            id: UserId(id),
            name,
            gc_id: gc_id.map(RemoteId),
            channels,
        })
    }
}

impl TeamStore for SqliteStore {
    fn user(&self, id: &UserId) -> Result<Option<UserRecord>, StorageError> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT id, name, gc_id, channels FROM users WHERE id = ?1",
                [id.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;
        match row {
            Some((id, name, gc_id, channels)) => {
                Ok(Some(Self::user_from_row(id, name, gc_id, channels)?))
            }
            None => Ok(None),
        }
    }

    fn put_user(&mut self, record: &UserRecord) -> Result<(), StorageError> {
        let channels = serde_json::to_string(&record.channels)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO users (id, name, gc_id, channels) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                record.id.as_str(),
                record.name,
                record.gc_id.as_ref().map(|g| g.as_str()),
                channels,
            ],
        )?;
        Ok(())
    }

    fn channel(&self, id: &ChannelId) -> Result<Option<ChannelRecord>, StorageError> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT id, name, gc_id FROM channels WHERE id = ?1",
                [id.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()?;
        Ok(row.map(|(id, name, gc_id)| Self::channel_from_row(id, name, gc_id)))
    }

    fn put_channel(&mut self, record: &ChannelRecord) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO channels (id, name, gc_id) VALUES (?1, ?2, ?3)",
            rusqlite::params![
                record.id.as_str(),
                record.name,
                record.gc_id.as_ref().map(|g| g.as_str()),
            ],
        )?;
        Ok(())
    }

    fn find_channels_by_name(&self, name: &str) -> Result<Vec<ChannelRecord>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT id, name, gc_id FROM channels WHERE name = ?1 ORDER BY id")?;
        let rows = stmt.query_map([name], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, name, gc_id) = row?;
            out.push(Self::channel_from_row(id, name, gc_id));
        }
        Ok(out)
    }

    fn users(&self) -> Result<Vec<UserRecord>, StorageError> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, name, gc_id, channels FROM users ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, name, gc_id, channels) = row?;
            out.push(Self::user_from_row(id, name, gc_id, channels)?);
        }
        Ok(out)
    }

    fn channels(&self) -> Result<Vec<ChannelRecord>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, name, gc_id FROM channels ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, name, gc_id) = row?;
            out.push(Self::channel_from_row(id, name, gc_id));
        }
        Ok(out)
    }
}
