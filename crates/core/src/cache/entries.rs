//! Entry reads and writes scoped to one generation.

use super::connection::CacheDb;
use super::hash::compute_key_hash;
use crate::{Error, ResponseRecord};
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A persisted response.
///
/// Entries are immutable: writing the same key again replaces the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub response: ResponseRecord,
    pub inserted_at: String,
}

/// Handle to one named generation.
///
/// Every read and write is confined to this generation's rows.
#[derive(Debug, Clone)]
pub struct Generation {
    db: CacheDb,
    name: String,
}

impl Generation {
    pub(crate) fn new(db: CacheDb, name: &str) -> Self {
        Self { db, name: name.to_string() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up an entry by key.
    pub async fn get(&self, key: &str) -> Result<Option<CacheEntry>, Error> {
        let generation = self.name.clone();
        let key_hash = compute_key_hash(key);
        self.db
            .conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let result = conn.query_row(
                    "SELECT key, status, headers_json, body, inserted_at
                     FROM entries WHERE generation = ?1 AND key_hash = ?2",
                    params![generation, key_hash],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, Vec<u8>>(3)?,
                            row.get::<_, String>(4)?,
                        ))
                    },
                );

                match result {
                    Ok((key, status, headers_json, body, inserted_at)) => {
                        let status = u16::try_from(status)
                            .map_err(|_| Error::CorruptEntry(format!("status {status} out of range")))?;
                        let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)?;
                        Ok(Some(CacheEntry {
                            key,
                            response: ResponseRecord { status, headers, body: Bytes::from(body) },
                            inserted_at,
                        }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace the entry for `key`. Last write wins.
    ///
    /// Fails if the generation was deleted after this handle was opened.
    pub async fn put(&self, key: &str, response: &ResponseRecord) -> Result<(), Error> {
        let generation = self.name.clone();
        let key = key.to_string();
        let key_hash = compute_key_hash(&key);
        let headers_json = serde_json::to_string(&response.headers)?;
        let status = i64::from(response.status);
        let body = response.body.to_vec();
        let inserted_at = Utc::now().to_rfc3339();

        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO entries (generation, key_hash, key, status, headers_json, body, inserted_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(generation, key_hash) DO UPDATE SET
                        key = excluded.key,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        inserted_at = excluded.inserted_at",
                    params![generation, key_hash, key, status, headers_json, body, inserted_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in this generation.
    pub async fn len(&self) -> Result<u64, Error> {
        let generation = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries WHERE generation = ?1",
                    params![generation],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len().await? == 0)
    }
}
