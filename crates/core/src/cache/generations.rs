//! Cache generation registry.
//!
//! A generation is a named set of entries for one deployed asset version.
//! Opening the current generation creates it on first use; activation then
//! deletes every other generation so exactly one remains queryable.

use super::connection::CacheDb;
use super::entries::Generation;
use crate::Error;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// Summary of one stored generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GenerationInfo {
    pub name: String,
    pub created_at: String,
    pub entries: u64,
}

impl CacheDb {
    /// Open a generation, creating it if it does not exist yet.
    pub async fn open_generation(&self, name: &str) -> Result<Generation, Error> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("generation name cannot be empty".into()));
        }

        let owned = name.to_string();
        let created_at = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![owned, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(Generation::new(self.clone(), name))
    }

    /// Handle to a generation without creating it.
    ///
    /// Reads from a missing generation find nothing; writes fail.
    pub fn generation(&self, name: &str) -> Generation {
        Generation::new(self.clone(), name)
    }

    /// List generations, oldest first, with their entry counts.
    pub async fn list_generations(&self) -> Result<Vec<GenerationInfo>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<GenerationInfo>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT g.name, g.created_at, COUNT(e.key_hash)
                     FROM generations g
                     LEFT JOIN entries e ON e.generation = g.name
                     GROUP BY g.name
                     ORDER BY g.created_at ASC, g.name ASC",
                )?;

                let rows = stmt.query_map([], |row| {
                    Ok(GenerationInfo {
                        name: row.get(0)?,
                        created_at: row.get(1)?,
                        entries: row.get::<_, i64>(2)? as u64,
                    })
                })?;

                let infos = rows.collect::<Result<Vec<_>, _>>()?;
                Ok(infos)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn has_generation(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM generations WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every generation except `current`, returning the deleted names.
    ///
    /// Entries go with their generation through the foreign-key cascade.
    pub async fn delete_generations_except(&self, current: &str) -> Result<Vec<String>, Error> {
        let current = current.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let tx = conn.transaction()?;
                let doomed = {
                    let mut stmt = tx.prepare("SELECT name FROM generations WHERE name != ?1 ORDER BY name")?;
                    let names = stmt.query_map(params![current], |row| row.get::<_, String>(0))?;
                    names.collect::<Result<Vec<_>, _>>()?
                };
                tx.execute("DELETE FROM generations WHERE name != ?1", params![current])?;
                tx.commit()?;
                Ok(doomed)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete one generation. Returns false if it did not exist.
    pub async fn delete_generation(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM generations WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }
}
