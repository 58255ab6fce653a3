use chrono::{DateTime, Utc};
use tracing::warn;

use crate::domain::{FeedState, StateMap};
use crate::errors::TailResult;
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::StateStore;

pub struct SqliteStateStore {
    storage: SqliteStorage,
}

impl SqliteStateStore {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }
}

impl StateStore for SqliteStateStore {
    fn load(&self) -> TailResult<StateMap> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare("SELECT url, etag, last_modified, updated FROM feed_state")?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;

        let mut states = StateMap::new();
        for row in rows {
            let (url, etag, last_modified, updated) = row?;
            let updated = match updated {
                Some(raw) => match DateTime::parse_from_rfc3339(&raw) {
                    Ok(dt) => Some(dt.with_timezone(&Utc)),
                    Err(e) => {
                        warn!("ignoring stored timestamp {:?} for {}: {}", raw, url, e);
                        None
                    }
                },
                None => None,
            };

            states.insert(
                url,
                FeedState {
                    etag,
                    last_modified,
                    updated,
                },
            );
        }

        Ok(states)
    }

    fn save(&self, states: &StateMap) -> TailResult<()> {
        let mut conn = self.storage.connection()?;
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO feed_state (url, etag, last_modified, updated)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(url) DO UPDATE SET
                    etag = excluded.etag,
                    last_modified = excluded.last_modified,
                    updated = excluded.updated",
            )?;

            for (url, state) in states {
                stmt.execute((
                    url,
                    &state.etag,
                    &state.last_modified,
                    state.updated.map(|dt| dt.to_rfc3339()),
                ))?;
            }
        }

        tx.commit()?;
        Ok(())
    }
}
