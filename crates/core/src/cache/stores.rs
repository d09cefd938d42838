//! `CacheStorage` implementation for the SQLite provider.
//!
//! Stores live in the `stores` table; entries reference their store with
//! `ON DELETE CASCADE`, so deleting a store removes it in its entirety.

use super::connection::CacheDb;
use super::{CacheStorage, RequestKey};
use crate::Error;
use crate::http::{ResponseSnapshot, ResponseType};
use bytes::Bytes;
use chrono::Utc;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

fn insert_entry(
    conn: &rusqlite::Connection, store: &str, key: &RequestKey, response: &ResponseSnapshot, now: &str,
) -> Result<(), Error> {
    let headers_json =
        serde_json::to_string(&response.headers).map_err(|e| Error::InvalidInput(format!("headers: {e}")))?;

    conn.execute(
        "INSERT INTO entries (
            store, key_hash, method, url, status, status_text, response_url,
            response_type, headers_json, body, stored_at, seq
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                  (SELECT COALESCE(MAX(seq), 0) + 1 FROM entries WHERE store = ?1))
        ON CONFLICT(store, key_hash) DO UPDATE SET
            status = excluded.status,
            status_text = excluded.status_text,
            response_url = excluded.response_url,
            response_type = excluded.response_type,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at,
            seq = excluded.seq",
        params![
            store,
            key.hash(),
            &key.method,
            &key.url,
            response.status,
            &response.status_text,
            &response.url,
            response.kind.as_str(),
            headers_json,
            &response.body[..],
            now,
        ],
    )?;
    Ok(())
}

fn decode_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(u16, String, String, String, String, Vec<u8>)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
}

#[async_trait::async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let created = conn.execute(
                    "INSERT OR IGNORE INTO stores (name, created_at, seq)
                     VALUES (?1, ?2, (SELECT COALESCE(MAX(seq), 0) + 1 FROM stores))",
                    params![name, now],
                )?;
                if created > 0 {
                    tracing::debug!(store = %name, "created store");
                }
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM stores WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM stores ORDER BY seq ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM stores WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn match_request(&self, name: &str, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        let name = name.to_string();
        let key_hash = key.hash();
        self.conn
            .call(move |conn| -> Result<Option<ResponseSnapshot>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT status, status_text, response_url, response_type, headers_json, body
                     FROM entries WHERE store = ?1 AND key_hash = ?2",
                )?;

                let (status, status_text, url, kind, headers_json, body) =
                    match stmt.query_row(params![name, key_hash], decode_row) {
                        Ok(row) => row,
                        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                        Err(e) => return Err(e.into()),
                    };

                let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)
                    .map_err(|e| Error::StoreUnavailable(format!("corrupt headers in {name}: {e}")))?;
                let kind: ResponseType = kind.parse().map_err(Error::StoreUnavailable)?;

                Ok(Some(ResponseSnapshot { url, status, status_text, headers, body: Bytes::from(body), kind }))
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, name: &str, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error> {
        let name = name.to_string();
        let key = key.clone();
        let response = response.clone();
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> { insert_entry(conn, &name, &key, &response, &now) })
            .await
            .map_err(Error::from)
    }

    async fn put_all(&self, name: &str, entries: &[(RequestKey, ResponseSnapshot)]) -> Result<(), Error> {
        let name = name.to_string();
        let entries = entries.to_vec();
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.unchecked_transaction()?;
                for (key, response) in &entries {
                    insert_entry(&tx, &name, key, response, &now)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn entries(&self, name: &str) -> Result<Vec<RequestKey>, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<RequestKey>, Error> {
                let mut stmt = conn.prepare("SELECT method, url FROM entries WHERE store = ?1 ORDER BY seq ASC")?;
                let keys = stmt
                    .query_map(params![name], |row| Ok(RequestKey { method: row.get(0)?, url: row.get(1)? }))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }
}
