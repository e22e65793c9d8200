//! SQLite-backed vector and conversation stores
//!
//! Connections sit behind a mutex and every query runs on the blocking pool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::embeddings::{cosine_similarity, parse_vector_literal, Embedding};
use crate::error::{Error, Result};
use crate::providers::conversation_store::ConversationStore;
use crate::providers::vector_store::VectorStoreProvider;
use crate::types::{Conversation, DocumentRow, Message, RetrievedChunk, Role};

fn open_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path).map_err(|e| {
        Error::Internal(format!("Failed to open database {}: {}", path.display(), e))
    })?;
    conn.execute_batch(
        r#"
        PRAGMA journal_mode=WAL;
        PRAGMA synchronous=NORMAL;
        PRAGMA foreign_keys=ON;
        "#,
    )
    .map_err(|e| Error::Internal(format!("Failed to set pragmas: {}", e)))?;
    Ok(conn)
}

fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()
        .map_err(|e| Error::Internal(format!("Failed to open in-memory database: {}", e)))?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")
        .map_err(|e| Error::Internal(format!("Failed to set pragmas: {}", e)))?;
    Ok(conn)
}

/// Run `f` against the locked connection on the blocking pool
async fn blocking<T, F>(conn: &Arc<Mutex<Connection>>, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
{
    let conn = conn.clone();
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.lock();
        f(&mut guard)
    })
    .await
    .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
}

/// Exact-search vector store in a single SQLite file
///
/// Embeddings are stored as little-endian f32 blobs. Search scans every row,
/// which is adequate for a single institution's document set.
pub struct SqliteVectorStore {
    conn: Arc<Mutex<Connection>>,
    dimensions: usize,
}

impl SqliteVectorStore {
    /// Create or open the store at `path`
    pub fn open(path: impl AsRef<Path>, dimensions: usize) -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(open_connection(path.as_ref())?)),
            dimensions,
        };
        store.migrate()?;
        Ok(store)
    }

    /// Create an in-memory store
    pub fn in_memory(dimensions: usize) -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(open_in_memory()?)),
            dimensions,
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content TEXT NOT NULL,
                content_hash TEXT NOT NULL UNIQUE,
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| Error::Internal(format!("Failed to run migrations: {}", e)))?;
        Ok(())
    }

    /// Nearest rows to a vector literal such as `[0.1,0.2,...]`, best first
    ///
    /// Ties keep insertion order. Zero `match_count` or an empty table gives no rows.
    pub async fn match_documents(
        &self,
        query_embedding: &str,
        match_count: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        let query = parse_vector_literal(query_embedding)?;
        if query.len() != self.dimensions {
            return Err(Error::vector_db(format!(
                "query has {} dimensions, store holds {}",
                query.len(),
                self.dimensions
            )));
        }
        if match_count == 0 {
            return Ok(Vec::new());
        }

        let dimensions = self.dimensions;
        blocking(&self.conn, move |conn| {
            let mut stmt = conn.prepare("SELECT content, embedding FROM documents ORDER BY id")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
            })?;

            let mut scored = Vec::new();
            for row in rows {
                let (content, blob) = row?;
                let embedding = Embedding::from_le_bytes(&blob, dimensions)?;
                let similarity = cosine_similarity(&query, embedding.as_slice());
                scored.push((content, similarity));
            }

            // Stable sort keeps insertion order among equal scores
            scored.sort_by(|a, b| b.1.total_cmp(&a.1));

            Ok(scored
                .into_iter()
                .take(match_count)
                .enumerate()
                .map(|(i, (content, similarity))| RetrievedChunk {
                    content,
                    rank: i + 1,
                    similarity,
                })
                .collect())
        })
        .await
    }
}

#[async_trait]
impl VectorStoreProvider for SqliteVectorStore {
    async fn insert_rows(&self, rows: &[DocumentRow]) -> Result<usize> {
        if let Some(bad) = rows
            .iter()
            .find(|r| r.embedding.dimensions() != self.dimensions)
        {
            return Err(Error::vector_db(format!(
                "embedding has {} dimensions, store holds {}",
                bad.embedding.dimensions(),
                self.dimensions
            )));
        }

        let rows: Vec<(String, String, Vec<u8>)> = rows
            .iter()
            .map(|r| (r.content.clone(), r.content_hash.clone(), r.embedding.to_le_bytes()))
            .collect();

        blocking(&self.conn, move |conn| {
            let tx = conn.transaction()?;
            let now = Utc::now();
            let mut inserted = 0;
            {
                // Content already stored is skipped and not counted
                let mut stmt = tx.prepare(
                    "INSERT OR IGNORE INTO documents (content, content_hash, embedding, created_at)
                     VALUES (?1, ?2, ?3, ?4)",
                )?;
                for (content, hash, blob) in &rows {
                    inserted += stmt.execute(params![content, hash, blob, now])?;
                }
            }
            tx.commit()?;
            Ok(inserted)
        })
        .await
    }

    async fn contains_hash(&self, content_hash: &str) -> Result<bool> {
        let hash = content_hash.to_string();
        blocking(&self.conn, move |conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM documents WHERE content_hash = ?1)",
                params![hash],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
        .await
    }

    async fn search(&self, query: &Embedding, top_k: usize) -> Result<Vec<RetrievedChunk>> {
        self.match_documents(&query.to_literal(), top_k).await
    }

    async fn len(&self) -> Result<usize> {
        blocking(&self.conn, |conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
            Ok(count as usize)
        })
        .await
    }

    async fn health_check(&self) -> Result<bool> {
        blocking(&self.conn, |conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(true)
        })
        .await
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

fn store_err(e: rusqlite::Error) -> Error {
    Error::ConversationStore(e.to_string())
}

fn read_conversation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

/// Conversation history in SQLite
pub struct SqliteConversationStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteConversationStore {
    /// Create or open the store at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(open_connection(path.as_ref())?)),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Create an in-memory store
    pub fn in_memory() -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(open_in_memory()?)),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_conversations_user ON conversations(user_id);

            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id TEXT NOT NULL REFERENCES conversations(id),
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_messages_conversation ON messages(conversation_id, id);
            "#,
        )
        .map_err(|e| Error::Internal(format!("Failed to run migrations: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for SqliteConversationStore {
    async fn create_conversation(&self, user_id: &str, title: &str) -> Result<Conversation> {
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        };

        let row = conversation.clone();
        blocking(&self.conn, move |conn| {
            conn.execute(
                "INSERT INTO conversations (id, user_id, title, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![row.id, row.user_id, row.title, row.created_at, row.updated_at],
            )
            .map_err(store_err)?;
            Ok(())
        })
        .await?;

        Ok(conversation)
    }

    async fn touch_conversation(&self, user_id: &str, conversation_id: &str) -> Result<Conversation> {
        let user_id = user_id.to_string();
        let id = conversation_id.to_string();
        blocking(&self.conn, move |conn| {
            let now: DateTime<Utc> = Utc::now();
            let changed = conn
                .execute(
                    "UPDATE conversations SET updated_at = ?3 WHERE id = ?1 AND user_id = ?2",
                    params![id, user_id, now],
                )
                .map_err(store_err)?;
            if changed == 0 {
                return Err(Error::ConversationNotFound(id.clone()));
            }

            conn.query_row(
                "SELECT id, user_id, title, created_at, updated_at FROM conversations WHERE id = ?1",
                params![id],
                read_conversation,
            )
            .optional()
            .map_err(store_err)?
            .ok_or_else(|| Error::ConversationNotFound(id.clone()))
        })
        .await
    }

    async fn append_message(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str,
    ) -> Result<Message> {
        let message = Message::new(role, content);
        let id = conversation_id.to_string();
        let row = message.clone();
        blocking(&self.conn, move |conn| {
            conn.execute(
                "INSERT INTO messages (conversation_id, role, content, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, row.role.as_str(), row.content, row.created_at],
            )
            .map_err(store_err)?;
            Ok(())
        })
        .await?;
        Ok(message)
    }

    async fn recent_messages(&self, conversation_id: &str, limit: usize) -> Result<Vec<Message>> {
        let id = conversation_id.to_string();
        blocking(&self.conn, move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT role, content, created_at FROM messages
                     WHERE conversation_id = ?1 ORDER BY id DESC LIMIT ?2",
                )
                .map_err(store_err)?;
            let rows = stmt
                .query_map(params![id, limit as i64], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, DateTime<Utc>>(2)?,
                    ))
                })
                .map_err(store_err)?;

            let mut messages = Vec::new();
            for row in rows {
                let (role, content, created_at) = row.map_err(store_err)?;
                let role = Role::parse(&role).ok_or_else(|| {
                    Error::ConversationStore(format!("unknown message role '{}'", role))
                })?;
                messages.push(Message {
                    role,
                    content,
                    created_at,
                });
            }
            messages.reverse();
            Ok(messages)
        })
        .await
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(dims: usize, hot: usize) -> Embedding {
        let mut v = vec![0.0; dims];
        v[hot] = 1.0;
        Embedding::new(v, dims).unwrap()
    }

    #[tokio::test]
    async fn test_empty_store_searches_to_nothing() {
        let store = SqliteVectorStore::in_memory(4).unwrap();
        assert!(store.is_empty().await.unwrap());
        assert!(store.search(&unit(4, 0), 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_self_match_ranks_first() {
        let store = SqliteVectorStore::in_memory(4).unwrap();
        let rows = vec![
            DocumentRow::new("hostel rules", unit(4, 0)),
            DocumentRow::new("exam schedule", unit(4, 1)),
            DocumentRow::new("fee structure", Embedding::new(vec![0.6, 0.0, 0.8, 0.0], 4).unwrap()),
        ];
        assert_eq!(store.insert_rows(&rows).await.unwrap(), 3);
        assert_eq!(store.len().await.unwrap(), 3);

        let query = Embedding::new(vec![0.6, 0.0, 0.8, 0.0], 4).unwrap();
        let hits = store.search(&query, 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].content, "fee structure");
        assert_eq!(hits[0].rank, 1);
        assert!((hits[0].similarity - 1.0).abs() < 1e-6);
        assert_eq!(hits[1].content, "hostel rules");
        assert_eq!(hits[1].rank, 2);
    }

    #[tokio::test]
    async fn test_match_documents_takes_a_literal() {
        let store = SqliteVectorStore::in_memory(3).unwrap();
        store
            .insert_rows(&[DocumentRow::new("library hours", unit(3, 2))])
            .await
            .unwrap();

        let hits = store.match_documents("[0,0,1]", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "library hours");

        assert!(store.match_documents("[0,1]", 5).await.is_err());
        assert!(store.match_documents("0,0,1", 5).await.is_err());
        assert!(store.match_documents("[0,0,1]", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_identical_content_is_stored_once() {
        let store = SqliteVectorStore::in_memory(2).unwrap();
        let row = DocumentRow::new("library opens at 8 am", unit(2, 0));

        let inserted = store
            .insert_rows(&[row.clone(), row.clone(), DocumentRow::new("gym", unit(2, 1))])
            .await
            .unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(store.insert_rows(&[row]).await.unwrap(), 0);
        assert_eq!(store.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let store = SqliteVectorStore::in_memory(2).unwrap();
        let same = Embedding::new(vec![1.0, 1.0], 2).unwrap();
        store
            .insert_rows(&[
                DocumentRow::new("first", same.clone()),
                DocumentRow::new("second", same.clone()),
            ])
            .await
            .unwrap();
        let hits = store.search(&same, 2).await.unwrap();
        assert_eq!(hits[0].content, "first");
        assert_eq!(hits[1].content, "second");
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_rejected() {
        let store = SqliteVectorStore::in_memory(4).unwrap();
        let err = store
            .insert_rows(&[DocumentRow::new("x", unit(3, 0))])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::VectorDb(_)));
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_contains_hash() {
        let store = SqliteVectorStore::in_memory(2).unwrap();
        let row = DocumentRow::new("admission deadline is 30 June", unit(2, 0));
        let hash = row.content_hash.clone();
        assert!(!store.contains_hash(&hash).await.unwrap());
        store.insert_rows(&[row]).await.unwrap();
        assert!(store.contains_hash(&hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_store_persists_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("documents.db");
        {
            let store = SqliteVectorStore::open(&path, 2).unwrap();
            store
                .insert_rows(&[DocumentRow::new("placement cell", unit(2, 1))])
                .await
                .unwrap();
        }
        let reopened = SqliteVectorStore::open(&path, 2).unwrap();
        assert_eq!(reopened.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_conversation_lifecycle() {
        let store = SqliteConversationStore::in_memory().unwrap();
        let conv = store.create_conversation("u1", "Fees").await.unwrap();

        for i in 0..5 {
            store
                .append_message(&conv.id, Role::User, &format!("q{}", i))
                .await
                .unwrap();
            store
                .append_message(&conv.id, Role::Assistant, &format!("a{}", i))
                .await
                .unwrap();
        }

        let recent = store.recent_messages(&conv.id, 4).await.unwrap();
        let contents: Vec<_> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["q3", "a3", "q4", "a4"]);
        assert_eq!(recent[0].role, Role::User);

        let touched = store.touch_conversation("u1", &conv.id).await.unwrap();
        assert_eq!(touched.title, "Fees");
        assert!(touched.updated_at >= conv.updated_at);
    }

    #[tokio::test]
    async fn test_foreign_conversation_is_not_found() {
        let store = SqliteConversationStore::in_memory().unwrap();
        let conv = store.create_conversation("owner", "Hostel").await.unwrap();

        assert!(matches!(
            store.touch_conversation("intruder", &conv.id).await,
            Err(Error::ConversationNotFound(_))
        ));
        assert!(matches!(
            store.touch_conversation("owner", "missing").await,
            Err(Error::ConversationNotFound(_))
        ));
        assert!(store.recent_messages("missing", 8).await.unwrap().is_empty());
    }
}
