//! SQLite-backed document store: authors directory + document retrieval.
//!
//! The connection is opened lazily on the first call and guarded by a
//! [`ManagedConnection`]; a missing or unreadable database file is reported
//! as `SourceUnavailable`, not as an empty result.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OpenFlags};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::adapter::{name_matcher, DocumentRetrieval, Documents, EntityDirectory};
use crate::connection::{ConnectionStatus, Connector, ManagedConnection};
use crate::schema::SCHEMA_SQL;
use crate::types::*;
use evidex_core::{Error, Expert, Result, StoreConfig};

/// Opens SQLite connections for a configured target.
pub struct SqliteConnector {
    path: PathBuf,
    target: String,
    create: bool,
}

impl SqliteConnector {
    pub fn new(path: impl AsRef<Path>, target: impl Into<String>, create: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            target: target.into(),
            create,
        }
    }
}

impl Connector for SqliteConnector {
    type Connection = Connection;

    fn connect(&self) -> Result<Connection> {
        let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if self.create {
            flags |= OpenFlags::SQLITE_OPEN_CREATE;
        }

        let conn = Connection::open_with_flags(&self.path, flags)
            .map_err(|e| classify(e, &self.target))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| classify(e, &self.target))?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;
        Ok(conn)
    }

    fn target(&self) -> String {
        self.target.clone()
    }
}

/// Map a SQLite failure onto the error taxonomy, at connect time and during
/// calls alike: anything that means the database cannot be reached is
/// `SourceUnavailable`, the rest is `Database`.
fn classify(e: rusqlite::Error, target: &str) -> Error {
    match &e {
        rusqlite::Error::SqliteFailure(err, _) => match err.code {
            ErrorCode::CannotOpen
            | ErrorCode::NotADatabase
            | ErrorCode::SystemIoFailure
            | ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::FileLockingProtocolFailed
            | ErrorCode::PermissionDenied => {
                Error::SourceUnavailable(format!("{}: {}", target, e))
            }
            _ => Error::Database(e.to_string()),
        },
        _ => Error::Database(e.to_string()),
    }
}

/// Document store over an embedded SQLite database.
pub struct SqliteDocumentStore {
    source: String,
    conn: ManagedConnection<SqliteConnector>,
}

impl SqliteDocumentStore {
    /// Store for an existing database named by `config`. Does not connect.
    pub fn open(config: &StoreConfig, source: impl Into<String>) -> Self {
        let connector = SqliteConnector::new(&config.database, config.describe(), false);
        Self {
            source: source.into(),
            conn: ManagedConnection::new(connector),
        }
    }

    /// Create (or open) a database file and connect immediately.
    pub fn create(path: impl AsRef<Path>, source: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let connector = SqliteConnector::new(path, path.display().to_string(), true);
        let store = Self {
            source: source.into(),
            conn: ManagedConnection::new(connector),
        };
        store.conn.connect()?;
        info!("SqliteDocumentStore ready at {}", path.display());
        Ok(store)
    }

    /// Source name experts are keyed by.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn status(&self) -> ConnectionStatus {
        self.conn.status()
    }

    pub fn close(&self) {
        self.conn.close();
    }

    // ---------------------------------------------------------------
    // Import
    // ---------------------------------------------------------------

    /// Write authors, documents and authorship links in one transaction.
    ///
    /// Author rows are appended as-is (duplicates included). Documents and
    /// links already present are left untouched.
    pub fn import(&self, batch: &ImportBatch) -> Result<ImportReport> {
        let fail = self.fail();
        self.conn.with_connection(|conn| {
            let tx = conn.transaction().map_err(&fail)?;
            let mut report = ImportReport::default();

            {
                let mut insert_author = tx
                    .prepare_cached("INSERT INTO authors (id, name) VALUES (?1, ?2)")
                    .map_err(&fail)?;
                for author in &batch.authors {
                    insert_author
                        .execute(params![author.id, author.name])
                        .map_err(&fail)?;
                    report.authors += 1;
                }

                let mut insert_doc = tx
                    .prepare_cached(
                        "INSERT OR IGNORE INTO documents (id, year, title, abstract, raw_json) \
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                    )
                    .map_err(&fail)?;
                let mut insert_link = tx
                    .prepare_cached(
                        "INSERT OR IGNORE INTO document_authors (document_id, author_id) \
                         VALUES (?1, ?2)",
                    )
                    .map_err(&fail)?;

                for doc in &batch.documents {
                    let id = doc.id.clone().unwrap_or_else(|| document_id(doc));
                    let raw = serde_json::to_string(doc)?;
                    report.documents += insert_doc
                        .execute(params![id, doc.year, doc.title, doc.abstract_text, raw])
                        .map_err(&fail)?;
                    for author in &doc.authors {
                        report.authorships += insert_link
                            .execute(params![id, author])
                            .map_err(&fail)?;
                    }
                }
            }

            tx.commit().map_err(&fail)?;
            info!(
                "Imported {} authors, {} documents, {} authorships",
                report.authors, report.documents, report.authorships
            );
            Ok(report)
        })
    }

    /// Count stored documents.
    pub fn count_documents(&self) -> Result<i64> {
        let fail = self.fail();
        self.conn.with_connection(|conn| {
            conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
                .map_err(&fail)
        })
    }

    // ---------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------

    /// Error mapper for calls against this store's target.
    fn fail(&self) -> impl Fn(rusqlite::Error) -> Error {
        let target = self.conn.connector().target();
        move |e| classify(e, &target)
    }

    fn load_experts(&self, conn: &Connection) -> Result<Vec<Expert>> {
        let fail = self.fail();
        let mut stmt = conn
            .prepare_cached("SELECT id, name FROM authors")
            .map_err(&fail)?;
        let rows = stmt
            .query_map([], |row| {
                let id: String = row.get("id")?;
                let name: String = row.get("name")?;
                Ok((id, name))
            })
            .map_err(&fail)?;

        let mut experts = Vec::new();
        for row in rows {
            let (id, name) = row.map_err(&fail)?;
            experts.push(Expert::new(id.clone(), name).with_source_identifier(&self.source, id));
        }
        Ok(experts)
    }

    /// Decode one `documents` row. A column of the wrong type is an error,
    /// never an absent field.
    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ExternalDocumentRecord> {
        let id: String = row.get("id")?;
        let year: Option<i32> = row.get("year")?;
        let title: Option<String> = row.get("title")?;
        let abstract_text: Option<String> = row.get("abstract")?;
        let raw = match row.get::<_, Option<String>>("raw_json")? {
            Some(s) => serde_json::from_str(&s).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e))
            })?,
            None => serde_json::json!({
                "id": id,
                "year": year,
                "title": title,
                "abstract": abstract_text,
            }),
        };
        Ok(ExternalDocumentRecord {
            year,
            title,
            abstract_text,
            raw,
        })
    }
}

impl EntityDirectory for SqliteDocumentStore {
    fn list_all(&self) -> Result<HashSet<Expert>> {
        self.conn.with_connection(|conn| {
            let experts: HashSet<Expert> = self.load_experts(conn)?.into_iter().collect();
            debug!("Listed {} experts", experts.len());
            Ok(experts)
        })
    }

    fn find_by_name(&self, pattern: &str) -> Result<HashSet<Expert>> {
        let matcher = name_matcher(pattern);
        self.conn.with_connection(|conn| {
            let experts: HashSet<Expert> = self
                .load_experts(conn)?
                .into_iter()
                .filter(|e| matcher.is_match(e.name()))
                .collect();
            debug!("{} experts match {:?}", experts.len(), pattern);
            Ok(experts)
        })
    }
}

impl DocumentRetrieval for SqliteDocumentStore {
    fn fetch_for(&self, expert: &Expert) -> Result<Documents> {
        let author_id = expert.id_in_source(&self.source).to_string();
        let fail = self.fail();
        let records = self.conn.with_connection(|conn| {
            let mut stmt = conn
                .prepare_cached(
                    "SELECT d.id, d.year, d.title, d.abstract, d.raw_json \
                     FROM documents d \
                     JOIN document_authors da ON da.document_id = d.id \
                     WHERE da.author_id = ?1",
                )
                .map_err(&fail)?;
            let rows = stmt
                .query_map(params![author_id], Self::row_to_record)
                .map_err(&fail)?;
            let records: Vec<ExternalDocumentRecord> = rows
                .collect::<std::result::Result<_, _>>()
                .map_err(&fail)?;
            Ok(records)
        })?;
        debug!("Fetched {} documents for {}", records.len(), author_id);
        Ok(Box::new(records.into_iter()))
    }
}

/// Content-derived id for documents imported without one.
pub fn document_id(doc: &DocumentRow) -> String {
    let mut hasher = Sha256::new();
    hasher.update(doc.year.map(|y| y.to_string()).unwrap_or_default().as_bytes());
    hasher.update([0u8]);
    hasher.update(doc.title.as_deref().unwrap_or("").as_bytes());
    hasher.update([0u8]);
    hasher.update(doc.abstract_text.as_deref().unwrap_or("").as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (SqliteDocumentStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = SqliteDocumentStore::create(dir.path().join("lexr.db"), "lexr").unwrap();
        (store, dir)
    }

    fn author(id: &str, name: &str) -> AuthorRow {
        AuthorRow {
            id: id.into(),
            name: name.into(),
        }
    }

    fn doc(id: Option<&str>, year: Option<i32>, title: &str, authors: &[&str]) -> DocumentRow {
        DocumentRow {
            id: id.map(str::to_string),
            year,
            title: Some(title.into()),
            abstract_text: None,
            authors: authors.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn test_list_all_collapses_duplicate_rows() {
        let (store, _dir) = test_store();
        store
            .import(&ImportBatch {
                authors: vec![
                    author("A1", "John Smith"),
                    author("A1", "JOHN SMITH"),
                    author("A2", "Bob Lee"),
                ],
                documents: vec![],
            })
            .unwrap();

        let experts = store.list_all().unwrap();
        assert_eq!(experts.len(), 2);
        let john = experts.iter().find(|e| e.id() == "A1").unwrap();
        assert_eq!(john.id_in_source("lexr"), "A1");
    }

    #[test]
    fn test_find_by_name() {
        let (store, _dir) = test_store();
        store
            .import(&ImportBatch {
                authors: vec![
                    author("A1", "John Smith"),
                    author("A2", "JANE SMITHE"),
                    author("A3", "Bob Lee"),
                ],
                documents: vec![],
            })
            .unwrap();

        let found = store.find_by_name("smith").unwrap();
        let mut ids: Vec<&str> = found.iter().map(|e| e.id()).collect();
        ids.sort();
        assert_eq!(ids, vec!["A1", "A2"]);

        assert!(store.find_by_name("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_fetch_for_author() {
        let (store, _dir) = test_store();
        let report = store
            .import(&ImportBatch {
                authors: vec![author("A1", "John Smith"), author("A2", "Bob Lee")],
                documents: vec![
                    doc(Some("d1"), Some(2020), "Graph Mining", &["A1", "A2"]),
                    doc(Some("d2"), None, "Untitled notes", &["A1"]),
                    doc(Some("d3"), Some(2018), "Other work", &["A2"]),
                ],
            })
            .unwrap();
        assert_eq!(report.documents, 3);
        assert_eq!(report.authorships, 4);

        let expert = Expert::new("A1", "John Smith").with_source_identifier("lexr", "A1");
        let mut docs: Vec<ExternalDocumentRecord> = store.fetch_for(&expert).unwrap().collect();
        docs.sort_by_key(|d| d.year);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].year, None);
        assert_eq!(docs[1].title.as_deref(), Some("Graph Mining"));
        assert_eq!(docs[1].raw["id"], "d1");
    }

    #[test]
    fn test_reimport_is_idempotent_for_documents() {
        let (store, _dir) = test_store();
        let batch = ImportBatch {
            authors: vec![],
            documents: vec![doc(None, Some(2020), "Graph Mining", &["A1"])],
        };
        store.import(&batch).unwrap();
        let again = store.import(&batch).unwrap();
        assert_eq!(again.documents, 0);
        assert_eq!(store.count_documents().unwrap(), 1);
    }

    #[test]
    fn test_missing_database_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig {
            host: "localhost".into(),
            port: 27017,
            database: dir.path().join("absent.db").display().to_string(),
        };
        let store = SqliteDocumentStore::open(&config, "lexr");
        assert_eq!(store.status(), ConnectionStatus::Disconnected);

        let err = store.list_all().unwrap_err();
        assert!(err.is_source_unavailable());

        let expert = Expert::new("A1", "John Smith");
        assert!(store.fetch_for(&expert).err().unwrap().is_source_unavailable());
    }

    #[test]
    fn test_closed_store_is_unavailable() {
        let (store, _dir) = test_store();
        store.close();
        assert!(store.list_all().unwrap_err().is_source_unavailable());
    }

    #[test]
    fn test_locked_database_drops_the_connection() {
        let (store, dir) = test_store();
        let one = |id: &str| ImportBatch {
            authors: vec![author(id, "John Smith")],
            documents: vec![],
        };
        store.import(&one("A1")).unwrap();

        let writer = Connection::open(dir.path().join("lexr.db")).unwrap();
        writer.execute_batch("BEGIN IMMEDIATE").unwrap();

        let err = store.import(&one("A2")).unwrap_err();
        assert!(err.is_source_unavailable(), "got {:?}", err);
        assert_eq!(store.status(), ConnectionStatus::Disconnected);

        writer.execute_batch("COMMIT").unwrap();
        assert_eq!(store.import(&one("A2")).unwrap().authors, 1);
        assert_eq!(store.status(), ConnectionStatus::Connected);
        assert_eq!(store.list_all().unwrap().len(), 2);
    }

    #[test]
    fn test_undecodable_column_fails_the_fetch() {
        let (store, _dir) = test_store();
        store
            .import(&ImportBatch {
                authors: vec![author("A1", "John Smith")],
                documents: vec![doc(Some("d1"), Some(2020), "placeholder", &["A1"])],
            })
            .unwrap();
        store
            .conn
            .with_connection(|conn| {
                conn.execute(
                    "UPDATE documents SET title = X'4772617068204D696E696E67' WHERE id = 'd1'",
                    [],
                )
                .map_err(|e| Error::Database(e.to_string()))
            })
            .unwrap();

        let expert = Expert::new("A1", "John Smith").with_source_identifier("lexr", "A1");
        assert!(matches!(store.fetch_for(&expert), Err(Error::Database(_))));
        assert_eq!(store.status(), ConnectionStatus::Connected);
    }

    #[test]
    fn test_document_id_is_stable() {
        let a = doc(None, Some(2020), "Graph Mining", &["A1"]);
        let b = doc(None, Some(2020), "Graph Mining", &["A2"]);
        assert_eq!(document_id(&a), document_id(&b));
        assert_ne!(document_id(&a), document_id(&doc(None, Some(2021), "Graph Mining", &[])));
    }
}
