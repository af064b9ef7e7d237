//! Database schema SQL for the embedded document store.

/// Core tables: authors, documents, document_authors.
///
/// `authors` has no key on purpose: the upstream directory can hold several
/// rows for one id (e.g. differently cased names) and the directory adapter
/// collapses them.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS authors (
    id TEXT NOT NULL,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    year INTEGER,
    title TEXT,
    abstract TEXT,
    raw_json TEXT
);

CREATE TABLE IF NOT EXISTS document_authors (
    document_id TEXT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    author_id TEXT NOT NULL,
    PRIMARY KEY (document_id, author_id)
);

CREATE INDEX IF NOT EXISTS idx_authors_id ON authors(id);
CREATE INDEX IF NOT EXISTS idx_document_authors_author ON document_authors(author_id);
"#;
