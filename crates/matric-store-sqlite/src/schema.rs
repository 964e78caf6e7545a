//! SQL schema for the matric SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One application per student per academic year (UNIQUE below).
-- Applications are never hard-deleted.
CREATE TABLE IF NOT EXISTS applications (
    application_id     TEXT PRIMARY KEY,
    user_id            TEXT NOT NULL,
    program_id         TEXT NOT NULL,
    academic_year      TEXT NOT NULL,
    status             TEXT NOT NULL,   -- 'draft' | 'submitted' | 'frozen' | 'under_review' | 'approved' | 'rejected'
    application_number TEXT,            -- assigned at freeze; never changed afterwards
    created_at         TEXT NOT NULL,   -- ISO 8601 UTC; server-assigned
    submitted_at       TEXT,
    frozen_at          TEXT,
    UNIQUE (user_id, academic_year)
);

-- Reference data; managed by seeding, not by the application flow.
CREATE TABLE IF NOT EXISTS certificate_types (
    certificate_type_id TEXT PRIMARY KEY,
    name                TEXT NOT NULL,
    description         TEXT,
    allowed_extensions  TEXT NOT NULL DEFAULT '[]',  -- JSON array of lowercase extensions
    max_size_bytes      INTEGER,
    active              INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS program_requirements (
    program_id           TEXT NOT NULL,
    certificate_type_id  TEXT NOT NULL REFERENCES certificate_types(certificate_type_id),
    required             INTEGER NOT NULL,
    display_order        INTEGER NOT NULL DEFAULT 0,
    special_instructions TEXT,
    PRIMARY KEY (program_id, certificate_type_id)
);

-- File uploads are append-only. Rows stay behind as audit records even
-- after a replace reclaims their bytes from the document store.
CREATE TABLE IF NOT EXISTS file_uploads (
    upload_id         TEXT PRIMARY KEY,
    storage_key       TEXT NOT NULL UNIQUE,
    original_filename TEXT NOT NULL,
    media_type        TEXT NOT NULL,
    size_bytes        INTEGER NOT NULL,
    content_hash      TEXT NOT NULL,    -- SHA-256 hex
    owner_id          TEXT NOT NULL,
    uploaded_at       TEXT NOT NULL
);

-- The current link between an application slot and its upload.
-- At most one row per (application, certificate type): a re-upload
-- updates this row, it never inserts a second one.
CREATE TABLE IF NOT EXISTS application_documents (
    document_id          TEXT PRIMARY KEY,
    application_id       TEXT NOT NULL REFERENCES applications(application_id),
    certificate_type_id  TEXT NOT NULL REFERENCES certificate_types(certificate_type_id),
    upload_id            TEXT NOT NULL REFERENCES file_uploads(upload_id),
    verified             INTEGER NOT NULL DEFAULT 0,
    verified_by          TEXT,
    verified_at          TEXT,
    verification_remarks TEXT,
    updated_at           TEXT NOT NULL,
    UNIQUE (application_id, certificate_type_id)
);

-- Status history is strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS status_history (
    entry_id       TEXT PRIMARY KEY,
    application_id TEXT NOT NULL REFERENCES applications(application_id),
    from_status    TEXT NOT NULL,
    to_status      TEXT NOT NULL,
    actor_id       TEXT NOT NULL,
    actor_role     TEXT NOT NULL,      -- 'student' | 'program_admin' | 'admin'
    remarks        TEXT,
    recorded_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS applications_user_idx        ON applications(user_id);
CREATE INDEX IF NOT EXISTS program_requirements_prg_idx ON program_requirements(program_id);
CREATE INDEX IF NOT EXISTS application_documents_app_idx ON application_documents(application_id);
CREATE INDEX IF NOT EXISTS status_history_app_idx       ON status_history(application_id);

PRAGMA user_version = 1;
";
