//! SQL schemas for the two SQLite databases.
//!
//! Both are idempotent and run on every open.

/// Relational records: accounts, access control, profiles, references.
pub const DIRECTORY_SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS roles (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE COLLATE NOCASE,
    description TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL
);

-- name is always 'resource:action'.
CREATE TABLE IF NOT EXISTS permissions (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    resource    TEXT NOT NULL,
    action      TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS role_permissions (
    role_id       TEXT NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
    permission_id TEXT NOT NULL REFERENCES permissions(id) ON DELETE CASCADE,
    PRIMARY KEY (role_id, permission_id)
);

CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    full_name     TEXT NOT NULL,
    role_id       TEXT NOT NULL REFERENCES roles(id),
    is_active     INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS lecturers (
    id              TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    lecturer_number TEXT NOT NULL UNIQUE,
    department      TEXT NOT NULL DEFAULT '',
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS students (
    id             TEXT PRIMARY KEY,
    user_id        TEXT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    student_number TEXT NOT NULL UNIQUE,
    program        TEXT NOT NULL DEFAULT '',
    academic_year  TEXT NOT NULL DEFAULT '',
    advisor_id     TEXT REFERENCES lecturers(id) ON DELETE SET NULL,
    created_at     TEXT NOT NULL
);

-- Workflow state for one achievement document held in the document store.
-- Rows are never deleted; status 'deleted' is a soft delete.
CREATE TABLE IF NOT EXISTS achievement_references (
    id             TEXT PRIMARY KEY,
    student_id     TEXT NOT NULL REFERENCES students(id),
    document_id    TEXT NOT NULL UNIQUE,
    status         TEXT NOT NULL DEFAULT 'draft',
    submitted_at   TEXT,
    verified_at    TEXT,
    verified_by    TEXT,
    rejection_note TEXT,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS students_advisor_idx   ON students(advisor_id);
CREATE INDEX IF NOT EXISTS references_student_idx ON achievement_references(student_id);
CREATE INDEX IF NOT EXISTS references_status_idx  ON achievement_references(status);

PRAGMA user_version = 1;
";

/// Achievement content, one JSON body per document.
pub const DOCUMENT_SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS achievements (
    id         TEXT PRIMARY KEY,
    student_id TEXT NOT NULL,
    body       TEXT NOT NULL,   -- serialised AchievementDocument
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS achievements_student_idx ON achievements(student_id);

PRAGMA user_version = 1;
";
