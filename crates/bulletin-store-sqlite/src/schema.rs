//! SQL schema for the Bulletin SQLite store.
//!
//! Executed once at connection startup. The schema version is recorded in
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS branches (
    branch_id  TEXT PRIMARY KEY,
    tenant_id  TEXT NOT NULL,
    name       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS departments (
    department_id TEXT PRIMARY KEY,
    tenant_id     TEXT NOT NULL,
    branch_id     TEXT REFERENCES branches(branch_id) ON DELETE SET NULL,
    name          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS employees (
    employee_id   TEXT PRIMARY KEY,
    tenant_id     TEXT NOT NULL,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL DEFAULT '',
    status        TEXT NOT NULL DEFAULT 'active',  -- 'active' | 'inactive'
    department_id TEXT REFERENCES departments(department_id) ON DELETE SET NULL,
    branch_id     TEXT REFERENCES branches(branch_id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS announcements (
    announcement_id  TEXT PRIMARY KEY,
    tenant_id        TEXT NOT NULL,
    title            TEXT NOT NULL,
    category         TEXT NOT NULL,
    description      TEXT,
    content          TEXT NOT NULL,
    start_date       TEXT NOT NULL,   -- YYYY-MM-DD
    end_date         TEXT,            -- YYYY-MM-DD or NULL
    attachments      TEXT,
    is_featured      INTEGER NOT NULL DEFAULT 0,
    is_high_priority INTEGER NOT NULL DEFAULT 0,
    is_company_wide  INTEGER NOT NULL DEFAULT 1,
    created_at       TEXT NOT NULL,   -- RFC 3339 UTC
    updated_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS announcement_departments (
    announcement_id TEXT NOT NULL REFERENCES announcements(announcement_id) ON DELETE CASCADE,
    department_id   TEXT NOT NULL REFERENCES departments(department_id) ON DELETE CASCADE,
    PRIMARY KEY (announcement_id, department_id)
);

CREATE TABLE IF NOT EXISTS announcement_branches (
    announcement_id TEXT NOT NULL REFERENCES announcements(announcement_id) ON DELETE CASCADE,
    branch_id       TEXT NOT NULL REFERENCES branches(branch_id) ON DELETE CASCADE,
    PRIMARY KEY (announcement_id, branch_id)
);

-- At most one row per (announcement, employee). Concurrent inserts from any
-- number of connections rely on this key.
CREATE TABLE IF NOT EXISTS announcement_views (
    announcement_id TEXT NOT NULL REFERENCES announcements(announcement_id) ON DELETE CASCADE,
    employee_id     TEXT NOT NULL REFERENCES employees(employee_id) ON DELETE CASCADE,
    viewed_at       TEXT NOT NULL,
    PRIMARY KEY (announcement_id, employee_id)
);

CREATE INDEX IF NOT EXISTS announcements_tenant_idx ON announcements(tenant_id, created_at);
CREATE INDEX IF NOT EXISTS employees_tenant_idx     ON employees(tenant_id);
CREATE INDEX IF NOT EXISTS departments_tenant_idx   ON departments(tenant_id);
CREATE INDEX IF NOT EXISTS branches_tenant_idx      ON branches(tenant_id);

PRAGMA user_version = 1;
";
