pub const SCHEMA_VERSION: i64 = 1;

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    company TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    contact_person TEXT,
    contact_phone TEXT,
    contact_email TEXT,
    stage TEXT NOT NULL CHECK (stage IN ('prospek', 'draft', 'submitted', 'pricing', 'pre_audit', 'audit', 'review', 'fatwa_session', 'certified')),
    status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'on_hold')),
    created_at TEXT NOT NULL,
    stage_updated_at TEXT NOT NULL,
    assigned_to TEXT NOT NULL,
    ai_analysis TEXT
);

CREATE TABLE IF NOT EXISTS checklists (
    id TEXT PRIMARY KEY,
    task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    stage TEXT NOT NULL CHECK (stage IN ('prospek', 'draft', 'submitted', 'pricing', 'pre_audit', 'audit', 'review', 'fatwa_session', 'certified')),
    label TEXT NOT NULL,
    position INTEGER NOT NULL,
    completed INTEGER NOT NULL DEFAULT 0
);

-- Credentials play the role of the auth provider's user table; role_meta is
-- the role recorded at sign-up, used to rebuild a missing profile.
CREATE TABLE IF NOT EXISTS credentials (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role_meta TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY REFERENCES credentials(id) ON DELETE CASCADE,
    username TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('superadmin', 'admin', 'user')),
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES credentials(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value JSON NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_created ON tasks(created_at);
CREATE INDEX IF NOT EXISTS idx_checklists_task ON checklists(task_id, stage, position);
CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
"#;
