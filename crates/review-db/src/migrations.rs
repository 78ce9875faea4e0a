use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub const CURRENT_SCHEMA_VERSION: i64 = 1;

pub fn run(conn: &mut Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (teams, users, pull requests)");
        let tx = conn.transaction()?;
        tx.execute_batch(
            "
            CREATE TABLE teams (
                team_name   TEXT PRIMARY KEY
            );

            CREATE TABLE users (
                user_id     TEXT PRIMARY KEY,
                username    TEXT NOT NULL,
                team_name   TEXT NOT NULL REFERENCES teams(team_name),
                is_active   INTEGER NOT NULL DEFAULT 1
            );

            CREATE INDEX idx_users_team_active
                ON users(team_name, is_active);

            CREATE TABLE pull_requests (
                pull_request_id     TEXT PRIMARY KEY,
                pull_request_name   TEXT NOT NULL,
                author_id           TEXT NOT NULL REFERENCES users(user_id),
                status              TEXT NOT NULL DEFAULT 'OPEN'
                                    CHECK (status IN ('OPEN', 'MERGED')),
                created_at          TEXT NOT NULL,
                merged_at           TEXT
            );

            -- Ordered reviewer slots; slot keeps list position stable across replacement
            CREATE TABLE pull_request_reviewers (
                pull_request_id TEXT NOT NULL REFERENCES pull_requests(pull_request_id),
                slot            INTEGER NOT NULL,
                user_id         TEXT NOT NULL REFERENCES users(user_id),
                PRIMARY KEY (pull_request_id, slot),
                UNIQUE (pull_request_id, user_id)
            );

            CREATE INDEX idx_reviewers_user
                ON pull_request_reviewers(user_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
        tx.commit()?;
    }

    info!("Database migrations complete (schema v{})", CURRENT_SCHEMA_VERSION);
    Ok(())
}
