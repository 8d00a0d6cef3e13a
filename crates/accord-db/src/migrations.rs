use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS proposals (
            id                 TEXT PRIMARY KEY,
            number             INTEGER NOT NULL,
            room_id            TEXT NOT NULL,
            title              TEXT NOT NULL,
            content            TEXT NOT NULL,
            author_id          TEXT NOT NULL,
            stage              TEXT NOT NULL DEFAULT 'CLARIFYING',
            created_at         INTEGER NOT NULL,
            updated_at         INTEGER NOT NULL,
            last_explained_at  INTEGER NOT NULL DEFAULT 0,
            UNIQUE(room_id, number)
        );

        CREATE INDEX IF NOT EXISTS idx_proposals_room_stage
            ON proposals(room_id, stage);

        CREATE TABLE IF NOT EXISTS proposal_interactions (
            id           TEXT PRIMARY KEY,
            proposal_id  TEXT NOT NULL REFERENCES proposals(id) ON DELETE CASCADE,
            user_id      TEXT NOT NULL,
            kind         TEXT NOT NULL,
            content      TEXT NOT NULL,
            created_at   INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_interactions_proposal
            ON proposal_interactions(proposal_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
