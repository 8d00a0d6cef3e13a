/// Database row types — these map directly to SQLite rows.
/// Distinct from accord-types domain models to keep the DB layer independent.
/// Timestamps are epoch milliseconds; stage and kind are their text encodings.

pub struct ProposalRow {
    pub id: String,
    pub number: i64,
    pub room_id: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub stage: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub last_explained_at: i64,
}

pub struct InteractionRow {
    pub id: String,
    pub proposal_id: String,
    pub user_id: String,
    pub kind: String,
    pub content: String,
    pub created_at: i64,
}
