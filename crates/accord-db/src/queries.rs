use crate::Database;
use crate::models::{InteractionRow, ProposalRow};
use anyhow::{Result, bail};
use rusqlite::Connection;

/// Attempts for a proposal insert that loses the `(room_id, number)` race.
/// The writer lock already serializes a single handle; the retry covers a
/// database shared between handles or processes.
const CREATE_ATTEMPTS: usize = 3;

impl Database {
    // -- Proposals --

    /// Insert a proposal with the next sequential number for its room.
    /// The number is computed and committed in one transaction; losing a
    /// uniqueness race means another writer took the number, so retry.
    /// Returns the allocated number.
    pub fn insert_proposal(
        &self,
        id: &str,
        room_id: &str,
        title: &str,
        content: &str,
        author_id: &str,
        stage: &str,
        now_ms: i64,
    ) -> Result<i64> {
        for _ in 0..CREATE_ATTEMPTS {
            let allocated = self.with_conn_mut(|conn| {
                let tx = conn.transaction()?;

                let number: i64 = tx.query_row(
                    "SELECT COALESCE(MAX(number), 0) + 1 FROM proposals WHERE room_id = ?1",
                    [room_id],
                    |row| row.get(0),
                )?;

                let inserted = tx.execute(
                    "INSERT INTO proposals
                         (id, number, room_id, title, content, author_id, stage,
                          created_at, updated_at, last_explained_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8, 0)",
                    rusqlite::params![id, number, room_id, title, content, author_id, stage, now_ms],
                );

                match inserted {
                    Ok(_) => {
                        tx.commit()?;
                        Ok(Some(number))
                    }
                    // Another writer committed this number first; tx rolls back on drop
                    Err(e) if is_unique_violation(&e) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })?;

            if let Some(number) = allocated {
                return Ok(number);
            }
        }

        bail!("proposal number allocation kept racing in room {}", room_id)
    }

    pub fn get_proposal(&self, room_id: &str, number: i64) -> Result<Option<ProposalRow>> {
        self.with_conn(|conn| query_proposal_by_number(conn, room_id, number))
    }

    pub fn get_proposal_by_id(&self, id: &str) -> Result<Option<ProposalRow>> {
        self.with_conn(|conn| query_proposal_by_id(conn, id))
    }

    /// Proposals still in play (CLARIFYING or TESTING), ascending by number.
    pub fn active_proposals(&self, room_id: &str) -> Result<Vec<ProposalRow>> {
        self.with_conn(|conn| query_active_proposals(conn, room_id))
    }

    /// Every proposal in the room, ascending by number.
    pub fn all_proposals(&self, room_id: &str) -> Result<Vec<ProposalRow>> {
        self.with_conn(|conn| query_all_proposals(conn, room_id))
    }

    pub fn update_proposal_stage(&self, id: &str, stage: &str, now_ms: i64) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE proposals SET stage = ?2, updated_at = ?3 WHERE id = ?1",
                rusqlite::params![id, stage, now_ms],
            )?;
            Ok(())
        })
    }

    /// Explanation-throttle bookkeeping; deliberately does not touch updated_at.
    pub fn set_last_explained(&self, id: &str, now_ms: i64) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE proposals SET last_explained_at = ?2 WHERE id = ?1",
                rusqlite::params![id, now_ms],
            )?;
            Ok(())
        })
    }

    // -- Interactions --

    pub fn insert_interaction(
        &self,
        id: &str,
        proposal_id: &str,
        user_id: &str,
        kind: &str,
        content: &str,
        now_ms: i64,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO proposal_interactions (id, proposal_id, user_id, kind, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, proposal_id, user_id, kind, content, now_ms],
            )?;
            Ok(())
        })
    }

    /// Chronological replay order; rowid breaks same-millisecond ties.
    pub fn interactions_for_proposal(&self, proposal_id: &str) -> Result<Vec<InteractionRow>> {
        self.with_conn(|conn| query_interactions(conn, proposal_id))
    }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn proposal_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProposalRow> {
    Ok(ProposalRow {
        id: row.get(0)?,
        number: row.get(1)?,
        room_id: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        author_id: row.get(5)?,
        stage: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
        last_explained_at: row.get(9)?,
    })
}

fn query_proposal_by_number(
    conn: &Connection,
    room_id: &str,
    number: i64,
) -> Result<Option<ProposalRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, number, room_id, title, content, author_id, stage,
                created_at, updated_at, last_explained_at
         FROM proposals WHERE room_id = ?1 AND number = ?2",
    )?;

    let row = stmt
        .query_row(rusqlite::params![room_id, number], proposal_from_row)
        .optional()?;

    Ok(row)
}

fn query_proposal_by_id(conn: &Connection, id: &str) -> Result<Option<ProposalRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, number, room_id, title, content, author_id, stage,
                created_at, updated_at, last_explained_at
         FROM proposals WHERE id = ?1",
    )?;

    let row = stmt.query_row([id], proposal_from_row).optional()?;

    Ok(row)
}

fn query_active_proposals(conn: &Connection, room_id: &str) -> Result<Vec<ProposalRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, number, room_id, title, content, author_id, stage,
                created_at, updated_at, last_explained_at
         FROM proposals
         WHERE room_id = ?1 AND stage IN ('CLARIFYING', 'TESTING')
         ORDER BY number ASC",
    )?;

    let rows = stmt
        .query_map([room_id], proposal_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_all_proposals(conn: &Connection, room_id: &str) -> Result<Vec<ProposalRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, number, room_id, title, content, author_id, stage,
                created_at, updated_at, last_explained_at
         FROM proposals
         WHERE room_id = ?1
         ORDER BY number ASC",
    )?;

    let rows = stmt
        .query_map([room_id], proposal_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_interactions(conn: &Connection, proposal_id: &str) -> Result<Vec<InteractionRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, proposal_id, user_id, kind, content, created_at
         FROM proposal_interactions
         WHERE proposal_id = ?1
         ORDER BY created_at ASC, rowid ASC",
    )?;

    let rows = stmt
        .query_map([proposal_id], |row| {
            Ok(InteractionRow {
                id: row.get(0)?,
                proposal_id: row.get(1)?,
                user_id: row.get(2)?,
                kind: row.get(3)?,
                content: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;

    fn insert(db: &Database, id: &str, room: &str) -> i64 {
        db.insert_proposal(id, room, "title", "content", "alice", "CLARIFYING", 1_000)
            .unwrap()
    }

    #[test]
    fn numbers_are_sequential_per_room() {
        let db = Database::open_in_memory().unwrap();

        assert_eq!(insert(&db, "a1", "room-a"), 1);
        assert_eq!(insert(&db, "a2", "room-a"), 2);
        assert_eq!(insert(&db, "a3", "room-a"), 3);

        // Independent counter per room
        assert_eq!(insert(&db, "b1", "room-b"), 1);
        assert_eq!(insert(&db, "b2", "room-b"), 2);
    }

    #[test]
    fn concurrent_creation_never_duplicates_numbers() {
        let db = Database::open_in_memory().unwrap();

        let mut numbers: Vec<i64> = Vec::new();
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|t| {
                    let db = &db;
                    s.spawn(move || {
                        (0..4)
                            .map(|i| insert(db, &format!("p-{}-{}", t, i), "room"))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            for handle in handles {
                numbers.extend(handle.join().unwrap());
            }
        });

        numbers.sort_unstable();
        assert_eq!(numbers, (1..=32).collect::<Vec<i64>>());
    }

    #[test]
    fn duplicate_number_violates_schema() {
        let db = Database::open_in_memory().unwrap();
        insert(&db, "p1", "room");

        let result = db.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO proposals
                     (id, number, room_id, title, content, author_id, stage,
                      created_at, updated_at, last_explained_at)
                 VALUES ('p2', 1, 'room', 't', 'c', 'bob', 'CLARIFYING', 0, 0, 0)",
                [],
            )?;
            Ok(())
        });

        assert!(result.is_err());
    }

    #[test]
    fn lookup_by_number_and_id() {
        let db = Database::open_in_memory().unwrap();
        insert(&db, "p1", "room");

        let row = db.get_proposal("room", 1).unwrap().unwrap();
        assert_eq!(row.id, "p1");
        assert_eq!(row.stage, "CLARIFYING");
        assert_eq!(row.last_explained_at, 0);

        let row = db.get_proposal_by_id("p1").unwrap().unwrap();
        assert_eq!(row.number, 1);

        assert!(db.get_proposal("room", 99).unwrap().is_none());
        assert!(db.get_proposal("other-room", 1).unwrap().is_none());
        assert!(db.get_proposal_by_id("nope").unwrap().is_none());
    }

    #[test]
    fn active_filter_and_ordering() {
        let db = Database::open_in_memory().unwrap();
        insert(&db, "p1", "room");
        insert(&db, "p2", "room");
        insert(&db, "p3", "room");
        db.update_proposal_stage("p2", "CONSENSED", 2_000).unwrap();
        db.update_proposal_stage("p3", "TESTING", 2_000).unwrap();

        let active: Vec<i64> = db
            .active_proposals("room")
            .unwrap()
            .iter()
            .map(|p| p.number)
            .collect();
        assert_eq!(active, vec![1, 3]);

        let all: Vec<i64> = db
            .all_proposals("room")
            .unwrap()
            .iter()
            .map(|p| p.number)
            .collect();
        assert_eq!(all, vec![1, 2, 3]);
    }

    #[test]
    fn stage_update_refreshes_updated_at() {
        let db = Database::open_in_memory().unwrap();
        insert(&db, "p1", "room");

        db.update_proposal_stage("p1", "TESTING", 5_000).unwrap();

        let row = db.get_proposal("room", 1).unwrap().unwrap();
        assert_eq!(row.stage, "TESTING");
        assert_eq!(row.created_at, 1_000);
        assert_eq!(row.updated_at, 5_000);
    }

    #[test]
    fn last_explained_leaves_updated_at_alone() {
        let db = Database::open_in_memory().unwrap();
        insert(&db, "p1", "room");

        db.set_last_explained("p1", 7_000).unwrap();

        let row = db.get_proposal("room", 1).unwrap().unwrap();
        assert_eq!(row.last_explained_at, 7_000);
        assert_eq!(row.updated_at, 1_000);
    }

    #[test]
    fn interactions_replay_in_insert_order() {
        let db = Database::open_in_memory().unwrap();
        insert(&db, "p1", "room");

        // Same timestamp on purpose; rowid must break the tie
        db.insert_interaction("i1", "p1", "alice", "concern", "first", 9_000)
            .unwrap();
        db.insert_interaction("i2", "p1", "bob", "amendment", "second", 9_000)
            .unwrap();
        db.insert_interaction("i3", "p1", "carol", "block", "third", 9_000)
            .unwrap();

        let contents: Vec<String> = db
            .interactions_for_proposal("p1")
            .unwrap()
            .into_iter()
            .map(|i| i.content)
            .collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn interactions_require_existing_proposal() {
        let db = Database::open_in_memory().unwrap();

        let result = db.insert_interaction("i1", "ghost", "alice", "concern", "text", 0);
        assert!(result.is_err());
    }
}
