use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use accord_db::Database;
use accord_db::models::{InteractionRow, ProposalRow};
use accord_types::models::{Interaction, InteractionKind, Proposal, Stage};

/// Longest title derived from proposal content.
const TITLE_MAX: usize = 50;

/// Stateful core around the proposal store. Owns numbering, lookups, stage
/// writes, and interaction history. Enforces no stage policy itself; the
/// evaluator and command handlers own transition legality.
#[derive(Clone)]
pub struct ProposalManager {
    db: Arc<Database>,
}

impl ProposalManager {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a proposal in CLARIFYING with the next number for its room.
    pub fn create_proposal(
        &self,
        room_id: &str,
        title: &str,
        content: &str,
        author_id: &str,
    ) -> Result<Proposal> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let number = self.db.insert_proposal(
            &id.to_string(),
            room_id,
            title,
            content,
            author_id,
            Stage::Clarifying.as_str(),
            now.timestamp_millis(),
        )?;

        Ok(Proposal {
            id,
            number,
            room_id: room_id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            author_id: author_id.to_string(),
            stage: Stage::Clarifying,
            created_at: now,
            updated_at: now,
            last_explained_at: None,
        })
    }

    pub fn get_proposal(&self, room_id: &str, number: i64) -> Result<Option<Proposal>> {
        self.db
            .get_proposal(room_id, number)?
            .map(proposal_from_row)
            .transpose()
    }

    pub fn get_proposal_by_id(&self, id: Uuid) -> Result<Option<Proposal>> {
        self.db
            .get_proposal_by_id(&id.to_string())?
            .map(proposal_from_row)
            .transpose()
    }

    /// Proposals still in play, ascending by number. The last element is the
    /// "most recent" one for unreferenced signals.
    pub fn active_proposals(&self, room_id: &str) -> Result<Vec<Proposal>> {
        self.db
            .active_proposals(room_id)?
            .into_iter()
            .map(proposal_from_row)
            .collect()
    }

    pub fn all_proposals(&self, room_id: &str) -> Result<Vec<Proposal>> {
        self.db
            .all_proposals(room_id)?
            .into_iter()
            .map(proposal_from_row)
            .collect()
    }

    /// Unconditional stage write; callers own transition legality.
    pub fn update_stage(&self, id: Uuid, stage: Stage) -> Result<()> {
        self.db.update_proposal_stage(
            &id.to_string(),
            stage.as_str(),
            Utc::now().timestamp_millis(),
        )
    }

    /// Record that a stage explanation was just shown for this proposal.
    pub fn mark_explained(&self, id: Uuid) -> Result<()> {
        self.db
            .set_last_explained(&id.to_string(), Utc::now().timestamp_millis())
    }

    pub fn add_interaction(
        &self,
        proposal_id: Uuid,
        user_id: &str,
        kind: InteractionKind,
        content: &str,
    ) -> Result<Interaction> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        self.db.insert_interaction(
            &id.to_string(),
            &proposal_id.to_string(),
            user_id,
            kind.as_str(),
            content,
            now.timestamp_millis(),
        )?;

        Ok(Interaction {
            id,
            proposal_id,
            user_id: user_id.to_string(),
            kind,
            content: content.to_string(),
            created_at: now,
        })
    }

    /// Full interaction history in chronological order.
    pub fn interactions(&self, proposal_id: Uuid) -> Result<Vec<Interaction>> {
        self.db
            .interactions_for_proposal(&proposal_id.to_string())?
            .into_iter()
            .map(interaction_from_row)
            .collect()
    }

    /// Resolve which proposal a message refers to: the explicit `#pN`
    /// reference when given, otherwise the highest-numbered active proposal.
    /// Shared by commands, confusion handling, and vote recording.
    pub fn resolve_target(&self, room_id: &str, explicit: Option<i64>) -> Result<Option<Proposal>> {
        match explicit {
            Some(number) => self.get_proposal(room_id, number),
            None => Ok(self.active_proposals(room_id)?.pop()),
        }
    }
}

/// Derive a short display title from proposal content: the first line as-is,
/// or its first 47 characters plus `...` once it runs past 50.
pub fn derive_title(content: &str) -> String {
    let first_line = content.trim().lines().next().unwrap_or("").trim();
    if first_line.chars().count() <= TITLE_MAX {
        first_line.to_string()
    } else {
        let head: String = first_line.chars().take(TITLE_MAX - 3).collect();
        format!("{head}...")
    }
}

fn proposal_from_row(row: ProposalRow) -> Result<Proposal> {
    let stage: Stage = row
        .stage
        .parse()
        .with_context(|| format!("proposal {} has corrupt stage '{}'", row.id, row.stage))?;
    let id = parse_uuid(&row.id, "proposal id")?;
    let created_at = millis_to_datetime(row.created_at, &row.id);
    let updated_at = millis_to_datetime(row.updated_at, &row.id);
    let last_explained_at =
        (row.last_explained_at > 0).then(|| millis_to_datetime(row.last_explained_at, &row.id));

    Ok(Proposal {
        id,
        number: row.number,
        room_id: row.room_id,
        title: row.title,
        content: row.content,
        author_id: row.author_id,
        stage,
        created_at,
        updated_at,
        last_explained_at,
    })
}

fn interaction_from_row(row: InteractionRow) -> Result<Interaction> {
    let kind: InteractionKind = row
        .kind
        .parse()
        .with_context(|| format!("interaction {} has corrupt kind '{}'", row.id, row.kind))?;
    let id = parse_uuid(&row.id, "interaction id")?;
    let proposal_id = parse_uuid(&row.proposal_id, "proposal id")?;
    let created_at = millis_to_datetime(row.created_at, &row.id);

    Ok(Interaction {
        id,
        proposal_id,
        user_id: row.user_id,
        kind,
        content: row.content,
        created_at,
    })
}

fn parse_uuid(raw: &str, what: &str) -> Result<Uuid> {
    raw.parse().with_context(|| format!("corrupt {} '{}'", what, raw))
}

fn millis_to_datetime(ms: i64, id: &str) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_else(|| {
        warn!("Corrupt timestamp {} on row '{}'", ms, id);
        DateTime::default()
    })
}
