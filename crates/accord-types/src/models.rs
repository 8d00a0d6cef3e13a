use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Lifecycle stage of a proposal.
///
/// The normal path is CLARIFYING -> TESTING -> CONSENSED or BLOCKED. Blocking
/// is automatic (any block recorded while testing); consensus is declared by
/// a facilitator, never by policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Clarifying,
    Testing,
    Consensed,
    Blocked,
}

impl Stage {
    /// Store encoding. Matches the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Clarifying => "CLARIFYING",
            Stage::Testing => "TESTING",
            Stage::Consensed => "CONSENSED",
            Stage::Blocked => "BLOCKED",
        }
    }

    /// Still moving through the process (not yet decided).
    pub fn is_active(&self) -> bool {
        matches!(self, Stage::Clarifying | Stage::Testing)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = ParseStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CLARIFYING" => Ok(Stage::Clarifying),
            "TESTING" => Ok(Stage::Testing),
            "CONSENSED" => Ok(Stage::Consensed),
            "BLOCKED" => Ok(Stage::Blocked),
            other => Err(ParseStageError(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("unrecognized proposal stage: {0}")]
pub struct ParseStageError(pub String);

/// What a recorded interaction contributes to a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionKind {
    Concern,
    Amendment,
    Consent,
    StandAside,
    Block,
}

impl InteractionKind {
    /// Store encoding. Matches the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::Concern => "concern",
            InteractionKind::Amendment => "amendment",
            InteractionKind::Consent => "consent",
            InteractionKind::StandAside => "stand-aside",
            InteractionKind::Block => "block",
        }
    }

    /// Consent, stand-aside, and block are the consensus-test responses;
    /// concerns and amendments can arrive in any stage.
    pub fn is_vote(&self) -> bool {
        matches!(
            self,
            InteractionKind::Consent | InteractionKind::StandAside | InteractionKind::Block
        )
    }
}

impl std::fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InteractionKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "concern" => Ok(InteractionKind::Concern),
            "amendment" => Ok(InteractionKind::Amendment),
            "consent" => Ok(InteractionKind::Consent),
            "stand-aside" => Ok(InteractionKind::StandAside),
            "block" => Ok(InteractionKind::Block),
            other => Err(ParseKindError(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("unrecognized interaction kind: {0}")]
pub struct ParseKindError(pub String);

/// One unit of decision text moving through the consensus process.
/// Numbers are sequential per room and never reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub id: Uuid,
    pub number: i64,
    pub room_id: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub stage: Stage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// When the bot last explained this proposal's stage, for throttling.
    /// `None` means never explained.
    pub last_explained_at: Option<DateTime<Utc>>,
}

/// A concern, amendment, or vote signal attached to a proposal.
/// Append-only; never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub id: Uuid,
    pub proposal_id: Uuid,
    pub user_id: String,
    pub kind: InteractionKind,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_stages() {
        assert!(Stage::Clarifying.is_active());
        assert!(Stage::Testing.is_active());
        assert!(!Stage::Consensed.is_active());
        assert!(!Stage::Blocked.is_active());
    }

    #[test]
    fn stage_encoding_roundtrip() {
        for stage in [Stage::Clarifying, Stage::Testing, Stage::Consensed, Stage::Blocked] {
            assert_eq!(stage.as_str().parse::<Stage>().unwrap(), stage);
        }
        assert!("clarifying".parse::<Stage>().is_err());
    }

    #[test]
    fn kind_encoding_roundtrip() {
        assert_eq!(
            "stand-aside".parse::<InteractionKind>().unwrap(),
            InteractionKind::StandAside
        );
        assert!("stand_aside".parse::<InteractionKind>().is_err());
    }

    #[test]
    fn vote_kinds() {
        assert!(InteractionKind::Block.is_vote());
        assert!(!InteractionKind::Concern.is_vote());
        assert!(!InteractionKind::Amendment.is_vote());
    }
}
