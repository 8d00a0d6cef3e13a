use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{InteractionKind, Stage};

/// An inbound chat message delivered by the hosting transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub room_id: String,
    pub user_id: String,
    pub text: String,
}

/// A rendered reply for the transport to deliver back to the room.
/// Markdown-flavored; the transport owns actual formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
}

impl Reply {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Room events mirrored to the audit sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum RoomEvent {
    /// A proposal entered the process
    ProposalCreated {
        room_id: String,
        proposal_id: Uuid,
        number: i64,
        author_id: String,
        title: String,
    },

    /// A concern, amendment, or vote signal was recorded
    InteractionRecorded {
        room_id: String,
        proposal_id: Uuid,
        number: i64,
        user_id: String,
        kind: InteractionKind,
    },

    /// A proposal moved to a new stage
    StageChanged {
        room_id: String,
        proposal_id: Uuid,
        number: i64,
        from: Stage,
        to: Stage,
    },

    /// A stage explanation was shown in response to confusion or /help
    ExplanationShown {
        room_id: String,
        proposal_id: Uuid,
        number: i64,
        user_id: String,
    },
}

impl RoomEvent {
    /// Room the event belongs to.
    pub fn room_id(&self) -> &str {
        match self {
            Self::ProposalCreated { room_id, .. } => room_id,
            Self::InteractionRecorded { room_id, .. } => room_id,
            Self::StageChanged { room_id, .. } => room_id,
            Self::ExplanationShown { room_id, .. } => room_id,
        }
    }
}
