use anyhow::Result;
use chrono::{Duration, Utc};
use uuid::Uuid;

use accord_types::events::{InboundMessage, Reply, RoomEvent};
use accord_types::models::{InteractionKind, Stage};

use crate::audit::AuditHandle;
use crate::classify::{self, Signal};
use crate::manager::ProposalManager;
use crate::{render, tag};

/// Cooldown between automatic stage explanations of the same proposal.
const EXPLAIN_COOLDOWN_MINUTES: i64 = 10;

/// Applies consensus policy to classified signals: records votes while a
/// proposal is under test, blocks on any block, and re-explains the stage
/// when the room sounds confused (throttled per proposal).
pub struct ConsensusEvaluator {
    manager: ProposalManager,
    audit: AuditHandle,
}

impl ConsensusEvaluator {
    pub fn new(manager: ProposalManager, audit: AuditHandle) -> Self {
        Self { manager, audit }
    }

    /// Interpret one unstructured message. `None` means the message carried
    /// no recognizable signal, or policy chose silence.
    pub fn handle(&self, msg: &InboundMessage) -> Result<Option<Reply>> {
        let Some(signal) = classify::classify(&msg.text) else {
            return Ok(None);
        };

        match signal {
            Signal::Confusion => self.explain_stage(msg),
            Signal::Consent => self.record_vote(msg, InteractionKind::Consent),
            Signal::StandAside => self.record_vote(msg, InteractionKind::StandAside),
            Signal::Block => self.record_vote(msg, InteractionKind::Block),
        }
    }

    fn explain_stage(&self, msg: &InboundMessage) -> Result<Option<Reply>> {
        let explicit = tag::parse_tag(&msg.text);
        let Some(proposal) = self.manager.resolve_target(&msg.room_id, explicit)? else {
            return Ok(None);
        };

        // Don't re-explain the same proposal too frequently
        if let Some(last) = proposal.last_explained_at {
            if Utc::now() - last < Duration::minutes(EXPLAIN_COOLDOWN_MINUTES) {
                return Ok(None);
            }
        }

        self.manager.mark_explained(proposal.id)?;
        self.audit.record(&RoomEvent::ExplanationShown {
            room_id: msg.room_id.clone(),
            proposal_id: proposal.id,
            number: proposal.number,
            user_id: msg.user_id.clone(),
        });

        Ok(Some(Reply::new(render::proposal_help(&proposal))))
    }

    /// Votes are recorded only while the target is in TESTING; everything
    /// else is dropped without a reply, premature votes included.
    fn record_vote(&self, msg: &InboundMessage, kind: InteractionKind) -> Result<Option<Reply>> {
        let explicit = tag::parse_tag(&msg.text);
        let Some(proposal) = self.manager.resolve_target(&msg.room_id, explicit)? else {
            return Ok(None);
        };

        if proposal.stage != Stage::Testing {
            return Ok(None);
        }

        self.manager
            .add_interaction(proposal.id, &msg.user_id, kind, &msg.text)?;
        self.audit.record(&RoomEvent::InteractionRecorded {
            room_id: msg.room_id.clone(),
            proposal_id: proposal.id,
            number: proposal.number,
            user_id: msg.user_id.clone(),
            kind,
        });

        self.apply_block_policy(&msg.room_id, proposal.id)?;
        Ok(None)
    }

    /// Any recorded block fails the test. Re-reads current state so the
    /// decision is made against what is actually stored.
    fn apply_block_policy(&self, room_id: &str, proposal_id: Uuid) -> Result<()> {
        let Some(proposal) = self.manager.get_proposal_by_id(proposal_id)? else {
            return Ok(());
        };
        if proposal.stage != Stage::Testing {
            return Ok(());
        }

        let blocked = self
            .manager
            .interactions(proposal_id)?
            .iter()
            .any(|i| i.kind == InteractionKind::Block);

        if blocked {
            self.manager.update_stage(proposal_id, Stage::Blocked)?;
            self.audit.record(&RoomEvent::StageChanged {
                room_id: room_id.to_string(),
                proposal_id,
                number: proposal.number,
                from: Stage::Testing,
                to: Stage::Blocked,
            });
        }

        Ok(())
    }
}
