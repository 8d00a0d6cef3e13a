pub mod audit;
pub mod classify;
pub mod commands;
pub mod evaluate;
pub mod manager;
pub mod render;
pub mod tag;

use std::sync::Arc;

use tracing::error;

use accord_db::Database;
use accord_types::events::{InboundMessage, Reply};

use crate::audit::{AuditHandle, AuditSink};
use crate::commands::{Command, CommandHandlers};
use crate::evaluate::ConsensusEvaluator;

/// Room-facing entry point. Every message goes through here: explicit slash
/// commands are dispatched to their handlers, everything else is offered to
/// the signal evaluator, which may answer or stay silent.
pub struct Engine {
    commands: CommandHandlers,
    evaluator: ConsensusEvaluator,
}

impl Engine {
    pub fn new(db: Arc<Database>) -> Self {
        Self::build(db, AuditHandle::disabled())
    }

    pub fn with_audit(db: Arc<Database>, sink: Arc<dyn AuditSink>) -> Self {
        Self::build(db, AuditHandle::new(sink))
    }

    fn build(db: Arc<Database>, audit: AuditHandle) -> Self {
        let manager = manager::ProposalManager::new(db);
        Self {
            commands: CommandHandlers::new(manager.clone(), audit.clone()),
            evaluator: ConsensusEvaluator::new(manager, audit),
        }
    }

    /// Handle one room message. `None` means the room gets no reply.
    /// Storage faults are logged here and answered with an apology instead
    /// of leaking into the transport.
    pub fn handle(&self, msg: &InboundMessage) -> Option<Reply> {
        match self.dispatch(msg) {
            Ok(reply) => reply,
            Err(err) => {
                error!("Failed to handle message in room {}: {:#}", msg.room_id, err);
                Some(Reply::new(render::FAULT_APOLOGY))
            }
        }
    }

    fn dispatch(&self, msg: &InboundMessage) -> anyhow::Result<Option<Reply>> {
        if let Some((command, rest)) = Command::parse(&msg.text) {
            return self.commands.handle(command, rest, msg).map(Some);
        }
        self.evaluator.handle(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::RecordingSink;
    use accord_types::events::RoomEvent;
    use accord_types::models::{InteractionKind, Stage};

    fn engine() -> Engine {
        Engine::new(Arc::new(Database::open_in_memory().unwrap()))
    }

    fn msg(user: &str, text: &str) -> InboundMessage {
        InboundMessage {
            room_id: "room".into(),
            user_id: user.into(),
            text: text.into(),
        }
    }

    #[test]
    fn plain_chatter_gets_no_reply() {
        let engine = engine();
        assert_eq!(engine.handle(&msg("alice", "lunch anyone?")), None);
    }

    #[test]
    fn full_consensus_flow() {
        let engine = engine();

        let created = engine
            .handle(&msg("alice", "/propose Meet twice a week"))
            .unwrap();
        assert!(created.text.contains("**Proposal #p1 created**"));
        assert!(created.text.contains("Stage: Clarifying"));

        let testing = engine.handle(&msg("alice", "/test")).unwrap();
        assert!(testing.text.contains("#p1 moved to testing stage"));

        // A block during testing decides the proposal on the spot.
        assert_eq!(engine.handle(&msg("bob", "I block this")), None);

        let status = engine.handle(&msg("carol", "/status #p1")).unwrap();
        assert!(status.text.contains("**Stage:** BLOCKED"));
        assert!(status.text.contains("**Responses (1):**"));

        // Late consent lands after the decision and is dropped.
        assert_eq!(engine.handle(&msg("dave", "consent #p1")), None);
        let status = engine.handle(&msg("carol", "/status #p1")).unwrap();
        assert!(status.text.contains("**Responses (1):**"));
    }

    #[test]
    fn audit_sink_receives_room_events() {
        let sink = Arc::new(RecordingSink::new());
        let engine = Engine::with_audit(
            Arc::new(Database::open_in_memory().unwrap()),
            sink.clone(),
        );

        engine.handle(&msg("alice", "/propose Meet twice a week"));
        engine.handle(&msg("alice", "/test"));
        engine.handle(&msg("bob", "I block this"));

        let events = sink.0.lock().unwrap();
        assert_eq!(events.len(), 4);
        assert!(matches!(
            events[0],
            RoomEvent::ProposalCreated { number: 1, .. }
        ));
        assert!(matches!(
            events[1],
            RoomEvent::StageChanged {
                from: Stage::Clarifying,
                to: Stage::Testing,
                ..
            }
        ));
        assert!(matches!(
            events[2],
            RoomEvent::InteractionRecorded {
                kind: InteractionKind::Block,
                ..
            }
        ));
        assert!(matches!(
            events[3],
            RoomEvent::StageChanged {
                from: Stage::Testing,
                to: Stage::Blocked,
                ..
            }
        ));
    }

    #[test]
    fn storage_fault_yields_apology() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let engine = Engine::new(db.clone());
        engine.handle(&msg("alice", "/propose Meet twice a week"));

        db.with_conn_mut(|conn| {
            conn.execute_batch("DROP TABLE proposal_interactions")?;
            Ok(())
        })
        .unwrap();

        let reply = engine.handle(&msg("bob", "/concern #p1 too vague")).unwrap();
        assert_eq!(reply.text, render::FAULT_APOLOGY);
    }
}
