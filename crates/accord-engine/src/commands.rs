use anyhow::Result;

use accord_types::events::{InboundMessage, Reply, RoomEvent};
use accord_types::models::{InteractionKind, Stage};

use crate::audit::AuditHandle;
use crate::manager::{self, ProposalManager};
use crate::{render, tag};

/// Explicit slash commands understood by the facilitator. `/agree`,
/// `/consent`, `/block`, and `/stand-aside` are votes, not commands;
/// classification owns those.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Propose,
    Concern,
    Amend,
    Test,
    Status,
    Help,
}

impl Command {
    /// Split a leading slash command off the text, returning the command and
    /// the trimmed remainder. The first whitespace-separated token must be
    /// the whole command word; `/whatnow` is an alias for `/help`.
    pub fn parse(text: &str) -> Option<(Command, &str)> {
        let trimmed = text.trim();
        let token = trimmed.split_whitespace().next()?;

        let command = match token.to_lowercase().as_str() {
            "/propose" => Command::Propose,
            "/concern" => Command::Concern,
            "/amend" => Command::Amend,
            "/test" => Command::Test,
            "/status" => Command::Status,
            "/help" | "/whatnow" => Command::Help,
            _ => return None,
        };

        Some((command, trimmed[token.len()..].trim()))
    }
}

/// One handler per explicit command: parse input, call the manager, render a
/// reply. Commands always answer; silence is reserved for signals.
pub struct CommandHandlers {
    manager: ProposalManager,
    audit: AuditHandle,
}

impl CommandHandlers {
    pub fn new(manager: ProposalManager, audit: AuditHandle) -> Self {
        Self { manager, audit }
    }

    pub fn handle(&self, command: Command, rest: &str, msg: &InboundMessage) -> Result<Reply> {
        match command {
            Command::Propose => self.propose(rest, msg),
            Command::Concern => self.attach(rest, msg, InteractionKind::Concern),
            Command::Amend => self.attach(rest, msg, InteractionKind::Amendment),
            Command::Test => self.test(rest, msg),
            Command::Status => self.status(rest, msg),
            Command::Help => self.help(rest, msg),
        }
    }

    fn propose(&self, rest: &str, msg: &InboundMessage) -> Result<Reply> {
        if rest.is_empty() {
            return Ok(Reply::new(render::PROPOSE_USAGE));
        }

        let title = manager::derive_title(rest);
        let proposal = self
            .manager
            .create_proposal(&msg.room_id, &title, rest, &msg.user_id)?;

        self.audit.record(&RoomEvent::ProposalCreated {
            room_id: msg.room_id.clone(),
            proposal_id: proposal.id,
            number: proposal.number,
            author_id: msg.user_id.clone(),
            title: proposal.title.clone(),
        });

        Ok(Reply::new(render::proposal_created(&proposal)))
    }

    /// Shared by /concern and /amend: both need a reference, an existing
    /// proposal, and body text. Accepted in any stage.
    fn attach(&self, rest: &str, msg: &InboundMessage, kind: InteractionKind) -> Result<Reply> {
        if rest.is_empty() {
            return Ok(Reply::new(render::attach_usage(kind)));
        }

        let Some(number) = tag::parse_tag(rest) else {
            return Ok(Reply::new(render::attach_missing_ref(kind)));
        };

        let Some(proposal) = self.manager.get_proposal(&msg.room_id, number)? else {
            return Ok(Reply::new(render::not_found(number)));
        };

        let body = tag::strip_tag(rest);
        if body.is_empty() {
            return Ok(Reply::new(render::attach_missing_body(kind, number)));
        }

        self.manager
            .add_interaction(proposal.id, &msg.user_id, kind, &body)?;
        self.audit.record(&RoomEvent::InteractionRecorded {
            room_id: msg.room_id.clone(),
            proposal_id: proposal.id,
            number: proposal.number,
            user_id: msg.user_id.clone(),
            kind,
        });

        Ok(Reply::new(render::attach_recorded(kind, &proposal)))
    }

    fn test(&self, rest: &str, msg: &InboundMessage) -> Result<Reply> {
        let explicit = tag::parse_tag(rest);
        let Some(proposal) = self.manager.resolve_target(&msg.room_id, explicit)? else {
            let reply = match explicit {
                Some(number) => render::not_found(number),
                None => render::NO_ACTIVE_PROPOSALS.to_string(),
            };
            return Ok(Reply::new(reply));
        };

        // Facilitator override: forces TESTING from any stage, including
        // CONSENSED and BLOCKED, so a mis-stated decision can be reopened.
        let from = proposal.stage;
        self.manager.update_stage(proposal.id, Stage::Testing)?;
        self.audit.record(&RoomEvent::StageChanged {
            room_id: msg.room_id.clone(),
            proposal_id: proposal.id,
            number: proposal.number,
            from,
            to: Stage::Testing,
        });

        Ok(Reply::new(render::moved_to_testing(&proposal)))
    }

    fn status(&self, rest: &str, msg: &InboundMessage) -> Result<Reply> {
        if let Some(number) = tag::parse_tag(rest) {
            let Some(proposal) = self.manager.get_proposal(&msg.room_id, number)? else {
                return Ok(Reply::new(render::not_found(number)));
            };
            let interactions = self.manager.interactions(proposal.id)?;
            return Ok(Reply::new(render::proposal_status(&proposal, &interactions)));
        }

        let proposals = self.manager.all_proposals(&msg.room_id)?;
        if proposals.is_empty() {
            return Ok(Reply::new(render::NO_PROPOSALS_YET));
        }

        let mut summaries = Vec::with_capacity(proposals.len());
        for proposal in proposals {
            let interactions = self.manager.interactions(proposal.id)?;
            summaries.push((proposal, interactions));
        }

        Ok(Reply::new(render::room_status(&summaries)))
    }

    fn help(&self, rest: &str, msg: &InboundMessage) -> Result<Reply> {
        let Some(number) = tag::parse_tag(rest) else {
            return Ok(Reply::new(render::GENERAL_HELP));
        };

        let Some(proposal) = self.manager.get_proposal(&msg.room_id, number)? else {
            return Ok(Reply::new(render::not_found(number)));
        };

        self.manager.mark_explained(proposal.id)?;
        self.audit.record(&RoomEvent::ExplanationShown {
            room_id: msg.room_id.clone(),
            proposal_id: proposal.id,
            number: proposal.number,
            user_id: msg.user_id.clone(),
        });

        Ok(Reply::new(render::proposal_help(&proposal)))
    }
}
