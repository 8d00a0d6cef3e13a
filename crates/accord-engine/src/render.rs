//! Reply text in the facilitator's voice. Markdown-flavored; the transport
//! owns actual formatting.

use accord_types::models::{Interaction, InteractionKind, Proposal, Stage};

use crate::tag;

pub const PROPOSE_USAGE: &str = "Please use `/propose <your proposal>`.\nExample: `/propose Adopt the Formal Consensus process for our next meeting.`";

pub const NO_ACTIVE_PROPOSALS: &str =
    "❌ No active proposals found. Use `/test #pN` to specify a proposal.";

pub const NO_PROPOSALS_YET: &str =
    "📊 **No proposals found**\n\nCreate a proposal with `/propose <your idea>`";

pub const FAULT_APOLOGY: &str = "❌ Something went wrong. Please try again.";

pub const GENERAL_HELP: &str = r#"🤖 **Accord Consensus Bot — Help Guide**

**Core Commands:**
• `/propose <your proposal>` — Create a new proposal with unique ID
• `/concern #pN <text>` — Record concern about proposal N
• `/amend #pN <text>` — Suggest amendment to proposal N
• `/test #pN` — Move proposal N to consensus testing
• `/status` — Show all proposals
• `/status #pN` — Show detailed status of proposal N
• `/help #pN` — Show stage explanation for proposal N

**Natural Language:**
• "consent #pN" or 👍 — Give consent
• "stand aside #pN" — Stand aside with reason
• "block #pN <reason>" — Block with reason

**Formal Consensus Stages:**
1. **Clarifying** — Ask questions to understand
2. **Testing** — Respond with consent/concerns/blocks
3. **Consensed** — Agreement reached
4. **Blocked** — Unresolved concerns, needs amendments

Based on Butler & Rothstein's *On Conflict & Consensus*"#;

/// What the room should do at a given stage, addressed to a tagged proposal.
pub fn explanation_for(stage: Stage, number: i64) -> String {
    let tag = tag::format_tag(number);
    match stage {
        Stage::Clarifying => format!(
            "🔍 **Stage: Clarifying** — {tag}\n\n\
             Purpose: Make sure everyone understands the proposal.\n\n\
             What you can do now: Ask **clarifying questions** (not opinions).\n\n\
             Commands: `/concern {tag} <text>`, `/amend {tag} <text>`\n\n\
             Next step: If clear, we'll move to **concerns & amendments**, then test for consensus."
        ),
        Stage::Testing => format!(
            "🧭 **Stage: Consensus Test** — {tag}\n\n\
             Respond with:\n\
             • **Consent**: \"consent {tag}\" or 👍\n\
             • **Concern**: `/concern {tag} <text>`\n\
             • **Block** (only for fundamental conflicts): \"block {tag} <reason>\"\n\n\
             Next step: If no unresolved concerns/blocks, we declare **consensus**; otherwise, return to amendments."
        ),
        Stage::Consensed => format!("✅ **Decision** — {tag}\n\nResult: **Consensus achieved** ✅"),
        Stage::Blocked => format!(
            "❌ **Decision** — {tag}\n\nResult: **Blocked** ❌ (unresolved concerns need amendments)"
        ),
    }
}

pub fn stage_explanation(proposal: &Proposal) -> String {
    explanation_for(proposal.stage, proposal.number)
}

/// `/help #pN` output; also what confusion resolves to.
pub fn proposal_help(proposal: &Proposal) -> String {
    format!(
        "🔍 **Help for {}**\n\n**{}**\n\n{}",
        tag::format_tag(proposal.number),
        proposal.title,
        stage_explanation(proposal),
    )
}

pub fn proposal_created(proposal: &Proposal) -> String {
    format!(
        "✅ **Proposal {} created**\n\n**{}**\n\n{}",
        tag::format_tag(proposal.number),
        proposal.title,
        stage_explanation(proposal),
    )
}

pub fn moved_to_testing(proposal: &Proposal) -> String {
    format!(
        "🧭 **{} moved to testing stage**\n\n**{}**\n\n{}",
        tag::format_tag(proposal.number),
        proposal.title,
        explanation_for(Stage::Testing, proposal.number),
    )
}

pub fn not_found(number: i64) -> String {
    format!("❌ Proposal {} not found.", tag::format_tag(number))
}

// Command token and noun for the two attachable kinds; votes never reach
// the attach path.
fn attach_words(kind: InteractionKind) -> (&'static str, &'static str) {
    match kind {
        InteractionKind::Amendment => ("/amend", "amendment"),
        _ => ("/concern", "concern"),
    }
}

pub fn attach_usage(kind: InteractionKind) -> String {
    let (cmd, noun) = attach_words(kind);
    let example = match kind {
        InteractionKind::Amendment => "Add an async round for feedback before finalizing.",
        _ => "This might exclude async contributors.",
    };
    format!("Please use `{cmd} #pN <your {noun}>`.\nExample: `{cmd} #p1 {example}`")
}

pub fn attach_missing_ref(kind: InteractionKind) -> String {
    let (cmd, noun) = attach_words(kind);
    format!("Please specify which proposal: `{cmd} #pN <your {noun}>`")
}

pub fn attach_missing_body(kind: InteractionKind, number: i64) -> String {
    let (cmd, noun) = attach_words(kind);
    format!(
        "Please include your {noun}: `{cmd} {} <your {noun}>`",
        tag::format_tag(number)
    )
}

pub fn attach_recorded(kind: InteractionKind, proposal: &Proposal) -> String {
    let tag = tag::format_tag(proposal.number);
    match kind {
        InteractionKind::Amendment => format!(
            "🔧 **Amendment recorded** for {tag}\n\nYou can check group alignment with `/test {tag}`"
        ),
        _ => format!(
            "📝 **Concern recorded** for {tag}\n\nConsider suggesting an amendment: `/amend {tag} <suggestion>`"
        ),
    }
}

/// Detailed view of one proposal: header fields, then the interaction
/// history partitioned by kind, then the current stage explanation.
pub fn proposal_status(proposal: &Proposal, interactions: &[Interaction]) -> String {
    let concerns: Vec<&Interaction> = interactions
        .iter()
        .filter(|i| i.kind == InteractionKind::Concern)
        .collect();
    let amendments: Vec<&Interaction> = interactions
        .iter()
        .filter(|i| i.kind == InteractionKind::Amendment)
        .collect();
    let votes: Vec<&Interaction> = interactions.iter().filter(|i| i.kind.is_vote()).collect();

    let mut out = format!("📊 **Status for {}**\n\n", tag::format_tag(proposal.number));
    out.push_str(&format!("**Title:** {}\n", proposal.title));
    out.push_str(&format!("**Stage:** {}\n", proposal.stage));
    out.push_str(&format!("**Author:** <@{}>\n\n", proposal.author_id));

    if !concerns.is_empty() {
        out.push_str(&format!("**Concerns ({}):**\n", concerns.len()));
        for concern in &concerns {
            out.push_str(&format!("• {}\n", concern.content));
        }
        out.push('\n');
    }

    if !amendments.is_empty() {
        out.push_str(&format!("**Amendments ({}):**\n", amendments.len()));
        for amendment in &amendments {
            out.push_str(&format!("• {}\n", amendment.content));
        }
        out.push('\n');
    }

    if !votes.is_empty() {
        out.push_str(&format!("**Responses ({}):**\n", votes.len()));
        for vote in &votes {
            out.push_str(&format!("• {}: {}\n", vote.kind, vote.content));
        }
        out.push('\n');
    }

    out.push_str(&stage_explanation(proposal));
    out
}

/// Aggregate room view: active proposals with concern/amendment counts,
/// then completed ones.
pub fn room_status(summaries: &[(Proposal, Vec<Interaction>)]) -> String {
    let mut out = String::from("📊 **All Proposals Status**\n\n");

    let active: Vec<_> = summaries.iter().filter(|(p, _)| p.stage.is_active()).collect();
    let completed: Vec<_> = summaries.iter().filter(|(p, _)| !p.stage.is_active()).collect();

    if !active.is_empty() {
        out.push_str(&format!("**Active Proposals ({}):**\n", active.len()));
        for (proposal, interactions) in &active {
            let concerns = interactions
                .iter()
                .filter(|i| i.kind == InteractionKind::Concern)
                .count();
            let amendments = interactions
                .iter()
                .filter(|i| i.kind == InteractionKind::Amendment)
                .count();

            out.push_str(&format!(
                "• {} **{}** ({})",
                tag::format_tag(proposal.number),
                proposal.title,
                proposal.stage
            ));
            if concerns > 0 || amendments > 0 {
                out.push_str(&format!(" - {} concerns, {} amendments", concerns, amendments));
            }
            out.push('\n');
        }
        out.push('\n');
    }

    if !completed.is_empty() {
        out.push_str(&format!("**Completed Proposals ({}):**\n", completed.len()));
        for (proposal, _) in &completed {
            out.push_str(&format!(
                "• {} **{}** ({})\n",
                tag::format_tag(proposal.number),
                proposal.title,
                proposal.stage
            ));
        }
        out.push('\n');
    }

    out.push_str("Use `/status #p1` for detailed view of a specific proposal.");
    out
}
