use regex::Regex;
use std::sync::LazyLock;

/// Intent categories recognized in unstructured chat text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Consent,
    StandAside,
    Block,
    Confusion,
}

static CONSENT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)^/(agree|consent)\b",
        r"(?i)\b(i agree|sounds good|consent)\b",
        r"(?i)(^|\s)\+1(\s|$)",
        r"(?i)consent\s+#p\d+",
        r"^👍$",
    ])
});

static STAND_ASIDE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)^/stand[_-]aside\b",
        r"(?i)\bstand\s+aside\b",
        r"(?i)stand[_-]aside\s+#p\d+",
    ])
});

static BLOCK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)^/block\b",
        r"(?i)\b(strong objection|block this|i block)\b",
        r"(?i)block\s+#p\d+",
    ])
});

static CONFUSION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)\b(what now|what's next|how does (this|consensus) work|explain (stage|consensus))\b",
        r"(?i)\b(what do we do now|where are we|next step)\b",
        r"^\?+$",
    ])
});

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
}

/// Classify unstructured text into a consensus signal.
///
/// Precedence is fixed: confusion short-circuits (a confused message never
/// also counts as a vote), then consent, stand-aside, block. First match
/// wins; anything else is ordinary chatter.
pub fn classify(text: &str) -> Option<Signal> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if matches_any(&CONFUSION_PATTERNS, text) {
        return Some(Signal::Confusion);
    }
    if matches_any(&CONSENT_PATTERNS, text) {
        return Some(Signal::Consent);
    }
    if matches_any(&STAND_ASIDE_PATTERNS, text) {
        return Some(Signal::StandAside);
    }
    if matches_any(&BLOCK_PATTERNS, text) {
        return Some(Signal::Block);
    }

    None
}

fn matches_any(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().any(|p| p.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consent_forms() {
        assert_eq!(classify("/agree"), Some(Signal::Consent));
        assert_eq!(classify("/consent to this"), Some(Signal::Consent));
        assert_eq!(classify("I agree with the plan"), Some(Signal::Consent));
        assert_eq!(classify("sounds good to me"), Some(Signal::Consent));
        assert_eq!(classify("+1"), Some(Signal::Consent));
        assert_eq!(classify("big +1 from me"), Some(Signal::Consent));
        assert_eq!(classify("consent #p2"), Some(Signal::Consent));
        assert_eq!(classify("👍"), Some(Signal::Consent));
    }

    #[test]
    fn plus_one_needs_its_own_token() {
        assert_eq!(classify("+10"), None);
        assert_eq!(classify("p+1q"), None);
    }

    #[test]
    fn stand_aside_forms() {
        assert_eq!(classify("/stand-aside"), Some(Signal::StandAside));
        assert_eq!(classify("/stand_aside #p1"), Some(Signal::StandAside));
        assert_eq!(classify("I'll stand aside on this one"), Some(Signal::StandAside));
    }

    #[test]
    fn block_forms() {
        assert_eq!(classify("/block"), Some(Signal::Block));
        assert_eq!(classify("strong objection to the wording"), Some(Signal::Block));
        assert_eq!(classify("i block"), Some(Signal::Block));
        assert_eq!(classify("block #p3 pending legal review"), Some(Signal::Block));
    }

    #[test]
    fn confusion_forms() {
        assert_eq!(classify("what now"), Some(Signal::Confusion));
        assert_eq!(classify("What's next?"), Some(Signal::Confusion));
        assert_eq!(classify("how does consensus work"), Some(Signal::Confusion));
        assert_eq!(classify("explain stage"), Some(Signal::Confusion));
        assert_eq!(classify("where are we"), Some(Signal::Confusion));
        assert_eq!(classify("?"), Some(Signal::Confusion));
        assert_eq!(classify("???"), Some(Signal::Confusion));
    }

    #[test]
    fn confusion_wins_over_votes() {
        assert_eq!(
            classify("what now? i agree with most of it"),
            Some(Signal::Confusion)
        );
    }

    #[test]
    fn consent_wins_over_block() {
        assert_eq!(classify("i agree, don't block this"), Some(Signal::Consent));
    }

    #[test]
    fn case_is_ignored() {
        assert_eq!(classify("I AGREE"), Some(Signal::Consent));
        assert_eq!(classify("BLOCK THIS"), Some(Signal::Block));
    }

    #[test]
    fn ordinary_chatter_is_not_a_signal() {
        assert_eq!(classify("hello there"), None);
        assert_eq!(classify("let's discuss the budget tomorrow"), None);
        assert_eq!(classify(""), None);
        assert_eq!(classify("   "), None);
        assert_eq!(classify("👍👍"), None);
    }
}
