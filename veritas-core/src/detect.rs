//! Claim detection - finds passages in free text that read like checkable
//! claims (attributions, hedged reports, statistics, certainty markers,
//! conspiracy framing).
//!
//! Text is split into lines; a line is a candidate when its length is in
//! [`MIN_BLOCK_CHARS`, `MAX_BLOCK_CHARS`] and at least one pattern matches.

use regex::RegexSet;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::OnceLock;

pub const MIN_BLOCK_CHARS: usize = 26;
pub const MAX_BLOCK_CHARS: usize = 799;

/// (category, pattern). Evaluated case-insensitively; the first matching
/// entry names the category.
const PATTERNS: &[(&str, &str)] = &[
    ("attribution", r"according to (studies|research|experts|proponents|critics|sources)"),
    ("attribution", r"studies (show|revealed|indicate|suggest)"),
    ("attribution", r"research (suggests|indicates|found|claims)"),
    ("attribution", r"scientists (say|claim|found|argue|propose)"),
    ("attribution", r"experts (claim|say|believe|suggest|warn)"),
    (
        "attribution",
        r"(proponents|advocates|adherents|members) (argue|claim|state|hold|maintain)",
    ),
    ("hedge", r"it is (claimed|rumored|alleged|purported|argued) that"),
    ("hedge", r"the (idea|theory|hypothesis|belief) that"),
    ("hedge", r"supposedly|allegedly|purportedly|reportedly"),
    ("hedge", r"often (described|referred to) as"),
    ("hedge", r"commonly (believed|thought) to"),
    ("statistic", r"\d+% of (people|americans|users|scientists|population)"),
    ("certainty", r"fact:|the truth is|it's a fact that"),
    ("certainty", r"everyone knows|no one can deny|clearly|obviously"),
    ("conspiracy", r"(flat|globe|spherical) earth"),
    ("conspiracy", r"conspiracy|hoax|hidden|secret (truth|data|evidence)"),
    ("conspiracy", r"mainstream (science|media|narrative)"),
    ("conspiracy", r"alternative (theory|explanation|history)"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedClaim {
    pub text: String,
    pub category: &'static str,
    /// Index of the first matching entry in the pattern table.
    pub pattern: usize,
}

fn pattern_set() -> Option<&'static RegexSet> {
    static SET: OnceLock<Option<RegexSet>> = OnceLock::new();
    SET.get_or_init(|| {
        let patterns = PATTERNS.iter().map(|(_, p)| format!("(?i){}", p));
        match RegexSet::new(patterns) {
            Ok(set) => Some(set),
            Err(e) => {
                tracing::error!(error = %e, "Claim patterns failed to compile");
                None
            }
        }
    })
    .as_ref()
}

/// Index of the first pattern matching `text`, ignoring length limits.
pub fn first_match(text: &str) -> Option<usize> {
    pattern_set()?.matches(text).iter().next()
}

/// Category of the first pattern matching `text`, ignoring length limits.
pub fn classify_passage(text: &str) -> Option<&'static str> {
    first_match(text).map(|idx| PATTERNS[idx].0)
}

/// Detect claim-like passages in `text`, in order of first appearance.
pub fn detect_claims(text: &str) -> Vec<DetectedClaim> {
    let mut seen = HashSet::new();
    let mut claims = Vec::new();

    for line in text.lines() {
        let block = line.trim();
        let len = block.chars().count();
        if !(MIN_BLOCK_CHARS..=MAX_BLOCK_CHARS).contains(&len) {
            continue;
        }
        let Some(pattern) = first_match(block) else {
            continue;
        };
        if seen.insert(block) {
            claims.push(DetectedClaim {
                text: block.to_string(),
                category: PATTERNS[pattern].0,
                pattern,
            });
        }
    }

    tracing::debug!(found = claims.len(), "Claim detection finished");
    claims
}
