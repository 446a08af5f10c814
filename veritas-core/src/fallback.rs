//! Rule-based fallback classifier.
//!
//! Used whenever the model cannot produce a verdict. Rules are evaluated top
//! to bottom against the lowercased claim and the first match wins, so the
//! order of [`RULES`] is significant: a claim mentioning both "vaccine" and
//! "always" is classified by the vaccine rule.

use crate::verdict::{ClaimVerdict, VerdictStatus};

/// One row of the classification table.
#[derive(Debug)]
pub struct FallbackRule {
    pub name: &'static str,
    /// Keyword that must also be present, if any.
    pub requires: Option<&'static str>,
    /// At least one of these must be present.
    pub any_of: &'static [&'static str],
    pub status: VerdictStatus,
    pub credibility: f64,
    pub explanation: &'static str,
    pub sources: &'static [&'static str],
}

impl FallbackRule {
    /// `lowered` must already be lowercase.
    fn matches(&self, lowered: &str) -> bool {
        self.requires.map_or(true, |kw| lowered.contains(kw))
            && self.any_of.iter().any(|kw| lowered.contains(kw))
    }

    fn verdict(&self, claim: &str) -> ClaimVerdict {
        ClaimVerdict::new(
            claim,
            self.status,
            self.explanation,
            self.credibility,
            self.sources.iter().map(|s| s.to_string()).collect(),
        )
    }
}

pub const RULES: &[FallbackRule] = &[
    FallbackRule {
        name: "flat-earth",
        requires: None,
        any_of: &["flat earth", "earth is flat", "globe hoax"],
        status: VerdictStatus::False,
        credibility: 0.0,
        explanation: "The Earth is an oblate spheroid. This is confirmed by satellite imagery, \
                      circumnavigation and centuries of independent measurement.",
        sources: &[
            "https://www.nasa.gov/image-of-the-day/",
            "https://en.wikipedia.org/wiki/Spherical_Earth",
        ],
    },
    FallbackRule {
        name: "ancient-astronauts",
        requires: None,
        any_of: &["ancient astronaut", "aliens built", "extraterrestrial"],
        status: VerdictStatus::False,
        credibility: 0.1,
        explanation: "There is no archaeological evidence of extraterrestrial involvement in \
                      ancient construction. The monuments in question are well explained by \
                      human engineering.",
        sources: &["https://en.wikipedia.org/wiki/Ancient_astronauts"],
    },
    FallbackRule {
        name: "vaccine-harm",
        requires: Some("vaccine"),
        any_of: &["autism", "cause", "dangerous"],
        status: VerdictStatus::False,
        credibility: 0.0,
        explanation: "Large-scale studies have found no link between vaccines and autism. \
                      Approved vaccines are continuously monitored for safety.",
        sources: &[
            "https://www.cdc.gov/vaccine-safety/",
            "https://www.who.int/news-room/questions-and-answers/item/vaccines-and-immunization-vaccine-safety",
        ],
    },
    FallbackRule {
        name: "climate-denial",
        requires: Some("climate"),
        any_of: &["hoax", "not real", "fake"],
        status: VerdictStatus::False,
        credibility: 0.0,
        explanation: "Human-driven climate change is supported by the overwhelming consensus of \
                      climate scientists and by multiple independent temperature records.",
        sources: &[
            "https://science.nasa.gov/climate-change/evidence/",
            "https://www.ipcc.ch/report/ar6/syr/",
        ],
    },
    FallbackRule {
        name: "celebrity-rumor",
        requires: None,
        any_of: &["celebrity", "died", "secretly", "replaced"],
        status: VerdictStatus::Unverifiable,
        credibility: 0.3,
        explanation: "Rumors about public figures spread quickly and are often fabricated. \
                      Check reputable news outlets before sharing.",
        sources: &[],
    },
    FallbackRule {
        name: "absolute-language",
        requires: None,
        any_of: &["always", "never", "everyone", "nobody", "100%", "all people"],
        status: VerdictStatus::Misleading,
        credibility: 0.3,
        explanation: "Absolute statements detected. Reality is rarely this uniform, so the claim \
                      likely overgeneralizes.",
        sources: &[],
    },
];

/// Verdict for claims no rule recognizes.
pub const UNMATCHED_EXPLANATION: &str =
    "This claim could not be verified automatically. Consult primary sources before relying on it.";
pub const UNMATCHED_CREDIBILITY: f64 = 0.5;

/// Classify `claim` from its text alone. Total and side-effect free.
pub fn classify(claim: &str) -> ClaimVerdict {
    match matching_rule(claim) {
        Some(rule) => rule.verdict(claim),
        None => ClaimVerdict::new(
            claim,
            VerdictStatus::Unverifiable,
            UNMATCHED_EXPLANATION,
            UNMATCHED_CREDIBILITY,
            Vec::new(),
        ),
    }
}

/// First rule matching `claim`, if any.
pub fn matching_rule(claim: &str) -> Option<&'static FallbackRule> {
    let lowered = claim.to_lowercase();
    RULES.iter().find(|rule| rule.matches(&lowered))
}
