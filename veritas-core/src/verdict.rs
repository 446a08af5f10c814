use serde::{Deserialize, Serialize};

/// Maximum number of sources carried on a verdict.
pub const MAX_SOURCES: usize = 3;

/// Explanation substituted when the model omits one.
pub const DEFAULT_EXPLANATION: &str = "Analysis complete.";

/// Credibility used when the model gives nothing usable.
pub const DEFAULT_CREDIBILITY: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerdictStatus {
    Verified,
    False,
    Misleading,
    Unverifiable,
    /// Part of the published label set. Upstream failures in this crate
    /// resolve through the fallback classifier instead of surfacing it.
    Error,
}

impl VerdictStatus {
    /// Labels a model is allowed to return. `Error` is not one of them.
    pub const MODEL_LABELS: [VerdictStatus; 4] = [
        VerdictStatus::Verified,
        VerdictStatus::False,
        VerdictStatus::Misleading,
        VerdictStatus::Unverifiable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictStatus::Verified => "Verified",
            VerdictStatus::False => "False",
            VerdictStatus::Misleading => "Misleading",
            VerdictStatus::Unverifiable => "Unverifiable",
            VerdictStatus::Error => "Error",
        }
    }

    /// Case-sensitive match against the model labels; anything else is
    /// `Unverifiable`.
    pub fn from_model_label(label: &str) -> Self {
        Self::MODEL_LABELS
            .into_iter()
            .find(|s| s.as_str() == label)
            .unwrap_or(VerdictStatus::Unverifiable)
    }
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The normalized judgment returned for one claim.
///
/// Fields are private so every instance goes through [`ClaimVerdict::new`],
/// which clamps credibility and truncates sources.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimVerdict {
    claim: String,
    status: VerdictStatus,
    explanation: String,
    credibility: f64,
    sources: Vec<String>,
}

impl ClaimVerdict {
    pub fn new(
        claim: impl Into<String>,
        status: VerdictStatus,
        explanation: impl Into<String>,
        credibility: f64,
        mut sources: Vec<String>,
    ) -> Self {
        let explanation = explanation.into();
        let explanation = if explanation.trim().is_empty() {
            DEFAULT_EXPLANATION.to_string()
        } else {
            explanation
        };
        sources.truncate(MAX_SOURCES);

        Self {
            claim: claim.into(),
            status,
            explanation,
            credibility: clamp_credibility(credibility),
            sources,
        }
    }

    pub fn claim(&self) -> &str {
        &self.claim
    }

    pub fn status(&self) -> VerdictStatus {
        self.status
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn credibility(&self) -> f64 {
        self.credibility
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Use `urls` (first [`MAX_SOURCES`]) when the verdict has no sources of
    /// its own.
    pub fn or_sources(mut self, urls: &[String]) -> Self {
        if self.sources.is_empty() {
            self.sources = urls.iter().take(MAX_SOURCES).cloned().collect();
        }
        self
    }
}

/// Clamp into `[0.0, 1.0]`. NaN maps to [`DEFAULT_CREDIBILITY`].
pub fn clamp_credibility(value: f64) -> f64 {
    if value.is_nan() {
        DEFAULT_CREDIBILITY
    } else {
        value.clamp(0.0, 1.0)
    }
}
