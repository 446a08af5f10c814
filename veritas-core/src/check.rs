//! Claim check pipeline.
//!
//! upstream result → [`extract_candidate`] → [`normalize`] → verdict, with
//! every failure routed to the fallback classifier. A model verdict without
//! sources takes the upstream citations instead. Nothing here retries or
//! suspends; the caller owns the upstream call.

use thiserror::Error;

use crate::extract::{extract_candidate, ExtractionError};
use crate::fallback;
use crate::normalize::{normalize, ParseError};
use crate::provider::{Completion, UpstreamError, VerdictProvider};
use crate::prompt::build_prompt;
use crate::verdict::ClaimVerdict;

/// Why a verdict came from the fallback classifier instead of the model.
#[derive(Error, Debug)]
pub enum CheckFailure {
    #[error("upstream call failed: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("no structured payload in model response: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("model payload could not be parsed: {0}")]
    Parse(#[from] ParseError),
}

impl CheckFailure {
    /// Short label for logs and metrics fields.
    pub fn kind(&self) -> &'static str {
        match self {
            CheckFailure::Upstream(_) => "upstream",
            CheckFailure::Extraction(_) => "extraction",
            CheckFailure::Parse(_) => "parse",
        }
    }
}

/// Outcome of resolving one claim.
#[derive(Debug)]
pub struct Resolution {
    pub verdict: ClaimVerdict,
    /// `None` when the verdict came from the model.
    pub fallback: Option<CheckFailure>,
}

impl Resolution {
    pub fn from_model(&self) -> bool {
        self.fallback.is_none()
    }
}

/// Turn an upstream result into a verdict for `claim`. Never fails.
pub fn resolve(claim: &str, upstream: Result<Completion, UpstreamError>) -> Resolution {
    match model_verdict(claim, upstream) {
        Ok(verdict) => Resolution {
            verdict,
            fallback: None,
        },
        Err(failure) => {
            let verdict = fallback::classify(claim);
            tracing::warn!(
                reason = failure.kind(),
                error = %failure,
                status = %verdict.status(),
                credibility = verdict.credibility(),
                "Model verdict unavailable, using fallback classifier"
            );
            Resolution {
                verdict,
                fallback: Some(failure),
            }
        }
    }
}

fn model_verdict(
    claim: &str,
    upstream: Result<Completion, UpstreamError>,
) -> Result<ClaimVerdict, CheckFailure> {
    let completion = upstream?;
    let candidate = extract_candidate(&completion.text)?;
    Ok(normalize(candidate, claim)?.or_sources(&completion.citations))
}

/// Ask `provider` about `claim` and resolve the answer. With no provider the
/// claim goes straight to the fallback classifier.
pub async fn check_claim(provider: Option<&dyn VerdictProvider>, claim: &str) -> Resolution {
    let upstream = match provider {
        Some(p) => {
            tracing::debug!(provider = p.name(), model = p.model(), "Calling upstream provider");
            p.complete(&build_prompt(claim)).await
        }
        None => Err(UpstreamError::NotConfigured),
    };
    resolve(claim, upstream)
}
