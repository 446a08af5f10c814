pub mod chat_completions;
pub mod check;
pub mod config;
pub mod detect;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod normalize;
pub mod prompt;
pub mod provider;
pub mod verdict;

pub use crate::config::VeritasConfig;
pub use chat_completions::ChatCompletionsClient;
pub use check::{check_claim, resolve, CheckFailure, Resolution};
pub use detect::{detect_claims, DetectedClaim};
pub use error::VeritasError;
pub use extract::{extract_candidate, ExtractionError};
pub use fallback::classify;
pub use normalize::{normalize, ParseError};
pub use provider::{
    create_provider, Completion, GeminiClient, ProviderConfig, ProviderSettings, UpstreamError,
    VerdictProvider,
};
pub use verdict::{ClaimVerdict, VerdictStatus};
