//! Response extraction - isolates the JSON body a model wrapped in prose or
//! markdown fences.
//!
//! Priority order (first match wins):
//! 1. the first ```` ```json ```` fence, up to the next closing fence
//! 2. the first fence of any kind, up to the next closing fence
//! 3. the whole trimmed input
//!
//! An opening fence with no closing fence is a failure; the remainder of the
//! text is never consumed as the payload.

use thiserror::Error;

const FENCE: &str = "```";
const DATA_TAG: &str = "json";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("model response was empty")]
    Empty,

    #[error("fenced block opened at byte {offset} was never closed")]
    UnterminatedFence { offset: usize },

    #[error("fenced block contained no content")]
    EmptyFence,
}

/// Extract the candidate structured payload from raw model text.
pub fn extract_candidate(raw: &str) -> Result<&str, ExtractionError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ExtractionError::Empty);
    }

    if let Some(body_start) = find_tagged_fence(text) {
        return fenced_body(text, body_start);
    }

    if let Some(open) = text.find(FENCE) {
        let after = open + FENCE.len();
        return fenced_body(text, after + info_string_len(&text[after..]));
    }

    Ok(text)
}

/// Byte offset just past the first ```` ```json ```` opening fence.
///
/// The tag must not run on into a longer word: ```` ```json{ ```` is tagged,
/// ```` ```jsonc ```` and ```` ```json5 ```` are not.
fn find_tagged_fence(text: &str) -> Option<usize> {
    let mut search_from = 0;
    while let Some(pos) = text[search_from..].find(FENCE) {
        let tag_start = search_from + pos + FENCE.len();
        let rest = &text[tag_start..];
        let tagged = rest
            .get(..DATA_TAG.len())
            .is_some_and(|tag| tag.eq_ignore_ascii_case(DATA_TAG));
        if tagged {
            let tag_end = tag_start + DATA_TAG.len();
            let boundary = text[tag_end..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphanumeric());
            if boundary {
                return Some(tag_end);
            }
        }
        // Fences pair up; skip the block this one opens.
        match text[tag_start..].find(FENCE) {
            Some(close) => search_from = tag_start + close + FENCE.len(),
            None => return None,
        }
    }
    None
}

/// Length of an info string (e.g. `text`, `yaml`) directly after an untagged
/// opening fence. Only a single bare word terminated by a newline counts.
fn info_string_len(after_fence: &str) -> usize {
    let Some(newline) = after_fence.find('\n') else {
        return 0;
    };
    let first_line = &after_fence[..newline];
    let is_word = !first_line.trim().is_empty()
        && first_line
            .trim()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '+');
    if is_word {
        newline
    } else {
        0
    }
}

fn fenced_body(text: &str, body_start: usize) -> Result<&str, ExtractionError> {
    let rest = &text[body_start..];
    let close = rest.find(FENCE).ok_or(ExtractionError::UnterminatedFence {
        offset: body_start,
    })?;
    let body = rest[..close].trim();
    if body.is_empty() {
        return Err(ExtractionError::EmptyFence);
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{"status":"Verified","explanation":"x","credibility":0.9}"#;

    #[test]
    fn test_tagged_fence_round_trip() {
        let raw = format!("```json\n{}\n```", PAYLOAD);
        assert_eq!(extract_candidate(&raw), Ok(PAYLOAD));
    }

    #[test]
    fn test_tagged_fence_with_surrounding_prose() {
        let raw = format!(
            "Here is my analysis:\n```json\n{}\n```\nLet me know if you need more.",
            PAYLOAD
        );
        assert_eq!(extract_candidate(&raw), Ok(PAYLOAD));
    }

    #[test]
    fn test_tagged_fence_is_case_insensitive() {
        let raw = format!("```JSON\n{}\n```", PAYLOAD);
        assert_eq!(extract_candidate(&raw), Ok(PAYLOAD));
    }

    #[test]
    fn test_tagged_fence_preferred_over_earlier_untagged() {
        let raw = format!("```\nnot it\n```\n```json\n{}\n```", PAYLOAD);
        assert_eq!(extract_candidate(&raw), Ok(PAYLOAD));
    }

    #[test]
    fn test_only_first_tagged_block_used() {
        let raw = format!("```json\n{}\n```\n```json\n{{\"status\":\"False\"}}\n```", PAYLOAD);
        assert_eq!(extract_candidate(&raw), Ok(PAYLOAD));
    }

    #[test]
    fn test_untagged_fence() {
        let raw = format!("```\n{}\n```", PAYLOAD);
        assert_eq!(extract_candidate(&raw), Ok(PAYLOAD));
    }

    #[test]
    fn test_untagged_fence_skips_info_string() {
        let raw = format!("```text\n{}\n```", PAYLOAD);
        assert_eq!(extract_candidate(&raw), Ok(PAYLOAD));
    }

    #[test]
    fn test_tag_directly_followed_by_payload() {
        let raw = format!("```json{}```", PAYLOAD);
        assert_eq!(extract_candidate(&raw), Ok(PAYLOAD));

        let raw = format!("Verdict: ```JSON{}\n```", PAYLOAD);
        assert_eq!(extract_candidate(&raw), Ok(PAYLOAD));
    }

    #[test]
    fn test_jsonc_fence_is_not_tagged() {
        let raw = format!("```jsonc\n{}\n```", PAYLOAD);
        // Falls through to the untagged branch; the info string is skipped.
        assert_eq!(extract_candidate(&raw), Ok(PAYLOAD));
    }

    #[test]
    fn test_inline_fence_keeps_content() {
        let raw = format!("```{}```", PAYLOAD);
        assert_eq!(extract_candidate(&raw), Ok(PAYLOAD));
    }

    #[test]
    fn test_unfenced_input_is_trimmed() {
        let raw = format!("  \n{}\n\t", PAYLOAD);
        assert_eq!(extract_candidate(&raw), Ok(PAYLOAD));
    }

    #[test]
    fn test_empty_input_fails() {
        assert_eq!(extract_candidate(""), Err(ExtractionError::Empty));
        assert_eq!(extract_candidate("  \n "), Err(ExtractionError::Empty));
    }

    #[test]
    fn test_unterminated_tagged_fence_fails() {
        let raw = format!("```json\n{}\nand then some trailing text", PAYLOAD);
        assert!(matches!(
            extract_candidate(&raw),
            Err(ExtractionError::UnterminatedFence { .. })
        ));
    }

    #[test]
    fn test_unterminated_untagged_fence_fails() {
        let raw = format!("Sure!\n```\n{}", PAYLOAD);
        assert!(matches!(
            extract_candidate(&raw),
            Err(ExtractionError::UnterminatedFence { .. })
        ));
    }

    #[test]
    fn test_empty_fence_fails() {
        assert_eq!(extract_candidate("```json\n\n```"), Err(ExtractionError::EmptyFence));
    }
}
