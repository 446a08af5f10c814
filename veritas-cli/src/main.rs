//! veritas-cli - command-line client for the Veritas fact-check API
//!
//! # Subcommands
//! - `check <claim> [--json]`       - fact-check a single claim
//! - `detect [file|-] [--json]`     - list claim-like passages in a document
//! - `status`                       - show server health

use std::io::Read;

use clap::{Parser, Subcommand};
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8000";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "veritas-cli",
    version,
    about = "Veritas claim fact-checking from the terminal"
)]
struct Cli {
    /// Veritas HTTP server URL (overrides VERITAS_HTTP_URL env var)
    #[arg(long, env = "VERITAS_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fact-check a claim
    Check {
        /// The claim to check
        claim: String,

        /// Print the raw verdict JSON
        #[arg(long)]
        json: bool,
    },

    /// Find claim-like passages in a text file
    Detect {
        /// File to scan; `-` or omitted reads stdin
        file: Option<String>,

        /// Print the raw detection JSON
        #[arg(long)]
        json: bool,
    },

    /// Show Veritas server status
    Status,
}

// ============================================================================
// API Response Types
// ============================================================================

/// Verdict as returned by POST /api/check.
///
/// `status` stays a plain string so a newer server can add labels without
/// breaking older clients.
#[derive(Debug, Deserialize)]
pub struct VerdictView {
    pub claim: String,
    pub status: String,
    pub explanation: String,
    pub credibility: f64,
    #[serde(default)]
    pub sources: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct DetectedView {
    pub text: String,
    pub category: String,
}

/// Response from POST /api/detect
#[derive(Debug, Deserialize)]
pub struct DetectResponse {
    pub count: usize,
    pub claims: Vec<DetectedView>,
}

// ============================================================================
// Formatting
// ============================================================================

/// Coarse band for a credibility score: high above 0.7, medium above 0.4.
pub fn credibility_band(credibility: f64) -> &'static str {
    if credibility > 0.7 {
        "high"
    } else if credibility > 0.4 {
        "medium"
    } else {
        "low"
    }
}

/// Human-readable rendering of a verdict.
pub fn format_verdict(v: &VerdictView) -> String {
    let mut out = format!(
        "Claim:       {}\nVerdict:     {}\nConfidence:  {:.0}% ({})\n\n{}\n",
        v.claim,
        v.status,
        v.credibility * 100.0,
        credibility_band(v.credibility),
        v.explanation
    );

    if !v.sources.is_empty() {
        out.push_str("\nSources:\n");
        for (i, s) in v.sources.iter().enumerate() {
            out.push_str(&format!("  [{}] {}\n", i + 1, s));
        }
    }
    out
}

pub fn format_detections(resp: &DetectResponse) -> String {
    let mut out = String::new();
    for c in &resp.claims {
        out.push_str(&format!("[{}] {}\n", c.category, c.text));
    }
    out.push_str(&format!("\n{} claim(s) found\n", resp.count));
    out
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn http_client(timeout_secs: u64) -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()?)
}

/// POST `body` to `url`, exiting with a message on transport or HTTP failure.
fn post_or_exit(
    client: &reqwest::blocking::Client,
    url: &str,
    body: &serde_json::Value,
) -> reqwest::blocking::Response {
    let resp = match client.post(url).json(body).send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("veritas-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    if !resp.status().is_success() {
        let status = resp.status();
        let body: serde_json::Value = resp.json().unwrap_or_default();
        let detail = body["error"].as_str().unwrap_or("no detail");
        eprintln!("veritas-cli: server returned {}: {}", status, detail);
        std::process::exit(1);
    }

    resp
}

/// Fact-check a claim against POST /api/check.
fn do_check(server: &str, claim: &str, json_output: bool) -> anyhow::Result<()> {
    // Upstream calls retry on the server side, so allow more than its own timeout.
    let client = http_client(90)?;
    let url = format!("{}/api/check", server);
    let resp = post_or_exit(&client, &url, &serde_json::json!({ "text": claim }));

    let body: serde_json::Value = match resp.json() {
        Ok(b) => b,
        Err(e) => {
            eprintln!("veritas-cli: failed to parse verdict: {}", e);
            std::process::exit(1);
        }
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let verdict: VerdictView = serde_json::from_value(body)?;
    print!("{}", format_verdict(&verdict));
    Ok(())
}

/// Read `file` (or stdin) and send it to POST /api/detect.
fn do_detect(server: &str, file: Option<&str>, json_output: bool) -> anyhow::Result<()> {
    let text = match file {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
        Some(path) => std::fs::read_to_string(path)?,
    };

    if text.trim().is_empty() {
        eprintln!("veritas-cli: nothing to scan");
        std::process::exit(1);
    }

    let client = http_client(30)?;
    let url = format!("{}/api/detect", server);
    let resp = post_or_exit(&client, &url, &serde_json::json!({ "text": text }));

    let detected: serde_json::Value = resp.json()?;
    if json_output {
        println!("{}", serde_json::to_string_pretty(&detected)?);
        return Ok(());
    }

    let detected: DetectResponse = serde_json::from_value(detected)?;
    if detected.claims.is_empty() {
        eprintln!("No claims found");
        return Ok(());
    }
    print!("{}", format_detections(&detected));
    Ok(())
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let client = http_client(10)?;

    let url = format!("{}/health", server);
    let resp = client.get(&url).send();

    match resp {
        Ok(r) if r.status().is_success() => {
            let body: serde_json::Value = r.json().unwrap_or_default();
            println!("Veritas server: {}", body["status"].as_str().unwrap_or("unknown"));
            println!("Version:        {}", body["version"].as_str().unwrap_or("?"));
            println!("Provider:       {}", body["provider"].as_str().unwrap_or("?"));
            println!("Model:          {}", body["model"].as_str().unwrap_or("?"));
        }
        Ok(r) => {
            eprintln!("veritas-cli: server unhealthy (HTTP {})", r.status());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("veritas-cli: cannot reach {}: {}", url, e);
            std::process::exit(1);
        }
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Check { claim, json } => do_check(&server, &claim, json),
        Commands::Detect { file, json } => do_detect(&server, file.as_deref(), json),
        Commands::Status => do_status(&server),
    };

    if let Err(e) = result {
        eprintln!("veritas-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(status: &str, credibility: f64, sources: &[&str]) -> VerdictView {
        VerdictView {
            claim: "The Great Wall is visible from space".to_string(),
            status: status.to_string(),
            explanation: "It is not visible to the naked eye.".to_string(),
            credibility,
            sources: sources.iter().map(|s| s.to_string()).collect(),
        }
    }

    // ========================================================================
    // TEST 1: Credibility bands use strict thresholds
    // ========================================================================
    #[test]
    fn test_credibility_band_thresholds() {
        assert_eq!(credibility_band(1.0), "high");
        assert_eq!(credibility_band(0.71), "high");
        assert_eq!(credibility_band(0.7), "medium");
        assert_eq!(credibility_band(0.41), "medium");
        assert_eq!(credibility_band(0.4), "low");
        assert_eq!(credibility_band(0.0), "low");
    }

    // ========================================================================
    // TEST 2: Human output shows verdict, percentage and band
    // ========================================================================
    #[test]
    fn test_format_verdict_header() {
        let out = format_verdict(&verdict("False", 0.1, &[]));
        assert!(out.contains("Verdict:     False"));
        assert!(out.contains("Confidence:  10% (low)"));
        assert!(out.contains("It is not visible to the naked eye."));
        assert!(!out.contains("Sources:"), "no sources section when empty");
    }

    // ========================================================================
    // TEST 3: Sources are numbered in order
    // ========================================================================
    #[test]
    fn test_format_verdict_sources() {
        let out = format_verdict(&verdict(
            "Verified",
            0.9,
            &["https://a.example", "https://b.example"],
        ));
        assert!(out.contains("Confidence:  90% (high)"));
        let a = out.find("[1] https://a.example").expect("first source");
        let b = out.find("[2] https://b.example").expect("second source");
        assert!(a < b);
    }

    // ========================================================================
    // TEST 4: Verdict JSON from the server deserializes, unknown labels too
    // ========================================================================
    #[test]
    fn test_verdict_view_accepts_server_json() {
        let json = serde_json::json!({
            "claim": "x",
            "status": "Error",
            "explanation": "Analysis complete.",
            "credibility": 0.5
        });
        let v: VerdictView = serde_json::from_value(json).expect("Should parse");
        assert_eq!(v.status, "Error");
        assert!(v.sources.is_empty(), "missing sources default to empty");
    }

    // ========================================================================
    // TEST 5: Detection listing includes category tags and a count
    // ========================================================================
    #[test]
    fn test_format_detections() {
        let resp: DetectResponse = serde_json::from_value(serde_json::json!({
            "count": 2,
            "claims": [
                { "text": "Experts warn the lake will dry up.", "category": "attribution" },
                { "text": "The flat earth theory is spreading.", "category": "conspiracy" }
            ]
        }))
        .expect("Should parse");

        let out = format_detections(&resp);
        assert!(out.starts_with("[attribution] Experts warn the lake will dry up.\n"));
        assert!(out.contains("[conspiracy] The flat earth theory is spreading."));
        assert!(out.trim_end().ends_with("2 claim(s) found"));
    }
}
