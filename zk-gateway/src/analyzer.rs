//! Target-conflict analysis.
//!
//! Sends a German text to the language model with a fixed instruction prompt
//! and turns the model's JSON answer into an [`AnalyzeResponse`]:
//!
//! ```text
//! text → validate → truncate → prompt → provider.chat
//!      → strip fences → parse JSON → clean poles → AnalyzeResponse
//! ```

use crate::error::AnalyzeError;
use crate::provider::{ChatRequest, Provider};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use zk_common::util::{char_len, truncate_chars};

/// Shortest text accepted for analysis, in characters.
pub const MIN_TEXT_CHARS: usize = 50;

/// Longest prefix of the text that is sent to the model, in characters.
pub const MAX_TEXT_CHARS: usize = 2000;

/// Confidence reported when the model omits one.
pub const DEFAULT_CONFIDENCE: &str = "mittel";

static LEADING_ARTICLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(der|die|das|dem|den|ein|eine)\s+").expect("valid article regex")
});

static QUOTE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"["'`„“”‚‘’«»]"#).expect("valid quote regex"));

static JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)```json").expect("valid fence regex"));

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body of `POST /analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
}

/// Cleaned result of one analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(rename = "polA")]
    pub pol_a: String,
    #[serde(rename = "polB")]
    pub pol_b: String,
    pub confidence: String,
    pub explanation: String,
}

/// The model's answer as it arrives, before cleanup.
#[derive(Debug, Deserialize)]
struct RawVerdict {
    #[serde(rename = "polA", default)]
    pol_a: String,
    #[serde(rename = "polB", default)]
    pol_b: String,
    #[serde(default)]
    confidence: Option<String>,
    #[serde(rename = "begründung", default)]
    begruendung: Option<String>,
}

// ============================================================================
// Analyzer
// ============================================================================

/// Asks a [`Provider`] for the target conflict in a text.
pub struct ConflictAnalyzer {
    provider: Arc<dyn Provider>,
    model: String,
    max_tokens: u32,
}

impl ConflictAnalyzer {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens,
        }
    }

    /// Run the full pipeline for one text.
    pub async fn analyze(&self, text: &str) -> Result<AnalyzeResponse, AnalyzeError> {
        let input = validate_text(text)?;
        let prompt = build_prompt(input);

        tracing::debug!(
            provider = self.provider.name(),
            model = %self.model,
            text_chars = char_len(text),
            sent_chars = char_len(input),
            "Requesting conflict analysis"
        );

        let request = ChatRequest::user(&self.model, self.max_tokens, prompt);
        let reply = match self.provider.chat(request).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    upstream_status = err.status_code(),
                    error = %err,
                    "Model call failed"
                );
                return Err(err.into());
            }
        };

        tracing::info!(
            provider = %reply.provider,
            model = %reply.model,
            finish_reason = reply.finish_reason.as_deref().unwrap_or("unknown"),
            latency_ms = reply.latency_ms,
            input_tokens = reply.usage.input_tokens,
            output_tokens = reply.usage.output_tokens,
            "Model replied"
        );

        let verdict = parse_verdict(&reply.content)?;
        Ok(verdict)
    }
}

// ============================================================================
// Pipeline steps
// ============================================================================

/// Reject texts that are too short and cut long ones to [`MAX_TEXT_CHARS`].
pub fn validate_text(text: &str) -> zk_common::Result<&str> {
    if char_len(text) < MIN_TEXT_CHARS {
        return Err(zk_common::Error::InvalidInput(format!(
            "Text too short. Minimum {MIN_TEXT_CHARS} characters required."
        )));
    }
    Ok(truncate_chars(text, MAX_TEXT_CHARS))
}

/// Fill the instruction template with the (already truncated) text.
pub fn build_prompt(text: &str) -> String {
    format!(
        r#"Analysiere diesen deutschen Text und identifiziere den zentralen Zielkonflikt.

Ein ZK ist ein systemischer Konflikt zwischen zwei gesellschaftlichen Funktionen/Werten, die sich gegenseitig behindern.

TEXT:
"""
{text}
"""

AUFGABE:
1. Finde die zwei gegensätzlichen Pole des Hauptkonflikts
2. Formuliere sie präzise und konkret (max 50 Zeichen pro Pol)
3. Begründe kurz, warum das der Kernkonflikt ist

WICHTIG:
- Pole müssen abstrakte Systemfunktionen sein, keine Akteure
- Beispiel GUT: "Kosteneffizienz ↔ Lebensschutz"
- Beispiel SCHLECHT: "Streeck ↔ Patientenschützer"

ANTWORT NUR als JSON ohne Markdown-Backticks:
{{
  "polA": "Prägnante Bezeichnung",
  "polB": "Prägnante Bezeichnung",
  "confidence": "hoch",
  "begründung": "1-2 Sätze Erklärung"
}}"#
    )
}

/// Remove markdown fence artifacts the model sometimes wraps JSON in.
pub fn strip_code_fences(raw: &str) -> String {
    let without_opener = JSON_FENCE.replace_all(raw, "");
    without_opener
        .replace("```", "")
        .replace("'''", "")
        .trim()
        .to_string()
}

/// Normalize a pole label: drop a leading article, quote marks, and outer whitespace.
///
/// Repeats until nothing changes, so `clean_pole(clean_pole(s)) == clean_pole(s)`.
pub fn clean_pole(raw: &str) -> String {
    let mut current = raw.to_string();
    loop {
        let without_article = LEADING_ARTICLE.replace(&current, "");
        let next = QUOTE_CHARS
            .replace_all(&without_article, "")
            .trim()
            .to_string();
        if next == current {
            return next;
        }
        current = next;
    }
}

/// Parse the model's text into a cleaned response.
pub fn parse_verdict(content: &str) -> zk_common::Result<AnalyzeResponse> {
    let stripped = strip_code_fences(content);
    let raw: RawVerdict = serde_json::from_str(&stripped)?;

    Ok(AnalyzeResponse {
        pol_a: clean_pole(&raw.pol_a),
        pol_b: clean_pole(&raw.pol_b),
        confidence: raw
            .confidence
            .unwrap_or_else(|| DEFAULT_CONFIDENCE.to_string()),
        explanation: raw.begruendung.unwrap_or_default(),
    })
}
