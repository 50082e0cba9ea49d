//! Curatorial interpretation of a search result set or a single asset.
//!
//! Flow: validate the request, build a fixed system prompt plus a
//! mode-specific user prompt, make exactly one JSON-mode completion call,
//! strip Markdown fences, and decode the reply against [`ModelReply`].

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::llm::client::{ChatMessage, ChatModel};
use crate::models::{AssetSummary, InterpretationResult};

/// Assets from a result page that are forwarded in board mode.
pub const MAX_BOARD_ASSETS: usize = 9;
/// Domain options offered to the model in asset mode.
pub const MAX_DOMAIN_OPTIONS: usize = 6;
/// Hard ceiling on returned bullets. The prompt itself asks for three.
pub const MAX_BULLETS: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum InterpretError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("Missing {0}")]
    MissingCredential(&'static str),
    #[error("No content returned from model")]
    EmptyResponse,
    #[error("Invalid JSON from model")]
    MalformedResponse { raw: String },
    #[error("Server error: {0}")]
    Server(String),
}

impl InterpretError {
    pub fn status(&self) -> StatusCode {
        match self {
            InterpretError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> Value {
        match self {
            InterpretError::Validation(msg) => json!({ "error": msg }),
            InterpretError::MissingCredential(_) | InterpretError::EmptyResponse => {
                json!({ "error": self.to_string() })
            }
            InterpretError::MalformedResponse { raw } => {
                json!({ "error": "Invalid JSON from model", "raw": raw })
            }
            InterpretError::Server(detail) => json!({ "error": "Server error", "detail": detail }),
        }
    }
}

impl IntoResponse for InterpretError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

/// Interpretation request, decoded from the loose JSON body.
#[derive(Debug, Clone, PartialEq)]
pub enum InterpretationRequest {
    Board {
        query: String,
        assets: Vec<AssetSummary>,
    },
    Asset {
        asset: AssetSummary,
    },
}

impl InterpretationRequest {
    /// Decode `{mode, q, assets, asset}`. `mode` other than `"asset"` means
    /// board mode.
    pub fn from_body(body: &Value) -> Result<Self, InterpretError> {
        let mode = body.get("mode").and_then(Value::as_str);

        if mode == Some("asset") {
            return match body.get("asset") {
                Some(asset @ Value::Object(_)) => Ok(InterpretationRequest::Asset {
                    asset: summarize(asset),
                }),
                _ => Err(InterpretError::Validation("Missing asset")),
            };
        }

        let query = match body.get("q") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        let assets: Vec<AssetSummary> = body
            .get("assets")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().take(MAX_BOARD_ASSETS).map(summarize).collect())
            .unwrap_or_default();

        if query.trim().is_empty() || assets.is_empty() {
            return Err(InterpretError::Validation("Missing query or assets"));
        }
        Ok(InterpretationRequest::Board { query, assets })
    }

    pub fn is_board(&self) -> bool {
        matches!(self, InterpretationRequest::Board { .. })
    }
}

/// Project an arbitrary JSON asset onto the five fields the model may see.
fn summarize(value: &Value) -> AssetSummary {
    let text = |key: &str| match value.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    };
    AssetSummary {
        title: text("title"),
        domain: text("domain"),
        direction: text("direction"),
        color_notes: text("color_notes"),
        print_pattern_notes: text("print_pattern_notes"),
    }
}

/// Split a delimited domain string on `,` `;` `|`, trim, drop empties, keep
/// the first six. Order and repeats are preserved.
pub fn parse_domain_options(domain: Option<&str>) -> Vec<String> {
    domain
        .unwrap_or_default()
        .split([',', ';', '|'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(MAX_DOMAIN_OPTIONS)
        .map(str::to_string)
        .collect()
}

pub fn build_system_prompt() -> String {
    String::from(
        "You are Pattern Curator Curatorial Intelligence (CI).\n\
         - For BOARD mode only, generate a short board_title (2 words max, Pattern Curator voice).\n\
         - For SINGLE ASSET mode, do NOT generate a title.\n\
         \n\
         Rules:\n\
         - Interpretation only. No forecasting. No trend-report language.\n\
         - Ground all insight in the provided metadata.\n\
         - Write for experienced creatives.\n\
         - Calm, editorial, intelligent tone.\n\
         - No taxonomy explanations.\n\
         - No repetition.\n\
         - Output valid JSON ONLY.\n\
         \n\
         Return this exact JSON shape:\n\
         {\n  \
           \"curatorial_summary\": \"3-4 sentences max.\",\n  \
           \"why_it_matters\": [\"bullet 1\", \"bullet 2\", \"bullet 3\"],\n  \
           \"context_pulse\": [\"bullet 1\", \"bullet 2\", \"bullet 3\"]\n\
         }\n\
         In BOARD mode also include \"board_title\".\n\
         \n\
         Constraints:\n\
         - Bullets max ~12 words.\n\
         - For SINGLE ASSET mode:\n  \
           - Interpret ONLY the single asset.\n  \
           - In the curatorial_summary, include ONE subtle line suggesting where this asset can be curated.\n  \
           - Use ONLY the provided domain options verbatim.",
    )
}

pub fn build_user_prompt(request: &InterpretationRequest) -> String {
    match request {
        InterpretationRequest::Asset { asset } => {
            let options = parse_domain_options(asset.domain.as_deref());
            format!(
                "MODE: SINGLE ASSET\n\n\
                 Asset:\n{}\n\n\
                 Domain options (use verbatim, do not invent):\n{}\n\n\
                 Instructions:\n\
                 - Write grounded interpretation of this asset only.\n\
                 - Include one line in the summary suggesting curation across the domain options.",
                pretty(asset),
                pretty(&options),
            )
        }
        InterpretationRequest::Board { query, assets } => format!(
            "MODE: CURATED BOARD\n\n\
             Search query:\n\"{query}\"\n\n\
             Assets:\n{}\n\n\
             Instructions:\n\
             - Interpret the set as a cohesive curated story.\n\
             - Do not forecast.",
            pretty(assets),
        ),
    }
}

fn pretty<T: serde::Serialize>(value: &T) -> String {
    // Serializing plain structs and string vectors cannot fail
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

pub fn build_messages(request: &InterpretationRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(build_system_prompt()),
        ChatMessage::user(build_user_prompt(request)),
    ]
}

/// Remove a leading ```` ```json ```` / ```` ``` ```` and a trailing ```` ``` ````, then trim.
/// Idempotent on already-clean text.
pub fn strip_code_fences(content: &str) -> String {
    let mut s = content.trim();
    if s.get(..7).is_some_and(|p| p.eq_ignore_ascii_case("```json")) {
        s = s[7..].trim_start();
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest.trim_start();
    }
    if let Some(rest) = s.trim_end().strip_suffix("```") {
        s = rest;
    }
    s.trim().to_string()
}

/// Reply schema. Text fields accept strings and scalars; bullet lists accept
/// arrays of strings and scalars. Structured values where text belongs are
/// rejected.
#[derive(Debug, Deserialize)]
pub struct ModelReply {
    #[serde(default, deserialize_with = "lenient_text")]
    pub board_title: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub curatorial_summary: String,
    #[serde(default, deserialize_with = "lenient_bullets")]
    pub why_it_matters: Vec<String>,
    #[serde(default, deserialize_with = "lenient_bullets")]
    pub context_pulse: Vec<String>,
}

fn scalar_text(value: Value) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.trim().to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Array(_) | Value::Object(_) => Err("expected text, found structured value".into()),
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let value = Value::deserialize(d)?;
    scalar_text(value)
        .map(Option::unwrap_or_default)
        .map_err(de::Error::custom)
}

fn lenient_bullets<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    match Value::deserialize(d)? {
        Value::Array(items) => {
            let mut bullets = Vec::with_capacity(items.len().min(MAX_BULLETS));
            for item in items {
                if bullets.len() == MAX_BULLETS {
                    break;
                }
                if let Some(text) = scalar_text(item).map_err(de::Error::custom)? {
                    bullets.push(text);
                }
            }
            Ok(bullets)
        }
        // Anything else reads as "no bullets"
        _ => Ok(Vec::new()),
    }
}

/// Turn raw model output into a result for the given mode.
pub fn decode_reply(content: &str, board_mode: bool) -> Result<InterpretationResult, InterpretError> {
    let cleaned = strip_code_fences(content);

    let value: Value = serde_json::from_str(&cleaned).map_err(|_| {
        InterpretError::MalformedResponse {
            raw: cleaned.clone(),
        }
    })?;
    if !value.is_object() {
        return Err(InterpretError::MalformedResponse { raw: cleaned });
    }
    let reply: ModelReply = serde_json::from_value(value).map_err(|e| {
        tracing::warn!("Model reply failed schema validation: {e}");
        InterpretError::MalformedResponse {
            raw: cleaned.clone(),
        }
    })?;

    Ok(InterpretationResult {
        board_title: board_mode.then_some(reply.board_title),
        curatorial_summary: reply.curatorial_summary,
        why_it_matters: reply.why_it_matters,
        context_pulse: reply.context_pulse,
    })
}

/// The interpretation service. Holds the process-wide model client.
#[derive(Clone)]
pub struct Interpreter {
    model: Arc<dyn ChatModel>,
}

impl Interpreter {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Fails with `MissingCredential` before anything else is done.
    pub fn ensure_credential(&self) -> Result<(), InterpretError> {
        match self.model.missing_credential() {
            Some(var) => Err(InterpretError::MissingCredential(var)),
            None => Ok(()),
        }
    }

    /// Interpret a raw request body end to end.
    pub async fn interpret_body(&self, body: &Value) -> Result<InterpretationResult, InterpretError> {
        self.ensure_credential()?;
        let request = InterpretationRequest::from_body(body)?;
        self.interpret(&request).await
    }

    /// One outbound model call per invocation. No retry, no cache.
    pub async fn interpret(
        &self,
        request: &InterpretationRequest,
    ) -> Result<InterpretationResult, InterpretError> {
        self.ensure_credential()?;

        let messages = build_messages(request);
        let content = self
            .model
            .complete_json(&messages)
            .await
            .map_err(|e| InterpretError::Server(format!("{e:#}")))?
            .ok_or(InterpretError::EmptyResponse)?;

        decode_reply(&content, request.is_board())
    }
}
