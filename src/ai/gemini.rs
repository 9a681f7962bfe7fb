use anyhow::{anyhow, bail, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{sanitize_marketing_text, TextGenerator};
use crate::candidate::Candidate;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const MAX_TEXT_CHARS: usize = 600;

/// Gemini `generateContent` client producing a short promotional blurb.
pub struct GeminiGenerator {
    http: Client,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl GeminiGenerator {
    pub fn new(http: Client, api_key: String, model: impl Into<String>) -> Self {
        Self {
            http,
            api_key,
            model: model.into(),
            timeout: Duration::from_secs(15),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs.max(1));
        self
    }
}

pub fn build_prompt(candidate: &Candidate) -> String {
    format!(
        "Você é um especialista em marketing para um canal de ofertas. Crie uma chamada curta e \
         empolgante (máximo 3 frases, use emojis) para o produto: '{}'. Foque nos benefícios. \
         Responda apenas com o texto, sem HTML nem Markdown.",
        candidate.name
    )
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}
#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}
#[derive(Serialize)]
struct Req<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    candidates: Vec<RespCandidate>,
}
#[derive(Deserialize)]
struct RespCandidate {
    content: Option<RespContent>,
}
#[derive(Deserialize)]
struct RespContent {
    #[serde(default)]
    parts: Vec<RespPart>,
}
#[derive(Deserialize)]
struct RespPart {
    #[serde(default)]
    text: String,
}

/// First candidate's text parts, concatenated and sanitized.
pub fn extract_text(body: &str) -> Result<String> {
    let resp: Resp = serde_json::from_str(body).context("parse gemini JSON")?;
    let text: String = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();
    let cleaned = sanitize_marketing_text(&text, MAX_TEXT_CHARS);
    if cleaned.is_empty() {
        bail!("gemini returned no text");
    }
    Ok(cleaned)
}

#[async_trait::async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, candidate: &Candidate) -> Result<String> {
        let prompt = build_prompt(candidate);
        let req = Req {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
        };
        let url = format!("{API_BASE}/{}:generateContent", self.model);

        let resp = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .timeout(self.timeout)
            .json(&req)
            .send()
            .await
            .map_err(|e| anyhow!("gemini request failed: {}", e.without_url()))?;
        let status = resp.status();
        let body = resp.text().await.context("read gemini body")?;
        if !status.is_success() {
            bail!("gemini HTTP {status}");
        }
        extract_text(&body)
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}
