//! Gemini reasoning client for whole-document ordering proposals.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ProposedOrder, ProviderError, ReasoningClient};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const SYSTEM_PROMPT: &str = "You are reconstructing the page order of a shuffled document. \
You receive one summary per page, labeled with the page's index in the shuffled input. \
Respond with JSON only, shaped as {\"order\": [..], \"confidence\": 0.0-1.0, \"rationale\": \"..\"}. \
\"order\" must list every input index exactly once, first page first.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: String,
}

pub struct GeminiReasoningClient {
    http: Client,
    api_key: String,
    model: String,
}

impl GeminiReasoningClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            http: Client::new(),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl ReasoningClient for GeminiReasoningClient {
    async fn propose_order(&self, summaries: &[String]) -> Result<ProposedOrder, ProviderError> {
        let mut prompt = String::new();
        for (index, summary) in summaries.iter().enumerate() {
            prompt.push_str(&format!("[page {index}]\n{summary}\n\n"));
        }

        let request = GenerateRequest {
            system_instruction: Content {
                parts: vec![Part {
                    text: SYSTEM_PROMPT.to_string(),
                }],
            },
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                temperature: 0.0,
            },
        };

        let url = format!("{BASE_URL}/{}:generateContent", self.model);
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = parsed
            .candidates
            .first()
            .and_then(|candidate| candidate.content.parts.first())
            .map(|part| part.text.as_str())
            .ok_or_else(|| ProviderError::Malformed("empty candidate list".to_string()))?;

        serde_json::from_str(text)
            .map_err(|err| ProviderError::Malformed(format!("bad ordering payload: {err}")))
    }
}
