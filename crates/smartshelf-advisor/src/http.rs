//! HTTP advisory provider against an OpenAI-compatible completion endpoint

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use smartshelf_types::RestockRecommendation;

use crate::{AdvisoryProvider, AdvisoryUnavailable, Result, StockSnapshot};

/// Configuration for the HTTP advisory provider
#[derive(Debug, Clone)]
pub struct HttpAdvisorConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl Default for HttpAdvisorConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("SHELF_ADVISOR_URL")
                .unwrap_or_else(|_| "http://localhost:8000/v1".to_string()),
            api_key: std::env::var("SHELF_ADVISOR_API_KEY").ok(),
            model: std::env::var("SHELF_ADVISOR_MODEL").unwrap_or_else(|_| "default".to_string()),
        }
    }
}

/// Advisory provider that asks a chat-completion model for a recommendation
pub struct HttpAdvisor {
    config: HttpAdvisorConfig,
    client: reqwest::Client,
}

impl HttpAdvisor {
    pub fn new(config: HttpAdvisorConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(HttpAdvisorConfig::default())
    }

    fn prompt(snapshot: &StockSnapshot) -> String {
        format!(
            "You are an autonomous procurement agent for a small store.\n\n\
             CURRENT SITUATION:\n\
             - Item: {}\n\
             - Current stock: {} {}\n\
             - Restock threshold: {}\n\
             - Sales in the recent window: {}\n\n\
             Decide whether to restock. Respond with JSON only:\n\
             {{\"shouldRestock\": bool, \"recommendedQuantity\": number, \
             \"reason\": \"short explanation\", \"urgencyScore\": number (1-10)}}",
            snapshot.item, snapshot.stock, snapshot.unit, snapshot.threshold, snapshot.recent_sales
        )
    }

    /// Strip markdown fences some models wrap around JSON output
    fn clean(content: &str) -> &str {
        content
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[async_trait]
impl AdvisoryProvider for HttpAdvisor {
    async fn recommend(&self, snapshot: &StockSnapshot) -> Result<RestockRecommendation> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Self::prompt(snapshot),
            }],
            max_tokens: 256,
            temperature: 0.0,
        };

        let url = format!("{}/chat/completions", self.config.base_url);
        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AdvisoryUnavailable::Request {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(AdvisoryUnavailable::Request {
                message: format!("HTTP {}", response.status()),
            });
        }

        let chat: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| AdvisoryUnavailable::InvalidResponse {
                    message: e.to_string(),
                })?;

        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| AdvisoryUnavailable::InvalidResponse {
                message: "empty choices".to_string(),
            })?;

        serde_json::from_str(Self::clean(content)).map_err(|e| {
            AdvisoryUnavailable::InvalidResponse {
                message: e.to_string(),
            }
        })
    }
}
