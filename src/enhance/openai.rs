//! OpenAI chat-completion enhancer for Arabic text

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::enhance::TextEnhancer;
use crate::{Error, Result};

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
const CHAT_MODEL: &str = "gpt-3.5-turbo";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const CORRECTION_PROMPT: &str = "أنت متخصص في تصحيح النصوص العربية. \nقم بتصحيح الأخطاء الإملائية واللغوية في النص دون تغيير المعنى.\nأرجع النص المصحح فقط بدون شرح.";

const NARRATION_PROMPT: &str = "أنت مساعد ذكي متخصص في نظام إدارة المبيعات والفواتير. \nقم بتوليد رد ودود وواضح بالعربية يشرح نتيجة الأمر الصوتي للمستخدم.\nالرد يجب أن يكون قصير ومختصر (جملة واحدة أو جملتين).";

/// Enhancer backed by the OpenAI chat completions API
pub struct OpenAiEnhancer {
    client: Client,
    api_key: SecretString,
}

impl OpenAiEnhancer {
    /// Create a new enhancer using the given API key
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed
    pub fn new(api_key: SecretString) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self { client, api_key })
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String> {
        let response = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(self.api_key.expose_secret())
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Enhance(format!(
                "chat completion failed: {status} - {body}"
            )));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Enhance("chat completion returned no choices".to_string()))?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl TextEnhancer for OpenAiEnhancer {
    async fn correct_text(&self, text: &str) -> String {
        let request = ChatRequest {
            model: CHAT_MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: CORRECTION_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: text.to_string(),
                },
            ],
            temperature: 0.3,
            max_tokens: 200,
        };

        match self.chat(&request).await {
            Ok(corrected) => corrected,
            Err(e) => {
                tracing::warn!(error = %e, "text correction failed, keeping raw transcript");
                text.to_string()
            }
        }
    }

    async fn narrate(&self, command: &str, result: &serde_json::Value) -> String {
        let request = ChatRequest {
            model: CHAT_MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: NARRATION_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!(
                        "الأمر: \"{command}\"\nالنتيجة: {result}\nالسياق: \n\nقم بتوليد رد ودود يشرح النتيجة:"
                    ),
                },
            ],
            temperature: 0.7,
            max_tokens: 150,
        };

        match self.chat(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "narration failed, using generic acknowledgement");
                "تم معالجة الأمر بنجاح".to_string()
            }
        }
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: &'static str,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}
