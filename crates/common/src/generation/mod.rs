//! Answer generation - turns an assembled legal context into a reply
//!
//! Providers:
//! - Groq (OpenAI-compatible chat completions, LLaMA models)
//! - Mock (echoes the context, no API needed)

use crate::config::GenerationConfig;
use crate::errors::{AppError, Result};
use crate::metrics;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// System prompt for the legal assistant
pub const SYSTEM_PROMPT: &str = "Tu es un assistant juridique algérien expert du Code pénal.
Tu dois:
- Répondre en français de manière claire et professionnelle
- Utiliser UNIQUEMENT les informations du contexte fourni
- Citer les articles de loi quand disponibles
- Mentionner les sanctions (prison et amende)
- NE JAMAIS inventer d'informations non présentes dans le contexte
- Ajouter un avertissement que c'est une information générale, pas un conseil juridique

Si le contexte ne contient pas l'information demandée, dis-le clairement.";

/// Produces an answer from a question and its grounding context
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, question: &str, context: &str) -> Result<String>;

    /// Provider name reported to clients
    fn provider(&self) -> &str;
}

/// User turn sent to the model
pub fn user_message(question: &str, context: &str) -> String {
    format!("Contexte juridique:\n{}\n\nQuestion: {}", context, question)
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Groq chat completion client
pub struct GroqGenerator {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
}

impl GroqGenerator {
    pub fn new(api_key: String, config: &GenerationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    async fn call_llm(&self, question: &str, context: &str) -> Result<String> {
        let user = user_message(question, context);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: &user },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self.client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::GenerationError {
                message: format!("Erreur Groq: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::GenerationError {
                message: format!("Erreur Groq ({}): {}", status.as_u16(), body),
            });
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            AppError::GenerationError {
                message: format!("Erreur Groq: réponse illisible ({})", e),
            }
        })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::GenerationError {
                message: "Erreur Groq: réponse vide".to_string(),
            })
    }
}

#[async_trait]
impl AnswerGenerator for GroqGenerator {
    async fn generate(&self, question: &str, context: &str) -> Result<String> {
        let start = Instant::now();
        let result = self.call_llm(question, context).await;
        metrics::record_generation(start.elapsed().as_secs_f64(), "groq", result.is_ok());

        if let Err(e) = &result {
            tracing::warn!(error = %e, model = %self.model, "Answer generation failed");
        }
        result
    }

    fn provider(&self) -> &str {
        "groq"
    }
}

/// Mock generator for testing without API keys
#[derive(Debug, Default)]
pub struct MockGenerator;

#[async_trait]
impl AnswerGenerator for MockGenerator {
    async fn generate(&self, question: &str, context: &str) -> Result<String> {
        metrics::record_generation(0.0, "mock", true);
        Ok(format!(
            "📋 **Réponse à votre question:** \"{}\"\n\n{}\n\n---\n{}",
            question,
            context,
            crate::LEGAL_DISCLAIMER
        ))
    }

    fn provider(&self) -> &str {
        "mock"
    }
}

/// Create an answer generator based on configuration
///
/// A `groq` provider without an API key degrades to the mock generator.
pub fn create_generator(config: &GenerationConfig) -> Result<Arc<dyn AnswerGenerator>> {
    match config.provider.as_str() {
        "groq" => match config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            Some(key) => Ok(Arc::new(GroqGenerator::new(key.to_string(), config)?)),
            None => {
                tracing::warn!("Groq API key missing, using mock generator");
                Ok(Arc::new(MockGenerator))
            }
        },
        "mock" => Ok(Arc::new(MockGenerator)),
        other => {
            tracing::warn!(provider = other, "Unknown generation provider, using mock");
            Ok(Arc::new(MockGenerator))
        }
    }
}
