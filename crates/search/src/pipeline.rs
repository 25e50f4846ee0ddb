//! Question answering: retrieve, assemble, generate

use crate::context::{render_plain, ContextAssembler};
use crate::retrieval::{RetrievalEngine, ScoredRecord, Strategy};
use lexdz_common::errors::{AppError, Result};
use lexdz_common::AnswerGenerator;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// Provider name reported when the answer is rendered without a model
pub const DIRECT_PROVIDER: &str = "direct";

/// Reply to one question
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub answer: String,
    pub results: Vec<ScoredRecord>,
    pub strategy: Strategy,
    pub fell_back: bool,
    /// Generator that wrote the answer, or `direct`
    pub provider: String,
}

/// Legal question answering over the retrieval engine
pub struct LegalAssistant {
    engine: Arc<RetrievalEngine>,
    assembler: ContextAssembler,
    generator: Arc<dyn AnswerGenerator>,
    default_top_k: usize,
}

impl LegalAssistant {
    pub fn new(
        engine: Arc<RetrievalEngine>,
        assembler: ContextAssembler,
        generator: Arc<dyn AnswerGenerator>,
        default_top_k: usize,
    ) -> Self {
        Self {
            engine,
            assembler,
            generator,
            default_top_k,
        }
    }

    pub fn engine(&self) -> &Arc<RetrievalEngine> {
        &self.engine
    }

    pub fn provider(&self) -> &str {
        self.generator.provider()
    }

    /// Answer a question
    ///
    /// Generation failures do not fail the call: the provider's error text
    /// becomes the answer.
    #[instrument(skip(self, question), fields(question_len = question.len()))]
    pub async fn ask(&self, question: &str, top_k: Option<usize>, use_llm: bool) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::Validation {
                message: "Question cannot be empty".to_string(),
                field: Some("question".to_string()),
            });
        }

        let top_k = top_k.unwrap_or(self.default_top_k);
        let result = self.engine.retrieve(question, top_k).await;

        let (answer, provider) = if use_llm {
            let context = self.assembler.assemble(&result.records);
            let answer = match self.generator.generate(question, &context).await {
                Ok(answer) => answer,
                Err(AppError::GenerationError { message }) => message,
                Err(e) => e.to_string(),
            };
            (answer, self.generator.provider().to_string())
        } else {
            (
                render_plain(&result.records, self.assembler.excerpt_chars),
                DIRECT_PROVIDER.to_string(),
            )
        };

        info!(
            strategy = result.strategy.as_str(),
            results = result.records.len(),
            provider = %provider,
            "Question answered"
        );

        Ok(Answer {
            answer,
            results: result.records,
            strategy: result.strategy,
            fell_back: result.fell_back,
            provider,
        })
    }
}
