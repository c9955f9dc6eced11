//! Question answering over the current index snapshot

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::generator::{AnswerGenerator, GeneratorError, Prompt};
use crate::index::{IndexError, IndexHandle};
use crate::retrieval::{build_context, extract_intent, AssembledContext, IntentWindow};
use crate::time::{format_long_date, Clock};

/// Errors on the ask path
#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Question must not be empty")]
    EmptyQuestion,

    /// No index has been built or loaded yet
    #[error("Semantic index unavailable: run a rebuild first")]
    IndexUnavailable,

    #[error("Search failed: {0}")]
    Index(#[from] IndexError),

    #[error("Answer generation failed: {0}")]
    Generator(#[from] GeneratorError),
}

/// Intent and assembled context for one question
#[derive(Debug, Clone)]
pub struct Retrieval {
    pub intent: IntentWindow,
    pub context: AssembledContext,
}

/// An event the answer was grounded on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Source {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    pub score: f64,
}

#[derive(Debug, Clone)]
pub struct Answer {
    pub answer: String,
    pub intent: IntentWindow,
    pub sources: Vec<Source>,
}

/// Ties intent extraction, search, filtering and generation together
pub struct Assistant {
    index: Arc<IndexHandle>,
    generator: Arc<dyn AnswerGenerator>,
    clock: Clock,
    top_k: usize,
}

impl Assistant {
    pub fn new(
        index: Arc<IndexHandle>,
        generator: Arc<dyn AnswerGenerator>,
        clock: Clock,
        top_k: usize,
    ) -> Self {
        Self {
            index,
            generator,
            clock,
            top_k: top_k.max(1),
        }
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Resolve the intent and assemble the context, without generation
    ///
    /// Greetings never touch the index, so they work before the first rebuild.
    pub async fn retrieve(
        &self,
        question: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<Retrieval, AssistantError> {
        let intent = extract_intent(question, now);

        if intent.is_greeting() {
            let context = build_context(Vec::new(), &intent);
            return Ok(Retrieval { intent, context });
        }

        let index = self
            .index
            .snapshot()
            .await
            .ok_or(AssistantError::IndexUnavailable)?;

        let candidates = index.search(question, self.top_k).await?;
        let context = build_context(candidates, &intent);

        Ok(Retrieval { intent, context })
    }

    /// Answer `question` as of now
    pub async fn ask(&self, question: &str) -> Result<Answer, AssistantError> {
        self.ask_at(question, self.clock.now()).await
    }

    /// Answer `question` as of `now`
    pub async fn ask_at(
        &self,
        question: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<Answer, AssistantError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AssistantError::EmptyQuestion);
        }

        let Retrieval { intent, context } = self.retrieve(question, now).await?;
        let prompt = Prompt::new(context.text, question, format_long_date(&now));

        let answer = self.generator.complete(&prompt).await?;

        tracing::info!(
            kind = %intent.kind,
            display = %intent.display,
            sources = context.documents.len(),
            generator = self.generator.name(),
            "Answered question"
        );

        let sources = context
            .documents
            .into_iter()
            .map(|doc| Source {
                id: doc.metadata.id,
                title: doc.metadata.title,
                url: doc.metadata.url,
                score: doc.score,
            })
            .collect();

        Ok(Answer {
            answer,
            intent,
            sources,
        })
    }
}
