//! Deterministic in-process gateways shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::completion::{CompletionError, CompletionGateway};
use crate::embedding::{EmbeddingError, EmbeddingGateway};

const VOCABULARY: [&str; 6] = ["apple", "banana", "cherr", "red", "yellow", "grape"];

/// Bag-of-keywords vector over a tiny fixed vocabulary.
pub(crate) fn keyword_vector(text: &str) -> Vec<f32> {
    let lowered = text.to_lowercase();
    VOCABULARY
        .iter()
        .map(|word| lowered.matches(word).count() as f32)
        .collect()
}

/// Embedding stub that counts batch calls and can be scripted to misbehave.
#[derive(Default)]
pub(crate) struct StubEmbeddings {
    calls: AtomicUsize,
    delay: Duration,
    failures: Mutex<Vec<EmbeddingError>>,
    drop_last: bool,
    request_size: Option<usize>,
    fixed: Option<Vec<Vec<f32>>>,
}

impl StubEmbeddings {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Sleep before answering every batch.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail the next call with `error`; queued failures are consumed in order.
    pub(crate) fn failing_once(self, error: EmbeddingError) -> Self {
        self.failures
            .lock()
            .expect("failures lock")
            .push(error);
        self
    }

    /// Return one vector fewer than requested.
    pub(crate) fn dropping_last(mut self) -> Self {
        self.drop_last = true;
        self
    }

    /// Advertise that batches are split into provider requests of `size` texts.
    pub(crate) fn in_requests_of(mut self, size: usize) -> Self {
        self.request_size = Some(size);
        self
    }

    /// Answer every batch with `vectors` instead of keyword vectors.
    pub(crate) fn returning(mut self, vectors: Vec<Vec<f32>>) -> Self {
        self.fixed = Some(vectors);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingGateway for StubEmbeddings {
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let scripted = {
            let mut failures = self.failures.lock().expect("failures lock");
            (!failures.is_empty()).then(|| failures.remove(0))
        };
        if let Some(error) = scripted {
            return Err(error);
        }
        let mut vectors: Vec<Vec<f32>> = match &self.fixed {
            Some(fixed) => fixed.clone(),
            None => texts.iter().map(|text| keyword_vector(text)).collect(),
        };
        if self.drop_last {
            vectors.pop();
        }
        Ok(vectors)
    }

    fn max_request_size(&self) -> Option<usize> {
        self.request_size
    }
}

/// Completion stub that records every prompt it receives.
pub(crate) struct StubCompletion {
    reply: Result<String, CompletionError>,
    delay: Duration,
    prompts: Mutex<Vec<(String, String)>>,
}

impl StubCompletion {
    pub(crate) fn replying(answer: &str) -> Self {
        Self {
            reply: Ok(answer.to_string()),
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(error: CompletionError) -> Self {
        Self {
            reply: Err(error),
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// `(system_context, question)` pairs in call order.
    pub(crate) fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().expect("prompts lock").clone()
    }
}

#[async_trait]
impl CompletionGateway for StubCompletion {
    async fn answer(
        &self,
        system_context: &str,
        question: &str,
    ) -> Result<String, CompletionError> {
        self.prompts
            .lock()
            .expect("prompts lock")
            .push((system_context.to_string(), question.to_string()));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply.clone()
    }
}
