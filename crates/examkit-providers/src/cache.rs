//! Memoizing question source.
//!
//! Generated question lists are reused for an identical request, so retrying
//! an exam does not ask the backend for a fresh batch.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use examkit_core::model::Question;
use examkit_core::traits::{QuestionRequest, QuestionSource};

/// Wraps another source and caches successful fetches per request.
pub struct CachingSource<S> {
    inner: S,
    cache: Mutex<HashMap<QuestionRequest, Vec<Question>>>,
}

impl<S: QuestionSource> CachingSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of cached requests.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget the cached list for one request.
    pub fn invalidate(&self, request: &QuestionRequest) -> bool {
        self.entries().remove(request).is_some()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<QuestionRequest, Vec<Question>>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl<S: QuestionSource> QuestionSource for CachingSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch(&self, request: &QuestionRequest) -> anyhow::Result<Vec<Question>> {
        let cached = self.entries().get(request).cloned();
        if let Some(questions) = cached {
            tracing::debug!(topic = %request.topic, "reusing cached questions");
            return Ok(questions);
        }

        let questions = self.inner.fetch(request).await?;
        if !questions.is_empty() {
            self.entries().insert(request.clone(), questions.clone());
        }
        Ok(questions)
    }
}
