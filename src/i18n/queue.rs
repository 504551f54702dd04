//! Per-backend translation lanes.
//!
//! Each backend owns exactly one [`Lane`]: a tokio task draining a FIFO
//! channel, so calls to the same backend are strictly ordered and never
//! overlap. Independent backends run on independent lanes and may
//! proceed concurrently. A lane that hangs on a slow call stalls only
//! itself.
//!
//! The process-lifetime [`TranslationCache`] is checked *inside* the lane
//! worker, after the job is dequeued. Because jobs on a lane are
//! serialized, a second request for the same (text, source, target)
//! tuple always sees the first one's cached result and never reaches the
//! backend.

use crate::{
    i18n::backend::{Backend, BackendError},
    log,
};
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, oneshot};

/// Memoized results keyed by (source text, source lang, target lang).
///
/// Cheap to clone; all lanes share one instance.
#[derive(Debug, Clone, Default)]
pub struct TranslationCache {
    inner: Arc<Mutex<HashMap<(String, String, String), String>>>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, text: &str, source: &str, target: &str) -> Option<String> {
        self.inner
            .lock()
            .get(&(text.to_string(), source.to_string(), target.to_string()))
            .cloned()
    }

    pub fn insert(&self, text: &str, source: &str, target: &str, result: String) {
        self.inner.lock().insert(
            (text.to_string(), source.to_string(), target.to_string()),
            result,
        );
    }
}

/// One queued translation request.
struct Job {
    text: String,
    source: String,
    target: String,
    reply: oneshot::Sender<Result<String, BackendError>>,
}

/// Handle to a backend's serialized task queue.
#[derive(Debug, Clone)]
pub struct Lane {
    tx: mpsc::UnboundedSender<Job>,
}

impl Lane {
    /// Spawn the worker task for `backend` on the given runtime.
    pub fn spawn(
        backend: Backend,
        cache: TranslationCache,
        handle: &tokio::runtime::Handle,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        handle.spawn(run_lane(backend, cache, rx));
        Self { tx }
    }

    /// Queue a translation and wait for its result.
    ///
    /// Returns `LaneClosed` if the worker task is gone (runtime shutdown).
    pub async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, BackendError> {
        let (reply, response) = oneshot::channel();
        let job = Job {
            text: text.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            reply,
        };
        self.tx.send(job).map_err(|_| BackendError::LaneClosed)?;
        response.await.map_err(|_| BackendError::LaneClosed)?
    }
}

/// Worker loop: one job in flight at a time, cache consulted first.
async fn run_lane(
    backend: Backend,
    cache: TranslationCache,
    mut rx: mpsc::UnboundedReceiver<Job>,
) {
    while let Some(job) = rx.recv().await {
        if let Some(hit) = cache.get(&job.text, &job.source, &job.target) {
            let _ = job.reply.send(Ok(hit));
            continue;
        }

        let result = backend.translate(&job.text, &job.source, &job.target).await;
        match &result {
            Ok(translated) => {
                cache.insert(&job.text, &job.source, &job.target, translated.clone());
            }
            Err(err) => {
                log!("i18n"; "backend {} failed: {err}", backend.name());
            }
        }
        // Caller may have given up; a dropped receiver is fine
        let _ = job.reply.send(result);
    }
}
