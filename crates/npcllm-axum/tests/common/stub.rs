//! In-memory engine with scripted replies.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::StreamExt;
use npcllm_core::{ChatEngine, ChatRequest, EngineError, FragmentStream, GenerationFragment};

#[derive(Debug, Clone)]
pub enum StubStep {
    Fragment(&'static str),
    Fail(EngineError),
    /// Keep the stream open without yielding; later steps are never reached.
    Hold,
}

/// Sets its flag when the engine stream owning it is dropped.
#[derive(Debug)]
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[derive(Debug)]
pub struct StubEngine {
    reply: Result<String, EngineError>,
    steps: Vec<StubStep>,
    start_error: Option<EngineError>,
    calls: AtomicUsize,
    last_request: Mutex<Option<ChatRequest>>,
    stream_dropped: Arc<AtomicBool>,
}

impl StubEngine {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self::base(Ok(reply.to_string()), Vec::new(), None))
    }

    pub fn failing(error: EngineError) -> Arc<Self> {
        Arc::new(Self::base(Err(error.clone()), Vec::new(), Some(error)))
    }

    pub fn streaming(steps: Vec<StubStep>) -> Arc<Self> {
        Arc::new(Self::base(Ok(String::new()), steps, None))
    }

    fn base(
        reply: Result<String, EngineError>,
        steps: Vec<StubStep>,
        start_error: Option<EngineError>,
    ) -> Self {
        Self {
            reply,
            steps,
            start_error,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
            stream_dropped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.last_request.lock().unwrap().clone()
    }

    /// Whether a stream handed out by `complete_stream` has been dropped.
    pub fn stream_dropped(&self) -> bool {
        self.stream_dropped.load(Ordering::SeqCst)
    }

    fn record(&self, request: &ChatRequest) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
    }
}

#[async_trait]
impl ChatEngine for StubEngine {
    async fn complete_once(&self, request: &ChatRequest) -> Result<String, EngineError> {
        self.record(request);
        self.reply.clone()
    }

    async fn complete_stream(&self, request: &ChatRequest) -> Result<FragmentStream, EngineError> {
        self.record(request);
        if let Some(error) = &self.start_error {
            return Err(error.clone());
        }
        let held = self.steps.iter().any(|step| matches!(step, StubStep::Hold));
        let items: Vec<Result<GenerationFragment, EngineError>> = self
            .steps
            .iter()
            .take_while(|step| !matches!(step, StubStep::Hold))
            .map(|step| match step {
                StubStep::Fragment(text) => {
                    Ok(GenerationFragment::new(*text).expect("non-empty fragment"))
                }
                StubStep::Fail(error) => Err(error.clone()),
                StubStep::Hold => unreachable!(),
            })
            .collect();

        let tail = if held {
            futures_util::stream::pending().boxed()
        } else {
            futures_util::stream::empty().boxed()
        };
        let flag = DropFlag(Arc::clone(&self.stream_dropped));
        let stream = futures_util::stream::iter(items).chain(tail).map(move |item| {
            let _ = &flag;
            item
        });
        Ok(Box::pin(stream))
    }
}
