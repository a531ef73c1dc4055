//! Shared test helpers and mock adapter.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream::BoxStream;

use parley::agent_loop::{ChatAdapter, ChatRequest};
use parley::error::ParleyError;
use parley::types::*;

enum MockTurn {
    Chunks(Vec<Result<StreamChunk, ParleyError>>),
    Fail(String),
}

/// An adapter that replays canned turns and records every request.
pub struct MockAdapter {
    model: String,
    turns: Mutex<VecDeque<MockTurn>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockAdapter {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            turns: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a plain text turn, streamed in 5-character deltas.
    pub fn queue_text(&self, text: &str) {
        self.queue_chunks(text_turn(text));
    }

    /// Queue a turn that requests one tool call.
    pub fn queue_tool_call(&self, id: &str, name: &str, args: serde_json::Value) {
        self.queue_chunks(tool_call_turn(&[(id, name, args)]));
    }

    pub fn queue_chunks(&self, chunks: Vec<StreamChunk>) {
        self.turns
            .lock()
            .unwrap()
            .push_back(MockTurn::Chunks(chunks.into_iter().map(Ok).collect()));
    }

    /// Queue a turn whose stream yields these items, errors included.
    pub fn queue_items(&self, items: Vec<Result<StreamChunk, ParleyError>>) {
        self.turns.lock().unwrap().push_back(MockTurn::Chunks(items));
    }

    /// Queue a turn that fails before streaming anything.
    pub fn queue_failure(&self, message: &str) {
        self.turns
            .lock()
            .unwrap()
            .push_back(MockTurn::Fail(message.to_string()));
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatAdapter for MockAdapter {
    fn kind(&self) -> &str {
        "text"
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn chat_stream(
        &self,
        request: &ChatRequest,
    ) -> Result<BoxStream<'static, Result<StreamChunk, ParleyError>>, ParleyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let turn = self.turns.lock().unwrap().pop_front();
        let items = match turn {
            Some(MockTurn::Chunks(items)) => items,
            Some(MockTurn::Fail(message)) => return Err(ParleyError::adapter("mock", message)),
            None => text_turn("Mock response").into_iter().map(Ok).collect(),
        };

        let stream = async_stream::stream! {
            for item in items {
                yield item;
            }
        };
        Ok(Box::pin(stream))
    }
}

/// Text split into 5-character deltas, then `RUN_FINISHED{stop}`.
pub fn text_turn(text: &str) -> Vec<StreamChunk> {
    let mut chunks: Vec<StreamChunk> = text
        .chars()
        .collect::<Vec<_>>()
        .chunks(5)
        .map(|piece| StreamChunk::text_delta(piece.iter().collect::<String>()))
        .collect();
    chunks.push(StreamChunk::run_finished("stop"));
    chunks
}

/// Tool call start/args/end for each call, then `RUN_FINISHED{tool_calls}`.
pub fn tool_call_turn(calls: &[(&str, &str, serde_json::Value)]) -> Vec<StreamChunk> {
    let mut chunks = Vec::new();
    for (id, name, args) in calls {
        let args = args.to_string();
        let (head, tail) = args.split_at(args.len() / 2);
        chunks.push(StreamChunk::tool_call_start(*id, *name));
        chunks.push(StreamChunk::tool_call_args(*id, head));
        chunks.push(StreamChunk::tool_call_args(*id, tail));
        chunks.push(StreamChunk::tool_call_end(*id));
    }
    chunks.push(StreamChunk::run_finished("tool_calls"));
    chunks
}

/// A sink that stores every processor event for later inspection.
pub fn collecting_sink() -> (
    parley::stream::ProcessorEventSink,
    std::sync::Arc<Mutex<Vec<parley::stream::ProcessorEvent>>>,
) {
    let events = std::sync::Arc::new(Mutex::new(Vec::new()));
    let store = std::sync::Arc::clone(&events);
    let sink: parley::stream::ProcessorEventSink = std::sync::Arc::new(move |event| {
        store.lock().unwrap().push(event);
    });
    (sink, events)
}
