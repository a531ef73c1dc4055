//! Server-sent-events framing for protocol event streams.

use futures::stream::{BoxStream, Stream, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ParleyError, Result};
use crate::types::{RunErrorInfo, StreamChunk};

/// End-of-stream sentinel frame.
pub const SSE_DONE: &str = "data: [DONE]\n\n";

/// Frame one event as `data: <json>\n\n`.
pub fn to_sse_frame(chunk: &StreamChunk) -> Result<String> {
    Ok(format!("data: {}\n\n", serde_json::to_string(chunk)?))
}

/// The frame sent once on a transport error, before the stream closes.
pub fn sse_error_frame(message: &str, code: Option<&str>) -> String {
    let mut error = serde_json::json!({ "message": message });
    if let Some(code) = code {
        error["code"] = serde_json::Value::from(code);
    }
    let frame = serde_json::json!({ "type": "error", "error": error });
    format!("data: {frame}\n\n")
}

/// Frame a stream of events, terminated by [`SSE_DONE`].
pub fn to_server_sent_events<S>(events: S) -> BoxStream<'static, String>
where
    S: Stream<Item = StreamChunk> + Send + 'static,
{
    try_to_server_sent_events(events.map(Ok))
}

/// Frame a fallible stream. The first error becomes an error frame and ends
/// the stream without the `[DONE]` sentinel.
pub fn try_to_server_sent_events<S>(events: S) -> BoxStream<'static, String>
where
    S: Stream<Item = Result<StreamChunk>> + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut events = std::pin::pin!(events);
        while let Some(item) = events.next().await {
            let framed = item.and_then(|chunk| to_sse_frame(&chunk));
            match framed {
                Ok(frame) => yield frame,
                Err(err) => {
                    warn!(error = %err, "closing event stream after error");
                    yield sse_error_frame(&err.user_message(), None);
                    return;
                }
            }
        }
        yield SSE_DONE.to_string();
    };
    Box::pin(stream)
}

/// One decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub enum SseFrame {
    Chunk(StreamChunk),
    Error(RunErrorInfo),
    Done,
}

#[derive(Deserialize)]
struct ErrorFrame {
    error: RunErrorInfo,
}

/// Incremental decoder for `data:` frames.
///
/// Feed arbitrary text slices; complete events come back as soon as their
/// terminating blank line arrives.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: &str) -> Vec<Result<SseFrame>> {
        self.buffer.push_str(text);
        let mut frames = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            let line = line.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                if let Some(frame) = self.dispatch() {
                    frames.push(frame);
                }
            } else if line.starts_with(':') {
                continue;
            } else if let Some(rest) = line.strip_prefix("data:") {
                let rest = rest.strip_prefix(' ').unwrap_or(rest);
                self.data.push(rest.to_string());
            }
        }
        frames
    }

    /// Dispatch any event left without a terminating blank line.
    pub fn finish(mut self) -> Vec<Result<SseFrame>> {
        let mut frames = Vec::new();
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            frames.extend(self.push(&format!("{rest}\n")));
        }
        if let Some(frame) = self.dispatch() {
            frames.push(frame);
        }
        frames
    }

    fn dispatch(&mut self) -> Option<Result<SseFrame>> {
        if self.data.is_empty() {
            return None;
        }
        let data = self.data.join("\n");
        self.data.clear();
        Some(decode_data(&data))
    }
}

fn decode_data(data: &str) -> Result<SseFrame> {
    if data == "[DONE]" {
        return Ok(SseFrame::Done);
    }
    let value: serde_json::Value = serde_json::from_str(data)?;
    if value.get("type").and_then(|t| t.as_str()) == Some("error") {
        let frame: ErrorFrame = serde_json::from_value(value)?;
        return Ok(SseFrame::Error(frame.error));
    }
    serde_json::from_value(value).map(SseFrame::Chunk).map_err(|err| {
        debug!(error = %err, "undecodable event frame");
        ParleyError::Stream(format!("invalid event frame: {err}"))
    })
}

/// Decode a complete SSE body into events, stopping at `[DONE]`.
///
/// An error frame is returned as a `RUN_ERROR` chunk so the processor can
/// surface it.
pub fn decode_sse_body(body: &str) -> Result<Vec<StreamChunk>> {
    let mut decoder = SseDecoder::new();
    let mut frames = decoder.push(body);
    frames.extend(decoder.finish());

    let mut chunks = Vec::new();
    for frame in frames {
        match frame? {
            SseFrame::Chunk(chunk) => chunks.push(chunk),
            SseFrame::Error(error) => chunks.push(StreamChunk::RunError {
                run_id: None,
                error,
                meta: Default::default(),
            }),
            SseFrame::Done => break,
        }
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn frame_has_data_prefix_and_blank_line() {
        let frame = to_sse_frame(&StreamChunk::text_delta("Hi")).unwrap();
        assert!(frame.starts_with("data: {"));
        assert!(frame.ends_with("}\n\n"));
        assert!(frame.contains(r#""type":"TEXT_MESSAGE_CONTENT""#));
    }

    #[test]
    fn error_frame_shape() {
        let frame = sse_error_frame("boom", Some("E42"));
        let json: serde_json::Value =
            serde_json::from_str(frame.trim_start_matches("data: ").trim_end()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "error", "error": {"message": "boom", "code": "E42"}})
        );
        assert!(!sse_error_frame("boom", None).contains("code"));
    }

    #[tokio::test]
    async fn stream_ends_with_done_sentinel() {
        let frames: Vec<String> = to_server_sent_events(futures::stream::iter(vec![
            StreamChunk::text_delta("a"),
            StreamChunk::run_finished("stop"),
        ]))
        .collect()
        .await;
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2], SSE_DONE);
    }

    #[tokio::test]
    async fn error_closes_without_done() {
        let frames: Vec<String> = try_to_server_sent_events(futures::stream::iter(vec![
            Ok(StreamChunk::text_delta("a")),
            Err(ParleyError::adapter("mock", "connection reset")),
            Ok(StreamChunk::text_delta("never")),
        ]))
        .collect()
        .await;
        assert_eq!(frames.len(), 2);
        assert!(frames[1].contains(r#""type":"error""#));
        assert!(frames[1].contains("connection reset"));
    }

    #[test]
    fn decoder_handles_split_input() {
        let frame = to_sse_frame(&StreamChunk::text_delta("Hello")).unwrap();
        let (head, tail) = frame.split_at(10);
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(head).is_empty());
        let frames = decoder.push(&format!("{tail}: keep-alive\n\n{SSE_DONE}"));
        let frames: Vec<SseFrame> = frames.into_iter().map(|f| f.unwrap()).collect();
        assert_eq!(
            frames,
            vec![SseFrame::Chunk(StreamChunk::text_delta("Hello")), SseFrame::Done]
        );
    }

    #[test]
    fn body_decoding_maps_error_frames() {
        let body = format!(
            "{}{}",
            to_sse_frame(&StreamChunk::text_delta("x")).unwrap(),
            sse_error_frame("quota", None)
        );
        let chunks = decode_sse_body(&body).unwrap();
        assert_eq!(chunks[1], StreamChunk::run_error("quota"));
    }
}
