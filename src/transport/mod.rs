//! Transport framing helpers.

pub mod sse;

pub use sse::{
    decode_sse_body, sse_error_frame, to_server_sent_events, to_sse_frame,
    try_to_server_sent_events, SseDecoder, SseFrame, SSE_DONE,
};
