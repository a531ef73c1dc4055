//! Parley — streaming conversation state for AI chat.
//!
//! Folds an incremental stream of protocol events (text deltas, partial
//! tool-call arguments, tool results, thinking, approval gates) into one
//! consistent, replayable conversation, and converts that conversation
//! between the UI shape (typed parts) and the wire shape sent to a model.
//!
//! # Quick Start
//!
//! ```no_run
//! use futures::stream;
//! use parley::prelude::*;
//!
//! # async fn example() {
//! let mut processor = StreamProcessor::new(StreamProcessorOptions::default());
//! processor.add_user_message("Hello");
//!
//! let events = stream::iter(vec![
//!     StreamChunk::text_delta("Hi"),
//!     StreamChunk::text_delta(" there!"),
//!     StreamChunk::run_finished("stop"),
//! ]);
//! let result = processor.process(events).await;
//! assert_eq!(result.content, "Hi there!");
//! # }
//! ```

pub mod agent_loop;
pub mod config;
pub mod convert;
pub mod error;
pub mod prelude;
pub mod stream;
pub mod tools;
#[cfg(feature = "sse")]
pub mod transport;
pub mod types;
