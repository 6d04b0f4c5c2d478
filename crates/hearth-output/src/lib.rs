//! Output stream publishing for Hearth.
//!
//! Processed room events leave the core as [`OutputEvent`]s on an ordered
//! stream that sync engines, notification counters and search indexers
//! consume. This crate owns that boundary:
//!
//! - [`OutputPublisher`] serialises output events to JSON, stamps each
//!   message with the caller's trace context and sends them as one batch,
//!   keyed by room id.
//! - [`MessageProducer`] is the transport seam. It is injected into the
//!   publisher at construction and has an explicit lifecycle: opened once,
//!   [`MessageProducer::close`]d on shutdown.
//! - [`SqliteStreamProducer`] is the bundled transport: a durable,
//!   offset-addressed log in the `output_stream` table, with an optional
//!   live broadcast feed. [`read_stream`] reads it back.
//!
//! # Ordering
//!
//! Every message of a publish call carries the room id as its key. A
//! transport that preserves per-key order therefore preserves the relative
//! order of a room's output events. Nothing is promised across rooms.
//!
//! # Delivery
//!
//! A batch send is acknowledged as a whole or fails as a whole. Retrying is
//! the caller's decision.
//!
//! [`OutputEvent`]: hearth_types::OutputEvent

mod error;
mod message;
mod producer;
mod publisher;
mod sqlite;

pub use error::{PublishError, StreamError};
pub use message::{ProducerMessage, OUTPUT_TYPE_HEADER};
pub use producer::MessageProducer;
pub use publisher::OutputPublisher;
pub use sqlite::{read_stream, SqliteStreamProducer, StreamFilter, StreamRecord};
