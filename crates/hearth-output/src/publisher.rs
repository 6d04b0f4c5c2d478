use hearth_types::{OutputEvent, RequestContext, TRACEPARENT_HEADER};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::PublishError;
use crate::message::{ProducerMessage, OUTPUT_TYPE_HEADER};
use crate::producer::MessageProducer;

/// Writes output events to the configured topic.
#[derive(Clone)]
pub struct OutputPublisher {
    producer: Arc<dyn MessageProducer>,
    topic: String,
}

impl OutputPublisher {
    /// Creates a publisher sending to `topic` through `producer`.
    pub fn new(producer: Arc<dyn MessageProducer>, topic: impl Into<String>) -> Self {
        Self {
            producer,
            topic: topic.into(),
        }
    }

    /// The topic output events are written to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Publishes `updates` for `room_id` as a single batch.
    ///
    /// Each event becomes one message keyed by `room_id`, in slice order.
    /// All messages of the batch carry the same `traceparent`, a child span
    /// of the request's trace, so consumers can join the trace.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::Serialization` before anything is sent if an
    /// event cannot be encoded, and `PublishError::Transport` if the batch
    /// is not acknowledged.
    pub fn write_output_events(
        &self,
        ctx: &RequestContext,
        room_id: &str,
        updates: &[OutputEvent],
    ) -> Result<(), PublishError> {
        ctx.check()?;
        if updates.is_empty() {
            return Ok(());
        }

        let span = ctx.trace().child();
        let traceparent = span.to_traceparent();

        let messages = updates
            .iter()
            .map(|update| -> Result<ProducerMessage, PublishError> {
                debug_assert_eq!(update.room_id(), room_id, "output keyed by another room");
                let mut headers = BTreeMap::new();
                headers.insert(TRACEPARENT_HEADER.to_string(), traceparent.clone());
                headers.insert(
                    OUTPUT_TYPE_HEADER.to_string(),
                    update.output_type().to_string(),
                );
                Ok(ProducerMessage {
                    topic: self.topic.clone(),
                    key: room_id.to_string(),
                    value: serde_json::to_vec(update)?,
                    headers,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.producer.send_messages(ctx, &messages)?;

        tracing::debug!(
            room_id,
            topic = %self.topic,
            count = messages.len(),
            trace_id = %span.trace_id,
            span_id = %span.span_id,
            "published output events"
        );
        Ok(())
    }

    /// Closes the underlying producer.
    pub fn close(&self) -> Result<(), PublishError> {
        self.producer.close()?;
        Ok(())
    }
}
