use hearth_types::{InputRoomEventsRequest, InputRoomEventsResponse, RequestContext};
use std::sync::Arc;

use crate::error::{InputError, InputPass, ProcessError};
use crate::processor::EventProcessor;

/// Feeds input batches to an [`EventProcessor`], in order, stopping at the
/// first failure.
#[derive(Clone)]
pub struct InputPipeline {
    processor: Arc<dyn EventProcessor>,
}

impl InputPipeline {
    pub fn new(processor: Arc<dyn EventProcessor>) -> Self {
        Self { processor }
    }

    /// Applies every room event, then every invite event, in request order.
    ///
    /// Blocks until the batch is done. Cancellation is checked before each
    /// event.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Failed`] for the first event that fails.
    /// Later events are not attempted; earlier ones are not undone.
    pub fn input_room_events(
        &self,
        ctx: &RequestContext,
        request: &InputRoomEventsRequest,
    ) -> Result<InputRoomEventsResponse, InputError> {
        let span = tracing::info_span!(
            "input_room_events",
            trace_id = %ctx.trace().trace_id,
            room_events = request.input_room_events.len(),
            invite_events = request.input_invite_events.len(),
        );
        let _guard = span.enter();

        for (index, input) in request.input_room_events.iter().enumerate() {
            tracing::debug!(index, event_id = %input.event.event_id, "processing room event");
            let result = ctx
                .check()
                .map_err(ProcessError::from)
                .and_then(|()| self.processor.process_room_event(ctx, input));
            if let Err(source) = result {
                return Err(abort(InputPass::Room, index, &input.event.event_id, source));
            }
        }

        for (index, input) in request.input_invite_events.iter().enumerate() {
            tracing::debug!(index, event_id = %input.event.event_id, "processing invite event");
            let result = ctx
                .check()
                .map_err(ProcessError::from)
                .and_then(|()| self.processor.process_invite_event(ctx, input));
            if let Err(source) = result {
                return Err(abort(InputPass::Invite, index, &input.event.event_id, source));
            }
        }

        tracing::debug!("input batch applied");
        Ok(InputRoomEventsResponse::default())
    }
}

fn abort(pass: InputPass, index: usize, event_id: &str, source: ProcessError) -> InputError {
    tracing::warn!(
        %pass,
        index,
        event_id,
        error = %source,
        "aborting input batch, earlier events stay applied"
    );
    InputError::Failed {
        pass,
        index,
        event_id: event_id.to_string(),
        source,
    }
}
