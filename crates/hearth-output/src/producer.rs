use hearth_types::RequestContext;

use crate::error::StreamError;
use crate::message::ProducerMessage;

/// A keyed, batched, acknowledged message transport.
///
/// Implementations are shared across requests, so they must be safe to call
/// from several blocking workers at once.
pub trait MessageProducer: Send + Sync {
    /// Sends `messages` as one batch.
    ///
    /// Returns only after every message is acknowledged. If any message
    /// cannot be delivered the whole call fails. Implementations must give
    /// up promptly once `ctx` is cancelled or past its deadline.
    fn send_messages(
        &self,
        ctx: &RequestContext,
        messages: &[ProducerMessage],
    ) -> Result<(), StreamError>;

    /// Releases the transport. Sends after this fail with [`StreamError::Closed`].
    fn close(&self) -> Result<(), StreamError>;
}
