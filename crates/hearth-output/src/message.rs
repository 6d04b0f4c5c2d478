use std::collections::BTreeMap;

/// Header naming the [`OutputEvent`](hearth_types::OutputEvent) variant, so
/// consumers can skip messages without decoding the payload.
pub const OUTPUT_TYPE_HEADER: &str = "output_type";

/// One message handed to a [`MessageProducer`](crate::MessageProducer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerMessage {
    /// Stream the message is appended to.
    pub topic: String,
    /// Ordering key. Messages with equal keys keep their relative order.
    pub key: String,
    /// Opaque payload bytes.
    pub value: Vec<u8>,
    /// Message metadata such as the `traceparent` of the producing request.
    pub headers: BTreeMap<String, String>,
}
