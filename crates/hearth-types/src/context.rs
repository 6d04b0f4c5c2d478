//! Request-scoped context threaded through every store and publish call.
//!
//! A [`RequestContext`] carries three things:
//!
//! - the distributed [`TraceContext`] so outgoing messages can be stitched
//!   back into the caller's trace,
//! - an optional deadline,
//! - a shared cancellation flag the transport layer can raise when the
//!   caller goes away.
//!
//! Blocking operations call [`RequestContext::check`] before doing I/O and
//! bail out with a [`ContextError`] once the request is no longer wanted.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;

/// Header name used to propagate trace context (W3C Trace Context).
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// Identity of the active distributed trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    /// 32 lowercase hex characters.
    pub trace_id: String,
    /// 16 lowercase hex characters.
    pub span_id: String,
    /// Whether the trace is being recorded upstream.
    pub sampled: bool,
}

impl TraceContext {
    /// Starts a new trace with a fresh trace id.
    pub fn new_root() -> Self {
        Self {
            trace_id: Uuid::new_v4().simple().to_string(),
            span_id: new_span_id(),
            sampled: true,
        }
    }

    /// Returns a context in the same trace with a new span id.
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: new_span_id(),
            sampled: self.sampled,
        }
    }

    /// Parses a `traceparent` header value (`00-<trace>-<span>-<flags>`).
    ///
    /// Returns `None` for anything that is not a well-formed version 00
    /// header, including the all-zero ids the format reserves as invalid.
    pub fn from_traceparent(value: &str) -> Option<Self> {
        let mut parts = value.trim().split('-');
        let version = parts.next()?;
        let trace_id = parts.next()?;
        let span_id = parts.next()?;
        let flags = parts.next()?;
        if parts.next().is_some() || version != "00" {
            return None;
        }
        if !is_hex_id(trace_id, 32) || !is_hex_id(span_id, 16) || flags.len() != 2 {
            return None;
        }
        let flags = u8::from_str_radix(flags, 16).ok()?;
        Some(Self {
            trace_id: trace_id.to_string(),
            span_id: span_id.to_string(),
            sampled: flags & 0x01 == 0x01,
        })
    }

    /// Formats this context as a `traceparent` header value.
    pub fn to_traceparent(&self) -> String {
        format!(
            "00-{}-{}-{:02x}",
            self.trace_id,
            self.span_id,
            u8::from(self.sampled)
        )
    }
}

fn new_span_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(16);
    id
}

fn is_hex_id(s: &str, len: usize) -> bool {
    s.len() == len
        && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        && s.bytes().any(|b| b != b'0')
}

/// Why a request stopped before completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("request cancelled")]
    Cancelled,
    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

/// Per-request trace identity, deadline and cancellation flag.
///
/// Cloning is cheap and clones share the cancellation flag.
#[derive(Debug, Clone)]
pub struct RequestContext {
    trace: TraceContext,
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl RequestContext {
    /// Creates a context continuing the given trace, with no deadline.
    pub fn new(trace: TraceContext) -> Self {
        Self {
            trace,
            deadline: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates a context for work not tied to an inbound request.
    pub fn background() -> Self {
        Self::new(TraceContext::new_root())
    }

    /// Sets an absolute deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets a deadline relative to now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn trace(&self) -> &TraceContext {
        &self.trace
    }

    /// Marks the request as cancelled. Visible to every clone.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns an error if the request was cancelled or its deadline passed.
    pub fn check(&self) -> Result<(), ContextError> {
        if self.is_cancelled() {
            return Err(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(ContextError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Returns a guard that cancels this context when dropped, unless
    /// [`CancelOnDrop::disarm`] is called first.
    pub fn cancel_on_drop(&self) -> CancelOnDrop {
        CancelOnDrop {
            cancelled: Arc::clone(&self.cancelled),
            armed: true,
        }
    }
}

/// Cancels the owning [`RequestContext`] when dropped while armed.
#[derive(Debug)]
pub struct CancelOnDrop {
    cancelled: Arc<AtomicBool>,
    armed: bool,
}

impl CancelOnDrop {
    /// Completes normally; dropping the guard will no longer cancel.
    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if self.armed {
            self.cancelled.store(true, Ordering::SeqCst);
        }
    }
}
