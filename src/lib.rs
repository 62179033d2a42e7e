//! A COBS-framed request/reply protocol for point-to-point byte-stream
//! links (UART, SPI-over-byte-stream, pipes) with no heap allocation.
//!
//! The core is four pieces wired together by [`Endpoint`]:
//!
//! - [`cobs`] — in-place Consistent Overhead Byte Stuffing, for encoding a
//!   frame onto the wire and streaming-decoding bytes back off it.
//! - [`value`] — a small tagged-value grammar (fixints, nil, list markers,
//!   floats, explicit-width integers, a length-prefixed string) that puts
//!   and gets payload values through a buffer and cursor.
//! - [`frame`] — the fixed 4-byte request/reply header.
//! - [`pool`] — the fixed-size channel handler table and pending-request
//!   pool that let one endpoint multiplex many outstanding requests over a
//!   single link.
//!
//! [`Endpoint`] itself owns one rx/tx buffer pair per link and exposes the
//! request/reply API: [`Endpoint::register_handler`], [`Endpoint::call`],
//! [`Endpoint::send`], and the `put_*`/`get_*` cursor methods used from
//! inside handlers and reply callbacks. [`Endpoint::tick`] is the pump: it
//! drains the [`Transport`], dispatches completed frames, and sweeps the
//! pending-request pool for timeouts.

mod cobs;
mod endpoint;
mod frame;
mod interface;
mod pool;
mod value;

pub use endpoint::{Endpoint, HandlerFn, ReplyFn};
pub use frame::NO_REPLY;
pub use interface::Transport;
pub use pool::{CHANNEL_MAX, POOL_MAX};

/// Smallest buffer size an [`Endpoint`] will accept, per the minimum needed
/// to hold a header plus one framing overhead byte.
pub const BUFFER_MIN: usize = 16;

/// Largest buffer size an [`Endpoint`] will accept: one COBS overhead byte
/// can only describe a run of up to 254 bytes, so no single frame (header +
/// payload + overhead + terminator) can usefully exceed this.
pub const BUFFER_MAX: usize = 256;

/// Largest decoded frame (header + payload) an endpoint can send or
/// receive in one go: one COBS overhead byte can only describe a run of up
/// to this many bytes.
pub const MTU: usize = cobs::MAX_RUN;

/// Outcome of a request, reported to the handler's reply or to the caller's
/// reply callback.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    /// The request was handled; a reply is sent (or, for a reply callback,
    /// was received).
    Ok,
    /// The handler declines to reply at all; no reply frame is sent. A
    /// reply callback never sees this for `Status::Ok`. See also the
    /// `Ignore` fired on a pool timeout.
    Ignore,
    /// The request was malformed (bad payload for the channel).
    Invalid,
    /// The handler cannot service the request right now.
    Busy,
}

/// Construction-time errors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The requested buffer size `N` is outside `[BUFFER_MIN, BUFFER_MAX]`.
    BufferSize(usize),
}
