use log::{debug, trace, warn};

use crate::cobs::{self, Decoder};
use crate::frame::{self, Kind, HEADER_SIZE, NO_REPLY};
use crate::pool::{Channels, Pool, POOL_MAX};
use crate::value;
use crate::{Error, Status, Transport, BUFFER_MAX, BUFFER_MIN, MTU};

/// A request handler: reads the request payload via the get-cursor, may
/// write a reply payload via the put-cursor, and returns the status to
/// reply with (or `Status::Ignore` to send no reply at all).
pub type HandlerFn<T, Ctx, const N: usize> = fn(&mut Endpoint<'_, T, Ctx, N>, &mut Ctx) -> Status;

/// A reply callback: fired when a matching reply arrives, or when the
/// request's pending slot times out (with `Status::Ignore`).
pub type ReplyFn<T, Ctx, const N: usize> =
    fn(&mut Endpoint<'_, T, Ctx, N>, &mut Ctx, Status);

const TX_HEADER_START: usize = 1;
const TX_PAYLOAD_START: usize = TX_HEADER_START + HEADER_SIZE;
const RX_HEADER_START: usize = 0;
const RX_PAYLOAD_START: usize = RX_HEADER_START + HEADER_SIZE;

/// A peer on a point-to-point byte-stream link: owns one rx/tx buffer pair,
/// a fixed-size channel handler table, and a fixed-size pending-request
/// pool. `N` is the buffer size, shared by both buffers; `Ctx` is the
/// caller's user-context type threaded through every handler and reply
/// callback in place of a C `void *` (see DESIGN.md for why).
pub struct Endpoint<'a, T: Transport, Ctx, const N: usize> {
    name: &'static str,
    transport: &'a T,

    rx_buf: [u8; N],
    tx_buf: [u8; N],

    decoder: Decoder,
    get_pos: usize,
    get_end: usize,
    put_pos: usize,

    channels: Channels<HandlerFn<T, Ctx, N>>,
    pool: Pool<ReplyFn<T, Ctx, N>>,
}

impl<'a, T: Transport, Ctx, const N: usize> Endpoint<'a, T, Ctx, N> {
    pub fn new(name: &'static str, transport: &'a T) -> Result<Self, Error> {
        if N < BUFFER_MIN || N > BUFFER_MAX {
            return Err(Error::BufferSize(N));
        }

        Ok(Endpoint {
            name,
            transport,
            rx_buf: [0u8; N],
            tx_buf: [0u8; N],
            decoder: Decoder::new(),
            get_pos: RX_PAYLOAD_START,
            get_end: RX_PAYLOAD_START,
            put_pos: TX_PAYLOAD_START,
            channels: Channels::new(),
            pool: Pool::new(),
        })
    }

    /// Registers a handler for `channel_id`. Overwrites silently if one was
    /// already registered. Returns `false` if `channel_id` is out of range.
    pub fn register_handler(&mut self, channel_id: u8, handler: HandlerFn<T, Ctx, N>) -> bool {
        self.channels.register(channel_id, handler)
    }

    /// Issues an outbound request on `channel_id`, carrying whatever payload
    /// has already been written via `put_*` since the last `put_clear`.
    /// Returns `false` if the pending-request pool is full (no slot
    /// consumed, nothing sent).
    pub fn call(
        &mut self,
        channel_id: u8,
        callback: ReplyFn<T, Ctx, N>,
        timeout_ticks: i32,
    ) -> bool {
        match self.pool.alloc(callback, timeout_ticks) {
            Some(req_id) => {
                self.send_request(req_id, channel_id);
                true
            }
            None => {
                warn!(target: self.name, "call(channel={}): pending-request pool exhausted", channel_id);
                false
            }
        }
    }

    /// Fire-and-forget request: no pool slot is consumed and no reply will
    /// ever be matched to it.
    pub fn send(&mut self, channel_id: u8) {
        self.send_request(NO_REPLY, channel_id);
    }

    /// Drains the transport's `rx` callback, feeding each byte to the COBS
    /// decoder and dispatching completed frames, then sweeps the
    /// pending-request pool for timeouts. This is the endpoint's pump;
    /// callers invoke it periodically.
    pub fn tick(&mut self, ctx: &mut Ctx) {
        while let Some(byte) = self.transport.rx() {
            let completed = self.decoder.feed(byte, &mut self.rx_buf);

            if let Some(len) = completed {
                self.dispatch_frame(len, ctx);
            }
        }

        self.sweep_timeouts(ctx);
    }

    fn dispatch_frame(&mut self, len: usize, ctx: &mut Ctx) {
        if len < HEADER_SIZE {
            debug!(target: self.name, "dropped frame: {} bytes, shorter than header", len);
            return;
        }

        match frame::read_header(&self.rx_buf[..len]) {
            Some((Kind::Request, req_id, chan_id)) => {
                self.get_end = len;
                self.handle_request(req_id, chan_id, ctx);
            }
            Some((Kind::Reply, req_id, _)) => {
                self.get_end = len;
                self.handle_reply(req_id, ctx);
            }
            None => {
                trace!(target: self.name, "dropped frame: unknown header kind 0x{:02x}", self.rx_buf[0]);
            }
        }
    }

    fn handle_request(&mut self, req_id: u8, chan_id: u8, ctx: &mut Ctx) {
        let handler = match self.channels.get(chan_id) {
            Some(h) => h,
            None => {
                debug!(target: self.name, "dropped request: no handler for channel {}", chan_id);
                return;
            }
        };

        self.get_pos = RX_PAYLOAD_START;
        self.put_pos = TX_PAYLOAD_START;

        let status = handler(self, ctx);

        if status != Status::Ignore {
            self.send_reply(req_id);
        }
    }

    fn handle_reply(&mut self, req_id: u8, ctx: &mut Ctx) {
        match self.pool.take_active(req_id) {
            Some(callback) => {
                self.get_pos = RX_PAYLOAD_START;
                callback(self, ctx, Status::Ok);
            }
            None => {
                trace!(target: self.name, "dropped reply: no pending request for req_id {}", req_id);
            }
        }
    }

    fn sweep_timeouts(&mut self, ctx: &mut Ctx) {
        let mut timed_out = [None; POOL_MAX];
        let n = self.pool.sweep_timeouts(&mut timed_out);

        for slot in timed_out.iter().take(n) {
            if let Some((_, callback)) = slot {
                self.get_pos = RX_PAYLOAD_START;
                self.get_end = RX_PAYLOAD_START;
                callback(self, ctx, Status::Ignore);
            }
        }
    }

    fn send_request(&mut self, req_id: u8, chan_id: u8) {
        frame::write_header(
            &mut self.tx_buf[TX_HEADER_START..TX_HEADER_START + HEADER_SIZE],
            Kind::Request,
            req_id,
            chan_id,
        );
        self.encode_and_send();
    }

    fn send_reply(&mut self, req_id: u8) {
        frame::write_header(
            &mut self.tx_buf[TX_HEADER_START..TX_HEADER_START + HEADER_SIZE],
            Kind::Reply,
            req_id,
            0,
        );
        self.encode_and_send();
    }

    fn encode_and_send(&mut self) {
        let data_len = self.put_pos - TX_HEADER_START;
        debug_assert!(data_len <= MTU, "frame exceeds MTU ({} > {})", data_len, MTU);

        let encoded_len = cobs::encode_in_place(&mut self.tx_buf, data_len);
        self.transport.tx(&self.tx_buf[..encoded_len]);
        self.put_pos = TX_PAYLOAD_START;
    }

    /// Resets the put-cursor to the start of the payload region, discarding
    /// anything written since the last send.
    pub fn put_clear(&mut self) {
        self.put_pos = TX_PAYLOAD_START;
    }

    /// Resets the get-cursor to the start of the current frame's payload.
    pub fn get_reset(&mut self) {
        self.get_pos = RX_PAYLOAD_START;
    }

    fn put_limit(&self) -> usize {
        N - 1
    }

    pub fn put_int(&mut self, v: i64) -> bool {
        let limit = self.put_limit();
        value::put_int(&mut self.tx_buf, &mut self.put_pos, limit, v)
    }

    pub fn put_f32(&mut self, v: f32) -> bool {
        let limit = self.put_limit();
        value::put_f32(&mut self.tx_buf, &mut self.put_pos, limit, v)
    }

    pub fn put_f64(&mut self, v: f64) -> bool {
        let limit = self.put_limit();
        value::put_f64(&mut self.tx_buf, &mut self.put_pos, limit, v)
    }

    pub fn put_nil(&mut self) -> bool {
        let limit = self.put_limit();
        value::put_nil(&mut self.tx_buf, &mut self.put_pos, limit)
    }

    pub fn put_list_open(&mut self) -> bool {
        let limit = self.put_limit();
        value::put_list_open(&mut self.tx_buf, &mut self.put_pos, limit)
    }

    pub fn put_list_close(&mut self) -> bool {
        let limit = self.put_limit();
        value::put_list_close(&mut self.tx_buf, &mut self.put_pos, limit)
    }

    pub fn put_string(&mut self, s: &str) -> bool {
        let limit = self.put_limit();
        value::put_string(&mut self.tx_buf, &mut self.put_pos, limit, s)
    }

    pub fn get_int(&mut self) -> Option<i64> {
        value::get_int(&self.rx_buf, &mut self.get_pos, self.get_end)
    }

    pub fn get_f32(&mut self) -> Option<f32> {
        value::get_f32(&self.rx_buf, &mut self.get_pos, self.get_end)
    }

    pub fn get_f64(&mut self) -> Option<f64> {
        value::get_f64(&self.rx_buf, &mut self.get_pos, self.get_end)
    }

    pub fn get_float(&mut self) -> Option<f64> {
        value::get_float(&self.rx_buf, &mut self.get_pos, self.get_end)
    }

    pub fn get_number(&mut self) -> Option<f64> {
        value::get_number(&self.rx_buf, &mut self.get_pos, self.get_end)
    }

    pub fn get_string(&mut self) -> Option<&str> {
        value::get_string(&self.rx_buf, &mut self.get_pos, self.get_end)
    }
}
