//! Transport adapter contract. The core consumes these callbacks but owns no
//! scheduler and no I/O beyond them; everything here mirrors the `&self`
//! shape of the teacher's `Interface` trait so an implementor can back it
//! with a `RefCell`-wrapped UART driver without the core needing `&mut`.

pub trait Transport {
    /// Non-blocking receive: returns the next available byte, or `None` if
    /// the link has nothing buffered right now.
    fn rx(&self) -> Option<u8>;

    /// Synchronous transmit: `bytes` must be fully accepted by the
    /// transport before this returns.
    fn tx(&self, bytes: &[u8]);
}
