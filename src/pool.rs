//! Fixed-size tables backing the endpoint: the channel handler table and the
//! pending-request pool. Both are plain arrays indexed by id, with no heap
//! allocation — the Rust mapping of the teacher/original's sentinel-null
//! C arrays (`handlers[CHANNEL_MAX]`, `local_requests[POOL_MAX]`) onto typed
//! variants, per the Re-architecture guidance's "fixed-size pools with
//! sentinel-null entries" note.

use crate::frame::NO_REPLY;

pub const CHANNEL_MAX: usize = 32;
pub const POOL_MAX: usize = 16;

/// Channel handler table, indexed by channel id.
pub struct Channels<F: Copy> {
    slots: [Option<F>; CHANNEL_MAX],
}

impl<F: Copy> Channels<F> {
    pub fn new() -> Self {
        Channels {
            slots: [None; CHANNEL_MAX],
        }
    }

    /// Registers a handler for `channel_id`, overwriting any prior one.
    /// Returns `false` if `channel_id` is out of range.
    pub fn register(&mut self, channel_id: u8, handler: F) -> bool {
        match self.slots.get_mut(channel_id as usize) {
            Some(slot) => {
                *slot = Some(handler);
                true
            }
            None => false,
        }
    }

    /// Looks up the handler for `channel_id`, if any is registered.
    pub fn get(&self, channel_id: u8) -> Option<F> {
        self.slots.get(channel_id as usize).copied().flatten()
    }
}

#[derive(Copy, Clone)]
enum Slot<F: Copy> {
    Free,
    Active { callback: F, timeout_ticks: i32 },
}

/// Pool of pending outbound requests, keyed by slot index (the `req_id`
/// placed on the wire). At most one active use per slot; `NO_REPLY` is never
/// handed out.
pub struct Pool<F: Copy> {
    slots: [Slot<F>; POOL_MAX],
}

impl<F: Copy> Pool<F> {
    pub fn new() -> Self {
        Pool {
            slots: [Slot::Free; POOL_MAX],
        }
    }

    /// Finds the first free slot, activates it, and returns its index as the
    /// `req_id` to place on the wire. Returns `None` if the pool is full.
    pub fn alloc(&mut self, callback: F, timeout_ticks: i32) -> Option<u8> {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if let Slot::Free = slot {
                *slot = Slot::Active {
                    callback,
                    timeout_ticks,
                };
                return Some(i as u8);
            }
        }
        None
    }

    /// On reply arrival: if `req_id` indexes an active slot, frees it and
    /// returns its callback. `req_id == NO_REPLY` harmlessly misses (it is
    /// out of pool range whenever `POOL_MAX <= 0xFF`, which it always is
    /// here).
    pub fn take_active(&mut self, req_id: u8) -> Option<F> {
        if req_id == NO_REPLY {
            return None;
        }
        let slot = self.slots.get_mut(req_id as usize)?;
        match slot {
            Slot::Active { callback, .. } => {
                let callback = *callback;
                *slot = Slot::Free;
                Some(callback)
            }
            Slot::Free => None,
        }
    }

    /// Decrements every active slot's timeout; any that reach zero are freed
    /// and their `(req_id, callback)` pairs are appended to `out`, returning
    /// the count written. `out` must be at least `POOL_MAX` long.
    pub fn sweep_timeouts(&mut self, out: &mut [Option<(u8, F)>]) -> usize {
        let mut n = 0;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if let Slot::Active {
                callback,
                timeout_ticks,
            } = slot
            {
                *timeout_ticks -= 1;
                if *timeout_ticks <= 0 {
                    out[n] = Some((i as u8, *callback));
                    n += 1;
                    *slot = Slot::Free;
                }
            }
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_register_and_lookup() {
        let mut ch: Channels<u32> = Channels::new();
        assert!(ch.register(1, 42));
        assert_eq!(ch.get(1), Some(42));
        assert_eq!(ch.get(2), None);
        assert!(!ch.register(CHANNEL_MAX as u8, 1));
    }

    #[test]
    fn pool_exhaustion() {
        let mut pool: Pool<u32> = Pool::new();
        for i in 0..POOL_MAX {
            assert_eq!(pool.alloc(1, 100), Some(i as u8));
        }
        assert_eq!(pool.alloc(1, 100), None);
    }

    #[test]
    fn pool_reply_frees_slot() {
        let mut pool: Pool<u32> = Pool::new();
        let req_id = pool.alloc(7, 100).unwrap();
        assert_eq!(pool.take_active(req_id), Some(7));
        assert_eq!(pool.take_active(req_id), None);
        // slot is free again
        assert_eq!(pool.alloc(8, 100), Some(req_id));
    }

    #[test]
    fn pool_no_reply_never_matches() {
        let mut pool: Pool<u32> = Pool::new();
        assert_eq!(pool.take_active(NO_REPLY), None);
    }

    #[test]
    fn pool_sweep_fires_exactly_on_zero() {
        let mut pool: Pool<u32> = Pool::new();
        let req_id = pool.alloc(99, 3).unwrap();
        let mut out = [None; POOL_MAX];

        assert_eq!(pool.sweep_timeouts(&mut out), 0);
        assert_eq!(pool.sweep_timeouts(&mut out), 0);
        let n = pool.sweep_timeouts(&mut out);
        assert_eq!(n, 1);
        assert_eq!(out[0], Some((req_id, 99)));

        // slot freed: next alloc reuses it
        assert_eq!(pool.alloc(1, 1), Some(req_id));
    }
}
