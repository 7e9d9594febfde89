//! Fixed-capacity packet ring carrying packet records from the per-magazine
//! assembler to whatever control-context code drains them next.
//!
//! Unlike a byte-stream ring buffer that refuses writes once full, this one
//! implements the packet ring's contract literally: the writer overwrites
//! the oldest unreleased slot when the reader falls behind, bumping a drop
//! counter instead of blocking — there is no upstream flow control source
//! (VBI frames arrive at a fixed field rate) to push back on. Everything
//! here runs on one acquisition thread, so the ring is a plain struct with
//! no interior mutability or `unsafe`: `Assembler` owns it and calls `push`
//! through its own `&mut self` methods.

/// Fixed-capacity ring of `T`. `N` must be a power of two for the
/// modulo-by-mask indexing below; callers pick capacities like 64 or 256.
pub struct PacketRing<T, const N: usize> {
    slots: Box<[T]>,
    write_idx: usize,
    read_idx: usize,
    dropped: usize,
}

impl<T: Default + Clone, const N: usize> PacketRing<T, N> {
    pub fn new() -> Self {
        assert!(N.is_power_of_two(), "ring capacity must be a power of two");
        PacketRing {
            slots: (0..N).map(|_| T::default()).collect(),
            write_idx: 0,
            read_idx: 0,
            dropped: 0,
        }
    }

    /// Publish one packet record, overwriting the oldest unreleased slot
    /// (and counting a drop) if the reader hasn't kept up.
    pub fn push(&mut self, item: T) {
        if self.write_idx.wrapping_sub(self.read_idx) >= N {
            self.read_idx += 1;
            self.dropped += 1;
        }
        self.slots[self.write_idx % N] = item;
        self.write_idx += 1;
    }

    /// Peek at the packet `offset` slots past the current read position
    /// without consuming it.
    pub fn get_next_packet(&self, offset: usize) -> Option<T> {
        if self.read_idx.wrapping_add(offset) < self.write_idx {
            let idx = (self.read_idx + offset) % N;
            Some(self.slots[idx].clone())
        } else {
            None
        }
    }

    /// Commits consumption of `count` packets, letting the writer reuse
    /// those slots.
    pub fn release_packets(&mut self, count: usize) {
        self.read_idx += count;
    }

    /// Number of packets overwritten before they were released.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Number of packets currently available to read.
    pub fn available(&self) -> usize {
        self.write_idx.wrapping_sub(self.read_idx)
    }
}

impl<T: Default + Clone, const N: usize> Default for PacketRing<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_observes_writes_in_order() {
        let mut ring: PacketRing<u32, 8> = PacketRing::new();
        for i in 0..5u32 {
            ring.push(i);
        }
        for i in 0..5usize {
            assert_eq!(ring.get_next_packet(i), Some(i as u32));
        }
        ring.release_packets(5);
        assert_eq!(ring.available(), 0);
    }

    #[test]
    fn released_slots_are_safely_reused() {
        let mut ring: PacketRing<u32, 4> = PacketRing::new();
        for i in 0..4u32 {
            ring.push(i);
        }
        ring.release_packets(2);
        ring.push(4);
        ring.push(5);
        assert_eq!(ring.get_next_packet(0), Some(2));
        assert_eq!(ring.get_next_packet(1), Some(3));
        assert_eq!(ring.get_next_packet(2), Some(4));
        assert_eq!(ring.get_next_packet(3), Some(5));
    }

    #[test]
    fn overflow_drops_oldest_and_counts_it() {
        let mut ring: PacketRing<u32, 4> = PacketRing::new();
        for i in 0..6u32 {
            ring.push(i);
        }
        assert_eq!(ring.dropped(), 2);
        assert_eq!(ring.available(), 4);
        assert_eq!(ring.get_next_packet(0), Some(2));
    }
}
