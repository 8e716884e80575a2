//! Fixed-size result slot owned by an engine.

/// Destination buffer an engine writes into between drains.
#[derive(Debug)]
pub(crate) struct ResultSlot {
    buffer: Vec<u8>,
    filled: usize,
}

impl ResultSlot {
    /// Allocate a slot of `length` bytes, or `default_length` when zero.
    pub(crate) fn new(length: usize, default_length: usize) -> Self {
        let length = if length == 0 { default_length } else { length };
        Self {
            buffer: vec![0u8; length.max(1)],
            filled: 0,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.filled == self.buffer.len()
    }

    /// Unwritten tail of the slot.
    pub(crate) fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.buffer[self.filled..]
    }

    pub(crate) fn advance(&mut self, written: usize) {
        self.filled = (self.filled + written).min(self.buffer.len());
    }

    /// Hand out the filled prefix and reset the slot.
    pub(crate) fn take(&mut self) -> &[u8] {
        let filled = std::mem::take(&mut self.filled);
        &self.buffer[..filled]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_length_uses_default() {
        let slot = ResultSlot::new(0, 64);
        assert_eq!(slot.capacity(), 64);

        let slot = ResultSlot::new(1, 64);
        assert_eq!(slot.capacity(), 1);
    }

    #[test]
    fn test_fill_and_take() {
        let mut slot = ResultSlot::new(4, 64);
        slot.spare_mut()[..3].copy_from_slice(b"abc");
        slot.advance(3);
        assert!(!slot.is_full());

        slot.spare_mut()[0] = b'd';
        slot.advance(1);
        assert!(slot.is_full());

        assert_eq!(slot.take(), b"abcd");
        assert!(slot.take().is_empty());
        assert_eq!(slot.spare_mut().len(), 4);
    }
}
