//! Fixed capacity transmit ring buffer

/// Circular byte queue addressed by two free running counters.
///
/// `queued_count` is the total number of bytes ever enqueued, `send_count` the total number of
/// bytes ever handed to the hardware. Both wrap at the `usize` width and are never reset; the byte
/// at logical position `i` lives at `buf[i % N]`.
///
/// `N` must be a non-zero power of two so the physical index stays continuous when the counters
/// wrap.
///
/// The ring does no locking of its own, callers serialise access (see
/// [`StdioUartBuf`](crate::stdio_uart_buf::StdioUartBuf)).
#[derive(Debug, Clone)]
pub struct TxRing<const N: usize> {
    buf: [u8; N],
    queued_count: usize,
    send_count: usize,
}

impl<const N: usize> TxRing<N> {
    const CAPACITY_IS_POWER_OF_TWO: () = assert!(
        N.is_power_of_two(),
        "TxRing capacity must be a non-zero power of two"
    );

    #[must_use]
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_IS_POWER_OF_TWO;
        Self {
            buf: [0; N],
            queued_count: 0,
            send_count: 0,
        }
    }

    #[cfg(test)]
    pub(crate) const fn with_counters(count: usize) -> Self {
        let mut ring = Self::new();
        ring.queued_count = count;
        ring.send_count = count;
        ring
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Bytes waiting to be sent
    #[must_use]
    pub const fn len(&self) -> usize {
        self.queued_count.wrapping_sub(self.send_count)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.queued_count == self.send_count
    }

    /// Free space in bytes
    #[must_use]
    pub const fn available(&self) -> usize {
        N - self.len()
    }

    /// Total bytes ever enqueued, wrapping at the `usize` width
    #[must_use]
    pub const fn queued_count(&self) -> usize {
        self.queued_count
    }

    /// Total bytes ever consumed, wrapping at the `usize` width
    #[must_use]
    pub const fn send_count(&self) -> usize {
        self.send_count
    }

    /// Enqueues bytes from `data` and returns how many were accepted.
    ///
    /// With `atomic` set the write is all or nothing: if `data` does not fit nothing is written and
    /// 0 is returned. Otherwise as many bytes as fit are written and the rest silently dropped.
    pub fn write(&mut self, data: &[u8], atomic: bool) -> usize {
        let available = self.available();
        let count = if data.len() > available {
            if atomic {
                return 0;
            }
            available
        } else {
            data.len()
        };

        let start = self.queued_count % N;
        let head = count.min(N - start);
        self.buf[start..start + head].copy_from_slice(&data[..head]);
        self.buf[..count - head].copy_from_slice(&data[head..count]);

        self.queued_count = self.queued_count.wrapping_add(count);
        count
    }

    /// Oldest queued byte, if any, without removing it
    #[must_use]
    pub fn front(&self) -> Option<u8> {
        if self.is_empty() {
            None
        } else {
            Some(self.buf[self.send_count % N])
        }
    }

    /// Removes the oldest queued byte. Does nothing when empty.
    pub fn consume(&mut self) {
        if !self.is_empty() {
            self.send_count = self.send_count.wrapping_add(1);
        }
    }
}

impl<const N: usize> Default for TxRing<N> {
    fn default() -> Self {
        Self::new()
    }
}
