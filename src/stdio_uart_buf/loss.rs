//! Discarded byte accounting and the in-band cut notice

use arrayvec::ArrayString;
use core::fmt::Write;

/// Longest notice for a 64-bit count: `[...18446744073709551615 bytes...]\n` is 35 bytes
pub const NOTICE_CAPACITY: usize = 40;

pub type Notice = ArrayString<NOTICE_CAPACITY>;

/// Counts bytes dropped on overflow and how many of them have been reported.
///
/// Both counters are free running and wrap at the `usize` width.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LossCounter {
    discarded_queued_count: usize,
    discarded_sent_count: usize,
}

impl LossCounter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            discarded_queued_count: 0,
            discarded_sent_count: 0,
        }
    }

    /// Dropped bytes not yet covered by a notice in the ring
    #[must_use]
    pub const fn pending(&self) -> usize {
        self.discarded_queued_count
            .wrapping_sub(self.discarded_sent_count)
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.discarded_queued_count != self.discarded_sent_count
    }

    pub fn record(&mut self, count: usize) {
        self.discarded_queued_count = self.discarded_queued_count.wrapping_add(count);
    }

    /// Marks `count` dropped bytes as announced by a notice
    pub fn reported(&mut self, count: usize) {
        self.discarded_sent_count = self.discarded_sent_count.wrapping_add(count);
    }

    #[must_use]
    pub const fn discarded_queued_count(&self) -> usize {
        self.discarded_queued_count
    }

    #[must_use]
    pub const fn discarded_sent_count(&self) -> usize {
        self.discarded_sent_count
    }
}

/// Renders the cut notice `[...<count> bytes...]\n`
#[must_use]
pub fn notice(count: usize) -> Notice {
    let mut text = Notice::new();
    // cannot overflow, NOTICE_CAPACITY covers the widest usize
    writeln!(text, "[...{} bytes...]", count).ok();
    text
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn notice_text() {
        assert_eq!(notice(4).as_str(), "[...4 bytes...]\n");
        assert_eq!(notice(4).len(), 16);
        assert_eq!(notice(1234).as_str(), "[...1234 bytes...]\n");
    }

    #[test]
    fn notice_fits_widest_count() {
        let text = notice(usize::MAX);
        assert!(text.ends_with(" bytes...]\n"));
        assert!(text.len() <= NOTICE_CAPACITY);
        assert_eq!(
            text.as_str().trim_start_matches("[...").split(' ').next(),
            Some(std::format!("{}", usize::MAX).as_str())
        );
    }

    #[test]
    fn pending_tracks_unreported_bytes() {
        let mut loss = LossCounter::new();
        assert!(!loss.is_pending());

        loss.record(4);
        loss.record(3);
        assert!(loss.is_pending());
        assert_eq!(loss.pending(), 7);

        loss.reported(7);
        assert!(!loss.is_pending());
        assert_eq!(loss.pending(), 0);
        assert_eq!(loss.discarded_queued_count(), 7);
        assert_eq!(loss.discarded_sent_count(), 7);
    }

    #[test]
    fn counters_wrap() {
        let mut loss = LossCounter::new();
        loss.record(usize::MAX);
        loss.reported(usize::MAX);
        loss.record(5);
        assert_eq!(loss.pending(), 5);
        assert_eq!(loss.discarded_queued_count(), 4);
    }
}
