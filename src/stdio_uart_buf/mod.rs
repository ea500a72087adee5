//! Non-blocking buffered UART output for diagnostics
//!
//! Output is copied into a [`TxRing`] inside a short critical section and drained to the UART by
//! [`StdioUartBuf::task`], which the cooperative main loop calls once per iteration. Writers never
//! wait for the hardware.
//!
//! Formatted output goes through [`StdioUartBuf::out_chars`]. When it does not fit, the number of
//! dropped bytes is remembered and `task` later queues a `[...N bytes...]` notice in its place.
//! Until that notice is in the ring every further `out_chars` call is dropped (and counted) as a
//! whole, so nothing written after a loss can reach the wire ahead of its notice.
//!
//! Receiving is not supported.

use core::cell::RefCell;
use core::sync::atomic::{self, Ordering};
use critical_section::Mutex;
use embedded_hal::serial::Write;
use log::info;

use crate::tx_ring::TxRing;
use crate::uart::{UartConfig, UartPort};
use crate::StdioError;
use loss::LossCounter;

pub mod loss;

pub const DEFAULT_TX_CAPACITY: usize = 1024;

/// Sink for formatted text output, such as the [`UartLogger`](crate::logger::UartLogger)
pub trait StdioDriver {
    /// Queues `buf` for output without blocking, returning the number of bytes accepted
    fn out_chars(&self, buf: &[u8]) -> usize;
}

#[derive(Debug)]
struct TxState<const N: usize> {
    ring: TxRing<N>,
    loss: LossCounter,
}

/// Transmit-only UART stdio driver backed by a ring buffer of `N` bytes.
///
/// All methods take `&self`, so a single instance can be a `static` shared between the main loop
/// and interrupt handlers. [`init`](Self::init), [`task`](Self::task) and [`flush`](Self::flush)
/// belong to the main loop, everything else may be called from any context.
pub struct StdioUartBuf<U, const N: usize = DEFAULT_TX_CAPACITY> {
    tx: Mutex<RefCell<TxState<N>>>,
    uart: Mutex<RefCell<Option<U>>>,
}

impl<U, const N: usize> StdioUartBuf<U, N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tx: Mutex::new(RefCell::new(TxState {
                ring: TxRing::new(),
                loss: LossCounter::new(),
            })),
            uart: Mutex::new(RefCell::new(None)),
        }
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        critical_section::with(|cs| self.uart.borrow_ref(cs).is_some())
    }

    /// Free space in the transmit buffer
    #[must_use]
    pub fn tx_available(&self) -> usize {
        self.with_tx(|tx| tx.ring.available())
    }

    /// Bytes handed to the UART so far, wrapping at the `usize` width
    #[must_use]
    pub fn tx_send_count(&self) -> usize {
        self.with_tx(|tx| tx.ring.send_count())
    }

    /// Dropped bytes that have not been announced by a notice yet
    #[must_use]
    pub fn tx_discard_pending(&self) -> usize {
        self.with_tx(|tx| tx.loss.pending())
    }

    /// Queues as much of `data` as fits and returns the number of bytes accepted.
    ///
    /// Bytes that do not fit are dropped silently, compare the result with `data.len()` to detect
    /// truncation.
    pub fn tx_write(&self, data: &[u8]) -> usize {
        self.with_tx(|tx| tx.ring.write(data, false))
    }

    /// Queues all of `data` or nothing, returning `data.len()` or 0
    pub fn tx_write_atom(&self, data: &[u8]) -> usize {
        self.with_tx(|tx| tx.ring.write(data, true))
    }

    /// Queues formatted output, accounting for anything that has to be dropped.
    ///
    /// Returns the number of bytes accepted. Dropped bytes are reported later on the wire by
    /// [`task`](Self::task).
    pub fn out_chars(&self, data: &[u8]) -> usize {
        self.with_tx(|tx| {
            // An earlier loss has not been reported yet, writing now would put this data ahead
            // of its notice.
            let wrote = if tx.loss.is_pending() {
                0
            } else {
                tx.ring.write(data, false)
            };

            if wrote < data.len() {
                tx.loss.record(data.len() - wrote);
            }
            wrote
        })
    }

    /// Queues one cut notice for the pending discard count. Returns `false` if there was nothing
    /// to report or no room for the notice.
    fn queue_notice(&self) -> bool {
        self.with_tx(|tx| {
            let count = tx.loss.pending();
            if count == 0 {
                return false;
            }

            let text = loss::notice(count);
            if tx.ring.write(text.as_bytes(), true) == 0 {
                return false;
            }
            tx.loss.reported(count);
            true
        })
    }

    fn with_tx<R>(&self, f: impl FnOnce(&mut TxState<N>) -> R) -> R {
        critical_section::with(|cs| f(&mut *self.tx.borrow_ref_mut(cs)))
    }
}

impl<U: UartPort, const N: usize> StdioUartBuf<U, N> {
    /// Binds the buffer to `uart` and enables it, returning the baud rate achieved.
    ///
    /// Main loop only.
    ///
    /// # Panics
    ///
    /// If `config.rx_pin` is set, receiving is not supported.
    pub fn init(&self, mut uart: U, config: UartConfig) -> Result<u32, StdioError<U::Error>> {
        assert!(
            config.rx_pin.is_none(),
            "stdio_uart_buf is transmit only, rx_pin must be None"
        );

        if self.is_bound() {
            return Err(StdioError::AlreadyBound);
        }

        if let Some(pin) = config.tx_pin {
            uart.route_tx_pin(pin);
        }
        let baud_rate = uart.enable(config.baud_rate)?;

        critical_section::with(|cs| self.uart.borrow(cs).replace(Some(uart)));
        info!(
            "stdio uart bound at {} baud, {} byte tx buffer",
            baud_rate, N
        );
        Ok(baud_rate)
    }

    /// Reports pending losses and moves queued bytes to the UART until it stops accepting them.
    ///
    /// Call once per main loop iteration. Never waits for the hardware.
    pub fn task(&self) {
        while self.queue_notice() {}

        critical_section::with(|cs| {
            let mut uart = self.uart.borrow_ref_mut(cs);
            if let Some(uart) = uart.as_mut() {
                let mut tx = self.tx.borrow_ref_mut(cs);
                while let Some(byte) = tx.ring.front() {
                    // WouldBlock or a hardware error, the byte stays queued for the next pass
                    if uart.write(byte).is_err() {
                        break;
                    }
                    tx.ring.consume();
                }
            }
        });
        atomic::fence(Ordering::SeqCst);
    }

    /// Runs [`task`](Self::task) until the transmit buffer is empty.
    ///
    /// Does not wait for the UART's own FIFO to drain. Returns immediately when no UART is
    /// bound. Main loop only.
    pub fn flush(&self) {
        if !self.is_bound() {
            return;
        }
        while !self.with_tx(|tx| tx.ring.is_empty()) {
            self.task();
        }
    }
}

impl<U, const N: usize> Default for StdioUartBuf<U, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U, const N: usize> StdioDriver for StdioUartBuf<U, N> {
    fn out_chars(&self, buf: &[u8]) -> usize {
        StdioUartBuf::out_chars(self, buf)
    }
}
