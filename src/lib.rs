//! Firmware support library for a minimal USB test device.
//!
//! The device enumerates as a composite USB device (one vendor-specific interface plus a CDC ACM
//! serial port, both at fixed endpoint addresses) and relays its debug log over a UART without
//! ever blocking the code that logs.
//!
//! The interesting part is [`stdio_uart_buf`]: a fixed-capacity transmit ring buffer that is filled
//! from any execution context inside short critical sections and drained one byte at a time by a
//! cooperative main loop. When the buffer overflows the lost bytes are counted and later reported
//! in-band as `[...N bytes...]`, always ahead of any data written after the loss.
//!
//! ```rust, no_run
//! # use core::convert::Infallible;
//! # use usb_test_device::prelude::*;
//! # struct Uart0;
//! # impl embedded_hal::serial::Write<u8> for Uart0 {
//! #     type Error = Infallible;
//! #     fn write(&mut self, _word: u8) -> nb::Result<(), Infallible> { Ok(()) }
//! #     fn flush(&mut self) -> nb::Result<(), Infallible> { Ok(()) }
//! # }
//! # impl UartPort for Uart0 {
//! #     fn route_tx_pin(&mut self, _pin: u8) {}
//! #     fn enable(&mut self, baud_rate: u32) -> Result<u32, Infallible> { Ok(baud_rate) }
//! # }
//! static STDIO: StdioUartBuf<Uart0> = StdioUartBuf::new();
//!
//! STDIO
//!     .init(
//!         Uart0,
//!         UartConfig {
//!             baud_rate: 115_200,
//!             tx_pin: Some(0),
//!             rx_pin: None,
//!         },
//!     )
//!     .ok();
//!
//! STDIO.out_chars(b"hello\n");
//!
//! loop {
//!     // poll usb here
//!     STDIO.task();
//! }
//! ```

#![no_std]

//Allow the use of std in tests
#[cfg(test)]
#[macro_use]
extern crate std;

pub mod cdc;
pub mod descriptor;
pub mod logger;
pub mod prelude;
pub mod stdio_uart_buf;
pub mod tx_ring;
pub mod uart;
pub mod vendor;

#[cfg(test)]
mod test_bus;

/// Errors returned when binding a [`stdio_uart_buf::StdioUartBuf`] to its UART
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioError<E> {
    /// The buffer is already bound to a UART
    AlreadyBound,
    /// The UART refused the requested configuration
    Uart(E),
}

impl<E> From<E> for StdioError<E> {
    fn from(e: E) -> Self {
        StdioError::Uart(e)
    }
}
