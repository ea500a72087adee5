//! Hardware serial seam used by the buffered stdio UART

use embedded_hal::serial;

/// A transmit capable UART.
///
/// Bytes are pushed with [`serial::Write::write`], which must return
/// [`nb::Error::WouldBlock`] while the hardware cannot take another byte.
pub trait UartPort: serial::Write<u8> {
    /// Selects the UART transmit function on GPIO `pin`. Drivers whose routing is fixed by their
    /// pin types only check it.
    fn route_tx_pin(&mut self, pin: u8);

    /// Configures and enables the peripheral, returning the baud rate in effect
    fn enable(&mut self, baud_rate: u32) -> Result<u32, Self::Error>;
}

/// Binding parameters for [`StdioUartBuf::init`](crate::stdio_uart_buf::StdioUartBuf::init)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartConfig {
    pub baud_rate: u32,
    pub tx_pin: Option<u8>,
    /// Must be `None`, receiving is not supported
    pub rx_pin: Option<u8>,
}

impl UartConfig {
    #[must_use]
    pub const fn tx_only(baud_rate: u32, tx_pin: u8) -> Self {
        Self {
            baud_rate,
            tx_pin: Some(tx_pin),
            rx_pin: None,
        }
    }
}
