use embedded_hal::serial::Write;
use fugit::HertzU32;
use log::warn;
use rp2040_hal::gpio::bank0::{Gpio0, Gpio1};
use rp2040_hal::gpio::{FunctionUart, Pin};
use rp2040_hal::pac::UART0;
use rp2040_hal::uart::{self, DataBits, Disabled, Enabled, StopBits, UartPeripheral};
use usb_test_device::uart::UartPort;

/// GPIO wired to the UART0 transmitter by [`Uart0Pins`]
pub const TX_PIN: u8 = 0;

/// GPIO 1 is switched to the UART as well, the receiver is never read
pub type Uart0Pins = (Pin<Gpio0, FunctionUart>, Pin<Gpio1, FunctionUart>);

#[derive(Debug)]
pub enum UartError {
    /// Written before a successful `enable`
    Disabled,
    /// The HAL refused the line settings
    Config(uart::Error),
}

enum State {
    Disabled(UartPeripheral<Disabled, UART0, Uart0Pins>),
    Enabled(UartPeripheral<Enabled, UART0, Uart0Pins>),
}

/// UART0 with 8N1 framing on the HAL's peripheral driver
pub struct Uart0 {
    state: Option<State>,
    peripheral_clock: HertzU32,
}

impl Uart0 {
    #[must_use]
    pub fn new(
        uart: UartPeripheral<Disabled, UART0, Uart0Pins>,
        peripheral_clock: HertzU32,
    ) -> Self {
        Self {
            state: Some(State::Disabled(uart)),
            peripheral_clock,
        }
    }
}

impl Write<u8> for Uart0 {
    type Error = UartError;

    fn write(&mut self, word: u8) -> nb::Result<(), UartError> {
        match self.state.as_mut() {
            Some(State::Enabled(uart)) => uart
                .write(word)
                .map_err(|e| e.map(|never| match never {})),
            _ => Err(nb::Error::Other(UartError::Disabled)),
        }
    }

    fn flush(&mut self) -> nb::Result<(), UartError> {
        match self.state.as_mut() {
            Some(State::Enabled(uart)) => uart
                .flush()
                .map_err(|e| e.map(|never| match never {})),
            _ => Err(nb::Error::Other(UartError::Disabled)),
        }
    }
}

impl UartPort for Uart0 {
    fn route_tx_pin(&mut self, pin: u8) {
        // routing is fixed by the pin types
        if pin != TX_PIN {
            warn!("UART0 transmits on GPIO {}, not GPIO {}", TX_PIN, pin);
        }
    }

    fn enable(&mut self, baud_rate: u32) -> Result<u32, UartError> {
        let disabled = match self.state.take() {
            Some(State::Disabled(uart)) => uart,
            Some(State::Enabled(uart)) => uart.disable(),
            None => return Err(UartError::Disabled),
        };

        let config = uart::UartConfig::new(
            HertzU32::from_raw(baud_rate),
            DataBits::Eight,
            None,
            StopBits::One,
        );
        let enabled = disabled
            .enable(config, self.peripheral_clock)
            .map_err(UartError::Config)?;
        self.state = Some(State::Enabled(enabled));

        // the divided rate is not exposed by the HAL
        Ok(baud_rate)
    }
}
