//! # USB Test Device A firmware for the Raspberry Pi Pico
//!
//! Enumerates as a composite device with the vendor interface and a CDC serial port, and logs to
//! UART0 on GPIO 0 through the non-blocking stdio buffer.

#![no_std]
#![no_main]

use cortex_m_rt::entry;
use hal::pac;
use hal::Clock;
use log::*;
use rp2040_hal as hal;
use usb_device::class_prelude::*;
use usb_device::prelude::*;
use usb_test_device::descriptor::*;
use usb_test_device::prelude::*;

use crate::uart::Uart0;

mod panic;
mod uart;

#[link_section = ".boot2"]
#[used]
pub static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_GENERIC_03H;

const XTAL_FREQ_HZ: u32 = 12_000_000u32;
const MAX_LOG_LEVEL: LevelFilter = LevelFilter::Debug;
const STDIO_CONFIG: UartConfig = UartConfig::tx_only(115_200, 0);

static STDIO: StdioUartBuf<Uart0> = StdioUartBuf::new();
static LOGGER: UartLogger<StdioUartBuf<Uart0>> = UartLogger::with_flush(&STDIO, flush_stdio);

fn flush_stdio() {
    STDIO.flush();
}

#[entry]
fn main() -> ! {
    let mut pac = pac::Peripherals::take().unwrap();

    let mut watchdog = hal::Watchdog::new(pac.WATCHDOG);
    let clocks = hal::clocks::init_clocks_and_plls(
        XTAL_FREQ_HZ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok()
    .unwrap();

    //Logger first, interrupts are not enabled yet
    unsafe {
        log::set_logger_racy(&LOGGER)
            .map(|()| log::set_max_level(MAX_LOG_LEVEL))
            .unwrap();
    }

    let sio = hal::Sio::new(pac.SIO);
    let pins = hal::gpio::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );
    let uart_pins = (
        pins.gpio0.into_mode::<hal::gpio::FunctionUart>(),
        pins.gpio1.into_mode::<hal::gpio::FunctionUart>(),
    );
    let uart = Uart0::new(
        hal::uart::UartPeripheral::new(pac.UART0, uart_pins, &mut pac.RESETS),
        clocks.peripheral_clock.freq(),
    );
    match STDIO.init(uart, STDIO_CONFIG) {
        Ok(baud_rate) => info!("Starting up... {} baud", baud_rate),
        Err(e) => panic!("Failed to start stdio uart: {:?}", e),
    }

    //USB
    let usb_bus = UsbBusAllocator::new(hal::usb::UsbBus::new(
        pac.USBCTRL_REGS,
        pac.USBCTRL_DPRAM,
        clocks.usb_clock,
        true,
        &mut pac.RESETS,
    ));

    //Vendor interface must take interface 0, the serial port follows it
    let mut vendor = match VendorInterface::new(&usb_bus) {
        Ok(vendor) => vendor,
        Err(e) => panic!("Failed to allocate vendor interface: {:?}", e),
    };
    let mut serial = match CdcAcmInterface::new(&usb_bus) {
        Ok(serial) => serial,
        Err(e) => panic!("Failed to allocate serial port: {:?}", e),
    };

    let mut usb_dev = UsbDeviceBuilder::new(&usb_bus, UsbVidPid(VENDOR_ID, PRODUCT_ID))
        .manufacturer(MANUFACTURER)
        .product(PRODUCT)
        .serial_number(SERIAL_NUMBER)
        .device_release(DEVICE_RELEASE)
        .composite_with_iads()
        .max_packet_size_0(EP0_PACKET_SIZE)
        .build();

    loop {
        if usb_dev.poll(&mut [&mut vendor, &mut serial]) {
            if let Some(command) = vendor.take_command() {
                debug!("Command {:X?}", command.as_slice());
            }

            let mut buf = [0u8; CDC_PACKET_SIZE as usize];
            match serial.read(&mut buf) {
                Err(UsbError::WouldBlock) | Ok(0) => {}
                Ok(count) => {
                    debug!("Serial port received {} bytes", count);
                }
                Err(e) => {
                    warn!("Failed to read serial port: {:?}", e);
                }
            }
        }

        STDIO.task();
    }
}
