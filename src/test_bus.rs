//! Fake `UsbBus` shared by the USB class tests
//!
//! EP0 IN writes complete on the following poll, other endpoints complete at once. SETUP packets
//! and OUT data are queued by the host side one at a time.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::cell::RefCell;
use std::sync::Mutex;
use std::vec::Vec;

use env_logger::Env;
use log::SetLoggerError;
use packed_struct::prelude::*;
#[allow(clippy::wildcard_imports)]
use usb_device::class_prelude::*;
use usb_device::bus::PollResult;
use usb_device::prelude::*;
use usb_device::{Result, UsbDirection};

pub(crate) fn init_logging() {
    let _: core::result::Result<(), SetLoggerError> =
        env_logger::Builder::from_env(Env::default().default_filter_or("trace"))
            .is_test(true)
            .try_init();
}

#[derive(Default)]
pub(crate) struct UsbTestManager {
    in_buf: Mutex<RefCell<Vec<u8>>>,
    setup_buf: Mutex<RefCell<Vec<u8>>>,
    out_buf: Mutex<RefCell<Option<(usize, Vec<u8>)>>>,
    ep_in: Mutex<RefCell<Vec<(EndpointAddress, Vec<u8>)>>>,
    in_complete: Mutex<RefCell<u16>>,
    stalled: Mutex<RefCell<bool>>,
    reset_pending: Mutex<RefCell<bool>>,
}

impl UsbTestManager {
    pub(crate) fn host_write_setup(&self, data: &[u8]) -> Result<()> {
        let buf = self.setup_buf.lock().unwrap();
        if buf.borrow().is_empty() {
            buf.borrow_mut().extend_from_slice(data);
            Ok(())
        } else {
            Err(UsbError::WouldBlock)
        }
    }

    pub(crate) fn host_write_out(&self, ep_addr: u8, data: &[u8]) -> Result<()> {
        let buf = self.out_buf.lock().unwrap();
        if buf.borrow().is_some() {
            return Err(UsbError::WouldBlock);
        }
        let index = EndpointAddress::from(ep_addr).index();
        buf.replace(Some((index, data.to_vec())));
        Ok(())
    }

    pub(crate) fn host_read_in(&self) -> Vec<u8> {
        self.in_buf.lock().unwrap().take()
    }

    pub(crate) fn host_read_endpoints(&self) -> Vec<(EndpointAddress, Vec<u8>)> {
        self.ep_in.lock().unwrap().take()
    }

    pub(crate) fn host_reset(&self) {
        self.reset_pending.lock().unwrap().replace(true);
    }

    pub(crate) fn take_stalled(&self) -> bool {
        self.stalled.lock().unwrap().take()
    }

    fn has_setup_data(&self) -> bool {
        !self.setup_buf.lock().unwrap().borrow().is_empty()
    }

    fn pending_out(&self) -> u16 {
        self.out_buf
            .lock()
            .unwrap()
            .borrow()
            .as_ref()
            .map_or(0, |(index, _)| 1 << *index)
    }

    fn device_read_setup(&self, data: &mut [u8]) -> Result<usize> {
        let buf = self.setup_buf.lock().unwrap();
        if buf.borrow().is_empty() {
            Err(UsbError::WouldBlock)
        } else {
            let tmp = buf.take();
            data[..tmp.len()].copy_from_slice(&tmp);
            Ok(tmp.len())
        }
    }

    fn device_read_out(&self, index: usize, data: &mut [u8]) -> Result<usize> {
        let buf = self.out_buf.lock().unwrap();
        let packet = buf.borrow_mut().take();
        match packet {
            Some((i, tmp)) if i == index => {
                if tmp.len() > data.len() {
                    return Err(UsbError::BufferOverflow);
                }
                data[..tmp.len()].copy_from_slice(&tmp);
                Ok(tmp.len())
            }
            other => {
                buf.replace(other);
                Err(UsbError::WouldBlock)
            }
        }
    }

    fn device_write(&self, data: &[u8]) -> Result<usize> {
        let buf = self.in_buf.lock().unwrap();
        if buf.borrow().is_empty() {
            buf.borrow_mut().extend_from_slice(data);
            *self.in_complete.lock().unwrap().borrow_mut() |= 1;
            Ok(data.len())
        } else {
            Err(UsbError::WouldBlock)
        }
    }

    fn device_write_endpoint(&self, ep_addr: EndpointAddress, data: &[u8]) -> Result<usize> {
        self.ep_in
            .lock()
            .unwrap()
            .borrow_mut()
            .push((ep_addr, data.to_vec()));
        *self.in_complete.lock().unwrap().borrow_mut() |= 1 << ep_addr.index();
        Ok(data.len())
    }
}

pub(crate) struct TestUsbBus<'a> {
    next_ep_index: usize,
    manager: &'a UsbTestManager,
}

impl<'a> TestUsbBus<'a> {
    pub(crate) fn new(manager: &'a UsbTestManager) -> Self {
        TestUsbBus {
            next_ep_index: 1,
            manager,
        }
    }
}

impl UsbBus for TestUsbBus<'_> {
    fn alloc_ep(
        &mut self,
        ep_dir: UsbDirection,
        ep_addr: Option<EndpointAddress>,
        ep_type: EndpointType,
        _max_packet_size: u16,
        _interval: u8,
    ) -> Result<EndpointAddress> {
        if ep_type == EndpointType::Control {
            return Ok(EndpointAddress::from_parts(0, ep_dir));
        }
        if let Some(ep_addr) = ep_addr {
            return Ok(ep_addr);
        }
        let ep = EndpointAddress::from_parts(self.next_ep_index, ep_dir);
        self.next_ep_index += 1;
        Ok(ep)
    }

    fn enable(&mut self) {}
    fn reset(&self) {}
    fn set_device_address(&self, _addr: u8) {
        todo!()
    }
    fn write(&self, ep_addr: EndpointAddress, buf: &[u8]) -> Result<usize> {
        if ep_addr.index() == 0 {
            self.manager.device_write(buf)
        } else {
            self.manager.device_write_endpoint(ep_addr, buf)
        }
    }
    fn read(&self, ep_addr: EndpointAddress, buf: &mut [u8]) -> Result<usize> {
        if ep_addr.index() == 0 && self.manager.has_setup_data() {
            self.manager.device_read_setup(buf)
        } else {
            self.manager.device_read_out(ep_addr.index(), buf)
        }
    }
    fn set_stalled(&self, ep_addr: EndpointAddress, stalled: bool) {
        if stalled && ep_addr.index() == 0 {
            self.manager.stalled.lock().unwrap().replace(true);
        }
    }
    fn is_stalled(&self, _ep_addr: EndpointAddress) -> bool {
        todo!()
    }
    fn suspend(&self) {
        todo!()
    }
    fn resume(&self) {
        todo!()
    }
    fn poll(&self) -> PollResult {
        if self.manager.reset_pending.lock().unwrap().take() {
            return PollResult::Reset;
        }
        PollResult::Data {
            ep_out: self.manager.pending_out(),
            ep_in_complete: self.manager.in_complete.lock().unwrap().take(),
            ep_setup: u16::from(self.manager.has_setup_data()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PackedStruct)]
#[packed_struct(endian = "lsb", bit_numbering = "msb0", size_bytes = "8")]
pub(crate) struct UsbRequest {
    #[packed_field(bits = "0")]
    pub(crate) direction: bool,
    #[packed_field(bits = "1:2")]
    pub(crate) request_type: u8,
    #[packed_field(bits = "4:7")]
    pub(crate) recipient: u8,
    pub(crate) request: u8,
    pub(crate) value: u16,
    pub(crate) index: u16,
    pub(crate) length: u16,
}

pub(crate) const DEVICE_TO_HOST: bool = true;
pub(crate) const HOST_TO_DEVICE: bool = false;

/// Collects a device-to-host control transfer, polling once per packet the host takes
pub(crate) fn read_control_data<'a>(
    manager: &UsbTestManager,
    usb_dev: &mut UsbDevice<'_, TestUsbBus<'a>>,
    classes: &mut [&mut dyn UsbClass<TestUsbBus<'a>>],
) -> Vec<u8> {
    let mut data = Vec::new();
    loop {
        let read = manager.host_read_in();
        if read.is_empty() {
            break;
        }
        data.extend_from_slice(&read);
        assert!(usb_dev.poll(classes));
    }
    data
}
