//! Vendor-specific interface 0 of the test device
//!
//! One interrupt IN endpoint carrying ADC samples and a bulk OUT/IN pair for commands, all at fixed
//! addresses so the host-side test suite can address them directly. The interface declines every
//! control request.

use arrayvec::ArrayVec;
#[allow(clippy::wildcard_imports)]
use usb_device::class_prelude::*;
use usb_device::control::{Recipient, Request, RequestType};
use usb_device::Result;
use log::{info, trace, warn};

use crate::descriptor::{
    self, ADC_PACKET_SIZE, ADC_POLL_INTERVAL, CMD_PACKET_SIZE, EP_ADDR_ADC, EP_ADDR_CMD_IN,
    EP_ADDR_CMD_OUT, STRING_INDEX_INTERFACE0, STRING_INDEX_INTERFACE1, USB_CLASS_VENDOR_SPECIFIC,
    VENDOR_INTERFACE,
};

const CMD_BUFFER_LEN: usize = CMD_PACKET_SIZE as usize;

/// One packet received on the command OUT endpoint
pub type CommandPacket = ArrayVec<u8, CMD_BUFFER_LEN>;

pub struct VendorInterface<'a, B: UsbBus> {
    interface: InterfaceNumber,
    name: StringIndex,
    native_name: StringIndex,
    adc_in: EndpointIn<'a, B>,
    cmd_out: EndpointOut<'a, B>,
    cmd_in: EndpointIn<'a, B>,
    command: Option<CommandPacket>,
    adc_in_complete: u32,
    cmd_in_complete: u32,
}

impl<'a, B: UsbBus> VendorInterface<'a, B> {
    /// Allocates the interface, its strings and its endpoints.
    ///
    /// Must be the first class allocated: the host expects interface 0 named by string 4. String 5
    /// is taken as well, it names the native interface the host suite reserves, so the serial
    /// port's name lands on string 6. Fails with [`UsbError::Unsupported`] otherwise, or with the
    /// bus error if an endpoint address is taken.
    pub fn new(usb_alloc: &'a UsbBusAllocator<B>) -> Result<Self> {
        let interface = usb_alloc.interface();
        let name = usb_alloc.string();
        let native_name = usb_alloc.string();
        if u8::from(interface) != VENDOR_INTERFACE
            || u8::from(name) != STRING_INDEX_INTERFACE0
            || u8::from(native_name) != STRING_INDEX_INTERFACE1
        {
            warn!(
                "Vendor interface must be allocated first, got interface {} string {}",
                u8::from(interface),
                u8::from(name)
            );
            return Err(UsbError::Unsupported);
        }

        Ok(Self {
            interface,
            name,
            native_name,
            adc_in: usb_alloc.alloc(
                Some(EP_ADDR_ADC.into()),
                EndpointType::Interrupt,
                ADC_PACKET_SIZE,
                ADC_POLL_INTERVAL,
            )?,
            cmd_out: usb_alloc.alloc(
                Some(EP_ADDR_CMD_OUT.into()),
                EndpointType::Bulk,
                CMD_PACKET_SIZE,
                0,
            )?,
            cmd_in: usb_alloc.alloc(
                Some(EP_ADDR_CMD_IN.into()),
                EndpointType::Bulk,
                CMD_PACKET_SIZE,
                0,
            )?,
            command: None,
            adc_in_complete: 0,
            cmd_in_complete: 0,
        })
    }

    #[must_use]
    pub fn interface_number(&self) -> InterfaceNumber {
        self.interface
    }

    #[must_use]
    pub fn name_index(&self) -> StringIndex {
        self.name
    }

    /// Takes the last command packet received from the host, if any
    pub fn take_command(&mut self) -> Option<CommandPacket> {
        self.command.take()
    }

    /// Queues an ADC sample packet on the interrupt endpoint
    pub fn write_adc(&self, packet: &[u8]) -> Result<usize> {
        self.adc_in.write(packet)
    }

    /// Queues a command response on the bulk IN endpoint
    pub fn write_response(&self, data: &[u8]) -> Result<usize> {
        self.cmd_in.write(data)
    }

    /// Completed IN transfers on `addr` since the last reset, 0 for endpoints of other classes
    #[must_use]
    pub fn in_complete_count(&self, addr: EndpointAddress) -> u32 {
        if addr == self.adc_in.address() {
            self.adc_in_complete
        } else if addr == self.cmd_in.address() {
            self.cmd_in_complete
        } else {
            0
        }
    }

    fn is_for_interface(&self, request: &Request) -> bool {
        request.recipient == Recipient::Interface
            && request.index == u16::from(u8::from(self.interface))
    }
}

impl<B: UsbBus> UsbClass<B> for VendorInterface<'_, B> {
    fn get_configuration_descriptors(&self, writer: &mut DescriptorWriter) -> Result<()> {
        writer.interface_alt(
            self.interface,
            0,
            USB_CLASS_VENDOR_SPECIFIC,
            0x00,
            0x00,
            Some(self.name),
        )?;
        writer.endpoint(&self.adc_in)?;
        writer.endpoint(&self.cmd_out)?;
        writer.endpoint(&self.cmd_in)?;
        trace!("wrote vendor interface descriptor");
        Ok(())
    }

    fn get_string(&self, index: StringIndex, _lang_id: u16) -> Option<&str> {
        let index = u8::from(index);
        if index == u8::from(self.name) || index == u8::from(self.native_name) {
            descriptor::string(index)
        } else {
            None
        }
    }

    fn reset(&mut self) {
        info!("Reset");
        self.command = None;
        self.adc_in_complete = 0;
        self.cmd_in_complete = 0;
    }

    fn control_out(&mut self, transfer: ControlOut<B>) {
        let request = transfer.request();
        if request.request_type == RequestType::Vendor && self.is_for_interface(request) {
            trace!(
                "Declined vendor ctrl_out request: {:X}, value: {:X}, length: {:X}",
                request.request,
                request.value,
                request.length
            );
        }
    }

    fn control_in(&mut self, transfer: ControlIn<B>) {
        let request = transfer.request();
        if request.request_type == RequestType::Vendor && self.is_for_interface(request) {
            trace!(
                "Declined vendor ctrl_in request: {:X}, value: {:X}, length: {:X}",
                request.request,
                request.value,
                request.length
            );
        }
    }

    fn endpoint_out(&mut self, addr: EndpointAddress) {
        if addr != self.cmd_out.address() {
            return;
        }

        let mut buf = [0_u8; CMD_BUFFER_LEN];
        match self.cmd_out.read(&mut buf) {
            Ok(n) => {
                let mut packet = CommandPacket::new();
                packet.try_extend_from_slice(&buf[..n]).ok();
                if self.command.replace(packet).is_some() {
                    warn!("Unread command packet overwritten");
                }
                trace!("Received command packet, {:X} bytes", n);
            }
            Err(UsbError::WouldBlock) => {}
            Err(e) => warn!("Failed to read command packet - {:?}", e),
        }
    }

    fn endpoint_in_complete(&mut self, addr: EndpointAddress) {
        if addr == self.adc_in.address() {
            self.adc_in_complete = self.adc_in_complete.wrapping_add(1);
        } else if addr == self.cmd_in.address() {
            self.cmd_in_complete = self.cmd_in_complete.wrapping_add(1);
        }
    }
}

#[cfg(test)]
mod test;
