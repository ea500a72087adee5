//! CDC ACM serial port on interfaces 1 and 2
//!
//! Endpoints, interface numbers and the interface string are fixed so the port matches what the
//! host-side test suite enumerates: notifications on 0x81, data on 0x02 and 0x82.

#[allow(clippy::wildcard_imports)]
use usb_device::class_prelude::*;
use usb_device::control::{Recipient, Request, RequestType};
use usb_device::Result;
use log::{info, trace, warn};

use crate::descriptor::{
    self, CDC_COMM_INTERFACE, CDC_DATA_INTERFACE, CDC_NOTIF_PACKET_SIZE, CDC_NOTIF_POLL_INTERVAL,
    CDC_PACKET_SIZE, CDC_PROTOCOL_NONE, CDC_SUBCLASS_ACM, EP_ADDR_CDC_IN, EP_ADDR_CDC_NOTIF,
    EP_ADDR_CDC_OUT, STRING_INDEX_PORT, USB_CLASS_CDC, USB_CLASS_CDC_DATA,
};

const CS_INTERFACE: u8 = 0x24;
const CDC_TYPE_HEADER: u8 = 0x00;
const CDC_TYPE_CALL_MANAGEMENT: u8 = 0x01;
const CDC_TYPE_ACM: u8 = 0x02;
const CDC_TYPE_UNION: u8 = 0x06;

const CDC_VERSION: u16 = 0x0120; //1.20 in BCD
const ACM_CAPABILITY_LINE_CODING: u8 = 0x02;

const REQ_SET_LINE_CODING: u8 = 0x20;
const REQ_GET_LINE_CODING: u8 = 0x21;
const REQ_SET_CONTROL_LINE_STATE: u8 = 0x22;
const REQ_SEND_BREAK: u8 = 0x23;

pub const LINE_CODING_LEN: usize = 7;

/// Line settings the host last sent with SET_LINE_CODING
///
/// Only stored and reported back, the port carries no real UART.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineCoding {
    pub data_rate: u32,
    /// 0 = 1 stop bit, 1 = 1.5, 2 = 2
    pub stop_bits: u8,
    /// 0 = none, 1 = odd, 2 = even, 3 = mark, 4 = space
    pub parity: u8,
    pub data_bits: u8,
}

impl Default for LineCoding {
    fn default() -> Self {
        Self {
            data_rate: 115_200,
            stop_bits: 0,
            parity: 0,
            data_bits: 8,
        }
    }
}

impl LineCoding {
    #[must_use]
    pub fn to_bytes(&self) -> [u8; LINE_CODING_LEN] {
        let rate = self.data_rate.to_le_bytes();
        [
            rate[0],
            rate[1],
            rate[2],
            rate[3],
            self.stop_bits,
            self.parity,
            self.data_bits,
        ]
    }

    /// Parses the wire layout, `None` if `data` is too short
    #[must_use]
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        match *data {
            [r0, r1, r2, r3, stop_bits, parity, data_bits, ..] => Some(Self {
                data_rate: u32::from_le_bytes([r0, r1, r2, r3]),
                stop_bits,
                parity,
                data_bits,
            }),
            _ => None,
        }
    }
}

pub struct CdcAcmInterface<'a, B: UsbBus> {
    comm_interface: InterfaceNumber,
    data_interface: InterfaceNumber,
    name: StringIndex,
    notif_in: EndpointIn<'a, B>,
    data_out: EndpointOut<'a, B>,
    data_in: EndpointIn<'a, B>,
    line_coding: LineCoding,
    dtr: bool,
    rts: bool,
}

impl<'a, B: UsbBus> CdcAcmInterface<'a, B> {
    /// Allocates both interfaces, the port string and the three endpoints.
    ///
    /// Must follow [`crate::vendor::VendorInterface::new`] so the interfaces land on 1 and 2 and the
    /// name on string 6. Fails with [`UsbError::Unsupported`] otherwise, or with the bus error if an
    /// endpoint address is taken.
    pub fn new(usb_alloc: &'a UsbBusAllocator<B>) -> Result<Self> {
        let comm_interface = usb_alloc.interface();
        let data_interface = usb_alloc.interface();
        let name = usb_alloc.string();
        if u8::from(comm_interface) != CDC_COMM_INTERFACE
            || u8::from(data_interface) != CDC_DATA_INTERFACE
            || u8::from(name) != STRING_INDEX_PORT
        {
            warn!(
                "Serial port must follow the vendor interface, got interface {} string {}",
                u8::from(comm_interface),
                u8::from(name)
            );
            return Err(UsbError::Unsupported);
        }

        Ok(Self {
            comm_interface,
            data_interface,
            name,
            notif_in: usb_alloc.alloc(
                Some(EP_ADDR_CDC_NOTIF.into()),
                EndpointType::Interrupt,
                CDC_NOTIF_PACKET_SIZE,
                CDC_NOTIF_POLL_INTERVAL,
            )?,
            data_out: usb_alloc.alloc(
                Some(EP_ADDR_CDC_OUT.into()),
                EndpointType::Bulk,
                CDC_PACKET_SIZE,
                0,
            )?,
            data_in: usb_alloc.alloc(
                Some(EP_ADDR_CDC_IN.into()),
                EndpointType::Bulk,
                CDC_PACKET_SIZE,
                0,
            )?,
            line_coding: LineCoding::default(),
            dtr: false,
            rts: false,
        })
    }

    #[must_use]
    pub fn name_index(&self) -> StringIndex {
        self.name
    }

    /// Reads one packet from the data OUT endpoint, `WouldBlock` if none arrived
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        self.data_out.read(buf)
    }

    /// Queues one packet on the data IN endpoint
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        self.data_in.write(data)
    }

    #[must_use]
    pub fn line_coding(&self) -> LineCoding {
        self.line_coding
    }

    /// Data terminal ready, as last set by the host
    #[must_use]
    pub fn dtr(&self) -> bool {
        self.dtr
    }

    /// Request to send, as last set by the host
    #[must_use]
    pub fn rts(&self) -> bool {
        self.rts
    }

    fn is_class_request(&self, request: &Request) -> bool {
        request.request_type == RequestType::Class
            && request.recipient == Recipient::Interface
            && request.index == u16::from(u8::from(self.comm_interface))
    }
}

impl<B: UsbBus> UsbClass<B> for CdcAcmInterface<'_, B> {
    fn get_configuration_descriptors(&self, writer: &mut DescriptorWriter) -> Result<()> {
        writer.iad(
            self.comm_interface,
            2,
            USB_CLASS_CDC,
            CDC_SUBCLASS_ACM,
            CDC_PROTOCOL_NONE,
        )?;

        writer.interface_alt(
            self.comm_interface,
            0,
            USB_CLASS_CDC,
            CDC_SUBCLASS_ACM,
            CDC_PROTOCOL_NONE,
            Some(self.name),
        )?;
        let version = CDC_VERSION.to_le_bytes();
        writer.write(CS_INTERFACE, &[CDC_TYPE_HEADER, version[0], version[1]])?;
        writer.write(
            CS_INTERFACE,
            &[CDC_TYPE_CALL_MANAGEMENT, 0x00, self.data_interface.into()],
        )?;
        writer.write(CS_INTERFACE, &[CDC_TYPE_ACM, ACM_CAPABILITY_LINE_CODING])?;
        writer.write(
            CS_INTERFACE,
            &[
                CDC_TYPE_UNION,
                self.comm_interface.into(),
                self.data_interface.into(),
            ],
        )?;
        writer.endpoint(&self.notif_in)?;

        writer.interface(self.data_interface, USB_CLASS_CDC_DATA, 0x00, 0x00)?;
        writer.endpoint(&self.data_out)?;
        writer.endpoint(&self.data_in)?;
        trace!("wrote serial port descriptors");
        Ok(())
    }

    fn get_string(&self, index: StringIndex, _lang_id: u16) -> Option<&str> {
        if u8::from(index) == u8::from(self.name) {
            descriptor::string(u8::from(index))
        } else {
            None
        }
    }

    fn reset(&mut self) {
        self.line_coding = LineCoding::default();
        self.dtr = false;
        self.rts = false;
    }

    fn control_in(&mut self, transfer: ControlIn<B>) {
        let request = *transfer.request();
        if !self.is_class_request(&request) {
            return;
        }

        match request.request {
            REQ_GET_LINE_CODING => {
                let data = self.line_coding.to_bytes();
                match transfer.accept_with(&data) {
                    Ok(_) => trace!("Sent line coding {:?}", self.line_coding),
                    Err(e) => warn!("Failed to send line coding: {:?}", e),
                }
            }
            _ => {
                trace!(
                    "Rejected serial ctrl_in request: {:X}, value: {:X}, length: {:X}",
                    request.request,
                    request.value,
                    request.length
                );
                transfer.reject().ok();
            }
        }
    }

    fn control_out(&mut self, transfer: ControlOut<B>) {
        let request = *transfer.request();
        if !self.is_class_request(&request) {
            return;
        }

        match request.request {
            REQ_SET_LINE_CODING => match LineCoding::from_bytes(transfer.data()) {
                Some(line_coding) => {
                    self.line_coding = line_coding;
                    info!(
                        "Line coding {} baud, {} data bits",
                        line_coding.data_rate, line_coding.data_bits
                    );
                    transfer.accept().ok();
                }
                None => {
                    warn!("Short line coding, {} bytes", transfer.data().len());
                    transfer.reject().ok();
                }
            },
            REQ_SET_CONTROL_LINE_STATE => {
                self.dtr = request.value & 0x0001 != 0;
                self.rts = request.value & 0x0002 != 0;
                trace!("Control line state dtr: {}, rts: {}", self.dtr, self.rts);
                transfer.accept().ok();
            }
            REQ_SEND_BREAK => {
                trace!("Break for {} ms", request.value);
                transfer.accept().ok();
            }
            _ => {
                trace!(
                    "Rejected serial ctrl_out request: {:X}, value: {:X}, length: {:X}",
                    request.request,
                    request.value,
                    request.length
                );
                transfer.reject().ok();
            }
        }
    }
}
