//! USB identity, endpoint layout and string table of the test device

pub const VENDOR_ID: u16 = 0xCAFE;
pub const PRODUCT_ID: u16 = 0x0007;
pub const DEVICE_RELEASE: u16 = 0x0100; //1.00 in BCD

pub const EP0_PACKET_SIZE: u8 = 64;

pub const USB_CLASS_VENDOR_SPECIFIC: u8 = 0xFF;

pub const USB_CLASS_CDC: u8 = 0x02;
pub const USB_CLASS_CDC_DATA: u8 = 0x0A;
pub const CDC_SUBCLASS_ACM: u8 = 0x02;
pub const CDC_PROTOCOL_NONE: u8 = 0x00;

pub const VENDOR_INTERFACE: u8 = 0;
pub const CDC_COMM_INTERFACE: u8 = 1;
pub const CDC_DATA_INTERFACE: u8 = 2;

pub const EP_ADDR_CDC_NOTIF: u8 = 0x81;
pub const EP_ADDR_CDC_OUT: u8 = 0x02;
pub const EP_ADDR_CDC_IN: u8 = 0x82;
pub const EP_ADDR_ADC: u8 = 0x83;
pub const EP_ADDR_CMD_OUT: u8 = 0x04;
pub const EP_ADDR_CMD_IN: u8 = 0x84;

pub const ADC_PACKET_SIZE: u16 = 5;
pub const ADC_POLL_INTERVAL: u8 = 1;
pub const CMD_PACKET_SIZE: u16 = 32;
pub const CDC_PACKET_SIZE: u16 = 64;
pub const CDC_NOTIF_PACKET_SIZE: u16 = 8;
pub const CDC_NOTIF_POLL_INTERVAL: u8 = 16;

pub const INTERFACE_DESCRIPTOR_LEN: usize = 9;
pub const ENDPOINT_DESCRIPTOR_LEN: usize = 7;

/// Size of the vendor interface's descriptor block: the interface and its three endpoints
pub const VENDOR_DESCRIPTOR_LEN: usize = INTERFACE_DESCRIPTOR_LEN + 3 * ENDPOINT_DESCRIPTOR_LEN;

/// Size of the serial port's descriptor block: association, both interfaces, the four class
/// specific descriptors and three endpoints
pub const CDC_DESCRIPTOR_LEN: usize =
    8 + 2 * INTERFACE_DESCRIPTOR_LEN + 5 + 5 + 4 + 5 + 3 * ENDPOINT_DESCRIPTOR_LEN;

pub const LANGUAGE_ID_EN_US: u16 = 0x0409;

pub const MANUFACTURER: &str = "Pololu Corporation";
pub const PRODUCT: &str = "USB Test Device A";
pub const SERIAL_NUMBER: &str = "123456";
pub const INTERFACE0_NAME: &str = "USB Test Device A Interface 0";
pub const INTERFACE1_NAME: &str = "USB Test Device A Interface 1";
pub const PORT_NAME: &str = "USB Test Device A Port";

pub const STRING_INDEX_MANUFACTURER: u8 = 1;
pub const STRING_INDEX_PRODUCT: u8 = 2;
pub const STRING_INDEX_SERIAL: u8 = 3;
pub const STRING_INDEX_INTERFACE0: u8 = 4;
pub const STRING_INDEX_INTERFACE1: u8 = 5;
pub const STRING_INDEX_PORT: u8 = 6;

/// Fixed string table, index 0 is the language list and has no text
const STRINGS: [Option<&str>; 7] = [
    None,
    Some(MANUFACTURER),
    Some(PRODUCT),
    Some(SERIAL_NUMBER),
    Some(INTERFACE0_NAME),
    Some(INTERFACE1_NAME),
    Some(PORT_NAME),
];

/// Text of string descriptor `index`, `None` for index 0 and past the end of the table
#[must_use]
pub fn string(index: u8) -> Option<&'static str> {
    STRINGS.get(usize::from(index)).copied().flatten()
}

/// Number of entries in the string table including the language list
#[must_use]
pub const fn string_count() -> usize {
    STRINGS.len()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn string_table_lookup() {
        assert_eq!(string(0), None);
        assert_eq!(string(STRING_INDEX_MANUFACTURER), Some("Pololu Corporation"));
        assert_eq!(string(STRING_INDEX_PRODUCT), Some("USB Test Device A"));
        assert_eq!(string(STRING_INDEX_SERIAL), Some("123456"));
        assert_eq!(string(STRING_INDEX_INTERFACE0), Some(INTERFACE0_NAME));
        assert_eq!(string(STRING_INDEX_INTERFACE1), Some(INTERFACE1_NAME));
        assert_eq!(string(STRING_INDEX_PORT), Some("USB Test Device A Port"));
    }

    #[test]
    fn string_past_end_is_none() {
        assert_eq!(string_count(), 7);
        assert_eq!(string(7), None);
        assert_eq!(string(u8::MAX), None);
    }

    #[test]
    fn endpoint_directions() {
        for addr in [EP_ADDR_CDC_NOTIF, EP_ADDR_CDC_IN, EP_ADDR_ADC, EP_ADDR_CMD_IN] {
            assert_eq!(addr & 0x80, 0x80, "{:#04x} should be IN", addr);
        }
        for addr in [EP_ADDR_CDC_OUT, EP_ADDR_CMD_OUT] {
            assert_eq!(addr & 0x80, 0, "{:#04x} should be OUT", addr);
        }
        assert_eq!(VENDOR_DESCRIPTOR_LEN, 30);
        assert_eq!(CDC_DESCRIPTOR_LEN, 66);
    }
}
