//! The test device prelude.
//!
//! Alleviates imports of the types needed to set up buffered stdio and the USB classes:
//!
//! ```
//! # #![allow(unused_imports)]
//! use usb_test_device::prelude::*;
//! ```

pub use crate::cdc::{CdcAcmInterface, LineCoding};
pub use crate::logger::UartLogger;
pub use crate::stdio_uart_buf::{StdioDriver, StdioUartBuf, DEFAULT_TX_CAPACITY};
pub use crate::tx_ring::TxRing;
pub use crate::uart::{UartConfig, UartPort};
pub use crate::vendor::VendorInterface;
pub use crate::StdioError;
