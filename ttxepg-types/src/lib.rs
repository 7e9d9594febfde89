//! Wire-level types for the teletext EPG acquisition core: the Hamming-8/4
//! and odd-parity codec, page-number and PIL value types, and the static
//! CNI/VPS/PDC cross-reference tables.
//!
//! ```
//! use ttxepg_types::codec::{unham84_byte, unparity};
//! use ttxepg_types::page::PageNumber;
//!
//! assert_eq!(unparity(0x01), Some(0x01));
//! assert_eq!(PageNumber::new(1, 0, 1).0, 0x101);
//! ```

pub mod cni;
pub mod codec;
pub mod error;
pub mod page;

pub use error::ParseResultCode;
pub use page::{PageControl, PageNumber, Pil};
