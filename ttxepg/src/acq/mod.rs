//! Acquisition core: decodes raw teletext lines into page/CNI/time state
//! for one tuned channel.

pub mod assembler;
pub mod cni_state;
pub mod header_tracker;

pub use assembler::{Assembler, P830Raw, PacketRecord, Stats};
pub use cni_state::{CniSource, CniState};
pub use header_tracker::HeaderTracker;
