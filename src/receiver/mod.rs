//!
//! FLUTE Receiver to re-construct files from ALC/LCT packets
//!

mod fdt;
mod fileobject;
mod nocode;
mod raptor10;
mod receiver;
mod symbol;

pub use fdt::FileDeliveryTable;
pub use fdt::FileEntry;
pub use fileobject::FileObject;
pub use receiver::Config;
pub use receiver::Receiver;
