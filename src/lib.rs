//! # FLUTE Receiver - File Delivery over Unidirectional Transport
//!
//! Receive-side FLUTE/ALC engine, reassembling files from a stream of UDP
//! multicast packets without the need of a return channel.
//!
//! The crate only consumes raw packet payloads, the datagram source (UDP
//! socket, PCAP replay, ...) is provided by the caller.
//!
//! # RFC
//!
//!| RFC      | Title      | Link       |
//!| ------------- | ------------- | ------------- |
//!| RFC 6726 | FLUTE - File Delivery over Unidirectional Transport | <https://www.rfc-editor.org/rfc/rfc6726.html> |
//!| RFC 5775 | Asynchronous Layered Coding (ALC) Protocol Instantiation | <https://www.rfc-editor.org/rfc/rfc5775.html> |
//!| RFC 5052 | Forward Error Correction (FEC) Building Block | <https://www.rfc-editor.org/rfc/rfc5052> |
//!| RFC 3695 | Compact Forward Error Correction (FEC) Schemes | <https://www.rfc-editor.org/rfc/rfc3695.html> |
//!| RFC 5053 | Raptor Forward Error Correction Scheme | <https://www.rfc-editor.org/rfc/rfc5053.html> |
//!
//! # Example
//!
//!```
//! use flute_rx::receiver::Receiver;
//!
//! // Create a receiver for TSI 1
//! let receiver = Receiver::new(1, None);
//! receiver.register_completion_callback(|file| {
//!     println!("Received {} ({} bytes)",
//!         file.meta().content_location,
//!         file.content().len());
//! });
//!
//! // Push the payload of every received UDP packet
//! // let (n, _src) = udp_socket.recv_from(&mut buf).unwrap();
//! // receiver.push(&buf[..n], SystemTime::now());
//!```

#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![cfg_attr(test, deny(warnings))]

mod common;
mod fec;
mod tools;

pub mod receiver;

///
/// Objects shared between the packet layer and the FDT
///
pub mod core {
    pub use crate::common::lct::Cenc;
    pub use crate::common::oti::FecScheme;
    pub use crate::common::oti::Oti;
    pub use crate::common::oti::Raptor10SchemeSpecific;
}

pub use crate::tools::error;

#[cfg(test)]
mod tests {
    pub fn init() {
        env_logger::builder().is_test(true).try_init().ok();
    }
}
