pub mod raptor;

use crate::tools::error::Result;

/// Black-box FEC decoder for one source block.
pub trait FecDecoder {
    /// Feed one encoding symbol to the decoder
    fn push_symbol(&mut self, encoding_symbol: &[u8], esi: u32);
    /// `true` when the decoder holds enough symbols to attempt a decode
    fn can_decode(&self) -> bool;
    /// Attempt to decode, `true` on success
    fn decode(&mut self) -> bool;
    /// The decoded source block
    fn source_block(&self) -> Result<&[u8]>;
}

impl std::fmt::Debug for dyn FecDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "FecDecoder {{ }}")
    }
}
