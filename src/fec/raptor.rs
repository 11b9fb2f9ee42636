use super::FecDecoder;
use crate::tools::error::{ErrorKind, FluteError, Result};

/// Raptor (RFC 5053) source block decoder.
///
/// Wraps the linear-algebra core, the receiver only drives symbol
/// submission and the decode trigger.
pub struct RaptorDecoder {
    source_block_size: usize,
    decoder: raptor_code::SourceBlockDecoder,
    data: Option<Vec<u8>>,
}

impl std::fmt::Debug for RaptorDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RaptorDecoder")
            .field("source_block_size", &self.source_block_size)
            .field("decoded", &self.data.is_some())
            .finish()
    }
}

impl RaptorDecoder {
    pub fn new(nb_source_symbols: usize, source_block_size: usize) -> RaptorDecoder {
        RaptorDecoder {
            decoder: raptor_code::SourceBlockDecoder::new(nb_source_symbols),
            source_block_size,
            data: None,
        }
    }
}

impl FecDecoder for RaptorDecoder {
    fn push_symbol(&mut self, encoding_symbol: &[u8], esi: u32) {
        if self.data.is_some() {
            return;
        }

        self.decoder.push_encoding_symbol(encoding_symbol, esi)
    }

    fn can_decode(&self) -> bool {
        self.decoder.fully_specified()
    }

    fn decode(&mut self) -> bool {
        if self.data.is_some() {
            return true;
        }

        log::debug!("Decode source block length {}", self.source_block_size);
        self.data = self.decoder.decode(self.source_block_size);
        self.data.is_some()
    }

    fn source_block(&self) -> Result<&[u8]> {
        match self.data.as_ref() {
            Some(e) => Ok(e),
            None => Err(FluteError::new(
                ErrorKind::FecDecodeFailed,
                "Block not decoded",
            )),
        }
    }
}
