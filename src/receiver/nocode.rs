use super::symbol::EncodingSymbol;
use crate::common::{oti, partition};
use crate::tools::error::{ErrorKind, FluteError, Result};

/// A source symbol slot aliasing a span of the file buffer.
#[derive(Debug, Clone)]
struct SymbolSlot {
    offset: usize,
    length: usize,
    complete: bool,
}

#[derive(Debug, Clone)]
struct SourceBlock {
    symbols: Vec<SymbolSlot>,
    complete: bool,
}

/// Compact No-Code reassembly (RFC 3695).
///
/// No actual coding, the ESI is the symbol index within the source block
/// and each slot maps to a contiguous span of the file buffer.
#[derive(Debug)]
pub struct CompactNoCode {
    blocks: Vec<SourceBlock>,
}

impl CompactNoCode {
    /// Build the source block layout for one transfer object (RFC 5052 §9.1).
    pub fn new(oti: &oti::Oti) -> Result<CompactNoCode> {
        let symbol_length = oti.encoding_symbol_length as u64;
        if symbol_length == 0 && oti.transfer_length > 0 {
            return Err(FluteError::new(
                ErrorKind::MalformedFdt,
                "Encoding Symbol Length is 0",
            ));
        }

        let (a_large, a_small, nb_a_large, nb_blocks) = partition::block_partitioning(
            oti.maximum_source_block_length as u64,
            oti.transfer_length,
            symbol_length,
        );

        if nb_blocks == 0 && oti.transfer_length > 0 {
            return Err(FluteError::new(
                ErrorKind::MalformedFdt,
                "Invalid block partitioning",
            ));
        }

        let mut blocks = Vec::with_capacity(nb_blocks as usize);
        let mut offset: usize = 0;
        let mut remaining = oti.transfer_length as usize;

        for sbn in 0..nb_blocks {
            let block_length = match sbn < nb_a_large {
                true => a_large,
                false => a_small,
            };

            let mut symbols = Vec::with_capacity(block_length as usize);
            for _ in 0..block_length {
                let length = remaining.min(oti.encoding_symbol_length as usize);
                symbols.push(SymbolSlot {
                    offset,
                    length,
                    complete: false,
                });
                offset += length;
                remaining -= length;
                if remaining == 0 {
                    break;
                }
            }

            blocks.push(SourceBlock {
                symbols,
                complete: false,
            });
        }

        Ok(CompactNoCode { blocks })
    }

    /// Copy one symbol into its slot of the file buffer.
    ///
    /// Returns `true` when the symbol was placed, `false` when the slot was
    /// already complete.
    pub fn put_symbol(&mut self, buffer: &mut [u8], symbol: &EncodingSymbol) -> Result<bool> {
        let block = self.blocks.get_mut(symbol.sbn as usize).ok_or_else(|| {
            FluteError::new(
                ErrorKind::OutOfRange,
                format!("SBN {} outside partitioning", symbol.sbn),
            )
        })?;

        let slot = block.symbols.get_mut(symbol.esi as usize).ok_or_else(|| {
            FluteError::new(
                ErrorKind::OutOfRange,
                format!("ESI {} outside source block {}", symbol.esi, symbol.sbn),
            )
        })?;

        if slot.complete {
            return Ok(false);
        }

        let len = slot.length.min(symbol.data.len());
        buffer[slot.offset..slot.offset + len].copy_from_slice(&symbol.data[..len]);
        slot.complete = true;

        block.complete = block.symbols.iter().all(|symbol| symbol.complete);
        Ok(true)
    }

    pub fn is_complete(&self) -> bool {
        self.blocks.iter().all(|block| block.complete)
    }

    /// Return all slots to the incomplete state.
    pub fn reset(&mut self) {
        for block in &mut self.blocks {
            for symbol in &mut block.symbols {
                symbol.complete = false;
            }
            block.complete = false;
        }
    }
}
