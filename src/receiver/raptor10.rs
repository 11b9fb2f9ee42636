use super::symbol::EncodingSymbol;
use crate::common::{oti, partition};
use crate::fec::raptor::RaptorDecoder;
use crate::fec::FecDecoder;
use crate::tools::error::{ErrorKind, FluteError, Result};
use std::collections::HashSet;

/// Extra symbols beyond K the decoder may consume before a block is
/// declared permanently failed.
const OVERHEAD_BUDGET: usize = 10;

#[derive(Debug)]
struct SourceBlock {
    /// Byte offset of the block within the file buffer
    start: usize,
    /// Number of source symbols
    k: usize,
    decoder: RaptorDecoder,
    /// Distinct ESIs fed to the decoder
    seen: HashSet<u32>,
    symbols_complete: Vec<bool>,
    decoded: bool,
    failed: bool,
}

/// Raptor10 reassembly (RFC 5053).
///
/// Each on-the-wire symbol is the interleaved concatenation of one
/// sub-symbol per sub-block, placement de-interleaves it into the
/// sub-block areas of the file buffer. Decoding is attempted once K
/// distinct symbols were received and retried per extra symbol within the
/// overhead budget.
#[derive(Debug)]
pub struct Raptor10 {
    symbol_length: usize,
    /// Byte size of the sub-symbol of each of the N sub-blocks
    sub_symbol_sizes: Vec<usize>,
    blocks: Vec<SourceBlock>,
    /// (start, k) per block, kept to rebuild the decoders on reset
    layout: Vec<(usize, usize)>,
}

impl Raptor10 {
    /// Build the source block and sub-block layout for one transfer object
    /// (RFC 5053 §5.3).
    pub fn new(oti: &oti::Oti) -> Result<Raptor10> {
        let scheme = oti.scheme_specific.as_ref().ok_or_else(|| {
            FluteError::new(
                ErrorKind::UnknownScheme,
                "Missing scheme specific info for Raptor FEC",
            )
        })?;

        let t = oti.encoding_symbol_length as u32;
        let z = scheme.source_blocks_length as u32;
        let n = scheme.sub_blocks_length as u32;
        let al = scheme.symbol_alignment as u32;

        if t == 0 || z == 0 || n == 0 || al == 0 {
            return Err(FluteError::new(
                ErrorKind::MalformedFdt,
                format!("Invalid Raptor parameters T={} Z={} N={} Al={}", t, z, n, al),
            ));
        }

        if t % al != 0 || n > t / al {
            return Err(FluteError::new(
                ErrorKind::MalformedFdt,
                format!("Sub-blocking does not fit the symbol T={} N={} Al={}", t, n, al),
            ));
        }

        // (TL, TS, NL, NS) = Partition[T/Al, N]
        let (tl, ts, nl, ns) = partition::partition(t / al, n);
        let mut sub_symbol_sizes = Vec::with_capacity(n as usize);
        for _ in 0..nl {
            sub_symbol_sizes.push((tl * al) as usize);
        }
        for _ in 0..ns {
            sub_symbol_sizes.push((ts * al) as usize);
        }

        let mut layout = Vec::new();
        if oti.transfer_length > 0 {
            // (KL, KS, ZL, ZS) = Partition[Kt, Z]
            let kt = num_integer::div_ceil(oti.transfer_length, t as u64) as u32;
            let (kl, ks, zl, _zs) = partition::partition(kt, z);
            if ks == 0 {
                return Err(FluteError::new(
                    ErrorKind::MalformedFdt,
                    format!("Z {} is too large for {} symbols", z, kt),
                ));
            }

            let mut start: usize = 0;
            for sbn in 0..z {
                let k = match sbn < zl {
                    true => kl,
                    false => ks,
                } as usize;
                layout.push((start, k));
                start += k * t as usize;
            }
        }

        let blocks = Self::build_blocks(&layout, t as usize);

        Ok(Raptor10 {
            symbol_length: t as usize,
            sub_symbol_sizes,
            blocks,
            layout,
        })
    }

    fn build_blocks(layout: &[(usize, usize)], symbol_length: usize) -> Vec<SourceBlock> {
        layout
            .iter()
            .map(|&(start, k)| SourceBlock {
                start,
                k,
                decoder: RaptorDecoder::new(k, k * symbol_length),
                seen: HashSet::new(),
                symbols_complete: vec![false; k],
                decoded: false,
                failed: false,
            })
            .collect()
    }

    /// Place one encoding symbol.
    ///
    /// Source symbols are scattered into the sub-block layout right away,
    /// repair symbols only feed the decoder. Returns `true` when the symbol
    /// contributed to the block.
    pub fn put_symbol(&mut self, buffer: &mut [u8], symbol: &EncodingSymbol) -> Result<bool> {
        let sub_symbol_sizes = &self.sub_symbol_sizes;
        let block = self.blocks.get_mut(symbol.sbn as usize).ok_or_else(|| {
            FluteError::new(
                ErrorKind::OutOfRange,
                format!("SBN {} outside partitioning", symbol.sbn),
            )
        })?;

        if block.decoded || block.failed || block.seen.contains(&symbol.esi) {
            return Ok(false);
        }

        let esi = symbol.esi as usize;
        if esi < block.k {
            scatter_symbol(
                sub_symbol_sizes,
                buffer,
                block.start,
                block.k,
                esi,
                symbol.data,
            );
            block.symbols_complete[esi] = true;
        }

        // the decoder works on full symbols, pad the tail if needed
        let mut padded: Vec<u8>;
        let symbol_data = match symbol.data.len() == self.symbol_length {
            true => symbol.data,
            false => {
                padded = vec![0; self.symbol_length];
                padded[..symbol.data.len()].copy_from_slice(symbol.data);
                &padded
            }
        };
        block.decoder.push_symbol(symbol_data, symbol.esi);
        block.seen.insert(symbol.esi);

        if block.seen.len() >= block.k {
            if block.decoder.can_decode() && block.decoder.decode() {
                let source = block.decoder.source_block()?;
                for i in 0..block.k {
                    scatter_symbol(
                        sub_symbol_sizes,
                        buffer,
                        block.start,
                        block.k,
                        i,
                        &source[i * self.symbol_length..(i + 1) * self.symbol_length],
                    );
                }
                for complete in &mut block.symbols_complete {
                    *complete = true;
                }
                block.decoded = true;
            } else if block.seen.len() >= block.k + OVERHEAD_BUDGET {
                block.failed = true;
                let err = FluteError::new(
                    ErrorKind::FecDecodeFailed,
                    format!(
                        "SBN {} not decoded after {} symbols, block abandoned",
                        symbol.sbn,
                        block.seen.len()
                    ),
                );
                return Err(err);
            }
        }

        Ok(true)
    }

    pub fn is_complete(&self) -> bool {
        self.blocks
            .iter()
            .all(|block| block.decoded && block.symbols_complete.iter().all(|c| *c))
    }

    /// Return all blocks to the empty state with fresh decoders.
    pub fn reset(&mut self) {
        self.blocks = Self::build_blocks(&self.layout, self.symbol_length);
    }
}

/// Split one symbol into its N sub-symbols and write each at position
/// `esi` of its sub-block area. Writes past the end of the buffer belong
/// to the FEC padding of the last block and are dropped.
fn scatter_symbol(
    sub_symbol_sizes: &[usize],
    buffer: &mut [u8],
    block_start: usize,
    k: usize,
    esi: usize,
    data: &[u8],
) {
    let mut area = block_start;
    let mut data_offset = 0;
    for &sub_symbol_size in sub_symbol_sizes {
        let target = (area + esi * sub_symbol_size).min(buffer.len());
        let avail = data.len().saturating_sub(data_offset);
        let len = sub_symbol_size
            .min(buffer.len() - target)
            .min(avail);
        if len > 0 {
            buffer[target..target + len].copy_from_slice(&data[data_offset..data_offset + len]);
        }
        data_offset += sub_symbol_size;
        area += k * sub_symbol_size;
    }
}
