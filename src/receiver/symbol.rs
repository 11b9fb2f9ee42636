use crate::common::{lct, oti};
use crate::tools::error::{ErrorKind, FluteError, Result};

/// One encoding symbol extracted from an ALC packet payload.
///
/// `data` borrows from the packet buffer, no copy is made until the symbol
/// is placed into a file.
#[derive(Debug, Clone, Copy)]
pub struct EncodingSymbol<'a> {
    /// Source Block Number
    pub sbn: u32,
    /// Encoding Symbol ID
    pub esi: u32,
    /// Symbol bytes
    pub data: &'a [u8],
}

/// Lazy sequence of the encoding symbols packed in one payload.
///
/// The payload starts with the 4-byte FEC payload ID `SBN:16 || ESI:16`,
/// followed by one or more symbols of `encoding_symbol_length` bytes each,
/// the last one possibly shorter. The ESI increments by one per packed
/// symbol.
#[derive(Debug)]
pub struct EncodingSymbols<'a> {
    sbn: u32,
    next_esi: u32,
    remaining: &'a [u8],
    symbol_length: usize,
}

impl<'a> EncodingSymbols<'a> {
    /// Split a packet payload into its encoding symbols.
    pub fn from_payload(
        payload: &'a [u8],
        oti: &oti::Oti,
        cenc: lct::Cenc,
    ) -> Result<EncodingSymbols<'a>> {
        if cenc != lct::Cenc::Null {
            return Err(FluteError::new(
                ErrorKind::UnsupportedEncoding,
                "Only unencoded content is supported",
            ));
        }

        if payload.len() < 4 {
            return Err(FluteError::new(
                ErrorKind::MalformedHeader,
                "Payload too short for a FEC payload ID",
            ));
        }

        if oti.encoding_symbol_length == 0 {
            return Err(FluteError::new(
                ErrorKind::MalformedHeader,
                "Encoding Symbol Length is 0",
            ));
        }

        let sbn = u16::from_be_bytes(payload[0..2].try_into().unwrap()) as u32;
        let esi = u16::from_be_bytes(payload[2..4].try_into().unwrap()) as u32;

        Ok(EncodingSymbols {
            sbn,
            next_esi: esi,
            remaining: &payload[4..],
            symbol_length: oti.encoding_symbol_length as usize,
        })
    }
}

impl<'a> Iterator for EncodingSymbols<'a> {
    type Item = EncodingSymbol<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }

        let len = self.symbol_length.min(self.remaining.len());
        let (data, rest) = self.remaining.split_at(len);
        self.remaining = rest;
        let esi = self.next_esi;
        self.next_esi += 1;

        Some(EncodingSymbol {
            sbn: self.sbn,
            esi,
            data,
        })
    }
}
