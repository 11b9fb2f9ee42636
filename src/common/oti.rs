use crate::tools::error::{ErrorKind, FluteError, Result};
use base64::Engine;

///
/// FEC scheme, from the IANA registry for FEC encoding IDs (RFC 5052).
/// Only the fully-specified schemes used by this receiver are listed,
/// any other value on the wire is rejected.
///
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FecScheme {
    /// Compact No-Code FEC (RFC 3695)
    CompactNoCode = 0,
    /// Raptor (RFC 5053)
    Raptor10 = 1,
}

impl TryFrom<u8> for FecScheme {
    type Error = ();

    fn try_from(v: u8) -> std::result::Result<Self, Self::Error> {
        match v {
            x if x == FecScheme::CompactNoCode as u8 => Ok(FecScheme::CompactNoCode),
            x if x == FecScheme::Raptor10 as u8 => Ok(FecScheme::Raptor10),
            _ => Err(()),
        }
    }
}

///
/// Raptor Scheme Specific parameters
/// <https://www.rfc-editor.org/rfc/rfc5053.html#section-3.2.3>
///
/// 0                   1                   2                   3
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |             Z                 |      N        |       Al      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raptor10SchemeSpecific {
    /// The number of source blocks (Z): 16-bit unsigned integer.
    pub source_blocks_length: u16,
    /// The number of sub-blocks per source block (N): 8-bit unsigned integer.
    pub sub_blocks_length: u8,
    /// A symbol alignment parameter (Al): 8-bit unsigned integer.
    pub symbol_alignment: u8,
}

impl Raptor10SchemeSpecific {
    /// Encode to the 4-byte wire form
    pub fn to_bytes(&self) -> [u8; 4] {
        let z = self.source_blocks_length.to_be_bytes();
        [z[0], z[1], self.sub_blocks_length, self.symbol_alignment]
    }

    /// Decode from the 4-byte wire form
    pub fn from_bytes(info: &[u8]) -> Result<Raptor10SchemeSpecific> {
        if info.len() != 4 {
            return Err(FluteError::new(
                ErrorKind::UnknownScheme,
                "Wrong size of Scheme-Specific-Info",
            ));
        }

        Ok(Raptor10SchemeSpecific {
            source_blocks_length: u16::from_be_bytes(info[0..2].try_into().unwrap()),
            sub_blocks_length: info[2],
            symbol_alignment: info[3],
        })
    }

    /// Encode to the base64 form carried in FDT attributes
    pub fn scheme_specific(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.to_bytes())
    }

    /// Decode from the base64 form carried in FDT attributes
    pub fn decode(fec_oti_scheme_specific_info: &str) -> Result<Raptor10SchemeSpecific> {
        let info = base64::engine::general_purpose::STANDARD
            .decode(fec_oti_scheme_specific_info)
            .map_err(|_| {
                FluteError::new(
                    ErrorKind::UnknownScheme,
                    "Fail to decode base64 specific scheme",
                )
            })?;

        Self::from_bytes(&info)
    }
}

///
/// FEC Object Transmission Information
/// Parameters needed to partition and decode one transfer object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Oti {
    /// FEC scheme used for the object transmission
    pub fec_encoding_id: FecScheme,
    /// Size of the transfer object in bytes, FEC padding included
    pub transfer_length: u64,
    /// Size (in bytes) of an encoding symbol
    pub encoding_symbol_length: u16,
    /// Maximum number of encoding symbols per source block
    pub maximum_source_block_length: u32,
    /// FEC scheme specific parameters, present for Raptor10
    pub scheme_specific: Option<Raptor10SchemeSpecific>,
}

impl Oti {
    /// Creates an `Oti` for the Compact No-Code FEC scheme.
    pub fn new_compact_no_code(
        transfer_length: u64,
        encoding_symbol_length: u16,
        maximum_source_block_length: u16,
    ) -> Oti {
        Oti {
            fec_encoding_id: FecScheme::CompactNoCode,
            transfer_length,
            encoding_symbol_length,
            maximum_source_block_length: maximum_source_block_length as u32,
            scheme_specific: None,
        }
    }

    /// Creates an `Oti` for the Raptor10 FEC scheme.
    ///
    /// # Errors
    /// Returns an error if the encoding symbol length is not a multiple of
    /// the symbol alignment parameter.
    pub fn new_raptor10(
        transfer_length: u64,
        encoding_symbol_length: u16,
        maximum_source_block_length: u16,
        scheme: Raptor10SchemeSpecific,
    ) -> Result<Oti> {
        if scheme.symbol_alignment == 0 {
            return Err(FluteError::new(
                ErrorKind::UnknownScheme,
                "Al must be at least 1",
            ));
        }

        if encoding_symbol_length % scheme.symbol_alignment as u16 != 0 {
            return Err(FluteError::new(
                ErrorKind::UnknownScheme,
                "Encoding symbol length must be a multiple of Al",
            ));
        }

        Ok(Oti {
            fec_encoding_id: FecScheme::Raptor10,
            transfer_length,
            encoding_symbol_length,
            maximum_source_block_length: maximum_source_block_length as u32,
            scheme_specific: Some(scheme),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Raptor10SchemeSpecific;

    #[test]
    pub fn test_scheme_specific_codec() {
        crate::tests::init();
        let scheme = Raptor10SchemeSpecific {
            source_blocks_length: 0x1234,
            sub_blocks_length: 2,
            symbol_alignment: 4,
        };
        let b64 = scheme.scheme_specific();
        let decoded = Raptor10SchemeSpecific::decode(&b64).unwrap();
        assert_eq!(scheme, decoded);
    }

    #[test]
    pub fn test_scheme_specific_wrong_size() {
        crate::tests::init();
        assert!(Raptor10SchemeSpecific::from_bytes(&[1, 2, 3]).is_err());
    }

    #[test]
    pub fn test_raptor10_alignment_check() {
        crate::tests::init();
        let scheme = Raptor10SchemeSpecific {
            source_blocks_length: 1,
            sub_blocks_length: 1,
            symbol_alignment: 4,
        };
        assert!(super::Oti::new_raptor10(1000, 258, 64, scheme.clone()).is_err());
        assert!(super::Oti::new_raptor10(1000, 256, 64, scheme).is_ok());
    }
}
