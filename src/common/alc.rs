use super::{lct, oti};
use crate::tools::error::{ErrorKind, FluteError, Result};

/// ALC Packet
///
/// Zero-copy view over one ALC/LCT datagram. Views are only valid while the
/// input buffer lives.
#[derive(Debug)]
pub struct AlcPkt<'a> {
    /// LCT header
    pub lct: lct::LCTHeader,
    /// FEC Object Transmission Information carried in EXT_FTI
    pub oti: Option<oti::Oti>,
    /// Content encoding carried in EXT_CENC, null when absent
    pub cenc: lct::Cenc,
    /// EXT_FDT info, present on FDT packets
    pub fdt_info: Option<ExtFDT>,
    /// Raw packet
    pub data: &'a [u8],
    /// Offset to the FEC payload ID and the encoding symbols behind it
    pub data_alc_header_offset: usize,
}

/// EXT_FDT header extension content
#[derive(Debug, Clone)]
pub struct ExtFDT {
    /// FLUTE version
    pub version: u32,
    /// FDT Instance ID
    pub fdt_instance_id: u32,
}

/// Size of the FEC payload ID block for the supported schemes,
/// `SBN:16 || ESI:16`.
pub const FEC_PAYLOAD_ID_LENGTH: usize = 4;

/// Parse a buffer into an `AlcPkt`
pub fn parse_alc_pkt(data: &[u8]) -> Result<AlcPkt<'_>> {
    let lct_header = lct::parse_lct_header(data)?;

    let fec: oti::FecScheme = lct_header.cp.try_into().map_err(|_| {
        FluteError::new(
            ErrorKind::UnknownScheme,
            format!("Codepoint {} not supported", lct_header.cp),
        )
    })?;

    if FEC_PAYLOAD_ID_LENGTH + lct_header.len > data.len() {
        return Err(FluteError::new(
            ErrorKind::MalformedHeader,
            "Wrong size of ALC packet",
        ));
    }

    let oti = parse_fti(data, &lct_header, fec)?;
    let data_alc_header_offset = lct_header.len;

    let cenc = match lct::get_ext(data, &lct_header, lct::Ext::Cenc as u8)? {
        Some(ext) => parse_cenc(ext)?,
        None => lct::Cenc::Null,
    };

    if cenc != lct::Cenc::Null {
        return Err(FluteError::new(
            ErrorKind::UnsupportedEncoding,
            format!("Content encoding {:?} is not supported", cenc),
        ));
    }

    let mut fdt_info: Option<ExtFDT> = None;
    if lct_header.toi == lct::TOI_FDT {
        let fdt = lct::get_ext(data, &lct_header, lct::Ext::Fdt as u8)?;
        fdt_info = match fdt {
            Some(ext) => parse_ext_fdt(ext)?,
            None => None,
        };
    }

    Ok(AlcPkt {
        lct: lct_header,
        oti,
        cenc,
        fdt_info,
        data,
        data_alc_header_offset,
    })
}

fn parse_ext_fdt(ext: &[u8]) -> Result<Option<ExtFDT>> {
    if ext.len() != 4 {
        return Err(FluteError::new(
            ErrorKind::MalformedHeader,
            "Wrong size of FDT Extension",
        ));
    }

    /*
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    |   HET = 192   |   V   |          FDT Instance ID              |
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
     */

    let fdt_bytes = u32::from_be_bytes(ext.try_into().unwrap());
    let version = (fdt_bytes >> 20) & 0xF;
    let fdt_instance_id = fdt_bytes & 0xFFFFF;

    Ok(Some(ExtFDT {
        version,
        fdt_instance_id,
    }))
}

fn parse_cenc(ext: &[u8]) -> Result<lct::Cenc> {
    if ext.len() != 4 {
        return Err(FluteError::new(
            ErrorKind::MalformedHeader,
            "Wrong CENC extension size",
        ));
    }
    ext[1]
        .try_into()
        .map_err(|_| FluteError::new(ErrorKind::UnsupportedEncoding, "Cenc not supported"))
}

fn parse_fti(
    data: &[u8],
    lct_header: &lct::LCTHeader,
    fec: oti::FecScheme,
) -> Result<Option<oti::Oti>> {
    let fti = match lct::get_ext(data, lct_header, lct::Ext::Fti as u8)? {
        Some(fti) => fti,
        None => return Ok(None),
    };

    if fti.len() != 16 {
        return Err(FluteError::new(
            ErrorKind::MalformedHeader,
            "Wrong FTI extension size",
        ));
    }

    match fec {
        oti::FecScheme::CompactNoCode => parse_fti_no_code(fti).map(Some),
        oti::FecScheme::Raptor10 => parse_fti_raptor10(fti).map(Some),
    }
}

/*
+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
|   HET = 64    |   HEL = 4     |                               |
+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+                               +
|                      Transfer Length                          |
+                               +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
|                               |           Reserved            |
+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
|    Encoding Symbol Length     | Max. Source Block Length (MSB)|
+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
| Max. Source Block Length (LSB)|
+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
*/
fn parse_fti_no_code(fti: &[u8]) -> Result<oti::Oti> {
    let transfer_length = u64::from_be_bytes(fti[2..10].try_into().unwrap()) >> 16;
    let encoding_symbol_length = u16::from_be_bytes(fti[10..12].try_into().unwrap());
    let maximum_source_block_length = u32::from_be_bytes(fti[12..16].try_into().unwrap());

    Ok(oti::Oti {
        fec_encoding_id: oti::FecScheme::CompactNoCode,
        transfer_length,
        encoding_symbol_length,
        maximum_source_block_length,
        scheme_specific: None,
    })
}

/*
+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
|   HET = 64    |   HEL = 4     |                               |
+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+                               +
|                   Transfer Length (F)                         |
+               +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
|               |    Reserved   |           Symbol Size (T)     |
+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
|             Z                 |      N        |       Al      |
+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
*/
fn parse_fti_raptor10(fti: &[u8]) -> Result<oti::Oti> {
    let transfer_length = u64::from_be_bytes(fti[2..10].try_into().unwrap()) >> 24;
    let symbol_size = u16::from_be_bytes(fti[8..10].try_into().unwrap());
    let z = u16::from_be_bytes(fti[10..12].try_into().unwrap());
    let n = fti[12];
    let al = fti[13];

    if z == 0 {
        return Err(FluteError::new(ErrorKind::MalformedHeader, "Z is null"));
    }

    if n == 0 {
        return Err(FluteError::new(ErrorKind::MalformedHeader, "N is null"));
    }

    if al == 0 {
        return Err(FluteError::new(
            ErrorKind::MalformedHeader,
            "Al must be at least 1",
        ));
    }

    if symbol_size % al as u16 != 0 {
        return Err(FluteError::new(
            ErrorKind::MalformedHeader,
            "Symbol size is not properly aligned",
        ));
    }

    let block_size = num_integer::div_ceil(transfer_length, z as u64);
    let maximum_source_block_length = num_integer::div_ceil(block_size, symbol_size as u64);

    Ok(oti::Oti {
        fec_encoding_id: oti::FecScheme::Raptor10,
        transfer_length,
        encoding_symbol_length: symbol_size,
        maximum_source_block_length: maximum_source_block_length as u32,
        scheme_specific: Some(oti::Raptor10SchemeSpecific {
            source_blocks_length: z,
            sub_blocks_length: n,
            symbol_alignment: al,
        }),
    })
}
