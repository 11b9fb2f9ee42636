use crate::tools::error::{ErrorKind, FluteError, Result};

/// Content Encoding
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cenc {
    /// Content is not encoded before transmission
    Null = 0,
    /// Content encoded with ZLIB
    Zlib = 1,
    /// Content encoded with Deflate
    Deflate = 2,
    /// Content encoded with Gzip
    Gzip = 3,
}

#[repr(u8)]
#[derive(Clone, Copy)]
pub enum Ext {
    Fdt = 192,
    Fti = 64,
    Cenc = 193,
}

pub const TOI_FDT: u128 = 0;

/// LCT Header
#[derive(Clone, Debug)]
pub struct LCTHeader {
    /// Total header length in bytes, 32-bit aligned
    pub len: usize,
    /// Congestion Control Information
    pub cci: u128,
    /// Transport Session Identifier
    pub tsi: u64,
    /// Transport Object Identifier
    pub toi: u128,
    /// Codepoint
    pub cp: u8,
    /// Close Object flag
    pub close_object: bool,
    /// Close Session flag
    pub close_session: bool,
    /// Offset of the first header extension
    pub header_ext_offset: u32,
}

impl TryFrom<u8> for Cenc {
    type Error = ();

    fn try_from(v: u8) -> std::result::Result<Self, Self::Error> {
        match v {
            x if x == Cenc::Null as u8 => Ok(Cenc::Null),
            x if x == Cenc::Zlib as u8 => Ok(Cenc::Zlib),
            x if x == Cenc::Deflate as u8 => Ok(Cenc::Deflate),
            x if x == Cenc::Gzip as u8 => Ok(Cenc::Gzip),
            _ => Err(()),
        }
    }
}

/*
 *  https://www.rfc-editor.org/rfc/rfc5651
 *  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 *  |   V   | C |PSI|S| O |H|Res|A|B|   HDR_LEN     | Codepoint (CP)|
 *  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 *  | Congestion Control Information (CCI, length = 32*(C+1) bits)  |
 *  |                          ...                                  |
 *  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 *  |  Transport Session Identifier (TSI, length = 32*S+16*H bits)  |
 *  |                          ...                                  |
 *  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 *  |   Transport Object Identifier (TOI, length = 32*O+16*H bits)  |
 *  |                          ...                                  |
 *  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 *  |                Header Extensions (if applicable)              |
 *  |                          ...                                  |
 *  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 */
pub fn parse_lct_header(data: &[u8]) -> Result<LCTHeader> {
    let len = data.get(2).map_or_else(
        || {
            Err(FluteError::new(
                ErrorKind::MalformedHeader,
                "Fail to read lct header size",
            ))
        },
        |&v| Ok((v as usize) << 2),
    )?;

    if len > data.len() {
        return Err(FluteError::new(
            ErrorKind::MalformedHeader,
            format!("lct header size is {} whereas pkt size is {}", len, data.len()),
        ));
    }

    let cp = data[3];
    let flags1 = data[0];
    let flags2 = data[1];

    let s = (flags2 >> 7) & 0x1;
    let o = (flags2 >> 5) & 0x3;
    let h = (flags2 >> 4) & 0x1;
    let c = (flags1 >> 2) & 0x3;
    let a = (flags2 >> 1) & 0x1;
    let b = flags2 & 0x1;
    let version = flags1 >> 4;
    if version != 1 {
        return Err(FluteError::new(
            ErrorKind::MalformedHeader,
            format!("LCT version {} is not supported", version),
        ));
    }

    let cci_len = ((c + 1) as u32) << 2;
    let tsi_len = ((s as u32) << 2) + ((h as u32) << 1);
    let toi_len = ((o as u32) << 2) + ((h as u32) << 1);

    let cci_from: usize = 4;
    let cci_to: usize = (4 + cci_len) as usize;
    let tsi_to: usize = cci_to + tsi_len as usize;
    let toi_to: usize = tsi_to + toi_len as usize;
    let header_ext_offset = toi_to as u32;

    if toi_to > data.len() || cci_len > 16 || tsi_len > 8 || toi_len > 16 {
        return Err(FluteError::new(
            ErrorKind::MalformedHeader,
            format!("toi ends at offset {} whereas pkt size is {}", toi_to, data.len()),
        ));
    }

    if header_ext_offset > len as u32 {
        return Err(FluteError::new(
            ErrorKind::MalformedHeader,
            "EXT offset outside LCT header",
        ));
    }

    let mut cci: [u8; 16] = [0; 16];
    let mut tsi: [u8; 8] = [0; 8];
    let mut toi: [u8; 16] = [0; 16];

    cci[(16 - cci_len) as usize..].copy_from_slice(&data[cci_from..cci_to]);
    tsi[(8 - tsi_len) as usize..].copy_from_slice(&data[cci_to..tsi_to]);
    toi[(16 - toi_len) as usize..].copy_from_slice(&data[tsi_to..toi_to]);

    let cci = u128::from_be_bytes(cci);
    let tsi = u64::from_be_bytes(tsi);
    let toi = u128::from_be_bytes(toi);

    Ok(LCTHeader {
        len,
        cci,
        tsi,
        toi,
        cp,
        close_object: b != 0,
        close_session: a != 0,
        header_ext_offset,
    })
}

/// Find an LCT header extension inside the header area.
///
/// Returns the bytes of the extension when found, `None` when the extension
/// is absent, an error when the extension chain is malformed.
pub fn get_ext<'a>(data: &'a [u8], lct: &LCTHeader, ext: u8) -> Result<Option<&'a [u8]>> {
    let mut lct_ext = &data[(lct.header_ext_offset as usize)..lct.len];
    while lct_ext.len() >= 4 {
        let het = lct_ext[0];
        let hel = match het {
            het if het >= 128 => 4_usize,
            _ => (lct_ext[1] as usize) << 2,
        };

        if hel == 0 || hel > lct_ext.len() {
            return Err(FluteError::new(
                ErrorKind::MalformedHeader,
                format!(
                    "LCT EXT size is {}/{} het={} offset={}",
                    hel,
                    lct_ext.len(),
                    het,
                    lct.header_ext_offset
                ),
            ));
        }

        if het == ext {
            return Ok(Some(&lct_ext[..hel]));
        }
        lct_ext = &lct_ext[hel..];
    }

    Ok(None)
}
