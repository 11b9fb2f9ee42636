use crate::tools::error::{ErrorKind, FluteError, Result};
use quick_xml::de::from_reader;
use serde::{Deserialize, Serialize};

/// XML model of an `<FDT-Instance>` document.
///
/// Optional attributes fall back to session defaults at the
/// `FileDeliveryTable` level, missing `TOI` or `Content-Location` make the
/// whole instance unparseable.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct FdtInstance {
    #[serde(rename = "@xmlns:mbms2007", skip_serializing_if = "Option::is_none")]
    pub xmlns_mbms2007: Option<String>,
    #[serde(rename = "@Expires")]
    pub expires: String,
    #[serde(rename = "@Complete", skip_serializing_if = "Option::is_none")]
    pub complete: Option<bool>,
    #[serde(rename = "@FEC-OTI-FEC-Encoding-ID", skip_serializing_if = "Option::is_none")]
    pub fec_oti_fec_encoding_id: Option<u8>,
    #[serde(
        rename = "@FEC-OTI-Maximum-Source-Block-Length",
        skip_serializing_if = "Option::is_none"
    )]
    pub fec_oti_maximum_source_block_length: Option<u64>,
    #[serde(
        rename = "@FEC-OTI-Encoding-Symbol-Length",
        skip_serializing_if = "Option::is_none"
    )]
    pub fec_oti_encoding_symbol_length: Option<u64>,
    #[serde(
        rename = "@FEC-OTI-Scheme-Specific-Info",
        skip_serializing_if = "Option::is_none"
    )]
    pub fec_oti_scheme_specific_info: Option<String>, // Base64
    #[serde(rename = "File", skip_serializing_if = "Option::is_none")]
    pub file: Option<Vec<FdtFile>>,
}

/// XML model of a `<File>` element.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct FdtFile {
    #[serde(rename = "@TOI")]
    pub toi: String,
    #[serde(rename = "@Content-Location")]
    pub content_location: String,
    #[serde(rename = "@Content-Length", skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,
    #[serde(rename = "@Transfer-Length", skip_serializing_if = "Option::is_none")]
    pub transfer_length: Option<u64>,
    #[serde(rename = "@Content-Type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(rename = "@Content-MD5", skip_serializing_if = "Option::is_none")]
    pub content_md5: Option<String>,
    #[serde(rename = "@FEC-OTI-FEC-Encoding-ID", skip_serializing_if = "Option::is_none")]
    pub fec_oti_fec_encoding_id: Option<u8>,
    #[serde(
        rename = "@FEC-OTI-Maximum-Source-Block-Length",
        skip_serializing_if = "Option::is_none"
    )]
    pub fec_oti_maximum_source_block_length: Option<u64>,
    #[serde(
        rename = "@FEC-OTI-Encoding-Symbol-Length",
        skip_serializing_if = "Option::is_none"
    )]
    pub fec_oti_encoding_symbol_length: Option<u64>,
    #[serde(
        rename = "@FEC-OTI-Scheme-Specific-Info",
        skip_serializing_if = "Option::is_none"
    )]
    pub fec_oti_scheme_specific_info: Option<String>, // Base64
    #[serde(rename = "mbms2007:Cache-Control", skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<CacheControl>,
}

/// `<mbms2007:Cache-Control>` child carrying a per-file expiry.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct CacheControl {
    #[serde(rename = "mbms2007:Expires")]
    pub expires: String,
}

impl FdtInstance {
    pub fn parse(buffer: &[u8]) -> Result<FdtInstance> {
        from_reader(buffer).map_err(|err| FluteError::new(ErrorKind::MalformedFdt, err))
    }

    pub fn serialize_xml(&self) -> Result<String> {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let ser = quick_xml::se::Serializer::with_root(&mut xml, Some("FDT-Instance"))
            .map_err(|err| FluteError::new(ErrorKind::MalformedFdt, err))?;
        self.serialize(ser)
            .map_err(|err| FluteError::new(ErrorKind::MalformedFdt, err))?;
        Ok(xml)
    }
}
