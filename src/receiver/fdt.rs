use crate::common::fdtinstance::{CacheControl, FdtFile, FdtInstance};
use crate::common::oti::{FecScheme, Oti, Raptor10SchemeSpecific};
use crate::tools::error::{ErrorKind, FluteError, Result};

/// Metadata of one file announced in the File Delivery Table.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    /// Transport Object Identifier, unique within the session
    pub toi: u128,
    /// Content-Location URI
    pub content_location: String,
    /// Size of the file content in bytes
    pub content_length: u64,
    /// Base64 MD5 of the file content, when announced
    pub content_md5: Option<String>,
    /// MIME type, when announced
    pub content_type: Option<String>,
    /// Expiry in seconds since the NTP epoch
    pub expires: u64,
    /// FEC parameters of the transfer object
    pub fec_oti: Oti,
}

impl FileEntry {
    /// Entry synthesised for the FDT object itself (TOI 0) during
    /// bootstrap, before any FDT is known.
    pub(crate) fn for_fdt_object(fec_oti: Oti) -> FileEntry {
        FileEntry {
            toi: 0,
            content_location: String::new(),
            content_length: fec_oti.transfer_length,
            content_md5: None,
            content_type: None,
            expires: 0,
            fec_oti,
        }
    }
}

/// Session default FEC attributes of an FDT instance, kept verbatim so a
/// serialised table parses back to an equal one.
#[derive(Debug, Clone, PartialEq, Default)]
struct SessionDefaults {
    fec_encoding_id: Option<u8>,
    maximum_source_block_length: Option<u64>,
    encoding_symbol_length: Option<u64>,
    scheme_specific_info: Option<String>,
}

/// One parsed File Delivery Table instance.
#[derive(Debug, Clone, PartialEq)]
pub struct FileDeliveryTable {
    instance_id: u32,
    expires: u64,
    defaults: SessionDefaults,
    file_entries: Vec<FileEntry>,
}

/// Compare FDT instance ids in the 16-bit forward window: `candidate` is
/// newer when it is ahead of `current` by less than 0x8000, modulo 2^16.
pub fn instance_id_is_newer(current: u32, candidate: u32) -> bool {
    let delta = (candidate as u16).wrapping_sub(current as u16);
    delta != 0 && delta < 0x8000
}

const MBMS2007_XMLNS: &str = "urn:3GPP:metadata:2007:MBMS:FLUTE:FDT";

impl FileDeliveryTable {
    /// Parse the XML payload of a completed TOI 0 object.
    ///
    /// Missing `TOI` or `Content-Location` discards the whole instance,
    /// a file with an unsupported FEC scheme is skipped on its own.
    pub fn parse(instance_id: u32, buffer: &[u8]) -> Result<FileDeliveryTable> {
        let instance = FdtInstance::parse(buffer)?;

        if let Some(xmlns) = instance.xmlns_mbms2007.as_deref() {
            if xmlns != MBMS2007_XMLNS {
                log::debug!("Unexpected mbms2007 namespace {}", xmlns);
            }
        }

        if instance.complete.unwrap_or(false) {
            log::debug!("FDT instance {} announces a complete session", instance_id);
        }

        let expires = instance.expires.parse::<u64>().map_err(|_| {
            FluteError::new(
                ErrorKind::MalformedFdt,
                format!("Invalid Expires value {}", instance.expires),
            )
        })?;

        let defaults = SessionDefaults {
            fec_encoding_id: instance.fec_oti_fec_encoding_id,
            maximum_source_block_length: instance.fec_oti_maximum_source_block_length,
            encoding_symbol_length: instance.fec_oti_encoding_symbol_length,
            scheme_specific_info: instance.fec_oti_scheme_specific_info.clone(),
        };

        let mut file_entries = Vec::new();
        for file in instance.file.iter().flatten() {
            let toi = file.toi.parse::<u128>().map_err(|_| {
                FluteError::new(
                    ErrorKind::MalformedFdt,
                    format!("Invalid TOI value {}", file.toi),
                )
            })?;

            let fec_oti = match file_oti(file, &defaults) {
                Ok(fec_oti) => fec_oti,
                Err(e) => {
                    log::warn!(
                        "Skip file {} ({}): {}",
                        toi,
                        file.content_location,
                        e
                    );
                    continue;
                }
            };

            let expires = match file.cache_control.as_ref() {
                Some(cc) => cc.expires.parse::<u64>().unwrap_or_else(|_| {
                    log::warn!("Invalid Cache-Control expiry {}", cc.expires);
                    expires
                }),
                None => expires,
            };

            file_entries.push(FileEntry {
                toi,
                content_location: file.content_location.clone(),
                content_length: file.content_length.unwrap_or_default(),
                content_md5: file.content_md5.clone(),
                content_type: file.content_type.clone(),
                expires,
                fec_oti,
            });
        }

        Ok(FileDeliveryTable {
            instance_id,
            expires,
            defaults,
            file_entries,
        })
    }

    /// FDT instance ID this table was received with
    pub fn instance_id(&self) -> u32 {
        self.instance_id
    }

    /// Session-level expiry in seconds since the NTP epoch
    pub fn expires(&self) -> u64 {
        self.expires
    }

    /// Files announced by this instance
    pub fn file_entries(&self) -> &[FileEntry] {
        &self.file_entries
    }

    /// Find the entry announcing `toi`
    pub fn get_file(&self, toi: u128) -> Option<&FileEntry> {
        self.file_entries.iter().find(|entry| entry.toi == toi)
    }

    /// Serialize back to an `<FDT-Instance>` XML document.
    pub fn to_xml(&self) -> Result<String> {
        let instance = FdtInstance {
            xmlns_mbms2007: Some(MBMS2007_XMLNS.to_owned()),
            expires: self.expires.to_string(),
            complete: None,
            fec_oti_fec_encoding_id: self.defaults.fec_encoding_id,
            fec_oti_maximum_source_block_length: self.defaults.maximum_source_block_length,
            fec_oti_encoding_symbol_length: self.defaults.encoding_symbol_length,
            fec_oti_scheme_specific_info: self.defaults.scheme_specific_info.clone(),
            file: Some(
                self.file_entries
                    .iter()
                    .map(|entry| FdtFile {
                        toi: entry.toi.to_string(),
                        content_location: entry.content_location.clone(),
                        content_length: Some(entry.content_length),
                        transfer_length: Some(entry.fec_oti.transfer_length),
                        content_type: entry.content_type.clone(),
                        content_md5: entry.content_md5.clone(),
                        fec_oti_fec_encoding_id: Some(entry.fec_oti.fec_encoding_id as u8),
                        fec_oti_maximum_source_block_length: Some(
                            entry.fec_oti.maximum_source_block_length as u64,
                        ),
                        fec_oti_encoding_symbol_length: Some(
                            entry.fec_oti.encoding_symbol_length as u64,
                        ),
                        fec_oti_scheme_specific_info: entry
                            .fec_oti
                            .scheme_specific
                            .as_ref()
                            .map(|scheme| scheme.scheme_specific()),
                        cache_control: Some(CacheControl {
                            expires: entry.expires.to_string(),
                        }),
                    })
                    .collect(),
            ),
        };

        instance.serialize_xml()
    }
}

/// Resolve the OTI of one `<File>` element, per-file attributes overriding
/// the session defaults attribute by attribute.
fn file_oti(file: &FdtFile, defaults: &SessionDefaults) -> Result<Oti> {
    let encoding_id = file
        .fec_oti_fec_encoding_id
        .or(defaults.fec_encoding_id)
        .unwrap_or(FecScheme::CompactNoCode as u8);

    let scheme: FecScheme = encoding_id.try_into().map_err(|_| {
        FluteError::new(
            ErrorKind::UnknownScheme,
            format!("FEC encoding ID {} not supported", encoding_id),
        )
    })?;

    let maximum_source_block_length = file
        .fec_oti_maximum_source_block_length
        .or(defaults.maximum_source_block_length)
        .unwrap_or_default() as u32;

    let encoding_symbol_length = file
        .fec_oti_encoding_symbol_length
        .or(defaults.encoding_symbol_length)
        .unwrap_or_default() as u16;

    let transfer_length = file
        .transfer_length
        .or(file.content_length)
        .unwrap_or_default();

    match scheme {
        FecScheme::CompactNoCode => Ok(Oti {
            fec_encoding_id: scheme,
            transfer_length,
            encoding_symbol_length,
            maximum_source_block_length,
            scheme_specific: None,
        }),
        FecScheme::Raptor10 => {
            let info = file
                .fec_oti_scheme_specific_info
                .as_ref()
                .or(defaults.scheme_specific_info.as_ref())
                .ok_or_else(|| {
                    FluteError::new(
                        ErrorKind::UnknownScheme,
                        "Missing scheme specific info for Raptor FEC",
                    )
                })?;

            let scheme_specific = Raptor10SchemeSpecific::decode(info)?;
            Ok(Oti {
                fec_encoding_id: scheme,
                transfer_length,
                encoding_symbol_length,
                maximum_source_block_length,
                scheme_specific: Some(scheme_specific),
            })
        }
    }
}
