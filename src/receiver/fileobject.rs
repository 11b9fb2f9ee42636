use super::fdt::FileEntry;
use super::nocode::CompactNoCode;
use super::raptor10::Raptor10;
use super::symbol::EncodingSymbol;
use crate::common::oti::FecScheme;
use crate::tools::error::Result;
use base64::Engine;
use std::time::SystemTime;

#[derive(Debug)]
enum FecAssembler {
    CompactNoCode(CompactNoCode),
    Raptor10(Raptor10),
}

/// A partially-received transfer object.
///
/// Owns a zeroed buffer of `transfer_length` bytes that encoding symbols
/// are copied into. The object reports `complete` once every source symbol
/// was placed and, when a `Content-MD5` is announced and verification is
/// enabled, the buffer digest matches. On an MD5 mismatch the object is
/// reset and keeps accumulating from later retransmissions.
#[derive(Debug)]
pub struct FileObject {
    meta: FileEntry,
    buffer: Vec<u8>,
    complete: bool,
    enable_md5: bool,
    received_at: SystemTime,
    fdt_instance_id: Option<u32>,
    fec: FecAssembler,
}

impl FileObject {
    pub(crate) fn new(meta: FileEntry, enable_md5: bool, now: SystemTime) -> Result<FileObject> {
        log::debug!(
            "Create new File with toi {} ({} bytes)",
            meta.toi,
            meta.fec_oti.transfer_length
        );

        let fec = match meta.fec_oti.fec_encoding_id {
            FecScheme::CompactNoCode => {
                FecAssembler::CompactNoCode(CompactNoCode::new(&meta.fec_oti)?)
            }
            FecScheme::Raptor10 => FecAssembler::Raptor10(Raptor10::new(&meta.fec_oti)?),
        };

        let mut file = FileObject {
            buffer: vec![0; meta.fec_oti.transfer_length as usize],
            meta,
            complete: false,
            enable_md5,
            received_at: now,
            fdt_instance_id: None,
            fec,
        };

        // a zero-length object has nothing left to receive
        file.evaluate_completion();
        Ok(file)
    }

    /// Place one encoding symbol. Idempotent, a symbol for an already
    /// complete slot or object is ignored.
    pub(crate) fn put_symbol(&mut self, symbol: &EncodingSymbol) -> Result<()> {
        if self.complete {
            return Ok(());
        }

        let placed = match &mut self.fec {
            FecAssembler::CompactNoCode(fec) => fec.put_symbol(&mut self.buffer, symbol)?,
            FecAssembler::Raptor10(fec) => fec.put_symbol(&mut self.buffer, symbol)?,
        };

        if placed {
            self.evaluate_completion();
        }
        Ok(())
    }

    fn evaluate_completion(&mut self) {
        let structural = match &self.fec {
            FecAssembler::CompactNoCode(fec) => fec.is_complete(),
            FecAssembler::Raptor10(fec) => fec.is_complete(),
        };

        if !structural {
            return;
        }

        if self.enable_md5 && !self.check_md5() {
            log::error!(
                "MD5 mismatch for toi {} {:?}, reset and wait for a retransmission",
                self.meta.toi,
                self.meta.content_location
            );
            self.reset();
            return;
        }

        self.complete = true;
    }

    fn check_md5(&self) -> bool {
        let expected = match self.meta.content_md5.as_ref() {
            Some(md5) => md5,
            None => return true,
        };

        let expected = match base64::engine::general_purpose::STANDARD.decode(expected) {
            Ok(digest) => digest,
            Err(_) => {
                log::warn!("Content-MD5 {} is not valid base64, skip check", expected);
                return true;
            }
        };

        let digest = md5::compute(self.content());
        digest.0[..] == expected[..]
    }

    /// Return the file to the empty state: all symbols incomplete, buffer
    /// zeroed, `complete` false.
    pub fn reset(&mut self) {
        match &mut self.fec {
            FecAssembler::CompactNoCode(fec) => fec.reset(),
            FecAssembler::Raptor10(fec) => fec.reset(),
        }
        self.buffer.fill(0);
        self.complete = false;
    }

    /// `true` once the object is fully reassembled and verified
    pub fn complete(&self) -> bool {
        self.complete
    }

    /// The file content, FEC padding excluded
    pub fn content(&self) -> &[u8] {
        let len = (self.meta.content_length as usize).min(self.buffer.len());
        &self.buffer[..len]
    }

    /// The whole transfer object buffer, FEC padding included
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Metadata from the FDT entry this file was created from
    pub fn meta(&self) -> &FileEntry {
        &self.meta
    }

    /// Reception start time
    pub fn received_at(&self) -> SystemTime {
        self.received_at
    }

    /// ID of the FDT instance that announced this file
    pub fn fdt_instance_id(&self) -> Option<u32> {
        self.fdt_instance_id
    }

    pub(crate) fn set_fdt_instance_id(&mut self, id: u32) {
        self.fdt_instance_id = Some(id);
    }
}
