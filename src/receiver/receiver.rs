use super::fdt::{self, FileDeliveryTable, FileEntry};
use super::fileobject::FileObject;
use super::symbol::EncodingSymbols;
use crate::common::{alc, lct};
use crate::tools;
use crate::tools::error::{ErrorKind, FluteError, Result};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

/// Reserved content location of the bootstrap object, never evicted by age.
const BOOTSTRAP_CONTENT_LOCATION: &str = "bootstrap.multipart";

/// Configuration of the FLUTE Receiver
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Config {
    /// When `false`, Content-MD5 verification is skipped and files are
    /// accepted on structural completion only. Default is `true`.
    pub enable_md5_check: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_md5_check: true,
        }
    }
}

type CompletionCallback = Box<dyn FnMut(FileObject) + Send>;

struct State {
    current_fdt_instance: Option<u32>,
    receiving_fdt: bool,
    fdt: Option<FileDeliveryTable>,
    files: HashMap<u128, FileObject>,
    completed: HashSet<u128>,
    completion_cb: Option<CompletionCallback>,
    closed_is_imminent: bool,
}

///
/// FLUTE `Receiver` able to re-construct files from a stream of ALC/LCT
/// packets.
///
/// Packet ingestion is expected to be driven serially by one I/O reactor,
/// the whole mutable state sits behind one mutex so that maintenance calls
/// (`remove_expired_files`, ...) can come from other threads. The
/// completion callback is invoked while that lock is held and must not
/// call back into the `Receiver`.
///
pub struct Receiver {
    tsi: u64,
    config: Config,
    running: AtomicBool,
    state: Mutex<State>,
}

impl std::fmt::Debug for Receiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Receiver")
            .field("tsi", &self.tsi)
            .field("config", &self.config)
            .field("running", &self.running)
            .finish()
    }
}

impl Receiver {
    ///
    /// Create a new FLUTE Receiver
    ///
    /// # Arguments
    ///
    /// * `tsi` - The Transport Session Identifier of this FLUTE session,
    ///   packets carrying any other TSI are discarded.
    /// * `config` - Configuration of the `Receiver`, `None` for defaults.
    ///
    pub fn new(tsi: u64, config: Option<Config>) -> Self {
        Self {
            tsi,
            config: config.unwrap_or_default(),
            running: AtomicBool::new(true),
            state: Mutex::new(State {
                current_fdt_instance: None,
                receiving_fdt: false,
                fdt: None,
                files: HashMap::new(),
                completed: HashSet::new(),
                completion_cb: None,
                closed_is_imminent: false,
            }),
        }
    }

    /// Register the callback invoked exactly once per successfully
    /// received file. Must be installed before packets arrive.
    pub fn register_completion_callback<F>(&self, cb: F)
    where
        F: FnMut(FileObject) + Send + 'static,
    {
        let mut state = self.state.lock().unwrap();
        state.completion_cb = Some(Box::new(cb));
    }

    /// Push the payload of one received UDP packet to the `Receiver`.
    ///
    /// Malformed or unsupported packets are dropped with a warning, the
    /// session continues.
    pub fn push(&self, data: &[u8], now: SystemTime) {
        if !self.running.load(Ordering::Relaxed) {
            return;
        }

        if let Err(e) = self.handle_received_packet(data, now) {
            log::warn!("Failed to decode ALC/FLUTE packet: {}", e);
        }
    }

    /// Cease accepting new packets. In-flight completion dispatch still
    /// runs to completion.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Snapshot of the metadata of all files currently being received.
    pub fn file_list(&self) -> Vec<FileEntry> {
        let state = self.state.lock().unwrap();
        state.files.values().map(|file| file.meta().clone()).collect()
    }

    /// Drop files whose reception started more than `max_age` ago, except
    /// the reserved bootstrap object.
    pub fn remove_expired_files(&self, max_age: Duration, now: SystemTime) {
        let mut state = self.state.lock().unwrap();
        state.files.retain(|_, file| {
            if file.meta().content_location == BOOTSTRAP_CONTENT_LOCATION {
                return true;
            }
            let age = now.duration_since(file.received_at()).unwrap_or_default();
            age <= max_age
        });
    }

    /// Drop every file whose content location matches `cl`.
    pub fn remove_file_with_content_location(&self, cl: &str) {
        let mut state = self.state.lock().unwrap();
        state.files.retain(|_, file| file.meta().content_location != cl);
    }

    fn handle_received_packet(&self, data: &[u8], now: SystemTime) -> Result<()> {
        let alc = alc::parse_alc_pkt(data)?;
        log::trace!(
            "Received ALC pkt cci={} tsi={} toi={}",
            alc.lct.cci,
            alc.lct.tsi,
            alc.lct.toi
        );
        if alc.lct.tsi != self.tsi {
            log::debug!("Discarding packet for unknown TSI {}", alc.lct.tsi);
            return Ok(());
        }

        let mut state = self.state.lock().unwrap();
        let state = &mut *state;

        if alc.lct.close_session && !state.closed_is_imminent {
            log::info!("TSI={} close session is imminent", self.tsi);
            state.closed_is_imminent = true;
        }

        if alc.lct.close_object {
            log::debug!("TOI {} close object is imminent", alc.lct.toi);
        }

        if alc.lct.toi == lct::TOI_FDT {
            if !self.prepare_fdt_reception(state, &alc, now)? {
                return Ok(());
            }
        } else if state.completed.contains(&alc.lct.toi) {
            return Ok(());
        }

        let file = match state.files.get_mut(&alc.lct.toi) {
            Some(file) if !file.complete() => file,
            _ => return Ok(()),
        };

        let oti = file.meta().fec_oti.clone();
        let payload = &alc.data[alc.data_alc_header_offset..];
        let symbols = EncodingSymbols::from_payload(payload, &oti, alc.cenc)?;
        for symbol in symbols {
            log::debug!(
                "received TOI {} SBN {} ESI {}",
                alc.lct.toi,
                symbol.sbn,
                symbol.esi
            );
            // out-of-range symbols are dropped, the rest of the pkt is kept
            file.put_symbol(&symbol).ok();
        }

        if file.complete() {
            self.handle_completed_file(state, alc.lct.toi, now);
        }

        Ok(())
    }

    /// FDT bootstrap path: a packet for TOI 0 carrying an unseen instance
    /// id restarts the FDT object reception.
    ///
    /// Returns `false` when the packet belongs to a stale instance and its
    /// symbols must not be placed.
    fn prepare_fdt_reception(
        &self,
        state: &mut State,
        alc: &alc::AlcPkt,
        now: SystemTime,
    ) -> Result<bool> {
        let fdt_info = alc.fdt_info.as_ref().ok_or_else(|| {
            FluteError::new(
                ErrorKind::MalformedHeader,
                "FDT pkt received without FDT Extension",
            )
        })?;
        let instance_id = fdt_info.fdt_instance_id;

        if state.receiving_fdt && state.current_fdt_instance == Some(instance_id) {
            return Ok(true);
        }

        log::debug!(
            "Bootstrap FDT instance {} (FLUTE version {})",
            instance_id,
            fdt_info.version
        );

        if let Some(fdt) = state.fdt.as_ref() {
            if !fdt::instance_id_is_newer(fdt.instance_id(), instance_id) {
                log::debug!(
                    "Ignore FDT instance {}, accepted instance is {}",
                    instance_id,
                    fdt.instance_id()
                );
                return Ok(false);
            }
        }

        let oti = alc.oti.clone().ok_or_else(|| {
            FluteError::new(ErrorKind::MalformedHeader, "FDT pkt without FEC OTI")
        })?;

        state.files.remove(&lct::TOI_FDT);
        let mut file = FileObject::new(
            FileEntry::for_fdt_object(oti),
            self.config.enable_md5_check,
            now,
        )?;
        file.set_fdt_instance_id(instance_id);
        state.files.insert(lct::TOI_FDT, file);
        state.current_fdt_instance = Some(instance_id);
        state.receiving_fdt = true;
        Ok(true)
    }

    fn handle_completed_file(&self, state: &mut State, toi: u128, now: SystemTime) {
        let file = match state.files.remove(&toi) {
            Some(file) => file,
            None => return,
        };

        if toi != lct::TOI_FDT {
            log::debug!("File with TOI {} completed", toi);
            state.completed.insert(toi);
            if let Some(cb) = state.completion_cb.as_mut() {
                cb(file);
            }
            return;
        }

        state.receiving_fdt = false;
        let instance_id = file.fdt_instance_id().unwrap_or_default();
        match FileDeliveryTable::parse(instance_id, file.buffer()) {
            Ok(fdt) => {
                let expiration: chrono::DateTime<chrono::Utc> =
                    tools::ntp_seconds_to_system_time(fdt.expires()).into();
                log::debug!(
                    "Received FDT instance {}, expires {}",
                    instance_id,
                    expiration.to_rfc3339()
                );

                let now_ntp = tools::system_time_to_ntp_seconds(now).unwrap_or_default();
                if fdt.expires() < now_ntp {
                    log::warn!(
                        "FDT instance {} has been received but is already expired",
                        instance_id
                    );
                }

                self.reconcile_fdt(state, &fdt, now);
                state.fdt = Some(fdt);
            }
            Err(e) => {
                // keep the previous FDT, the slot is free for the next
                // retransmission of this instance
                log::warn!("Discard FDT instance {}: {}", instance_id, e);
                state.current_fdt_instance = None;
            }
        }
    }

    /// Align the reception list with a newly accepted FDT instance.
    fn reconcile_fdt(&self, state: &mut State, fdt: &FileDeliveryTable, now: SystemTime) {
        let mut completed_at_allocation = Vec::new();

        for entry in fdt.file_entries() {
            if entry.toi == lct::TOI_FDT
                || state.completed.contains(&entry.toi)
                || state.files.contains_key(&entry.toi)
            {
                continue;
            }

            log::info!(
                "Starting reception for file with TOI {}: {} ({:?})",
                entry.toi,
                entry.content_location,
                entry.content_type
            );
            match FileObject::new(entry.clone(), self.config.enable_md5_check, now) {
                Ok(mut file) => {
                    file.set_fdt_instance_id(fdt.instance_id());
                    if file.complete() {
                        completed_at_allocation.push(entry.toi);
                    }
                    state.files.insert(entry.toi, file);
                }
                Err(e) => {
                    log::warn!("Fail to allocate file for TOI {}: {}", entry.toi, e)
                }
            }
        }

        // a TOI no longer announced will see no more packets
        let evicted: Vec<u128> = state
            .files
            .keys()
            .filter(|toi| fdt.get_file(**toi).is_none())
            .copied()
            .collect();
        for toi in evicted {
            log::info!("File with TOI {} is no longer in the FDT", toi);
            state.files.remove(&toi);
        }

        for toi in completed_at_allocation {
            self.handle_completed_file(state, toi, now);
        }
    }
}
