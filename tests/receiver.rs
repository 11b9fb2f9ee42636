mod tests {
    use base64::Engine;
    use flute_rx::receiver::{Config, Receiver};
    use rand::RngCore;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, SystemTime};

    pub fn init() {
        env_logger::builder().is_test(true).try_init().ok();
    }

    const TSI: u64 = 1;
    const EXT_FDT: u8 = 192;
    const EXT_FTI: u8 = 64;

    fn create_buffer(size: usize) -> Vec<u8> {
        let mut buffer = vec![0u8; size];
        rand::thread_rng().fill_bytes(&mut buffer);
        buffer
    }

    fn md5_base64(data: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(md5::compute(data).0)
    }

    /// ALC packet with a 32-bit TSI and 32-bit TOI (S=1, O=1, H=0)
    fn build_pkt(
        tsi: u32,
        toi: u32,
        cp: u8,
        exts: &[Vec<u8>],
        sbn: u16,
        esi: u16,
        payload: &[u8],
    ) -> Vec<u8> {
        let ext_words: usize = exts.iter().map(|e| e.len() / 4).sum();
        let hdr_len = 4 + ext_words;
        let mut data = vec![0x10, 0xA0, hdr_len as u8, cp];
        data.extend(0u32.to_be_bytes()); // CCI
        data.extend(tsi.to_be_bytes());
        data.extend(toi.to_be_bytes());
        for ext in exts {
            data.extend(ext);
        }
        data.extend(sbn.to_be_bytes());
        data.extend(esi.to_be_bytes());
        data.extend(payload);
        data
    }

    fn ext_fdt(instance_id: u32) -> Vec<u8> {
        ((EXT_FDT as u32) << 24 | 2 << 20 | instance_id)
            .to_be_bytes()
            .to_vec()
    }

    fn ext_fti_no_code(transfer_length: u64, esl: u16, msbl: u32) -> Vec<u8> {
        let mut ext = Vec::new();
        ext.extend(((EXT_FTI as u16) << 8 | 4).to_be_bytes());
        ext.extend((transfer_length << 16).to_be_bytes());
        ext.extend(esl.to_be_bytes());
        ext.extend(msbl.to_be_bytes());
        ext
    }

    fn ext_fti_raptor(transfer_length: u64, esl: u16, z: u16, n: u8, al: u8) -> Vec<u8> {
        let mut ext = Vec::new();
        ext.extend(((EXT_FTI as u16) << 8 | 4).to_be_bytes());
        ext.extend(((transfer_length << 24) | esl as u64).to_be_bytes());
        ext.extend(z.to_be_bytes());
        ext.push(n);
        ext.push(al);
        ext.extend(0u16.to_be_bytes());
        ext
    }

    /// The FDT object is sent as one packet carrying all its symbols
    fn fdt_pkt(instance_id: u32, xml: &str) -> Vec<u8> {
        let fti = ext_fti_no_code(xml.len() as u64, 512, 64);
        build_pkt(
            TSI as u32,
            0,
            0,
            &[ext_fdt(instance_id), fti],
            0,
            0,
            xml.as_bytes(),
        )
    }

    fn fdt_xml_no_code(files: &[(u32, &str, &[u8])], esl: u16) -> String {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <FDT-Instance xmlns:mbms2007=\"urn:3GPP:metadata:2007:MBMS:FLUTE:FDT\" \
             Expires=\"4133980800\" FEC-OTI-FEC-Encoding-ID=\"0\" \
             FEC-OTI-Maximum-Source-Block-Length=\"64\" \
             FEC-OTI-Encoding-Symbol-Length=\"",
        );
        xml.push_str(&esl.to_string());
        xml.push_str("\">\n");
        for (toi, location, content) in files {
            xml.push_str(&format!(
                "<File TOI=\"{}\" Content-Location=\"{}\" Content-Length=\"{}\" Content-MD5=\"{}\"/>\n",
                toi,
                location,
                content.len(),
                md5_base64(content)
            ));
        }
        xml.push_str("</FDT-Instance>");
        xml
    }

    fn symbol_pkts(toi: u32, content: &[u8], esl: usize) -> Vec<Vec<u8>> {
        content
            .chunks(esl)
            .enumerate()
            .map(|(esi, chunk)| build_pkt(TSI as u32, toi, 0, &[], 0, esi as u16, chunk))
            .collect()
    }

    type Completions = Arc<Mutex<Vec<(u128, String, Vec<u8>)>>>;

    fn create_receiver(config: Option<Config>) -> (Receiver, Completions) {
        let completions: Completions = Arc::new(Mutex::new(Vec::new()));
        let receiver = Receiver::new(TSI, config);
        let cb_completions = Arc::clone(&completions);
        receiver.register_completion_callback(move |file| {
            cb_completions.lock().unwrap().push((
                file.meta().toi,
                file.meta().content_location.clone(),
                file.content().to_vec(),
            ));
        });
        (receiver, completions)
    }

    #[test]
    pub fn test_no_code_single_block_in_order() {
        init();
        let content = create_buffer(2048);
        let (receiver, completions) = create_receiver(None);
        let now = SystemTime::now();

        let xml = fdt_xml_no_code(&[(1, "file:///a.bin", &content)], 512);
        receiver.push(&fdt_pkt(1, &xml), now);
        assert_eq!(receiver.file_list().len(), 1);

        for pkt in symbol_pkts(1, &content, 512) {
            receiver.push(&pkt, now);
        }

        let completions = completions.lock().unwrap();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].0, 1);
        assert_eq!(completions[0].1, "file:///a.bin");
        assert_eq!(completions[0].2, content);
        assert!(receiver.file_list().is_empty());
    }

    #[test]
    pub fn test_no_code_reorder_and_duplicate() {
        init();
        let content = create_buffer(2048);
        let (receiver, completions) = create_receiver(None);
        let now = SystemTime::now();

        let xml = fdt_xml_no_code(&[(1, "file:///a.bin", &content)], 512);
        receiver.push(&fdt_pkt(1, &xml), now);

        let pkts = symbol_pkts(1, &content, 512);
        for i in [2usize, 0, 3, 2, 1] {
            receiver.push(&pkts[i], now);
        }

        let completions = completions.lock().unwrap();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].2, content);
    }

    #[test]
    pub fn test_no_code_short_last_symbol() {
        init();
        let content = create_buffer(1500);
        let (receiver, completions) = create_receiver(None);
        let now = SystemTime::now();

        let xml = fdt_xml_no_code(&[(1, "file:///a.bin", &content)], 512);
        receiver.push(&fdt_pkt(1, &xml), now);

        // 512 + 512 + 476 bytes
        let pkts = symbol_pkts(1, &content, 512);
        assert_eq!(pkts.len(), 3);
        for pkt in &pkts {
            receiver.push(pkt, now);
        }

        let completions = completions.lock().unwrap();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].2, content);
    }

    #[test]
    pub fn test_replay_is_idempotent() {
        init();
        let content = create_buffer(2048);
        let (receiver, completions) = create_receiver(None);
        let now = SystemTime::now();

        let xml = fdt_xml_no_code(&[(1, "file:///a.bin", &content)], 512);
        let mut sequence = vec![fdt_pkt(1, &xml)];
        sequence.append(&mut symbol_pkts(1, &content, 512));

        for pkt in sequence.iter().chain(sequence.iter()) {
            receiver.push(pkt, now);
        }

        let completions = completions.lock().unwrap();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].2, content);
    }

    #[test]
    pub fn test_fdt_reannouncement_evicts_obsolete_toi() {
        init();
        let content1 = create_buffer(1024);
        let content2 = create_buffer(1024);
        let content3 = create_buffer(1024);
        let (receiver, completions) = create_receiver(None);
        let now = SystemTime::now();

        let xml = fdt_xml_no_code(
            &[(1, "file:///a.bin", &content1), (2, "file:///b.bin", &content2)],
            512,
        );
        receiver.push(&fdt_pkt(1, &xml), now);
        assert_eq!(receiver.file_list().len(), 2);

        for pkt in symbol_pkts(1, &content1, 512) {
            receiver.push(&pkt, now);
        }
        assert_eq!(completions.lock().unwrap().len(), 1);

        // instance 2 no longer lists TOI 2, TOI 3 is new
        let xml = fdt_xml_no_code(
            &[(1, "file:///a.bin", &content1), (3, "file:///c.bin", &content3)],
            512,
        );
        receiver.push(&fdt_pkt(2, &xml), now);

        let list = receiver.file_list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].toi, 3);

        // TOI 2 was evicted, its symbols are dropped
        for pkt in symbol_pkts(2, &content2, 512) {
            receiver.push(&pkt, now);
        }
        assert_eq!(completions.lock().unwrap().len(), 1);

        for pkt in symbol_pkts(3, &content3, 512) {
            receiver.push(&pkt, now);
        }
        let completions = completions.lock().unwrap();
        assert_eq!(completions.len(), 2);
        assert_eq!(completions[1].0, 3);
    }

    #[test]
    pub fn test_older_fdt_instance_is_ignored() {
        init();
        let content = create_buffer(1024);
        let (receiver, _completions) = create_receiver(None);
        let now = SystemTime::now();

        let xml = fdt_xml_no_code(&[(1, "file:///a.bin", &content)], 512);
        receiver.push(&fdt_pkt(5, &xml), now);
        assert_eq!(receiver.file_list().len(), 1);

        let xml = fdt_xml_no_code(&[(9, "file:///old.bin", &content)], 512);
        receiver.push(&fdt_pkt(4, &xml), now);

        // the reception list still reflects instance 5
        let list = receiver.file_list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].toi, 1);
    }

    #[test]
    pub fn test_md5_mismatch_triggers_reset() {
        init();
        let content = create_buffer(2048);
        let (receiver, completions) = create_receiver(None);
        let now = SystemTime::now();

        let xml = fdt_xml_no_code(&[(1, "file:///a.bin", &content)], 512);
        receiver.push(&fdt_pkt(1, &xml), now);

        // one bit flipped in the second symbol
        let mut corrupted = content.clone();
        corrupted[600] ^= 0x01;
        for pkt in symbol_pkts(1, &corrupted, 512) {
            receiver.push(&pkt, now);
        }
        assert!(completions.lock().unwrap().is_empty());
        assert_eq!(receiver.file_list().len(), 1);

        // the retransmission completes the same file instance
        for pkt in symbol_pkts(1, &content, 512) {
            receiver.push(&pkt, now);
        }
        let completions = completions.lock().unwrap();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].2, content);
    }

    #[test]
    pub fn test_md5_check_disabled() {
        init();
        let content = create_buffer(2048);
        let config = Config {
            enable_md5_check: false,
        };
        let (receiver, completions) = create_receiver(Some(config));
        let now = SystemTime::now();

        let xml = fdt_xml_no_code(&[(1, "file:///a.bin", &content)], 512);
        receiver.push(&fdt_pkt(1, &xml), now);

        let mut corrupted = content.clone();
        corrupted[600] ^= 0x01;
        for pkt in symbol_pkts(1, &corrupted, 512) {
            receiver.push(&pkt, now);
        }

        // structural completion is enough when the check is disabled
        assert_eq!(completions.lock().unwrap().len(), 1);
    }

    #[test]
    pub fn test_raptor10_with_one_lost_symbol() {
        init();
        let k = 10usize;
        let t = 256usize;
        let content = create_buffer(k * t);
        let (receiver, completions) = create_receiver(None);
        let now = SystemTime::now();

        let scheme_info =
            base64::engine::general_purpose::STANDARD.encode([0u8, 1, 1, 4]); // Z=1 N=1 Al=4
        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <FDT-Instance xmlns:mbms2007=\"urn:3GPP:metadata:2007:MBMS:FLUTE:FDT\" \
             Expires=\"4133980800\">\n\
             <File TOI=\"1\" Content-Location=\"file:///r.bin\" Content-Length=\"{}\" \
             Content-MD5=\"{}\" FEC-OTI-FEC-Encoding-ID=\"1\" \
             FEC-OTI-Maximum-Source-Block-Length=\"{}\" \
             FEC-OTI-Encoding-Symbol-Length=\"{}\" \
             FEC-OTI-Scheme-Specific-Info=\"{}\"/>\n\
             </FDT-Instance>",
            content.len(),
            md5_base64(&content),
            k,
            t,
            scheme_info
        );
        receiver.push(&fdt_pkt(1, &xml), now);
        assert_eq!(receiver.file_list().len(), 1);

        let fti = ext_fti_raptor(content.len() as u64, t as u16, 1, 1, 4);
        let mut encoder = raptor_code::SourceBlockEncoder::new(&content, k).unwrap();
        for esi in 0..(k as u16 + 8) {
            if esi == 3 {
                continue; // lost on the wire
            }
            let symbol = encoder.fountain(esi as u32);
            let pkt = build_pkt(TSI as u32, 1, 1, &[fti.clone()], 0, esi, &symbol);
            receiver.push(&pkt, now);
            if !completions.lock().unwrap().is_empty() {
                break;
            }
        }

        let completions = completions.lock().unwrap();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].2, content);
    }

    #[test]
    pub fn test_tsi_filter() {
        init();
        let content = create_buffer(1024);
        let (receiver, completions) = create_receiver(None);
        let now = SystemTime::now();

        let xml = fdt_xml_no_code(&[(1, "file:///a.bin", &content)], 512);
        let mut pkt = fdt_pkt(1, &xml);
        // rewrite the TSI field of the LCT header
        pkt[8..12].copy_from_slice(&2u32.to_be_bytes());
        receiver.push(&pkt, now);

        assert!(receiver.file_list().is_empty());
        assert!(completions.lock().unwrap().is_empty());
    }

    #[test]
    pub fn test_stop_ceases_reception() {
        init();
        let content = create_buffer(1024);
        let (receiver, completions) = create_receiver(None);
        let now = SystemTime::now();

        let xml = fdt_xml_no_code(&[(1, "file:///a.bin", &content)], 512);
        receiver.push(&fdt_pkt(1, &xml), now);

        receiver.stop();
        for pkt in symbol_pkts(1, &content, 512) {
            receiver.push(&pkt, now);
        }
        assert!(completions.lock().unwrap().is_empty());
    }

    #[test]
    pub fn test_remove_expired_files() {
        init();
        let content = create_buffer(1024);
        let (receiver, _completions) = create_receiver(None);
        let now = SystemTime::now();

        let xml = fdt_xml_no_code(
            &[
                (1, "file:///a.bin", &content),
                (2, "bootstrap.multipart", &content),
            ],
            512,
        );
        receiver.push(&fdt_pkt(1, &xml), now);
        assert_eq!(receiver.file_list().len(), 2);

        let later = now + Duration::from_secs(120);
        receiver.remove_expired_files(Duration::from_secs(60), later);

        // the bootstrap entry is never evicted by age
        let list = receiver.file_list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].content_location, "bootstrap.multipart");

        receiver.remove_file_with_content_location("bootstrap.multipart");
        assert!(receiver.file_list().is_empty());
    }
}
