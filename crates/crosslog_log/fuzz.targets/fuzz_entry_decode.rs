#![no_main]
use crosslog_log::{DecodeEntry, EncodeEntry, Entry, Record};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(entry) = Entry::from_slice(data) else {
        return;
    };
    // Decoding ignores reserved bits, so the re-encoded entry must decode the same
    if let Ok(record) = Record::decode(&entry) {
        assert_eq!(Record::decode(&record.encode()).ok(), Some(record));
    }
});
