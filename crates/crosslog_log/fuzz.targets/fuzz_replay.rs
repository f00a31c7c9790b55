#![no_main]
use crosslog_log::{LogContext, MemEntryStore};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary stored entries must be rejected with an error, never a panic
    if let Ok(store) = MemEntryStore::from_bytes(data) {
        let _ = LogContext::replay(&store);
    }
});
