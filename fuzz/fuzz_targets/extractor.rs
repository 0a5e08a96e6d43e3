#![no_main]

use libfuzzer_sys::fuzz_target;

use linkdigest::extractor::{ArticleStatus, extract};
use linkdigest::links::scan_urls;

fuzz_target!(|data: &[u8]| {
    // Convert raw bytes to string, handling invalid UTF-8 gracefully
    let text = String::from_utf8_lossy(data);

    // The extractor should never panic regardless of input
    let record = extract(&text, "https://example.com/fuzz");
    if record.status == ArticleStatus::Success {
        assert!(record.word_count > 0);
    }

    for url in scan_urls(&text) {
        assert!(url.to_ascii_lowercase().starts_with("http"));
    }
});
