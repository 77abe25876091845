#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Lossy conversion keeps inputs that are almost text.
    let s = String::from_utf8_lossy(data);
    if let Ok(report) = texlint_core::validate(&s) {
        for diagnostic in &report.diagnostics {
            assert!(diagnostic.start() <= diagnostic.end());
        }
    }
});
