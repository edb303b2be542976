//! hg64-sigs: prints digits to bits conversion tables.

use std::io::{self, Write};

fn main() {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = hg64_tools::sigs::write_tables(&mut out).and_then(|_| out.flush()) {
        eprintln!("[sigs] write failed: {}", e);
        std::process::exit(1);
    }
}
