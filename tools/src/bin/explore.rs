//! hg64-explore: dumps the bucket layout for a precision as csv.

use hg64::{Distribution, Histogram};
use hg64_tools::config::ExploreConfig;
use hg64_tools::explore::{dump_csv, write_summary};
use std::env;
use std::io::{self, BufWriter, Write};

fn usage(prog: &str) -> ! {
    eprintln!(
        "explore bucketization in hg64 for given number of significant bits, \
         and optional range of expected values"
    );
    eprintln!("usage: {} sigbits [min] [max]", prog);
    std::process::exit(1);
}

fn main() {
    hg64_tools::init_logging();

    let args: Vec<String> = env::args().collect();
    let prog = args.first().map_or("hg64-explore", String::as_str);
    if args.len() > 4 {
        usage(prog);
    }

    let config = match ExploreConfig::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[explore] {}", e);
            usage(prog);
        }
    };

    let hist = match Histogram::new(config.sigbits) {
        Ok(hist) => hist,
        Err(e) => {
            eprintln!("[explore] {}", e);
            std::process::exit(1);
        }
    };
    log::debug!("exploring {} keys", hist.codec().keys());

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let result = dump_csv(&mut out, &hist, config.min, config.max).and_then(|summary| {
        write_summary(&mut out, config.sigbits, config.min, config.max, &summary)?;
        out.flush()
    });
    if let Err(e) = result {
        eprintln!("[explore] write failed: {}", e);
        std::process::exit(1);
    }
}
