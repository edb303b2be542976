//! conversion tables between significant decimal digits and bits.

use hg64::{bits_to_digits, digits_to_bits};
use std::io::{self, Write};

fn table<W: Write>(
    out: &mut W,
    headers: (&str, &str),
    range: std::ops::Range<u32>,
    convert: fn(f64) -> f64,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{:>8}{:>8}{:>8}{:>8}", headers.0, headers.1, "floor", "ceil")?;
    for n in range {
        let exact = convert(n as f64);
        writeln!(
            out,
            "{:>8}{:>8.2}{:>8}{:>8}",
            n,
            exact,
            exact.floor() as u32,
            exact.ceil() as u32
        )?;
    }
    Ok(())
}

/// digits 1..8 to bits, then bits 1..20 to digits.
pub fn write_tables<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "conversion tables between significant digits and bits")?;
    table(out, ("digits", "bits"), 1..8, digits_to_bits)?;
    table(out, ("bits", "digits"), 1..20, bits_to_digits)
}
