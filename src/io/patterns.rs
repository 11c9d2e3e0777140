//! IO for test pattern files
//!
//! Uses the same format as Atalanta, one pattern per line with one bit per
//! input:
//! ```text
//!     1: 00011101
//!     2: 01110000
//! ```

use std::io::{BufRead, BufReader, Read, Write};

/// Read test patterns, one per line
pub fn read_patterns<R: Read>(r: R) -> Result<Vec<Vec<bool>>, String> {
    let mut ret = Vec::new();
    for l in BufReader::new(r).lines() {
        if let Ok(s) = l {
            let t = s.trim();
            if t.is_empty() || t.starts_with('#') {
                continue;
            }
            let bits = match t.split_once(':') {
                Some((_, b)) => b.trim(),
                None => t,
            };
            let mut pattern = Vec::new();
            for c in bits.chars() {
                match c {
                    '0' => pattern.push(false),
                    '1' => pattern.push(true),
                    c if c.is_whitespace() => (),
                    _ => return Err(format!("Unexpected character {c} in pattern file")),
                }
            }
            ret.push(pattern);
        } else {
            return Err("Error during file IO".to_string());
        }
    }
    Ok(ret)
}

/// Write test patterns, one per line
pub fn write_patterns<W: Write>(w: &mut W, patterns: &[Vec<bool>]) {
    for (i, p) in patterns.iter().enumerate() {
        let bits: String = p.iter().map(|b| if *b { '1' } else { '0' }).collect();
        writeln!(w, "{}: {}", i + 1, bits).unwrap();
    }
}
