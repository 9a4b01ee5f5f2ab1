//! src/wordlist.rs
//!
//! Reads a newline-delimited wordlist file, trimming whitespace and
//! skipping empty lines and `#`-prefixed comments. Kept from the teacher's
//! `scanner/wordlist.rs` essentially unchanged — this is the thin
//! out-of-scope adapter spec.md §1 calls "wordlist file reading".

use std::fs::File;
use std::io::{BufRead, BufReader};

pub fn read_wordlist(path: &str) -> std::io::Result<Vec<String>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        out.push(trimmed.to_string());
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn skips_blank_lines_and_comments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "admin").unwrap();
        writeln!(file, "").unwrap();
        writeln!(file, "# a comment").unwrap();
        writeln!(file, "  backup  ").unwrap();
        let words = read_wordlist(file.path().to_str().unwrap()).unwrap();
        assert_eq!(words, vec!["admin".to_string(), "backup".to_string()]);
    }
}
