//! Debug capture of rewriter writes
//!
//! When enabled, every `write` through the linker is appended to a log file
//! as a block of the form:
//!
//! ```text
//! === Write #1 (23 bytes) ===
//! Input:  "error in \x1b[32m...\x1b[0m\n"
//! Output: "error in \x1b[32m\x1b]8;;file://..."
//! ```
//!
//! Payloads are quoted so escape-sequence bugs can be replayed later from
//! the exact bytes the linker saw and produced.

use std::env;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Append-only log of (input, output) pairs per write call.
pub struct WriteLog {
    file: File,
    path: PathBuf,
    seq: usize,
}

impl WriteLog {
    /// Create the log under the system temp directory, named after the
    /// wrapper's pid so concurrent sessions do not collide.
    pub fn create() -> io::Result<Self> {
        let path = env::temp_dir().join(format!("linkwrap-writes-{}.log", std::process::id()));
        Self::create_at(path)
    }

    pub fn create_at(path: PathBuf) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { file, path, seq: 0 })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one write block. Logging failures are swallowed so a full disk
    /// cannot break the output stream this log exists to debug.
    pub fn record(&mut self, input: &[u8], output: &[u8]) {
        self.seq += 1;
        let _ = writeln!(
            self.file,
            "=== Write #{} ({} bytes) ===",
            self.seq,
            input.len()
        );
        let _ = writeln!(self.file, "Input:  \"{}\"", quote_bytes(input));
        let _ = writeln!(self.file, "Output: \"{}\"", quote_bytes(output));
        let _ = writeln!(self.file);
    }
}

/// Escape a byte string for a double-quoted log payload. ESC comes out as
/// `\x1b` and BEL as `\x07`; all other control and non-ASCII bytes use the
/// same `\xNN` form.
pub fn quote_bytes(data: &[u8]) -> String {
    let mut quoted = String::with_capacity(data.len());
    for &b in data {
        match b {
            b'"' => quoted.push_str("\\\""),
            b'\\' => quoted.push_str("\\\\"),
            b'\n' => quoted.push_str("\\n"),
            b'\r' => quoted.push_str("\\r"),
            b'\t' => quoted.push_str("\\t"),
            0x20..=0x7e => quoted.push(b as char),
            _ => quoted.push_str(&format!("\\x{b:02x}")),
        }
    }
    quoted
}
