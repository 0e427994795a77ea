//! Streaming OSC 8 hyperlink rewriter
//!
//! `Linker` sits between a producing byte stream (PTY output or a pipe) and
//! stdout. Each write is tokenized; plain-text tokens outside existing
//! hyperlinks are scanned for URLs, bare domains, and file paths, and
//! matches that check out are wrapped in OSC 8 sequences. Everything else —
//! colors, cursor control, device control, passthrough hyperlinks — is
//! forwarded byte for byte.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::bytes::Regex;

use crate::capture::WriteLog;
use crate::fileindex::FileIndex;
use crate::symbols;
use crate::terminal::tokenizer::{AnsiTokenizer, Token, TokenKind};

const OSC8_OPEN: &[u8] = b"\x1b]8;;";

/// String terminator used for emitted OSC 8 sequences.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Terminator {
    /// `ESC \` (ECMA-48 standard)
    #[default]
    St,
    /// `BEL` 0x07 (legacy xterm)
    Bel,
}

impl Terminator {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "" | "st" => Some(Terminator::St),
            "bel" => Some(Terminator::Bel),
            _ => None,
        }
    }

    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Terminator::St => b"\x1b\\",
            Terminator::Bel => b"\x07",
        }
    }
}

/// Construction parameters for [`Linker`].
pub struct LinkerOptions {
    pub output: Box<dyn Write + Send>,
    pub cwd: PathBuf,
    pub hostname: String,
    pub scheme: String,
    pub terminator: Terminator,
    pub domains: Vec<String>,
    pub resolve_basename: bool,
    pub symbol_links: bool,
    pub index: Option<Arc<FileIndex>>,
    pub write_log: Option<WriteLog>,
}

/// Byte-stream transform wrapping link candidates in OSC 8 sequences.
///
/// Implements `io::Write`; `write` reports the *input* length so callers like
/// `io::copy` account for consumed bytes, not produced ones.
pub struct Linker {
    output: Box<dyn Write + Send>,
    cwd: PathBuf,
    hostname: String,
    scheme: String,
    terminator: Terminator,
    symbol_links: bool,
    resolve_basename: bool,
    pattern: Regex,
    file_cache: HashMap<PathBuf, bool>,
    index: Option<Arc<FileIndex>>,
    tokenizer: AnsiTokenizer,
    styled: bool,
    in_osc8: bool,
    write_log: Option<WriteLog>,
}

/// Owned capture spans of one pattern match, so the borrow on the regex ends
/// before path resolution mutates the existence cache.
struct LinkMatch {
    start: usize,
    end: usize,
    url: Option<(usize, usize)>,
    domain: Option<(usize, usize)>,
    path: Option<(usize, usize)>,
    loc: Option<(usize, usize)>,
}

impl Linker {
    pub fn new(opts: LinkerOptions) -> Self {
        let scheme = if opts.scheme.is_empty() {
            "file".to_string()
        } else {
            opts.scheme
        };
        Self {
            output: opts.output,
            cwd: opts.cwd,
            hostname: opts.hostname,
            scheme,
            terminator: opts.terminator,
            symbol_links: opts.symbol_links,
            resolve_basename: opts.resolve_basename,
            pattern: build_pattern(&opts.domains),
            file_cache: HashMap::new(),
            index: opts.index,
            tokenizer: AnsiTokenizer::new(),
            styled: false,
            in_osc8: false,
            write_log: opts.write_log,
        }
    }

    fn process_tokens(&mut self, tokens: Vec<Token>) -> Vec<u8> {
        let mut out = Vec::new();
        for tok in tokens {
            match tok.kind {
                TokenKind::Sgr => {
                    self.styled = tok.styled;
                    out.extend_from_slice(&tok.data);
                }
                TokenKind::Osc8 => {
                    self.in_osc8 = !tok.is_end;
                    out.extend_from_slice(&tok.data);
                }
                TokenKind::Text if !self.in_osc8 => {
                    let rewritten = self.rewrite_text(&tok.data);
                    out.extend_from_slice(&rewritten);
                }
                _ => out.extend_from_slice(&tok.data),
            }
        }
        out
    }

    fn rewrite_text(&mut self, text: &[u8]) -> Vec<u8> {
        let matches: Vec<LinkMatch> = self
            .pattern
            .captures_iter(text)
            .map(|caps| {
                let whole = caps.get(0).unwrap();
                let span = |name: &str| caps.name(name).map(|m| (m.start(), m.end()));
                LinkMatch {
                    start: whole.start(),
                    end: whole.end(),
                    url: span("url"),
                    domain: span("domain"),
                    path: span("path"),
                    loc: span("loc"),
                }
            })
            .collect();

        let mut out = Vec::with_capacity(text.len());
        let mut last = 0;

        for m in matches {
            self.append_plain(&mut out, &text[last..m.start]);

            if let Some((start, end)) = m.url {
                self.append_url(&mut out, &text[start..end]);
            } else if let Some((start, end)) = m.domain {
                out.extend_from_slice(&text[m.start..start]);
                let domain = &text[start..end];
                let mut url = b"https://".to_vec();
                url.extend_from_slice(domain);
                self.emit_link(&mut out, &url, domain);
            } else if let Some((start, end)) = m.path {
                let path = &text[start..end];
                let loc: &[u8] = m.loc.map(|(s, e)| &text[s..e]).unwrap_or(b"");
                match self.resolve_path(path) {
                    Some(abs) => {
                        out.extend_from_slice(&text[m.start..start]);
                        let url = self.format_file_url(&abs, loc);
                        let mut display = path.to_vec();
                        display.extend_from_slice(loc);
                        self.emit_link(&mut out, &url, &display);
                    }
                    // Unresolved candidates stay literal, but may still hold
                    // symbols worth linking.
                    None => self.append_plain(&mut out, &text[m.start..m.end]),
                }
            }

            last = m.end;
        }

        self.append_plain(&mut out, &text[last..]);
        out
    }

    /// Non-candidate text: symbol-scanned when it sits in a styled region
    /// and symbol links apply, otherwise copied through.
    fn append_plain(&self, out: &mut Vec<u8>, span: &[u8]) {
        if span.is_empty() {
            return;
        }
        if self.styled && self.symbol_links && self.scheme != "file" {
            let rewritten = symbols::rewrite(
                span,
                &self.scheme,
                &self.cwd.to_string_lossy(),
                self.terminator.as_bytes(),
            );
            out.extend_from_slice(&rewritten);
        } else {
            out.extend_from_slice(span);
        }
    }

    fn append_url(&self, out: &mut Vec<u8>, url: &[u8]) {
        // A trailing ")" is usually prose punctuation unless the URL itself
        // opened a parenthesis.
        let trim_paren = url.last() == Some(&b')') && !url.contains(&b'(');
        let url = if trim_paren { &url[..url.len() - 1] } else { url };
        self.emit_link(out, url, url);
        if trim_paren {
            out.push(b')');
        }
    }

    fn emit_link(&self, out: &mut Vec<u8>, url: &[u8], display: &[u8]) {
        out.extend_from_slice(OSC8_OPEN);
        out.extend_from_slice(url);
        out.extend_from_slice(self.terminator.as_bytes());
        out.extend_from_slice(display);
        out.extend_from_slice(OSC8_OPEN);
        out.extend_from_slice(self.terminator.as_bytes());
    }

    fn resolve_path(&mut self, path: &[u8]) -> Option<String> {
        let path = String::from_utf8_lossy(path).into_owned();

        if let Some(abs) = self.resolve_literal(&path) {
            return Some(abs);
        }

        // git diff prefixes: "--- a/src/main.rs" names src/main.rs.
        if let Some(stripped) = path.strip_prefix("a/").or_else(|| path.strip_prefix("b/")) {
            if let Some(abs) = self.resolve_literal(stripped) {
                return Some(abs);
            }
        }

        if self.resolve_basename {
            if let Some(index) = &self.index {
                return index.resolve(&path);
            }
        }
        None
    }

    fn resolve_literal(&mut self, path: &str) -> Option<String> {
        let joined = if let Some(rest) = path.strip_prefix("~/") {
            dirs::home_dir()?.join(rest)
        } else if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        };

        let resolved = fs::canonicalize(&joined).unwrap_or(joined);
        if self.file_exists(&resolved) {
            Some(resolved.to_string_lossy().into_owned())
        } else {
            None
        }
    }

    /// Existence check memoized for the life of the wrapper, so repeated
    /// output lines do not re-stat. Directories do not count.
    fn file_exists(&mut self, path: &Path) -> bool {
        if let Some(&exists) = self.file_cache.get(path) {
            return exists;
        }
        let exists = fs::metadata(path).map(|m| m.is_file()).unwrap_or(false);
        self.file_cache.insert(path.to_path_buf(), exists);
        exists
    }

    fn format_file_url(&self, abs: &str, loc: &[u8]) -> Vec<u8> {
        if self.scheme == "file" {
            return format!("file://{}{}", self.hostname, abs).into_bytes();
        }
        let mut url = format!("{}://file{}", self.scheme, abs).into_bytes();
        url.extend_from_slice(&normalize_loc_suffix(loc));
        url
    }
}

impl Write for Linker {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let tokens = self.tokenizer.feed(buf);
        let out = self.process_tokens(tokens);
        self.output.write_all(&out)?;
        if let Some(log) = &mut self.write_log {
            log.record(buf, &out);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let tokens = self.tokenizer.flush();
        if !tokens.is_empty() {
            let out = self.process_tokens(tokens);
            self.output.write_all(&out)?;
        }
        self.output.flush()
    }
}

const BOUNDARY: &str = r"(?:^|[^/\w.\-]|\x1b\[[0-9;]*m)";
const URL_TAIL: &str = r#"[^\s<>"'`\x00-\x1f\x7f]+"#;

/// One pattern, alternatives in priority order: https URL, bare domain (only
/// with a configured domain list), then file path with an optional location
/// suffix. Unicode is off so classes work on raw bytes.
fn build_pattern(domains: &[String]) -> Regex {
    let mut pattern = format!(r"(?-u)(?P<url>https://{URL_TAIL})");

    if !domains.is_empty() {
        let escaped: Vec<String> = domains.iter().map(|d| regex::escape(d)).collect();
        pattern.push_str(&format!(
            r"|{BOUNDARY}(?P<domain>(?:{})/{URL_TAIL})",
            escaped.join("|")
        ));
    }

    pattern.push_str(&format!(
        r"|{BOUNDARY}(?P<path>(?:~|\.{{0,2}})/[\w./\-]+(?:\.\w+)?|[\w./\-]+\.\w+|\w+file)(?P<loc>:\d+(?:[-:]\d+)?)?"
    ));

    Regex::new(&pattern).expect("link pattern is valid")
}

/// Editors expect `line:column`; a `start-end` range becomes `start:1`.
fn normalize_loc_suffix(loc: &[u8]) -> Vec<u8> {
    for i in 1..loc.len() {
        if loc[i] == b'-' {
            let mut out = loc[..i].to_vec();
            out.extend_from_slice(b":1");
            return out;
        }
    }
    loc.to_vec()
}
