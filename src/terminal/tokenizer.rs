//! Incremental ANSI escape-sequence tokenizer
//!
//! Segments an arbitrarily chunked byte stream into typed tokens (plain text,
//! SGR, other CSI, OSC 8, other OSC, DCS, bare ESC) without ever losing a
//! byte: the concatenation of all emitted token data equals the input.
//! Sequences split across chunk boundaries are buffered until complete, so
//! the same tokens come out no matter how the producer fragments its writes.

/// Classification of an emitted token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// Plain text, may contain link candidates
    Text,
    /// CSI Pm m - Select Graphic Rendition (colors, bold, etc.)
    Sgr,
    /// CSI sequences other than SGR (cursor control, etc.)
    Csi,
    /// OSC 8 hyperlink sequence
    Osc8,
    /// OSC sequences other than OSC 8 (window title, etc.)
    Osc,
    /// Device Control String (ESC P ... ST), APC, PM
    Dcs,
    /// Buffer overflow remnant
    Other,
    /// ESC + single byte that's not a sequence introducer
    Esc,
}

/// A single token. `data` is an owned copy of the exact bytes that produced
/// it, safe to retain across later `feed` calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub data: Vec<u8>,
    /// For `Sgr` only: true if styling remains active after this sequence
    pub styled: bool,
    /// For `Osc8` only: true if this is a link-closing sequence (empty URI)
    pub is_end: bool,
}

impl Token {
    fn new(kind: TokenKind, data: Vec<u8>) -> Self {
        Self {
            kind,
            data,
            styled: false,
            is_end: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Normal text processing
    Ground,
    /// Received ESC, waiting for sequence introducer
    Esc,
    /// Inside CSI sequence (ESC [), collecting params
    Csi,
    /// Inside OSC sequence (ESC ]), collecting string
    Osc,
    /// Received ESC inside OSC/DCS, checking for ST (\)
    StCandidate,
    /// Inside DCS/APC/PM sequence, waiting for ST
    Dcs,
}

const ESC_BYTE: u8 = 0x1b;
const BEL_BYTE: u8 = 0x07;

/// Limits buffer growth for unterminated OSC/DCS sequences. If exceeded, the
/// incomplete sequence is emitted as `Other` and parsing resets.
const MAX_BUFFER_SIZE: usize = 4096;

const ATTR_BOLD: u16 = 1 << 0;
const ATTR_FAINT: u16 = 1 << 1;
const ATTR_ITALIC: u16 = 1 << 2;
const ATTR_UNDERLINE: u16 = 1 << 3;
const ATTR_BLINK_SLOW: u16 = 1 << 4;
const ATTR_BLINK_RAPID: u16 = 1 << 5;
const ATTR_INVERSE: u16 = 1 << 6;
const ATTR_CONCEAL: u16 = 1 << 7;
const ATTR_STRIKETHROUGH: u16 = 1 << 8;

/// Tracks which SGR attributes are currently active.
#[derive(Clone, Copy, Debug, Default)]
struct SgrState {
    fg_active: bool,
    bg_active: bool,
    attrs: u16,
}

impl SgrState {
    fn styled(&self) -> bool {
        self.fg_active || self.bg_active || self.attrs != 0
    }

    fn reset(&mut self) {
        self.fg_active = false;
        self.bg_active = false;
        self.attrs = 0;
    }
}

/// Stateful tokenizer. State persists across `feed` calls so sequences split
/// across buffer boundaries are reassembled.
pub struct AnsiTokenizer {
    buf: Vec<u8>,
    state: State,
    prev_state: State,
    sgr: SgrState,
    in_osc8: bool,
}

impl AnsiTokenizer {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(128),
            state: State::Ground,
            prev_state: State::Ground,
            sgr: SgrState::default(),
            in_osc8: false,
        }
    }

    /// Consume a chunk and return the complete tokens it produced. Any
    /// partial sequence stays buffered for the next `feed`. Trailing plain
    /// text is emitted immediately rather than held back.
    pub fn feed(&mut self, data: &[u8]) -> Vec<Token> {
        let mut tokens = Vec::new();

        for &b in data {
            match self.state {
                State::Ground => {
                    if b == ESC_BYTE {
                        if !self.buf.is_empty() {
                            tokens.push(Token::new(TokenKind::Text, self.take_buf()));
                        }
                        self.buf.push(b);
                        self.state = State::Esc;
                    } else {
                        self.buf.push(b);
                    }
                }

                State::Esc => {
                    self.buf.push(b);
                    match b {
                        b'[' => self.state = State::Csi,
                        b']' => self.state = State::Osc,
                        b'P' | b'_' | b'^' => self.state = State::Dcs,
                        _ => {
                            tokens.push(Token::new(TokenKind::Esc, self.take_buf()));
                            self.state = State::Ground;
                        }
                    }
                }

                State::Csi => {
                    self.buf.push(b);
                    if is_csi_final_byte(b) {
                        let tok = self.emit_csi();
                        tokens.push(tok);
                        self.state = State::Ground;
                    } else if !is_csi_param_byte(b) && !is_csi_intermediate_byte(b) {
                        tokens.push(Token::new(TokenKind::Csi, self.take_buf()));
                        self.state = State::Ground;
                    }
                }

                State::Osc => {
                    self.buf.push(b);
                    match b {
                        BEL_BYTE => {
                            let tok = self.emit_osc();
                            tokens.push(tok);
                            self.state = State::Ground;
                        }
                        ESC_BYTE => {
                            self.prev_state = State::Osc;
                            self.state = State::StCandidate;
                        }
                        _ => {}
                    }
                }

                State::StCandidate => {
                    self.buf.push(b);
                    if b == b'\\' {
                        let tok = if self.prev_state == State::Dcs {
                            Token::new(TokenKind::Dcs, self.take_buf())
                        } else {
                            self.emit_osc()
                        };
                        tokens.push(tok);
                        self.state = State::Ground;
                    } else {
                        self.state = self.prev_state;
                    }
                }

                State::Dcs => {
                    self.buf.push(b);
                    if b == ESC_BYTE {
                        self.prev_state = State::Dcs;
                        self.state = State::StCandidate;
                    }
                }
            }

            if self.buf.len() > MAX_BUFFER_SIZE {
                if self.state == State::Ground {
                    tokens.push(Token::new(TokenKind::Text, self.take_buf()));
                } else {
                    tokens.push(Token::new(TokenKind::Other, self.take_buf()));
                    self.state = State::Ground;
                }
            }
        }

        if self.state == State::Ground && !self.buf.is_empty() {
            tokens.push(Token::new(TokenKind::Text, self.take_buf()));
        }

        tokens
    }

    /// Force out whatever is buffered, classified as best possible by the
    /// current phase. Afterwards the buffer is empty and the state is Ground.
    pub fn flush(&mut self) -> Vec<Token> {
        if self.buf.is_empty() {
            return Vec::new();
        }

        let kind = self.infer_incomplete_kind();
        let data = self.take_buf();
        let mut tok = Token::new(kind, data);

        if kind == TokenKind::Csi && tok.data.len() >= 2 {
            let params = tok.data[2..].to_vec();
            apply_sgr_params(&params, &mut self.sgr);
            tok.styled = self.sgr.styled();
        }

        self.state = State::Ground;
        vec![tok]
    }

    /// True if at least one SGR attribute is currently active.
    pub fn styled(&self) -> bool {
        self.sgr.styled()
    }

    /// True if the stream is currently inside an OSC 8 hyperlink.
    pub fn in_osc8(&self) -> bool {
        self.in_osc8
    }

    fn take_buf(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }

    fn infer_incomplete_kind(&self) -> TokenKind {
        if self.buf.is_empty() || self.buf[0] != ESC_BYTE {
            return TokenKind::Text;
        }
        if self.buf.len() == 1 {
            return TokenKind::Esc;
        }
        match self.buf[1] {
            b'[' => TokenKind::Csi,
            b']' => TokenKind::Osc,
            b'P' | b'_' | b'^' => TokenKind::Dcs,
            _ => TokenKind::Esc,
        }
    }

    fn emit_csi(&mut self) -> Token {
        let data = self.take_buf();
        let mut tok = Token::new(TokenKind::Csi, data);

        if tok.data.len() >= 3 && tok.data[tok.data.len() - 1] == b'm' {
            tok.kind = TokenKind::Sgr;
            let params = tok.data[2..tok.data.len() - 1].to_vec();
            apply_sgr_params(&params, &mut self.sgr);
            tok.styled = self.sgr.styled();
        }

        tok
    }

    fn emit_osc(&mut self) -> Token {
        let data = self.take_buf();

        if let Some(is_end) = parse_osc8(extract_osc_data(&data)) {
            self.in_osc8 = !is_end;
            let mut tok = Token::new(TokenKind::Osc8, data);
            tok.is_end = is_end;
            return tok;
        }

        Token::new(TokenKind::Osc, data)
    }
}

impl Default for AnsiTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Payload bytes of a complete OSC sequence: everything between `ESC ]`
/// (plus an optional leading `;`) and the BEL or ST terminator.
fn extract_osc_data(data: &[u8]) -> &[u8] {
    if data.len() < 2 {
        return &[];
    }
    let mut start = 2;
    if data.len() > start && data[start] == b';' {
        start += 1;
    }

    let mut end = data.len();
    if end > 0 && data[end - 1] == BEL_BYTE {
        end -= 1;
    } else if end >= 2 && data[end - 2] == ESC_BYTE && data[end - 1] == b'\\' {
        end -= 2;
    }

    if start >= end {
        return &[];
    }
    &data[start..end]
}

/// Returns `Some(is_end)` if the payload is an OSC 8 hyperlink sequence,
/// where `is_end` means the URI field is empty (link close).
fn parse_osc8(data: &[u8]) -> Option<bool> {
    let rest = data.strip_prefix(b"8;")?;
    let sep = rest.iter().position(|&b| b == b';')?;
    Some(rest[sep + 1..].is_empty())
}

fn is_csi_final_byte(b: u8) -> bool {
    (0x40..=0x7e).contains(&b)
}

fn is_csi_param_byte(b: u8) -> bool {
    (0x30..=0x3f).contains(&b)
}

fn is_csi_intermediate_byte(b: u8) -> bool {
    (0x20..=0x2f).contains(&b)
}

/// Apply an SGR parameter list to the attribute state. An empty list means
/// reset (CSI m is equivalent to CSI 0 m).
fn apply_sgr_params(params: &[u8], st: &mut SgrState) {
    if params.is_empty() {
        st.reset();
        return;
    }

    let codes = parse_csi_params(params);
    let mut i = 0;
    while i < codes.len() {
        let code = codes[i];
        match code {
            0 => st.reset(),
            1 => st.attrs |= ATTR_BOLD,
            2 => st.attrs |= ATTR_FAINT,
            3 => st.attrs |= ATTR_ITALIC,
            4 => st.attrs |= ATTR_UNDERLINE,
            5 => st.attrs |= ATTR_BLINK_SLOW,
            6 => st.attrs |= ATTR_BLINK_RAPID,
            7 => st.attrs |= ATTR_INVERSE,
            8 => st.attrs |= ATTR_CONCEAL,
            9 => st.attrs |= ATTR_STRIKETHROUGH,
            22 => st.attrs &= !(ATTR_BOLD | ATTR_FAINT),
            23 => st.attrs &= !ATTR_ITALIC,
            24 => st.attrs &= !ATTR_UNDERLINE,
            25 => st.attrs &= !(ATTR_BLINK_SLOW | ATTR_BLINK_RAPID),
            27 => st.attrs &= !ATTR_INVERSE,
            28 => st.attrs &= !ATTR_CONCEAL,
            29 => st.attrs &= !ATTR_STRIKETHROUGH,
            30..=37 | 90..=97 => st.fg_active = true,
            38 => {
                st.fg_active = true;
                i += skip_extended_color(&codes, i + 1);
            }
            39 => st.fg_active = false,
            40..=47 | 100..=107 => st.bg_active = true,
            48 => {
                st.bg_active = true;
                i += skip_extended_color(&codes, i + 1);
            }
            49 => st.bg_active = false,
            _ => {}
        }
        i += 1;
    }
}

/// Number of parameters consumed by the color-space selector after a 38/48:
/// `5;n` takes two, `2;r;g;b` takes four.
fn skip_extended_color(codes: &[u32], start: usize) -> usize {
    match codes.get(start) {
        Some(5) => 2,
        Some(2) => 4,
        _ => 0,
    }
}

/// Split a semicolon-separated parameter list into numbers. Empty fields
/// parse as zero; non-digit bytes within a field are ignored.
fn parse_csi_params(params: &[u8]) -> Vec<u32> {
    let mut codes = Vec::new();
    let mut start = 0;
    for i in 0..=params.len() {
        if i == params.len() || params[i] == b';' {
            codes.push(parse_number(&params[start..i]));
            start = i + 1;
        }
    }
    codes
}

fn parse_number(s: &[u8]) -> u32 {
    let mut n: u32 = 0;
    for &b in s {
        if b.is_ascii_digit() {
            n = n.wrapping_mul(10).wrapping_add(u32::from(b - b'0'));
        }
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    const ESC: &str = "\x1b";
    const BEL: &str = "\x07";
    const ST: &str = "\x1b\\";
    const CSI: &str = "\x1b[";
    const OSC: &str = "\x1b]";
    const DCS: &str = "\x1bP";

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    fn concat(tokens: &[Token]) -> Vec<u8> {
        tokens.iter().flat_map(|t| t.data.clone()).collect()
    }

    #[test]
    fn basic_text() {
        let mut tok = AnsiTokenizer::new();
        let tokens = tok.feed(b"hello world");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Text);
        assert_eq!(tokens[0].data, b"hello world");
        assert!(tok.flush().is_empty());
        assert!(!tok.styled());
        assert!(!tok.in_osc8());
    }

    #[test]
    fn sgr_pair() {
        let mut tok = AnsiTokenizer::new();
        let tokens = tok.feed(format!("{CSI}31mred{CSI}0m").as_bytes());
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Sgr, TokenKind::Text, TokenKind::Sgr]
        );
        assert!(tokens[0].styled);
        assert_eq!(tokens[1].data, b"red");
        assert!(!tokens[2].styled);
        assert!(!tok.styled());
    }

    #[test]
    fn non_sgr_csi() {
        let mut tok = AnsiTokenizer::new();
        let tokens = tok.feed(format!("{CSI}2Jclear").as_bytes());
        assert_eq!(kinds(&tokens), vec![TokenKind::Csi, TokenKind::Text]);
        assert_eq!(tokens[0].data, format!("{CSI}2J").as_bytes());
        assert_eq!(tokens[1].data, b"clear");
    }

    #[test]
    fn osc_title_bel() {
        let mut tok = AnsiTokenizer::new();
        let tokens = tok.feed(format!("{OSC}0;title{BEL}text").as_bytes());
        assert_eq!(kinds(&tokens), vec![TokenKind::Osc, TokenKind::Text]);
        assert_eq!(tokens[0].data, format!("{OSC}0;title{BEL}").as_bytes());
    }

    #[test]
    fn osc_with_embedded_esc_then_bel() {
        // ESC not followed by backslash stays part of the OSC payload.
        let mut tok = AnsiTokenizer::new();
        let input = format!("{OSC}0;title{ESC}{BEL}more{BEL}text");
        let tokens = tok.feed(input.as_bytes());
        assert_eq!(kinds(&tokens), vec![TokenKind::Osc, TokenKind::Text]);
        assert_eq!(
            tokens[0].data,
            format!("{OSC}0;title{ESC}{BEL}more{BEL}").as_bytes()
        );
        assert_eq!(tokens[1].data, b"text");
    }

    #[test]
    fn osc8_open_close_st() {
        let mut tok = AnsiTokenizer::new();
        let input = format!("{OSC}8;;https://example.com{ST}link{OSC}8;;{ST}");
        let tokens = tok.feed(input.as_bytes());
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Osc8, TokenKind::Text, TokenKind::Osc8]
        );
        assert!(!tokens[0].is_end);
        assert_eq!(tokens[1].data, b"link");
        assert!(tokens[2].is_end);
        assert!(!tok.in_osc8());
    }

    #[test]
    fn osc8_open_bel_leaves_link_state() {
        let mut tok = AnsiTokenizer::new();
        let input = format!("{OSC}8;;https://example.com{BEL}link");
        let tokens = tok.feed(input.as_bytes());
        assert_eq!(kinds(&tokens), vec![TokenKind::Osc8, TokenKind::Text]);
        assert!(!tokens[0].is_end);
        assert!(tok.in_osc8());
    }

    #[test]
    fn chunked_sgr_across_feeds() {
        let mut tok = AnsiTokenizer::new();
        let tokens = tok.feed(format!("text{CSI}38;2;136;136").as_bytes());
        assert_eq!(kinds(&tokens), vec![TokenKind::Text]);
        assert_eq!(tokens[0].data, b"text");

        let tokens = tok.feed(b";136mmore");
        assert_eq!(kinds(&tokens), vec![TokenKind::Sgr, TokenKind::Text]);
        assert_eq!(tokens[0].data, format!("{CSI}38;2;136;136;136m").as_bytes());
        assert!(tokens[0].styled);
        assert_eq!(tokens[1].data, b"more");
        assert!(tok.styled());
    }

    #[test]
    fn chunked_esc_across_feeds() {
        let mut tok = AnsiTokenizer::new();
        let tokens = tok.feed(format!("abc{ESC}").as_bytes());
        assert_eq!(kinds(&tokens), vec![TokenKind::Text]);

        let tokens = tok.feed(b"[31mred");
        assert_eq!(kinds(&tokens), vec![TokenKind::Sgr, TokenKind::Text]);
        assert_eq!(tokens[0].data, format!("{CSI}31m").as_bytes());
        assert!(tokens[0].styled);
    }

    #[test]
    fn flush_incomplete_csi() {
        let mut tok = AnsiTokenizer::new();
        tok.feed(format!("text{CSI}38;2;136").as_bytes());
        let flushed = tok.flush();
        assert_eq!(flushed.len(), 1);
        assert_eq!(flushed[0].kind, TokenKind::Csi);
        assert_eq!(flushed[0].data, format!("{CSI}38;2;136").as_bytes());
        assert!(flushed[0].styled);
        assert!(tok.styled());
        assert!(tok.flush().is_empty());
    }

    #[test]
    fn flush_lone_esc() {
        let mut tok = AnsiTokenizer::new();
        tok.feed(format!("text{ESC}").as_bytes());
        let flushed = tok.flush();
        assert_eq!(flushed.len(), 1);
        assert_eq!(flushed[0].kind, TokenKind::Esc);
        assert_eq!(flushed[0].data, ESC.as_bytes());
    }

    #[test]
    fn dcs_with_st() {
        let mut tok = AnsiTokenizer::new();
        let tokens = tok.feed(format!("{DCS}data{ST}text").as_bytes());
        assert_eq!(kinds(&tokens), vec![TokenKind::Dcs, TokenKind::Text]);
        assert_eq!(tokens[0].data, format!("{DCS}data{ST}").as_bytes());
    }

    #[test]
    fn dcs_ignores_bel() {
        // DCS terminates only on ST; BEL stays inside the payload.
        let mut tok = AnsiTokenizer::new();
        let tokens = tok.feed(format!("{DCS}data{BEL}text").as_bytes());
        assert!(tokens.is_empty());
        let flushed = tok.flush();
        assert_eq!(flushed.len(), 1);
        assert_eq!(flushed[0].kind, TokenKind::Dcs);
        assert_eq!(flushed[0].data, format!("{DCS}data{BEL}text").as_bytes());
    }

    #[test]
    fn lone_esc_sequences() {
        let mut tok = AnsiTokenizer::new();
        let tokens = tok.feed(format!("{ESC}7text{ESC}8").as_bytes());
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Esc, TokenKind::Text, TokenKind::Esc]
        );
        assert_eq!(tokens[0].data, format!("{ESC}7").as_bytes());
        assert_eq!(tokens[2].data, format!("{ESC}8").as_bytes());
    }

    #[test]
    fn malformed_csi() {
        let mut tok = AnsiTokenizer::new();
        let tokens = tok.feed(format!("{CSI}\x00text").as_bytes());
        assert_eq!(kinds(&tokens), vec![TokenKind::Csi, TokenKind::Text]);
        assert_eq!(tokens[0].data, format!("{CSI}\x00").as_bytes());
    }

    #[test]
    fn multiple_sgr_accumulate() {
        let mut tok = AnsiTokenizer::new();
        let tokens = tok.feed(format!("{CSI}1m{CSI}31mtext").as_bytes());
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Sgr, TokenKind::Sgr, TokenKind::Text]
        );
        assert!(tokens[0].styled);
        assert!(tokens[1].styled);
        assert!(tok.styled());
    }

    #[test]
    fn osc_overflow_emits_other() {
        let mut input = vec![ESC_BYTE, b']'];
        input.resize(MAX_BUFFER_SIZE + 100, b'x');
        let mut tok = AnsiTokenizer::new();
        let tokens = tok.feed(&input);
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Other));
        assert_eq!(concat(&tokens), input);
        // Tokenizer recovered: next input parses normally.
        let tokens = tok.feed(b"\x1b[31m");
        assert_eq!(kinds(&tokens), vec![TokenKind::Sgr]);
    }

    #[test]
    fn text_overflow_stays_text() {
        let input = vec![b'a'; MAX_BUFFER_SIZE + 10];
        let mut tok = AnsiTokenizer::new();
        let tokens = tok.feed(&input);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Text));
        assert_eq!(concat(&tokens), input);
    }

    #[test]
    fn byte_preservation_at_every_split() {
        let input = format!(
            "plain {CSI}1;31mred{CSI}0m {OSC}8;;https://x{ST}link{OSC}8;;{ST} {DCS}p{ST}{ESC}7 end"
        );
        let input = input.as_bytes();
        for split in 0..=input.len() {
            let mut tok = AnsiTokenizer::new();
            let mut out = Vec::new();
            out.extend(concat(&tok.feed(&input[..split])));
            out.extend(concat(&tok.feed(&input[split..])));
            out.extend(concat(&tok.flush()));
            assert_eq!(out, input, "split at {split}");
        }
    }

    #[test]
    fn sgr_param_styling() {
        let cases: &[(&str, bool)] = &[
            ("", false),
            ("0", false),
            ("1", true),
            ("31", true),
            ("0;31", true),
            ("31;0", false),
            ("38;5;196", true),
            ("38;2;255;0;0", true),
            ("39", false),
            ("49", false),
            ("22", false),
            ("1;22", false),
            ("22;1", true),
            ("40", true),
            ("100", true),
        ];
        for (params, styled) in cases {
            let mut st = SgrState::default();
            apply_sgr_params(params.as_bytes(), &mut st);
            assert_eq!(st.styled(), *styled, "params {params:?}");
        }
    }

    #[test]
    fn extended_color_skips_params() {
        // 38;5;1 then 0 at the end: the reset must still be seen.
        let mut st = SgrState::default();
        apply_sgr_params(b"38;5;196;0", &mut st);
        assert!(!st.styled());
    }

    #[test]
    fn osc8_payload_parsing() {
        let cases: &[(&[u8], Option<bool>)] = &[
            (b"8;;https://example.com", Some(false)),
            (b"8;;", Some(true)),
            (b"8;id=foo;https://example.com", Some(false)),
            (b"8;id=foo;", Some(true)),
            (b"0;title", None),
            (b"8", None),
            (b"8;", None),
        ];
        for (data, want) in cases {
            assert_eq!(parse_osc8(data), *want, "payload {data:?}");
        }
    }

    #[test]
    fn token_data_survives_later_feeds() {
        let mut tok = AnsiTokenizer::new();
        let first = tok.feed(b"first");
        let kept = first[0].data.clone();
        tok.feed(b"second");
        assert_eq!(kept, b"first");
    }
}
