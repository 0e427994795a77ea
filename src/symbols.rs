//! Symbol linking for styled text spans
//!
//! Compiler and linter output highlights the identifier it is complaining
//! about with SGR color. When a span of text is known to be styled, every
//! run of 3+ word characters in it becomes a hyperlink that asks the editor
//! to jump to the symbol. The scan is byte-level: multi-byte UTF-8 counts as
//! non-word, which is conservative.

/// Extension host segment of emitted symbol URLs.
pub const SYMBOL_OPENER_HOST: &str = "maaashjp.symbol-opener";

/// Words shorter than this are left alone (`ID`, `db`, ...).
const MIN_SYMBOL_LEN: usize = 3;

fn is_word_byte(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphanumeric()
}

/// Rewrite `text`, wrapping eligible words in OSC 8 symbol links.
///
/// A word immediately followed by `(` is tagged as a function. Consecutive
/// words joined by `.` accumulate a qualified name: in `Foo.Bar` the second
/// link displays `Bar` but carries symbol `Foo.Bar`. Any other boundary
/// resets the accumulator.
pub fn rewrite(text: &[u8], scheme: &str, cwd: &str, terminator: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut qualified: Vec<u8> = Vec::new();
    let mut i = 0;

    while i < text.len() {
        let b = text[i];

        if is_word_byte(b) {
            let start = i;
            while i < text.len() && is_word_byte(text[i]) {
                i += 1;
            }
            let word = &text[start..i];

            if word.len() >= MIN_SYMBOL_LEN {
                let is_call = text.get(i) == Some(&b'(');
                emit_symbol_link(&mut out, word, &qualified, is_call, scheme, cwd, terminator);
            } else {
                out.extend_from_slice(word);
            }

            let chains = text.get(i) == Some(&b'.')
                && text.get(i + 1).is_some_and(|&n| is_word_byte(n));
            if chains {
                qualified.extend_from_slice(word);
                qualified.push(b'.');
            } else {
                qualified.clear();
            }
        } else {
            let chain_dot = b == b'.'
                && i > 0
                && is_word_byte(text[i - 1])
                && text.get(i + 1).is_some_and(|&n| is_word_byte(n));
            if !chain_dot {
                qualified.clear();
            }
            out.push(b);
            i += 1;
        }
    }

    out
}

fn emit_symbol_link(
    out: &mut Vec<u8>,
    word: &[u8],
    qualified: &[u8],
    is_call: bool,
    scheme: &str,
    cwd: &str,
    terminator: &[u8],
) {
    out.extend_from_slice(b"\x1b]8;;");
    out.extend_from_slice(scheme.as_bytes());
    out.extend_from_slice(b"://");
    out.extend_from_slice(SYMBOL_OPENER_HOST.as_bytes());
    out.extend_from_slice(b"?symbol=");
    out.extend_from_slice(qualified);
    out.extend_from_slice(word);
    out.extend_from_slice(b"&cwd=");
    out.extend_from_slice(cwd.as_bytes());
    if is_call {
        out.extend_from_slice(b"&kind=Function");
    }
    out.extend_from_slice(terminator);
    out.extend_from_slice(word);
    out.extend_from_slice(b"\x1b]8;;");
    out.extend_from_slice(terminator);
}

#[cfg(test)]
mod tests {
    use super::*;

    const ST: &str = "\x1b\\";

    fn run(text: &str) -> String {
        let out = rewrite(text.as_bytes(), "cursor", "/work", ST.as_bytes());
        String::from_utf8(out).unwrap()
    }

    fn link(symbol: &str, display: &str, kind_function: bool) -> String {
        let kind = if kind_function { "&kind=Function" } else { "" };
        format!(
            "\x1b]8;;cursor://{SYMBOL_OPENER_HOST}?symbol={symbol}&cwd=/work{kind}{ST}{display}\x1b]8;;{ST}"
        )
    }

    #[test]
    fn links_plain_word() {
        assert_eq!(run("NewLinker"), link("NewLinker", "NewLinker", false));
    }

    #[test]
    fn short_words_untouched() {
        assert_eq!(run("ID and DB"), format!("ID {} DB", link("and", "and", false)));
    }

    #[test]
    fn function_call_gets_kind() {
        assert_eq!(
            run("NewLinker()"),
            format!("{}()", link("NewLinker", "NewLinker", true))
        );
    }

    #[test]
    fn call_arguments_linked_separately() {
        assert_eq!(
            run("NewLinker(arg)"),
            format!(
                "{}({})",
                link("NewLinker", "NewLinker", true),
                link("arg", "arg", false)
            )
        );
    }

    #[test]
    fn snake_and_caps_linked() {
        assert_eq!(run("get_user_name"), link("get_user_name", "get_user_name", false));
        assert_eq!(run("HTTP_STATUS"), link("HTTP_STATUS", "HTTP_STATUS", false));
    }

    #[test]
    fn digits_are_word_bytes() {
        assert_eq!(run("Handler2"), link("Handler2", "Handler2", false));
    }

    #[test]
    fn dotted_chain_qualifies() {
        assert_eq!(
            run("Foo.Bar"),
            format!(
                "{}.{}",
                link("Foo", "Foo", false),
                link("Foo.Bar", "Bar", false)
            )
        );
    }

    #[test]
    fn chain_extends_across_segments() {
        assert_eq!(
            run("Foo.Bar.Baz"),
            format!(
                "{}.{}.{}",
                link("Foo", "Foo", false),
                link("Foo.Bar", "Bar", false),
                link("Foo.Bar.Baz", "Baz", false)
            )
        );
    }

    #[test]
    fn non_dot_boundary_resets_chain() {
        assert_eq!(
            run("Foo Bar"),
            format!("{} {}", link("Foo", "Foo", false), link("Bar", "Bar", false))
        );
    }

    #[test]
    fn trailing_dot_does_not_chain() {
        assert_eq!(run("Foo. Bar"), format!(
            "{}. {}",
            link("Foo", "Foo", false),
            link("Bar", "Bar", false)
        ));
    }

    #[test]
    fn multibyte_utf8_is_a_boundary() {
        assert_eq!(run("héllo"), format!("h\u{e9}{}", link("llo", "llo", false)));
    }
}
