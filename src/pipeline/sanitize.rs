//! Text sanitizer: make converted text safe for one-record-per-line formats.
//!
//! Newlines and control characters corrupt line-delimited serialisations
//! (JSONL, CSV, TSV). The sanitizer keeps a fixed allowlist of Unicode blocks
//! (Latin, punctuation, symbols, box drawing, CJK), turns everything else into
//! a space, and collapses whitespace so the result is one line.
//!
//! ## Rule Order
//!
//! 1. Strip C0/C1 control characters except tab, LF and CR
//! 2. Replace every code point outside [`ALLOWED_RANGES`] with a space
//!    (tab, LF and CR are outside the ranges, so they become spaces here)
//! 3. Collapse each run of whitespace to a single space
//! 4. Trim
//!
//! The output never contains line structure: headings, lists and paragraph
//! breaks flatten into a single space-separated line.

use once_cell::sync::Lazy;
use regex::Regex;

/// Inclusive code-point ranges that survive the allowlist filter.
pub const ALLOWED_RANGES: [(char, char); 23] = [
    ('\u{0020}', '\u{007E}'), // Basic Latin, printable
    ('\u{00A0}', '\u{00FF}'), // Latin-1 Supplement
    ('\u{0100}', '\u{024F}'), // Latin Extended-A/B
    ('\u{1E00}', '\u{1EFF}'), // Latin Extended Additional
    ('\u{2000}', '\u{206F}'), // General Punctuation
    ('\u{2070}', '\u{209F}'), // Superscripts and Subscripts
    ('\u{20A0}', '\u{20CF}'), // Currency Symbols
    ('\u{2100}', '\u{214F}'), // Letterlike Symbols
    ('\u{2190}', '\u{21FF}'), // Arrows
    ('\u{2200}', '\u{22FF}'), // Mathematical Operators
    ('\u{2300}', '\u{23FF}'), // Miscellaneous Technical
    ('\u{2400}', '\u{243F}'), // Control Pictures
    ('\u{2440}', '\u{245F}'), // Optical Character Recognition
    ('\u{2460}', '\u{24FF}'), // Enclosed Alphanumerics
    ('\u{2500}', '\u{257F}'), // Box Drawing
    ('\u{2580}', '\u{259F}'), // Block Elements
    ('\u{25A0}', '\u{25FF}'), // Geometric Shapes
    ('\u{2600}', '\u{26FF}'), // Miscellaneous Symbols
    ('\u{2700}', '\u{27BF}'), // Dingbats
    ('\u{3000}', '\u{303F}'), // CJK Symbols and Punctuation
    ('\u{3040}', '\u{309F}'), // Hiragana
    ('\u{30A0}', '\u{30FF}'), // Katakana
    ('\u{4E00}', '\u{9FFF}'), // CJK Unified Ideographs
];

/// Whether `c` is inside one of the [`ALLOWED_RANGES`].
pub fn is_allowed(c: char) -> bool {
    ALLOWED_RANGES.iter().any(|&(lo, hi)| lo <= c && c <= hi)
}

/// Sanitize `input` for embedding in a line-delimited format.
///
/// The result contains only allowed characters separated by single spaces,
/// has no leading or trailing whitespace, is never longer than `input`, and
/// is a fixed point: `sanitize(&sanitize(x)) == sanitize(x)`.
pub fn sanitize(input: &str) -> String {
    let s = strip_control_chars(input);
    let s = replace_disallowed(&s);
    let s = collapse_whitespace(&s);
    s.trim().to_string()
}

// ── Rule 1: Strip control characters ─────────────────────────────────────────

static RE_CONTROL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x{00}-\x{08}\x{0B}\x{0C}\x{0E}-\x{1F}\x{7F}-\x{9F}]").unwrap()
});

fn strip_control_chars(input: &str) -> String {
    RE_CONTROL.replace_all(input, "").into_owned()
}

// ── Rule 2: Allowlist filter ─────────────────────────────────────────────────

static RE_DISALLOWED: Lazy<Regex> = Lazy::new(|| {
    let class: String = ALLOWED_RANGES
        .iter()
        .map(|&(lo, hi)| format!(r"\x{{{:04X}}}-\x{{{:04X}}}", lo as u32, hi as u32))
        .collect();
    Regex::new(&format!("[^{class}]")).unwrap()
});

fn replace_disallowed(input: &str) -> String {
    RE_DISALLOWED.replace_all(input, " ").into_owned()
}

// ── Rule 3: Collapse whitespace ──────────────────────────────────────────────

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn collapse_whitespace(input: &str) -> String {
    RE_WHITESPACE.replace_all(input, " ").into_owned()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Arbitrary text, weighted towards the blocks around the allowlist edges.
    fn mixed_text() -> impl Strategy<Value = String> {
        let ch = prop_oneof![
            any::<char>(),
            prop::char::range('\u{0}', '\u{2FF}'),
            prop::char::range('\u{1E00}', '\u{30FF}'),
            prop::char::range('\u{4E00}', '\u{9FFF}'),
        ];
        prop::collection::vec(ch, 0..64).prop_map(|cs| cs.into_iter().collect())
    }

    /// Strings built only from control characters and Unicode whitespace.
    fn control_or_whitespace() -> impl Strategy<Value = String> {
        let pool: Vec<char> = (0x00u32..=0x20)
            .chain(0x7F..=0xA0)
            .chain(0x2000..=0x200A)
            .chain([0x1680, 0x2028, 0x2029, 0x202F, 0x205F, 0x3000])
            .filter_map(char::from_u32)
            .collect();
        prop::collection::vec(prop::sample::select(pool), 0..64)
            .prop_map(|cs| cs.into_iter().collect())
    }

    #[test]
    fn mixed_whitespace_and_cjk() {
        assert_eq!(sanitize("Hello\tWorld\n\n日本語  test"), "Hello World 日本語 test");
    }

    #[test]
    fn emoji_becomes_single_space() {
        assert_eq!(sanitize("emoji 😀 inside"), "emoji inside");
        assert_eq!(sanitize("a😀b"), "a b");
    }

    #[test]
    fn control_and_whitespace_only_is_empty() {
        assert_eq!(sanitize("\u{0}\u{1}\t\n\r \u{7F}\u{9F}\u{B}\u{C}"), "");
        assert_eq!(sanitize("   \n\n\t"), "");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn control_chars_are_removed_not_spaced() {
        // Rule 1 deletes, so neighbours join rather than split.
        assert_eq!(sanitize("ab\u{0}cd"), "abcd");
        assert_eq!(sanitize("x\u{85}y"), "xy");
    }

    #[test]
    fn markdown_structure_flattens() {
        assert_eq!(
            sanitize("# Title\n\nSome text\n- one\n- two\n"),
            "# Title Some text - one - two"
        );
    }

    #[test]
    fn unsupported_scripts_become_spaces() {
        assert_eq!(sanitize("Hangul 한국어 end"), "Hangul end");
        assert_eq!(sanitize("Кириллица"), "");
    }

    #[test]
    fn allowed_blocks_survive() {
        let s = "café ∑ → ┌ ☀ ✓ ひ カ 漢 € ™";
        assert_eq!(sanitize(s), s);
    }

    #[test]
    fn unicode_spaces_collapse() {
        assert_eq!(sanitize("a\u{A0}\u{A0}b\u{3000}c"), "a b c");
    }

    #[test]
    fn range_boundaries() {
        assert!(is_allowed('\u{20}'));
        assert!(is_allowed('\u{7E}'));
        assert!(!is_allowed('\u{7F}'));
        assert!(!is_allowed('\u{9F}'));
        assert!(is_allowed('\u{A0}'));
        assert!(is_allowed('\u{24F}'));
        assert!(!is_allowed('\u{250}'));
        assert!(!is_allowed('\u{2150}'));
        assert!(is_allowed('\u{27BF}'));
        assert!(!is_allowed('\u{27C0}'));
        assert!(is_allowed('\u{4E00}'));
        assert!(is_allowed('\u{9FFF}'));
        assert!(!is_allowed('\u{A000}'));
        assert!(!is_allowed('\u{1F600}'));
    }

    #[test]
    fn regex_class_agrees_with_table() {
        for cp in (0u32..0xA100).chain(0x1F000..0x1F700) {
            let Some(c) = char::from_u32(cp) else { continue };
            let mut buf = [0u8; 4];
            let replaced = RE_DISALLOWED.is_match(c.encode_utf8(&mut buf));
            assert_eq!(replaced, !is_allowed(c), "disagreement at U+{cp:04X}");
        }
    }

    proptest! {
        #[test]
        fn idempotent(input in prop_oneof![any::<String>(), mixed_text()]) {
            let once = sanitize(&input);
            prop_assert_eq!(sanitize(&once), once);
        }

        #[test]
        fn output_shape(input in prop_oneof![any::<String>(), mixed_text()]) {
            let out = sanitize(&input);
            prop_assert!(!out.starts_with(' ') && !out.ends_with(' '), "untrimmed: {:?}", out);
            prop_assert!(!out.contains("  "), "double space: {:?}", out);
            for c in out.chars() {
                prop_assert!(
                    c == ' ' || (is_allowed(c) && !c.is_whitespace()),
                    "bad char {:?} in {:?}", c, out
                );
            }
        }

        #[test]
        fn never_grows(input in prop_oneof![any::<String>(), mixed_text()]) {
            prop_assert!(sanitize(&input).chars().count() <= input.chars().count());
        }

        #[test]
        fn control_and_whitespace_mix_is_empty(input in control_or_whitespace()) {
            prop_assert_eq!(sanitize(&input), "");
        }
    }
}
