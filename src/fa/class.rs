//! Regexp character classes: `[a-z]`, `\w`, `[:digit:]`, union, negation.
//!
//! Grounded on `fa_regexp_class.c`. A class is a list of "chars blocks",
//! each an independent 256-bit map plus its own negation flag; blocks
//! combine by union (list concatenation), and flattening ORs every block's
//! (possibly per-block-negated, possibly case-folded) membership test into
//! one bitmap before an optional outer negation is applied.

use crate::bitmap::Bitmap256;
use crate::error::{Error, Result};
use crate::fa::Fa;

/// One membership test: a 256-bit map plus whether membership is inverted
/// when flattened.
#[derive(Debug, Clone)]
struct CharsBlock {
    map: Bitmap256,
    neg: bool,
}

/// A regexp character class: a union of [`CharsBlock`]s.
#[derive(Debug, Clone, Default)]
pub struct CharClass {
    blocks: Vec<CharsBlock>,
}

impl CharClass {
    /// An empty class (matches nothing until merged with something).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A class from inclusive byte-value pairs, e.g. `&[(b'a', b'z')]`.
    #[must_use]
    pub fn from_ranges(pairs: &[(u8, u8)]) -> Self {
        let mut map = Bitmap256::new();
        for &(from, to) in pairs {
            map.set_range(from, to);
        }
        Self {
            blocks: vec![CharsBlock { map, neg: false }],
        }
    }

    /// A class from an explicit set of bytes.
    #[must_use]
    pub fn from_chars(chars: &[u8]) -> Self {
        let mut map = Bitmap256::new();
        for &c in chars {
            map.set(c);
        }
        Self {
            blocks: vec![CharsBlock { map, neg: false }],
        }
    }

    /// Unions `other`'s blocks into `self`. Grounded on
    /// `fa_regexp_class_merge`.
    #[must_use]
    pub fn merge(mut self, mut other: Self) -> Self {
        self.blocks.append(&mut other.blocks);
        self
    }

    /// Negates this class as a single flattened block: `[:^lower:]`'s
    /// surface meaning. Grounded on the uppercase-named-class branch of
    /// `fa_regexp_class_named`: flatten unfolded and un-negated to a plain
    /// bitmap, then mark the wrapped block negated via the `neg` flag
    /// rather than bit-complementing the map directly. Doing the latter
    /// instead (as a naive `[:^lower:]` implementation would) bakes the
    /// negation in *before* a later `(?i)` re-fold sees it, so every
    /// letter's opposite-case form — always present in a fully-complemented
    /// map — makes the icase-aware OR fire for every letter too, silently
    /// matching everything. Keeping `neg` as a flag lets the icase fold see
    /// the original (unnegated) membership and invert only once, after.
    #[must_use]
    pub fn negated_flatten(&self) -> Self {
        let map = self.flatten(false, false);
        Self {
            blocks: vec![CharsBlock { map, neg: true }],
        }
    }

    /// OR's every block's (per-block-negated, optionally case-folded)
    /// membership test together, then applies the outer `neg`. Grounded on
    /// `fa_regexp_class_flatten`.
    #[must_use]
    pub fn flatten(&self, neg: bool, icase: bool) -> Bitmap256 {
        let mut f = Bitmap256::new();

        for block in &self.blocks {
            for i in 0u16..256 {
                let i = i as u8;
                let mut r = if icase && i.is_ascii_alphabetic() {
                    block.map.test(i.to_ascii_uppercase()) || block.map.test(i.to_ascii_lowercase())
                } else {
                    block.map.test(i)
                };
                if block.neg {
                    r = !r;
                }
                if r {
                    f.set(i);
                }
            }
        }

        if neg {
            f.negate();
        }
        f
    }

    /// Looks up a POSIX/PCRE-style named class: `.`, `d`/`digit`, `s`/
    /// `space`, `h`, `v`, `w`/`word`, `alnum`, `alpha`, `ascii`, `blank`,
    /// `cntrl`, `graph`, `lower`, `upper`, `print`, `punct`, `xdigit`, plus
    /// their upper-cased negated forms (`W`, `DIGIT`, ...). `dot_all`
    /// controls whether `.` matches `\n`. Grounded on
    /// `fa_regexp_class_named`.
    #[must_use]
    pub fn named(name: &str, dot_all: bool) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        let rc = match lower.as_str() {
            "." => {
                if dot_all {
                    Self::from_ranges(&[(0, 255)])
                } else {
                    Self::from_ranges(&[(0, 9), (11, 255)])
                }
            }
            "d" | "digit" => Self::from_ranges(&[(b'0', b'9')]),
            // before pcre 8.34 \v was not part of \s
            "s" | "space" => Self::from_chars(b" \t\r\x0b\x0c\n"),
            // pcre matches non-ascii \xa0 (NBSP) when in non-utf8 mode
            "h" => Self::from_chars(b" \t\xa0"),
            // pcre matches non-ascii \x85 (NEL, next line) when in non-utf8 mode
            "v" => Self::from_chars(b"\r\x0b\x0c\n\x85"),
            "w" | "word" => {
                Self::from_ranges(&[(b'a', b'z'), (b'A', b'Z'), (b'0', b'9')]).merge(Self::from_chars(b"_"))
            }
            "alnum" => Self::from_ranges(&[(b'a', b'z'), (b'A', b'Z'), (b'0', b'9')]),
            "alpha" => Self::from_ranges(&[(b'a', b'z'), (b'A', b'Z')]),
            "ascii" => Self::from_ranges(&[(0, 127)]),
            "blank" => Self::from_chars(b" \t"),
            "cntrl" => Self::from_ranges(&[(0, 0x1f)]).merge(Self::from_chars(b"\x7f")),
            // space (0x20) not included
            "graph" => Self::from_ranges(&[(0x21, 0x7e)]),
            "lower" => Self::from_ranges(&[(b'a', b'z')]),
            "upper" => Self::from_ranges(&[(b'A', b'Z')]),
            "print" => Self::from_ranges(&[(0x20, 0x7e)]),
            // print minus digits and letters
            "punct" => Self::from_chars(b"!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~"),
            "xdigit" => Self::from_ranges(&[(b'a', b'f'), (b'A', b'F'), (b'0', b'9')]),
            _ => return None,
        };

        // Uppercase-led names are the pre-negated forms: `[:^lower:]`,
        // `W`, `DIGIT`, etc.
        if name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
            Some(rc.negated_flatten())
        } else {
            Some(rc)
        }
    }

    /// Builds the two-state automaton matching any single byte in this
    /// class. Fails with [`Error::EmptyClass`] if the flattened class
    /// matches nothing. Grounded on `fa_regexp_class_fa`.
    pub fn fa(&self, neg: bool, icase: bool) -> Result<Fa> {
        let map = self.flatten(neg, icase);
        if map.is_empty() {
            return Err(Error::EmptyClass);
        }

        let mut fa = Fa::new();
        let start = fa.state_create();
        let end = fa.state_create();
        fa.set_start(start);
        fa.state_mut(end).accepting = true;

        for b in map.iter() {
            fa.trans_create(start, b as i32, end);
        }

        Ok(fa)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_class_matches_ascii_digits() {
        let rc = CharClass::named("d", false).unwrap();
        let map = rc.flatten(false, false);
        assert!(map.test(b'5'));
        assert!(!map.test(b'a'));
    }

    #[test]
    fn negated_named_class_inverts() {
        let lower = CharClass::named("lower", false).unwrap();
        let not_lower = CharClass::named("LOWER", false).unwrap();
        let lmap = lower.flatten(false, false);
        let nmap = not_lower.flatten(false, false);
        for b in 0u16..256 {
            let b = b as u8;
            assert_ne!(lmap.test(b), nmap.test(b));
        }
    }

    #[test]
    fn icase_lower_class_also_matches_upper() {
        let lower = CharClass::named("lower", false).unwrap();
        let map = lower.flatten(false, true);
        assert!(map.test(b'a'));
        assert!(map.test(b'A'));
    }

    #[test]
    fn dot_excludes_newline_unless_dot_all() {
        let dot = CharClass::named(".", false).unwrap();
        let map = dot.flatten(false, false);
        assert!(!map.test(b'\n'));
        assert!(map.test(b'x'));

        let dot_all = CharClass::named(".", true).unwrap();
        let map_all = dot_all.flatten(false, false);
        assert!(map_all.test(b'\n'));
    }

    #[test]
    fn empty_class_errors_building_fa() {
        let rc = CharClass::from_chars(b"");
        let err = rc.fa(false, false).unwrap_err();
        assert!(matches!(err, Error::EmptyClass));
    }

    #[test]
    fn unknown_named_class_returns_none() {
        assert!(CharClass::named("notaclass", false).is_none());
    }
}
