//! The regexp abstract syntax tree.
//!
//! Generalizes the teacher's five-variant `char`-based [`Ast`] with the
//! richer atom set (classes, binary patterns) and bounded-repeat counts
//! this front end's grammar (§4.5) adds, while keeping the same binary
//! `Concat`/`Alt` tree shape produced by [`super::parser`].

use crate::fa::binary::BinPattern;
use crate::fa::class::CharClass;

/// The different ways a postfix repeat operator can bound its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatKind {
    /// `*`
    Star,
    /// `+`
    Plus,
    /// `?`
    Opt,
    /// `{m}` (`exact`), `{m,}` (`exact = false`, unbounded), or `{m,n}`.
    Count { min: u32, max: Option<u32>, exact: bool },
}

/// An abstract syntax tree for a regular expression. Nodes whose
/// compilation to an [`crate::fa::Fa`](crate::fa::Fa) can fail (`EMPTY_CLASS`,
/// `NOT_BYTE_ALIGNED`, `INVALID_REPEAT`) carry the byte offset of the token
/// that introduced them, so [`super::compile`] can surface a `(message,
/// pos)` pair per §7 rather than just the message.
#[derive(Debug, Clone)]
pub enum Ast {
    /// A literal byte.
    Literal(u8),
    /// `.` — any byte (except `\n`, unless dot-all).
    Dot,
    /// A `[...]` bracket expression or class-shorthand escape.
    Class { class: CharClass, neg: bool, pos: usize },
    /// A `<part,part,...>` binary pattern.
    Binary(BinPattern, usize),
    /// Concatenation of two expressions.
    Concat(Box<Ast>, Box<Ast>),
    /// Alternation between two expressions.
    Alt(Box<Ast>, Box<Ast>),
    /// A postfix-repeated expression.
    Repeat(Box<Ast>, RepeatKind, usize),
    /// An inline `(?i:...)` case-insensitive group, scoped to `sub` only.
    ICaseGroup(Box<Ast>),
}

impl Ast {
    #[must_use]
    pub fn concat(lhs: Ast, rhs: Ast) -> Ast {
        Ast::Concat(Box::new(lhs), Box::new(rhs))
    }

    #[must_use]
    pub fn alt(lhs: Ast, rhs: Ast) -> Ast {
        Ast::Alt(Box::new(lhs), Box::new(rhs))
    }

    #[must_use]
    pub fn repeat(inner: Ast, kind: RepeatKind, pos: usize) -> Ast {
        Ast::Repeat(Box::new(inner), kind, pos)
    }

    #[must_use]
    pub fn icase_group(inner: Ast) -> Ast {
        Ast::ICaseGroup(Box::new(inner))
    }
}
