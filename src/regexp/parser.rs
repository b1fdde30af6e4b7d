//! Recursive-descent parser: token stream to [`Ast`].
//!
//! Grammar (§4.5): `regex := union`; `union := concat ('|' concat)*`;
//! `concat := repeat+`; `repeat := atom ('*' | '+' | '?' | '{m,n}')*`;
//! `atom := literal | '.' | class | binary | '(' ('?i:')? union ')'`.
//! Structurally the same shape as the teacher's `parse_alt`/`parse_concat`/
//! `parse_repeat`/`parse_atom` descent, with one more atom-starting token
//! kind (`Class`, `Binary`) and a second repeat-token kind (`Repeat{..}`)
//! besides `*`/`+`/`?`.

use crate::errors::{ParseError, ParseErrorKind};

use super::ast::{Ast, RepeatKind};
use super::tokens::{Token, TokenKind};

/// Converts a token stream into an [`Ast`].
pub fn parse(tokens: &[Token]) -> Result<Ast, ParseError> {
    let mut parser = Parser::new(tokens);
    let ast = parser.parse_regex()?;
    parser.expect_eos()?;
    Ok(ast)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn parse_regex(&mut self) -> Result<Ast, ParseError> {
        self.parse_alt()
    }

    /// `concat ('|' concat)*`
    fn parse_alt(&mut self) -> Result<Ast, ParseError> {
        let mut node = self.parse_concat()?;
        while self.matches_or() {
            let rhs = self.parse_concat()?;
            node = Ast::alt(node, rhs);
        }
        Ok(node)
    }

    /// One or more repeat-atoms, implicitly concatenated.
    fn parse_concat(&mut self) -> Result<Ast, ParseError> {
        let mut nodes = Vec::new();
        while self.can_start_atom() {
            nodes.push(self.parse_repeat()?);
        }
        match nodes.len() {
            0 => {
                if self.peek_is_postfix() {
                    Err(self.error_here(ParseErrorKind::MisplacedPostfix))
                } else {
                    Err(self.error_here(ParseErrorKind::EmptyAlternative))
                }
            }
            1 => Ok(nodes.remove(0)),
            _ => Ok(chain_concat(nodes)),
        }
    }

    /// `atom ('*' | '+' | '?' | '{m,n}')*`
    fn parse_repeat(&mut self) -> Result<Ast, ParseError> {
        let mut node = self.parse_atom()?;
        loop {
            let pos = self.peek().map(|t| t.pos).unwrap_or_else(|| self.last_pos());
            let kind = match self.peek_kind() {
                Some(TokenKind::Star) => RepeatKind::Star,
                Some(TokenKind::Plus) => RepeatKind::Plus,
                Some(TokenKind::QMark) => RepeatKind::Opt,
                Some(TokenKind::Repeat { min, max, exact }) => RepeatKind::Count { min, max, exact },
                _ => break,
            };
            self.advance();
            node = Ast::repeat(node, kind, pos);
        }
        Ok(node)
    }

    fn can_start_atom(&self) -> bool {
        matches!(
            self.peek_kind(),
            Some(TokenKind::Literal(_))
                | Some(TokenKind::Dot)
                | Some(TokenKind::Class(_))
                | Some(TokenKind::Binary(_))
                | Some(TokenKind::LParen)
                | Some(TokenKind::LParenICase)
        )
    }

    fn peek_is_postfix(&self) -> bool {
        matches!(
            self.peek_kind(),
            Some(TokenKind::Star) | Some(TokenKind::Plus) | Some(TokenKind::QMark) | Some(TokenKind::Repeat { .. })
        )
    }

    /// `literal | '.' | class | binary | '(' ('?i:')? union ')'`
    fn parse_atom(&mut self) -> Result<Ast, ParseError> {
        let Some(tok) = self.advance() else {
            return Err(self.error_here(ParseErrorKind::UnexpectedEos));
        };

        match tok.kind.clone() {
            TokenKind::Literal(b) => Ok(Ast::Literal(b)),
            TokenKind::Dot => Ok(Ast::Dot),
            TokenKind::Class(atom) => Ok(Ast::Class {
                class: atom.class,
                neg: atom.neg,
                pos: tok.pos,
            }),
            TokenKind::Binary(pat) => Ok(Ast::Binary(pat, tok.pos)),
            TokenKind::LParen => {
                let node = self.parse_regex()?;
                self.expect(|k| matches!(k, TokenKind::RParen), ParseErrorKind::MissingRParen)?;
                Ok(node)
            }
            TokenKind::LParenICase => {
                let node = self.parse_regex()?;
                self.expect(|k| matches!(k, TokenKind::RParen), ParseErrorKind::MissingRParen)?;
                Ok(Ast::icase_group(node))
            }
            TokenKind::RParen => Err(ParseError::new(
                tok.pos,
                ParseErrorKind::UnexpectedToken {
                    found: tok.kind.describe(),
                },
            )),
            TokenKind::Eos => Err(ParseError::new(tok.pos, ParseErrorKind::UnexpectedEos)),
            other => Err(ParseError::new(
                tok.pos,
                ParseErrorKind::UnexpectedToken {
                    found: other.describe(),
                },
            )),
        }
    }

    fn matches_or(&mut self) -> bool {
        if matches!(self.peek_kind(), Some(TokenKind::Or)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, pred: impl Fn(&TokenKind) -> bool, kind: ParseErrorKind) -> Result<(), ParseError> {
        if self.peek().is_some_and(|t| pred(&t.kind)) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error_here(kind))
        }
    }

    fn expect_eos(&mut self) -> Result<(), ParseError> {
        match self.peek_kind() {
            Some(TokenKind::Eos) => Ok(()),
            Some(other) => Err(self.error_here(ParseErrorKind::UnexpectedToken {
                found: other.describe(),
            })),
            None => Err(self.error_here(ParseErrorKind::UnexpectedEos)),
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind.clone())
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let tok = self.peek();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn error_here(&self, kind: ParseErrorKind) -> ParseError {
        let pos = self.peek().map(|t| t.pos).unwrap_or_else(|| self.last_pos());
        ParseError::new(pos, kind)
    }

    fn last_pos(&self) -> usize {
        self.tokens.last().map(|t| t.pos).unwrap_or_default()
    }
}

fn chain_concat(nodes: Vec<Ast>) -> Ast {
    let mut it = nodes.into_iter();
    let mut acc = it.next().expect("chain_concat requires a non-empty vector");
    for node in it {
        acc = Ast::concat(acc, node);
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regexp::lexer::lex;

    fn parse_str(s: &str) -> Ast {
        let tokens = lex(s.as_bytes()).unwrap();
        parse(&tokens).unwrap()
    }

    #[test]
    fn parses_alternation() {
        assert!(matches!(parse_str("a|b"), Ast::Alt(_, _)));
    }

    #[test]
    fn parses_concat() {
        assert!(matches!(parse_str("ab"), Ast::Concat(_, _)));
    }

    #[test]
    fn parses_star() {
        assert!(matches!(parse_str("a*"), Ast::Repeat(_, RepeatKind::Star, _)));
    }

    #[test]
    fn parses_grouping() {
        let ast = parse_str("(a|b)c");
        assert!(matches!(ast, Ast::Concat(_, _)));
    }

    #[test]
    fn parses_icase_group() {
        assert!(matches!(parse_str("(?i:ab)"), Ast::ICaseGroup(_)));
    }

    #[test]
    fn parses_repeat_count() {
        let ast = parse_str("a{2,4}");
        assert!(matches!(
            ast,
            Ast::Repeat(_, RepeatKind::Count { min: 2, max: Some(4), exact: false }, _)
        ));
    }

    #[test]
    fn empty_alternative_errors() {
        let tokens = lex(b"a|").unwrap();
        let err = parse(&tokens).unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::EmptyAlternative));
    }

    #[test]
    fn missing_rparen_errors() {
        let tokens = lex(b"(a").unwrap();
        let err = parse(&tokens).unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::MissingRParen));
    }

    #[test]
    fn misplaced_postfix_errors() {
        let tokens = lex(b"*a").unwrap();
        let err = parse(&tokens).unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::MisplacedPostfix));
    }
}
