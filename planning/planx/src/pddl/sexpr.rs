use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::errors::{Message, Span, Spanned};
use crate::pddl::input::Input;
use crate::utils::disp_iter;
use crate::{Res, Sym, normalize};

pub type SAtom = Sym;

/// An s-expression where each element is annotated with its location in the source.
#[derive(Clone, Debug, PartialEq)]
pub enum SExpr {
    Atom(SAtom),
    List(SList),
}

#[derive(Clone, Debug)]
pub struct SList {
    list: Vec<SExpr>,
    span: Span,
}

impl PartialEq for SList {
    fn eq(&self, other: &Self) -> bool {
        self.list == other.list
    }
}

impl SList {
    pub fn iter(&self) -> ListIter<'_> {
        ListIter {
            elems: self.list.as_slice(),
            span: &self.span,
        }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

impl Spanned for SList {
    fn span(&self) -> Option<&Span> {
        Some(&self.span)
    }
}

impl Display for SList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        disp_iter(f, self.list.iter(), " ")?;
        write!(f, ")")
    }
}

impl SExpr {
    pub fn as_atom(&self) -> Option<&SAtom> {
        match self {
            SExpr::Atom(a) => Some(a),
            SExpr::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&SList> {
        match self {
            SExpr::Atom(_) => None,
            SExpr::List(l) => Some(l),
        }
    }

    pub fn as_list_iter(&self) -> Option<ListIter<'_>> {
        self.as_list().map(|l| l.iter())
    }

    pub fn is_atom(&self, expected: &str) -> bool {
        self.as_atom().is_some_and(|a| a.canonical_str() == expected)
    }

    /// If this expression is of the form `(head a b c)`, returns the arguments `[a b c]`.
    pub fn as_application(&self, head: &str) -> Option<&[SExpr]> {
        match self {
            SExpr::List(l) => match l.list.first() {
                Some(SExpr::Atom(h)) if h.canonical_str() == head => Some(&l.list[1..]),
                _ => None,
            },
            SExpr::Atom(_) => None,
        }
    }
}

impl Spanned for SExpr {
    fn span(&self) -> Option<&Span> {
        match self {
            SExpr::Atom(a) => a.span.as_ref(),
            SExpr::List(l) => Some(&l.span),
        }
    }
}

impl Display for SExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SExpr::Atom(a) => write!(f, "{a}"),
            SExpr::List(l) => write!(f, "{l}"),
        }
    }
}

/// Cursor over the elements of a list, used to consume a list element by element.
#[derive(Clone)]
pub struct ListIter<'a> {
    elems: &'a [SExpr],
    span: &'a Span,
}

impl<'a> ListIter<'a> {
    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn peek(&self) -> Option<&'a SExpr> {
        self.elems.first()
    }

    /// Location of the entire list being iterated on.
    pub fn loc(&self) -> Span {
        self.span.clone()
    }

    pub fn pop(&mut self) -> Res<&'a SExpr> {
        self.next()
            .ok_or_else(|| self.span.clone().end().invalid("Unexpected end of list"))
    }

    pub fn pop_known_atom(&mut self, expected: &str) -> Res<()> {
        match self.next() {
            None => Err(self
                .span
                .clone()
                .end()
                .invalid(format!("Expected atom `{expected}` but got end of list"))),
            Some(sexpr) => {
                let atom = sexpr
                    .as_atom()
                    .ok_or_else(|| sexpr.invalid(format!("Expected atom `{expected}`")))?;
                if atom.canonical_str() == expected {
                    Ok(())
                } else {
                    Err(atom.invalid(format!("Expected atom `{expected}`")))
                }
            }
        }
    }

    pub fn pop_atom(&mut self) -> Res<&'a SAtom> {
        match self.next() {
            None => Err(self.span.clone().end().invalid("Expected an atom but got end of list")),
            Some(sexpr) => sexpr.as_atom().ok_or_else(|| sexpr.invalid("Expected an atom")),
        }
    }

    pub fn pop_list(&mut self) -> Res<&'a SList> {
        match self.next() {
            None => Err(self.span.clone().end().invalid("Expected a list but got end of list")),
            Some(sexpr) => sexpr.as_list().ok_or_else(|| sexpr.invalid("Expected a list")),
        }
    }
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a SExpr;

    fn next(&mut self) -> Option<Self::Item> {
        let (first, rest) = self.elems.split_first()?;
        self.elems = rest;
        Some(first)
    }
}

/* ========================================================================== */
/*                                   Reading                                  */
/* ========================================================================== */

#[derive(Debug, PartialEq, Clone, Copy)]
enum TokenKind {
    Sym,
    LParen,
    RParen,
}

/// A token, as a range of bytes `start..=end` in the source.
#[derive(Debug, Clone, Copy)]
struct Token {
    kind: TokenKind,
    start: usize,
    end: usize,
}

fn tokenize(s: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    // first and last byte of the symbol being read, if any
    let mut cur: Option<(usize, usize)> = None;
    let mut chars = s.char_indices().peekable();
    while let Some((i, n)) = chars.next() {
        let separator = n == ';' || n.is_whitespace() || n == '(' || n == ')';
        if separator {
            if let Some((start, end)) = cur.take() {
                tokens.push(Token {
                    kind: TokenKind::Sym,
                    start,
                    end,
                });
            }
        }
        match n {
            ';' => {
                // comment: drop all chars until the end of line
                while chars.next_if(|(_, c)| *c != '\n').is_some() {}
            }
            '(' => tokens.push(Token {
                kind: TokenKind::LParen,
                start: i,
                end: i,
            }),
            ')' => tokens.push(Token {
                kind: TokenKind::RParen,
                start: i,
                end: i,
            }),
            _ if n.is_whitespace() => {}
            _ => {
                let last = i + n.len_utf8() - 1;
                cur = match cur {
                    Some((start, _)) => Some((start, last)),
                    None => Some((i, last)),
                };
            }
        }
    }
    if let Some((start, end)) = cur {
        tokens.push(Token {
            kind: TokenKind::Sym,
            start,
            end,
        });
    }
    tokens
}

fn read(tokens: &mut std::iter::Peekable<std::slice::Iter<Token>>, src: &Arc<Input>) -> Res<SExpr> {
    match tokens.next() {
        Some(tok) if tok.kind == TokenKind::Sym => {
            let span = Span::new(src.clone(), tok.start, tok.end);
            // PDDL is case insensitive
            let canonical = normalize(span.str());
            Ok(SExpr::Atom(Sym::with_source(canonical, span)))
        }
        Some(tok) if tok.kind == TokenKind::LParen => {
            let start = tok.start;
            let mut es = Vec::new();
            loop {
                match tokens.peek() {
                    Some(t) if t.kind == TokenKind::RParen => {
                        let end = t.end;
                        tokens.next();
                        return Ok(SExpr::List(SList {
                            list: es,
                            span: Span::new(src.clone(), start, end),
                        }));
                    }
                    Some(_) => es.push(read(tokens, src)?),
                    None => {
                        return Err(Span::new(src.clone(), start, start).invalid("Unclosed parenthesis"));
                    }
                }
            }
        }
        Some(tok) => Err(Span::new(src.clone(), tok.start, tok.end).invalid("Unexpected closing parenthesis")),
        None => Err(Message::error("Unexpected end of input")),
    }
}

/// Parses a single s-expression, and fails if anything else than comments follows it.
pub fn parse(src: Arc<Input>) -> Res<SExpr> {
    let tokens = tokenize(&src.text);
    let mut tokens = tokens.iter().peekable();
    let e = read(&mut tokens, &src)?;
    match tokens.next() {
        None => Ok(e),
        Some(tok) => Err(Span::new(src.clone(), tok.start, tok.end).invalid("Unexpected input after expression")),
    }
}

/// Parses a sequence of s-expressions, e.g., the actions of a plan file.
pub fn parse_many(src: Arc<Input>) -> Res<Vec<SExpr>> {
    let tokens = tokenize(&src.text);
    let mut tokens = tokens.iter().peekable();
    let mut res = Vec::new();
    while tokens.peek().is_some() {
        res.push(read(&mut tokens, &src)?);
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(s: &str) -> Res<SExpr> {
        parse(Arc::new(Input::from_string(s)))
    }

    #[test]
    fn lower_cases_and_strips_comments() -> Res<()> {
        let e = parse_str("(At-Robby ; where is the robot\n RoomA)")?;
        assert_eq!(e.to_string(), "(At-Robby RoomA)");
        let args = e.as_application("at-robby").ok_or_else(|| Message::error("not an application"))?;
        assert_eq!(args.len(), 1);
        assert!(args[0].is_atom("rooma"));
        assert_eq!(args[0].loc().str(), "RoomA");
        Ok(())
    }

    #[test]
    fn nested_lists() -> Res<()> {
        let e = parse_str("(and (a ?x) (not (b)) ())")?;
        let mut l = e.as_list_iter().ok_or_else(|| Message::error("expected list"))?;
        l.pop_known_atom("and")?;
        assert_eq!(l.len(), 3);
        let first = l.pop_list()?;
        assert_eq!(first.loc().str(), "(a ?x)");
        assert!(l.pop_atom().is_err());
        assert!(l.pop_list()?.is_empty());
        assert!(l.pop().is_err());
        Ok(())
    }

    #[test]
    fn syntax_errors() {
        assert!(parse_str("(a (b)").is_err());
        assert!(parse_str("(a))").is_err());
        assert!(parse_str("(a) (b)").is_err());
        assert!(parse_str("").is_err());
    }

    #[test]
    fn sequences() -> Res<()> {
        let plan = parse_many(Arc::new(Input::from_string(
            "(move rooma roomb)\n(move roomb rooma)\n; cost = 2 (unit cost)\n",
        )))?;
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[1].to_string(), "(move roomb rooma)");
        Ok(())
    }
}
