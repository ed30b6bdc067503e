use std::fmt;

use crate::syntax::ast::{Ast, ClassSet, WHITESPACE};
use crate::syntax::lexer::{Lexer, Token, TokenKind};

/// An error that occurred while parsing a pattern.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    offset: usize,
}

/// The kind of parse error that occurred.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// A token was left over after the whole expression was parsed, e.g. the
    /// stray `)` in `ab)`.
    UnexpectedToken,
    /// A `(` with no matching `)`.
    UnclosedGroup,
    /// A `[` with no matching `]`.
    UnclosedClass,
    /// `[]` or `[^]`.
    EmptyClass,
    /// A range `X-Y` with `Y` before `X` in code point order.
    InvalidRange { start: char, end: char },
    /// A token that cannot appear inside a character class, e.g. `[a[b]`.
    InvalidClassToken,
}

impl Error {
    fn new(kind: ErrorKind, offset: usize) -> Error {
        Error { kind, offset }
    }

    /// Return the kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// The 0-based code point offset into the pattern where the error was
    /// detected.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            ErrorKind::UnexpectedToken => {
                write!(f, "unexpected token at offset {}", self.offset)
            }
            ErrorKind::UnclosedGroup => {
                write!(f, "unmatched '(' at offset {}", self.offset)
            }
            ErrorKind::UnclosedClass => {
                write!(f, "unmatched '[' at offset {}", self.offset)
            }
            ErrorKind::EmptyClass => {
                write!(f, "empty character class at offset {}", self.offset)
            }
            ErrorKind::InvalidRange { start, end } => write!(
                f,
                "invalid character range {:?}-{:?} at offset {}",
                start, end, self.offset,
            ),
            ErrorKind::InvalidClassToken => write!(
                f,
                "invalid token in character class at offset {}",
                self.offset,
            ),
        }
    }
}

/// Parse a pattern into its AST.
///
/// This is a convenience for `Parser::new(pattern).parse()`.
pub fn parse(pattern: &str) -> Result<Ast, Error> {
    Parser::new(pattern).parse()
}

/// A recursive descent parser for the pattern grammar.
///
/// Precedence, highest to lowest: grouping, atoms, quantifiers,
/// concatenation, alternation.
///
/// ```text
/// expr        := concat ('|' concat)*
/// concat      := quantified+
/// quantified  := atom ('*' | '+' | '?')?
/// atom        := literal | escape | '.' | '(' expr ')' | class
/// class       := '[' '^'? item+ ']'
/// item        := char ('-' char)?
/// ```
///
/// `^`, `-` and `]` outside a class are accepted as literals.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(pattern: &str) -> Parser {
        Parser { tokens: Lexer::new(pattern).tokenize(), pos: 0 }
    }

    pub fn parse(mut self) -> Result<Ast, Error> {
        if self.at_end() {
            return Ok(Ast::empty());
        }
        let ast = self.expr()?;
        if !self.at_end() {
            return Err(Error::new(
                ErrorKind::UnexpectedToken,
                self.current().offset,
            ));
        }
        Ok(ast)
    }

    fn expr(&mut self) -> Result<Ast, Error> {
        let first = self.concat()?;
        if !self.check(TokenKind::Pipe) {
            return Ok(first);
        }
        let mut branches = vec![first];
        while self.eat(TokenKind::Pipe) {
            branches.push(self.concat()?);
        }
        Ok(Ast::Alternation(branches))
    }

    fn concat(&mut self) -> Result<Ast, Error> {
        let mut items = Vec::new();
        while !self.at_end()
            && !self.check(TokenKind::Pipe)
            && !self.check(TokenKind::CloseParen)
        {
            match self.quantified()? {
                Some(item) => items.push(item),
                None => break,
            }
        }
        Ok(match items.len() {
            // An empty concat (e.g. the branches of `a||b`) matches the
            // empty string.
            0 => Ast::empty(),
            1 => items.pop().expect("one item"),
            _ => Ast::Concat(items),
        })
    }

    fn quantified(&mut self) -> Result<Option<Ast>, Error> {
        let atom = match self.atom()? {
            None => return Ok(None),
            Some(atom) => atom,
        };
        let quantified = if self.eat(TokenKind::Star) {
            Ast::Star(Box::new(atom))
        } else if self.eat(TokenKind::Plus) {
            Ast::Plus(Box::new(atom))
        } else if self.eat(TokenKind::Question) {
            Ast::Question(Box::new(atom))
        } else {
            atom
        };
        Ok(Some(quantified))
    }

    fn atom(&mut self) -> Result<Option<Ast>, Error> {
        if self.at_end()
            || self.check(TokenKind::CloseParen)
            || self.check(TokenKind::Pipe)
            || self.check(TokenKind::Star)
            || self.check(TokenKind::Plus)
            || self.check(TokenKind::Question)
        {
            return Ok(None);
        }
        let token = self.current();
        let ast = match token.kind {
            TokenKind::Literal => {
                self.advance();
                Ast::Literal(token.ch)
            }
            TokenKind::Dot => {
                self.advance();
                Ast::AnyChar
            }
            TokenKind::Tab => {
                self.advance();
                Ast::Tab
            }
            TokenKind::Whitespace => {
                self.advance();
                Ast::Whitespace
            }
            TokenKind::Escaped => {
                self.advance();
                Ast::Escaped(token.ch)
            }
            TokenKind::OpenBracket => self.class()?,
            TokenKind::OpenParen => self.group()?,
            // Outside a class these lex as metacharacters but parse as
            // literals.
            TokenKind::Caret => {
                self.advance();
                Ast::Literal('^')
            }
            TokenKind::Hyphen => {
                self.advance();
                Ast::Literal('-')
            }
            TokenKind::CloseBracket => {
                self.advance();
                Ast::Literal(']')
            }
            _ => {
                return Err(Error::new(
                    ErrorKind::UnexpectedToken,
                    token.offset,
                ))
            }
        };
        Ok(Some(ast))
    }

    fn group(&mut self) -> Result<Ast, Error> {
        let open = self.current().offset;
        self.advance(); // '('
        let inner = self.expr()?;
        if !self.eat(TokenKind::CloseParen) {
            return Err(Error::new(ErrorKind::UnclosedGroup, open));
        }
        Ok(Ast::Group(Box::new(inner)))
    }

    fn class(&mut self) -> Result<Ast, Error> {
        let open = self.current().offset;
        self.advance(); // '['
        let negated = self.eat(TokenKind::Caret);
        if self.check(TokenKind::CloseBracket) {
            return Err(Error::new(ErrorKind::EmptyClass, open));
        }
        let mut set = ClassSet::new();
        while !self.at_end() && !self.check(TokenKind::CloseBracket) {
            self.class_item(&mut set)?;
        }
        if !self.eat(TokenKind::CloseBracket) {
            return Err(Error::new(ErrorKind::UnclosedClass, open));
        }
        Ok(if negated { Ast::NegatedClass(set) } else { Ast::Class(set) })
    }

    /// Parses one class member: a single character or a range `X-Y`.
    fn class_item(&mut self, set: &mut ClassSet) -> Result<(), Error> {
        // `\s` contributes the whole whitespace set and is never the start
        // of a range.
        if self.check(TokenKind::Whitespace) {
            self.advance();
            set.extend(WHITESPACE.iter().copied());
            return Ok(());
        }
        let item_offset = self.current().offset;
        let first = self.class_char()?;
        // A `-` that is last before `]` is a literal member, not a range.
        if self.check(TokenKind::Hyphen)
            && !self.next_is(TokenKind::CloseBracket)
        {
            self.advance(); // '-'
            let last = self.class_char()?;
            if last < first {
                return Err(Error::new(
                    ErrorKind::InvalidRange { start: first, end: last },
                    item_offset,
                ));
            }
            let range = (first as u32)..=(last as u32);
            set.extend(range.filter_map(char::from_u32));
        } else {
            set.insert(first);
        }
        Ok(())
    }

    /// A single character inside a class. Metacharacter tokens contribute
    /// their source character; `\t` contributes a tab; `\s` as a range
    /// endpoint reads as a single space.
    fn class_char(&mut self) -> Result<char, Error> {
        let token = self.current();
        match token.kind {
            TokenKind::Literal
            | TokenKind::Escaped
            | TokenKind::Caret
            | TokenKind::Hyphen
            | TokenKind::Star
            | TokenKind::Plus
            | TokenKind::Question
            | TokenKind::Pipe
            | TokenKind::Dot
            | TokenKind::OpenParen
            | TokenKind::CloseParen => {
                self.advance();
                Ok(token.ch)
            }
            TokenKind::Tab => {
                self.advance();
                Ok('\t')
            }
            TokenKind::Whitespace => {
                self.advance();
                Ok(' ')
            }
            TokenKind::Eof => {
                Err(Error::new(ErrorKind::UnclosedClass, token.offset))
            }
            TokenKind::OpenBracket | TokenKind::CloseBracket => {
                Err(Error::new(ErrorKind::InvalidClassToken, token.offset))
            }
        }
    }

    fn at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    fn current(&self) -> Token {
        self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn next_is(&self, kind: TokenKind) -> bool {
        match self.tokens.get(self.pos + 1) {
            None => kind == TokenKind::Eof,
            Some(token) => token.kind == kind,
        }
    }

    fn advance(&mut self) {
        if !self.at_end() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::syntax::ast::Ast::*;

    fn set(chars: &str) -> ClassSet {
        chars.chars().collect()
    }

    #[test]
    fn single_literal() {
        assert_eq!(Literal('a'), parse("a").unwrap());
    }

    #[test]
    fn concat_is_flat() {
        assert_eq!(
            Concat(vec![Literal('a'), Literal('b'), Literal('c')]),
            parse("abc").unwrap(),
        );
    }

    #[test]
    fn unicode_literals() {
        assert_eq!(
            Concat(vec![Literal('α'), Literal('β')]),
            parse("αβ").unwrap(),
        );
    }

    #[test]
    fn empty_pattern_is_sentinel() {
        assert_eq!(Ast::empty(), parse("").unwrap());
    }

    #[test]
    fn escapes() {
        assert_eq!(Tab, parse(r"\t").unwrap());
        assert_eq!(Whitespace, parse(r"\s").unwrap());
        assert_eq!(Escaped('\\'), parse(r"\\").unwrap());
        assert_eq!(Escaped('.'), parse(r"\.").unwrap());
        assert_eq!(Escaped('\n'), parse(r"\n").unwrap());
    }

    #[test]
    fn dot_and_quantifiers() {
        assert_eq!(AnyChar, parse(".").unwrap());
        assert_eq!(Star(Box::new(Literal('a'))), parse("a*").unwrap());
        assert_eq!(Plus(Box::new(AnyChar)), parse(".+").unwrap());
        assert_eq!(Question(Box::new(Literal('a'))), parse("a?").unwrap());
    }

    #[test]
    fn quantifier_binds_to_preceding_atom() {
        assert_eq!(
            Concat(vec![Literal('a'), Star(Box::new(Literal('b')))]),
            parse("ab*").unwrap(),
        );
    }

    #[test]
    fn alternation_is_flat() {
        assert_eq!(
            Alternation(vec![Literal('a'), Literal('b'), Literal('c')]),
            parse("a|b|c").unwrap(),
        );
    }

    #[test]
    fn alternation_with_empty_branch() {
        assert_eq!(
            Alternation(vec![Literal('a'), Ast::empty()]),
            parse("a|").unwrap(),
        );
    }

    #[test]
    fn groups() {
        assert_eq!(
            Group(Box::new(Concat(vec![Literal('a'), Literal('b')]))),
            parse("(ab)").unwrap(),
        );
        assert_eq!(
            Plus(Box::new(Group(Box::new(Concat(vec![
                Literal('a'),
                Literal('b'),
            ]))))),
            parse("(ab)+").unwrap(),
        );
    }

    #[test]
    fn simple_class() {
        assert_eq!(Class(set("abc")), parse("[abc]").unwrap());
    }

    #[test]
    fn negated_class() {
        assert_eq!(NegatedClass(set("abc")), parse("[^abc]").unwrap());
    }

    #[test]
    fn ranges_enumerate() {
        match parse("[a-z]").unwrap() {
            Class(s) => {
                assert_eq!(26, s.len());
                assert!(s.contains(&'a') && s.contains(&'m') && s.contains(&'z'));
            }
            ast => panic!("expected class, got {:?}", ast),
        }
        match parse("[a-zA-Z]").unwrap() {
            Class(s) => assert_eq!(52, s.len()),
            ast => panic!("expected class, got {:?}", ast),
        }
        match parse("[a-z0-9_]").unwrap() {
            Class(s) => assert_eq!(37, s.len()),
            ast => panic!("expected class, got {:?}", ast),
        }
    }

    #[test]
    fn unicode_range_enumerates_intermediate_code_points() {
        match parse("[α-γ]").unwrap() {
            Class(s) => {
                assert_eq!(3, s.len());
                assert!(s.contains(&'β'));
            }
            ast => panic!("expected class, got {:?}", ast),
        }
    }

    #[test]
    fn hyphen_at_class_edges_is_literal() {
        assert_eq!(Class(set("a-")), parse("[a-]").unwrap());
    }

    #[test]
    fn metacharacters_inside_class_are_literal_members() {
        assert_eq!(Class(set("*+?|.()")), parse("[*+?|.()]").unwrap());
    }

    #[test]
    fn whitespace_escape_inside_class_expands() {
        match parse(r"[\sx]").unwrap() {
            Class(s) => {
                assert_eq!(7, s.len());
                assert!(s.contains(&' '));
                assert!(s.contains(&'\t'));
                assert!(s.contains(&'\n'));
                assert!(s.contains(&'x'));
            }
            ast => panic!("expected class, got {:?}", ast),
        }
    }

    #[test]
    fn caret_hyphen_bracket_outside_class_are_literals() {
        assert_eq!(Literal('^'), parse("^").unwrap());
        assert_eq!(Literal('-'), parse("-").unwrap());
        assert_eq!(Literal(']'), parse("]").unwrap());
    }

    #[test]
    fn unclosed_group() {
        let err = parse("(ab").unwrap_err();
        assert_eq!(&ErrorKind::UnclosedGroup, err.kind());
        assert_eq!(0, err.offset());
    }

    #[test]
    fn unclosed_class() {
        let err = parse("x[ab").unwrap_err();
        assert_eq!(&ErrorKind::UnclosedClass, err.kind());
        assert_eq!(1, err.offset());
    }

    #[test]
    fn empty_class() {
        let err = parse("[]").unwrap_err();
        assert_eq!(&ErrorKind::EmptyClass, err.kind());
        let err = parse("[^]").unwrap_err();
        assert_eq!(&ErrorKind::EmptyClass, err.kind());
    }

    #[test]
    fn descending_range() {
        let err = parse("[z-a]").unwrap_err();
        assert_eq!(
            &ErrorKind::InvalidRange { start: 'z', end: 'a' },
            err.kind(),
        );
        assert_eq!(1, err.offset());
    }

    #[test]
    fn trailing_tokens_rejected() {
        let err = parse("ab)").unwrap_err();
        assert_eq!(&ErrorKind::UnexpectedToken, err.kind());
        assert_eq!(2, err.offset());
    }

    #[test]
    fn open_bracket_inside_class_rejected() {
        let err = parse("[a[b]").unwrap_err();
        assert_eq!(&ErrorKind::InvalidClassToken, err.kind());
    }

    #[test]
    fn errors_display_their_offset() {
        let err = parse("(a").unwrap_err();
        assert_eq!("unmatched '(' at offset 0", err.to_string());
    }
}
