/// The kind of a single token.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenKind {
    Literal,
    Dot,
    Star,
    Plus,
    Question,
    Pipe,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Caret,
    Hyphen,
    /// `\t`.
    Tab,
    /// `\s`.
    Whitespace,
    /// Any `\x` escape other than `\t`/`\s`, carrying its literal value.
    Escaped,
    Eof,
}

/// A token, its source character and its offset into the pattern.
///
/// Tokens are transient: they exist only while the parser runs. `offset` is
/// a 0-based code point index; for an escape it points at the backslash.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub ch: char,
    pub offset: usize,
}

impl Token {
    fn new(kind: TokenKind, ch: char, offset: usize) -> Token {
        Token { kind, ch, offset }
    }
}

/// Splits a pattern into tokens. Tokenization never fails: unknown escapes
/// pass through as `Escaped` and a trailing backslash becomes a literal.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    pub fn new(pattern: &str) -> Lexer {
        Lexer { chars: pattern.chars().collect(), pos: 0 }
    }

    /// Tokenizes the entire pattern. The result always ends with `Eof`.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::with_capacity(self.chars.len() + 1);
        while self.pos < self.chars.len() {
            tokens.push(self.next_token());
        }
        tokens.push(Token::new(TokenKind::Eof, '\0', self.pos));
        tokens
    }

    fn next_token(&mut self) -> Token {
        let offset = self.pos;
        let ch = self.chars[self.pos];
        self.pos += 1;
        let kind = match ch {
            '\\' => return self.escape(offset),
            '.' => TokenKind::Dot,
            '*' => TokenKind::Star,
            '+' => TokenKind::Plus,
            '?' => TokenKind::Question,
            '|' => TokenKind::Pipe,
            '(' => TokenKind::OpenParen,
            ')' => TokenKind::CloseParen,
            '[' => TokenKind::OpenBracket,
            ']' => TokenKind::CloseBracket,
            '^' => TokenKind::Caret,
            '-' => TokenKind::Hyphen,
            _ => TokenKind::Literal,
        };
        Token::new(kind, ch, offset)
    }

    /// Lexes the character after a backslash. `offset` is the offset of the
    /// backslash itself.
    fn escape(&mut self, offset: usize) -> Token {
        if self.pos >= self.chars.len() {
            // Trailing backslash: a literal, not an error.
            return Token::new(TokenKind::Literal, '\\', offset);
        }
        let ch = self.chars[self.pos];
        self.pos += 1;
        match ch {
            't' => Token::new(TokenKind::Tab, '\t', offset),
            's' => Token::new(TokenKind::Whitespace, ' ', offset),
            'n' => Token::new(TokenKind::Escaped, '\n', offset),
            'r' => Token::new(TokenKind::Escaped, '\r', offset),
            // Escaped metacharacters and every unrecognized escape carry the
            // character through literally.
            _ => Token::new(TokenKind::Escaped, ch, offset),
        }
    }
}
