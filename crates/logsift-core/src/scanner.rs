//! A small C-family lexical scanner used as a generic tokenizer for log text.
//!
//! It does not try to be faithful to any language. It splits text into
//! identifiers, numbers, quoted literals, bracket delimiters, punctuation and
//! operators so the extractor can find `name = value` shapes and nesting
//! in free-form log bodies. The scanner never fails: bytes it does not
//! recognise come out as [`TokenKind::Other`].
//!
//! A newline that follows an identifier, a literal or a
//! closing bracket produces an automatic `;` token whose literal is `"\n"`.
//! Comments are not recognised, so `//` inside URLs stays ordinary text.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bracket {
    Paren,
    Square,
    Curly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Ident,
    Int,
    Float,
    Char,
    String,
    Open(Bracket),
    Close(Bracket),
    Colon,
    Comma,
    Period,
    Semicolon,
    Operator,
    Other,
}

impl TokenKind {
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::Int | TokenKind::Float | TokenKind::Char | TokenKind::String
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Exact source text. Quoted literals keep their quotes.
    pub lit: &'a str,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, lit: &'a str) -> Self {
        Self { kind, lit }
    }
}

// Longest first within each leading character.
const OPERATORS: &[&str] = &[
    "<<=", ">>=", "&^=", "...", "&&", "||", "<-", "++", "--", "==", "!=", "<=", ">=", ":=",
    "<<", ">>", "&^", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "->", "+", "-", "*",
    "/", "%", "&", "|", "^", "<", ">", "=", "!", "~",
];

pub struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    insert_semi: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            insert_semi: false,
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn scan_number(&mut self) -> TokenKind {
        if self.rest().starts_with("0x") || self.rest().starts_with("0X") {
            if self.peek_nth(2).is_some_and(|c| c.is_ascii_hexdigit()) {
                self.pos += 2;
                self.eat_while(|c| c.is_ascii_hexdigit());
                return TokenKind::Int;
            }
        }

        let mut kind = TokenKind::Int;
        self.eat_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') {
            self.pos += 1;
            self.eat_while(|c| c.is_ascii_digit());
            kind = TokenKind::Float;
        }
        if self.scan_exponent() {
            kind = TokenKind::Float;
        }
        kind
    }

    fn scan_exponent(&mut self) -> bool {
        if !matches!(self.peek(), Some('e' | 'E')) {
            return false;
        }
        let digits_at = match self.peek_nth(1) {
            Some('+' | '-') => 2,
            _ => 1,
        };
        if !self.peek_nth(digits_at).is_some_and(|c| c.is_ascii_digit()) {
            return false;
        }
        self.pos += digits_at;
        self.eat_while(|c| c.is_ascii_digit());
        true
    }

    /// Quoted literal. `raw` literals ignore escapes and may span lines;
    /// the others stop at an unescaped newline.
    fn scan_quoted(&mut self, quote: char, raw: bool) {
        self.pos += quote.len_utf8();
        while let Some(c) = self.peek() {
            if c == quote {
                self.pos += 1;
                return;
            }
            if c == '\n' && !raw {
                return;
            }
            self.pos += c.len_utf8();
            if c == '\\' && !raw {
                if let Some(next) = self.peek() {
                    if next != '\n' {
                        self.pos += next.len_utf8();
                    }
                }
            }
        }
    }

    fn scan_operator(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let op = OPERATORS.iter().find(|op| rest.starts_with(**op))?;
        self.pos += op.len();
        Some(&rest[..op.len()])
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r') => self.pos += 1,
                Some('\n') => {
                    let at = self.pos;
                    self.pos += 1;
                    if self.insert_semi {
                        self.insert_semi = false;
                        return Some(Token::new(TokenKind::Semicolon, &self.src[at..at + 1]));
                    }
                }
                Some(_) => break,
                None => {
                    if self.insert_semi {
                        self.insert_semi = false;
                        return Some(Token::new(TokenKind::Semicolon, "\n"));
                    }
                    return None;
                }
            }
        }

        let start = self.pos;
        let c = self.peek()?;
        let kind = if c.is_alphabetic() || c == '_' {
            self.eat_while(|c| c.is_alphanumeric() || c == '_');
            TokenKind::Ident
        } else if c.is_ascii_digit() {
            self.scan_number()
        } else if c == '.' && self.peek_nth(1).is_some_and(|d| d.is_ascii_digit()) {
            self.pos += 1;
            self.eat_while(|c| c.is_ascii_digit());
            self.scan_exponent();
            TokenKind::Float
        } else if c == '"' {
            self.scan_quoted('"', false);
            TokenKind::String
        } else if c == '`' {
            self.scan_quoted('`', true);
            TokenKind::String
        } else if c == '\'' {
            self.scan_quoted('\'', false);
            TokenKind::Char
        } else {
            let single = match c {
                '(' => Some(TokenKind::Open(Bracket::Paren)),
                '[' => Some(TokenKind::Open(Bracket::Square)),
                '{' => Some(TokenKind::Open(Bracket::Curly)),
                ')' => Some(TokenKind::Close(Bracket::Paren)),
                ']' => Some(TokenKind::Close(Bracket::Square)),
                '}' => Some(TokenKind::Close(Bracket::Curly)),
                ',' => Some(TokenKind::Comma),
                ';' => Some(TokenKind::Semicolon),
                ':' if self.peek_nth(1) != Some('=') => Some(TokenKind::Colon),
                '.' if !self.rest().starts_with("...") => Some(TokenKind::Period),
                _ => None,
            };
            match single {
                Some(kind) => {
                    self.pos += 1;
                    kind
                }
                None if self.scan_operator().is_some() => TokenKind::Operator,
                None => {
                    self.bump();
                    TokenKind::Other
                }
            }
        };

        self.insert_semi = kind.is_literal()
            || matches!(kind, TokenKind::Ident | TokenKind::Close(_))
            || matches!(&self.src[start..self.pos], "++" | "--");

        Some(Token::new(kind, &self.src[start..self.pos]))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
