use std::fmt;

use log::trace;

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Eof,
    Def,
    Extern,
    Delimiter,
    OpenParen,
    CloseParen,
    Comma,
    Ident(String),
    Operator(char),
    Number(f64),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Eof => write!(f, "end of input"),
            Token::Def => write!(f, "'def'"),
            Token::Extern => write!(f, "'extern'"),
            Token::Delimiter => write!(f, "';'"),
            Token::OpenParen => write!(f, "'('"),
            Token::CloseParen => write!(f, "')'"),
            Token::Comma => write!(f, "','"),
            Token::Ident(name) => write!(f, "identifier '{}'", name),
            Token::Operator(op) => write!(f, "operator '{}'", op),
            Token::Number(num) => write!(f, "number {}", num),
        }
    }
}

#[derive(Debug, PartialEq, Clone, thiserror::Error)]
pub enum LexError {
    #[error("unknown character {0:?}")]
    UnknownCharacter(char),
}

/// C `isspace`: ascii whitespace plus vertical tab. Other unicode spaces are
/// unknown characters, like other non-ascii letters.
fn is_space(c: char) -> bool {
    c.is_ascii_whitespace() || c == '\x0b'
}

/// Pull-based tokenizer over any character source.
///
/// Holds exactly one character of lookahead (`last_char`, `None` once the
/// source is exhausted) so a token can end on the first character that does
/// not belong to it without losing that character.
pub struct Lexer<I> {
    input: I,
    last_char: Option<char>,
}

impl<I: Iterator<Item = char>> Lexer<I> {
    pub fn new(input: I) -> Self {
        Self {
            input,
            last_char: Some(' '),
        }
    }

    /// Produce the next token. An unknown character is consumed before the
    /// error is returned, so calling again resumes right after it.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        let token = self.scan()?;
        trace!("lexed {}", token);
        Ok(token)
    }

    fn bump(&mut self) {
        self.last_char = self.input.next();
    }

    fn scan(&mut self) -> Result<Token, LexError> {
        loop {
            while self.last_char.map_or(false, is_space) {
                self.bump();
            }

            let c = match self.last_char {
                Some(c) => c,
                None => return Ok(Token::Eof),
            };

            if c.is_ascii_alphabetic() {
                return Ok(self.ident_or_keyword());
            }
            if c.is_ascii_digit() {
                return Ok(self.number());
            }
            if c == '#' {
                self.skip_comment();
                continue;
            }

            self.bump();
            return match c {
                '+' | '-' | '*' | '/' | '<' => Ok(Token::Operator(c)),
                '(' => Ok(Token::OpenParen),
                ')' => Ok(Token::CloseParen),
                ',' => Ok(Token::Comma),
                ';' => Ok(Token::Delimiter),
                other => Err(LexError::UnknownCharacter(other)),
            };
        }
    }

    fn ident_or_keyword(&mut self) -> Token {
        let mut ident = String::new();
        while let Some(c) = self.last_char.filter(char::is_ascii_alphanumeric) {
            ident.push(c);
            self.bump();
        }

        match ident.as_str() {
            "def" => Token::Def,
            "extern" => Token::Extern,
            _ => Token::Ident(ident),
        }
    }

    /// `[0-9]+(\.[0-9]*)?`. A trailing `.` with no digits after it is read
    /// as `.0`, so `3.` lexes as `3.0` rather than failing.
    fn number(&mut self) -> Token {
        let mut text = String::new();
        self.take_digits(&mut text);

        if self.last_char == Some('.') {
            text.push('.');
            self.bump();
            if matches!(self.last_char, Some(c) if c.is_ascii_digit()) {
                self.take_digits(&mut text);
            } else {
                text.push('0');
            }
        }

        // only ascii digits around a single '.', always a valid float
        Token::Number(text.parse().unwrap_or_default())
    }

    fn take_digits(&mut self, text: &mut String) {
        while let Some(c) = self.last_char.filter(char::is_ascii_digit) {
            text.push(c);
            self.bump();
        }
    }

    fn skip_comment(&mut self) {
        while !matches!(self.last_char, None | Some('\n') | Some('\r')) {
            self.bump();
        }
    }
}

/// Yields tokens up to, not including, `Eof`. Lexical errors are yielded in
/// place and iteration carries on after the offending character.
impl<I: Iterator<Item = char>> Iterator for Lexer<I> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Ok(Token::Eof) => None,
            res => Some(res),
        }
    }
}

/// lex the whole input, stopping at the first unknown character
pub fn lex(input: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(input.chars()).collect()
}
