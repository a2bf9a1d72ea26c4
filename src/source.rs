//! Character sources for the lexer.
//!
//! Input is read as bytes and decoded lossily: a byte sequence that is not
//! UTF-8 becomes `'\u{FFFD}'`, which the lexer rejects like any other unknown
//! character, so bad bytes cost one construct rather than the whole session.

use std::collections::VecDeque;
use std::io::BufRead;

use log::error;

pub fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Reads `reader` a line at a time, only when the lexer needs more input.
/// With a prompt set, it is written to stderr before each read.
pub struct LineChars<R> {
    reader: R,
    prompt: Option<&'static str>,
    pending: VecDeque<char>,
}

impl<R: BufRead> LineChars<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            prompt: None,
            pending: VecDeque::new(),
        }
    }

    pub fn with_prompt(mut self, prompt: &'static str) -> Self {
        self.prompt = Some(prompt);
        self
    }
}

impl<R: BufRead> Iterator for LineChars<R> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        while self.pending.is_empty() {
            if let Some(prompt) = self.prompt {
                eprint!("{}", prompt);
            }

            let mut line = Vec::new();
            match self.reader.read_until(b'\n', &mut line) {
                Ok(0) => return None,
                Ok(_) => self.pending.extend(decode(&line).chars()),
                Err(e) => {
                    error!("failed to read input: {}", e);
                    return None;
                }
            }
        }
        self.pending.pop_front()
    }
}
