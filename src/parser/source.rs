// Splits Python source into logical lines

use super::SyntaxError;
use std::iter::Peekable;
use std::str::Chars;

/// One logical statement line with indentation and comments removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    /// 1-based physical line the statement starts on
    pub line: usize,
    pub text: String,
}

struct Splitter<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    start_line: usize,
    current: String,
    brackets: Vec<(char, usize)>,
    lines: Vec<LogicalLine>,
}

/// Split source into logical lines.
///
/// Bracketed expressions and backslash continuations are joined into a single
/// line, `;` separates statements, and string literal contents are replaced by
/// an empty literal so they cannot be mistaken for code.
pub fn logical_lines(source: &str) -> Result<Vec<LogicalLine>, SyntaxError> {
    let mut splitter = Splitter {
        chars: source.chars().peekable(),
        line: 1,
        start_line: 1,
        current: String::new(),
        brackets: Vec::new(),
        lines: Vec::new(),
    };
    splitter.run()?;
    Ok(splitter.lines)
}

impl<'a> Splitter<'a> {
    fn run(&mut self) -> Result<(), SyntaxError> {
        while let Some(c) = self.chars.next() {
            match c {
                '#' => self.skip_comment(),
                '\'' | '"' => self.string_literal(c)?,
                '(' | '[' | '{' => {
                    self.brackets.push((c, self.line));
                    self.current.push(c);
                }
                ')' | ']' | '}' => self.close_bracket(c)?,
                '\\' => self.backslash(),
                '\r' => {}
                '\n' => {
                    self.line += 1;
                    if self.brackets.is_empty() {
                        self.flush();
                    } else {
                        self.current.push(' ');
                    }
                }
                ';' if self.brackets.is_empty() => self.flush(),
                _ => self.current.push(c),
            }
        }

        if let Some((open, line)) = self.brackets.first() {
            return Err(SyntaxError::new(*line, format!("'{}' was never closed", open)));
        }
        self.flush();
        Ok(())
    }

    fn flush(&mut self) {
        let text = self.current.trim();
        if !text.is_empty() {
            self.lines.push(LogicalLine {
                line: self.start_line,
                text: text.to_string(),
            });
        }
        self.current.clear();
        self.start_line = self.line;
    }

    fn skip_comment(&mut self) {
        while self.chars.next_if(|c| *c != '\n').is_some() {}
    }

    fn close_bracket(&mut self, close: char) -> Result<(), SyntaxError> {
        let expected = match close {
            ')' => '(',
            ']' => '[',
            _ => '{',
        };
        match self.brackets.pop() {
            Some((open, _)) if open == expected => {
                self.current.push(close);
                Ok(())
            }
            Some((open, _)) => Err(SyntaxError::new(
                self.line,
                format!("closing '{}' does not match '{}'", close, open),
            )),
            None => Err(SyntaxError::new(self.line, format!("unmatched '{}'", close))),
        }
    }

    fn backslash(&mut self) {
        self.chars.next_if_eq(&'\r');
        if self.chars.next_if_eq(&'\n').is_some() {
            self.line += 1;
            self.current.push(' ');
        } else {
            self.current.push('\\');
        }
    }

    fn string_literal(&mut self, quote: char) -> Result<(), SyntaxError> {
        let start = self.line;
        let triple = if self.chars.next_if_eq(&quote).is_some() {
            if self.chars.next_if_eq(&quote).is_none() {
                // Empty literal
                self.push_literal(quote);
                return Ok(());
            }
            true
        } else {
            false
        };

        let mut run = 0;
        loop {
            let c = match self.chars.next() {
                Some(c) => c,
                None => {
                    let kind = if triple { "triple-quoted string" } else { "string" };
                    return Err(SyntaxError::new(start, format!("unterminated {} literal", kind)));
                }
            };
            match c {
                '\\' => {
                    run = 0;
                    self.chars.next_if_eq(&'\r');
                    if self.chars.next() == Some('\n') {
                        self.line += 1;
                    }
                }
                '\n' if !triple => {
                    return Err(SyntaxError::new(start, "unterminated string literal"));
                }
                '\n' => {
                    run = 0;
                    self.line += 1;
                }
                c if c == quote => {
                    run += 1;
                    if !triple || run == 3 {
                        break;
                    }
                }
                _ => run = 0,
            }
        }

        self.push_literal(quote);
        Ok(())
    }

    fn push_literal(&mut self, quote: char) {
        self.current.push(quote);
        self.current.push(quote);
    }
}
