//! Lexer (tokenizer) for the netlist format.

use crate::error::{HilError, Result};

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The token's text
    pub text: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

/// Token types in the netlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Element name, keyword or ground alias
    Identifier,
    /// A number, possibly signed and with a unit suffix
    Number,
    /// A directive (starts with '.')
    Directive,
    /// Open parenthesis '('
    OpenParen,
    /// Close parenthesis ')'
    CloseParen,
    /// Newline
    Newline,
    /// End of file
    Eof,
}

/// Lexer for tokenizing netlist input.
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments();

        let (line, column) = (self.line, self.column);
        let Some(&ch) = self.chars.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                text: String::new(),
                line,
                column,
            });
        };

        let (kind, text) = match ch {
            '\n' => {
                self.advance();
                (TokenKind::Newline, "\n".to_string())
            }
            '.' => {
                self.advance();
                (TokenKind::Directive, format!(".{}", self.read_identifier()))
            }
            '(' => {
                self.advance();
                (TokenKind::OpenParen, "(".to_string())
            }
            ')' => {
                self.advance();
                (TokenKind::CloseParen, ")".to_string())
            }
            '-' | '+' | '0'..='9' => (TokenKind::Number, self.read_number()),
            _ if ch.is_alphabetic() || ch == '_' => (TokenKind::Identifier, self.read_identifier()),
            _ => {
                return Err(HilError::lexer(line, column, format!("unexpected character '{}'", ch)));
            }
        };

        Ok(Token {
            kind,
            text,
            line,
            column,
        })
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if matches!(ch, ' ' | '\t' | '\r' | ',') {
                self.advance();
            } else if ch == '#' || ch == ';' || ch == '*' {
                // Skip comment until end of line
                while let Some(&c) = self.chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut text = String::new();
        while let Some(&ch) = self.chars.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        text
    }

    fn read_digits(&mut self, text: &mut String) {
        while let Some(&ch) = self.chars.peek() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self) -> String {
        let mut text = String::new();

        if let Some(&(sign @ ('-' | '+'))) = self.chars.peek() {
            text.push(sign);
            self.advance();
        }

        self.read_digits(&mut text);

        if let Some(&'.') = self.chars.peek() {
            text.push('.');
            self.advance();
            self.read_digits(&mut text);
        }

        if let Some(&(e @ ('e' | 'E'))) = self.chars.peek() {
            text.push(e);
            self.advance();
            if let Some(&(sign @ ('-' | '+'))) = self.chars.peek() {
                text.push(sign);
                self.advance();
            }
            self.read_digits(&mut text);
        }

        // Unit suffix (p, n, u, m, k, M, G)
        if let Some(&ch) = self.chars.peek() {
            if is_unit_suffix(ch) {
                text.push(ch);
                self.advance();
            }
        }

        text
    }
}

fn is_unit_suffix(ch: char) -> bool {
    matches!(ch, 'p' | 'n' | 'u' | 'µ' | 'm' | 'k' | 'K' | 'M' | 'G')
}

/// Parse a number string with optional unit suffix.
pub fn parse_value(text: &str) -> Option<f64> {
    let text = text.trim();
    let last = text.chars().last()?;

    let multiplier = match last {
        'p' => 1e-12,
        'n' => 1e-9,
        'u' | 'µ' => 1e-6,
        'm' => 1e-3,
        'k' | 'K' => 1e3,
        'M' => 1e6,
        'G' => 1e9,
        _ => return text.parse::<f64>().ok(),
    };

    text[..text.len() - last.len_utf8()]
        .parse::<f64>()
        .ok()
        .map(|v| v * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token().unwrap();
            out.push(tok.kind);
            if tok.kind == TokenKind::Eof {
                return out;
            }
        }
    }

    #[test]
    fn test_parse_value() {
        assert_relative_eq!(parse_value("10k").unwrap(), 10_000.0);
        assert_relative_eq!(parse_value("100n").unwrap(), 100e-9);
        assert_relative_eq!(parse_value("4.7u").unwrap(), 4.7e-6);
        assert_relative_eq!(parse_value("1M").unwrap(), 1_000_000.0);
        assert_relative_eq!(parse_value("-2.2").unwrap(), -2.2);
        assert_relative_eq!(parse_value("1e-9").unwrap(), 1e-9);
        assert!(parse_value("").is_none());
        assert!(parse_value("abc").is_none());
    }

    #[test]
    fn test_lexer_element_line() {
        use TokenKind::*;
        assert_eq!(
            kinds("R1 1 2 10k"),
            vec![Identifier, Number, Number, Number, Eof]
        );
    }

    #[test]
    fn test_lexer_source_and_comment() {
        use TokenKind::*;
        assert_eq!(
            kinds("V1 1 0 SIN(0, 10, 50, 0) ; phase A\n.probe v(1)"),
            vec![
                Identifier, Number, Number, Identifier, OpenParen, Number, Number, Number, Number,
                CloseParen, Newline, Directive, Identifier, OpenParen, Number, CloseParen, Eof
            ]
        );
    }

    #[test]
    fn test_lexer_positions() {
        let mut lexer = Lexer::new("\n  .circuit 2 1u");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Newline);
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.text, ".circuit");
        assert_eq!((tok.line, tok.column), (2, 3));
    }

    #[test]
    fn test_lexer_rejects_stray_character() {
        let mut lexer = Lexer::new("R1 1 @");
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        assert!(matches!(
            lexer.next_token(),
            Err(HilError::LexerError { line: 1, column: 6, .. })
        ));
    }
}
