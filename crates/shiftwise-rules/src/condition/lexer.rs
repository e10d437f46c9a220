//! Tokenizer for the condition language.

use shiftwise_core::{Result, ScheduleError};

use super::expr::CompareOp;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Dotted fact path such as `employee.weeklyHours`.
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    True,
    False,
    And,
    Or,
    Not,
    In,
    Op(CompareOp),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    End,
}

/// A token with its source text and byte offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: usize,
}

impl Token {
    /// Text used in syntax errors; `<end>` for the end of input.
    pub fn display(&self) -> &str {
        if self.kind == TokenKind::End {
            "<end>"
        } else {
            &self.text
        }
    }
}

/// Splits `input` into tokens, always ending with [`TokenKind::End`].
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (pos, c) = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let single = |kind: TokenKind| Token {
            kind,
            text: c.to_string(),
            position: pos,
        };

        match c {
            '(' => tokens.push(single(TokenKind::LParen)),
            ')' => tokens.push(single(TokenKind::RParen)),
            '[' => tokens.push(single(TokenKind::LBracket)),
            ']' => tokens.push(single(TokenKind::RBracket)),
            ',' => tokens.push(single(TokenKind::Comma)),
            '=' | '!' | '<' | '>' => {
                let next = chars.get(i + 1).map(|(_, n)| *n);
                let (op, text) = match (c, next) {
                    ('=', Some('=')) => (CompareOp::Eq, "=="),
                    ('=', _) => (CompareOp::Eq, "="),
                    ('!', Some('=')) => (CompareOp::Ne, "!="),
                    ('<', Some('=')) => (CompareOp::Le, "<="),
                    ('<', Some('>')) => (CompareOp::Ne, "<>"),
                    ('<', _) => (CompareOp::Lt, "<"),
                    ('>', Some('=')) => (CompareOp::Ge, ">="),
                    ('>', _) => (CompareOp::Gt, ">"),
                    _ => {
                        return Err(ScheduleError::syntax(
                            "unexpected character",
                            c.to_string(),
                            pos,
                        ))
                    }
                };
                tokens.push(Token {
                    kind: TokenKind::Op(op),
                    text: text.to_string(),
                    position: pos,
                });
                i += text.len();
                continue;
            }
            '\'' | '"' => {
                let quote = c;
                let mut j = i + 1;
                let mut value = String::new();
                while j < chars.len() && chars[j].1 != quote {
                    value.push(chars[j].1);
                    j += 1;
                }
                if j >= chars.len() {
                    let rest: String = chars[i..].iter().map(|(_, ch)| ch).collect();
                    return Err(ScheduleError::syntax("unterminated string", rest, pos));
                }
                let text: String = chars[i..=j].iter().map(|(_, ch)| ch).collect();
                tokens.push(Token {
                    kind: TokenKind::Str(value),
                    text,
                    position: pos,
                });
                i = j + 1;
                continue;
            }
            c if c.is_ascii_digit()
                || (c == '-' && chars.get(i + 1).is_some_and(|(_, n)| n.is_ascii_digit())) =>
            {
                let mut j = i + 1;
                let mut seen_dot = false;
                while j < chars.len() {
                    let ch = chars[j].1;
                    if ch.is_ascii_digit() {
                        j += 1;
                    } else if ch == '.' && !seen_dot {
                        seen_dot = true;
                        j += 1;
                    } else {
                        break;
                    }
                }
                let text: String = chars[i..j].iter().map(|(_, ch)| ch).collect();
                let kind = if seen_dot {
                    text.parse::<f64>()
                        .map(TokenKind::Float)
                        .map_err(|_| ScheduleError::syntax("malformed number", &text, pos))?
                } else {
                    text.parse::<i64>()
                        .map(TokenKind::Int)
                        .map_err(|_| ScheduleError::syntax("integer out of range", &text, pos))?
                };
                tokens.push(Token {
                    kind,
                    text,
                    position: pos,
                });
                i = j;
                continue;
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut j = i + 1;
                while j < chars.len() {
                    let ch = chars[j].1;
                    if ch.is_alphanumeric() || ch == '_' || ch == '.' {
                        j += 1;
                    } else {
                        break;
                    }
                }
                let text: String = chars[i..j].iter().map(|(_, ch)| ch).collect();
                if text.ends_with('.') || text.contains("..") {
                    return Err(ScheduleError::syntax("malformed fact name", text, pos));
                }
                let kind = match text.to_ascii_lowercase().as_str() {
                    "and" => TokenKind::And,
                    "or" => TokenKind::Or,
                    "not" => TokenKind::Not,
                    "in" => TokenKind::In,
                    "true" => TokenKind::True,
                    "false" => TokenKind::False,
                    _ => TokenKind::Ident(text.clone()),
                };
                tokens.push(Token {
                    kind,
                    text,
                    position: pos,
                });
                i = j;
                continue;
            }
            other => {
                return Err(ScheduleError::syntax(
                    "unexpected character",
                    other.to_string(),
                    pos,
                ))
            }
        }
        i += 1;
    }

    tokens.push(Token {
        kind: TokenKind::End,
        text: String::new(),
        position: input.len(),
    });
    Ok(tokens)
}
