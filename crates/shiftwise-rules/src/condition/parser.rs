//! Recursive-descent parser for the condition language.
//!
//! ```text
//! condition  := or_expr
//! or_expr    := and_expr ("or" and_expr)*
//! and_expr   := unary ("and" unary)*
//! unary      := "not" unary | primary
//! primary    := "(" or_expr ")" | operand [ cmp_op operand | "in" list ]
//! operand    := fact | literal
//! list       := "[" [ literal ("," literal)* ] "]"
//! ```

use shiftwise_core::{FactValue, Result, ScheduleError};

use super::expr::Expr;
use super::lexer::{tokenize, Token, TokenKind};

/// Parses a condition string into an expression tree.
///
/// # Errors
///
/// Returns [`ScheduleError::Syntax`] naming the offending token and its
/// byte offset.
pub fn parse(input: &str) -> Result<Expr> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    if parser.peek().kind == TokenKind::End {
        return Err(ScheduleError::syntax("empty condition", "<end>", 0));
    }
    let expr = parser.or_expr()?;
    let trailing = parser.peek();
    if trailing.kind != TokenKind::End {
        return Err(ScheduleError::syntax(
            "unexpected trailing input",
            trailing.display(),
            trailing.position,
        ));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // tokenize always terminates the stream with End
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: &str) -> ScheduleError {
        let token = self.peek();
        ScheduleError::syntax(message, token.display(), token.position)
    }

    fn or_expr(&mut self) -> Result<Expr> {
        let mut left = self.and_expr()?;
        while self.peek().kind == TokenKind::Or {
            self.advance();
            let right = self.and_expr()?;
            left = Expr::or(left, right);
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr> {
        let mut left = self.unary()?;
        while self.peek().kind == TokenKind::And {
            self.advance();
            let right = self.unary()?;
            left = Expr::and(left, right);
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.peek().kind == TokenKind::Not {
            self.advance();
            return Ok(Expr::not(self.unary()?));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr> {
        if self.peek().kind == TokenKind::LParen {
            self.advance();
            let inner = self.or_expr()?;
            if self.peek().kind != TokenKind::RParen {
                return Err(self.error("expected ')'"));
            }
            self.advance();
            return Ok(inner);
        }

        let left = self.operand()?;
        match self.peek().kind.clone() {
            TokenKind::Op(op) => {
                self.advance();
                let right = self.operand()?;
                Ok(Expr::compare(op, left, right))
            }
            TokenKind::In => {
                self.advance();
                let list = self.list()?;
                Ok(Expr::is_in(left, list))
            }
            _ => Ok(left),
        }
    }

    fn operand(&mut self) -> Result<Expr> {
        if let TokenKind::Ident(name) = &self.peek().kind {
            let name = name.clone();
            self.advance();
            return Ok(Expr::Fact(name));
        }
        match self.literal()? {
            Some(value) => Ok(Expr::Literal(value)),
            None => Err(self.error("expected a fact name or literal")),
        }
    }

    fn literal(&mut self) -> Result<Option<FactValue>> {
        let value = match &self.peek().kind {
            TokenKind::Int(v) => FactValue::Int(*v),
            TokenKind::Float(v) => FactValue::Float(*v),
            TokenKind::Str(s) => FactValue::Str(s.clone()),
            TokenKind::True => FactValue::Bool(true),
            TokenKind::False => FactValue::Bool(false),
            _ => return Ok(None),
        };
        self.advance();
        Ok(Some(value))
    }

    fn list(&mut self) -> Result<Expr> {
        if self.peek().kind != TokenKind::LBracket {
            return Err(self.error("expected '[' after 'in'"));
        }
        self.advance();
        let mut items = Vec::new();
        if self.peek().kind == TokenKind::RBracket {
            self.advance();
            return Ok(Expr::List(items));
        }
        loop {
            match self.literal()? {
                Some(value) => items.push(Expr::Literal(value)),
                None => return Err(self.error("expected a literal list element")),
            }
            match self.peek().kind.clone() {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::RBracket => {
                    self.advance();
                    return Ok(Expr::List(items));
                }
                _ => return Err(self.error("expected ',' or ']'")),
            }
        }
    }
}
