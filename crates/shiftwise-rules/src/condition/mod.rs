//! The rule condition language: a small boolean expression grammar over
//! named facts.
//!
//! ```
//! use shiftwise_rules::condition::{evaluate, parse};
//! use shiftwise_rules::FactContext;
//!
//! let expr = parse("employee.weeklyHours > 48 and not date.isHoliday").unwrap();
//! let ctx = FactContext::new()
//!     .with("employee.weeklyHours", 50)
//!     .with("date.isHoliday", false);
//!
//! let result = evaluate(&expr, &ctx).unwrap();
//! assert!(result.value);
//! assert_eq!(result.consulted, vec!["employee.weeklyHours", "date.isHoliday"]);
//! ```

mod compare;
mod eval;
mod expr;
mod lexer;
mod parser;

#[cfg(test)]
mod tests;

pub use compare::{compare_values, values_equal};
pub use eval::{evaluate, Evaluation};
pub use expr::{CompareOp, Expr};
pub use lexer::{tokenize, Token, TokenKind};
pub use parser::parse;
