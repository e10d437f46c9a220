//! Expression trees for rule conditions.

use std::fmt;

use shiftwise_core::FactValue;

/// Comparison operator of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// A parsed condition.
///
/// Leaves are literals, fact references and literal lists; inner nodes are
/// comparisons, membership tests and the boolean combinators.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(FactValue),
    Fact(String),
    List(Vec<Expr>),
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    In(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    pub fn literal(value: impl Into<FactValue>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn fact(name: &str) -> Self {
        Expr::Fact(name.to_string())
    }

    pub fn compare(op: CompareOp, left: Expr, right: Expr) -> Self {
        Expr::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn is_in(value: Expr, list: Expr) -> Self {
        Expr::In(Box::new(value), Box::new(list))
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::Or(Box::new(left), Box::new(right))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Expr) -> Self {
        Expr::Not(Box::new(inner))
    }

    /// Every fact name the expression references, sorted and deduplicated.
    pub fn referenced_facts(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_facts(&mut out);
        out.sort();
        out.dedup();
        out
    }

    fn collect_facts(&self, out: &mut Vec<String>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Fact(name) => out.push(name.clone()),
            Expr::List(items) => items.iter().for_each(|e| e.collect_facts(out)),
            Expr::Compare { left, right, .. }
            | Expr::In(left, right)
            | Expr::And(left, right)
            | Expr::Or(left, right) => {
                left.collect_facts(out);
                right.collect_facts(out);
            }
            Expr::Not(inner) => inner.collect_facts(out),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::Fact(name) => f.write_str(name),
            Expr::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Expr::Compare { op, left, right } => write!(f, "{} {} {}", left, op.symbol(), right),
            Expr::In(value, list) => write!(f, "{} in {}", value, list),
            Expr::And(l, r) => write!(f, "({} and {})", l, r),
            Expr::Or(l, r) => write!(f, "({} or {})", l, r),
            Expr::Not(inner) => write!(f, "not {}", inner),
        }
    }
}
