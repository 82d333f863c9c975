//! Parameter expressions with on-the-fly constant folding.
//!
//! Every constructor folds constant sub-trees immediately, so a tree that
//! contains no symbolic identifiers is always a single [`Expr::Number`]
//! node. Symbols survive until [`Expr::substitute`] replaces them, at which
//! point folding is re-applied bottom-up.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

use crate::error::{IrError, IrResult};

/// A unary function applicable inside a parameter expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryFn {
    Sin,
    Cos,
    Tan,
    Exp,
    Ln,
    Sqrt,
}

impl UnaryFn {
    fn apply(self, v: f64) -> f64 {
        match self {
            UnaryFn::Sin => v.sin(),
            UnaryFn::Cos => v.cos(),
            UnaryFn::Tan => v.tan(),
            UnaryFn::Exp => v.exp(),
            UnaryFn::Ln => v.ln(),
            UnaryFn::Sqrt => v.sqrt(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            UnaryFn::Sin => "sin",
            UnaryFn::Cos => "cos",
            UnaryFn::Tan => "tan",
            UnaryFn::Exp => "exp",
            UnaryFn::Ln => "ln",
            UnaryFn::Sqrt => "sqrt",
        }
    }
}

/// A parameter expression tree. Nodes own their children uniquely;
/// substitution clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A folded numeric value.
    Number(f64),
    /// A symbolic identifier.
    Id(String),
    /// Unary minus around a symbolic sub-tree.
    Sign(Box<Expr>),
    /// Addition.
    Plus(Box<Expr>, Box<Expr>),
    /// Subtraction.
    Minus(Box<Expr>, Box<Expr>),
    /// Multiplication.
    Times(Box<Expr>, Box<Expr>),
    /// Division.
    Div(Box<Expr>, Box<Expr>),
    /// Exponentiation.
    Power(Box<Expr>, Box<Expr>),
    /// A unary function applied to a symbolic sub-tree.
    Unary(UnaryFn, Box<Expr>),
}

impl Expr {
    /// The machine value of π as a folded number.
    pub fn pi() -> Self {
        Expr::Number(PI)
    }

    /// Create a symbolic identifier node.
    pub fn id(name: impl Into<String>) -> Self {
        Expr::Id(name.into())
    }

    /// Addition, folding when both operands are numbers.
    pub fn plus(a: Expr, b: Expr) -> Expr {
        match (a, b) {
            (Expr::Number(x), Expr::Number(y)) => Expr::Number(x + y),
            (a, b) => Expr::Plus(Box::new(a), Box::new(b)),
        }
    }

    /// Subtraction, folding when both operands are numbers.
    pub fn minus(a: Expr, b: Expr) -> Expr {
        match (a, b) {
            (Expr::Number(x), Expr::Number(y)) => Expr::Number(x - y),
            (a, b) => Expr::Minus(Box::new(a), Box::new(b)),
        }
    }

    /// Multiplication, folding when both operands are numbers.
    pub fn times(a: Expr, b: Expr) -> Expr {
        match (a, b) {
            (Expr::Number(x), Expr::Number(y)) => Expr::Number(x * y),
            (a, b) => Expr::Times(Box::new(a), Box::new(b)),
        }
    }

    /// Division, folding when both operands are numbers.
    pub fn div(a: Expr, b: Expr) -> Expr {
        match (a, b) {
            (Expr::Number(x), Expr::Number(y)) => Expr::Number(x / y),
            (a, b) => Expr::Div(Box::new(a), Box::new(b)),
        }
    }

    /// Exponentiation, folding when both operands are numbers.
    pub fn power(a: Expr, b: Expr) -> Expr {
        match (a, b) {
            (Expr::Number(x), Expr::Number(y)) => Expr::Number(x.powf(y)),
            (a, b) => Expr::Power(Box::new(a), Box::new(b)),
        }
    }

    /// Unary minus. Numbers are negated in place, anything else is wrapped
    /// in a [`Expr::Sign`] node.
    pub fn neg(e: Expr) -> Expr {
        match e {
            Expr::Number(v) => Expr::Number(-v),
            e => Expr::Sign(Box::new(e)),
        }
    }

    /// Apply a unary function, folding when the operand is a number.
    pub fn unary(f: UnaryFn, e: Expr) -> Expr {
        match e {
            Expr::Number(v) => Expr::Number(f.apply(v)),
            e => Expr::Unary(f, Box::new(e)),
        }
    }

    /// Whether this expression is a single folded number.
    pub fn is_number(&self) -> bool {
        matches!(self, Expr::Number(_))
    }

    /// The folded value, if this is a number node.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Expr::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Replace identifiers according to `env`, re-applying the folding rule
    /// bottom-up. Identifiers without a binding survive unchanged.
    pub fn substitute(&self, env: &FxHashMap<String, Expr>) -> Expr {
        match self {
            Expr::Number(v) => Expr::Number(*v),
            Expr::Id(name) => env.get(name).cloned().unwrap_or_else(|| self.clone()),
            Expr::Sign(e) => Expr::neg(e.substitute(env)),
            Expr::Plus(a, b) => Expr::plus(a.substitute(env), b.substitute(env)),
            Expr::Minus(a, b) => Expr::minus(a.substitute(env), b.substitute(env)),
            Expr::Times(a, b) => Expr::times(a.substitute(env), b.substitute(env)),
            Expr::Div(a, b) => Expr::div(a.substitute(env), b.substitute(env)),
            Expr::Power(a, b) => Expr::power(a.substitute(env), b.substitute(env)),
            Expr::Unary(f, e) => Expr::unary(*f, e.substitute(env)),
        }
    }

    /// Evaluate to a real number. Defined iff no identifier remains.
    pub fn evaluate(&self) -> IrResult<f64> {
        match self {
            Expr::Number(v) => Ok(*v),
            Expr::Id(name) => Err(IrError::UnresolvedIdentifier(name.clone())),
            Expr::Sign(e) => Ok(-e.evaluate()?),
            Expr::Plus(a, b) => Ok(a.evaluate()? + b.evaluate()?),
            Expr::Minus(a, b) => Ok(a.evaluate()? - b.evaluate()?),
            Expr::Times(a, b) => Ok(a.evaluate()? * b.evaluate()?),
            Expr::Div(a, b) => Ok(a.evaluate()? / b.evaluate()?),
            Expr::Power(a, b) => Ok(a.evaluate()?.powf(b.evaluate()?)),
            Expr::Unary(f, e) => Ok(f.apply(e.evaluate()?)),
        }
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Number(value)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(v) => write!(f, "{v}"),
            Expr::Id(name) => write!(f, "{name}"),
            Expr::Sign(e) => write!(f, "-({e})"),
            Expr::Plus(a, b) => write!(f, "({a} + {b})"),
            Expr::Minus(a, b) => write!(f, "({a} - {b})"),
            Expr::Times(a, b) => write!(f, "({a} * {b})"),
            Expr::Div(a, b) => write!(f, "({a} / {b})"),
            Expr::Power(a, b) => write!(f, "({a} ^ {b})"),
            Expr::Unary(func, e) => write!(f, "{}({e})", func.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_folding() {
        // (2 + 3) * 4 folds to a single number at construction time
        let e = Expr::times(
            Expr::plus(Expr::Number(2.0), Expr::Number(3.0)),
            Expr::Number(4.0),
        );
        assert_eq!(e, Expr::Number(20.0));
    }

    #[test]
    fn test_pi_folds() {
        let e = Expr::div(Expr::pi(), Expr::Number(2.0));
        assert_eq!(e.as_number(), Some(PI / 2.0));
    }

    #[test]
    fn test_neg_number_in_place() {
        assert_eq!(Expr::neg(Expr::Number(1.5)), Expr::Number(-1.5));
        assert!(matches!(Expr::neg(Expr::id("x")), Expr::Sign(_)));
    }

    #[test]
    fn test_unary_fold() {
        let e = Expr::unary(UnaryFn::Cos, Expr::Number(0.0));
        assert_eq!(e, Expr::Number(1.0));
        let s = Expr::unary(UnaryFn::Sin, Expr::id("theta"));
        assert!(!s.is_number());
    }

    #[test]
    fn test_symbols_survive() {
        let e = Expr::plus(Expr::id("theta"), Expr::Number(1.0));
        assert!(!e.is_number());
        assert!(matches!(e.evaluate(), Err(IrError::UnresolvedIdentifier(_))));
    }

    #[test]
    fn test_substitution_collapses() {
        // theta / 2 with theta = pi collapses to a number
        let e = Expr::div(Expr::id("theta"), Expr::Number(2.0));
        let mut env = FxHashMap::default();
        env.insert("theta".to_string(), Expr::pi());
        let s = e.substitute(&env);
        assert_eq!(s.as_number(), Some(PI / 2.0));
    }

    #[test]
    fn test_substitution_matches_direct_evaluation() {
        // substitute-then-evaluate equals evaluating with the env applied
        let e = Expr::minus(
            Expr::times(Expr::id("a"), Expr::Number(3.0)),
            Expr::unary(UnaryFn::Sqrt, Expr::id("b")),
        );
        let mut env = FxHashMap::default();
        env.insert("a".to_string(), Expr::Number(2.0));
        env.insert("b".to_string(), Expr::Number(9.0));
        let v = e.substitute(&env).evaluate().unwrap();
        assert!((v - (6.0 - 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_unbound_symbol_survives_substitution() {
        let e = Expr::plus(Expr::id("a"), Expr::id("b"));
        let mut env = FxHashMap::default();
        env.insert("a".to_string(), Expr::Number(1.0));
        let s = e.substitute(&env);
        assert!(matches!(s.evaluate(), Err(IrError::UnresolvedIdentifier(ref n)) if n == "b"));
    }
}
