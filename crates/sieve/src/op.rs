//! Comparison operators for filter descriptors.
//!
//! An operator token is a base comparison ([`Op`]) with two optional
//! modifiers: a trailing `*` (case-insensitive) and a leading `len`
//! (compare the field's cardinality instead of its content).
//!
//! | Token | Meaning |
//! |-------|---------|
//! | `==` `!=` | equal / not equal |
//! | `>` `<` `>=` `<=` | ordering |
//! | `@=` `!@=` | contains / does not contain |
//! | `_=` `!_=` | starts with / does not start with |
//! | `_-=` `!_-=` | ends with / does not end with |
//! | `len==` ... `len<=` | cardinality comparison |

use std::cmp::Ordering;
use std::fmt;

use crate::error::{Result, SieveError};

/// Base comparison of an operator token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Greater than.
    Gt,
    /// Less than.
    Lt,
    /// Greater than or equal.
    Gte,
    /// Less than or equal.
    Lte,
    /// Substring, or element membership on collections.
    Contains,
    /// String starts with prefix.
    StartsWith,
    /// String ends with suffix.
    EndsWith,
    /// Negated [`Op::Contains`].
    NotContains,
    /// Negated [`Op::StartsWith`].
    NotStartsWith,
    /// Negated [`Op::EndsWith`].
    NotEndsWith,
}

impl Op {
    const TOKENS: [(&'static str, Op); 12] = [
        ("==", Op::Eq),
        ("!=", Op::Ne),
        (">=", Op::Gte),
        ("<=", Op::Lte),
        (">", Op::Gt),
        ("<", Op::Lt),
        ("@=", Op::Contains),
        ("_=", Op::StartsWith),
        ("_-=", Op::EndsWith),
        ("!@=", Op::NotContains),
        ("!_=", Op::NotStartsWith),
        ("!_-=", Op::NotEndsWith),
    ];

    /// Looks up a bare token (no modifiers).
    pub fn from_token(token: &str) -> Option<Op> {
        Self::TOKENS
            .iter()
            .find(|(t, _)| *t == token)
            .map(|(_, op)| *op)
    }

    /// Returns the token for this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "==",
            Op::Ne => "!=",
            Op::Gt => ">",
            Op::Lt => "<",
            Op::Gte => ">=",
            Op::Lte => "<=",
            Op::Contains => "@=",
            Op::StartsWith => "_=",
            Op::EndsWith => "_-=",
            Op::NotContains => "!@=",
            Op::NotStartsWith => "!_=",
            Op::NotEndsWith => "!_-=",
        }
    }

    /// Returns `true` for `==`, `!=` and the four ordering operators.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Op::Eq | Op::Ne | Op::Gt | Op::Lt | Op::Gte | Op::Lte
        )
    }

    /// Returns `true` for the ordering operators `>`, `<`, `>=`, `<=`.
    pub fn is_ordering(self) -> bool {
        matches!(self, Op::Gt | Op::Lt | Op::Gte | Op::Lte)
    }

    /// Returns `true` for the contains/starts/ends family, negated or not.
    pub fn is_text(self) -> bool {
        !self.is_comparison()
    }

    /// Whether the `*` suffix may follow this operator.
    fn folds_case(self) -> bool {
        !self.is_ordering()
    }

    /// Evaluates a comparison operator given an ordering result.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            Op::Eq => ordering == Ordering::Equal,
            Op::Ne => ordering != Ordering::Equal,
            Op::Gt => ordering == Ordering::Greater,
            Op::Gte => ordering != Ordering::Less,
            Op::Lt => ordering == Ordering::Less,
            Op::Lte => ordering != Ordering::Greater,
            _ => false,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the per-value predicates of one descriptor are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
    /// All values must match.
    And,
    /// At least one value must match.
    Or,
}

/// A parsed operator token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Operator {
    /// The base comparison.
    pub op: Op,
    /// `*` suffix: both sides are case-folded before comparing.
    pub case_insensitive: bool,
    /// `len` prefix: compare the field's cardinality.
    pub length: bool,
}

impl Operator {
    /// Creates a plain operator without modifiers.
    pub fn new(op: Op) -> Self {
        Operator {
            op,
            case_insensitive: false,
            length: false,
        }
    }

    /// Parses an operator token.
    ///
    /// Surrounding whitespace is ignored and the `len` prefix is matched
    /// case-insensitively.
    pub fn parse(token: &str) -> Result<Operator> {
        let invalid = || SieveError::InvalidOperator(token.to_string());
        let trimmed = token.trim();

        let (length, rest) = match trimmed.get(..3) {
            Some(prefix) if is_length_token(prefix) => (true, &trimmed[3..]),
            _ => (false, trimmed),
        };

        let (case_insensitive, base) = match rest.strip_suffix('*') {
            Some(base) => (true, base),
            None => (false, rest),
        };

        let op = Op::from_token(base).ok_or_else(invalid)?;

        if length && (case_insensitive || !op.is_comparison()) {
            return Err(invalid());
        }
        if case_insensitive && !op.folds_case() {
            return Err(invalid());
        }

        Ok(Operator {
            op,
            case_insensitive,
            length,
        })
    }

    /// Returns how multiple values combine.
    ///
    /// Excluding several values means excluding each of them, so negated
    /// equality is AND-combined. Every other operator matches any value.
    pub fn combine(&self) -> Combine {
        match self.op {
            Op::Ne => Combine::And,
            _ => Combine::Or,
        }
    }
}

impl Default for Operator {
    fn default() -> Self {
        Operator::new(Op::Eq)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.length {
            f.write_str("len")?;
        }
        f.write_str(self.op.as_str())?;
        if self.case_insensitive {
            f.write_str("*")?;
        }
        Ok(())
    }
}

/// Returns `true` if `token` carries the `len` cardinality prefix.
pub(crate) fn is_length_token(token: &str) -> bool {
    token
        .trim()
        .get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("len"))
}
