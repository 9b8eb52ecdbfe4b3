// BgpSynth: Synthesizing BGP Route-Map Policies
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! # Symbolic Values
//!
//! A [`Value`] is either a known constant or an unknown backed by a solver term. Both variants
//! carry a term, such that they can be combined freely. Combining values keeps track of
//! concreteness: a result is only concrete if it is fully determined by concrete operands. The
//! terms are never constant-folded, only the concreteness flag is propagated.

use super::context::SolverContext;
use super::domain::Domains;
use super::types::{DecodeError, DomainError};
use crate::smt::{ModelValue, Sort, Term};

use std::fmt;

/// Type which can be represented as a solver term.
pub trait SmtType: Clone + PartialEq + fmt::Debug + Sized {
    /// Sort of the type. Fails if the type ranges over an empty domain.
    fn sort(domains: &Domains) -> Result<Sort, DomainError>;

    /// Literal term of a concrete value. Fails if the value is not a member of its domain.
    fn literal(&self, domains: &Domains) -> Result<Term, DomainError>;

    /// Convert a model value back into the type.
    fn from_model(value: ModelValue, domains: &Domains) -> Option<Self>;
}

impl SmtType for bool {
    fn sort(_: &Domains) -> Result<Sort, DomainError> {
        Ok(Sort::Bool)
    }

    fn literal(&self, _: &Domains) -> Result<Term, DomainError> {
        Ok(Term::bool(*self))
    }

    fn from_model(value: ModelValue, _: &Domains) -> Option<Self> {
        match value {
            ModelValue::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl SmtType for i64 {
    fn sort(_: &Domains) -> Result<Sort, DomainError> {
        Ok(Sort::Int)
    }

    fn literal(&self, _: &Domains) -> Result<Term, DomainError> {
        Ok(Term::int(*self))
    }

    fn from_model(value: ModelValue, _: &Domains) -> Option<Self> {
        match value {
            ModelValue::Int(i) => Some(i),
            _ => None,
        }
    }
}

/// Symbolic value of type `T`
#[derive(Debug, Clone, PartialEq)]
pub enum Value<T> {
    /// The value is known
    Concrete {
        /// The known value
        value: T,
        /// Literal term of the value
        term: Term,
    },
    /// The value is decided by the solver
    Symbolic(Term),
}

/// Symbolic boolean
pub type BoolValue = Value<bool>;
/// Symbolic integer
pub type IntValue = Value<i64>;

impl<T: SmtType> Value<T> {
    pub(crate) fn from_parts(value: T, term: Term) -> Self {
        Self::Concrete { value, term }
    }

    pub(crate) fn symbolic(term: Term) -> Self {
        Self::Symbolic(term)
    }

    /// Returns true if the value is known without consulting the solver
    pub fn is_concrete(&self) -> bool {
        matches!(self, Self::Concrete { .. })
    }

    /// Returns the known value, or `None` if the value is symbolic.
    pub fn concrete(&self) -> Option<&T> {
        match self {
            Self::Concrete { value, .. } => Some(value),
            Self::Symbolic(_) => None,
        }
    }

    /// Solver term of the value
    pub fn term(&self) -> &Term {
        match self {
            Self::Concrete { term, .. } => term,
            Self::Symbolic(term) => term,
        }
    }

    /// Get the concrete value. Symbolic values are evaluated under the model bound to the
    /// context.
    pub fn get(&self, ctx: &SolverContext) -> Result<T, DecodeError> {
        match self {
            Self::Concrete { value, .. } => Ok(value.clone()),
            Self::Symbolic(term) => {
                let model = ctx.model().ok_or(DecodeError::NoModel)?;
                let value =
                    model.eval(term).ok_or_else(|| DecodeError::Unresolved(term.to_string()))?;
                T::from_model(value, ctx.domains()).ok_or(DecodeError::SortMismatch(value))
            }
        }
    }

    /// Symbolic equality. The result is concrete if both sides are concrete.
    pub fn equals(&self, other: &Self) -> BoolValue {
        let term = self.term().eq(other.term());
        match (self.concrete(), other.concrete()) {
            (Some(a), Some(b)) => Value::from_parts(a == b, term),
            _ => Value::symbolic(term),
        }
    }

    /// `if cond then then_ else else_`. A concrete condition selects the branch. If both branches
    /// are the same, the condition is dropped.
    pub fn ite(cond: &BoolValue, then_: &Self, else_: &Self) -> Self {
        match cond.concrete() {
            Some(true) => then_.clone(),
            Some(false) => else_.clone(),
            None if then_ == else_ => then_.clone(),
            None => Value::symbolic(Term::ite(cond.term(), then_.term(), else_.term())),
        }
    }
}

impl Value<bool> {
    /// Concrete boolean
    pub fn constant(value: bool) -> Self {
        Value::from_parts(value, Term::bool(value))
    }

    /// Conjunction. Concrete if all operands are concrete, or if any operand is concretely
    /// false.
    pub fn and(values: &[BoolValue]) -> BoolValue {
        let term = Term::and(values.iter().map(|v| v.term().clone()).collect());
        if values.iter().any(|v| v.concrete() == Some(&false)) {
            Value::from_parts(false, term)
        } else if values.iter().all(|v| v.is_concrete()) {
            Value::from_parts(true, term)
        } else {
            Value::symbolic(term)
        }
    }

    /// Disjunction. Concrete if all operands are concrete, or if any operand is concretely true.
    pub fn or(values: &[BoolValue]) -> BoolValue {
        let term = Term::or(values.iter().map(|v| v.term().clone()).collect());
        if values.iter().any(|v| v.concrete() == Some(&true)) {
            Value::from_parts(true, term)
        } else if values.iter().all(|v| v.is_concrete()) {
            Value::from_parts(false, term)
        } else {
            Value::symbolic(term)
        }
    }

    /// Negation
    pub fn not(&self) -> BoolValue {
        let term = self.term().not();
        match self.concrete() {
            Some(b) => Value::from_parts(!b, term),
            None => Value::symbolic(term),
        }
    }
}

impl Value<i64> {
    /// Concrete integer
    pub fn constant(value: i64) -> Self {
        Value::from_parts(value, Term::int(value))
    }

    fn compare<F>(&self, other: &Self, term: Term, cmp: F) -> BoolValue
    where
        F: Fn(i64, i64) -> bool,
    {
        match (self.concrete(), other.concrete()) {
            (Some(a), Some(b)) => Value::from_parts(cmp(*a, *b), term),
            _ => Value::symbolic(term),
        }
    }

    /// `self > other`
    pub fn gt(&self, other: &Self) -> BoolValue {
        self.compare(other, self.term().gt(other.term()), |a, b| a > b)
    }

    /// `self < other`
    pub fn lt(&self, other: &Self) -> BoolValue {
        self.compare(other, self.term().lt(other.term()), |a, b| a < b)
    }

    /// `self >= other`
    pub fn ge(&self, other: &Self) -> BoolValue {
        self.compare(other, self.term().ge(other.term()), |a, b| a >= b)
    }

    /// `self <= other`
    pub fn le(&self, other: &Self) -> BoolValue {
        self.compare(other, self.term().le(other.term()), |a, b| a <= b)
    }
}

impl<T: fmt::Display> fmt::Display for Value<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concrete { value, .. } => write!(f, "{}", value),
            Self::Symbolic(term) => write!(f, "{}", term),
        }
    }
}
