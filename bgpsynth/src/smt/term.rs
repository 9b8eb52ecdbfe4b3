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

//! # Terms
//!
//! Solver-agnostic formulas. Every value in the synthesis layer carries a `Term`, which is the
//! only thing handed over to a solver backend. Terms can be partially evaluated under an
//! incomplete assignment, which is used both for decoding models and for the enumerative search.

use crate::synthesis::DomainKind;

use itertools::Itertools;
use std::collections::BTreeSet;
use std::fmt;

/// Sort of a solver variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sort {
    /// Boolean sort
    Bool,
    /// Unbounded integer sort
    Int,
    /// Finite enumeration over the tokens of a domain, with the given number of members.
    Enum(DomainKind, usize),
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sort::Bool => write!(f, "Bool"),
            Sort::Int => write!(f, "Int"),
            Sort::Enum(kind, _) => write!(f, "{}Sort", kind),
        }
    }
}

/// Value of a variable in a model, or the result of evaluating a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelValue {
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Index of a token inside its domain
    Token(usize),
}

/// Formula over declared variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// Reference to a declared variable
    Var(String),
    /// Boolean literal
    BoolLit(bool),
    /// Integer literal
    IntLit(i64),
    /// Token literal, given as the index into its domain
    Token(usize),
    /// Equality of two terms of the same sort
    Eq(Box<Term>, Box<Term>),
    /// Integer less-than
    Lt(Box<Term>, Box<Term>),
    /// Integer less-or-equal
    Le(Box<Term>, Box<Term>),
    /// Integer greater-than
    Gt(Box<Term>, Box<Term>),
    /// Integer greater-or-equal
    Ge(Box<Term>, Box<Term>),
    /// Conjunction. The empty conjunction is true.
    And(Vec<Term>),
    /// Disjunction. The empty disjunction is false.
    Or(Vec<Term>),
    /// Negation
    Not(Box<Term>),
    /// Implication
    Implies(Box<Term>, Box<Term>),
    /// If-then-else
    Ite(Box<Term>, Box<Term>, Box<Term>),
}

impl Term {
    /// Create a reference to a variable
    pub fn var(name: impl Into<String>) -> Self {
        Term::Var(name.into())
    }

    /// Boolean literal
    pub fn bool(value: bool) -> Self {
        Term::BoolLit(value)
    }

    /// Integer literal
    pub fn int(value: i64) -> Self {
        Term::IntLit(value)
    }

    /// Token literal
    pub fn token(index: usize) -> Self {
        Term::Token(index)
    }

    /// `self == other`
    pub fn eq(&self, other: &Term) -> Self {
        Term::Eq(Box::new(self.clone()), Box::new(other.clone()))
    }

    /// `self < other`
    pub fn lt(&self, other: &Term) -> Self {
        Term::Lt(Box::new(self.clone()), Box::new(other.clone()))
    }

    /// `self <= other`
    pub fn le(&self, other: &Term) -> Self {
        Term::Le(Box::new(self.clone()), Box::new(other.clone()))
    }

    /// `self > other`
    pub fn gt(&self, other: &Term) -> Self {
        Term::Gt(Box::new(self.clone()), Box::new(other.clone()))
    }

    /// `self >= other`
    pub fn ge(&self, other: &Term) -> Self {
        Term::Ge(Box::new(self.clone()), Box::new(other.clone()))
    }

    /// `!self`
    pub fn not(&self) -> Self {
        Term::Not(Box::new(self.clone()))
    }

    /// `self => other`
    pub fn implies(&self, other: &Term) -> Self {
        Term::Implies(Box::new(self.clone()), Box::new(other.clone()))
    }

    /// Conjunction of all terms
    pub fn and(terms: Vec<Term>) -> Self {
        Term::And(terms)
    }

    /// Disjunction of all terms
    pub fn or(terms: Vec<Term>) -> Self {
        Term::Or(terms)
    }

    /// `if cond then then_ else else_`
    pub fn ite(cond: &Term, then_: &Term, else_: &Term) -> Self {
        Term::Ite(Box::new(cond.clone()), Box::new(then_.clone()), Box::new(else_.clone()))
    }

    /// Evaluate the term under a (possibly partial) assignment. Returns `None` if the value
    /// depends on a variable for which `lookup` has no value. Short-circuiting is applied, such
    /// that `false && x` evaluates to `false` even if `x` is unknown.
    pub fn eval<F>(&self, lookup: &F) -> Option<ModelValue>
    where
        F: Fn(&str) -> Option<ModelValue>,
    {
        match self {
            Term::Var(name) => lookup(name),
            Term::BoolLit(b) => Some(ModelValue::Bool(*b)),
            Term::IntLit(i) => Some(ModelValue::Int(*i)),
            Term::Token(t) => Some(ModelValue::Token(*t)),
            Term::Eq(a, b) => Some(ModelValue::Bool(a.eval(lookup)? == b.eval(lookup)?)),
            Term::Lt(a, b) => compare(a, b, lookup, |x, y| x < y),
            Term::Le(a, b) => compare(a, b, lookup, |x, y| x <= y),
            Term::Gt(a, b) => compare(a, b, lookup, |x, y| x > y),
            Term::Ge(a, b) => compare(a, b, lookup, |x, y| x >= y),
            Term::And(terms) => {
                let mut unknown = false;
                for t in terms {
                    match t.eval(lookup) {
                        Some(ModelValue::Bool(false)) => return Some(ModelValue::Bool(false)),
                        Some(ModelValue::Bool(true)) => {}
                        _ => unknown = true,
                    }
                }
                if unknown {
                    None
                } else {
                    Some(ModelValue::Bool(true))
                }
            }
            Term::Or(terms) => {
                let mut unknown = false;
                for t in terms {
                    match t.eval(lookup) {
                        Some(ModelValue::Bool(true)) => return Some(ModelValue::Bool(true)),
                        Some(ModelValue::Bool(false)) => {}
                        _ => unknown = true,
                    }
                }
                if unknown {
                    None
                } else {
                    Some(ModelValue::Bool(false))
                }
            }
            Term::Not(a) => match a.eval(lookup)? {
                ModelValue::Bool(b) => Some(ModelValue::Bool(!b)),
                _ => None,
            },
            Term::Implies(a, b) => match (a.eval(lookup), b.eval(lookup)) {
                (Some(ModelValue::Bool(false)), _) => Some(ModelValue::Bool(true)),
                (_, Some(ModelValue::Bool(true))) => Some(ModelValue::Bool(true)),
                (Some(ModelValue::Bool(true)), Some(ModelValue::Bool(false))) => {
                    Some(ModelValue::Bool(false))
                }
                _ => None,
            },
            Term::Ite(c, t, e) => match c.eval(lookup) {
                Some(ModelValue::Bool(true)) => t.eval(lookup),
                Some(ModelValue::Bool(false)) => e.eval(lookup),
                _ => {
                    // both branches agree, so the condition does not matter
                    let t = t.eval(lookup)?;
                    if Some(t) == e.eval(lookup) {
                        Some(t)
                    } else {
                        None
                    }
                }
            },
        }
    }

    /// Collect the variables which still decide the value of the term under the partial
    /// assignment. Branches that are cut off by known values are skipped.
    pub fn residual_variables<F>(&self, lookup: &F, out: &mut BTreeSet<String>)
    where
        F: Fn(&str) -> Option<ModelValue>,
    {
        if self.eval(lookup).is_some() {
            return;
        }
        match self {
            Term::Var(name) => {
                out.insert(name.clone());
            }
            Term::BoolLit(_) | Term::IntLit(_) | Term::Token(_) => {}
            Term::Eq(a, b)
            | Term::Lt(a, b)
            | Term::Le(a, b)
            | Term::Gt(a, b)
            | Term::Ge(a, b)
            | Term::Implies(a, b) => {
                a.residual_variables(lookup, out);
                b.residual_variables(lookup, out);
            }
            Term::And(terms) | Term::Or(terms) => {
                terms.iter().for_each(|t| t.residual_variables(lookup, out))
            }
            Term::Not(a) => a.residual_variables(lookup, out),
            Term::Ite(c, t, e) => match c.eval(lookup) {
                Some(ModelValue::Bool(true)) => t.residual_variables(lookup, out),
                Some(ModelValue::Bool(false)) => e.residual_variables(lookup, out),
                _ => {
                    c.residual_variables(lookup, out);
                    t.residual_variables(lookup, out);
                    e.residual_variables(lookup, out);
                }
            },
        }
    }

    /// Collect all variable names in the term
    pub fn variables(&self, out: &mut BTreeSet<String>) {
        self.visit(&mut |t| {
            if let Term::Var(name) = t {
                out.insert(name.clone());
            }
        })
    }

    /// Collect all integer literals in the term
    pub fn int_literals(&self, out: &mut BTreeSet<i64>) {
        self.visit(&mut |t| {
            if let Term::IntLit(i) = t {
                out.insert(*i);
            }
        })
    }

    fn visit<F: FnMut(&Term)>(&self, f: &mut F) {
        f(self);
        match self {
            Term::Var(_) | Term::BoolLit(_) | Term::IntLit(_) | Term::Token(_) => {}
            Term::Eq(a, b)
            | Term::Lt(a, b)
            | Term::Le(a, b)
            | Term::Gt(a, b)
            | Term::Ge(a, b)
            | Term::Implies(a, b) => {
                a.visit(f);
                b.visit(f);
            }
            Term::And(terms) | Term::Or(terms) => terms.iter().for_each(|t| t.visit(f)),
            Term::Not(a) => a.visit(f),
            Term::Ite(c, t, e) => {
                c.visit(f);
                t.visit(f);
                e.visit(f);
            }
        }
    }
}

fn compare<F, C>(a: &Term, b: &Term, lookup: &F, cmp: C) -> Option<ModelValue>
where
    F: Fn(&str) -> Option<ModelValue>,
    C: Fn(i64, i64) -> bool,
{
    match (a.eval(lookup)?, b.eval(lookup)?) {
        (ModelValue::Int(x), ModelValue::Int(y)) => Some(ModelValue::Bool(cmp(x, y))),
        _ => None,
    }
}

/// Prints the term in SMT-LIB 2 syntax. Tokens are printed as integers, which matches the
/// bounded-integer encoding of the enumeration sorts.
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(name) => write!(f, "{}", name),
            Term::BoolLit(b) => write!(f, "{}", b),
            Term::IntLit(i) if *i < 0 => write!(f, "(- {})", i.unsigned_abs()),
            Term::IntLit(i) => write!(f, "{}", i),
            Term::Token(t) => write!(f, "{}", t),
            Term::Eq(a, b) => write!(f, "(= {} {})", a, b),
            Term::Lt(a, b) => write!(f, "(< {} {})", a, b),
            Term::Le(a, b) => write!(f, "(<= {} {})", a, b),
            Term::Gt(a, b) => write!(f, "(> {} {})", a, b),
            Term::Ge(a, b) => write!(f, "(>= {} {})", a, b),
            Term::And(terms) if terms.is_empty() => write!(f, "true"),
            Term::And(terms) => write!(f, "(and {})", terms.iter().join(" ")),
            Term::Or(terms) if terms.is_empty() => write!(f, "false"),
            Term::Or(terms) => write!(f, "(or {})", terms.iter().join(" ")),
            Term::Not(a) => write!(f, "(not {})", a),
            Term::Implies(a, b) => write!(f, "(=> {} {})", a, b),
            Term::Ite(c, t, e) => write!(f, "(ite {} {} {})", c, t, e),
        }
    }
}
