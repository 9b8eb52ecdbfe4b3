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

//! # Z3 Backend
//!
//! Translates terms into Z3 expressions. Enumeration sorts are encoded as bounded integers. Each
//! registered constraint is guarded by a tracking literal, and the check is performed under the
//! assumption of all tracking literals, such that the unsat core maps back to constraint names.

use super::{CheckResult, Model, ModelValue, Solver, Sort, Term};

use log::*;
use std::collections::HashMap;
use thiserror::Error;
use z3::ast::{Ast, Bool, Int};
use z3::SatResult;

/// Errors of the Z3 backend
#[derive(Debug, Error)]
pub enum Z3Error {
    /// Internal error while translating a term
    #[error("Z3 error: {0}")]
    Internal(String),
    /// A term references a variable that was never declared.
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),
}

enum Z3Term {
    Int(Int),
    Bool(Bool),
}

impl Z3Term {
    fn into_int(self) -> Result<Int, Z3Error> {
        match self {
            Z3Term::Int(i) => Ok(i),
            Z3Term::Bool(_) => Err(Z3Error::Internal("Expected Int, got Bool".into())),
        }
    }

    fn into_bool(self) -> Result<Bool, Z3Error> {
        match self {
            Z3Term::Bool(b) => Ok(b),
            Z3Term::Int(_) => Err(Z3Error::Internal("Expected Bool, got Int".into())),
        }
    }
}

/// Solver backend using Z3.
pub struct Z3Solver {
    solver: z3::Solver,
    vars: Vec<(String, Sort)>,
    int_vars: HashMap<String, Int>,
    bool_vars: HashMap<String, Bool>,
    trackers: Vec<(String, Bool)>,
}

impl std::fmt::Debug for Z3Solver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Z3Solver")
            .field("vars", &self.vars)
            .field("constraints", &self.trackers.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .finish()
    }
}

impl Default for Z3Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Z3Solver {
    /// Create a new solver without timeout
    pub fn new() -> Self {
        Self {
            solver: z3::Solver::new(),
            vars: Vec::new(),
            int_vars: HashMap::new(),
            bool_vars: HashMap::new(),
            trackers: Vec::new(),
        }
    }

    /// Create a new solver which gives up (with `Unknown`) after the timeout.
    pub fn with_timeout_ms(timeout_ms: u32) -> Self {
        let s = Self::new();
        let mut params = z3::Params::new();
        params.set_u32("timeout", timeout_ms);
        s.solver.set_params(&params);
        s
    }

    fn translate(&self, term: &Term) -> Result<Z3Term, Z3Error> {
        Ok(match term {
            Term::Var(name) => {
                if let Some(v) = self.int_vars.get(name) {
                    Z3Term::Int(v.clone())
                } else if let Some(v) = self.bool_vars.get(name) {
                    Z3Term::Bool(v.clone())
                } else {
                    return Err(Z3Error::UnknownVariable(name.clone()));
                }
            }
            Term::BoolLit(b) => Z3Term::Bool(Bool::from_bool(*b)),
            Term::IntLit(i) => Z3Term::Int(Int::from_i64(*i)),
            Term::Token(t) => Z3Term::Int(Int::from_u64(*t as u64)),
            Term::Eq(a, b) => match (self.translate(a)?, self.translate(b)?) {
                (Z3Term::Int(a), Z3Term::Int(b)) => Z3Term::Bool(a.eq(&b)),
                (Z3Term::Bool(a), Z3Term::Bool(b)) => Z3Term::Bool(a.eq(&b)),
                _ => return Err(Z3Error::Internal("Sort mismatch in Eq".into())),
            },
            Term::Lt(a, b) => Z3Term::Bool(self.int(a)?.lt(&self.int(b)?)),
            Term::Le(a, b) => Z3Term::Bool(self.int(a)?.le(&self.int(b)?)),
            Term::Gt(a, b) => Z3Term::Bool(self.int(a)?.gt(&self.int(b)?)),
            Term::Ge(a, b) => Z3Term::Bool(self.int(a)?.ge(&self.int(b)?)),
            Term::And(terms) => {
                let bools = terms.iter().map(|t| self.bool(t)).collect::<Result<Vec<_>, _>>()?;
                Z3Term::Bool(Bool::and(&bools.iter().collect::<Vec<_>>()))
            }
            Term::Or(terms) => {
                let bools = terms.iter().map(|t| self.bool(t)).collect::<Result<Vec<_>, _>>()?;
                Z3Term::Bool(Bool::or(&bools.iter().collect::<Vec<_>>()))
            }
            Term::Not(a) => Z3Term::Bool(self.bool(a)?.not()),
            Term::Implies(a, b) => Z3Term::Bool(self.bool(a)?.implies(&self.bool(b)?)),
            Term::Ite(c, t, e) => {
                let c = self.bool(c)?;
                match (self.translate(t)?, self.translate(e)?) {
                    (Z3Term::Int(t), Z3Term::Int(e)) => Z3Term::Int(c.ite(&t, &e)),
                    (Z3Term::Bool(t), Z3Term::Bool(e)) => Z3Term::Bool(c.ite(&t, &e)),
                    _ => return Err(Z3Error::Internal("Sort mismatch in Ite".into())),
                }
            }
        })
    }

    fn int(&self, term: &Term) -> Result<Int, Z3Error> {
        self.translate(term)?.into_int()
    }

    fn bool(&self, term: &Term) -> Result<Bool, Z3Error> {
        self.translate(term)?.into_bool()
    }

    fn extract_model(&self) -> Result<Model, Z3Error> {
        let z3_model = self
            .solver
            .get_model()
            .ok_or_else(|| Z3Error::Internal("SAT but no model available".into()))?;
        let mut model = Model::new();
        for (name, sort) in self.vars.iter() {
            let value = match sort {
                Sort::Bool => self
                    .bool_vars
                    .get(name)
                    .and_then(|v| z3_model.eval(v, true))
                    .and_then(|v| v.as_bool())
                    .map(ModelValue::Bool),
                Sort::Int => self
                    .int_vars
                    .get(name)
                    .and_then(|v| z3_model.eval(v, true))
                    .and_then(|v| v.as_i64())
                    .map(ModelValue::Int),
                Sort::Enum(_, _) => self
                    .int_vars
                    .get(name)
                    .and_then(|v| z3_model.eval(v, true))
                    .and_then(|v| v.as_u64())
                    .map(|v| ModelValue::Token(v as usize)),
            };
            match value {
                Some(value) => model.insert(name.clone(), value),
                None => warn!("Z3 model has no value for {}", name),
            }
        }
        Ok(model)
    }
}

impl Solver for Z3Solver {
    type Error = Z3Error;

    fn declare(&mut self, name: &str, sort: Sort) -> Result<(), Self::Error> {
        if self.vars.iter().any(|(n, _)| n == name) {
            return Ok(());
        }
        match sort {
            Sort::Bool => {
                self.bool_vars.insert(name.to_string(), Bool::new_const(name));
            }
            Sort::Int => {
                self.int_vars.insert(name.to_string(), Int::new_const(name));
            }
            Sort::Enum(_, n) => {
                let v = Int::new_const(name);
                self.solver.assert(&v.ge(&Int::from_u64(0)));
                self.solver.assert(&v.lt(&Int::from_u64(n as u64)));
                self.int_vars.insert(name.to_string(), v);
            }
        }
        self.vars.push((name.to_string(), sort));
        Ok(())
    }

    fn register(&mut self, name: &str, constraint: &Term) -> Result<(), Self::Error> {
        let constraint = self.bool(constraint)?;
        let tracker = Bool::new_const(format!("track!{}", name));
        self.solver.assert(&tracker.implies(&constraint));
        self.trackers.push((name.to_string(), tracker));
        Ok(())
    }

    fn check(&mut self) -> Result<CheckResult, Self::Error> {
        let assumptions: Vec<Bool> = self.trackers.iter().map(|(_, t)| t.clone()).collect();
        match self.solver.check_assumptions(&assumptions) {
            SatResult::Sat => Ok(CheckResult::Sat(self.extract_model()?)),
            SatResult::Unsat => {
                let core = self.solver.get_unsat_core();
                Ok(CheckResult::Unsat(
                    self.trackers
                        .iter()
                        .filter(|(_, t)| core.iter().any(|c| c == t))
                        .map(|(n, _)| n.clone())
                        .collect(),
                ))
            }
            SatResult::Unknown => Ok(CheckResult::Unknown(
                self.solver.get_reason_unknown().unwrap_or_else(|| "Z3 returned unknown".into()),
            )),
        }
    }
}
