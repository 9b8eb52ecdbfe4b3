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

//! # Enumerative Solver
//!
//! Backtracking search over the declared variables. At every node of the search tree, all
//! constraints are partially evaluated. If any constraint is violated, the branch is pruned. If
//! all constraints are satisfied, the search stops and all remaining variables take a default
//! value (the smallest integer literal, `false`, or the first token). Otherwise, the search
//! branches on the first variable that still decides an open constraint, so variables that only
//! appear in dead branches are never enumerated.
//!
//! Boolean variables take both values, enumeration variables take every index of their domain.
//! Integer variables take the values `c + k` for every integer literal `c` that appears in any
//! constraint (or `c = 0` if there is none), with `|k|` bounded by a radius. The search first
//! runs with radius 1. If that fails, it runs again with radius `2n + 1`, where `n` is the number
//! of integer variables.
//!
//! The second round is complete for the constraints of the synthesis layer. Once all `ite`
//! conditions are fixed, every atom compares two integer variables, or a variable with a literal.
//! If such a system of (strict) difference constraints and disequalities has a solution, it has
//! one where every variable is a literal plus at most `n` unit steps along the constraints, plus
//! at most `n` further steps to separate variables that must differ. Hence an unsat result means
//! that no model exists.

use super::{CheckResult, Model, ModelValue, Solver, Sort, Term};

use log::*;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

/// Errors of the enumerative solver
#[derive(Debug, Error, PartialEq)]
pub enum EnumerativeError {
    /// A variable was declared twice, with different sorts.
    #[error("Variable {0} is already declared with a different sort")]
    Redeclared(String),
    /// A constraint uses a variable that was never declared.
    #[error("Constraint {0} uses the undeclared variable {1}")]
    UndeclaredVariable(String, String),
    /// Two constraints have the same name.
    #[error("Constraint {0} is registered twice")]
    DuplicateConstraint(String),
}

#[derive(Debug, Clone)]
struct Constraint {
    name: String,
    term: Term,
}

/// Dependency-free backtracking solver.
#[derive(Debug, Clone)]
pub struct EnumerativeSolver {
    vars: Vec<(String, Sort)>,
    var_index: HashMap<String, usize>,
    constraints: Vec<Constraint>,
    minimize_core: bool,
}

impl Default for EnumerativeSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl EnumerativeSolver {
    /// Create a new, empty solver. Unsat cores are minimized by default.
    pub fn new() -> Self {
        Self {
            vars: Vec::new(),
            var_index: HashMap::new(),
            constraints: Vec::new(),
            minimize_core: true,
        }
    }

    /// Report all registered constraints as the unsat core, instead of computing a minimal one.
    pub fn without_core_minimization(mut self) -> Self {
        self.minimize_core = false;
        self
    }

    /// All integer literals of all constraints, or only `0` if there are none.
    fn literals(&self) -> BTreeSet<i64> {
        let mut literals: BTreeSet<i64> = BTreeSet::new();
        self.constraints.iter().for_each(|c| c.term.int_literals(&mut literals));
        if literals.is_empty() {
            literals.insert(0);
        }
        literals
    }

    /// Candidate values for every declared variable. Integers are within `radius` of a literal.
    fn candidates(&self, literals: &BTreeSet<i64>, radius: i64) -> Vec<Vec<ModelValue>> {
        let ints: Vec<ModelValue> = literals
            .iter()
            .flat_map(|c| (-radius..=radius).map(move |k| c.saturating_add(k)))
            .collect::<BTreeSet<i64>>()
            .into_iter()
            .map(ModelValue::Int)
            .collect();

        self.vars
            .iter()
            .map(|(_, sort)| match sort {
                Sort::Bool => vec![ModelValue::Bool(false), ModelValue::Bool(true)],
                Sort::Int => ints.clone(),
                Sort::Enum(_, n) => (0..*n).map(ModelValue::Token).collect(),
            })
            .collect()
    }

    /// Radii of the search rounds. The last one is complete.
    fn radii(&self) -> Vec<i64> {
        let n = self.vars.iter().filter(|(_, sort)| *sort == Sort::Int).count() as i64;
        let complete = 2 * n + 1;
        if complete > 1 {
            vec![1, complete]
        } else {
            vec![complete]
        }
    }

    /// Search for an assignment satisfying all constraints in `active`.
    fn search(
        &self,
        active: &[usize],
        candidates: &[Vec<ModelValue>],
    ) -> Option<Vec<Option<ModelValue>>> {
        let mut assignment = vec![None; self.vars.len()];
        if self.dfs(active, candidates, &mut assignment) {
            Some(assignment)
        } else {
            None
        }
    }

    fn dfs(
        &self,
        active: &[usize],
        candidates: &[Vec<ModelValue>],
        assignment: &mut Vec<Option<ModelValue>>,
    ) -> bool {
        let mut open: BTreeSet<String> = BTreeSet::new();
        let mut undecided = false;
        {
            let lookup = |name: &str| self.var_index.get(name).and_then(|i| assignment[*i]);
            for c in active.iter().map(|i| &self.constraints[*i]) {
                match c.term.eval(&lookup) {
                    Some(ModelValue::Bool(true)) => {}
                    Some(_) => return false,
                    None => {
                        undecided = true;
                        c.term.residual_variables(&lookup, &mut open);
                    }
                }
            }
        }

        if !undecided {
            return true;
        }

        let next = match open.iter().filter_map(|name| self.var_index.get(name)).min() {
            Some(next) => *next,
            // an open constraint that no variable can decide
            None => return false,
        };

        for value in candidates[next].iter() {
            assignment[next] = Some(*value);
            if self.dfs(active, candidates, assignment) {
                return true;
            }
        }
        assignment[next] = None;
        false
    }

    /// Shrink the set of constraints until removing any further constraint makes it satisfiable.
    fn minimal_core(&self, candidates: &[Vec<ModelValue>]) -> Vec<usize> {
        let mut core: Vec<usize> = (0..self.constraints.len()).collect();
        let mut i = 0;
        while i < core.len() {
            let mut trial = core.clone();
            trial.remove(i);
            if self.search(&trial, candidates).is_none() {
                core = trial;
            } else {
                i += 1;
            }
        }
        core
    }
}

impl Solver for EnumerativeSolver {
    type Error = EnumerativeError;

    fn declare(&mut self, name: &str, sort: Sort) -> Result<(), Self::Error> {
        match self.var_index.get(name) {
            Some(i) if self.vars[*i].1 == sort => Ok(()),
            Some(_) => Err(EnumerativeError::Redeclared(name.to_string())),
            None => {
                self.var_index.insert(name.to_string(), self.vars.len());
                self.vars.push((name.to_string(), sort));
                Ok(())
            }
        }
    }

    fn register(&mut self, name: &str, constraint: &Term) -> Result<(), Self::Error> {
        if self.constraints.iter().any(|c| c.name == name) {
            return Err(EnumerativeError::DuplicateConstraint(name.to_string()));
        }
        let mut vars = BTreeSet::new();
        constraint.variables(&mut vars);
        if let Some(missing) = vars.into_iter().find(|v| !self.var_index.contains_key(v)) {
            return Err(EnumerativeError::UndeclaredVariable(name.to_string(), missing));
        }
        self.constraints.push(Constraint { name: name.to_string(), term: constraint.clone() });
        Ok(())
    }

    fn check(&mut self) -> Result<CheckResult, Self::Error> {
        let all: Vec<usize> = (0..self.constraints.len()).collect();
        debug!(
            "Enumerative search over {} variables and {} constraints",
            self.vars.len(),
            self.constraints.len()
        );

        let literals = self.literals();
        let mut candidates = Vec::new();
        for radius in self.radii() {
            candidates = self.candidates(&literals, radius);
            if let Some(assignment) = self.search(&all, &candidates) {
                let mut model = Model::new();
                for (i, (name, sort)) in self.vars.iter().enumerate() {
                    // variables that do not influence any constraint take a default value
                    let value = match (assignment[i], sort) {
                        (Some(value), _) => Some(value),
                        (None, Sort::Int) => literals.iter().next().copied().map(ModelValue::Int),
                        (None, _) => candidates[i].first().copied(),
                    };
                    if let Some(value) = value {
                        model.insert(name.clone(), value);
                    }
                }
                return Ok(CheckResult::Sat(model));
            }
            trace!("No model with integers within {} of a literal", radius);
        }

        let core = if self.minimize_core { self.minimal_core(&candidates) } else { all };
        Ok(CheckResult::Unsat(core.into_iter().map(|i| self.constraints[i].name.clone()).collect()))
    }
}
