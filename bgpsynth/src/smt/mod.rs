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

//! # Solver Interface
//!
//! This module contains the boundary between the synthesis layer and the constraint solver. The
//! synthesis layer only ever produces [`Term`]s, declares variables with a [`Sort`], registers
//! named constraints and asks for a [`CheckResult`]. Any type implementing [`Solver`] can be used.
//!
//! Two backends exist:
//! - [`EnumerativeSolver`](enumerative::EnumerativeSolver): A dependency-free backtracking search,
//!   which is sufficient for the small problems of route-map synthesis and used in all tests.
//! - `Z3Solver`: Translation to the Z3 SMT solver, only available with the `z3` feature.

pub mod enumerative;
mod term;
#[cfg(feature = "z3")]
pub mod z3_backend;

pub use enumerative::EnumerativeSolver;
pub use term::{ModelValue, Sort, Term};
#[cfg(feature = "z3")]
pub use z3_backend::Z3Solver;

use std::collections::HashMap;

/// Assignment of values to the declared variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    values: HashMap<String, ModelValue>,
}

impl Model {
    /// Create an empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value of a variable
    pub fn insert(&mut self, name: impl Into<String>, value: ModelValue) {
        self.values.insert(name.into(), value);
    }

    /// Get the value of a variable
    pub fn get(&self, name: &str) -> Option<ModelValue> {
        self.values.get(name).copied()
    }

    /// Evaluate a term under this model
    pub fn eval(&self, term: &Term) -> Option<ModelValue> {
        term.eval(&|name: &str| self.get(name))
    }

    /// Number of assigned variables
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no variable is assigned
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Result of a satisfiability check
#[derive(Debug, Clone, PartialEq)]
pub enum CheckResult {
    /// The constraints are satisfiable, and the model is a witness.
    Sat(Model),
    /// The constraints are unsatisfiable. The vector contains the names of the constraints which
    /// together are unsatisfiable (unsat core).
    Unsat(Vec<String>),
    /// The solver could not decide, with the reason.
    Unknown(String),
}

/// Constraint solver backend.
pub trait Solver {
    /// Error type of the backend
    type Error: std::error::Error;

    /// Declare a variable of the given sort.
    fn declare(&mut self, name: &str, sort: Sort) -> Result<(), Self::Error>;

    /// Register a named boolean constraint. The name is used to report unsat cores.
    fn register(&mut self, name: &str, constraint: &Term) -> Result<(), Self::Error>;

    /// Check all registered constraints.
    fn check(&mut self) -> Result<CheckResult, Self::Error>;
}
