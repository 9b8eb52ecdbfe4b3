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

//! Module containing all error types

use crate::synthesis::{DecodeError, DomainError, ShapeError};
use thiserror::Error;

/// Main error type
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// A concrete value lies outside of its finite domain, or a domain is missing.
    #[error("Domain Error: {0}")]
    DomainError(#[from] DomainError),
    /// The route-map or one of its clauses is malformed.
    #[error("Shape Error: {0}")]
    ShapeError(#[from] ShapeError),
    /// A symbolic value could not be converted back to a concrete one.
    #[error("Decode Error: {0}")]
    DecodeError(#[from] DecodeError),
    /// The requirements cannot be satisfied. Contains the names of the conflicting constraints.
    #[error("The requirements cannot be satisfied! Conflicting constraints: {0:?}")]
    Unsatisfiable(Vec<String>),
    /// The solver backend reported an error
    #[error("Solver Error: {0}")]
    SolverError(String),
    /// The solver could not decide satisfiability
    #[error("The solver could not decide satisfiability: {0}")]
    SolverUnknown(String),
}
