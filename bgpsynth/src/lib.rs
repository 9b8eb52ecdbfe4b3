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

#![deny(missing_docs)]

//! # BgpSynth: Synthesizing BGP Route-Map Policies
//! This is a library for completing partially specified BGP import route-maps. Some clauses of a
//! route-map are left open (holes), and the library fills them in, such that the router selects
//! the required announcements.
//!
//! ## Problem Statement
//! Given
//! - a set of announcements received by a router,
//! - an import route-map, where match values, set values, the access of a line, or even the kind
//!   of a clause may be left open, and
//! - a set of announcements which must be selected as the best route for their prefix,
//!
//! find values for all holes, such that the BGP decision process selects the required
//! announcements after the route-map is applied.
//!
//! ## Structure
//!
//! This library is structured in the following way:
//!
//! - **[`Synthesis`](synthesis)**: Symbolic encoding of announcements, route-maps and the
//!   decision process. Every attribute is a [`Value`](synthesis::Value), which is either
//!   concrete, or backed by a solver term. The route-map is encoded as a
//!   [`PolicyChain`](synthesis::PolicyChain) with first-match-wins semantics, and the
//!   [`DecisionProcess`](synthesis::DecisionProcess) selects the best announcement per prefix.
//!
//! - **[`Smt`](smt)**: The solver interface. The synthesis only produces
//!   [`Terms`](smt::Term), which are checked by any [`Solver`](smt::Solver). The crate ships a
//!   dependency-free [`EnumerativeSolver`](smt::EnumerativeSolver), and a Z3 backend which is
//!   enabled by the feature `z3`.
//!
//! - **[`SynthesisProblem`]**: Wrapper for the end-to-end synthesis of the import route-map of a
//!   single eBGP router.
//!
//! ## Features
//!
//! - *`z3`*: Enables the solver backend `smt::Z3Solver`, which requires the Z3 library.
//!
//! ## Usage
//!
//! Prepare the announcements and the route-map with holes, state which announcements must be
//! selected, and call `synthesize` with a solver.
//!
//! ```
//! use bgpsynth::smt::EnumerativeSolver;
//! use bgpsynth::synthesis::*;
//! use bgpsynth::{Error, LocalRouter, SynthesisProblem};
//!
//! fn main() -> Result<(), Error> {
//!     // deny something, but let the synthesis decide on which next-hop to match.
//!     let import = RouteMap::new(
//!         "import",
//!         vec![RouteMapLineBuilder::new().lineno(10).deny().match_next_hop_hole().build()],
//!     );
//!
//!     let mut problem = SynthesisProblem::new(LocalRouter::new("R1", AsId(1)), import);
//!     problem
//!         .announcement("a", Announcement::new("P", "N1", vec![AsId(2)], "Hop1"))
//!         .announcement("b", Announcement::new("P", "N2", vec![AsId(3), AsId(4)], "Hop2"))
//!         .require("b");
//!
//!     let result = problem.synthesize(&mut EnumerativeSolver::new())?;
//!
//!     // Do something with the result
//!     println!("{}", result.route_map);
//!     assert_eq!(
//!         result.route_map.lines()[0].conds(),
//!         &[RouteMapMatch::NextHop(Some(NextHop::new("Hop1")))]
//!     );
//!
//!     Ok(())
//! }
//! ```

pub mod smt;
pub mod synthesis;
// test modules
mod test;

mod error;
mod synthesize;

pub use error::Error;
pub use synthesize::{Encoding, LocalRouter, Synthesis, SynthesisProblem};
