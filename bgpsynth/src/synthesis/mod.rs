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

//! # Synthesis
//!
//! Symbolic encoding of BGP import policies. The route-map to synthesize may contain holes, which
//! are represented by solver variables. Announcements flow through the [`PolicyChain`], and the
//! [`DecisionProcess`] decides which announcement is selected for each prefix. Requirements on
//! the selection become constraints, and a model of the solver fills in all holes.
//!
//! The main building blocks are:
//! - [`Value`]: A concrete or symbolic value of some type, together with its solver term.
//! - [`SolverContext`]: Finite domains, declared holes and named constraints.
//! - [`Match`] and [`Action`]: Predicates over and transformations of announcements.
//! - [`RouteMap`]: The configuration, which is encoded as a [`PolicyChain`].

mod actions;
mod announcement;
mod context;
mod decision;
mod domain;
mod matches;
mod policy;
mod route_map;
mod types;
mod value;

pub use actions::{Action, SetAttribute, SetOne};
pub use announcement::{Announcement, AnnouncementSet, AttrValue, Attribute, SymAnnouncement};
pub use context::{ContextBuilder, SolverContext};
pub use decision::{Criterion, DecisionProcess, Preference, Selection, NO_ROUTE};
pub use domain::{Domain, Domains};
pub use matches::{Match, SelectOne, SelectorMatch};
pub use policy::{PolicyChain, NO_LINE};
pub use route_map::{
    Access, ChainDefault, RouteMap, RouteMapLine, RouteMapLineBuilder, RouteMapMatch, RouteMapSet,
};
pub use types::{
    AsId, AsPathSig, Community, DecodeError, DomainError, DomainKind, NextHop, Origin, Peer,
    Prefix, ShapeError, Token,
};
pub use value::{BoolValue, IntValue, SmtType, Value};
