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

//! # Solver Context
//!
//! The [`SolverContext`] collects everything that is handed to the solver: the finite domains,
//! the declared variables (holes) and the named constraints. After a successful check, the model
//! is bound to the context, and every [`Value`] can be decoded using [`Value::get`].

use super::announcement::Announcement;
use super::domain::Domains;
use super::types::{Community, DomainError, DomainKind, Origin, Token};
use super::value::{BoolValue, IntValue, SmtType, Value};
use crate::smt::{CheckResult, Model, Solver, Sort, Term};
use crate::Error;

use log::*;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Context holding the domains, holes and constraints of a synthesis problem.
#[derive(Debug, Clone)]
pub struct SolverContext {
    domains: Domains,
    communities: BTreeSet<Community>,
    vars: Vec<(String, Sort)>,
    constraints: Vec<(String, Term)>,
    names: HashSet<String>,
    non_negative_holes: bool,
    model: Option<Model>,
}

impl SolverContext {
    /// Finite domains of the context
    pub fn domains(&self) -> &Domains {
        &self.domains
    }

    /// Iterate over all declared communities
    pub fn communities(&self) -> impl Iterator<Item = &Community> {
        self.communities.iter()
    }

    /// Returns an error if the community is not declared.
    pub fn check_community(&self, community: &Community) -> Result<(), DomainError> {
        if self.communities.contains(community) {
            Ok(())
        } else {
            Err(DomainError::UnknownCommunity(community.clone()))
        }
    }

    /// Create a concrete value. Fails if the value is not a member of its domain.
    pub fn constant<T: SmtType>(&self, value: T) -> Result<Value<T>, DomainError> {
        let term = value.literal(&self.domains)?;
        Ok(Value::from_parts(value, term))
    }

    /// Create a new value. If `value` is `Some`, the result is concrete (and validated against
    /// its domain). Otherwise, a fresh variable is declared, whose name is derived from `name`.
    pub fn fresh<T: SmtType>(
        &mut self,
        name: &str,
        value: Option<T>,
    ) -> Result<Value<T>, DomainError> {
        match value {
            Some(value) => self.constant(value),
            None => {
                let sort = T::sort(&self.domains)?;
                let name = self.unique_name(name);
                trace!("declare {}: {}", name, sort);
                self.vars.push((name.clone(), sort));
                Ok(Value::symbolic(Term::var(name)))
            }
        }
    }

    /// Create a fresh integer hole for an attribute which cannot be negative. Unless negative
    /// holes are allowed, the constraint `hole >= 0` is registered.
    pub(crate) fn fresh_attribute_int(&mut self, name: &str) -> Result<IntValue, DomainError> {
        let hole = self.fresh::<i64>(name, None)?;
        if self.non_negative_holes {
            let constraint = hole.ge(&IntValue::constant(0));
            let name = format!("{}_non_negative", hole.term());
            self.register(&name, &constraint);
        }
        Ok(hole)
    }

    /// Register a named constraint, and return the name under which it was registered. If the
    /// name is already taken, a suffix is added.
    pub fn register(&mut self, name: &str, constraint: &BoolValue) -> String {
        let name = self.unique_name(name);
        if constraint.concrete() == Some(&false) {
            warn!("Constraint {} is trivially unsatisfiable", name);
        }
        trace!("register {}: {}", name, constraint.term());
        self.constraints.push((name.clone(), constraint.term().clone()));
        name
    }

    /// All declared variables, in declaration order
    pub fn variables(&self) -> &[(String, Sort)] {
        &self.vars
    }

    /// All registered constraints, in registration order
    pub fn constraints(&self) -> &[(String, Term)] {
        &self.constraints
    }

    /// Hand all variables and constraints to the solver and check them. On success, the model is
    /// bound to the context. If the constraints are unsatisfiable, the error contains the names
    /// of the conflicting constraints.
    pub fn check<S: Solver>(&mut self, solver: &mut S) -> Result<(), Error> {
        for (name, sort) in self.vars.iter() {
            solver.declare(name, *sort).map_err(|e| Error::SolverError(e.to_string()))?;
        }
        for (name, term) in self.constraints.iter() {
            solver.register(name, term).map_err(|e| Error::SolverError(e.to_string()))?;
        }
        info!(
            "Checking {} constraints over {} variables",
            self.constraints.len(),
            self.vars.len()
        );
        match solver.check().map_err(|e| Error::SolverError(e.to_string()))? {
            CheckResult::Sat(model) => {
                debug!("Found a model with {} assignments", model.len());
                self.model = Some(model);
                Ok(())
            }
            CheckResult::Unsat(core) => {
                error!("Constraints are unsatisfiable! Conflict: {:?}", core);
                self.model = None;
                Err(Error::Unsatisfiable(core))
            }
            CheckResult::Unknown(reason) => {
                warn!("Solver returned unknown: {}", reason);
                self.model = None;
                Err(Error::SolverUnknown(reason))
            }
        }
    }

    /// Bind a model to the context
    pub fn set_model(&mut self, model: Model) {
        self.model = Some(model);
    }

    /// Model bound to the context, if any
    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    /// Print all declarations and constraints as an SMT-LIB 2 script. Enumeration sorts are
    /// written as bounded integers.
    pub fn to_smtlib(&self) -> String {
        let mut script = String::new();
        for (name, sort) in self.vars.iter() {
            match sort {
                Sort::Bool => script.push_str(&format!("(declare-fun {} () Bool)\n", name)),
                Sort::Int => script.push_str(&format!("(declare-fun {} () Int)\n", name)),
                Sort::Enum(_, n) => {
                    script.push_str(&format!("(declare-fun {} () Int)\n", name));
                    script.push_str(&format!("(assert (and (>= {0} 0) (< {0} {1})))\n", name, n));
                }
            }
        }
        for (name, term) in self.constraints.iter() {
            script.push_str(&format!("(assert (! {} :named {}))\n", term, name));
        }
        script.push_str("(check-sat)\n");
        script
    }

    fn unique_name(&mut self, name: &str) -> String {
        let base: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        let mut name = base.clone();
        let mut i = 1;
        while self.names.contains(&name) {
            name = format!("{}_{}", base, i);
            i += 1;
        }
        self.names.insert(name.clone());
        name
    }
}

/// Builder for the [`SolverContext`]. The domains are populated with the tokens of all
/// announcements, together with any extra tokens.
///
/// ```rust
/// use bgpsynth::synthesis::*;
///
/// let ann = Announcement::new("Prefix1", "Peer1", vec![AsId(1), AsId(2)], "Hop1")
///     .with_community(Community::new("100:1"), true);
/// let ctx = ContextBuilder::new()
///     .announcement(&ann)
///     .token(&NextHop::new("Hop2"))
///     .build();
/// assert_eq!(ctx.domains().get(DomainKind::NextHop).len(), 2);
/// assert_eq!(ctx.domains().get(DomainKind::Origin).len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    tokens: BTreeMap<DomainKind, BTreeSet<String>>,
    communities: BTreeSet<Community>,
    non_negative_holes: bool,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self { tokens: BTreeMap::new(), communities: BTreeSet::new(), non_negative_holes: true }
    }

    /// Add an extra token to the domain of its type.
    pub fn token<T: Token>(&mut self, value: &T) -> &mut Self {
        self.tokens.entry(T::KIND).or_default().insert(value.token());
        self
    }

    /// Declare a community
    pub fn community(&mut self, community: Community) -> &mut Self {
        self.communities.insert(community);
        self
    }

    /// Add all tokens and communities of the announcement.
    pub fn announcement(&mut self, ann: &Announcement) -> &mut Self {
        self.token(&ann.prefix)
            .token(&ann.peer)
            .token(&ann.origin)
            .token(&ann.as_path_sig())
            .token(&ann.next_hop);
        self.communities.extend(ann.communities.keys().cloned());
        self
    }

    /// Do not constrain integer holes of local preference, MED and AS path length to be
    /// non-negative.
    pub fn allow_negative_holes(&mut self) -> &mut Self {
        self.non_negative_holes = false;
        self
    }

    /// Build the context
    pub fn build(&self) -> SolverContext {
        let mut tokens = self.tokens.clone();
        tokens.entry(DomainKind::Origin).or_default().extend(Origin::ALL.iter().map(|o| o.token()));
        SolverContext {
            domains: Domains::new(tokens),
            communities: self.communities.clone(),
            vars: Vec::new(),
            constraints: Vec::new(),
            names: HashSet::new(),
            non_negative_holes: self.non_negative_holes,
            model: None,
        }
    }
}
