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

//! # Action Algebra
//!
//! An [`Action`] transforms an [`AnnouncementSet`] into a new one. Every action is guarded by a
//! [`Match`]: announcements on which the guard does not match keep all their attributes.

use super::announcement::{to_u32, AnnouncementSet, AttrValue, Attribute, SymAnnouncement};
use super::context::SolverContext;
use super::matches::{int_value, Match};
use super::route_map::RouteMapSet;
use super::types::{DecodeError, DomainError, ShapeError};
use super::value::{BoolValue, IntValue};
use crate::Error;

use log::*;
use std::convert::TryFrom;
use std::fmt;

/// Transformation of announcements
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Set a single attribute
    Set(SetAttribute),
    /// Set the attribute chosen by the synthesis
    SetOne(SetOne),
}

impl Action {
    /// Apply the action to all announcements
    pub fn apply(&self, anns: &AnnouncementSet) -> Result<AnnouncementSet, Error> {
        match self {
            Action::Set(s) => s.apply(anns),
            Action::SetOne(s) => s.apply(anns),
        }
    }

    /// Decode the action into a route-map clause.
    pub fn config(&self, ctx: &SolverContext) -> Result<RouteMapSet, DecodeError> {
        match self {
            Action::Set(s) => s.config(ctx),
            Action::SetOne(s) => s.get_used_action(ctx)?.config(ctx),
        }
    }

    /// Encode a route-map clause, guarded by `guard`. Holes become fresh variables, whose names
    /// are derived from `name`.
    pub fn from_config(
        ctx: &mut SolverContext,
        guard: &Match,
        set: &RouteMapSet,
        name: &str,
    ) -> Result<Self, Error> {
        let value = match set {
            RouteMapSet::NextHop(x) => AttrValue::NextHop(ctx.fresh(name, x.clone())?),
            RouteMapSet::LocalPref(x) => AttrValue::LocalPref(int_value(ctx, name, *x)?),
            RouteMapSet::Med(x) => AttrValue::Med(int_value(ctx, name, *x)?),
            RouteMapSet::Origin(x) => AttrValue::Origin(ctx.fresh(name, *x)?),
            RouteMapSet::AsPathLen(x) => AttrValue::AsPathLen(int_value(ctx, name, *x)?),
            RouteMapSet::Community(c, x) => {
                ctx.check_community(c)?;
                AttrValue::Community(c.clone(), ctx.fresh(name, *x)?)
            }
            RouteMapSet::Permitted(x) => AttrValue::Permitted(ctx.fresh(name, *x)?),
            RouteMapSet::Any => {
                return Ok(Action::SetOne(SetOne::any_attribute(ctx, name, guard.clone())?))
            }
        };
        Ok(Action::Set(SetAttribute::new(ctx, guard.clone(), value)?))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Set(s) => write!(f, "set {} if {}", s.value, s.guard),
            Action::SetOne(s) => write!(f, "set-one {} if {}", s.name, s.guard),
        }
    }
}

/// Set one attribute to a value, on all announcements on which the guard matches.
#[derive(Debug, Clone, PartialEq)]
pub struct SetAttribute {
    guard: Match,
    value: AttrValue,
}

impl SetAttribute {
    /// Create a new action. Fails if the value refers to an undeclared community.
    pub fn new(ctx: &SolverContext, guard: Match, value: AttrValue) -> Result<Self, DomainError> {
        if let AttrValue::Community(c, _) = &value {
            ctx.check_community(c)?;
        }
        Ok(Self { guard, value })
    }

    /// The guard of the action
    pub fn guard(&self) -> &Match {
        &self.guard
    }

    /// The new value
    pub fn value(&self) -> &AttrValue {
        &self.value
    }

    /// Apply the action to all announcements
    pub fn apply(&self, anns: &AnnouncementSet) -> Result<AnnouncementSet, Error> {
        anns.map(|ann| self.apply_one(ann))
    }

    fn apply_one(&self, ann: &SymAnnouncement) -> Result<SymAnnouncement, Error> {
        let matched = self.guard.is_match(ann)?;
        let old = ann.attribute(&self.value.attribute())?;
        let new = AttrValue::ite(&matched, &self.value, &old)?;
        Ok(ann.with_attribute(new)?)
    }

    /// Decode the action into a route-map clause
    pub fn config(&self, ctx: &SolverContext) -> Result<RouteMapSet, DecodeError> {
        Ok(match &self.value {
            AttrValue::NextHop(v) => RouteMapSet::NextHop(Some(v.get(ctx)?)),
            AttrValue::LocalPref(v) => RouteMapSet::LocalPref(Some(to_u32(v.get(ctx)?)?)),
            AttrValue::Med(v) => RouteMapSet::Med(Some(to_u32(v.get(ctx)?)?)),
            AttrValue::Origin(v) => RouteMapSet::Origin(Some(v.get(ctx)?)),
            AttrValue::AsPathLen(v) => RouteMapSet::AsPathLen(Some(to_u32(v.get(ctx)?)?)),
            AttrValue::Community(c, v) => RouteMapSet::Community(c.clone(), Some(v.get(ctx)?)),
            AttrValue::Permitted(v) => RouteMapSet::Permitted(Some(v.get(ctx)?)),
            AttrValue::Prefix(_) | AttrValue::Peer(_) | AttrValue::AsPath(_) => {
                return Err(DecodeError::NotConfigurable(format!("set {}", self.value)))
            }
        })
    }
}

/// Set the attribute chosen by the synthesis. All candidates share the same guard.
#[derive(Debug, Clone, PartialEq)]
pub struct SetOne {
    name: String,
    guard: Match,
    choice: IntValue,
    candidates: Vec<SetAttribute>,
}

impl SetOne {
    /// Create a new selection among the values. Fails if there are no values.
    pub fn new(
        ctx: &mut SolverContext,
        name: &str,
        guard: Match,
        values: Vec<AttrValue>,
    ) -> Result<Self, Error> {
        if values.is_empty() {
            return Err(ShapeError::EmptyCandidates(name.to_string()).into());
        }
        let candidates = values
            .into_iter()
            .map(|v| SetAttribute::new(ctx, guard.clone(), v))
            .collect::<Result<Vec<_>, _>>()?;
        let choice = ctx.fresh::<i64>(&format!("{}_choice", name), None)?;
        let range = BoolValue::and(&[
            choice.ge(&IntValue::constant(0)),
            choice.lt(&IntValue::constant(candidates.len() as i64)),
        ]);
        ctx.register(&format!("{}_range", choice.term()), &range);
        debug!("{} sets one of {} attributes", name, candidates.len());
        Ok(Self { name: name.to_string(), guard, choice, candidates })
    }

    /// Selection among all attributes that can be set, each with a hole for its value.
    pub fn any_attribute(ctx: &mut SolverContext, name: &str, guard: Match) -> Result<Self, Error> {
        let mut attributes = vec![
            Attribute::NextHop,
            Attribute::LocalPref,
            Attribute::Med,
            Attribute::Origin,
            Attribute::AsPathLen,
            Attribute::Permitted,
        ];
        attributes.extend(ctx.communities().cloned().map(Attribute::Community));
        let mut values = Vec::with_capacity(attributes.len());
        for attr in attributes.iter() {
            match AttrValue::hole(ctx, attr, &format!("{}_{}", name, attr)) {
                Ok(value) => values.push(value),
                Err(DomainError::EmptyDomain(kind)) => {
                    debug!("{}: skip attribute {} with empty {} domain", name, attr, kind)
                }
                Err(e) => return Err(e.into()),
            }
        }
        Self::new(ctx, name, guard, values)
    }

    /// Name of the selection
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The choice hole
    pub fn choice(&self) -> &IntValue {
        &self.choice
    }

    /// All candidates
    pub fn candidates(&self) -> &[SetAttribute] {
        &self.candidates
    }

    /// Apply the chosen candidate to all announcements
    pub fn apply(&self, anns: &AnnouncementSet) -> Result<AnnouncementSet, Error> {
        let mut outputs = self
            .candidates
            .iter()
            .map(|c| c.apply(anns))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .enumerate()
            .rev();
        let mut result = match outputs.next() {
            Some((_, last)) => last,
            None => return Ok(anns.clone()),
        };
        for (i, out) in outputs {
            let chosen = self.choice.equals(&IntValue::constant(i as i64));
            let prev = result;
            result = out.map(|a| SymAnnouncement::ite(&chosen, a, &prev[a.index()]))?;
        }
        Ok(result)
    }

    /// Get the candidate chosen in the model bound to the context.
    pub fn get_used_action(&self, ctx: &SolverContext) -> Result<&SetAttribute, DecodeError> {
        let choice = self.choice.get(ctx)?;
        usize::try_from(choice)
            .ok()
            .and_then(|i| self.candidates.get(i))
            .ok_or_else(|| DecodeError::ChoiceOutOfRange(self.name.clone(), choice))
    }
}
