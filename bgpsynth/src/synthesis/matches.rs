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

//! # Match Algebra
//!
//! A [`Match`] is a predicate over a single symbolic announcement. Evaluating a match produces a
//! [`BoolValue`], which is concrete whenever the outcome does not depend on any hole.

use super::announcement::{to_u32, AttrValue, Attribute, SymAnnouncement};
use super::context::SolverContext;
use super::route_map::RouteMapMatch;
use super::types::{DecodeError, DomainError, ShapeError};
use super::value::{BoolValue, IntValue};
use crate::Error;

use itertools::Itertools;
use log::*;
use std::convert::TryFrom;
use std::fmt;
use std::rc::Rc;

/// Predicate over an announcement
#[derive(Debug, Clone, PartialEq)]
pub enum Match {
    /// Matches every announcement
    All,
    /// Matches if the attribute of the announcement equals the value
    Attribute(AttrValue),
    /// Matches if all sub-matches match
    And(Vec<Match>),
    /// Matches if any sub-match matches
    Or(Vec<Match>),
    /// Matches if the candidate chosen by the synthesis matches
    SelectOne(SelectOne),
    /// Matches if the announcement is handled by a specific line of a policy chain
    Selector(SelectorMatch),
}

impl Match {
    /// Create an attribute match. Fails if the value refers to an undeclared community.
    pub fn attribute(ctx: &SolverContext, value: AttrValue) -> Result<Self, DomainError> {
        if let AttrValue::Community(c, _) = &value {
            ctx.check_community(c)?;
        }
        Ok(Match::Attribute(value))
    }

    /// Evaluate the match on an announcement.
    pub fn is_match(&self, ann: &SymAnnouncement) -> Result<BoolValue, Error> {
        Ok(match self {
            Match::All => BoolValue::constant(true),
            Match::Attribute(value) => ann.attribute(&value.attribute())?.equals(value)?,
            Match::And(matches) => BoolValue::and(
                &matches.iter().map(|m| m.is_match(ann)).collect::<Result<Vec<_>, _>>()?,
            ),
            Match::Or(matches) => BoolValue::or(
                &matches.iter().map(|m| m.is_match(ann)).collect::<Result<Vec<_>, _>>()?,
            ),
            Match::SelectOne(s) => s.is_match(ann)?,
            Match::Selector(s) => s.is_match(ann)?,
        })
    }

    /// Decode the match into a route-map clause. Only attribute matches and selections of
    /// attribute matches can be expressed as a clause.
    pub fn config(&self, ctx: &SolverContext) -> Result<RouteMapMatch, DecodeError> {
        let not_configurable = || DecodeError::NotConfigurable(format!("match {}", self));
        Ok(match self {
            Match::Attribute(value) => match value {
                AttrValue::Prefix(v) => RouteMapMatch::Prefix(Some(v.get(ctx)?)),
                AttrValue::Peer(v) => RouteMapMatch::Peer(Some(v.get(ctx)?)),
                AttrValue::Origin(v) => RouteMapMatch::Origin(Some(v.get(ctx)?)),
                AttrValue::AsPath(v) => RouteMapMatch::AsPath(Some(v.get(ctx)?)),
                AttrValue::AsPathLen(v) => RouteMapMatch::AsPathLen(Some(to_u32(v.get(ctx)?)?)),
                AttrValue::NextHop(v) => RouteMapMatch::NextHop(Some(v.get(ctx)?)),
                AttrValue::LocalPref(v) => RouteMapMatch::LocalPref(Some(to_u32(v.get(ctx)?)?)),
                AttrValue::Med(v) => RouteMapMatch::Med(Some(to_u32(v.get(ctx)?)?)),
                AttrValue::Community(c, v) => {
                    // the absence of a community has no clause
                    if v.get(ctx)? {
                        RouteMapMatch::Community(Some(c.clone()))
                    } else {
                        return Err(not_configurable());
                    }
                }
                AttrValue::Permitted(_) => return Err(not_configurable()),
            },
            Match::SelectOne(s) => s.get_used_match(ctx)?.config(ctx)?,
            Match::All | Match::And(_) | Match::Or(_) | Match::Selector(_) => {
                return Err(not_configurable())
            }
        })
    }

    /// Encode a route-map clause. Holes become fresh variables, whose names are derived from
    /// `name`.
    pub fn from_config(
        ctx: &mut SolverContext,
        cond: &RouteMapMatch,
        name: &str,
    ) -> Result<Self, Error> {
        Ok(match cond {
            RouteMapMatch::Prefix(x) => {
                Match::Attribute(AttrValue::Prefix(ctx.fresh(name, x.clone())?))
            }
            RouteMapMatch::Peer(x) => {
                Match::Attribute(AttrValue::Peer(ctx.fresh(name, x.clone())?))
            }
            RouteMapMatch::Origin(x) => Match::Attribute(AttrValue::Origin(ctx.fresh(name, *x)?)),
            RouteMapMatch::AsPath(x) => {
                Match::Attribute(AttrValue::AsPath(ctx.fresh(name, x.clone())?))
            }
            RouteMapMatch::AsPathLen(x) => {
                Match::Attribute(AttrValue::AsPathLen(int_value(ctx, name, *x)?))
            }
            RouteMapMatch::NextHop(x) => {
                Match::Attribute(AttrValue::NextHop(ctx.fresh(name, x.clone())?))
            }
            RouteMapMatch::LocalPref(x) => {
                Match::Attribute(AttrValue::LocalPref(int_value(ctx, name, *x)?))
            }
            RouteMapMatch::Med(x) => Match::Attribute(AttrValue::Med(int_value(ctx, name, *x)?)),
            RouteMapMatch::Community(Some(c)) => {
                Match::attribute(ctx, AttrValue::Community(c.clone(), BoolValue::constant(true)))?
            }
            RouteMapMatch::Community(None) => Match::SelectOne(SelectOne::community(ctx, name)?),
            RouteMapMatch::Any => Match::SelectOne(SelectOne::any_attribute(ctx, name)?),
        })
    }
}

/// Concrete integer for `Some`, or a non-negative hole for `None`.
pub(crate) fn int_value(
    ctx: &mut SolverContext,
    name: &str,
    value: Option<u32>,
) -> Result<IntValue, DomainError> {
    match value {
        Some(v) => Ok(IntValue::constant(i64::from(v))),
        None => ctx.fresh_attribute_int(name),
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Match::All => write!(f, "all"),
            Match::Attribute(value) => write!(f, "{}", value),
            Match::And(matches) => write!(f, "({})", matches.iter().join(" and ")),
            Match::Or(matches) => write!(f, "({})", matches.iter().join(" or ")),
            Match::SelectOne(s) => write!(f, "select-one {}", s.name),
            Match::Selector(s) => write!(f, "selected by line {}", s.lineno),
        }
    }
}

/// Match whose candidate is chosen by the synthesis. The choice is an integer hole, constrained
/// to index one of the candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectOne {
    name: String,
    choice: IntValue,
    candidates: Vec<Match>,
}

impl SelectOne {
    /// Create a new selection among the candidates. Fails if there are no candidates.
    pub fn new(ctx: &mut SolverContext, name: &str, candidates: Vec<Match>) -> Result<Self, Error> {
        if candidates.is_empty() {
            return Err(ShapeError::EmptyCandidates(name.to_string()).into());
        }
        let choice = ctx.fresh::<i64>(&format!("{}_choice", name), None)?;
        let range = BoolValue::and(&[
            choice.ge(&IntValue::constant(0)),
            choice.lt(&IntValue::constant(candidates.len() as i64)),
        ]);
        ctx.register(&format!("{}_range", choice.term()), &range);
        debug!("{} selects among {} candidates", name, candidates.len());
        Ok(Self { name: name.to_string(), choice, candidates })
    }

    /// Selection among all attributes, with a hole for the value of each. Attributes whose
    /// domain is empty are skipped. For communities, one candidate matches the presence of each
    /// declared community.
    pub fn any_attribute(ctx: &mut SolverContext, name: &str) -> Result<Self, Error> {
        let mut candidates = Vec::new();
        for attr in Attribute::FIXED.iter().filter(|a| **a != Attribute::Permitted) {
            match AttrValue::hole(ctx, attr, &format!("{}_{}", name, attr)) {
                Ok(value) => candidates.push(Match::Attribute(value)),
                Err(DomainError::EmptyDomain(kind)) => {
                    debug!("{}: skip attribute {} with empty {} domain", name, attr, kind)
                }
                Err(e) => return Err(e.into()),
            }
        }
        candidates.extend(community_candidates(ctx));
        Self::new(ctx, name, candidates)
    }

    /// Selection among the presence of every declared community
    pub fn community(ctx: &mut SolverContext, name: &str) -> Result<Self, Error> {
        let candidates = community_candidates(ctx);
        Self::new(ctx, name, candidates)
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
    pub fn candidates(&self) -> &[Match] {
        &self.candidates
    }

    /// Evaluate the chosen candidate on the announcement.
    pub fn is_match(&self, ann: &SymAnnouncement) -> Result<BoolValue, Error> {
        let mut results = self
            .candidates
            .iter()
            .map(|m| m.is_match(ann))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .enumerate()
            .rev();
        // the last candidate is taken whenever no other one is chosen
        let mut result = match results.next() {
            Some((_, last)) => last,
            None => return Ok(BoolValue::constant(false)),
        };
        for (i, r) in results {
            let chosen = self.choice.equals(&IntValue::constant(i as i64));
            result = BoolValue::ite(&chosen, &r, &result);
        }
        Ok(result)
    }

    /// Get the candidate chosen in the model bound to the context.
    pub fn get_used_match(&self, ctx: &SolverContext) -> Result<&Match, DecodeError> {
        let choice = self.choice.get(ctx)?;
        usize::try_from(choice)
            .ok()
            .and_then(|i| self.candidates.get(i))
            .ok_or_else(|| DecodeError::ChoiceOutOfRange(self.name.clone(), choice))
    }
}

fn community_candidates(ctx: &SolverContext) -> Vec<Match> {
    ctx.communities()
        .map(|c| Match::Attribute(AttrValue::Community(c.clone(), BoolValue::constant(true))))
        .collect()
}

/// Match on the line of a policy chain that handles the announcement. The selectors are shared
/// among all lines of the chain, and contain one entry per announcement in the chain's input.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorMatch {
    lineno: i64,
    selectors: Rc<Vec<IntValue>>,
}

impl SelectorMatch {
    /// Create a new selector match for the line
    pub fn new(lineno: i64, selectors: Rc<Vec<IntValue>>) -> Self {
        Self { lineno, selectors }
    }

    /// Line number on which the match matches
    pub fn lineno(&self) -> i64 {
        self.lineno
    }

    /// Returns true if the announcement is handled by the line.
    pub fn is_match(&self, ann: &SymAnnouncement) -> Result<BoolValue, ShapeError> {
        self.selectors
            .get(ann.index())
            .map(|s| s.equals(&IntValue::constant(self.lineno)))
            .ok_or_else(|| ShapeError::UnknownAnnouncement(ann.name().to_string()))
    }
}
