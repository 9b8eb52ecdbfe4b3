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

//! # Policy Chain
//!
//! Encodes a [`RouteMap`] with holes over a set of input announcements. The chain follows
//! first-match-wins semantics: every announcement is handled by the first line (in line number
//! order) whose conditions match, or by no line at all. This choice is made explicit by one
//! selector per input announcement, which evaluates to the line number of the handling line, or
//! to [`NO_LINE`].
//!
//! The lines are applied one after the other. Each line only modifies the announcements it
//! handles: first, the permitted flag is set to the access of the line, and then all set-clauses
//! are applied to the announcements that are still permitted. The state after every line is
//! kept as a snapshot.

use super::actions::Action;
use super::announcement::{AnnouncementSet, AttrValue};
use super::context::SolverContext;
use super::matches::{Match, SelectorMatch};
use super::route_map::{Access, ChainDefault, RouteMap, RouteMapLine};
use super::types::{DecodeError, ShapeError};
use super::value::{BoolValue, IntValue};
use crate::Error;

use log::*;
use std::collections::HashSet;
use std::convert::TryFrom;
use std::rc::Rc;

/// Selector value of announcements that are handled by no line.
pub const NO_LINE: i64 = -1;

#[derive(Debug, Clone)]
struct EncodedLine {
    lineno: usize,
    access: Access,
    permit: BoolValue,
    conds: Vec<Match>,
    guard: Match,
    actions: Vec<Action>,
}

/// Symbolic encoding of a route-map applied to a set of announcements.
#[derive(Debug, Clone)]
pub struct PolicyChain {
    name: String,
    default: ChainDefault,
    lines: Vec<EncodedLine>,
    selectors: Rc<Vec<IntValue>>,
    snapshots: Vec<AnnouncementSet>,
    output: AnnouncementSet,
}

impl PolicyChain {
    /// Encode the route-map on the input announcements. All holes of the route-map are declared
    /// in the context.
    ///
    /// Fails if two lines share the same line number, or if a line that always denies has
    /// set-clauses.
    pub fn new(
        ctx: &mut SolverContext,
        route_map: &RouteMap,
        input: &AnnouncementSet,
        default: ChainDefault,
    ) -> Result<Self, Error> {
        let name = route_map.name().to_string();
        Self::validate(route_map)?;

        // encode the matches and the access of every line
        let mut lines = Vec::with_capacity(route_map.lines().len());
        for line in route_map.lines() {
            let line_name = format!("{}_{}", name, line.lineno());
            let conds = line
                .conds()
                .iter()
                .enumerate()
                .map(|(i, c)| Match::from_config(ctx, c, &format!("{}_match{}", line_name, i)))
                .collect::<Result<Vec<_>, _>>()?;
            let guard = match conds.len() {
                0 => Match::All,
                1 => conds[0].clone(),
                _ => Match::And(conds.clone()),
            };
            let permit = match line.access() {
                Access::Permit => BoolValue::constant(true),
                Access::Deny => BoolValue::constant(false),
                Access::Unset => ctx.fresh::<bool>(&format!("{}_access", line_name), None)?,
            };
            lines.push(EncodedLine {
                lineno: line.lineno(),
                access: line.access(),
                permit,
                conds,
                guard,
                actions: Vec::new(),
            });
        }

        // first match wins, evaluated on the input of the chain
        let selectors = input
            .iter()
            .map(|ann| {
                let mut selector = IntValue::constant(NO_LINE);
                for line in lines.iter().rev() {
                    let matched = line.guard.is_match(ann)?;
                    selector =
                        IntValue::ite(&matched, &IntValue::constant(line.lineno as i64), &selector);
                }
                Ok(selector)
            })
            .collect::<Result<Vec<_>, Error>>()?;
        let selectors = Rc::new(selectors);

        // apply the lines one after the other
        let mut snapshots = vec![input.clone()];
        let mut state = input.clone();
        for (line, config) in lines.iter_mut().zip(route_map.lines()) {
            let line_name = format!("{}_{}", name, line.lineno);
            let selected =
                Match::Selector(SelectorMatch::new(line.lineno as i64, selectors.clone()));

            state = state.map(|ann| {
                let handled = selected.is_match(ann)?;
                let permitted = BoolValue::ite(&handled, &line.permit, &ann.permitted);
                Ok(ann.with_attribute(AttrValue::Permitted(permitted))?)
            })?;

            let action_guard = Match::And(vec![
                selected.clone(),
                Match::Attribute(AttrValue::Permitted(BoolValue::constant(true))),
            ]);
            for (i, set) in config.actions().iter().enumerate() {
                let set_name = format!("{}_set{}", line_name, i);
                let action = Action::from_config(ctx, &action_guard, set, &set_name)?;
                state = action.apply(&state)?;
                line.actions.push(action);
            }
            snapshots.push(state.clone());
        }

        let output = match default {
            ChainDefault::PassThrough => state,
            ChainDefault::Deny => state.map(|ann| {
                let unhandled = selectors[ann.index()].equals(&IntValue::constant(NO_LINE));
                let permitted =
                    BoolValue::ite(&unhandled, &BoolValue::constant(false), &ann.permitted);
                Ok(ann.with_attribute(AttrValue::Permitted(permitted))?)
            })?,
        };

        info!(
            "Encoded route-map {} with {} lines on {} announcements",
            name,
            lines.len(),
            input.len()
        );

        Ok(Self { name, default, lines, selectors, snapshots, output })
    }

    fn validate(route_map: &RouteMap) -> Result<(), ShapeError> {
        let mut seen = HashSet::new();
        for line in route_map.lines() {
            if !seen.insert(line.lineno()) {
                return Err(ShapeError::DuplicateLine(route_map.name().to_string(), line.lineno()));
            }
            if line.access().is_deny() && !line.actions().is_empty() {
                return Err(ShapeError::DenyWithActions(
                    route_map.name().to_string(),
                    line.lineno(),
                ));
            }
        }
        Ok(())
    }

    /// Name of the route-map
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Treatment of announcements handled by no line
    pub fn default(&self) -> ChainDefault {
        self.default
    }

    /// Announcements before the first line
    pub fn input(&self) -> &AnnouncementSet {
        &self.snapshots[0]
    }

    /// State of the announcements before the first line, and after every line.
    pub fn snapshots(&self) -> &[AnnouncementSet] {
        &self.snapshots
    }

    /// State of the announcements after the line with the given number was applied.
    pub fn snapshot_after(&self, lineno: usize) -> Option<&AnnouncementSet> {
        self.lines.iter().position(|l| l.lineno == lineno).map(|i| &self.snapshots[i + 1])
    }

    /// Announcements after the whole route-map, including the default treatment.
    pub fn output(&self) -> &AnnouncementSet {
        &self.output
    }

    /// Selector of every input announcement
    pub fn selectors(&self) -> &[IntValue] {
        &self.selectors
    }

    /// Line number that handles the announcement in the model bound to the context, or `None` if
    /// no line handles it.
    pub fn selected_line(
        &self,
        ctx: &SolverContext,
        index: usize,
    ) -> Result<Option<usize>, DecodeError> {
        let selector = self
            .selectors
            .get(index)
            .ok_or_else(|| DecodeError::Unresolved(format!("selector {}", index)))?
            .get(ctx)?;
        if selector == NO_LINE {
            Ok(None)
        } else {
            usize::try_from(selector).map(Some).map_err(|_| DecodeError::OutOfRange(selector))
        }
    }

    /// Decode the route-map with all holes filled, using the model bound to the context. Lines
    /// that deny have no set-clauses.
    pub fn config(&self, ctx: &SolverContext) -> Result<RouteMap, DecodeError> {
        let lines = self
            .lines
            .iter()
            .map(|line| {
                let access = match line.access {
                    Access::Unset if line.permit.get(ctx)? => Access::Permit,
                    Access::Unset => Access::Deny,
                    a => a,
                };
                let conds = line.conds.iter().map(|c| c.config(ctx)).collect::<Result<_, _>>()?;
                let set = if access.is_deny() {
                    Vec::new()
                } else {
                    line.actions.iter().map(|a| a.config(ctx)).collect::<Result<_, _>>()?
                };
                Ok(RouteMapLine::new(line.lineno, access, conds, set))
            })
            .collect::<Result<Vec<_>, DecodeError>>()?;
        Ok(RouteMap::new(self.name.clone(), lines))
    }
}
