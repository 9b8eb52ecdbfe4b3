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

//! # Decision Process
//!
//! Reduced BGP best-path selection. Among all permitted announcements for a prefix, the best one
//! is chosen by comparing a list of criteria lexicographically. By default, the highest local
//! preference wins, and ties are broken by the shortest AS path. The remaining ties are broken by
//! the position of the announcement in its set, such that the best announcement is always unique.

use super::announcement::{Announcement, AnnouncementSet, SymAnnouncement};
use super::context::SolverContext;
use super::types::{DecodeError, DomainKind, Prefix};
use super::value::{BoolValue, IntValue};
use crate::Error;

use log::*;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::convert::TryFrom;

/// Winner value if no announcement is eligible
pub const NO_ROUTE: i64 = -1;

/// Attribute compared in the decision process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    /// Local preference
    LocalPref,
    /// AS path length
    AsPathLen,
    /// Multi-exit discriminator
    Med,
}

impl Criterion {
    fn symbolic<'a>(&self, ann: &'a SymAnnouncement) -> &'a IntValue {
        match self {
            Criterion::LocalPref => &ann.local_pref,
            Criterion::AsPathLen => &ann.as_path_len,
            Criterion::Med => &ann.med,
        }
    }

    fn concrete(&self, ann: &Announcement) -> u32 {
        match self {
            Criterion::LocalPref => ann.local_pref,
            Criterion::AsPathLen => ann.as_path_len,
            Criterion::Med => ann.med,
        }
    }
}

/// Which value of a criterion is preferred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preference {
    /// Higher is better
    Max,
    /// Lower is better
    Min,
}

/// Configuration of the decision process
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionProcess {
    criteria: Vec<(Criterion, Preference)>,
}

impl Default for DecisionProcess {
    fn default() -> Self {
        Self {
            criteria: vec![
                (Criterion::LocalPref, Preference::Max),
                (Criterion::AsPathLen, Preference::Min),
            ],
        }
    }
}

impl DecisionProcess {
    /// Create a decision process with the given criteria, compared in order.
    pub fn new(criteria: Vec<(Criterion, Preference)>) -> Self {
        Self { criteria }
    }

    /// Additionally compare the MED (lower is better) after all other criteria.
    pub fn with_med(mut self) -> Self {
        self.criteria.push((Criterion::Med, Preference::Min));
        self
    }

    /// The criteria, in the order in which they are compared
    pub fn criteria(&self) -> &[(Criterion, Preference)] {
        &self.criteria
    }

    /// Symbolic: announcement `a` is preferred over `b`.
    fn beats(&self, a: &SymAnnouncement, b: &SymAnnouncement) -> BoolValue {
        let mut result = BoolValue::constant(a.index() < b.index());
        for (criterion, preference) in self.criteria.iter().rev() {
            let x = criterion.symbolic(a);
            let y = criterion.symbolic(b);
            let better = match preference {
                Preference::Max => x.gt(y),
                Preference::Min => x.lt(y),
            };
            let tie = x.equals(y);
            result = BoolValue::or(&[better, BoolValue::and(&[tie, result])]);
        }
        result
    }

    /// Select the best announcement for the prefix. Fails if the prefix is not a member of the
    /// prefix domain.
    pub fn select(
        &self,
        ctx: &SolverContext,
        prefix: &Prefix,
        anns: &AnnouncementSet,
    ) -> Result<Selection, Error> {
        let target = ctx.constant(prefix.clone())?;
        // announcements that are concretely ineligible can never be selected
        let mut eligible: Vec<(&SymAnnouncement, BoolValue)> = Vec::new();
        for ann in anns.iter() {
            let e = BoolValue::and(&[ann.permitted.clone(), ann.prefix.equals(&target)]);
            if e.concrete() != Some(&false) {
                eligible.push((ann, e));
            }
        }

        let mut best = Vec::with_capacity(eligible.len());
        for (ann, e) in eligible.iter() {
            let mut conds = vec![e.clone()];
            for (other, other_e) in eligible.iter().filter(|(o, _)| o.index() != ann.index()) {
                conds.push(BoolValue::or(&[other_e.not(), self.beats(ann, other)]));
            }
            best.push((ann.index(), BoolValue::and(&conds)));
        }

        let mut winner = IntValue::constant(NO_ROUTE);
        for (index, is_best) in best.iter().rev() {
            winner = IntValue::ite(is_best, &IntValue::constant(*index as i64), &winner);
        }

        debug!("Prefix {} has {} candidate announcements", prefix, best.len());
        Ok(Selection { prefix: prefix.clone(), best, winner })
    }

    /// Select the best announcement for every prefix of the domain.
    pub fn select_all(
        &self,
        ctx: &SolverContext,
        anns: &AnnouncementSet,
    ) -> Result<BTreeMap<Prefix, Selection>, Error> {
        ctx.domains()
            .get(DomainKind::Prefix)
            .tokens()
            .iter()
            .map(|p| {
                let prefix = Prefix::new(p.clone());
                let selection = self.select(ctx, &prefix, anns)?;
                Ok((prefix, selection))
            })
            .collect()
    }

    /// Compare two concrete announcements. `Ordering::Greater` means that `a` is preferred.
    pub fn compare(&self, a: &Announcement, b: &Announcement) -> Ordering {
        for (criterion, preference) in self.criteria.iter() {
            let ord = criterion.concrete(a).cmp(&criterion.concrete(b));
            match (ord, preference) {
                (Ordering::Equal, _) => {}
                (o, Preference::Max) => return o,
                (o, Preference::Min) => return o.reverse(),
            }
        }
        Ordering::Equal
    }

    /// Select the best permitted concrete announcement for the prefix. Ties are broken by the
    /// lower position.
    pub fn best(&self, prefix: &Prefix, anns: &[Announcement]) -> Option<usize> {
        anns.iter()
            .enumerate()
            .filter(|(_, a)| a.permitted && &a.prefix == prefix)
            .fold(None, |best: Option<(usize, &Announcement)>, (i, a)| match best {
                Some((_, b)) if self.compare(a, b) != Ordering::Greater => best,
                _ => Some((i, a)),
            })
            .map(|(i, _)| i)
    }
}

/// Result of the decision process for a single prefix
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    prefix: Prefix,
    best: Vec<(usize, BoolValue)>,
    winner: IntValue,
}

impl Selection {
    /// The prefix
    pub fn prefix(&self) -> &Prefix {
        &self.prefix
    }

    /// Position of the selected announcement, or [`NO_ROUTE`].
    pub fn winner(&self) -> &IntValue {
        &self.winner
    }

    /// Positions of all announcements that may be selected
    pub fn candidates(&self) -> Vec<usize> {
        self.best.iter().map(|(i, _)| *i).collect()
    }

    /// Condition under which the announcement at the position is selected
    pub fn is_selected(&self, index: usize) -> BoolValue {
        self.best
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, b)| b.clone())
            .unwrap_or_else(|| BoolValue::constant(false))
    }

    /// Requirement that the announcement at the position is selected
    pub fn require(&self, index: usize) -> BoolValue {
        self.winner.equals(&IntValue::constant(index as i64))
    }

    /// Position of the selected announcement in the model bound to the context, or `None` if no
    /// announcement is eligible.
    pub fn get(&self, ctx: &SolverContext) -> Result<Option<usize>, DecodeError> {
        let winner = self.winner.get(ctx)?;
        if winner == NO_ROUTE {
            Ok(None)
        } else {
            usize::try_from(winner).map(Some).map_err(|_| DecodeError::OutOfRange(winner))
        }
    }
}
