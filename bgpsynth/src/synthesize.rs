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

//! # BgpSynth
//! Wrapper to synthesize the import route-map of a single eBGP router

use crate::smt::Solver;
use crate::synthesis::{
    AnnouncementSet, Announcement, AsId, ChainDefault, Community, ContextBuilder, DecisionProcess,
    DecodeError, NextHop, Peer, PolicyChain, Prefix, RouteMap, Selection, ShapeError,
    SolverContext, Token,
};
use crate::Error;

use log::*;
use std::collections::BTreeMap;

/// The router whose import route-map is synthesized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRouter {
    /// Name of the router. It becomes the peer and the next hop of exported announcements.
    pub name: String,
    /// AS of the router, which is prepended to exported announcements.
    pub as_id: AsId,
}

impl LocalRouter {
    /// Create a new router
    pub fn new(name: impl Into<String>, as_id: AsId) -> Self {
        Self { name: name.into(), as_id }
    }
}

/// # Synthesis Problem
///
/// Announcements received by the router, the import route-map with holes, and the announcements
/// that must be selected. Announcements are identified by their name, and they are ordered by
/// name. This order breaks the ties in the decision process.
///
/// ## Usage
///
/// ```
/// use bgpsynth::smt::EnumerativeSolver;
/// use bgpsynth::synthesis::*;
/// use bgpsynth::{Error, LocalRouter, SynthesisProblem};
///
/// fn main() -> Result<(), Error> {
///     let c1 = Community::new("100:1");
///     let import = RouteMap::new(
///         "import",
///         vec![RouteMapLineBuilder::new()
///             .lineno(10)
///             .permit()
///             .match_community(c1.clone())
///             .set_local_pref_hole()
///             .build()],
///     );
///
///     let mut problem = SynthesisProblem::new(LocalRouter::new("R1", AsId(1)), import);
///     problem
///         .announcement(
///             "ann1",
///             Announcement::new("Prefix1", "Peer1", vec![AsId(2), AsId(3), AsId(4)], "Hop1")
///                 .with_community(c1, true),
///         )
///         .announcement("ann2", Announcement::new("Prefix1", "Peer2", vec![AsId(5)], "Hop2"))
///         .require("ann1");
///
///     let result = problem.synthesize(&mut EnumerativeSolver::new())?;
///     assert_eq!(result.selected[&Prefix::new("Prefix1")], Some(String::from("ann1")));
///     assert_eq!(result.exported["ann1"].as_path[0], AsId(1));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SynthesisProblem {
    router: LocalRouter,
    announcements: BTreeMap<String, Announcement>,
    import: RouteMap,
    requirements: Vec<String>,
    context: ContextBuilder,
    chain_default: ChainDefault,
    decision: DecisionProcess,
}

impl SynthesisProblem {
    /// Create a new problem without announcements
    pub fn new(router: LocalRouter, import: RouteMap) -> Self {
        Self {
            router,
            announcements: BTreeMap::new(),
            import,
            requirements: Vec::new(),
            context: ContextBuilder::new(),
            chain_default: ChainDefault::default(),
            decision: DecisionProcess::default(),
        }
    }

    /// Add a received announcement
    pub fn announcement(&mut self, name: impl Into<String>, ann: Announcement) -> &mut Self {
        self.context.announcement(&ann);
        self.announcements.insert(name.into(), ann);
        self
    }

    /// Require that the announcement is selected for its prefix
    pub fn require(&mut self, name: impl Into<String>) -> &mut Self {
        self.requirements.push(name.into());
        self
    }

    /// Declare a community, which the route-map may add or match on
    pub fn community(&mut self, community: Community) -> &mut Self {
        self.context.community(community);
        self
    }

    /// Add an extra token to the domain of its type, which holes may take.
    pub fn token<T: Token>(&mut self, value: &T) -> &mut Self {
        self.context.token(value);
        self
    }

    /// Set the treatment of announcements that match no line
    pub fn chain_default(&mut self, default: ChainDefault) -> &mut Self {
        self.chain_default = default;
        self
    }

    /// Set the decision process
    pub fn decision_process(&mut self, decision: DecisionProcess) -> &mut Self {
        self.decision = decision;
        self
    }

    /// Do not constrain integer holes to be non-negative
    pub fn allow_negative_holes(&mut self) -> &mut Self {
        self.context.allow_negative_holes();
        self
    }

    /// The received announcements by name, as they are read by the encoding: every declared
    /// community that an announcement does not mention is added as absent.
    pub fn announcements(&self) -> BTreeMap<String, Announcement> {
        let ctx = self.context.build();
        self.announcements
            .iter()
            .map(|(n, a)| (n.clone(), a.clone().with_known_communities(ctx.communities())))
            .collect()
    }

    /// Encode the problem without solving it. All requirements are registered in the context.
    pub fn encode(&self) -> Result<Encoding, Error> {
        let mut ctx = self.context.build();
        let named: Vec<(String, Announcement)> = self.announcements().into_iter().collect();

        info!("Reading {} announcements", named.len());
        let input = AnnouncementSet::new(&ctx, &named)?;
        let chain = PolicyChain::new(&mut ctx, &self.import, &input, self.chain_default)?;
        let selections = self.decision.select_all(&ctx, chain.output())?;

        for name in self.requirements.iter() {
            let index = input
                .index_of(name)
                .ok_or_else(|| ShapeError::UnknownAnnouncement(name.clone()))?;
            let prefix = &named[index].1.prefix;
            let selection = selections
                .get(prefix)
                .ok_or_else(|| ShapeError::UnknownAnnouncement(name.clone()))?;
            ctx.register(&format!("select_{}_{}", prefix, name), &selection.require(index));
        }

        Ok(Encoding { ctx, names: named.into_iter().map(|(n, _)| n).collect(), chain, selections })
    }

    /// Synthesize the route-map. The solver is invoked once.
    pub fn synthesize<S: Solver>(&self, solver: &mut S) -> Result<Synthesis, Error> {
        let mut encoding = self.encode()?;
        encoding.ctx.check(solver)?;
        let result = encoding.decode(&self.router)?;
        info!("Synthesized route-map:\n{}", result.route_map);
        Ok(result)
    }
}

/// Encoded synthesis problem
#[derive(Debug, Clone)]
pub struct Encoding {
    /// Context with all holes and constraints
    pub ctx: SolverContext,
    /// Names of the announcements, in the order of their position
    pub names: Vec<String>,
    /// The encoded import route-map
    pub chain: PolicyChain,
    /// The decision process for every prefix
    pub selections: BTreeMap<Prefix, Selection>,
}

impl Encoding {
    /// Decode the result, using the model bound to the context.
    pub fn decode(&self, router: &LocalRouter) -> Result<Synthesis, Error> {
        let route_map = self.chain.config(&self.ctx)?;
        let imported: BTreeMap<String, Announcement> = self
            .names
            .iter()
            .cloned()
            .zip(self.chain.output().get_all(&self.ctx)?)
            .collect();

        let mut selected = BTreeMap::new();
        let mut exported = BTreeMap::new();
        for (prefix, selection) in self.selections.iter() {
            let winner = match selection.get(&self.ctx)? {
                Some(i) => Some(
                    self.names.get(i).cloned().ok_or(DecodeError::OutOfRange(i as i64))?,
                ),
                None => None,
            };
            if let Some(name) = winner.as_ref() {
                if let Some(ann) = imported.get(name) {
                    debug!("Prefix {} selects {}", prefix, name);
                    exported.insert(
                        name.clone(),
                        ann.exported(
                            router.as_id,
                            Peer::new(router.name.clone()),
                            NextHop::new(router.name.clone()),
                        ),
                    );
                }
            }
            selected.insert(prefix.clone(), winner);
        }

        Ok(Synthesis { route_map, imported, selected, exported })
    }
}

/// Result of the synthesis
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    /// The route-map with all holes filled
    pub route_map: RouteMap,
    /// Every announcement after the import route-map, by name
    pub imported: BTreeMap<String, Announcement>,
    /// Name of the selected announcement for every prefix, or `None` if no announcement is
    /// permitted.
    pub selected: BTreeMap<Prefix, Option<String>>,
    /// Every selected announcement as it is exported to the neighbors, by name
    pub exported: BTreeMap<String, Announcement>,
}
