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

//! # Route-Maps
//!
//! This module contains the configuration side of a route-map: an ordered list of lines, each
//! with match clauses, set clauses and an access. Every clause may contain a hole (`None`), which
//! is filled in by the synthesis. Clauses of the form `Any` are holes over the kind of the
//! clause itself.

use super::announcement::Announcement;
use super::types::{AsPathSig, Community, DecodeError, NextHop, Origin, Peer, Prefix};

use std::fmt;

/// # Main RouteMap structure
/// Ordered sequence of lines, identified by a name. Use the [`RouteMapLineBuilder`] to build the
/// lines:
///
/// ```
/// # use bgpsynth::synthesis::*;
/// let line = RouteMapLineBuilder::new()
///     .lineno(10)
///     .permit()
///     .match_community(Community::new("100:1"))
///     .set_local_pref_hole()
///     .build();
/// let map = RouteMap::new("import", vec![line]);
/// assert!(map.has_holes());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMap {
    name: String,
    lines: Vec<RouteMapLine>,
}

impl RouteMap {
    /// Create a new route-map. The lines are sorted by their line number.
    pub fn new(name: impl Into<String>, mut lines: Vec<RouteMapLine>) -> Self {
        lines.sort_by_key(|l| l.lineno);
        Self { name: name.into(), lines }
    }

    /// Name of the route-map
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All lines, sorted by line number
    pub fn lines(&self) -> &[RouteMapLine] {
        &self.lines
    }

    /// Get the line with the given line number
    pub fn line(&self, lineno: usize) -> Option<&RouteMapLine> {
        self.lines.iter().find(|l| l.lineno == lineno)
    }

    /// Returns true if any line contains a hole.
    pub fn has_holes(&self) -> bool {
        self.lines.iter().any(|l| l.has_holes())
    }

    /// Apply a route-map without holes to a concrete announcement. The first matching line
    /// decides. If no line matches, the announcement is treated according to `default`.
    pub fn apply(
        &self,
        ann: &Announcement,
        default: ChainDefault,
    ) -> Result<Announcement, DecodeError> {
        for line in self.lines.iter() {
            if line.matches(ann)? {
                return line.apply(ann);
            }
        }
        let mut ann = ann.clone();
        if default == ChainDefault::Deny {
            ann.permitted = false;
        }
        Ok(ann)
    }
}

impl fmt::Display for RouteMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines.iter() {
            writeln!(f, "route-map {} {} {}", self.name, line.access, line.lineno)?;
            for c in line.conds.iter() {
                writeln!(f, "  match {}", c)?;
            }
            for s in line.set.iter() {
                writeln!(f, "  set {}", s)?;
            }
        }
        Ok(())
    }
}

/// Treatment of announcements that match no line of a route-map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainDefault {
    /// The announcement passes unchanged.
    PassThrough,
    /// The announcement is denied.
    Deny,
}

impl Default for ChainDefault {
    fn default() -> Self {
        ChainDefault::PassThrough
    }
}

/// Single line of a route-map
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMapLine {
    /// Line number. Lower numbers are checked first.
    pub(crate) lineno: usize,
    /// Either permit, deny or a hole.
    pub(crate) access: Access,
    /// Match clauses, connected in an and
    pub(crate) conds: Vec<RouteMapMatch>,
    /// Set clauses, applied in order
    pub(crate) set: Vec<RouteMapSet>,
}

impl RouteMapLine {
    /// Generate a new line
    pub fn new(
        lineno: usize,
        access: Access,
        conds: Vec<RouteMapMatch>,
        set: Vec<RouteMapSet>,
    ) -> Self {
        Self { lineno, access, conds, set }
    }

    /// Returns the line number
    pub fn lineno(&self) -> usize {
        self.lineno
    }

    /// Returns the access
    pub fn access(&self) -> Access {
        self.access
    }

    /// Return a reference to the conditions
    pub fn conds(&self) -> &[RouteMapMatch] {
        &self.conds
    }

    /// Return a reference to the actions
    pub fn actions(&self) -> &[RouteMapSet] {
        &self.set
    }

    /// Returns true if any clause or the access is a hole
    pub fn has_holes(&self) -> bool {
        self.access == Access::Unset
            || self.conds.iter().any(|c| c.is_hole())
            || self.set.iter().any(|s| s.is_hole())
    }

    /// Returns wether the line matches the concrete announcement. Fails if a condition is a
    /// hole.
    pub fn matches(&self, ann: &Announcement) -> Result<bool, DecodeError> {
        for c in self.conds.iter() {
            if !c.matches(ann)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Apply the access and all set clauses of the line to a concrete announcement, assuming
    /// that the line matches. Fails if the access or a set clause is a hole.
    pub fn apply(&self, ann: &Announcement) -> Result<Announcement, DecodeError> {
        let mut ann = ann.clone();
        match self.access {
            Access::Permit => ann.permitted = true,
            Access::Deny => ann.permitted = false,
            Access::Unset => {
                return Err(DecodeError::NotConfigurable(format!("line {} access", self.lineno)))
            }
        }
        // a dropped announcement is not modified by the remaining set clauses
        for s in self.set.iter() {
            if !ann.permitted {
                break;
            }
            s.apply(&mut ann)?;
        }
        Ok(ann)
    }
}

/// # Route-Map Line Builder
///
/// Convenience type to build a line of a route-map. You are required to at least call `lineno`
/// and one of `access`, `permit`, `deny` or `access_hole` on the builder, before you can call
/// `build`. If you don't add any match clause, the line will match on any announcement.
/// ```
/// # use bgpsynth::synthesis::*;
/// let line = RouteMapLineBuilder::new()
///     .lineno(10)
///     .access_hole()
///     .match_prefix(Prefix::new("Prefix1"))
///     .match_next_hop_hole()
///     .set_med(10)
///     .build();
/// assert_eq!(line.conds().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct RouteMapLineBuilder {
    lineno: Option<usize>,
    access: Option<Access>,
    conds: Vec<RouteMapMatch>,
    set: Vec<RouteMapSet>,
}

impl RouteMapLineBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the line number.
    pub fn lineno(&mut self, lineno: usize) -> &mut Self {
        self.lineno = Some(lineno);
        self
    }

    /// Set the access of the line.
    pub fn access(&mut self, access: Access) -> &mut Self {
        self.access = Some(access);
        self
    }

    /// Set the access to permit. Identical to `access(Access::Permit)`.
    pub fn permit(&mut self) -> &mut Self {
        self.access = Some(Access::Permit);
        self
    }

    /// Set the access to deny. Identical to `access(Access::Deny)`.
    pub fn deny(&mut self) -> &mut Self {
        self.access = Some(Access::Deny);
        self
    }

    /// Leave the access to the synthesis. Identical to `access(Access::Unset)`.
    pub fn access_hole(&mut self) -> &mut Self {
        self.access = Some(Access::Unset);
        self
    }

    /// Add a match clause.
    pub fn cond(&mut self, cond: RouteMapMatch) -> &mut Self {
        self.conds.push(cond);
        self
    }

    /// Match on the prefix
    pub fn match_prefix(&mut self, prefix: Prefix) -> &mut Self {
        self.conds.push(RouteMapMatch::Prefix(Some(prefix)));
        self
    }

    /// Match on a prefix chosen by the synthesis
    pub fn match_prefix_hole(&mut self) -> &mut Self {
        self.conds.push(RouteMapMatch::Prefix(None));
        self
    }

    /// Match on the peer
    pub fn match_peer(&mut self, peer: Peer) -> &mut Self {
        self.conds.push(RouteMapMatch::Peer(Some(peer)));
        self
    }

    /// Match on the next hop
    pub fn match_next_hop(&mut self, next_hop: NextHop) -> &mut Self {
        self.conds.push(RouteMapMatch::NextHop(Some(next_hop)));
        self
    }

    /// Match on a next hop chosen by the synthesis
    pub fn match_next_hop_hole(&mut self) -> &mut Self {
        self.conds.push(RouteMapMatch::NextHop(None));
        self
    }

    /// Match on the presence of a community
    pub fn match_community(&mut self, community: Community) -> &mut Self {
        self.conds.push(RouteMapMatch::Community(Some(community)));
        self
    }

    /// Match on the presence of a community chosen by the synthesis
    pub fn match_community_hole(&mut self) -> &mut Self {
        self.conds.push(RouteMapMatch::Community(None));
        self
    }

    /// Match on the local preference
    pub fn match_local_pref(&mut self, local_pref: u32) -> &mut Self {
        self.conds.push(RouteMapMatch::LocalPref(Some(local_pref)));
        self
    }

    /// Match on the AS path length
    pub fn match_as_path_len(&mut self, len: u32) -> &mut Self {
        self.conds.push(RouteMapMatch::AsPathLen(Some(len)));
        self
    }

    /// Match on any attribute, where both the attribute and its value are chosen by the
    /// synthesis.
    pub fn match_any(&mut self) -> &mut Self {
        self.conds.push(RouteMapMatch::Any);
        self
    }

    /// Add a set clause.
    pub fn add_set(&mut self, set: RouteMapSet) -> &mut Self {
        self.set.push(set);
        self
    }

    /// Overwrite the next hop
    pub fn set_next_hop(&mut self, next_hop: NextHop) -> &mut Self {
        self.set.push(RouteMapSet::NextHop(Some(next_hop)));
        self
    }

    /// Overwrite the local preference
    pub fn set_local_pref(&mut self, local_pref: u32) -> &mut Self {
        self.set.push(RouteMapSet::LocalPref(Some(local_pref)));
        self
    }

    /// Overwrite the local preference with a value chosen by the synthesis
    pub fn set_local_pref_hole(&mut self) -> &mut Self {
        self.set.push(RouteMapSet::LocalPref(None));
        self
    }

    /// Overwrite the MED
    pub fn set_med(&mut self, med: u32) -> &mut Self {
        self.set.push(RouteMapSet::Med(Some(med)));
        self
    }

    /// Overwrite the MED with a value chosen by the synthesis
    pub fn set_med_hole(&mut self) -> &mut Self {
        self.set.push(RouteMapSet::Med(None));
        self
    }

    /// Add (`true`) or remove (`false`) a community
    pub fn set_community(&mut self, community: Community, present: bool) -> &mut Self {
        self.set.push(RouteMapSet::Community(community, Some(present)));
        self
    }

    /// Drop the announcement, such that it is never selected
    pub fn set_drop(&mut self) -> &mut Self {
        self.set.push(RouteMapSet::Permitted(Some(false)));
        self
    }

    /// Let the synthesis decide whether the announcement is dropped
    pub fn set_drop_hole(&mut self) -> &mut Self {
        self.set.push(RouteMapSet::Permitted(None));
        self
    }

    /// Set an attribute chosen by the synthesis, to a value chosen by the synthesis.
    pub fn set_any(&mut self) -> &mut Self {
        self.set.push(RouteMapSet::Any);
        self
    }

    /// Build the line.
    ///
    /// # Panics
    /// The function panics in the following cases:
    /// - The line number is not set (`lineno` was not called),
    /// - The access is not set (neither `access`, `permit`, `deny` nor `access_hole` were called),
    pub fn build(&self) -> RouteMapLine {
        let lineno = match self.lineno {
            Some(l) => l,
            None => panic!("Line number was not set for a Route-Map line!"),
        };
        let access = match self.access {
            Some(a) => a,
            None => panic!("Access was not set for a Route-Map line!"),
        };
        let conds = self.conds.clone();
        let set = if access.is_deny() { vec![] } else { self.set.clone() };
        RouteMapLine::new(lineno, access, conds, set)
    }
}

/// Access of a route-map line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Matching announcements are accepted
    Permit,
    /// Matching announcements are rejected
    Deny,
    /// Decided by the synthesis
    Unset,
}

impl Access {
    /// Returns `true` if the access is set to `Permit`.
    pub fn is_permit(&self) -> bool {
        self == &Self::Permit
    }

    /// Returns `true` if the access is set to `Deny`.
    pub fn is_deny(&self) -> bool {
        self == &Self::Deny
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Permit => write!(f, "permit"),
            Access::Deny => write!(f, "deny"),
            Access::Unset => write!(f, "?"),
        }
    }
}

/// Match clause of a route-map line. `None` is a hole for the value.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteMapMatch {
    /// Matches on the prefix
    Prefix(Option<Prefix>),
    /// Matches on the peer
    Peer(Option<Peer>),
    /// Matches on the origin
    Origin(Option<Origin>),
    /// Matches on the AS path signature
    AsPath(Option<AsPathSig>),
    /// Matches on the AS path length
    AsPathLen(Option<u32>),
    /// Matches on the next hop
    NextHop(Option<NextHop>),
    /// Matches on the local preference
    LocalPref(Option<u32>),
    /// Matches on the MED
    Med(Option<u32>),
    /// Matches on the presence of a community. The hole chooses among the known communities.
    Community(Option<Community>),
    /// Matches on any attribute, which is chosen by the synthesis.
    Any,
}

impl RouteMapMatch {
    /// Returns true if the clause contains a hole
    pub fn is_hole(&self) -> bool {
        match self {
            Self::Prefix(x) => x.is_none(),
            Self::Peer(x) => x.is_none(),
            Self::Origin(x) => x.is_none(),
            Self::AsPath(x) => x.is_none(),
            Self::AsPathLen(x) | Self::LocalPref(x) | Self::Med(x) => x.is_none(),
            Self::NextHop(x) => x.is_none(),
            Self::Community(x) => x.is_none(),
            Self::Any => true,
        }
    }

    /// Returns true if the concrete announcement matches the clause. Fails on holes.
    pub fn matches(&self, ann: &Announcement) -> Result<bool, DecodeError> {
        let hole = || DecodeError::NotConfigurable(format!("match {}", self));
        Ok(match self {
            Self::Prefix(x) => x.as_ref().ok_or_else(hole)? == &ann.prefix,
            Self::Peer(x) => x.as_ref().ok_or_else(hole)? == &ann.peer,
            Self::Origin(x) => x.as_ref().ok_or_else(hole)? == &ann.origin,
            Self::AsPath(x) => x.as_ref().ok_or_else(hole)? == &ann.as_path_sig(),
            Self::AsPathLen(x) => x.ok_or_else(hole)? == ann.as_path_len,
            Self::NextHop(x) => x.as_ref().ok_or_else(hole)? == &ann.next_hop,
            Self::LocalPref(x) => x.ok_or_else(hole)? == ann.local_pref,
            Self::Med(x) => x.ok_or_else(hole)? == ann.med,
            Self::Community(x) => ann.has_community(x.as_ref().ok_or_else(hole)?),
            Self::Any => return Err(hole()),
        })
    }
}

fn fmt_hole<T: fmt::Display>(x: &Option<T>) -> String {
    match x {
        Some(x) => x.to_string(),
        None => String::from("?"),
    }
}

impl fmt::Display for RouteMapMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix(x) => write!(f, "prefix {}", fmt_hole(x)),
            Self::Peer(x) => write!(f, "peer {}", fmt_hole(x)),
            Self::Origin(x) => write!(f, "origin {}", fmt_hole(x)),
            Self::AsPath(x) => write!(f, "as-path {}", fmt_hole(x)),
            Self::AsPathLen(x) => write!(f, "as-path-length {}", fmt_hole(x)),
            Self::NextHop(x) => write!(f, "next-hop {}", fmt_hole(x)),
            Self::LocalPref(x) => write!(f, "local-preference {}", fmt_hole(x)),
            Self::Med(x) => write!(f, "metric {}", fmt_hole(x)),
            Self::Community(x) => write!(f, "community {}", fmt_hole(x)),
            Self::Any => write!(f, "?"),
        }
    }
}

/// Set clause of a route-map line. `None` is a hole for the value.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteMapSet {
    /// Overwrite the next hop
    NextHop(Option<NextHop>),
    /// Overwrite the local preference
    LocalPref(Option<u32>),
    /// Overwrite the MED
    Med(Option<u32>),
    /// Overwrite the origin
    Origin(Option<Origin>),
    /// Overwrite the AS path length
    AsPathLen(Option<u32>),
    /// Add (`true`) or remove (`false`) the community
    Community(Community, Option<bool>),
    /// Accept (`true`) or drop (`false`) the announcement
    Permitted(Option<bool>),
    /// Set any attribute, which is chosen by the synthesis.
    Any,
}

impl RouteMapSet {
    /// Returns true if the clause contains a hole
    pub fn is_hole(&self) -> bool {
        match self {
            Self::NextHop(x) => x.is_none(),
            Self::LocalPref(x) | Self::Med(x) | Self::AsPathLen(x) => x.is_none(),
            Self::Origin(x) => x.is_none(),
            Self::Community(_, x) => x.is_none(),
            Self::Permitted(x) => x.is_none(),
            Self::Any => true,
        }
    }

    /// Apply the set clause to a concrete announcement. Fails on holes.
    pub fn apply(&self, ann: &mut Announcement) -> Result<(), DecodeError> {
        let hole = || DecodeError::NotConfigurable(format!("set {}", self));
        match self {
            Self::NextHop(x) => ann.next_hop = x.clone().ok_or_else(hole)?,
            Self::LocalPref(x) => ann.local_pref = x.ok_or_else(hole)?,
            Self::Med(x) => ann.med = x.ok_or_else(hole)?,
            Self::Origin(x) => ann.origin = x.ok_or_else(hole)?,
            Self::AsPathLen(x) => ann.as_path_len = x.ok_or_else(hole)?,
            Self::Community(c, x) => {
                ann.communities.insert(c.clone(), x.ok_or_else(hole)?);
            }
            Self::Permitted(x) => ann.permitted = x.ok_or_else(hole)?,
            Self::Any => return Err(hole()),
        }
        Ok(())
    }
}

impl fmt::Display for RouteMapSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NextHop(x) => write!(f, "next-hop {}", fmt_hole(x)),
            Self::LocalPref(x) => write!(f, "local-preference {}", fmt_hole(x)),
            Self::Med(x) => write!(f, "metric {}", fmt_hole(x)),
            Self::Origin(x) => write!(f, "origin {}", fmt_hole(x)),
            Self::AsPathLen(x) => write!(f, "as-path-length {}", fmt_hole(x)),
            Self::Community(c, Some(true)) => write!(f, "community {} additive", c),
            Self::Community(c, Some(false)) => write!(f, "comm-list {} delete", c),
            Self::Community(c, None) => write!(f, "community {} ?", c),
            Self::Permitted(Some(true)) => write!(f, "accept"),
            Self::Permitted(Some(false)) => write!(f, "drop"),
            Self::Permitted(None) => write!(f, "drop ?"),
            Self::Any => write!(f, "?"),
        }
    }
}
