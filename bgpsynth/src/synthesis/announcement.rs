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

//! # Announcements
//!
//! This module contains the concrete [`Announcement`], its symbolic counterpart
//! [`SymAnnouncement`], and the ordered [`AnnouncementSet`] which flows through a policy chain.
//! Symbolic announcements are never modified in place. Every action produces a new set.

use super::context::SolverContext;
use super::types::{
    AsId, AsPathSig, Community, DecodeError, DomainError, NextHop, Origin, Peer, Prefix,
    ShapeError,
};
use super::value::{BoolValue, IntValue, Value};
use crate::Error;

use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt;
use std::ops::Index;

/// Attribute of an announcement
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Attribute {
    /// Destination prefix
    Prefix,
    /// Neighbor from which the announcement was received
    Peer,
    /// Origin type
    Origin,
    /// AS path signature
    AsPath,
    /// Length of the AS path
    AsPathLen,
    /// Next hop
    NextHop,
    /// Local preference
    LocalPref,
    /// Multi-exit discriminator
    Med,
    /// Presence of a community
    Community(Community),
    /// Whether the announcement is accepted by the policy
    Permitted,
}

impl Attribute {
    /// All attributes except the communities
    pub const FIXED: [Attribute; 9] = [
        Attribute::Prefix,
        Attribute::Peer,
        Attribute::Origin,
        Attribute::AsPath,
        Attribute::AsPathLen,
        Attribute::NextHop,
        Attribute::LocalPref,
        Attribute::Med,
        Attribute::Permitted,
    ];
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Prefix => write!(f, "prefix"),
            Attribute::Peer => write!(f, "peer"),
            Attribute::Origin => write!(f, "origin"),
            Attribute::AsPath => write!(f, "as-path"),
            Attribute::AsPathLen => write!(f, "as-path-length"),
            Attribute::NextHop => write!(f, "next-hop"),
            Attribute::LocalPref => write!(f, "local-preference"),
            Attribute::Med => write!(f, "metric"),
            Attribute::Community(c) => write!(f, "community {}", c),
            Attribute::Permitted => write!(f, "permitted"),
        }
    }
}

/// Symbolic value of a single attribute
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Destination prefix
    Prefix(Value<Prefix>),
    /// Peer
    Peer(Value<Peer>),
    /// Origin type
    Origin(Value<Origin>),
    /// AS path signature
    AsPath(Value<AsPathSig>),
    /// Length of the AS path
    AsPathLen(IntValue),
    /// Next hop
    NextHop(Value<NextHop>),
    /// Local preference
    LocalPref(IntValue),
    /// Multi-exit discriminator
    Med(IntValue),
    /// Presence of the community
    Community(Community, BoolValue),
    /// Permitted flag
    Permitted(BoolValue),
}

impl AttrValue {
    /// Attribute of the value
    pub fn attribute(&self) -> Attribute {
        match self {
            AttrValue::Prefix(_) => Attribute::Prefix,
            AttrValue::Peer(_) => Attribute::Peer,
            AttrValue::Origin(_) => Attribute::Origin,
            AttrValue::AsPath(_) => Attribute::AsPath,
            AttrValue::AsPathLen(_) => Attribute::AsPathLen,
            AttrValue::NextHop(_) => Attribute::NextHop,
            AttrValue::LocalPref(_) => Attribute::LocalPref,
            AttrValue::Med(_) => Attribute::Med,
            AttrValue::Community(c, _) => Attribute::Community(c.clone()),
            AttrValue::Permitted(_) => Attribute::Permitted,
        }
    }

    /// Returns true if the value is known without consulting the solver
    pub fn is_concrete(&self) -> bool {
        match self {
            AttrValue::Prefix(v) => v.is_concrete(),
            AttrValue::Peer(v) => v.is_concrete(),
            AttrValue::Origin(v) => v.is_concrete(),
            AttrValue::AsPath(v) => v.is_concrete(),
            AttrValue::AsPathLen(v) | AttrValue::LocalPref(v) | AttrValue::Med(v) => {
                v.is_concrete()
            }
            AttrValue::NextHop(v) => v.is_concrete(),
            AttrValue::Community(_, v) | AttrValue::Permitted(v) => v.is_concrete(),
        }
    }

    /// Create a hole for the attribute. Integer holes are constrained to be non-negative, unless
    /// the context allows negative holes. Community holes require the community to be declared.
    pub fn hole(
        ctx: &mut SolverContext,
        attr: &Attribute,
        name: &str,
    ) -> Result<Self, DomainError> {
        Ok(match attr {
            Attribute::Prefix => AttrValue::Prefix(ctx.fresh(name, None)?),
            Attribute::Peer => AttrValue::Peer(ctx.fresh(name, None)?),
            Attribute::Origin => AttrValue::Origin(ctx.fresh(name, None)?),
            Attribute::AsPath => AttrValue::AsPath(ctx.fresh(name, None)?),
            Attribute::AsPathLen => AttrValue::AsPathLen(ctx.fresh_attribute_int(name)?),
            Attribute::NextHop => AttrValue::NextHop(ctx.fresh(name, None)?),
            Attribute::LocalPref => AttrValue::LocalPref(ctx.fresh_attribute_int(name)?),
            Attribute::Med => AttrValue::Med(ctx.fresh_attribute_int(name)?),
            Attribute::Community(c) => {
                ctx.check_community(c)?;
                AttrValue::Community(c.clone(), ctx.fresh(name, None)?)
            }
            Attribute::Permitted => AttrValue::Permitted(ctx.fresh(name, None)?),
        })
    }

    /// Symbolic equality of two values of the same attribute
    pub fn equals(&self, other: &Self) -> Result<BoolValue, ShapeError> {
        Ok(match (self, other) {
            (AttrValue::Prefix(a), AttrValue::Prefix(b)) => a.equals(b),
            (AttrValue::Peer(a), AttrValue::Peer(b)) => a.equals(b),
            (AttrValue::Origin(a), AttrValue::Origin(b)) => a.equals(b),
            (AttrValue::AsPath(a), AttrValue::AsPath(b)) => a.equals(b),
            (AttrValue::AsPathLen(a), AttrValue::AsPathLen(b)) => a.equals(b),
            (AttrValue::NextHop(a), AttrValue::NextHop(b)) => a.equals(b),
            (AttrValue::LocalPref(a), AttrValue::LocalPref(b)) => a.equals(b),
            (AttrValue::Med(a), AttrValue::Med(b)) => a.equals(b),
            (AttrValue::Community(c1, a), AttrValue::Community(c2, b)) if c1 == c2 => a.equals(b),
            (AttrValue::Permitted(a), AttrValue::Permitted(b)) => a.equals(b),
            (a, b) => return Err(ShapeError::AttributeMismatch(a.attribute(), b.attribute())),
        })
    }

    /// `if cond then then_ else else_`, for two values of the same attribute
    pub fn ite(cond: &BoolValue, then_: &Self, else_: &Self) -> Result<Self, ShapeError> {
        Ok(match (then_, else_) {
            (AttrValue::Prefix(a), AttrValue::Prefix(b)) => {
                AttrValue::Prefix(Value::ite(cond, a, b))
            }
            (AttrValue::Peer(a), AttrValue::Peer(b)) => AttrValue::Peer(Value::ite(cond, a, b)),
            (AttrValue::Origin(a), AttrValue::Origin(b)) => {
                AttrValue::Origin(Value::ite(cond, a, b))
            }
            (AttrValue::AsPath(a), AttrValue::AsPath(b)) => {
                AttrValue::AsPath(Value::ite(cond, a, b))
            }
            (AttrValue::AsPathLen(a), AttrValue::AsPathLen(b)) => {
                AttrValue::AsPathLen(Value::ite(cond, a, b))
            }
            (AttrValue::NextHop(a), AttrValue::NextHop(b)) => {
                AttrValue::NextHop(Value::ite(cond, a, b))
            }
            (AttrValue::LocalPref(a), AttrValue::LocalPref(b)) => {
                AttrValue::LocalPref(Value::ite(cond, a, b))
            }
            (AttrValue::Med(a), AttrValue::Med(b)) => AttrValue::Med(Value::ite(cond, a, b)),
            (AttrValue::Community(c1, a), AttrValue::Community(c2, b)) if c1 == c2 => {
                AttrValue::Community(c1.clone(), Value::ite(cond, a, b))
            }
            (AttrValue::Permitted(a), AttrValue::Permitted(b)) => {
                AttrValue::Permitted(Value::ite(cond, a, b))
            }
            (a, b) => return Err(ShapeError::AttributeMismatch(a.attribute(), b.attribute())),
        })
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Prefix(v) => write!(f, "prefix = {}", v),
            AttrValue::Peer(v) => write!(f, "peer = {}", v),
            AttrValue::Origin(v) => write!(f, "origin = {}", v),
            AttrValue::AsPath(v) => write!(f, "as-path = {}", v),
            AttrValue::AsPathLen(v) => write!(f, "as-path-length = {}", v),
            AttrValue::NextHop(v) => write!(f, "next-hop = {}", v),
            AttrValue::LocalPref(v) => write!(f, "local-preference = {}", v),
            AttrValue::Med(v) => write!(f, "metric = {}", v),
            AttrValue::Community(c, v) => write!(f, "community {} = {}", c, v),
            AttrValue::Permitted(v) => write!(f, "permitted = {}", v),
        }
    }
}

/// Concrete BGP announcement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    /// Destination prefix
    pub prefix: Prefix,
    /// Neighbor from which the announcement was received
    pub peer: Peer,
    /// Origin type
    pub origin: Origin,
    /// AS path, the first element is the neighboring AS.
    pub as_path: Vec<AsId>,
    /// Length of the AS path, which is compared in the decision process
    pub as_path_len: u32,
    /// Next hop
    pub next_hop: NextHop,
    /// Local preference
    pub local_pref: u32,
    /// Multi-exit discriminator
    pub med: u32,
    /// Presence of every known community
    pub communities: BTreeMap<Community, bool>,
    /// Whether the announcement is accepted
    pub permitted: bool,
}

impl Announcement {
    /// Create a new permitted announcement with local preference 100, MED 0, EGP origin and no
    /// communities. The AS path length is the length of `as_path`.
    pub fn new(
        prefix: impl Into<Prefix>,
        peer: impl Into<Peer>,
        as_path: Vec<AsId>,
        next_hop: impl Into<NextHop>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            peer: peer.into(),
            origin: Origin::Ebgp,
            as_path_len: as_path.len() as u32,
            as_path,
            next_hop: next_hop.into(),
            local_pref: 100,
            med: 0,
            communities: BTreeMap::new(),
            permitted: true,
        }
    }

    /// Set the local preference
    pub fn with_local_pref(mut self, local_pref: u32) -> Self {
        self.local_pref = local_pref;
        self
    }

    /// Set the MED
    pub fn with_med(mut self, med: u32) -> Self {
        self.med = med;
        self
    }

    /// Set the origin
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Set the AS path length independently of the AS path
    pub fn with_as_path_len(mut self, len: u32) -> Self {
        self.as_path_len = len;
        self
    }

    /// Set the presence of a community. Communities with `false` are known to be absent.
    pub fn with_community(mut self, community: Community, present: bool) -> Self {
        self.communities.insert(community, present);
        self
    }

    /// Add every community of `known` that is missing as absent. Symbolic announcements track
    /// every declared community, so decoded announcements always carry the full key set.
    pub fn with_known_communities<'a, I>(mut self, known: I) -> Self
    where
        I: IntoIterator<Item = &'a Community>,
    {
        for community in known {
            self.communities.entry(community.clone()).or_insert(false);
        }
        self
    }

    /// Set the permitted flag
    pub fn with_permitted(mut self, permitted: bool) -> Self {
        self.permitted = permitted;
        self
    }

    /// Signature of the AS path
    pub fn as_path_sig(&self) -> AsPathSig {
        AsPathSig::from_path(&self.as_path)
    }

    /// Returns true if the community is present
    pub fn has_community(&self, community: &Community) -> bool {
        self.communities.get(community).copied().unwrap_or(false)
    }

    /// The announcement as it is exported by a router in AS `as_id`: the AS is prepended, and
    /// the router becomes both the peer and the next hop.
    pub fn exported(&self, as_id: AsId, peer: Peer, next_hop: NextHop) -> Self {
        let mut as_path = Vec::with_capacity(self.as_path.len() + 1);
        as_path.push(as_id);
        as_path.extend(self.as_path.iter().copied());
        Self {
            peer,
            next_hop,
            as_path,
            as_path_len: self.as_path_len + 1,
            ..self.clone()
        }
    }
}

/// Symbolic announcement. Every attribute is a [`Value`], and every known community has a
/// presence flag.
#[derive(Debug, Clone, PartialEq)]
pub struct SymAnnouncement {
    index: usize,
    name: String,
    /// Destination prefix
    pub prefix: Value<Prefix>,
    /// Neighbor from which the announcement was received
    pub peer: Value<Peer>,
    /// Origin type
    pub origin: Value<Origin>,
    /// AS path signature
    pub as_path: Value<AsPathSig>,
    /// Length of the AS path
    pub as_path_len: IntValue,
    /// Next hop
    pub next_hop: Value<NextHop>,
    /// Local preference
    pub local_pref: IntValue,
    /// Multi-exit discriminator
    pub med: IntValue,
    /// Presence of every declared community
    pub communities: BTreeMap<Community, BoolValue>,
    /// Whether the announcement is accepted
    pub permitted: BoolValue,
}

impl SymAnnouncement {
    /// Read a concrete announcement. All values are validated against their domains, and every
    /// declared community missing in the announcement is set to absent.
    pub fn new(
        ctx: &SolverContext,
        index: usize,
        name: impl Into<String>,
        ann: &Announcement,
    ) -> Result<Self, DomainError> {
        for c in ann.communities.keys() {
            ctx.check_community(c)?;
        }
        let communities = ctx
            .communities()
            .map(|c| (c.clone(), BoolValue::constant(ann.has_community(c))))
            .collect();
        Ok(Self {
            index,
            name: name.into(),
            prefix: ctx.constant(ann.prefix.clone())?,
            peer: ctx.constant(ann.peer.clone())?,
            origin: ctx.constant(ann.origin)?,
            as_path: ctx.constant(ann.as_path_sig())?,
            as_path_len: IntValue::constant(i64::from(ann.as_path_len)),
            next_hop: ctx.constant(ann.next_hop.clone())?,
            local_pref: IntValue::constant(i64::from(ann.local_pref)),
            med: IntValue::constant(i64::from(ann.med)),
            communities,
            permitted: BoolValue::constant(ann.permitted),
        })
    }

    /// Position of the announcement in its set
    pub fn index(&self) -> usize {
        self.index
    }

    /// Name of the announcement
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All attributes of the announcement, including one per community
    pub fn attributes(&self) -> Vec<Attribute> {
        Attribute::FIXED
            .iter()
            .cloned()
            .chain(self.communities.keys().cloned().map(Attribute::Community))
            .collect()
    }

    /// Get the value of an attribute
    pub fn attribute(&self, attr: &Attribute) -> Result<AttrValue, DomainError> {
        Ok(match attr {
            Attribute::Prefix => AttrValue::Prefix(self.prefix.clone()),
            Attribute::Peer => AttrValue::Peer(self.peer.clone()),
            Attribute::Origin => AttrValue::Origin(self.origin.clone()),
            Attribute::AsPath => AttrValue::AsPath(self.as_path.clone()),
            Attribute::AsPathLen => AttrValue::AsPathLen(self.as_path_len.clone()),
            Attribute::NextHop => AttrValue::NextHop(self.next_hop.clone()),
            Attribute::LocalPref => AttrValue::LocalPref(self.local_pref.clone()),
            Attribute::Med => AttrValue::Med(self.med.clone()),
            Attribute::Community(c) => AttrValue::Community(
                c.clone(),
                self.communities
                    .get(c)
                    .cloned()
                    .ok_or_else(|| DomainError::UnknownCommunity(c.clone()))?,
            ),
            Attribute::Permitted => AttrValue::Permitted(self.permitted.clone()),
        })
    }

    /// Copy of the announcement, with one attribute replaced.
    pub fn with_attribute(&self, value: AttrValue) -> Result<Self, DomainError> {
        let mut ann = self.clone();
        match value {
            AttrValue::Prefix(v) => ann.prefix = v,
            AttrValue::Peer(v) => ann.peer = v,
            AttrValue::Origin(v) => ann.origin = v,
            AttrValue::AsPath(v) => ann.as_path = v,
            AttrValue::AsPathLen(v) => ann.as_path_len = v,
            AttrValue::NextHop(v) => ann.next_hop = v,
            AttrValue::LocalPref(v) => ann.local_pref = v,
            AttrValue::Med(v) => ann.med = v,
            AttrValue::Community(c, v) => match ann.communities.get_mut(&c) {
                Some(x) => *x = v,
                None => return Err(DomainError::UnknownCommunity(c)),
            },
            AttrValue::Permitted(v) => ann.permitted = v,
        }
        Ok(ann)
    }

    /// Attribute-wise `if cond then then_ else else_`. Index and name are taken from `then_`.
    pub fn ite(cond: &BoolValue, then_: &Self, else_: &Self) -> Result<Self, Error> {
        let mut ann = then_.clone();
        for attr in then_.attributes() {
            let value = AttrValue::ite(cond, &then_.attribute(&attr)?, &else_.attribute(&attr)?)?;
            ann = ann.with_attribute(value)?;
        }
        Ok(ann)
    }

    /// Decode the concrete announcement under the model bound to the context.
    pub fn get(&self, ctx: &SolverContext) -> Result<Announcement, DecodeError> {
        let as_path_sig = self.as_path.get(ctx)?;
        let as_path =
            as_path_sig.to_path().ok_or_else(|| DecodeError::InvalidAsPath(as_path_sig.0.clone()))?;
        let communities = self
            .communities
            .iter()
            .map(|(c, v)| Ok((c.clone(), v.get(ctx)?)))
            .collect::<Result<BTreeMap<_, _>, DecodeError>>()?;
        Ok(Announcement {
            prefix: self.prefix.get(ctx)?,
            peer: self.peer.get(ctx)?,
            origin: self.origin.get(ctx)?,
            as_path,
            as_path_len: to_u32(self.as_path_len.get(ctx)?)?,
            next_hop: self.next_hop.get(ctx)?,
            local_pref: to_u32(self.local_pref.get(ctx)?)?,
            med: to_u32(self.med.get(ctx)?)?,
            communities,
            permitted: self.permitted.get(ctx)?,
        })
    }
}

/// Convert a decoded integer into an attribute value
pub(crate) fn to_u32(value: i64) -> Result<u32, DecodeError> {
    u32::try_from(value).map_err(|_| DecodeError::OutOfRange(value))
}

/// Ordered set of symbolic announcements. The position of an announcement is its index.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnouncementSet {
    anns: Vec<SymAnnouncement>,
}

impl AnnouncementSet {
    /// Read a list of named, concrete announcements.
    pub fn new(
        ctx: &SolverContext,
        anns: &[(String, Announcement)],
    ) -> Result<Self, DomainError> {
        Ok(Self {
            anns: anns
                .iter()
                .enumerate()
                .map(|(i, (name, ann))| SymAnnouncement::new(ctx, i, name.clone(), ann))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    /// Build a set from symbolic announcements. The index of every announcement is reset to its
    /// position.
    pub fn from_symbolic(anns: Vec<SymAnnouncement>) -> Self {
        Self {
            anns: anns
                .into_iter()
                .enumerate()
                .map(|(i, mut ann)| {
                    ann.index = i;
                    ann
                })
                .collect(),
        }
    }

    /// Number of announcements
    pub fn len(&self) -> usize {
        self.anns.len()
    }

    /// Returns true if the set is empty
    pub fn is_empty(&self) -> bool {
        self.anns.is_empty()
    }

    /// Iterate over all announcements
    pub fn iter(&self) -> std::slice::Iter<'_, SymAnnouncement> {
        self.anns.iter()
    }

    /// Get the announcement at the position
    pub fn get(&self, index: usize) -> Option<&SymAnnouncement> {
        self.anns.get(index)
    }

    /// Position of the announcement with the given name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.anns.iter().position(|a| a.name == name)
    }

    /// Get the announcement with the given name
    pub fn by_name(&self, name: &str) -> Option<&SymAnnouncement> {
        self.anns.iter().find(|a| a.name == name)
    }

    /// Apply a function to every announcement, producing a new set.
    pub fn map<F>(&self, f: F) -> Result<Self, Error>
    where
        F: FnMut(&SymAnnouncement) -> Result<SymAnnouncement, Error>,
    {
        Ok(Self { anns: self.anns.iter().map(f).collect::<Result<Vec<_>, _>>()? })
    }

    /// Decode all announcements under the model bound to the context.
    pub fn get_all(&self, ctx: &SolverContext) -> Result<Vec<Announcement>, DecodeError> {
        self.anns.iter().map(|a| a.get(ctx)).collect()
    }
}

impl Index<usize> for AnnouncementSet {
    type Output = SymAnnouncement;

    fn index(&self, index: usize) -> &Self::Output {
        &self.anns[index]
    }
}

impl<'a> IntoIterator for &'a AnnouncementSet {
    type Item = &'a SymAnnouncement;
    type IntoIter = std::slice::Iter<'a, SymAnnouncement>;

    fn into_iter(self) -> Self::IntoIter {
        self.anns.iter()
    }
}
