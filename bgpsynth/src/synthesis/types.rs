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

//! Module containing the basic type definitions and the error types of the synthesis layer.

use super::announcement::Attribute;
use super::domain::Domains;
use super::value::SmtType;
use crate::smt::{ModelValue, Sort, Term};

use itertools::Itertools;
use std::fmt;
use thiserror::Error;

/// AS Number
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct AsId(pub u32);

impl fmt::Display for AsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// BGP Community, written as `asn:value`
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone)]
pub struct Community(pub String);

impl Community {
    /// Create a new community from its textual representation
    pub fn new(c: impl Into<String>) -> Self {
        Self(c.into())
    }
}

impl fmt::Display for Community {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Community {
    fn from(c: &str) -> Self {
        Self(c.to_string())
    }
}

/// Kind of a finite domain. Every categorical attribute of an announcement ranges over one of
/// these domains.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub enum DomainKind {
    /// Destination prefixes
    Prefix,
    /// Neighbors from which announcements are received
    Peer,
    /// Route origin
    Origin,
    /// AS path signatures
    AsPath,
    /// Next hops
    NextHop,
}

impl DomainKind {
    /// All domain kinds
    pub const ALL: [DomainKind; 5] = [
        DomainKind::Prefix,
        DomainKind::Peer,
        DomainKind::Origin,
        DomainKind::AsPath,
        DomainKind::NextHop,
    ];
}

impl fmt::Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainKind::Prefix => write!(f, "Prefix"),
            DomainKind::Peer => write!(f, "Peer"),
            DomainKind::Origin => write!(f, "Origin"),
            DomainKind::AsPath => write!(f, "AsPath"),
            DomainKind::NextHop => write!(f, "NextHop"),
        }
    }
}

/// Categorical value, which is represented by a token of a finite domain.
pub trait Token: Sized {
    /// The domain over which the type ranges
    const KIND: DomainKind;

    /// Textual token of the value
    fn token(&self) -> String;

    /// Parse the value back from its token
    fn from_token(token: &str) -> Option<Self>;
}

macro_rules! smt_token {
    ($t:ty) => {
        impl SmtType for $t {
            fn sort(domains: &Domains) -> Result<Sort, DomainError> {
                let domain = domains.get(<$t as Token>::KIND);
                if domain.is_empty() {
                    Err(DomainError::EmptyDomain(<$t as Token>::KIND))
                } else {
                    Ok(domain.sort())
                }
            }

            fn literal(&self, domains: &Domains) -> Result<Term, DomainError> {
                let token = self.token();
                domains.get(<$t as Token>::KIND).index_of(&token).map(Term::token).ok_or(
                    DomainError::NotAMember { kind: <$t as Token>::KIND, token },
                )
            }

            fn from_model(value: ModelValue, domains: &Domains) -> Option<Self> {
                match value {
                    ModelValue::Token(i) => domains
                        .get(<$t as Token>::KIND)
                        .token(i)
                        .and_then(<$t as Token>::from_token),
                    _ => None,
                }
            }
        }
    };
}

macro_rules! token_type {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new value from its textual token
            pub fn new(token: impl Into<String>) -> Self {
                Self(token.into())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(token: &str) -> Self {
                Self(token.to_string())
            }
        }

        impl Token for $name {
            const KIND: DomainKind = $kind;

            fn token(&self) -> String {
                self.0.clone()
            }

            fn from_token(token: &str) -> Option<Self> {
                Some(Self(token.to_string()))
            }
        }

        smt_token!($name);
    };
}

token_type!(
    /// Destination prefix, as an opaque token (e.g., `Prefix1` or `10.0.0.0/8`)
    Prefix,
    DomainKind::Prefix
);
token_type!(
    /// Name of the neighbor from which an announcement is received
    Peer,
    DomainKind::Peer
);
token_type!(
    /// Next hop of an announcement
    NextHop,
    DomainKind::NextHop
);
token_type!(
    /// Signature of an AS path, which is the sequence of AS numbers joined by `_`.
    AsPathSig,
    DomainKind::AsPath
);

impl AsPathSig {
    /// Compute the signature of an AS path
    pub fn from_path(path: &[AsId]) -> Self {
        Self(path.iter().join("_"))
    }

    /// Parse the signature back into an AS path. Returns `None` if the token is not a valid
    /// signature.
    pub fn to_path(&self) -> Option<Vec<AsId>> {
        if self.0.is_empty() {
            return Some(Vec::new());
        }
        self.0.split('_').map(|asn| asn.parse().ok().map(AsId)).collect()
    }
}

/// Origin attribute of a BGP route
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub enum Origin {
    /// Route learned from an interior protocol
    Igp,
    /// Route learned from an exterior protocol
    Ebgp,
    /// Origin is unknown
    Incomplete,
}

impl Origin {
    /// All origin values. The origin domain always contains all of them.
    pub const ALL: [Origin; 3] = [Origin::Igp, Origin::Ebgp, Origin::Incomplete];
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

impl Token for Origin {
    const KIND: DomainKind = DomainKind::Origin;

    fn token(&self) -> String {
        match self {
            Origin::Igp => "IGP",
            Origin::Ebgp => "EGP",
            Origin::Incomplete => "INCOMPLETE",
        }
        .to_string()
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "IGP" => Some(Origin::Igp),
            "EGP" => Some(Origin::Ebgp),
            "INCOMPLETE" => Some(Origin::Incomplete),
            _ => None,
        }
    }
}

smt_token!(Origin);

/// Error raised when a value does not fit into its finite domain
#[derive(Error, Debug, PartialEq)]
pub enum DomainError {
    /// The concrete value is not a member of the domain
    #[error("{token} is not a member of the {kind} domain")]
    NotAMember {
        /// Domain that was searched
        kind: DomainKind,
        /// The offending token
        token: String,
    },
    /// A hole was requested over an empty domain
    #[error("Cannot create a hole over the empty {0} domain")]
    EmptyDomain(DomainKind),
    /// The community is not declared in the context
    #[error("Community {0} is not declared")]
    UnknownCommunity(Community),
}

/// Error raised on malformed route-maps or clauses
#[derive(Error, Debug, PartialEq)]
pub enum ShapeError {
    /// Two lines of the same route-map have the same line number
    #[error("Route-map {0} contains the line number {1} twice")]
    DuplicateLine(String, usize),
    /// A line which always denies carries set-actions
    #[error("Line {1} of route-map {0} denies, but has set-actions")]
    DenyWithActions(String, usize),
    /// A selection (SelectOne or SetOne) without any candidate
    #[error("{0} has no candidates")]
    EmptyCandidates(String),
    /// Two attribute values of different attributes were combined
    #[error("Attribute mismatch: {0} and {1}")]
    AttributeMismatch(Attribute, Attribute),
    /// A requirement names an announcement that does not exist
    #[error("Unknown announcement: {0}")]
    UnknownAnnouncement(String),
}

/// Error raised when a symbolic value cannot be converted back to a concrete one
#[derive(Error, Debug, PartialEq)]
pub enum DecodeError {
    /// No model is bound to the context
    #[error("No model available")]
    NoModel,
    /// The model does not determine the value of the term
    #[error("The model does not determine the value of {0}")]
    Unresolved(String),
    /// The model value does not match the expected type
    #[error("Model value {0:?} does not match the expected type")]
    SortMismatch(ModelValue),
    /// The chosen candidate does not exist
    #[error("{0} chose the non-existing candidate {1}")]
    ChoiceOutOfRange(String, i64),
    /// The value cannot be expressed as a route-map clause
    #[error("{0} cannot be expressed as a route-map clause")]
    NotConfigurable(String),
    /// The integer does not fit the attribute
    #[error("The value {0} is out of range")]
    OutOfRange(i64),
    /// The AS path signature cannot be parsed
    #[error("Invalid AS path signature: {0}")]
    InvalidAsPath(String),
}
