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

//! # Finite Domains
//!
//! Registry of the finite domains over which the categorical attributes range. A domain is built
//! from the tokens observed in the input announcements, together with extra tokens supplied by
//! the caller. Tokens are sorted, such that the index of a token does not depend on the order in
//! which announcements were given.

use super::types::DomainKind;
use crate::smt::Sort;

use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Ordered set of tokens of a single kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    kind: DomainKind,
    tokens: Vec<String>,
    index: HashMap<String, usize>,
}

impl Domain {
    /// Create a new domain. Duplicate tokens are removed.
    pub fn new<I: IntoIterator<Item = String>>(kind: DomainKind, tokens: I) -> Self {
        let tokens: Vec<String> = tokens.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        let index = tokens.iter().enumerate().map(|(i, t)| (t.clone(), i)).collect();
        Self { kind, tokens, index }
    }

    /// Kind of the domain
    pub fn kind(&self) -> DomainKind {
        self.kind
    }

    /// Number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if the domain has no members
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Index of the token, or `None` if it is no member.
    pub fn index_of(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }

    /// Token at the given index
    pub fn token(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(|t| t.as_str())
    }

    /// All tokens, sorted
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Solver sort of the domain
    pub fn sort(&self) -> Sort {
        Sort::Enum(self.kind, self.tokens.len())
    }
}

/// Registry of all domains. Every kind is present, possibly empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Domains {
    domains: BTreeMap<DomainKind, Domain>,
}

impl Domains {
    /// Build the registry from the tokens of every kind. Kinds without tokens get an empty
    /// domain.
    pub fn new(mut tokens: BTreeMap<DomainKind, BTreeSet<String>>) -> Self {
        Self {
            domains: DomainKind::ALL
                .iter()
                .map(|k| (*k, Domain::new(*k, tokens.remove(k).unwrap_or_default())))
                .collect(),
        }
    }

    /// Get the domain of the given kind
    pub fn get(&self, kind: DomainKind) -> &Domain {
        // all kinds are inserted on construction
        &self.domains[&kind]
    }

    /// Iterate over all domains
    pub fn iter(&self) -> impl Iterator<Item = &Domain> {
        self.domains.values()
    }
}
