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

use super::fixtures::*;
use crate::synthesis::*;
use crate::Error;

use std::cmp::Ordering;

fn short() -> Announcement {
    Announcement::new("Prefix1", "Peer1", as_path(&[1, 2, 5, 7, 6]), "Hop1")
}

fn long() -> Announcement {
    Announcement::new("Prefix1", "Peer2", as_path(&[9, 2, 5, 7, 8, 3, 10]), "Hop2")
}

/// Winner of the decision process on concrete announcements, which must be decided without a
/// solver.
fn winner(decision: &DecisionProcess, anns: &[Announcement]) -> Option<usize> {
    let ctx = context(anns);
    let set = read(&ctx, anns);
    let selection = decision.select(&ctx, &Prefix::new("Prefix1"), &set).unwrap();
    assert!(selection.winner().is_concrete());
    let result = selection.get(&ctx).unwrap();
    // the concrete decision process agrees
    assert_eq!(decision.best(&Prefix::new("Prefix1"), anns), result);
    result
}

#[test]
fn shortest_as_path() {
    let decision = DecisionProcess::default();
    assert_eq!(winner(&decision, &[short(), long()]), Some(0));
    assert_eq!(winner(&decision, &[long(), short()]), Some(1));
    assert_eq!(decision.compare(&short(), &long()), Ordering::Greater);
}

#[test]
fn highest_local_pref() {
    let decision = DecisionProcess::default();
    assert_eq!(winner(&decision, &[short(), long().with_local_pref(150)]), Some(1));
    assert_eq!(winner(&decision, &[short().with_local_pref(50), long()]), Some(1));
    assert_eq!(decision.compare(&short(), &long().with_local_pref(150)), Ordering::Less);
}

#[test]
fn denied_announcements_are_never_selected() {
    let decision = DecisionProcess::default();
    let anns = [short().with_local_pref(200).with_permitted(false), long()];
    assert_eq!(winner(&decision, &anns), Some(1));

    let ctx = context(&anns);
    let set = read(&ctx, &anns);
    let selection = decision.select(&ctx, &Prefix::new("Prefix1"), &set).unwrap();
    assert_eq!(selection.candidates(), vec![1]);
    assert_eq!(selection.is_selected(0).concrete(), Some(&false));
    assert_eq!(selection.is_selected(1).concrete(), Some(&true));

    let all_denied = [short().with_permitted(false), long().with_permitted(false)];
    assert_eq!(winner(&decision, &all_denied), None);
}

#[test]
fn ties_are_broken_by_position() {
    let decision = DecisionProcess::default();
    let a = short();
    let b = short().with_local_pref(100);
    assert_eq!(decision.compare(&a, &b), Ordering::Equal);
    assert_eq!(winner(&decision, &[a, b]), Some(0));
}

#[test]
fn med() {
    let a = short().with_med(20);
    let b = short().with_med(10);
    assert_eq!(winner(&DecisionProcess::default(), &[a.clone(), b.clone()]), Some(0));
    let decision = DecisionProcess::default().with_med();
    assert_eq!(decision.criteria().len(), 3);
    assert_eq!(winner(&decision, &[a, b]), Some(1));
}

#[test]
fn custom_criteria() {
    let decision = DecisionProcess::new(vec![(Criterion::AsPathLen, Preference::Max)]);
    assert_eq!(winner(&decision, &[short().with_local_pref(200), long()]), Some(1));
}

#[test]
fn other_prefix() {
    let anns = [short(), long()];
    let mut builder = ContextBuilder::new();
    builder.announcement(&anns[0]).announcement(&anns[1]).token(&Prefix::new("Prefix2"));
    let ctx = builder.build();
    let set = read(&ctx, &anns);
    let decision = DecisionProcess::default();

    let selection = decision.select(&ctx, &Prefix::new("Prefix2"), &set).unwrap();
    assert_eq!(selection.prefix(), &Prefix::new("Prefix2"));
    assert_eq!(selection.winner().concrete(), Some(&NO_ROUTE));
    assert_eq!(selection.get(&ctx), Ok(None));

    assert!(matches!(
        decision.select(&ctx, &Prefix::new("Prefix3"), &set),
        Err(Error::DomainError(DomainError::NotAMember { .. }))
    ));
}

#[test]
fn select_all() {
    let anns = [ann1(), ann2()];
    let ctx = context(&anns);
    let set = read(&ctx, &anns);
    let selections = DecisionProcess::default().select_all(&ctx, &set).unwrap();
    assert_eq!(selections.len(), 2);
    assert_eq!(selections[&Prefix::new("Prefix1")].get(&ctx), Ok(Some(0)));
    assert_eq!(selections[&Prefix::new("Prefix2")].get(&ctx), Ok(Some(1)));
}

#[test]
fn symbolic_local_pref() {
    let anns = [short(), long()];
    let mut ctx = context(&anns);
    let set = read(&ctx, &anns);

    let lp = ctx.fresh::<i64>("lp", None).unwrap();
    let modified = set[1].with_attribute(AttrValue::LocalPref(lp.clone())).unwrap();
    let set = AnnouncementSet::from_symbolic(vec![set[0].clone(), modified]);

    let selection = DecisionProcess::default().select(&ctx, &Prefix::new("Prefix1"), &set).unwrap();
    assert!(!selection.winner().is_concrete());
    assert!(!selection.is_selected(0).is_concrete());

    ctx.register("select_long", &selection.require(1));
    solve(&mut ctx).unwrap();

    assert!(lp.get(&ctx).unwrap() > 100);
    assert_eq!(selection.get(&ctx), Ok(Some(1)));
}
