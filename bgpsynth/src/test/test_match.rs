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

use std::rc::Rc;

#[test]
fn attribute_match() {
    let ctx = context(&[ann1(), ann2()]);
    let anns = read(&ctx, &[ann1(), ann2()]);

    let m = Match::attribute(&ctx, AttrValue::Prefix(ctx.constant(Prefix::new("Prefix1")).unwrap()))
        .unwrap();
    assert_eq!(m.is_match(&anns[0]).unwrap().concrete(), Some(&true));
    assert_eq!(m.is_match(&anns[1]).unwrap().concrete(), Some(&false));

    let m = Match::attribute(&ctx, AttrValue::Community(c3(), BoolValue::constant(true))).unwrap();
    assert_eq!(m.is_match(&anns[0]).unwrap().concrete(), Some(&false));
    assert_eq!(m.is_match(&anns[1]).unwrap().concrete(), Some(&true));

    let m = Match::attribute(&ctx, AttrValue::LocalPref(IntValue::constant(110))).unwrap();
    assert_eq!(m.is_match(&anns[0]).unwrap().concrete(), Some(&false));
    assert_eq!(m.is_match(&anns[1]).unwrap().concrete(), Some(&true));

    assert_eq!(Match::All.is_match(&anns[1]).unwrap().concrete(), Some(&true));
}

#[test]
fn unknown_community() {
    let ctx = context(&[ann1()]);
    let unknown = Community::new("200:1");
    assert_eq!(
        Match::attribute(&ctx, AttrValue::Community(unknown.clone(), BoolValue::constant(true))),
        Err(DomainError::UnknownCommunity(unknown))
    );
}

#[test]
fn combined_matches() {
    let mut ctx = context(&[ann1(), ann2()]);
    let anns = read(&ctx, &[ann1(), ann2()]);
    let hop = ctx.fresh::<NextHop>("hop", None).unwrap();

    let prefix1 =
        Match::Attribute(AttrValue::Prefix(ctx.constant(Prefix::new("Prefix1")).unwrap()));
    let hole = Match::Attribute(AttrValue::NextHop(hop));

    let both = Match::And(vec![prefix1.clone(), hole.clone()]);
    // a concretely false operand decides the conjunction
    assert_eq!(both.is_match(&anns[1]).unwrap().concrete(), Some(&false));
    assert!(!both.is_match(&anns[0]).unwrap().is_concrete());

    let any = Match::Or(vec![prefix1, hole]);
    assert_eq!(any.is_match(&anns[0]).unwrap().concrete(), Some(&true));
    assert!(!any.is_match(&anns[1]).unwrap().is_concrete());
}

#[test]
fn match_prefix_hole() {
    let mut ctx = context(&[ann1(), ann2()]);
    let anns = read(&ctx, &[ann1(), ann2()]);
    let m = Match::from_config(&mut ctx, &RouteMapMatch::Prefix(None), "prefix").unwrap();

    let matched = m.is_match(&anns[1]).unwrap();
    let unmatched = m.is_match(&anns[0]).unwrap().not();
    assert!(!matched.is_concrete());
    ctx.register("match_ann1", &matched);
    ctx.register("skip_ann0", &unmatched);
    solve(&mut ctx).unwrap();

    assert_eq!(m.config(&ctx), Ok(RouteMapMatch::Prefix(Some(Prefix::new("Prefix2")))));
}

#[test]
fn match_without_clause() {
    let ctx = context(&[ann1()]);
    assert!(matches!(Match::All.config(&ctx), Err(DecodeError::NotConfigurable(_))));
    let absent = Match::Attribute(AttrValue::Community(c1(), BoolValue::constant(false)));
    assert!(matches!(absent.config(&ctx), Err(DecodeError::NotConfigurable(_))));
}

#[test]
fn select_one_unsat() {
    // both announcements have the same local preference, and only the first one has 100:16.
    let anns = [ann1(), ann2().with_local_pref(100)];
    let mut ctx = context(&anns);
    let set = read(&ctx, &anns);

    let lp = ctx.fresh::<i64>("lp", None).unwrap();
    let candidates = vec![
        Match::attribute(&ctx, AttrValue::Community(c1(), BoolValue::constant(true))).unwrap(),
        Match::Attribute(AttrValue::LocalPref(lp)),
    ];
    let select = SelectOne::new(&mut ctx, "select", candidates).unwrap();
    let m = Match::SelectOne(select);

    let skip = ctx.register("skip_ann0", &m.is_match(&set[0]).unwrap().not());
    let take = ctx.register("match_ann1", &m.is_match(&set[1]).unwrap());

    match solve(&mut ctx) {
        Err(Error::Unsatisfiable(core)) => {
            assert!(core.contains(&skip));
            assert!(core.contains(&take));
        }
        r => panic!("Expected an unsat result, got {:?}", r),
    }
}

#[test]
fn select_one_only_one() {
    let anns = [ann1(), ann2()];
    let mut ctx = context(&anns);
    let set = read(&ctx, &anns);

    let candidates = vec![
        Match::attribute(&ctx, AttrValue::Community(c1(), BoolValue::constant(true))).unwrap(),
        Match::attribute(&ctx, AttrValue::Community(c3(), BoolValue::constant(true))).unwrap(),
    ];
    let select = SelectOne::new(&mut ctx, "select", candidates).unwrap();
    assert_eq!(select.choice().term().to_string(), "select_choice");

    ctx.register("skip_ann0", &select.is_match(&set[0]).unwrap().not());
    ctx.register("match_ann1", &select.is_match(&set[1]).unwrap());
    solve(&mut ctx).unwrap();

    assert_eq!(select.choice().get(&ctx), Ok(1));
    assert_eq!(select.get_used_match(&ctx), Ok(&select.candidates()[1]));
    assert_eq!(
        Match::SelectOne(select).config(&ctx),
        Ok(RouteMapMatch::Community(Some(c3())))
    );
}

#[test]
fn select_one_empty() {
    let mut ctx = context(&[ann1()]);
    assert_eq!(
        SelectOne::new(&mut ctx, "select", vec![]),
        Err(Error::ShapeError(ShapeError::EmptyCandidates("select".to_string())))
    );
}

#[test]
fn match_community_hole() {
    let anns = [ann1(), ann2()];
    let mut ctx = context(&anns);
    let set = read(&ctx, &anns);

    let m = Match::from_config(&mut ctx, &RouteMapMatch::Community(None), "community").unwrap();
    match &m {
        Match::SelectOne(s) => assert_eq!(s.candidates().len(), 3),
        m => panic!("Expected a selection, got {}", m),
    }

    ctx.register("match_ann0", &m.is_match(&set[0]).unwrap());
    ctx.register("skip_ann1", &m.is_match(&set[1]).unwrap().not());
    solve(&mut ctx).unwrap();
    assert_eq!(m.config(&ctx), Ok(RouteMapMatch::Community(Some(c1()))));
}

#[test]
fn match_any_attribute() {
    let anns = [ann1(), ann2()];
    let mut ctx = context(&anns);
    let set = read(&ctx, &anns);

    let m = Match::from_config(&mut ctx, &RouteMapMatch::Any, "any").unwrap();
    ctx.register("match_ann0", &m.is_match(&set[0]).unwrap());
    ctx.register("skip_ann1", &m.is_match(&set[1]).unwrap().not());
    solve(&mut ctx).unwrap();

    // whatever clause was chosen, it must distinguish the two announcements
    let clause = m.config(&ctx).unwrap();
    assert!(!clause.is_hole());
    assert_eq!(clause.matches(&ann1()), Ok(true));
    assert_eq!(clause.matches(&ann2()), Ok(false));
}

#[test]
fn selector_match() {
    let anns = [ann1(), ann2()];
    let ctx = context(&anns);
    let set = read(&ctx, &anns);

    let selectors = Rc::new(vec![IntValue::constant(10), IntValue::constant(NO_LINE)]);
    let m = SelectorMatch::new(10, selectors);
    assert_eq!(m.is_match(&set[0]).unwrap().concrete(), Some(&true));
    assert_eq!(m.is_match(&set[1]).unwrap().concrete(), Some(&false));

    let m = SelectorMatch::new(10, Rc::new(vec![IntValue::constant(10)]));
    assert_eq!(m.is_match(&set[1]), Err(ShapeError::UnknownAnnouncement("ann1".to_string())));
}
