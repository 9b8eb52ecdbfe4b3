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

fn two_lines() -> RouteMap {
    RouteMap::new(
        "import",
        vec![
            RouteMapLineBuilder::new()
                .lineno(10)
                .permit()
                .match_community(c1())
                .set_local_pref(200)
                .build(),
            RouteMapLineBuilder::new().lineno(20).permit().set_local_pref(50).build(),
        ],
    )
}

#[test]
fn first_match_wins() {
    let anns = [ann1(), ann2()];
    let mut ctx = context(&anns);
    let set = read(&ctx, &anns);
    let map = two_lines();
    let chain = PolicyChain::new(&mut ctx, &map, &set, ChainDefault::PassThrough).unwrap();

    assert_eq!(chain.name(), "import");
    assert_eq!(chain.selectors()[0].concrete(), Some(&10));
    assert_eq!(chain.selectors()[1].concrete(), Some(&20));
    assert_eq!(chain.selected_line(&ctx, 0), Ok(Some(10)));
    assert_eq!(chain.selected_line(&ctx, 1), Ok(Some(20)));

    // ann0 matches both lines, but only the first one applies
    let output = chain.output();
    assert_eq!(output[0].local_pref.concrete(), Some(&200));
    assert_eq!(output[1].local_pref.concrete(), Some(&50));

    // snapshots after every line
    assert_eq!(chain.snapshots().len(), 3);
    assert_eq!(chain.input(), &set);
    let after_10 = chain.snapshot_after(10).unwrap();
    assert_eq!(after_10[0].local_pref.concrete(), Some(&200));
    assert_eq!(after_10[1].local_pref.concrete(), Some(&110));
    assert!(chain.snapshot_after(30).is_none());

    // the symbolic and the concrete semantics agree
    let concrete = anns
        .iter()
        .map(|a| map.apply(a, ChainDefault::PassThrough).unwrap())
        .collect::<Vec<_>>();
    assert_eq!(output.get_all(&ctx).unwrap(), concrete);

    // without holes, the configuration is the route-map itself
    assert_eq!(chain.config(&ctx), Ok(map));
    assert!(ctx.variables().is_empty());
}

#[test]
fn unhandled_announcements_are_unchanged() {
    let anns = [ann1(), ann2()];
    let mut ctx = context(&anns);
    let set = read(&ctx, &anns);
    let map = RouteMap::new(
        "import",
        vec![RouteMapLineBuilder::new()
            .lineno(10)
            .permit()
            .match_community(c1())
            .set_med(0)
            .set_community(c2(), true)
            .build()],
    );
    let chain = PolicyChain::new(&mut ctx, &map, &set, ChainDefault::PassThrough).unwrap();

    assert_eq!(chain.selectors()[1].concrete(), Some(&NO_LINE));
    assert_eq!(chain.selected_line(&ctx, 1), Ok(None));
    assert_eq!(chain.output()[1], set[1]);

    let ann = &chain.output()[0];
    assert_eq!(ann.med.concrete(), Some(&0));
    assert_eq!(ann.communities[&c2()].concrete(), Some(&true));
    assert_eq!(ann.local_pref, set[0].local_pref);
    assert_eq!(ann.as_path_len, set[0].as_path_len);
}

#[test]
fn chain_default_deny() {
    let anns = [ann1(), ann2()];
    let mut ctx = context(&anns);
    let set = read(&ctx, &anns);
    let map = RouteMap::new(
        "import",
        vec![RouteMapLineBuilder::new().lineno(10).permit().match_community(c1()).build()],
    );

    let chain = PolicyChain::new(&mut ctx, &map, &set, ChainDefault::Deny).unwrap();
    assert_eq!(chain.default(), ChainDefault::Deny);
    assert_eq!(chain.output()[0].permitted.concrete(), Some(&true));
    assert_eq!(chain.output()[1].permitted.concrete(), Some(&false));
    // the snapshot of the last line does not contain the default treatment
    assert_eq!(chain.snapshot_after(10).unwrap()[1].permitted.concrete(), Some(&true));

    let chain = PolicyChain::new(&mut ctx, &map, &set, ChainDefault::PassThrough).unwrap();
    assert_eq!(chain.output()[1].permitted.concrete(), Some(&true));
}

#[test]
fn deny_line() {
    let anns = [ann1(), ann2()];
    let mut ctx = context(&anns);
    let set = read(&ctx, &anns);
    let map = RouteMap::new(
        "import",
        vec![
            RouteMapLineBuilder::new().lineno(10).deny().match_community(c3()).build(),
            RouteMapLineBuilder::new().lineno(20).permit().set_local_pref(50).build(),
        ],
    );
    let chain = PolicyChain::new(&mut ctx, &map, &set, ChainDefault::PassThrough).unwrap();

    assert_eq!(chain.output()[0].permitted.concrete(), Some(&true));
    assert_eq!(chain.output()[0].local_pref.concrete(), Some(&50));
    // ann1 is handled (and denied) by line 10, so line 20 does not touch it
    assert_eq!(chain.output()[1].permitted.concrete(), Some(&false));
    assert_eq!(chain.output()[1].local_pref.concrete(), Some(&110));
}

#[test]
fn access_hole() {
    let anns = [ann1(), ann2()];
    let mut ctx = context(&anns);
    let set = read(&ctx, &anns);
    let map = RouteMap::new(
        "import",
        vec![RouteMapLineBuilder::new()
            .lineno(10)
            .access_hole()
            .match_community(c3())
            .set_local_pref(200)
            .build()],
    );
    let chain = PolicyChain::new(&mut ctx, &map, &set, ChainDefault::PassThrough).unwrap();
    assert_eq!(ctx.variables()[0].0, "import_10_access");

    // set-clauses only apply to permitted announcements
    let output = chain.output();
    assert!(!output[1].permitted.is_concrete());
    assert!(!output[1].local_pref.is_concrete());
    assert_eq!(output[0], set[0]);

    ctx.register("deny_ann1", &output[1].permitted.not());
    solve(&mut ctx).unwrap();

    let result = chain.config(&ctx).unwrap();
    assert_eq!(result.lines()[0].access(), Access::Deny);
    assert!(result.lines()[0].actions().is_empty());
    assert_eq!(output.get_all(&ctx).unwrap()[1], ann2().with_permitted(false));
}

#[test]
fn match_hole() {
    let anns = [ann1(), ann2()];
    let mut ctx = context(&anns);
    let set = read(&ctx, &anns);
    let map = RouteMap::new(
        "import",
        vec![RouteMapLineBuilder::new()
            .lineno(10)
            .permit()
            .match_prefix_hole()
            .set_local_pref(200)
            .build()],
    );
    let chain = PolicyChain::new(&mut ctx, &map, &set, ChainDefault::PassThrough).unwrap();
    assert_eq!(ctx.variables()[0].0, "import_10_match0");
    assert!(!chain.selectors()[0].is_concrete());

    let output = chain.output().clone();
    ctx.register("ann0_lp", &output[0].local_pref.equals(&IntValue::constant(100)));
    ctx.register("ann1_lp", &output[1].local_pref.equals(&IntValue::constant(200)));
    solve(&mut ctx).unwrap();

    assert_eq!(chain.selected_line(&ctx, 0), Ok(None));
    assert_eq!(chain.selected_line(&ctx, 1), Ok(Some(10)));
    let result = chain.config(&ctx).unwrap();
    assert!(!result.has_holes());
    assert_eq!(
        result.lines()[0].conds(),
        &[RouteMapMatch::Prefix(Some(Prefix::new("Prefix2")))]
    );

    // applying the synthesized route-map gives the same announcements
    let concrete = anns
        .iter()
        .map(|a| result.apply(a, ChainDefault::PassThrough).unwrap())
        .collect::<Vec<_>>();
    assert_eq!(output.get_all(&ctx).unwrap(), concrete);
}

#[test]
fn malformed_route_maps() {
    let anns = [ann1(), ann2()];
    let mut ctx = context(&anns);
    let set = read(&ctx, &anns);

    let map = RouteMap::new(
        "import",
        vec![
            RouteMapLineBuilder::new().lineno(10).permit().build(),
            RouteMapLineBuilder::new().lineno(10).deny().build(),
        ],
    );
    assert_eq!(
        PolicyChain::new(&mut ctx, &map, &set, ChainDefault::PassThrough).err(),
        Some(Error::ShapeError(ShapeError::DuplicateLine("import".to_string(), 10)))
    );

    let map = RouteMap::new(
        "import",
        vec![RouteMapLine::new(10, Access::Deny, vec![], vec![RouteMapSet::Med(Some(1))])],
    );
    assert_eq!(
        PolicyChain::new(&mut ctx, &map, &set, ChainDefault::PassThrough).err(),
        Some(Error::ShapeError(ShapeError::DenyWithActions("import".to_string(), 10)))
    );

    let unknown = Community::new("200:1");
    let map = RouteMap::new(
        "import",
        vec![RouteMapLineBuilder::new()
            .lineno(10)
            .permit()
            .set_community(unknown.clone(), true)
            .build()],
    );
    assert_eq!(
        PolicyChain::new(&mut ctx, &map, &set, ChainDefault::PassThrough).err(),
        Some(Error::DomainError(DomainError::UnknownCommunity(unknown)))
    );
}
