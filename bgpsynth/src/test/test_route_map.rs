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

fn import_map() -> RouteMap {
    RouteMap::new(
        "import",
        vec![
            RouteMapLineBuilder::new().lineno(20).permit().set_local_pref(50).build(),
            RouteMapLineBuilder::new()
                .lineno(10)
                .permit()
                .match_community(c1())
                .set_local_pref(200)
                .set_community(c2(), true)
                .build(),
            RouteMapLineBuilder::new()
                .lineno(5)
                .deny()
                .match_prefix(Prefix::new("Prefix3"))
                .build(),
        ],
    )
}

#[test]
fn builder() {
    let line = RouteMapLineBuilder::new()
        .lineno(10)
        .permit()
        .match_prefix(Prefix::new("Prefix1"))
        .set_med(20)
        .build();
    assert_eq!(line.lineno(), 10);
    assert_eq!(line.access(), Access::Permit);
    assert_eq!(line.conds(), &[RouteMapMatch::Prefix(Some(Prefix::new("Prefix1")))]);
    assert_eq!(line.actions(), &[RouteMapSet::Med(Some(20))]);
    assert!(!line.has_holes());

    // deny lines have no set clauses
    let line = RouteMapLineBuilder::new().lineno(10).deny().set_med(20).build();
    assert!(line.actions().is_empty());

    let line = RouteMapLineBuilder::new().lineno(10).access_hole().build();
    assert!(line.has_holes());
    let line = RouteMapLineBuilder::new().lineno(10).permit().set_any().build();
    assert!(line.has_holes());
    let line = RouteMapLineBuilder::new().lineno(10).permit().match_community_hole().build();
    assert!(line.has_holes());
}

#[test]
#[should_panic]
fn builder_without_lineno() {
    RouteMapLineBuilder::new().permit().build();
}

#[test]
#[should_panic]
fn builder_without_access() {
    RouteMapLineBuilder::new().lineno(10).build();
}

#[test]
fn lines_are_sorted() {
    let map = import_map();
    assert_eq!(map.name(), "import");
    assert_eq!(map.lines().iter().map(|l| l.lineno()).collect::<Vec<_>>(), vec![5, 10, 20]);
    assert_eq!(map.line(10).map(|l| l.actions().len()), Some(2));
    assert!(map.line(15).is_none());
    assert!(!map.has_holes());
}

#[test]
fn first_match_wins() {
    let map = import_map();

    let result = map.apply(&ann1(), ChainDefault::PassThrough).unwrap();
    assert_eq!(result, ann1().with_local_pref(200).with_community(c2(), true));

    let result = map.apply(&ann2(), ChainDefault::PassThrough).unwrap();
    assert_eq!(result, ann2().with_local_pref(50));
}

#[test]
fn deny_line() {
    let map = import_map();
    let ann =
        Announcement::new("Prefix3", "Peer1", as_path(&[3]), "Hop1").with_community(c1(), true);
    let result = map.apply(&ann, ChainDefault::PassThrough).unwrap();
    assert!(!result.permitted);
    assert_eq!(result.local_pref, 100);
}

#[test]
fn drop_stops_set_clauses() {
    let map = RouteMap::new(
        "import",
        vec![RouteMapLineBuilder::new()
            .lineno(10)
            .permit()
            .match_community(c1())
            .set_med(20)
            .set_drop()
            .set_local_pref(300)
            .build()],
    );
    let result = map.apply(&ann1(), ChainDefault::PassThrough).unwrap();
    assert_eq!(result, ann1().with_med(20).with_permitted(false));
    assert_eq!(map.apply(&ann2(), ChainDefault::PassThrough), Ok(ann2()));
    assert_eq!(
        map.to_string(),
        "route-map import permit 10\n  \
         match community 100:16\n  \
         set metric 20\n  \
         set drop\n  \
         set local-preference 300\n"
    );

    let line = RouteMapLineBuilder::new().lineno(10).permit().set_drop_hole().build();
    assert!(line.has_holes());
    let mut ann = ann1();
    assert!(RouteMapSet::Permitted(None).apply(&mut ann).is_err());
    RouteMapSet::Permitted(Some(false)).apply(&mut ann).unwrap();
    assert!(!ann.permitted);
}

#[test]
fn chain_default() {
    let map = RouteMap::new(
        "import",
        vec![RouteMapLineBuilder::new().lineno(10).permit().match_community(c3()).build()],
    );
    assert_eq!(map.apply(&ann1(), ChainDefault::PassThrough), Ok(ann1()));
    assert_eq!(map.apply(&ann1(), ChainDefault::Deny), Ok(ann1().with_permitted(false)));
    assert_eq!(map.apply(&ann2(), ChainDefault::Deny), Ok(ann2()));
    assert_eq!(ChainDefault::default(), ChainDefault::PassThrough);
}

#[test]
fn apply_with_holes() {
    let map = RouteMap::new(
        "import",
        vec![RouteMapLineBuilder::new().lineno(10).permit().match_next_hop_hole().build()],
    );
    assert!(matches!(
        map.apply(&ann1(), ChainDefault::PassThrough),
        Err(DecodeError::NotConfigurable(_))
    ));

    let map = RouteMap::new(
        "import",
        vec![RouteMapLineBuilder::new().lineno(10).access_hole().build()],
    );
    assert!(map.apply(&ann1(), ChainDefault::PassThrough).is_err());
}

#[test]
fn concrete_clauses() {
    assert_eq!(RouteMapMatch::AsPathLen(Some(5)).matches(&ann1()), Ok(true));
    assert_eq!(RouteMapMatch::AsPathLen(Some(5)).matches(&ann2()), Ok(false));
    assert_eq!(RouteMapMatch::Med(Some(10)).matches(&ann2()), Ok(true));
    assert_eq!(RouteMapMatch::Origin(Some(Origin::Ebgp)).matches(&ann2()), Ok(true));
    assert_eq!(
        RouteMapMatch::AsPath(Some(AsPathSig::new("1_2_5_7_6"))).matches(&ann1()),
        Ok(true)
    );
    assert_eq!(RouteMapMatch::Community(Some(c2())).matches(&ann1()), Ok(false));
    assert!(RouteMapMatch::Any.matches(&ann1()).is_err());

    let mut ann = ann1();
    RouteMapSet::Community(c1(), Some(false)).apply(&mut ann).unwrap();
    RouteMapSet::Origin(Some(Origin::Incomplete)).apply(&mut ann).unwrap();
    RouteMapSet::NextHop(Some(NextHop::new("Hop2"))).apply(&mut ann).unwrap();
    assert!(!ann.has_community(&c1()));
    assert_eq!(ann.origin, Origin::Incomplete);
    assert_eq!(ann.next_hop, NextHop::new("Hop2"));
    assert!(RouteMapSet::LocalPref(None).apply(&mut ann).is_err());
}

#[test]
fn display() {
    let map = RouteMap::new(
        "import",
        vec![
            RouteMapLineBuilder::new()
                .lineno(10)
                .permit()
                .match_community(c1())
                .set_local_pref(200)
                .set_community(c3(), false)
                .build(),
            RouteMapLineBuilder::new().lineno(20).access_hole().match_next_hop_hole().build(),
        ],
    );
    assert_eq!(
        map.to_string(),
        "route-map import permit 10\n  \
         match community 100:16\n  \
         set local-preference 200\n  \
         set comm-list 100:18 delete\n\
         route-map import ? 20\n  \
         match next-hop ?\n"
    );
}

#[test]
fn as_path_signature() {
    let sig = AsPathSig::from_path(&as_path(&[1, 2, 5]));
    assert_eq!(sig, AsPathSig::new("1_2_5"));
    assert_eq!(sig.to_path(), Some(as_path(&[1, 2, 5])));
    assert_eq!(AsPathSig::new("1_x").to_path(), None);
    assert_eq!(AsPathSig::new("").to_path(), Some(vec![]));
    assert_eq!(ann2().as_path_sig(), AsPathSig::new("9_2_5_7_8_3_10"));
}

#[test]
fn exported() {
    let ann = ann1().exported(AsId(42), Peer::new("R1"), NextHop::new("R1"));
    assert_eq!(ann.as_path, as_path(&[42, 1, 2, 5, 7, 6]));
    assert_eq!(ann.as_path_len, 6);
    assert_eq!(ann.peer, Peer::new("R1"));
    assert_eq!(ann.next_hop, NextHop::new("R1"));
    assert_eq!(ann.local_pref, 100);
    assert!(ann.has_community(&c1()));
}
