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
use super::test_synthesize::{assert_consistent, local_pref_problem, peer_local_pref_problem};
use crate::smt::*;
use crate::synthesis::*;
use crate::{Error, LocalRouter, Synthesis, SynthesisProblem};

use maplit::btreemap;

fn synthesize(problem: &SynthesisProblem) -> Result<Synthesis, Error> {
    let _ = pretty_env_logger::try_init();
    problem.synthesize(&mut Z3Solver::new())
}

fn model(solver: &mut Z3Solver) -> Model {
    match solver.check().unwrap() {
        CheckResult::Sat(model) => model,
        r => panic!("Expected a model, got {:?}", r),
    }
}

fn int(model: &Model, name: &str) -> i64 {
    match model.get(name) {
        Some(ModelValue::Int(x)) => x,
        v => panic!("Expected an integer for {}, got {:?}", name, v),
    }
}

#[test]
fn integer_model() {
    let mut solver = Z3Solver::new();
    solver.declare("x", Sort::Int).unwrap();
    solver.register("x_gt_5", &Term::var("x").gt(&Term::int(5))).unwrap();
    solver.register("x_lt_7", &Term::var("x").lt(&Term::int(7))).unwrap();
    assert_eq!(model(&mut solver).get("x"), Some(ModelValue::Int(6)));
}

#[test]
fn chained_integer_comparisons() {
    let mut solver = Z3Solver::new();
    solver.declare("x", Sort::Int).unwrap();
    solver.declare("y", Sort::Int).unwrap();
    solver.register("x_gt_y", &Term::var("x").gt(&Term::var("y"))).unwrap();
    solver.register("y_gt_200", &Term::var("y").gt(&Term::int(200))).unwrap();
    let model = model(&mut solver);
    let (x, y) = (int(&model, "x"), int(&model, "y"));
    assert!(y > 200);
    assert!(x > y);
}

#[test]
fn enumeration_bounds() {
    let mut solver = Z3Solver::new();
    solver.declare("p", Sort::Enum(DomainKind::Prefix, 3)).unwrap();
    solver.declare("b", Sort::Bool).unwrap();
    solver.register("not_0", &Term::var("p").eq(&Term::token(0)).not()).unwrap();
    solver.register("not_1", &Term::var("p").eq(&Term::token(1)).not()).unwrap();
    solver.register("b", &Term::var("b").implies(&Term::var("p").eq(&Term::token(0)))).unwrap();
    let model = model(&mut solver);
    assert_eq!(model.get("p"), Some(ModelValue::Token(2)));
    assert_eq!(model.get("b"), Some(ModelValue::Bool(false)));

    // no token outside of the domain
    solver.register("not_2", &Term::var("p").eq(&Term::token(2)).not()).unwrap();
    match solver.check().unwrap() {
        CheckResult::Unsat(core) => {
            for name in ["not_0", "not_1", "not_2"].iter() {
                assert!(core.contains(&name.to_string()));
            }
        }
        r => panic!("Expected an unsat result, got {:?}", r),
    }
}

#[test]
fn unused_variables_are_assigned() {
    let mut solver = Z3Solver::new();
    solver.declare("x", Sort::Int).unwrap();
    solver.declare("p", Sort::Enum(DomainKind::NextHop, 2)).unwrap();
    let model = model(&mut solver);
    assert_eq!(model.len(), 2);
    assert!(matches!(model.get("p"), Some(ModelValue::Token(0)) | Some(ModelValue::Token(1))));
}

#[test]
fn unsat_core_names_constraints() {
    let mut solver = Z3Solver::new();
    solver.declare("x", Sort::Int).unwrap();
    solver.declare("b", Sort::Bool).unwrap();
    solver.register("b_true", &Term::var("b")).unwrap();
    solver.register("x_gt_5", &Term::var("x").gt(&Term::int(5))).unwrap();
    solver.register("x_lt_5", &Term::var("x").lt(&Term::int(5))).unwrap();
    match solver.check().unwrap() {
        CheckResult::Unsat(core) => {
            assert!(core.contains(&"x_gt_5".to_string()));
            assert!(core.contains(&"x_lt_5".to_string()));
        }
        r => panic!("Expected an unsat result, got {:?}", r),
    }
}

#[test]
fn undeclared_variable() {
    let mut solver = Z3Solver::new();
    assert!(solver.register("c", &Term::var("y").eq(&Term::int(1))).is_err());
}

#[test]
fn community_local_pref() {
    let problem = local_pref_problem(false);
    let result = synthesize(&problem).unwrap();

    let local_pref = match result.route_map.lines()[0].actions() {
        [RouteMapSet::LocalPref(Some(lp))] => *lp,
        a => panic!("Unexpected set clauses: {:?}", a),
    };
    assert!(local_pref > 100);
    assert_eq!(result.selected, btreemap! {Prefix::new("Prefix1") => Some("A".to_string())});
    assert_consistent(&result, &problem, ChainDefault::PassThrough, &DecisionProcess::default());
}

#[test]
fn community_local_pref_unsat() {
    match synthesize(&local_pref_problem(true)) {
        Err(Error::Unsatisfiable(core)) => {
            assert!(core.contains(&"select_Prefix1_A".to_string()))
        }
        r => panic!("Expected an unsat result, got {:?}", r),
    }
}

#[test]
fn local_pref_holes_compared_to_each_other() {
    let problem = peer_local_pref_problem();
    let result = synthesize(&problem).unwrap();

    let lp_a = result.imported["a"].local_pref;
    let lp_b = result.imported["b"].local_pref;
    assert!(lp_b > 200);
    assert!(lp_a > lp_b);
    assert_consistent(&result, &problem, ChainDefault::PassThrough, &DecisionProcess::default());
}

#[test]
fn deny_next_hop() {
    let import = RouteMap::new(
        "import",
        vec![RouteMapLineBuilder::new().lineno(10).deny().match_next_hop_hole().build()],
    );
    let mut problem = SynthesisProblem::new(LocalRouter::new("R1", AsId(1)), import);
    problem
        .announcement("a", Announcement::new("Prefix1", "Peer1", as_path(&[2]), "Hop1"))
        .announcement("b", Announcement::new("Prefix1", "Peer2", as_path(&[3, 4]), "Hop2"))
        .require("b");
    let result = synthesize(&problem).unwrap();

    assert_eq!(
        result.route_map.lines()[0].conds(),
        &[RouteMapMatch::NextHop(Some(NextHop::new("Hop1")))]
    );
    assert!(!result.imported["a"].permitted);
    assert_consistent(&result, &problem, ChainDefault::PassThrough, &DecisionProcess::default());
}
