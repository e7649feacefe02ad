use crate::error::{Diagnostic, SolnError};
use crate::mpc::{Bus, BusType, Gen, Load};
use crate::mpopt::MPOpt;
use crate::order::Status;
use crate::pfsoln::{pfsoln, Soln};
use crate::tests::*;
use crate::total_load::ZipLoad;
use crate::traits::LoadAggregator;
use crate::update_gen::{equal_violation, fix_zero_range, split_qg, GenBusIncidence, ZeroRangeBus};

use num_complex::Complex64;
use std::collections::HashSet;

const BASE_MVA: f64 = 100.0;

fn run_with(
    bus: &[Bus],
    gen: &[Gen],
    load: &[Load],
    s_pu: &[Complex64],
    refbus: &[usize],
    aggregator: &dyn LoadAggregator,
) -> Result<Soln, SolnError> {
    let nb = bus.len();
    let y_bus = ybus_with_injections(s_pu);
    let y_br = empty_branch_mat(nb);
    pfsoln(
        BASE_MVA,
        bus,
        gen,
        &[],
        load,
        &y_bus,
        &y_br,
        &y_br,
        &flat(nb),
        refbus,
        &[],
        &[],
        aggregator,
        &MPOpt::default(),
    )
}

fn run(bus: &[Bus], gen: &[Gen], s_pu: &[Complex64], refbus: &[usize]) -> Soln {
    run_with(bus, gen, &[], s_pu, refbus, &ZipLoad::default()).unwrap()
}

fn s(p: f64, q: f64) -> Complex64 {
    Complex64::new(p, q)
}

#[test]
fn off_gens_have_zero_qg() {
    let bus = vec![bus(0, BusType::REF, 0.0, 0.0), bus(1, BusType::PV, 0.0, 0.0)];
    let mut off = gen(1, 40.0, -10.0, 10.0);
    off.gen_status = false;
    off.qg = 12.5;
    let gen = vec![gen(0, 0.0, -100.0, 100.0), off];

    let soln = run(&bus, &gen, &[s(0.5, 0.1), s(0.0, 0.3)], &[0]);

    assert_eq!(soln.gen[1].qg, 0.0);
    assert_eq!(soln.gen[1].pg, 40.0);
}

#[test]
fn single_gen_takes_injection_plus_local_demand() {
    let bus = vec![
        bus(0, BusType::REF, 0.0, 0.0),
        bus(1, BusType::PV, 30.0, 12.0),
    ];
    let gen = vec![gen(0, 0.0, -100.0, 100.0), gen(1, 30.0, -5.0, 5.0)];

    let soln = run(&bus, &gen, &[s(0.1, 0.0), s(0.2, 0.35)], &[0]);

    // not clamped to the limits: a single gen takes the whole bus value
    assert_close(soln.gen[1].qg, 35.0 + 12.0, TOL);
    assert_eq!(soln.gen[1].pg, 30.0);
}

#[test]
fn gen_at_pq_bus_is_untouched() {
    let bus = vec![bus(0, BusType::REF, 0.0, 0.0), bus(1, BusType::PQ, 0.0, 0.0)];
    let mut g = gen(1, 10.0, -10.0, 10.0);
    g.qg = 3.0;
    let gen = vec![gen(0, 0.0, -100.0, 100.0), g];

    let soln = run(&bus, &gen, &[s(0.1, 0.0), s(0.0, 0.4)], &[0]);

    assert_eq!(soln.gen[1].qg, 3.0);
    assert_eq!(soln.gen[1].pg, 10.0);
}

#[test]
fn load_records_scale_local_demand() {
    let bus = vec![
        bus(0, BusType::REF, 0.0, 0.0),
        bus(1, BusType::PV, 30.0, 12.0),
    ];
    let gen = vec![gen(0, 0.0, -100.0, 100.0), gen(1, 30.0, -50.0, 50.0)];
    let load = vec![Load {
        load_bus: 1,
        status: true,
        scaling: 0.5,
        sd: None,
    }];

    let soln = run_with(
        &bus,
        &gen,
        &load,
        &[s(0.1, 0.0), s(0.2, 0.1)],
        &[0],
        &ZipLoad::default(),
    )
    .unwrap();

    assert_close(soln.gen[1].qg, 10.0 + 6.0, TOL);
}

#[test]
fn shared_bus_split_is_conservative_and_within_limits() {
    let bus = vec![
        bus(0, BusType::REF, 0.0, 0.0),
        bus(1, BusType::PV, 0.0, 10.0),
    ];
    let gen = vec![
        gen(0, 0.0, -100.0, 100.0),
        gen(1, 20.0, -20.0, 60.0),
        gen(1, 20.0, 0.0, 20.0),
        gen(1, 20.0, -40.0, 40.0),
    ];

    // bus total 40 + 10 = 50 MVAr
    let soln = run(&bus, &gen, &[s(0.3, 0.0), s(0.6, 0.4)], &[0]);

    let total: f64 = soln.gen[1..].iter().map(|g| g.qg).sum();
    assert_close(total, 50.0, 1e-9);
    for (g, g0) in soln.gen[1..].iter().zip(&gen[1..]) {
        assert!(g.qg >= g0.qmin - TOL && g.qg <= g0.qmax + TOL, "{}", g.qg);
    }

    // range 180, total min -60
    let ratio = 110.0 / 180.0;
    assert_close(soln.gen[1].qg, -20.0 + ratio * 80.0, 1e-9);
    assert_close(soln.gen[2].qg, ratio * 20.0, 1e-9);
    assert_close(soln.gen[3].qg, -40.0 + ratio * 80.0, 1e-9);

    // limits are not rewritten
    assert_eq!(soln.gen[1].qmin, -20.0);
    assert_eq!(soln.gen[1].qmax, 60.0);
}

#[test]
fn infinite_limits_use_proxy() {
    let bus = vec![
        bus(0, BusType::REF, 0.0, 0.0),
        bus(1, BusType::PQ, 0.0, 0.0),
        bus(2, BusType::PQ, 0.0, 0.0),
        bus(3, BusType::PV, 0.0, 20.0),
    ];
    let gen = vec![
        gen(0, 0.0, -100.0, 100.0),
        gen(3, 50.0, f64::NEG_INFINITY, f64::INFINITY),
        gen(3, 50.0, -50.0, 50.0),
    ];

    // bus total 60 + 20 = 80 MVAr
    let s_pu = [s(0.0, 0.0), s(0.0, 0.0), s(0.0, 0.0), s(1.0, 0.6)];
    let soln = run(&bus, &gen, &s_pu, &[0]);

    let (q1, q2) = (soln.gen[1].qg, soln.gen[2].qg);
    assert_close(q1 + q2, 80.0, 1e-9);
    assert!((-50.0..=50.0).contains(&q2), "{}", q2);
    assert!(q1 > q2);

    // M = 40 + 40 + 50 + 50
    let ratio = (80.0 + 230.0) / 460.0;
    assert_close(q1, -180.0 + ratio * 360.0, 1e-9);
    assert_close(q2, -50.0 + ratio * 100.0, 1e-9);

    assert!(soln.gen[1].qmin.is_infinite() && soln.gen[1].qmax.is_infinite());
    assert!(soln.diagnostics.is_empty());
}

#[test]
fn zero_range_bus_splits_violation_equally() {
    let bus = vec![
        bus(0, BusType::REF, 0.0, 0.0),
        bus(1, BusType::PV, 0.0, 0.0),
    ];
    let gen = vec![
        gen(0, 0.0, -100.0, 100.0),
        gen(1, 0.0, 10.0, 10.0),
        gen(1, 0.0, 10.0, 10.0),
    ];

    let soln = run(&bus, &gen, &[s(0.0, 0.0), s(0.0, 0.3)], &[0]);

    // total 30, total min 20: each gen 5 over its limit
    assert_close(soln.gen[1].qg, 15.0, 1e-9);
    assert_close(soln.gen[2].qg, 15.0, 1e-9);
    assert!(soln.diagnostics.is_empty());
}

#[test]
fn every_zero_range_gen_is_fixed_once() {
    let mut gen = vec![
        gen(0, 0.0, 10.0, 10.0),
        gen(1, 0.0, -30.0, 30.0),
        gen(0, 0.0, 10.0, 10.0),
        gen(2, 0.0, 0.0, 0.0),
        gen(1, 0.0, -10.0, 10.0),
        gen(2, 0.0, 0.0, 0.0),
        gen(2, 0.0, 0.0, 0.0),
    ];
    let bus_total = [30.0, 20.0, -6.0];
    for g in gen.iter_mut() {
        g.qg = bus_total[g.gen_bus];
    }
    let on: Vec<usize> = (0..gen.len()).collect();
    let cg = GenBusIncidence::new(3, &gen, &on);

    let zero_range = split_qg(&mut gen, &cg, &MPOpt::default());
    assert_eq!(
        zero_range.iter().map(|zb| zb.bus).collect::<Vec<_>>(),
        vec![0, 2]
    );

    let fixed = equal_violation(&zero_range).unwrap();
    let fixed_gens: Vec<usize> = fixed.iter().map(|&(i, _)| i).collect();
    let unique: HashSet<usize> = fixed_gens.iter().copied().collect();
    assert_eq!(unique.len(), fixed_gens.len());
    assert_eq!(unique, HashSet::from([0, 2, 3, 5, 6]));

    let q_bus1 = (gen[1].qg, gen[4].qg);
    assert!(fix_zero_range(&mut gen, &zero_range).is_none());

    for i in [0, 2] {
        assert_close(gen[i].qg, 15.0, 1e-9);
    }
    for i in [3, 5, 6] {
        assert_close(gen[i].qg, -2.0, 1e-9);
    }
    assert_eq!((gen[1].qg, gen[4].qg), q_bus1);
    assert_close(gen[1].qg + gen[4].qg, 20.0, 1e-9);
}

#[test]
fn unfixable_zero_range_is_reported() {
    let mut gen = vec![gen(0, 0.0, 5.0, 5.0), gen(0, 0.0, 5.0, 5.0)];
    gen[0].qg = 7.0;
    gen[1].qg = 3.0;

    let zero_range = vec![ZeroRangeBus {
        bus: 4,
        gens: Vec::new(),
        qmin: Vec::new(),
        qg_tot: 10.0,
        qg_min: 10.0,
    }];
    assert!(equal_violation(&zero_range).is_err());

    let diagnostic = fix_zero_range(&mut gen, &zero_range).unwrap();
    assert!(matches!(
        diagnostic,
        Diagnostic::ZeroRangeUnfixed { ref buses, .. } if buses == &vec![4]
    ));
    assert_eq!((gen[0].qg, gen[1].qg), (7.0, 3.0));
}

#[test]
fn no_zero_range_buses_is_not_a_failure() {
    let mut gen = vec![gen(0, 0.0, -5.0, 5.0)];
    assert!(equal_violation(&[]).unwrap().is_empty());
    assert!(fix_zero_range(&mut gen, &[]).is_none());
}

#[test]
fn single_slack_gen_takes_injection_plus_demand() {
    let bus = vec![
        bus(0, BusType::REF, 20.0, 5.0),
        bus(1, BusType::PQ, 100.0, 0.0),
    ];
    let gen = vec![gen(0, 0.0, -100.0, 100.0)];

    let soln = run(&bus, &gen, &[s(0.8, 0.1), s(-1.0, 0.0)], &[0]);

    assert_close(soln.gen[0].pg, 80.0 + 20.0, TOL);
    assert_close(soln.gen[0].qg, 10.0 + 5.0, TOL);
}

#[test]
fn first_slack_gen_balances_the_others() {
    let bus = vec![
        bus(0, BusType::PV, 0.0, 0.0),
        bus(1, BusType::REF, 20.0, 0.0),
    ];
    let mut off = gen(1, 15.0, -10.0, 10.0);
    off.gen_status = false;
    let gen = vec![
        gen(0, 10.0, -10.0, 10.0),
        off,
        gen(1, 0.0, -50.0, 50.0),
        gen(1, 30.0, -50.0, 50.0),
        gen(1, 25.0, -50.0, 50.0),
    ];

    let soln = run(&bus, &gen, &[s(0.1, 0.0), s(1.0, 0.0)], &[1]);

    // first active gen at the ref bus, in input order
    assert_close(soln.gen[2].pg, 100.0 + 20.0 - 30.0 - 25.0, TOL);
    assert_eq!(soln.gen[3].pg, 30.0);
    assert_eq!(soln.gen[4].pg, 25.0);
    assert_eq!(soln.gen[1].pg, 15.0);
    let total: f64 = soln.gen[2..].iter().map(|g| g.pg).sum();
    assert_close(total, 120.0, TOL);

    // PV bus Pg is not touched
    assert_eq!(soln.gen[0].pg, 10.0);
}

#[test]
fn ref_bus_without_gen_is_an_error() {
    let bus = vec![bus(0, BusType::REF, 0.0, 0.0), bus(1, BusType::PV, 0.0, 0.0)];
    let mut g0 = gen(0, 0.0, -10.0, 10.0);
    g0.gen_status = false;
    let gen = vec![g0, gen(1, 0.0, -10.0, 10.0)];

    let err = run_with(&bus, &gen, &[], &[s(0.0, 0.0), s(0.0, 0.0)], &[0], &ZipLoad::default())
        .unwrap_err();
    assert_eq!(err, SolnError::NoRefGen(0));

    let err = run_with(&bus, &gen, &[], &[s(0.0, 0.0), s(0.0, 0.0)], &[7], &ZipLoad::default())
        .unwrap_err();
    assert_eq!(err, SolnError::RefBus { bus: 7, nb: 2 });
}

#[test]
fn aggregator_length_is_checked() {
    let bus = vec![bus(0, BusType::REF, 0.0, 0.0)];
    let gen = vec![gen(0, 0.0, -10.0, 10.0)];

    let err = run_with(&bus, &gen, &[], &[s(0.0, 0.0)], &[0], &ShortLoad).unwrap_err();
    assert_eq!(
        err,
        SolnError::LoadLength {
            expected: 1,
            actual: 0
        }
    );
}

#[test]
fn incidence_keeps_input_order() {
    let gen = vec![
        gen(2, 0.0, 0.0, 0.0),
        gen(0, 0.0, 0.0, 0.0),
        gen(2, 0.0, 0.0, 0.0),
        gen(2, 0.0, 0.0, 0.0),
    ];
    let status = Status::partition(&gen, Gen::is_on);
    let cg = GenBusIncidence::new(3, &gen, &status.on);

    assert_eq!(cg.gens_at(0), &[1]);
    assert!(cg.gens_at(1).is_empty());
    assert_eq!(cg.gens_at(2), &[0, 2, 3]);
    assert!(cg.gens_at(9).is_empty());
    assert_eq!(cg.shared().map(|(b, _)| b).collect::<Vec<_>>(), vec![2]);
    assert_eq!(cg.groups().count(), 2);
}
