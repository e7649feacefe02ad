use crate::branch_flow::update_branch_flows;
use crate::debug::format_polar_vec;
use crate::error::{Diagnostic, SolnError};
use crate::mpc::{Branch, Bus, Gen, Load};
use crate::mpopt::MPOpt;
use crate::traits::LoadAggregator;
use crate::update_gen::update_gen;

use num_complex::Complex64;
use sparsetools::csr::CSR;
use std::iter::zip;

/// Updated case data after finishing a power flow solution.
#[derive(Debug, Clone)]
pub struct Soln {
    pub bus: Vec<Bus>,
    pub gen: Vec<Gen>,
    pub branch: Vec<Branch>,

    /// Conditions that were tolerated while updating the case data.
    pub diagnostics: Vec<Diagnostic>,
}

/// Updates bus, gen, branch data structures to match a power flow solution.
///
/// Writes the solved voltage magnitudes into `bus`, computes generator
/// reactive output (and active output of slack gens) from the bus power
/// injections and computes the branch flows. `refbus` lists the reference
/// buses; `pv` and `pq` the remaining bus types. Local demand at generator
/// buses comes from `aggregator` applied to `load`. The inputs are not
/// modified.
pub fn pfsoln(
    base_mva: f64,
    bus0: &[Bus],
    gen0: &[Gen],
    branch0: &[Branch],
    load: &[Load],
    y_bus: &CSR<usize, Complex64>,
    y_f: &CSR<usize, Complex64>,
    y_t: &CSR<usize, Complex64>,
    v: &[Complex64],
    refbus: &[usize],
    _pv: &[usize],
    _pq: &[usize],
    aggregator: &dyn LoadAggregator,
    mpopt: &MPOpt,
) -> Result<Soln, SolnError> {
    check_dims(bus0, gen0, branch0, y_bus, y_f, y_t, v)?;
    log::trace!("V = {}", format_polar_vec(v));

    let (mut bus, mut gen, mut branch) = (bus0.to_vec(), gen0.to_vec(), branch0.to_vec());

    // update bus voltages
    update_vm(&mut bus, v);

    // update Qg for gens at PV/slack buses and Pg for slack bus(es)
    let diagnostics = update_gen(
        base_mva, &bus, &mut gen, load, y_bus, v, refbus, aggregator, mpopt,
    )?;

    // update/compute branch power flows
    update_branch_flows(base_mva, &mut branch, y_f, y_t, v);

    Ok(Soln {
        bus,
        gen,
        branch,
        diagnostics,
    })
}

/// Overwrites the voltage magnitude of each bus with `|V|`.
pub fn update_vm(bus: &mut [Bus], v: &[Complex64]) {
    for (b, v) in zip(bus, v) {
        b.vm = v.norm();
    }
}

fn check_dims(
    bus: &[Bus],
    gen: &[Gen],
    branch: &[Branch],
    y_bus: &CSR<usize, Complex64>,
    y_f: &CSR<usize, Complex64>,
    y_t: &CSR<usize, Complex64>,
    v: &[Complex64],
) -> Result<(), SolnError> {
    let nb = bus.len();
    let nl = branch.len();

    if v.len() != nb {
        return Err(SolnError::VoltageLength {
            expected: nb,
            actual: v.len(),
        });
    }
    for (name, mat, rows) in [("Ybus", y_bus, nb), ("Yf", y_f, nl), ("Yt", y_t, nl)] {
        if mat.rows() != rows || mat.cols() != nb {
            return Err(SolnError::MatrixShape {
                name,
                rows: mat.rows(),
                cols: mat.cols(),
                expected_rows: rows,
                expected_cols: nb,
            });
        }
    }
    if let Some((i, g)) = gen.iter().enumerate().find(|(_, g)| g.gen_bus >= nb) {
        return Err(SolnError::GenBus {
            gen: i,
            bus: g.gen_bus,
            nb,
        });
    }
    for (l, br) in branch.iter().enumerate() {
        for bus in [br.f_bus, br.t_bus] {
            if bus >= nb {
                return Err(SolnError::BranchBus { branch: l, bus, nb });
            }
        }
    }
    Ok(())
}
