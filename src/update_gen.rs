use crate::debug::format_f64_vec;
use crate::error::{Diagnostic, SolnError};
use crate::mpc::{Bus, Gen, Load};
use crate::mpopt::MPOpt;
use crate::order::Status;
use crate::total_load::normalize_loads;
use crate::traits::LoadAggregator;

use num_complex::Complex64;
use sparsetools::csr::CSR;
use std::iter::zip;

/// Generator to bus incidence: element (i, j) is set if gen i is at bus j.
///
/// Stored as one list of generator indices per bus, in input order, so the
/// first generator of a group is the first one in the gen table.
#[derive(Debug, Clone, PartialEq)]
pub struct GenBusIncidence {
    groups: Vec<Vec<usize>>,
}

impl GenBusIncidence {
    /// Builds the incidence of the generators listed in `on` over `nb` buses.
    pub fn new(nb: usize, gen: &[Gen], on: &[usize]) -> Self {
        let mut groups = vec![Vec::new(); nb];
        for &i in on {
            groups[gen[i].gen_bus].push(i);
        }
        Self { groups }
    }

    /// Generators at bus `bus`, in input order.
    pub fn gens_at(&self, bus: usize) -> &[usize] {
        self.groups.get(bus).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Buses with at least one generator, with their generators.
    pub fn groups(&self) -> impl Iterator<Item = (usize, &[usize])> {
        self.groups
            .iter()
            .enumerate()
            .filter(|(_, g)| !g.is_empty())
            .map(|(b, g)| (b, g.as_slice()))
    }

    /// Buses with more than one generator.
    pub fn shared(&self) -> impl Iterator<Item = (usize, &[usize])> {
        self.groups().filter(|(_, g)| g.len() > 1)
    }
}

/// Generators at a bus whose total reactive range is zero.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ZeroRangeBus {
    pub(crate) bus: usize,
    pub(crate) gens: Vec<usize>,
    /// Lower Qg limits of `gens` with infinite values replaced by the proxy.
    pub(crate) qmin: Vec<f64>,
    pub(crate) qg_tot: f64,
    pub(crate) qg_min: f64,
}

/// Updates Qg for gens at PV/slack buses and Pg for the slack bus gen(s).
///
/// Returns diagnostics for conditions that were tolerated.
pub(crate) fn update_gen(
    base_mva: f64,
    bus: &[Bus],
    gen: &mut [Gen],
    load: &[Load],
    y_bus: &CSR<usize, Complex64>,
    v: &[Complex64],
    refbus: &[usize],
    aggregator: &dyn LoadAggregator,
    mpopt: &MPOpt,
) -> Result<Vec<Diagnostic>, SolnError> {
    let nb = bus.len();
    let mut diagnostics = Vec::new();

    // which generators are on and not at PQ buses, and which are off?
    let status = Status::partition(gen, |g| g.is_on() && !bus[g.gen_bus].is_pq());
    let on = status.on;
    let cg = GenBusIncidence::new(nb, gen, &on);

    for &r in refbus {
        if r >= nb {
            return Err(SolnError::RefBus { bus: r, nb });
        }
        if cg.gens_at(r).is_empty() {
            return Err(SolnError::NoRefGen(r));
        }
    }

    // zero out off-line Qg; don't touch the ones at PQ buses
    for g in gen.iter_mut().filter(|g| g.is_off()) {
        g.qg = 0.0;
    }

    // compute total injected bus powers
    let i_bus = y_bus * v;
    let s_bus = |b: usize| v[b] * i_bus[b].conj();

    let (pd_gbus, qd_gbus) = gen_bus_load(bus, load, &cg, aggregator)?;

    for &i in &on {
        let b = gen[i].gen_bus;
        gen[i].qg = s_bus(b).im * base_mva + qd_gbus[b]; // inj Q + local Qd
    }
    log::debug!(
        "{} gens at {} PV/REF buses, {} off-line",
        on.len(),
        cg.groups().count(),
        status.off.len()
    );

    // ...at this point any buses with more than one generator will have
    // the total Q dispatch for the bus assigned to each generator. This
    // must be split between them.
    if on.len() > 1 {
        let zero_range = split_qg(gen, &cg, mpopt);
        if let Some(diagnostic) = fix_zero_range(gen, &zero_range) {
            diagnostics.push(diagnostic);
        }
    }
    log::trace!(
        "Qg = {}",
        format_f64_vec(&on.iter().map(|&i| gen[i].qg).collect::<Vec<f64>>())
    );

    // update Pg for slack gen(s)
    for &r in refbus {
        let refgen = cg.gens_at(r);
        let others: f64 = refgen[1..].iter().map(|&i| gen[i].pg).sum();

        // inj P + local Pd, less what is generated by other gens at this bus
        gen[refgen[0]].pg = s_bus(r).re * base_mva + pd_gbus[r] - others;

        log::debug!(
            "slack gen {} at bus {}: Pg = {} MW ({} other gens)",
            refgen[0],
            r,
            gen[refgen[0]].pg,
            refgen.len() - 1
        );
    }

    Ok(diagnostics)
}

/// Queries the aggregator for the local demand at each generator bus.
///
/// Returns `nb` element vectors, zero at buses without an active gen.
fn gen_bus_load(
    bus: &[Bus],
    load: &[Load],
    cg: &GenBusIncidence,
    aggregator: &dyn LoadAggregator,
) -> Result<(Vec<f64>, Vec<f64>), SolnError> {
    let nb = bus.len();
    let load = normalize_loads(nb, load)?;

    let gbus: Vec<usize> = cg.groups().map(|(b, _)| b).collect();
    let bus_g: Vec<Bus> = gbus.iter().map(|&b| bus[b].clone()).collect();
    let load_g: Vec<Load> = gbus.iter().map(|&b| load[b].clone()).collect();

    let (pd, qd) = aggregator.total_load(&bus_g, &load_g);
    for n in [pd.len(), qd.len()] {
        if n != gbus.len() {
            return Err(SolnError::LoadLength {
                expected: gbus.len(),
                actual: n,
            });
        }
    }

    let mut pd_gbus = vec![0.0; nb];
    let mut qd_gbus = vec![0.0; nb];
    for (k, &b) in gbus.iter().enumerate() {
        pd_gbus[b] = pd[k];
        qd_gbus[b] = qd[k];
    }
    Ok((pd_gbus, qd_gbus))
}

/// Splits the bus total Qg among the generators of each shared bus in
/// proportion to their reactive range.
///
/// Infinite limits are replaced by a finite proxy `M`, the sum over all
/// gens at the bus of `|Qg|` plus any finite limits. Returns the buses
/// whose total range is zero; their gens keep the proportional values
/// until [`fix_zero_range`] is applied.
pub(crate) fn split_qg(gen: &mut [Gen], cg: &GenBusIncidence, mpopt: &MPOpt) -> Vec<ZeroRangeBus> {
    let mut zero_range = Vec::new();

    for (b, gens) in cg.shared() {
        // divide Qg by number of generators at the bus to distribute equally
        let n = gens.len() as f64;
        let qg: Vec<f64> = gens.iter().map(|&i| gen[i].qg / n).collect();

        // set finite proxy M for infinite limits
        let m: f64 = zip(gens, &qg)
            .map(|(&i, qg)| {
                let g = &gen[i];
                let mut m = qg.abs();
                if g.qmax.is_finite() {
                    m += g.qmax.abs();
                }
                if g.qmin.is_finite() {
                    m += g.qmin.abs();
                }
                m
            })
            .sum();

        let proxy = |q: f64| {
            if q == f64::INFINITY {
                m
            } else if q == f64::NEG_INFINITY {
                -m
            } else {
                q
            }
        };
        let qmin: Vec<f64> = gens.iter().map(|&i| proxy(gen[i].qmin)).collect();
        let qmax: Vec<f64> = gens.iter().map(|&i| proxy(gen[i].qmax)).collect();

        let qg_tot: f64 = qg.iter().sum(); // total Qg at the bus
        let qg_min: f64 = qmin.iter().sum(); // min total Qg at the bus
        let qg_max: f64 = qmax.iter().sum(); // max total Qg at the bus

        // divide proportionally
        let ratio = (qg_tot - qg_min) / (qg_max - qg_min + mpopt.eps);
        for (k, &i) in gens.iter().enumerate() {
            gen[i].qg = qmin[k] + ratio * (qmax[k] - qmin[k]);
        }

        if (qg_max - qg_min).abs() < mpopt.zero_range_tol {
            zero_range.push(ZeroRangeBus {
                bus: b,
                gens: gens.to_vec(),
                qmin,
                qg_tot,
                qg_min,
            });
        }
    }

    zero_range
}

/// Qg for gens at zero range buses such that all generators at a bus
/// violate their limits by the same amount.
///
/// Returns `(gen, qg)` pairs for every generator of every listed bus.
pub(crate) fn equal_violation(zero_range: &[ZeroRangeBus]) -> Result<Vec<(usize, f64)>, String> {
    let mut fixed = Vec::new();
    for zb in zero_range {
        if zb.gens.is_empty() {
            return Err(format!("no generators at bus {}", zb.bus));
        }
        if zb.gens.len() != zb.qmin.len() {
            return Err(format!(
                "bus {} has {} gens but {} Qmin values",
                zb.bus,
                zb.gens.len(),
                zb.qmin.len()
            ));
        }

        // total mismatch at bus divided by number of gens
        let mis = (zb.qg_tot - zb.qg_min) / zb.gens.len() as f64;
        if !mis.is_finite() {
            return Err(format!("mismatch at bus {} is not finite", zb.bus));
        }

        fixed.extend(zip(&zb.gens, &zb.qmin).map(|(&i, &qmin)| (i, qmin + mis)));
    }
    Ok(fixed)
}

/// Applies [`equal_violation`] to `gen`. If the correction cannot be
/// computed nothing is changed and a diagnostic is returned.
pub(crate) fn fix_zero_range(gen: &mut [Gen], zero_range: &[ZeroRangeBus]) -> Option<Diagnostic> {
    if zero_range.is_empty() {
        return None;
    }
    match equal_violation(zero_range) {
        Ok(fixed) => {
            log::debug!("equal violation Qg at {} zero range buses", zero_range.len());
            for (i, qg) in fixed {
                gen[i].qg = qg;
            }
            None
        }
        Err(reason) => {
            let diagnostic = Diagnostic::ZeroRangeUnfixed {
                buses: zero_range.iter().map(|zb| zb.bus).collect(),
                reason,
            };
            log::warn!("{}", diagnostic);
            Some(diagnostic)
        }
    }
}
