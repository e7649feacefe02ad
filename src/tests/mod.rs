mod test_update_gen;

use crate::mpc::{Bus, BusType, Gen, Load};
use crate::traits::LoadAggregator;

use num_complex::Complex64;
use sparsetools::coo::Coo;
use sparsetools::csr::CSR;

pub(crate) const TOL: f64 = 1e-9;

pub(crate) fn assert_close(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() <= tol,
        "expected {}, got {} (tol {})",
        expected,
        actual,
        tol
    );
}

/// Sparse matrix from dense rows, skipping zeros.
pub(crate) fn csr(rows: usize, cols: usize, dense: &[Vec<Complex64>]) -> CSR<usize, Complex64> {
    let mut coo = Coo::with_size(rows, cols);
    for (i, row) in dense.iter().enumerate() {
        for (j, &y) in row.iter().enumerate() {
            if y != Complex64::default() {
                coo.push(i, j, y);
            }
        }
    }
    coo.to_csr()
}

/// Diagonal Ybus giving the bus injections `s_pu` (p.u.) at V = 1.
pub(crate) fn ybus_with_injections(s_pu: &[Complex64]) -> CSR<usize, Complex64> {
    let n = s_pu.len();
    let dense: Vec<Vec<Complex64>> = (0..n)
        .map(|i| {
            let mut row = vec![Complex64::default(); n];
            row[i] = s_pu[i].conj();
            row
        })
        .collect();
    csr(n, n, &dense)
}

pub(crate) fn empty_branch_mat(nb: usize) -> CSR<usize, Complex64> {
    Coo::<usize, Complex64>::with_size(0, nb).to_csr()
}

pub(crate) fn flat(nb: usize) -> Vec<Complex64> {
    vec![Complex64::new(1.0, 0.0); nb]
}

pub(crate) fn bus(bus_i: usize, bus_type: BusType, pd: f64, qd: f64) -> Bus {
    Bus {
        bus_i,
        bus_type,
        pd,
        qd,
        vm: 1.0,
        base_kv: 345.0,
        vmax: 1.1,
        vmin: 0.9,
        ..Default::default()
    }
}

pub(crate) fn gen(gen_bus: usize, pg: f64, qmin: f64, qmax: f64) -> Gen {
    Gen {
        gen_bus,
        pg,
        qmin,
        qmax,
        vg: 1.0,
        mbase: 100.0,
        gen_status: true,
        pmax: 250.0,
        ..Default::default()
    }
}

/// Aggregator that breaks the length contract.
pub(crate) struct ShortLoad;

impl LoadAggregator for ShortLoad {
    fn total_load(&self, _bus: &[Bus], _load: &[Load]) -> (Vec<f64>, Vec<f64>) {
        (Vec::new(), Vec::new())
    }
}
