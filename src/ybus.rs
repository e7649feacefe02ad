use crate::mpc::{Branch, Bus};
use num_complex::Complex64;
use sparsetools::coo::Coo;
use sparsetools::csr::CSR;
use std::f64::consts::PI;

/// Elements of the two-port admittance matrix of a branch:
///
/// ```txt
///      | If |   | Yff  Yft |   | Vf |
///      |    | = |          | * |    |
///      | It |   | Ytf  Ytt |   | Vt |
/// ```
pub(crate) struct BranchAdmittance {
    pub(crate) y_ff: Complex64,
    pub(crate) y_ft: Complex64,
    pub(crate) y_tf: Complex64,
    pub(crate) y_tt: Complex64,
}

impl BranchAdmittance {
    pub(crate) fn new(br: &Branch) -> Self {
        if br.is_off() {
            let zero = Complex64::default();
            return Self {
                y_ff: zero,
                y_ft: zero,
                y_tf: zero,
                y_tt: zero,
            };
        }
        let y_s = Complex64::new(1.0, 0.0) / Complex64::new(br.br_r, br.br_x); // series admittance
        let b_c = br.br_b; // line charging susceptance
        let t = if br.tap == 0.0 { 1.0 } else { br.tap }; // default tap ratio = 1
        let tap = Complex64::from_polar(t, br.shift * PI / 180.0); // add phase shifters

        let y_tt = y_s + Complex64::new(0.0, b_c / 2.0);
        Self {
            y_ff: y_tt / (tap * tap.conj()),
            y_ft: -y_s / tap.conj(),
            y_tf: -y_s / tap,
            y_tt,
        }
    }
}

/// Builds the bus admittance matrix and branch admittance matrices.
///
/// Returns `(Ybus, Yf, Yt)` where `Yf * V` is the vector of complex branch
/// currents injected at each branch's "from" bus and `Yt * V` the same for
/// the "to" bus end. Out-of-service branches contribute nothing. Expects
/// internal consecutive bus numbering.
pub fn make_ybus(
    base_mva: f64,
    bus: &[Bus],
    branch: &[Branch],
) -> (
    CSR<usize, Complex64>,
    CSR<usize, Complex64>,
    CSR<usize, Complex64>,
) {
    let nb = bus.len();
    let nl = branch.len();

    let mut y_bus = Coo::with_size(nb, nb);
    let mut y_f = Coo::with_size(nl, nb);
    let mut y_t = Coo::with_size(nl, nb);

    for (l, br) in branch.iter().enumerate() {
        let y = BranchAdmittance::new(br);
        let (f, t) = (br.f_bus, br.t_bus);

        y_f.push(l, f, y.y_ff);
        y_f.push(l, t, y.y_ft);

        y_t.push(l, f, y.y_tf);
        y_t.push(l, t, y.y_tt);

        y_bus.push(f, f, y.y_ff);
        y_bus.push(f, t, y.y_ft);
        y_bus.push(t, f, y.y_tf);
        y_bus.push(t, t, y.y_tt);
    }

    // If Psh is the real power consumed by the shunt at V = 1.0 p.u.
    // and Qsh is the reactive power injected by the shunt at V = 1.0 p.u.
    // then Psh - j Qsh = V * conj(Ysh * V) = conj(Ysh) = Gs - j Bs,
    // i.e. Ysh = Psh + j Qsh.
    for (i, b) in bus.iter().enumerate() {
        y_bus.push(i, i, Complex64::new(b.gs, b.bs) / base_mva);
    }

    (y_bus.to_csr(), y_f.to_csr(), y_t.to_csr())
}
