use crate::debug::format_rect_vec;
use crate::mpc::Branch;
use crate::order::Status;

use num_complex::Complex64;
use sparsetools::csr::CSR;

/// Makes room for the flow fields in every branch record that lacks them.
///
/// Missing fields are zero filled. Present fields, and any fields that
/// follow them, are left unchanged. Returns the number of widened records.
pub fn widen_branch(branch: &mut [Branch]) -> usize {
    let mut widened = 0;
    for br in branch.iter_mut().filter(|br| !br.has_flows()) {
        br.pf.get_or_insert(0.0);
        br.qf.get_or_insert(0.0);
        br.pt.get_or_insert(0.0);
        br.qt.get_or_insert(0.0);
        widened += 1;
    }
    widened
}

/// Updates/computes branch power flows.
///
/// In-service branches get the complex power injected at each end,
/// out-of-service branches get zero flows.
pub(crate) fn update_branch_flows(
    base_mva: f64,
    branch: &mut [Branch],
    y_f: &CSR<usize, Complex64>,
    y_t: &CSR<usize, Complex64>,
    v: &[Complex64],
) {
    let widened = widen_branch(branch);
    if widened != 0 {
        log::debug!("added flow fields to {} branch records", widened);
    }

    let status = Status::partition(branch, Branch::is_on);

    let i_f = y_f * v;
    let i_t = y_t * v;

    let mut s_f = Vec::with_capacity(status.on.len());
    for &l in &status.on {
        let br = &mut branch[l];
        let sf = v[br.f_bus] * i_f[l].conj() * base_mva; // complex power at "from" bus
        let st = v[br.t_bus] * i_t[l].conj() * base_mva; // complex power injected at "to" bus

        br.pf = Some(sf.re);
        br.qf = Some(sf.im);
        br.pt = Some(st.re);
        br.qt = Some(st.im);
        s_f.push(sf);
    }
    for &l in &status.off {
        let br = &mut branch[l];
        br.pf = Some(0.0);
        br.qf = Some(0.0);
        br.pt = Some(0.0);
        br.qt = Some(0.0);
    }
    log::trace!("Sf = {}", format_rect_vec(&s_f));
}
