use crate::mpc::MPC;
use crate::order::BusOrder;
use anyhow::{format_err, Result};

/// Reverts a case to the external bus numbers saved in `order`.
pub fn int_to_ext(mpc: &MPC, order: &BusOrder) -> Result<MPC> {
    let i2e = |i: usize| -> Result<usize> {
        order
            .i2e
            .get(i)
            .copied()
            .ok_or_else(|| format_err!("internal bus index {} out of range", i))
    };

    let mut mpc = mpc.clone();

    // revert to original bus numbers
    for b in mpc.bus.iter_mut() {
        b.bus_i = i2e(b.bus_i)?;
    }
    for g in mpc.gen.iter_mut() {
        g.gen_bus = i2e(g.gen_bus)?;
    }
    for br in mpc.branch.iter_mut() {
        br.f_bus = i2e(br.f_bus)?;
        br.t_bus = i2e(br.t_bus)?;
    }
    for ld in mpc.load.iter_mut() {
        ld.load_bus = i2e(ld.load_bus)?;
    }

    Ok(mpc)
}
