use crate::mpc::MPC;
use crate::order::BusOrder;
use anyhow::{format_err, Result};

/// Converts a case to consecutive internal bus numbering.
///
/// Unlike a full external-to-internal conversion, no element is removed:
/// isolated buses and out-of-service gens and branches stay in place
/// so that the solution covers the whole snapshot.
pub fn ext_to_int(mpc: &MPC) -> Result<(MPC, BusOrder)> {
    let nb = mpc.bus.len();
    let mut order = BusOrder::new(nb);

    for (i, b) in mpc.bus.iter().enumerate() {
        if order.e2i.insert(b.bus_i, i).is_some() {
            return Err(format_err!("duplicate bus number {}", b.bus_i));
        }
        order.i2e.push(b.bus_i);
    }

    let e2i = |kind: &str, k: usize, bus: usize| -> Result<usize> {
        order
            .e2i
            .get(&bus)
            .copied()
            .ok_or_else(|| format_err!("{} {} references unknown bus {}", kind, k, bus))
    };

    let mut mpc = mpc.clone();

    // apply consecutive bus numbering
    for (i, b) in mpc.bus.iter_mut().enumerate() {
        b.bus_i = i;
    }
    for (k, g) in mpc.gen.iter_mut().enumerate() {
        g.gen_bus = e2i("gen", k, g.gen_bus)?;
    }
    for (k, br) in mpc.branch.iter_mut().enumerate() {
        br.f_bus = e2i("branch", k, br.f_bus)?;
        br.t_bus = e2i("branch", k, br.t_bus)?;
    }
    for (k, ld) in mpc.load.iter_mut().enumerate() {
        ld.load_bus = e2i("load", k, ld.load_bus)?;
    }

    Ok((mpc, order))
}
