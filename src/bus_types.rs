use crate::error::SolnError;
use crate::mpc::{Bus, Gen};

/// Builds index lists for each type of bus (REF, PV, PQ).
///
/// Generators with "out-of-service" status are treated as PQ buses with
/// zero generation (regardless of Pg/Qg values in gen). A REF bus without
/// an in-service generator has no machine to take up the slack and is
/// an error. Isolated buses appear in none of the lists. Expects `bus`
/// and `gen` to use internal consecutive bus numbering.
pub fn bus_types(
    bus: &[Bus],
    gen: &[Gen],
) -> Result<(Vec<usize>, Vec<usize>, Vec<usize>), SolnError> {
    // Buses with generators that are ON.
    let mut bus_gen_status = vec![false; bus.len()];
    gen.iter()
        .filter(|g| g.is_on() && g.gen_bus < bus.len())
        .for_each(|g| bus_gen_status[g.gen_bus] = true);

    let mut refbus = Vec::new();
    let mut pv = Vec::new();
    let mut pq = Vec::new();
    for (i, b) in bus.iter().enumerate() {
        if b.is_isolated() {
            continue;
        }
        if b.is_ref() {
            if !bus_gen_status[i] {
                return Err(SolnError::NoRefGen(i));
            }
            refbus.push(i);
        } else if b.is_pv() && bus_gen_status[i] {
            pv.push(i);
        } else {
            pq.push(i);
        }
    }

    Ok((refbus, pv, pq))
}
