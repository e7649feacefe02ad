use crate::error::SolnError;
use crate::mpc::{Bus, Load};
use crate::mpopt::SysWideZipLoads;
use crate::traits::LoadAggregator;
use crate::zip::make_sdzip;
use num_complex::Complex64;
use std::iter::zip;

/// Expands load records into a dense table with one row per bus.
///
/// Every bus starts with a fully connected row (`Load::connected`).
/// Explicit records then replace the row of their bus; if a bus has
/// more than one record the last one wins.
pub fn normalize_loads(nb: usize, load: &[Load]) -> Result<Vec<Load>, SolnError> {
    let mut rows: Vec<Load> = (0..nb).map(Load::connected).collect();
    for (i, ld) in load.iter().enumerate() {
        if ld.load_bus >= nb {
            return Err(SolnError::LoadBus {
                load: i,
                bus: ld.load_bus,
                nb,
            });
        }
        rows[ld.load_bus] = ld.clone();
    }
    Ok(rows)
}

/// Default load aggregator.
///
/// Evaluates the ZIP model of the nominal bus demand at the bus voltage
/// magnitude, scaled by the connected share of the load record. A record
/// with a demand override uses it in place of the nominal bus demand.
/// Isolated buses and disconnected loads contribute nothing.
#[derive(Debug, Clone, Default)]
pub struct ZipLoad {
    pub zip: SysWideZipLoads,
}

impl ZipLoad {
    pub fn new(zip: SysWideZipLoads) -> Self {
        Self { zip }
    }
}

impl LoadAggregator for ZipLoad {
    fn total_load(&self, bus: &[Bus], load: &[Load]) -> (Vec<f64>, Vec<f64>) {
        let sd_zip = make_sdzip(1.0, bus, &self.zip);

        let s_d: Vec<Complex64> = zip(bus, load)
            .enumerate()
            .map(|(k, (b, ld))| {
                if b.is_isolated() || !ld.is_on() {
                    return Complex64::default();
                }
                let sd = ld.sd.unwrap_or_else(|| sd_zip.at(k, b.vm));
                sd * ld.scaling
            })
            .collect();

        let p_d = s_d.iter().map(|s| s.re).collect(); // real power
        let q_d = s_d.iter().map(|s| s.im).collect(); // reactive power
        (p_d, q_d)
    }
}
