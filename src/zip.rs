use crate::mpc::Bus;
use crate::mpopt::SysWideZipLoads;
use num_complex::Complex64;

/// Nominal complex bus demands of the ZIP load model, one element per bus,
/// split into constant impedance, constant current and constant power parts.
pub struct SdZip {
    pub z: Vec<Complex64>,
    pub i: Vec<Complex64>,
    pub p: Vec<Complex64>,
}

impl SdZip {
    /// Realized demand at bus `k` for voltage magnitude `vm`.
    pub fn at(&self, k: usize, vm: f64) -> Complex64 {
        self.p[k] + self.i[k] * vm + self.z[k] * (vm * vm)
    }
}

/// Builds vectors of nominal complex bus power demands for ZIP loads.
///
/// The three parts hold the nominal power (at 1 p.u. voltage magnitude)
/// divided by `base_mva`, so passing `1.0` yields MW/MVAr.
pub fn make_sdzip(base_mva: f64, bus: &[Bus], zip: &SysWideZipLoads) -> SdZip {
    let pw = zip.pw.unwrap_or([1.0, 0.0, 0.0]);
    let qw = zip.qw.unwrap_or(pw);

    let part = |k: usize| -> Vec<Complex64> {
        bus.iter()
            .map(|b| Complex64::new(b.pd * pw[k], b.qd * qw[k]) / base_mva)
            .collect()
    };

    SdZip {
        z: part(2),
        i: part(1),
        p: part(0),
    }
}
