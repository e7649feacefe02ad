use derive_builder::Builder;

/// System wide ZIP load model weights.
///
/// Each array holds the constant power, constant current and constant
/// impedance shares of the nominal demand as `[p, i, z]`. `None` means
/// constant power (`[1, 0, 0]`). `qw` defaults to `pw`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SysWideZipLoads {
    pub pw: Option<[f64; 3]>,
    pub qw: Option<[f64; 3]>,
}

/// Options for finishing a power flow solution.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(default)]
pub struct MPOpt {
    /// Guard added to the denominator of the proportional Qg split.
    pub eps: f64,

    /// A bus whose total Qg range is below this is treated as having
    /// zero range and gets the equal-violation split.
    pub zero_range_tol: f64,

    pub sys_wide_zip_loads: SysWideZipLoads,
}

impl Default for MPOpt {
    fn default() -> Self {
        Self {
            eps: f64::EPSILON,
            zero_range_tol: 10.0 * f64::EPSILON,
            sys_wide_zip_loads: SysWideZipLoads::default(),
        }
    }
}
