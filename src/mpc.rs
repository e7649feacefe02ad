use num_complex::Complex64;

/// MPC is a MATPOWER-style case that models a power system as a directed
/// graph structure, together with its load records.
#[derive(Clone, Default)]
pub struct MPC {
    /// System MVA base used for converting power into per-unit quantities.
    /// Default value is 100.
    pub base_mva: f64,

    /// Power system nodes, including static loads and shunts.
    pub bus: Vec<Bus>,

    /// Generators and dispatchable loads.
    pub gen: Vec<Gen>,

    /// Transmission lines/cables and transformers.
    pub branch: Vec<Branch>,

    /// Explicit load records. Buses without a record are treated as
    /// fully connected with their nominal demand.
    pub load: Vec<Load>,
}

#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub enum BusType {
    /// Fixed active and reactive power.
    #[default]
    PQ,
    /// Fixed voltage magnitude and active power.
    PV,
    /// Reference voltage angle. Slack active and reactive power.
    REF,
    /// Isolated bus.
    NONE,
}

/// Bus is a node in the power system graph structure.
/// Static loads and shunts are included in the Bus definition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bus {
    /// Bus number (internal, consecutive from zero).
    pub bus_i: usize,

    pub bus_type: BusType,

    /// Real power demand (MW).
    pub pd: f64,

    /// Reactive power demand (MVAr).
    pub qd: f64,

    /// Shunt conductance (MW at V = 1.0 p.u.).
    pub gs: f64,

    /// Shunt susceptance (MVAr at V = 1.0 p.u.).
    pub bs: f64,

    /// Area number, 1-100.
    pub bus_area: usize,

    /// Voltage magnitude (p.u.).
    pub vm: f64,

    /// Voltage angle (degrees).
    pub va: f64,

    /// Base voltage (kV).
    pub base_kv: f64,

    /// Loss zone (1-999).
    pub zone: usize,

    /// Maximum voltage magnitude (p.u.).
    pub vmax: f64,

    /// Minimum voltage magnitude (p.u.).
    pub vmin: f64,

    /// Columns following `vmin` (e.g. OPF results), carried through untouched.
    pub trailing: Vec<f64>,
}

impl Bus {
    pub fn is_ref(&self) -> bool {
        self.bus_type == BusType::REF
    }

    pub fn is_pv(&self) -> bool {
        self.bus_type == BusType::PV
    }

    pub fn is_pq(&self) -> bool {
        self.bus_type == BusType::PQ
    }

    pub fn is_isolated(&self) -> bool {
        self.bus_type == BusType::NONE
    }
}

/// Gen is a generator or dispatchable load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Gen {
    /// Bus number.
    pub gen_bus: usize,

    /// Real power output (MW).
    pub pg: f64,

    /// Reactive power output (MVAr).
    pub qg: f64,

    /// Maximum reactive power output (MVAr). May be infinite.
    pub qmax: f64,

    /// Minimum reactive power output (MVAr). May be infinite.
    pub qmin: f64,

    /// Voltage magnitude setpoint (p.u.).
    pub vg: f64,

    /// Total MVA base of this machine, defaults to base_mva.
    pub mbase: f64,

    /// Machine in service.
    pub gen_status: bool,

    /// Maximum real power output (MW).
    pub pmax: f64,

    /// Minimum real power output (MW).
    pub pmin: f64,

    /// Columns following `pmin` (capability curve, ramp rates, APF...),
    /// carried through untouched.
    pub trailing: Vec<f64>,
}

impl Gen {
    pub fn is_on(&self) -> bool {
        self.gen_status
    }

    pub fn is_off(&self) -> bool {
        !self.gen_status
    }
}

/// Branch represents either a transmission line/cable or a two winding
/// transformer.
///
/// The flow fields are `None` when the record was read from a row that
/// did not have room for them. Computing the solution always fills them in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Branch {
    /// From bus number.
    pub f_bus: usize,

    /// To bus number.
    pub t_bus: usize,

    /// Resistance (p.u.).
    pub br_r: f64,

    /// Reactance (p.u.).
    pub br_x: f64,

    /// Total line charging susceptance (p.u.).
    pub br_b: f64,

    /// MVA rating A (long term rating).
    pub rate_a: f64,

    /// MVA rating B (short term rating).
    pub rate_b: f64,

    /// MVA rating C (emergency rating).
    pub rate_c: f64,

    /// Transformer off nominal tap ratio.
    pub tap: f64,

    /// Transformer phase shift angle (degrees).
    pub shift: f64,

    /// Branch in service.
    pub br_status: bool,

    /// Minimum angle difference, angle(Vf) - angle(Vt) (degrees).
    pub angmin: f64,

    /// Maximum angle difference, angle(Vf) - angle(Vt) (degrees).
    pub angmax: f64,

    /// Real power injected at "from" bus end (MW).
    pub pf: Option<f64>,

    /// Reactive power injected at "from" bus end (MVAr).
    pub qf: Option<f64>,

    /// Real power injected at "to" bus end (MW).
    pub pt: Option<f64>,

    /// Reactive power injected at "to" bus end (MVAr).
    pub qt: Option<f64>,

    /// Columns following the flow fields (e.g. OPF multipliers),
    /// carried through untouched.
    pub trailing: Vec<f64>,
}

impl Branch {
    pub fn is_on(&self) -> bool {
        self.br_status
    }

    pub fn is_off(&self) -> bool {
        !self.br_status
    }

    /// True if the record holds all four flow fields.
    pub fn has_flows(&self) -> bool {
        self.pf.is_some() && self.qf.is_some() && self.pt.is_some() && self.qt.is_some()
    }
}

/// Load maps a share of the demand at a bus to a connection status.
#[derive(Debug, Clone, PartialEq)]
pub struct Load {
    /// Bus number.
    pub load_bus: usize,

    /// Load connected.
    pub status: bool,

    /// Connected share of the bus demand (p.u., 1.0 = fully connected).
    pub scaling: f64,

    /// Complex demand (MVA) replacing the nominal bus demand, if any.
    pub sd: Option<Complex64>,
}

impl Load {
    /// Default load row for a bus without an explicit record.
    pub fn connected(load_bus: usize) -> Self {
        Self {
            load_bus,
            status: true,
            scaling: 1.0,
            sd: None,
        }
    }

    pub fn is_on(&self) -> bool {
        self.status
    }
}
