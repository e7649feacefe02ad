use crate::idx;
use crate::mpc::{Branch, Bus, BusType, Gen, Load, MPC};

use anyhow::{format_err, Context, Result};
use num_complex::Complex64;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Table element. JSON has no infinite values, so those are stored as
/// strings (`"inf"`, `"-Inf"`, ...).
#[derive(Clone, Copy)]
struct Cell(f64);

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_finite() {
            serializer.serialize_f64(self.0)
        } else {
            serializer.serialize_str(&self.0.to_string())
        }
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(f64),
            Str(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Num(f) => Ok(Cell(f)),
            Raw::Str(s) => s
                .trim()
                .parse()
                .map(Cell)
                .map_err(|_| D::Error::custom(format!("invalid number {:?}", s))),
        }
    }
}

type Table = Vec<Vec<Cell>>;

fn from_table(table: Table) -> Vec<Vec<f64>> {
    table
        .into_iter()
        .map(|row| row.into_iter().map(|c| c.0).collect())
        .collect()
}

fn to_table(rows: impl Iterator<Item = Vec<f64>>) -> Table {
    rows.map(|row| row.into_iter().map(Cell).collect()).collect()
}

/// MATPOWER-style case with row tables, as stored in JSON.
#[derive(Serialize, Deserialize)]
struct MPCase {
    #[serde(rename = "baseMVA")]
    base_mva: f64,
    bus: Table,
    gen: Table,
    branch: Table,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    load: Table,
    /// Solved bus voltages.
    #[serde(rename = "V", default, skip_serializing_if = "Option::is_none")]
    v: Option<Vec<[f64; 2]>>,
}

/// Case data together with an optional solved voltage vector, stored as
/// pairs of either rectangular or polar (degrees) coordinates.
pub struct CaseData {
    pub mpc: MPC,
    pub v: Option<Vec<[f64; 2]>>,
}

impl CaseData {
    /// Complex bus voltages. If the case has no voltage vector the bus
    /// `vm` and `va` fields are used.
    pub fn voltages(&self, polar: bool) -> Vec<Complex64> {
        match &self.v {
            Some(v) if polar => v
                .iter()
                .map(|&[vm, va]| Complex64::from_polar(vm, va.to_radians()))
                .collect(),
            Some(v) => v.iter().map(|&[re, im]| Complex64::new(re, im)).collect(),
            None => self
                .mpc
                .bus
                .iter()
                .map(|b| Complex64::from_polar(b.vm, b.va.to_radians()))
                .collect(),
        }
    }
}

pub fn load_case(case_path: &Path) -> Result<CaseData> {
    let file = File::open(case_path)
        .with_context(|| format!("unable to open case {}", case_path.display()))?;
    read_case(BufReader::new(file))
        .with_context(|| format!("unable to read case {}", case_path.display()))
}

pub fn read_case<R: Read>(reader: R) -> Result<CaseData> {
    let case: MPCase = serde_json::from_reader(reader)?;

    let (bus, gen) = (from_table(case.bus), from_table(case.gen));
    let (branch, load) = (from_table(case.branch), from_table(case.load));

    let mpc = MPC {
        base_mva: case.base_mva,
        bus: rows(&bus, "bus", idx::BUS_MIN_COLS, bus_from_row)?,
        gen: rows(&gen, "gen", idx::GEN_MIN_COLS, gen_from_row)?,
        branch: rows(&branch, "branch", idx::BRANCH_MIN_COLS, |r| {
            Ok(branch_from_row(r))
        })?,
        load: rows(&load, "load", idx::LOAD_MIN_COLS, load_from_row)?,
    };
    Ok(CaseData { mpc, v: case.v })
}

pub fn save_case(case_path: &Path, mpc: &MPC, v: Option<&[Complex64]>) -> Result<()> {
    let file = File::create(case_path)
        .with_context(|| format!("unable to create {}", case_path.display()))?;
    write_case(BufWriter::new(file), mpc, v)
}

/// Writes the case as JSON. Voltages are written in rectangular form.
pub fn write_case<W: Write>(mut writer: W, mpc: &MPC, v: Option<&[Complex64]>) -> Result<()> {
    let case = MPCase {
        base_mva: mpc.base_mva,
        bus: to_table(mpc.bus.iter().map(bus_to_row)),
        gen: to_table(mpc.gen.iter().map(gen_to_row)),
        branch: to_table(mpc.branch.iter().map(branch_to_row)),
        load: to_table(mpc.load.iter().map(load_to_row)),
        v: v.map(|v| v.iter().map(|v| [v.re, v.im]).collect()),
    };
    serde_json::to_writer_pretty(&mut writer, &case)?;
    writeln!(writer)?;
    Ok(())
}

fn rows<T>(
    table: &[Vec<f64>],
    name: &str,
    min_cols: usize,
    from_row: impl Fn(&[f64]) -> Result<T>,
) -> Result<Vec<T>> {
    table
        .iter()
        .enumerate()
        .map(|(i, row)| {
            if row.len() < min_cols {
                return Err(format_err!(
                    "{} row {} has {} columns, expected at least {}",
                    name,
                    i,
                    row.len(),
                    min_cols
                ));
            }
            from_row(row).with_context(|| format!("invalid {} row {}", name, i))
        })
        .collect()
}

fn bus_type(code: f64) -> Result<BusType> {
    match code as usize {
        idx::PQ => Ok(BusType::PQ),
        idx::PV => Ok(BusType::PV),
        idx::REF => Ok(BusType::REF),
        idx::NONE => Ok(BusType::NONE),
        _ => Err(format_err!("unknown bus type {}", code)),
    }
}

fn bus_type_code(bus_type: BusType) -> usize {
    match bus_type {
        BusType::PQ => idx::PQ,
        BusType::PV => idx::PV,
        BusType::REF => idx::REF,
        BusType::NONE => idx::NONE,
    }
}

pub fn bus_from_row(a: &[f64]) -> Result<Bus> {
    Ok(Bus {
        bus_i: a[idx::BUS_I] as usize,
        bus_type: bus_type(a[idx::BUS_TYPE])?,
        pd: a[idx::PD],
        qd: a[idx::QD],
        gs: a[idx::GS],
        bs: a[idx::BS],
        bus_area: a[idx::BUS_AREA] as usize,
        vm: a[idx::VM],
        va: a[idx::VA],
        base_kv: a[idx::BASE_KV],
        zone: a[idx::ZONE] as usize,
        vmax: a[idx::VMAX],
        vmin: a[idx::VMIN],
        trailing: a[idx::BUS_MIN_COLS..].to_vec(),
    })
}

pub fn bus_to_row(b: &Bus) -> Vec<f64> {
    let mut row = vec![
        b.bus_i as f64,
        bus_type_code(b.bus_type) as f64,
        b.pd,
        b.qd,
        b.gs,
        b.bs,
        b.bus_area as f64,
        b.vm,
        b.va,
        b.base_kv,
        b.zone as f64,
        b.vmax,
        b.vmin,
    ];
    row.extend_from_slice(&b.trailing);
    row
}

pub fn gen_from_row(a: &[f64]) -> Result<Gen> {
    Ok(Gen {
        gen_bus: a[idx::GEN_BUS] as usize,
        pg: a[idx::PG],
        qg: a[idx::QG],
        qmax: a[idx::QMAX],
        qmin: a[idx::QMIN],
        vg: a[idx::VG],
        mbase: a[idx::MBASE],
        gen_status: a[idx::GEN_STATUS] > 0.0,
        pmax: a[idx::PMAX],
        pmin: a[idx::PMIN],
        trailing: a[idx::GEN_MIN_COLS..].to_vec(),
    })
}

pub fn gen_to_row(g: &Gen) -> Vec<f64> {
    let mut row = vec![
        g.gen_bus as f64,
        g.pg,
        g.qg,
        g.qmax,
        g.qmin,
        g.vg,
        g.mbase,
        if g.gen_status { 1.0 } else { 0.0 },
        g.pmax,
        g.pmin,
    ];
    row.extend_from_slice(&g.trailing);
    row
}

/// Reads a branch row. Each flow field is set if the row has its column;
/// any columns after the flow fields are kept as trailing values.
pub fn branch_from_row(a: &[f64]) -> Branch {
    let flow = |k: usize| a.get(k).copied();
    Branch {
        f_bus: a[idx::F_BUS] as usize,
        t_bus: a[idx::T_BUS] as usize,
        br_r: a[idx::BR_R],
        br_x: a[idx::BR_X],
        br_b: a[idx::BR_B],
        rate_a: a[idx::RATE_A],
        rate_b: a[idx::RATE_B],
        rate_c: a[idx::RATE_C],
        tap: a[idx::TAP],
        shift: a[idx::SHIFT],
        br_status: a[idx::BR_STATUS] != 0.0,
        angmin: a[idx::ANGMIN],
        angmax: a[idx::ANGMAX],
        pf: flow(idx::PF),
        qf: flow(idx::QF),
        pt: flow(idx::PT),
        qt: flow(idx::QT),
        trailing: a.get(idx::BRANCH_FLOW_COLS..).unwrap_or(&[]).to_vec(),
    }
}

/// Writes a branch row. If the record has any flow field all four flow
/// columns are written (missing ones as zero), followed by the trailing
/// values, so a row is never narrower than the one it was read from.
pub fn branch_to_row(br: &Branch) -> Vec<f64> {
    let mut row = vec![
        br.f_bus as f64,
        br.t_bus as f64,
        br.br_r,
        br.br_x,
        br.br_b,
        br.rate_a,
        br.rate_b,
        br.rate_c,
        br.tap,
        br.shift,
        if br.br_status { 1.0 } else { 0.0 },
        br.angmin,
        br.angmax,
    ];
    let flows = [br.pf, br.qf, br.pt, br.qt];
    if flows.iter().any(Option::is_some) || !br.trailing.is_empty() {
        row.extend(flows.iter().map(|f| f.unwrap_or(0.0)));
        row.extend_from_slice(&br.trailing);
    }
    row
}

/// Reads a load row. The demand override is set if the row has both the
/// `Pd` and `Qd` columns, so a zero override can be expressed.
pub fn load_from_row(a: &[f64]) -> Result<Load> {
    let sd = match a.len() {
        n if n > idx::LOAD_QD => Some(Complex64::new(a[idx::LOAD_PD], a[idx::LOAD_QD])),
        n if n > idx::LOAD_PD => {
            return Err(format_err!("load row has Pd but no Qd column"));
        }
        _ => None,
    };
    Ok(Load {
        load_bus: a[idx::LOAD_BUS] as usize,
        status: a[idx::LOAD_STATUS] != 0.0,
        scaling: a[idx::LOAD_SCALING],
        sd,
    })
}

/// Writes a load row, with the `Pd` and `Qd` columns only if the record
/// has a demand override.
pub fn load_to_row(ld: &Load) -> Vec<f64> {
    let mut row = vec![
        ld.load_bus as f64,
        if ld.status { 1.0 } else { 0.0 },
        ld.scaling,
    ];
    if let Some(sd) = ld.sd {
        row.extend([sd.re, sd.im]);
    }
    row
}
