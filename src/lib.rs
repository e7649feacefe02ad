mod branch_flow;
mod bus_types;
mod error;
mod ext_to_int;
mod int_to_ext;
mod loadcase;
mod mpc;
mod mpopt;
mod order;
mod pfsoln;
mod traits;
mod update_gen;
mod ybus;
mod zip;

pub mod debug;
pub mod idx;
pub mod total_load;

pub use branch_flow::widen_branch;
pub use bus_types::*;
pub use error::*;
pub use ext_to_int::*;
pub use int_to_ext::*;
pub use loadcase::*;
pub use mpc::*;
pub use mpopt::*;
pub use order::*;
pub use pfsoln::*;
pub use traits::*;
pub use update_gen::GenBusIncidence;
pub use ybus::*;
pub use zip::*;

#[cfg(test)]
mod tests;
