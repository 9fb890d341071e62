//! Read HDF5 files generated by the Large Plasma Device (LaPD) at UCLA's
//! Basic Plasma Science Facility.
//!
//! The main access point is [`File`], via [`File::open`]. Opening a file
//! maps every recognized device in it; the handle then reads digitizer
//! signal ([`File::read_data`]), machine-state diagnostics
//! ([`File::read_msi`]), and control-device state ([`File::read_controls`])
//! by name, returning shot-indexed arrays with their scaling and provenance
//! attached.
//!
//! The device-mapping layer lives in [`lapdhdf_map`] and is re-exported
//! under [`map`].
pub(crate) mod constants;
pub(crate) mod control;
pub(crate) mod data;
pub(crate) mod msi;
pub(crate) mod overview;
pub(crate) mod wrap;

pub use crate::constants::resolve_msi_name;
pub use crate::control::{ControlData, ControlInfo};
pub use crate::data::{ReadOptions, Shotnum, SignalData, SignalInfo};
pub use crate::msi::{MetaColumn, MsiData, MsiInfo};
pub use crate::overview::Overview;
pub use crate::wrap::{open, File, FileError};

pub use lapdhdf_map as map;
pub use lapdhdf_map::{
    ClockRate, ConType, ControlMap, DatasetOptions, FreqUnit, LapdMap, MapError, MsiKind, MsiMap,
    Sis3301Map,
};
