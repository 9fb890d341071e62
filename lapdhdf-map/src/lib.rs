//! Device-mapping layer for HDF5 files generated by the Large Plasma Device
//! (LaPD) control system.
//!
//! A LaPD run file groups its contents by the hardware that produced them:
//! machine-state diagnostics under `/MSI`, and digitizers plus control
//! devices under `/Raw data + config`. This crate walks that tree and builds
//! typed maps of every device it recognizes, so the higher-level reader (the
//! `lapdhdf` crate) never has to guess at dataset names or layouts.
//!
//! The entry point is [`LapdMap::new`]. Individual device maps
//! ([`Sis3301Map`], [`ControlMap`], [`MsiMap`]) can also be built directly
//! from their groups.
pub(crate) mod attr;
pub(crate) mod control;
pub(crate) mod digitizer;
pub(crate) mod error;
pub(crate) mod map;
pub(crate) mod msi;

#[cfg(any(test, feature = "faux"))]
pub mod faux;

pub use crate::attr::{read_str_attr, write_str_attr};
pub use crate::control::{ConType, ControlConfig, ControlDetail, ControlMap, RunTimeListRow};
pub use crate::digitizer::{
    AdcConnection, AdcInfo, ClockRate, DatasetInfo, DatasetOptions, DigiConfig, FreqUnit,
    SignalHeader, Sis3301Map,
};
pub use crate::error::MapError;
pub use crate::map::LapdMap;
pub use crate::msi::{
    DischargeSummary, GasPressureSummary, HeaterSummary, InterferometerSummary,
    MagneticFieldSummary, MsiKind, MsiMap, MsiSignalField,
};
