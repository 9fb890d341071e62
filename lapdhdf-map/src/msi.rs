//! Mapping of machine-state (MSI) diagnostics.
//!
//! Each diagnostic group under `/MSI` pairs a compound *summary* dataset
//! (one row per shot) with zero or more 2-dimensional *signal* datasets
//! (one trace row per shot). The interferometer array is the odd one out:
//! it splits into `Interferometer [i]` subgroups, one per instrument, which
//! must agree with each other on shot and sample counts.

use hdf5::{Dataset, Group, H5Type};
use tracing::warn;

use crate::error::MapError;

/// The MSI diagnostics this crate knows how to map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MsiKind {
    Discharge,
    GasPressure,
    Heater,
    InterferometerArray,
    MagneticField,
}

impl MsiKind {
    /// The group name the control system writes the diagnostic under.
    pub fn group_name(&self) -> &'static str {
        match self {
            Self::Discharge => "Discharge",
            Self::GasPressure => "Gas pressure",
            Self::Heater => "Heater",
            Self::InterferometerArray => "Interferometer array",
            Self::MagneticField => "Magnetic field",
        }
    }

    pub fn from_group_name(name: &str) -> Option<Self> {
        match name {
            "Discharge" => Some(Self::Discharge),
            "Gas pressure" => Some(Self::GasPressure),
            "Heater" => Some(Self::Heater),
            "Interferometer array" => Some(Self::InterferometerArray),
            "Magnetic field" => Some(Self::MagneticField),
            _ => None,
        }
    }

    pub const ALL: [MsiKind; 5] = [
        Self::Discharge,
        Self::GasPressure,
        Self::Heater,
        Self::InterferometerArray,
        Self::MagneticField,
    ];
}

/// One row of `"Discharge summary"`.
#[derive(H5Type, Debug, Clone, Copy, PartialEq)]
#[repr(C)]
#[allow(non_snake_case)]
pub struct DischargeSummary {
    pub Shot: u32,
    pub Timestamp: f64,
    pub Valid: i8,
    pub PulseLength: f32,
    pub PeakCurrent: f32,
    pub BankVoltage: f32,
}

/// One row of `"Gas pressure summary"`.
#[derive(H5Type, Debug, Clone, Copy, PartialEq)]
#[repr(C)]
#[allow(non_snake_case)]
pub struct GasPressureSummary {
    pub Shot: u32,
    pub Timestamp: f64,
    pub Valid: i8,
    pub FillPressure: f32,
}

/// One row of `"Heater summary"`.
#[derive(H5Type, Debug, Clone, Copy, PartialEq)]
#[repr(C)]
#[allow(non_snake_case)]
pub struct HeaterSummary {
    pub Shot: u32,
    pub Timestamp: f64,
    pub Valid: i8,
    pub Current: f32,
    pub Voltage: f32,
    pub Temperature: f32,
}

/// One row of an `"Interferometer summary list"`.
#[derive(H5Type, Debug, Clone, Copy, PartialEq)]
#[repr(C)]
#[allow(non_snake_case)]
pub struct InterferometerSummary {
    pub Shot: u32,
    pub Timestamp: f64,
    pub Valid: i8,
    pub PeakDensity: f32,
}

/// One row of `"Magnetic field summary"`.
#[derive(H5Type, Debug, Clone, Copy, PartialEq)]
#[repr(C)]
#[allow(non_snake_case)]
pub struct MagneticFieldSummary {
    pub Shot: u32,
    pub Timestamp: f64,
    pub Valid: i8,
    pub PeakField: f32,
}

/// One signal recorded by a diagnostic. For the interferometer array the
/// field has one dataset path per instrument; every other diagnostic has
/// exactly one.
#[derive(Debug, Clone, PartialEq)]
pub struct MsiSignalField {
    pub name: &'static str,
    pub paths: Vec<String>,
    /// Samples per trace row.
    pub nt: i64,
}

/// Mapping of one diagnostic group under `/MSI`.
#[derive(Debug, Clone)]
pub struct MsiMap {
    name: String,
    path: String,
    kind: MsiKind,
    n_shots: usize,
    summary_paths: Vec<String>,
    signals: Vec<MsiSignalField>,
}

impl MsiMap {
    /// Build the mapping from a diagnostic's group, inferring the diagnostic
    /// from the group name.
    pub fn new(group: &Group) -> Result<Self, MapError> {
        let path = group.name();
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        let kind = MsiKind::from_group_name(&name)
            .ok_or_else(|| MapError::mapping(path.as_str(), "not a recognized MSI diagnostic"))?;

        match kind {
            MsiKind::Discharge => Self::flat(
                group, name, path, kind,
                "Discharge summary",
                &[("voltage", "Cathode-anode voltage"), ("current", "Discharge current")],
            ),
            MsiKind::GasPressure => Self::flat(
                group, name, path, kind,
                "Gas pressure summary",
                &[("partial pressures", "RGA partial pressures")],
            ),
            MsiKind::Heater => Self::flat(group, name, path, kind, "Heater summary", &[]),
            MsiKind::MagneticField => Self::flat(
                group, name, path, kind,
                "Magnetic field summary",
                &[("magnetic field", "Magnetic field profile")],
            ),
            MsiKind::InterferometerArray => Self::interferometer_array(group, name, path),
        }
    }

    /// Map a diagnostic whose datasets sit directly in its group.
    fn flat(
        group: &Group,
        name: String,
        path: String,
        kind: MsiKind,
        summary_name: &str,
        signal_names: &[(&'static str, &str)],
    ) -> Result<Self, MapError> {
        let summary = require_dataset(group, summary_name)?;
        let n_shots = summary.shape().first().copied().unwrap_or(0);

        let mut signals = Vec::with_capacity(signal_names.len());
        for &(field, dset_name) in signal_names {
            let dset = require_dataset(group, dset_name)?;
            let shape = dset.shape();
            if shape.len() != 2 {
                return Err(MapError::mapping(
                    dset.name(),
                    "signal dataset is not 2-dimensional",
                ));
            }
            if shape[0] != n_shots {
                return Err(MapError::mapping(
                    dset.name(),
                    "signal dataset disagrees with the summary on shot count",
                ));
            }
            signals.push(MsiSignalField {
                name: field,
                paths: vec![dset.name()],
                nt: shape[1] as i64,
            });
        }

        Ok(Self {
            name,
            path,
            kind,
            n_shots,
            summary_paths: vec![summary.name()],
            signals,
        })
    }

    fn interferometer_array(group: &Group, name: String, path: String) -> Result<Self, MapError> {
        let mut summary_paths = Vec::new();
        let mut trace_paths = Vec::new();
        let mut n_shots: Option<usize> = None;
        let mut nt: Option<usize> = None;

        for sub in group.member_names()? {
            let Ok(igroup) = group.group(&sub) else {
                continue;
            };
            if !sub.starts_with("Interferometer") {
                warn!(group = %path, member = %sub, "unexpected subgroup in interferometer array, skipping");
                continue;
            }
            let summary = require_dataset(&igroup, "Interferometer summary list")?;
            let trace = require_dataset(&igroup, "Interferometer trace")?;
            let tshape = trace.shape();
            if tshape.len() != 2 {
                return Err(MapError::mapping(
                    trace.name(),
                    "trace dataset is not 2-dimensional",
                ));
            }
            let rows = summary.shape().first().copied().unwrap_or(0);
            if tshape[0] != rows {
                return Err(MapError::mapping(
                    trace.name(),
                    "trace dataset disagrees with the summary list on shot count",
                ));
            }
            // every instrument has to agree with the others
            match n_shots {
                None => n_shots = Some(rows),
                Some(expected) if expected != rows => {
                    return Err(MapError::mapping(
                        &path,
                        "interferometers disagree on shot count",
                    ))
                }
                Some(_) => {}
            }
            match nt {
                None => nt = Some(tshape[1]),
                Some(expected) if expected != tshape[1] => {
                    return Err(MapError::mapping(
                        &path,
                        "interferometers disagree on sample count",
                    ))
                }
                Some(_) => {}
            }
            summary_paths.push(summary.name());
            trace_paths.push(trace.name());
        }

        if summary_paths.is_empty() {
            return Err(MapError::mapping(path.as_str(), "no interferometer subgroups found"));
        }

        Ok(Self {
            name,
            path,
            kind: MsiKind::InterferometerArray,
            n_shots: n_shots.unwrap_or(0),
            summary_paths,
            signals: vec![MsiSignalField {
                name: "signal",
                paths: trace_paths,
                nt: nt.unwrap_or(0) as i64,
            }],
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> MsiKind {
        self.kind
    }

    /// Rows in the summary dataset(s), one per shot.
    pub fn n_shots(&self) -> usize {
        self.n_shots
    }

    /// Full paths of the summary datasets. One entry except for the
    /// interferometer array, which has one per instrument.
    pub fn summary_paths(&self) -> &[String] {
        &self.summary_paths
    }

    pub fn signals(&self) -> &[MsiSignalField] {
        &self.signals
    }
}

fn require_dataset(group: &Group, name: &str) -> Result<Dataset, MapError> {
    group.dataset(name).map_err(|_| {
        MapError::mapping(
            group.name(),
            format!("expected dataset '{name}' is missing"),
        )
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::faux::FauxLapd;

    fn msi_group(faux: &FauxLapd, name: &str) -> Group {
        faux.file()
            .and_then(|f| f.group("MSI"))
            .and_then(|g| g.group(name))
            .unwrap()
    }

    #[test]
    fn map_discharge() {
        let faux = FauxLapd::builder().with_msi().build().unwrap();
        let map = MsiMap::new(&msi_group(&faux, "Discharge")).unwrap();
        assert_eq!(map.kind(), MsiKind::Discharge);
        assert_eq!(map.n_shots(), faux.nshot());
        assert_eq!(map.summary_paths(), ["/MSI/Discharge/Discharge summary"]);
        let names: Vec<_> = map.signals().iter().map(|s| s.name).collect();
        assert_eq!(names, ["voltage", "current"]);
    }

    #[test]
    fn map_heater_has_no_signals() {
        let faux = FauxLapd::builder().with_msi().build().unwrap();
        let map = MsiMap::new(&msi_group(&faux, "Heater")).unwrap();
        assert_eq!(map.kind(), MsiKind::Heater);
        assert!(map.signals().is_empty());
    }

    #[test]
    fn map_interferometer_array() {
        let faux = FauxLapd::builder().with_msi().build().unwrap();
        let map = MsiMap::new(&msi_group(&faux, "Interferometer array")).unwrap();
        assert_eq!(map.kind(), MsiKind::InterferometerArray);
        assert_eq!(map.summary_paths().len(), 7);
        assert_eq!(map.signals().len(), 1);
        assert_eq!(map.signals()[0].paths.len(), 7);
        assert_eq!(map.signals()[0].nt, 100);
    }

    #[test]
    fn interferometer_shape_disagreement_is_an_error() {
        let faux = FauxLapd::builder().with_msi().build().unwrap();
        let group = msi_group(&faux, "Interferometer array");
        let igroup = group.group("Interferometer [3]").unwrap();
        igroup.unlink("Interferometer trace").unwrap();
        igroup
            .new_dataset::<f32>()
            .shape((faux.nshot(), 55))
            .create("Interferometer trace")
            .unwrap();
        assert!(matches!(
            MsiMap::new(&group),
            Err(MapError::Mapping { .. })
        ));
    }

    #[test]
    fn unrecognized_group_is_an_error() {
        let faux = FauxLapd::builder().with_msi().build().unwrap();
        let group = faux.file().unwrap().group("MSI").unwrap();
        let odd = group.create_group("Fancy probe").unwrap();
        assert!(matches!(MsiMap::new(&odd), Err(MapError::Mapping { .. })));
    }
}
