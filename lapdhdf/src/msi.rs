//! Reading MSI diagnostics into structured, per-shot form.
//!
//! Every diagnostic comes back as the same shape of result: the recorded
//! shot numbers, the trace signals keyed by name, and the scalar
//! per-shot metadata keyed by name. For the interferometer array the
//! metadata columns gain an instrument axis and the one signal gains an
//! instrument axis between shot and sample.

use std::collections::BTreeMap;
use std::path::PathBuf;

use lapdhdf_map::{
    DischargeSummary, GasPressureSummary, HeaterSummary, InterferometerSummary,
    MagneticFieldSummary, MsiKind, MsiMap,
};
use ndarray::{s, Array1, Array2, Array3, ArrayD};

use crate::constants::resolve_msi_name;
use crate::wrap::{File, FileError};

/// A per-shot metadata column. 1-dimensional except for grouped
/// diagnostics, where a trailing instrument axis is added.
#[derive(Debug, Clone)]
pub enum MetaColumn {
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
    I8(ArrayD<i8>),
}

/// Where an MSI result came from, plus the diagnostic-specific constants
/// that shape it.
#[derive(Debug, Clone)]
pub struct MsiInfo {
    pub source_file: PathBuf,
    pub device_name: String,
    pub device_path: String,
    pub kind: MsiKind,
    /// Number of instruments for grouped diagnostics such as the
    /// interferometer array. `None` for flat diagnostics.
    pub n_instruments: Option<usize>,
}

/// One MSI diagnostic, read in full.
#[derive(Debug, Clone)]
pub struct MsiData {
    pub shotnum: Vec<u32>,
    /// Trace signals. Shape `(nshot, nt)`, or `(nshot, instruments, nt)`
    /// for the interferometer array.
    pub signals: BTreeMap<&'static str, ArrayD<f32>>,
    pub meta: BTreeMap<&'static str, MetaColumn>,
    pub info: MsiInfo,
}

pub(crate) fn read_msi(file: &File, name: &str) -> Result<MsiData, FileError> {
    let group_name =
        resolve_msi_name(name).ok_or_else(|| FileError::UnknownMsiDiagnostic(name.to_string()))?;
    let mmap = file.file_map().msi_diagnostic(group_name)?;

    let (shotnum, signals, meta) = match mmap.kind() {
        MsiKind::Discharge => read_discharge(file, mmap)?,
        MsiKind::GasPressure => read_gas_pressure(file, mmap)?,
        MsiKind::Heater => read_heater(file, mmap)?,
        MsiKind::InterferometerArray => read_interferometer_array(file, mmap)?,
        MsiKind::MagneticField => read_magnetic_field(file, mmap)?,
    };

    Ok(MsiData {
        shotnum,
        signals,
        meta,
        info: MsiInfo {
            source_file: file.path().to_path_buf(),
            device_name: mmap.name().to_string(),
            device_path: mmap.path().to_string(),
            kind: mmap.kind(),
            n_instruments: (mmap.kind() == MsiKind::InterferometerArray)
                .then(|| mmap.summary_paths().len()),
        },
    })
}

type MsiColumns = (
    Vec<u32>,
    BTreeMap<&'static str, ArrayD<f32>>,
    BTreeMap<&'static str, MetaColumn>,
);

fn read_signals(file: &File, mmap: &MsiMap) -> Result<BTreeMap<&'static str, ArrayD<f32>>, FileError> {
    let mut signals = BTreeMap::new();
    for field in mmap.signals() {
        let trace: Array2<f32> = file.hdf().dataset(&field.paths[0])?.read_2d()?;
        signals.insert(field.name, trace.into_dyn());
    }
    Ok(signals)
}

fn col_f32(values: Vec<f32>) -> MetaColumn {
    MetaColumn::F32(Array1::from(values).into_dyn())
}

fn col_f64(values: Vec<f64>) -> MetaColumn {
    MetaColumn::F64(Array1::from(values).into_dyn())
}

fn col_i8(values: Vec<i8>) -> MetaColumn {
    MetaColumn::I8(Array1::from(values).into_dyn())
}

fn read_discharge(file: &File, mmap: &MsiMap) -> Result<MsiColumns, FileError> {
    let rows: Vec<DischargeSummary> = file.hdf().dataset(&mmap.summary_paths()[0])?.read_raw()?;
    let mut meta = BTreeMap::new();
    meta.insert("timestamp", col_f64(rows.iter().map(|r| r.Timestamp).collect()));
    meta.insert("data valid", col_i8(rows.iter().map(|r| r.Valid).collect()));
    meta.insert("pulse length", col_f32(rows.iter().map(|r| r.PulseLength).collect()));
    meta.insert("peak current", col_f32(rows.iter().map(|r| r.PeakCurrent).collect()));
    meta.insert("bank voltage", col_f32(rows.iter().map(|r| r.BankVoltage).collect()));
    let shotnum = rows.iter().map(|r| r.Shot).collect();
    Ok((shotnum, read_signals(file, mmap)?, meta))
}

fn read_gas_pressure(file: &File, mmap: &MsiMap) -> Result<MsiColumns, FileError> {
    let rows: Vec<GasPressureSummary> = file.hdf().dataset(&mmap.summary_paths()[0])?.read_raw()?;
    let mut meta = BTreeMap::new();
    meta.insert("timestamp", col_f64(rows.iter().map(|r| r.Timestamp).collect()));
    meta.insert("data valid", col_i8(rows.iter().map(|r| r.Valid).collect()));
    meta.insert("fill pressure", col_f32(rows.iter().map(|r| r.FillPressure).collect()));
    let shotnum = rows.iter().map(|r| r.Shot).collect();
    Ok((shotnum, read_signals(file, mmap)?, meta))
}

fn read_heater(file: &File, mmap: &MsiMap) -> Result<MsiColumns, FileError> {
    let rows: Vec<HeaterSummary> = file.hdf().dataset(&mmap.summary_paths()[0])?.read_raw()?;
    let mut meta = BTreeMap::new();
    meta.insert("timestamp", col_f64(rows.iter().map(|r| r.Timestamp).collect()));
    meta.insert("data valid", col_i8(rows.iter().map(|r| r.Valid).collect()));
    meta.insert("current", col_f32(rows.iter().map(|r| r.Current).collect()));
    meta.insert("voltage", col_f32(rows.iter().map(|r| r.Voltage).collect()));
    meta.insert("temperature", col_f32(rows.iter().map(|r| r.Temperature).collect()));
    let shotnum = rows.iter().map(|r| r.Shot).collect();
    Ok((shotnum, BTreeMap::new(), meta))
}

fn read_magnetic_field(file: &File, mmap: &MsiMap) -> Result<MsiColumns, FileError> {
    let rows: Vec<MagneticFieldSummary> = file.hdf().dataset(&mmap.summary_paths()[0])?.read_raw()?;
    let mut meta = BTreeMap::new();
    meta.insert("timestamp", col_f64(rows.iter().map(|r| r.Timestamp).collect()));
    meta.insert("data valid", col_i8(rows.iter().map(|r| r.Valid).collect()));
    meta.insert("peak field", col_f32(rows.iter().map(|r| r.PeakField).collect()));
    let shotnum = rows.iter().map(|r| r.Shot).collect();
    Ok((shotnum, read_signals(file, mmap)?, meta))
}

/// The instruments were mapped with agreeing shapes; here their shot lists
/// have to agree row for row as well before they can share one axis.
fn read_interferometer_array(file: &File, mmap: &MsiMap) -> Result<MsiColumns, FileError> {
    let mut per_instrument: Vec<Vec<InterferometerSummary>> = Vec::new();
    for path in mmap.summary_paths() {
        per_instrument.push(file.hdf().dataset(path)?.read_raw()?);
    }
    let shotnum: Vec<u32> = per_instrument[0].iter().map(|r| r.Shot).collect();
    for rows in &per_instrument[1..] {
        let shots: Vec<u32> = rows.iter().map(|r| r.Shot).collect();
        if shots != shotnum {
            return Err(FileError::ShotnumMismatch {
                device: mmap.name().to_string(),
            });
        }
    }

    let nshot = shotnum.len();
    let k = per_instrument.len();
    let mut meta = BTreeMap::new();
    meta.insert(
        "timestamp",
        MetaColumn::F64(
            Array2::from_shape_fn((nshot, k), |(r, i)| per_instrument[i][r].Timestamp).into_dyn(),
        ),
    );
    meta.insert(
        "data valid",
        MetaColumn::I8(
            Array2::from_shape_fn((nshot, k), |(r, i)| per_instrument[i][r].Valid).into_dyn(),
        ),
    );
    meta.insert(
        "peak density",
        MetaColumn::F32(
            Array2::from_shape_fn((nshot, k), |(r, i)| per_instrument[i][r].PeakDensity).into_dyn(),
        ),
    );

    let field = &mmap.signals()[0];
    let nt = field.nt as usize;
    let mut stacked = Array3::<f32>::zeros((nshot, k, nt));
    for (i, path) in field.paths.iter().enumerate() {
        let trace: Array2<f32> = file.hdf().dataset(path)?.read_2d()?;
        stacked.slice_mut(s![.., i, ..]).assign(&trace);
    }
    let mut signals = BTreeMap::new();
    signals.insert(field.name, stacked.into_dyn());

    Ok((shotnum, signals, meta))
}

#[cfg(test)]
mod test {
    use super::*;
    use lapdhdf_map::faux::{FauxLapd, INTERFEROMETER_COUNT, INTERFEROMETER_NT};

    fn open_with_msi() -> (FauxLapd, File) {
        let faux = FauxLapd::builder().with_msi().build().unwrap();
        let file = File::open(faux.path()).unwrap();
        (faux, file)
    }

    #[test]
    fn read_discharge_by_alias() {
        let (faux, file) = open_with_msi();
        let data = file.read_msi("discharge").unwrap();

        assert_eq!(data.shotnum.len(), faux.nshot());
        assert_eq!(data.info.device_name, "Discharge");
        assert_eq!(data.info.device_path, "/MSI/Discharge");
        assert_eq!(data.info.kind, MsiKind::Discharge);
        assert_eq!(data.info.n_instruments, None);

        let voltage = &data.signals["voltage"];
        assert_eq!(voltage.shape(), [faux.nshot(), faux.nt()]);
        assert_eq!(voltage[[2, 0]], 3.0);
        assert_eq!(data.signals["current"][[2, 0]], 6.0);

        match &data.meta["peak current"] {
            MetaColumn::F32(col) => assert_eq!(col[[4]], 500.0),
            other => panic!("expected f32 column, got {other:?}"),
        }
        match &data.meta["bank voltage"] {
            MetaColumn::F32(col) => assert_eq!(col[[0]], 45.0),
            other => panic!("expected f32 column, got {other:?}"),
        }
    }

    #[test]
    fn read_heater_is_metadata_only() {
        let (faux, file) = open_with_msi();
        let data = file.read_msi("heater").unwrap();
        assert!(data.signals.is_empty());
        assert_eq!(data.shotnum.len(), faux.nshot());
        match &data.meta["temperature"] {
            MetaColumn::F32(col) => assert_eq!(col[[0]], 1500.0),
            other => panic!("expected f32 column, got {other:?}"),
        }
    }

    #[test]
    fn read_interferometer_array_stacks_instruments() {
        let (faux, file) = open_with_msi();
        let data = file.read_msi("interarr").unwrap();

        assert_eq!(data.info.kind, MsiKind::InterferometerArray);
        assert_eq!(data.info.n_instruments, Some(INTERFEROMETER_COUNT));

        let signal = &data.signals["signal"];
        assert_eq!(
            signal.shape(),
            [faux.nshot(), INTERFEROMETER_COUNT, INTERFEROMETER_NT]
        );
        // traces are constant per instrument
        assert_eq!(signal[[0, 0, 0]], 0.0);
        assert_eq!(signal[[0, 5, 0]], 5.0);

        match &data.meta["peak density"] {
            MetaColumn::F32(col) => {
                assert_eq!(col.shape(), [faux.nshot(), INTERFEROMETER_COUNT]);
                assert_eq!(col[[0, 2]], 3e13);
            }
            other => panic!("expected f32 column, got {other:?}"),
        }
    }

    #[test]
    fn unknown_diagnostic_name() {
        let (_faux, file) = open_with_msi();
        assert!(matches!(
            file.read_msi("langmuir"),
            Err(FileError::UnknownMsiDiagnostic(_))
        ));
    }

    #[test]
    fn alias_of_an_unmapped_diagnostic() {
        let faux = FauxLapd::builder().build().unwrap();
        let file = File::open(faux.path()).unwrap();
        // resolves as a name but nothing was recorded under /MSI
        assert!(file.read_msi("bfield").is_err());
    }
}
