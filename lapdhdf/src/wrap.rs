use std::path::{Path, PathBuf};

use lapdhdf_map::{read_str_attr, LapdMap, MapError};

use crate::control::{self, ControlData};
use crate::data::{self, ReadOptions, SignalData, Shotnum};
use crate::msi::{self, MsiData};
use crate::overview::Overview;

/// The ways opening or reading a LaPD file can fail.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    /// An error surfaced by the HDF5 library itself.
    #[error(transparent)]
    Hdf5(#[from] hdf5::Error),
    /// The device mapping rejected the file or a request against it.
    #[error(transparent)]
    Map(#[from] MapError),
    /// The file carries no attribute identifying it as LaPD-generated.
    #[error("'{0}' does not appear to be generated by the LaPD control system")]
    NotLapd(PathBuf),
    /// A read needed a digitizer but the file has none mapped.
    #[error("file has no mapped digitizers")]
    NoDigitizers,
    /// The requested shot numbers left nothing to read.
    #[error("no valid shot numbers requested")]
    EmptyShotnum,
    /// Requested shot numbers that the dataset never recorded.
    #[error("shot numbers not recorded: {0:?}")]
    MissingShots(Vec<u32>),
    /// The name matched no known MSI diagnostic, by name or alias.
    #[error("'{0}' is not a recognized MSI diagnostic")]
    UnknownMsiDiagnostic(String),
    /// Instruments of a grouped diagnostic recorded different shot lists.
    #[error("instruments of '{device}' disagree on recorded shot numbers")]
    ShotnumMismatch { device: String },
}

/// An open LaPD run file.
///
/// Opening maps the whole device tree once; every read afterwards resolves
/// names and shapes against that map instead of touching the file layout
/// again.
pub struct File {
    inner: hdf5::File,
    path: PathBuf,
    map: LapdMap,
    lapd_version: String,
}

impl File {
    /// Open `path` read-only, verify it was generated by the LaPD control
    /// system, and map its devices.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FileError> {
        let path = path.as_ref().to_path_buf();
        let inner = hdf5::File::open(&path)?;
        let lapd_version =
            Self::detect_lapd(&inner).ok_or_else(|| FileError::NotLapd(path.clone()))?;
        let map = LapdMap::new(&inner)?;
        Ok(Self {
            inner,
            path,
            map,
            lapd_version,
        })
    }

    /// Look for the control system's version attribute on the root group.
    /// The attribute name has drifted across control-system releases, so any
    /// root attribute mentioning both "lapd" and "version" counts.
    fn detect_lapd(file: &hdf5::File) -> Option<String> {
        for name in file.attr_names().ok()? {
            let lower = name.to_lowercase();
            if lower.contains("lapd") && lower.contains("version") {
                if let Ok(Some(version)) = read_str_attr(file, &name) {
                    return Some(version);
                }
            }
        }
        None
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Version string of the control system that wrote the file.
    pub fn lapd_version(&self) -> &str {
        &self.lapd_version
    }

    /// The device map built when the file was opened.
    pub fn file_map(&self) -> &LapdMap {
        &self.map
    }

    pub(crate) fn hdf(&self) -> &hdf5::File {
        &self.inner
    }

    /// Read digitized signal for one board/channel connection.
    pub fn read_data(
        &self,
        board: u32,
        channel: u32,
        opts: &ReadOptions<'_>,
    ) -> Result<SignalData, FileError> {
        data::read_data(self, board, channel, opts)
    }

    /// Read an MSI diagnostic by name or alias.
    pub fn read_msi(&self, name: &str) -> Result<MsiData, FileError> {
        msi::read_msi(self, name)
    }

    /// Read per-shot state recorded by a control device.
    pub fn read_controls(
        &self,
        name: &str,
        config_name: Option<&str>,
        shotnum: &Shotnum,
    ) -> Result<ControlData, FileError> {
        control::read_control(self, name, config_name, shotnum)
    }

    /// A printable report of everything mapped in the file.
    pub fn overview(&self) -> Overview<'_> {
        Overview::new(self)
    }
}

/// Convenience alias for [`File::open`].
pub fn open<P: AsRef<Path>>(path: P) -> Result<File, FileError> {
    File::open(path)
}
