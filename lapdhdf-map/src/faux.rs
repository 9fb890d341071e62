//! Construction of small, fully deterministic LaPD-layout HDF5 files.
//!
//! Real run files are multi-gigabyte and not redistributable, so the test
//! suites build their own. [`FauxLapd`] writes a file into a temporary
//! directory with the same group layout, attribute names, and compound
//! dataset types the LaPD control system produces, with knobs for the
//! shapes a test wants to poke at.
//!
//! Recorded values are simple functions of their indices so readers can be
//! checked against closed-form expectations:
//!
//! * digitizer signals: every sample of `config [b:c]` is `b * 10 + c`
//! * header rows: `Shot` runs `1..=nshot`, `Scale` is 1.0, `Offset` is -2.5
//! * MSI traces: row `r` is filled with `r + 1` (doubled for the discharge
//!   current, instrument index for interferometer traces)
//! * waveform `CommandIndex` cycles through `shot - 1 mod 3`

use std::path::{Path, PathBuf};

use hdf5::types::FixedAscii;
use hdf5::{File, Group};
use ndarray::{arr1, Array2};
use tempfile::TempDir;

use crate::attr::write_str_attr;
use crate::control::RunTimeListRow;
use crate::digitizer::SignalHeader;
use crate::msi::{
    DischargeSummary, GasPressureSummary, HeaterSummary, InterferometerSummary,
    MagneticFieldSummary,
};

pub const LAPD_VERSION_ATTR: &str = "LaPD HDF5 software version";
pub const INTERFEROMETER_COUNT: usize = 7;
pub const INTERFEROMETER_NT: usize = 100;

/// A LaPD-layout HDF5 file living in its own temporary directory.
///
/// The directory (and the file with it) is removed on drop. No handle is
/// held open once construction finishes, so readers can open the path
/// without tripping over HDF5 file locking.
pub struct FauxLapd {
    _dir: TempDir,
    path: PathBuf,
    nshot: usize,
    nt: usize,
}

impl FauxLapd {
    pub fn builder() -> FauxBuilder {
        FauxBuilder::default()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reopen the file read-write, for tests that reach into the tree
    /// directly, including to vandalize it. Only one handle should be live
    /// at a time.
    pub fn file(&self) -> hdf5::Result<File> {
        File::open_rw(&self.path)
    }

    /// Shots recorded per dataset.
    pub fn nshot(&self) -> usize {
        self.nshot
    }

    /// Samples per digitizer trace.
    pub fn nt(&self) -> usize {
        self.nt
    }
}

/// Knobs for [`FauxLapd`] construction. The defaults produce a file with a
/// single digitizer configuration (`config01`, board 0 channel 0, active)
/// and nothing else under `/Raw data + config`, and no `/MSI` group content.
pub struct FauxBuilder {
    n_configs: usize,
    active: Vec<String>,
    connections: Vec<(u32, Vec<u32>)>,
    nshot: usize,
    nt: usize,
    shot_average: Option<u32>,
    sample_average: Option<u32>,
    version: String,
    msi: bool,
    waveform: bool,
    n5700ps: bool,
    data_run_sequence: bool,
    unknown_groups: Vec<String>,
}

impl Default for FauxBuilder {
    fn default() -> Self {
        Self {
            n_configs: 1,
            active: vec!["config01".to_string()],
            connections: vec![(0, vec![0])],
            nshot: 10,
            nt: 128,
            shot_average: None,
            sample_average: None,
            version: "1.2".to_string(),
            msi: false,
            waveform: false,
            n5700ps: false,
            data_run_sequence: false,
            unknown_groups: Vec::new(),
        }
    }
}

impl FauxBuilder {
    /// Number of `Configuration: config0X` groups to write.
    pub fn n_configs(mut self, n: usize) -> Self {
        self.n_configs = n;
        self
    }

    /// Which configurations get datasets recorded for them.
    pub fn active(mut self, names: &[&str]) -> Self {
        self.active = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Board/channel connections, applied to every configuration.
    pub fn connections(mut self, conns: &[(u32, &[u32])]) -> Self {
        self.connections = conns
            .iter()
            .map(|(board, channels)| (*board, channels.to_vec()))
            .collect();
        self
    }

    pub fn nshot(mut self, n: usize) -> Self {
        self.nshot = n;
        self
    }

    pub fn nt(mut self, n: usize) -> Self {
        self.nt = n;
        self
    }

    pub fn shot_average(mut self, n: u32) -> Self {
        self.shot_average = Some(n);
        self
    }

    pub fn sample_average(mut self, n: u32) -> Self {
        self.sample_average = Some(n);
        self
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    /// Populate `/MSI` with all five diagnostics.
    pub fn with_msi(mut self) -> Self {
        self.msi = true;
        self
    }

    pub fn with_waveform(mut self) -> Self {
        self.waveform = true;
        self
    }

    pub fn with_n5700ps(mut self) -> Self {
        self.n5700ps = true;
        self
    }

    pub fn with_data_run_sequence(mut self) -> Self {
        self.data_run_sequence = true;
        self
    }

    /// Add an empty, unrecognizable group under `/Raw data + config`.
    pub fn with_unknown_group(mut self, name: &str) -> Self {
        self.unknown_groups.push(name.to_string());
        self
    }

    pub fn build(self) -> hdf5::Result<FauxLapd> {
        let dir = TempDir::new().map_err(|e| hdf5::Error::from(e.to_string()))?;
        let path = dir.path().join("faux_lapd.hdf5");

        // scoped so the write handle is flushed and closed before the
        // path is handed out
        {
            let file = File::create(&path)?;

            write_str_attr(&file, LAPD_VERSION_ATTR, &self.version)?;

            if self.msi {
                self.write_msi(&file.create_group("MSI")?)?;
            }

            let data = file.create_group("Raw data + config")?;
            self.write_digitizer(&data.create_group("SIS 3301")?)?;
            if self.waveform {
                self.write_waveform(&data.create_group("Waveform")?)?;
            }
            if self.n5700ps {
                self.write_n5700ps(&data.create_group("N5700_PS")?)?;
            }
            if self.data_run_sequence {
                data.create_group("Data run sequence")?;
            }
            for name in &self.unknown_groups {
                data.create_group(name)?;
            }

            file.flush()?;
        }

        Ok(FauxLapd {
            _dir: dir,
            path,
            nshot: self.nshot,
            nt: self.nt,
        })
    }

    fn write_digitizer(&self, group: &Group) -> hdf5::Result<()> {
        for i in 0..self.n_configs {
            let name = format!("config{:02}", i + 1);
            let cgroup = group.create_group(&format!("Configuration: {name}"))?;

            let shots = i64::from(self.shot_average.unwrap_or(1));
            cgroup
                .new_attr::<i64>()
                .create("Shots to average")?
                .write_scalar(&shots)?;
            let samples = match self.sample_average {
                Some(n) => format!("Average {n} Samples"),
                None => "No averaging".to_string(),
            };
            write_str_attr(&cgroup, "Samples to average", &samples)?;

            for (k, (board, channels)) in self.connections.iter().enumerate() {
                let bgroup = cgroup.create_group(&format!("Boards[{k}]"))?;
                bgroup
                    .new_attr::<i64>()
                    .create("Board")?
                    .write_scalar(&i64::from(*board))?;
                for (j, channel) in channels.iter().enumerate() {
                    let chgroup = bgroup.create_group(&format!("Channels[{j}]"))?;
                    chgroup
                        .new_attr::<i64>()
                        .create("Channel")?
                        .write_scalar(&i64::from(*channel))?;
                }
            }

            if self.active.contains(&name) {
                for (board, channels) in &self.connections {
                    for channel in channels {
                        self.write_signal(group, &name, *board, *channel)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn write_signal(
        &self,
        group: &Group,
        config: &str,
        board: u32,
        channel: u32,
    ) -> hdf5::Result<()> {
        let dname = format!("{config} [{board}:{channel}]");
        let value = (board * 10 + channel) as i16;
        let signal = Array2::<i16>::from_elem((self.nshot, self.nt), value);
        group
            .new_dataset::<i16>()
            .shape((self.nshot, self.nt))
            .create(dname.as_str())?
            .write(signal.view())?;

        let headers: Vec<SignalHeader> = (1..=self.nshot as u32)
            .map(|shot| SignalHeader {
                Shot: shot,
                Scale: 1.0,
                Offset: -2.5,
            })
            .collect();
        group
            .new_dataset::<SignalHeader>()
            .shape((self.nshot,))
            .create(format!("{dname} headers").as_str())?
            .write(arr1(&headers).view())?;
        Ok(())
    }

    fn run_time_list(&self, config: &str) -> hdf5::Result<Vec<RunTimeListRow>> {
        let config = FixedAscii::<120>::from_ascii(config.as_bytes())
            .map_err(|e| hdf5::Error::from(e.to_string()))?;
        Ok((1..=self.nshot as u32)
            .map(|shot| RunTimeListRow {
                shot,
                configuration: config,
                command_index: (shot - 1) % 3,
            })
            .collect())
    }

    fn write_waveform(&self, group: &Group) -> hdf5::Result<()> {
        let rows = self.run_time_list("waveform_config01")?;
        group
            .new_dataset::<RunTimeListRow>()
            .shape((rows.len(),))
            .create("Run time list")?
            .write(arr1(&rows).view())?;

        let cgroup = group.create_group("waveform_config01")?;
        write_str_attr(&cgroup, "IP address", "192.168.1.100")?;
        write_str_attr(
            &cgroup,
            "Waveform command list",
            "FREQ 40000.0\nFREQ 80000.0\nFREQ 120000.0",
        )?;
        Ok(())
    }

    fn write_n5700ps(&self, group: &Group) -> hdf5::Result<()> {
        let rows = self.run_time_list("n5700_config01")?;
        group
            .new_dataset::<RunTimeListRow>()
            .shape((rows.len(),))
            .create("Run time list")?
            .write(arr1(&rows).view())?;

        let cgroup = group.create_group("n5700_config01")?;
        write_str_attr(&cgroup, "IP address", "192.168.1.70")?;
        write_str_attr(&cgroup, "Power supply device", "N5751A")?;
        write_str_attr(&cgroup, "Initial state", "*RST")?;
        Ok(())
    }

    fn write_msi(&self, msi: &Group) -> hdf5::Result<()> {
        let n = self.nshot;

        let discharge = msi.create_group("Discharge")?;
        let rows: Vec<DischargeSummary> = (1..=n as u32)
            .map(|shot| DischargeSummary {
                Shot: shot,
                Timestamp: f64::from(shot),
                Valid: 1,
                PulseLength: 10.0,
                PeakCurrent: (shot * 100) as f32,
                BankVoltage: 45.0,
            })
            .collect();
        discharge
            .new_dataset::<DischargeSummary>()
            .shape((n,))
            .create("Discharge summary")?
            .write(arr1(&rows).view())?;
        let voltage = Array2::<f32>::from_shape_fn((n, self.nt), |(r, _)| (r + 1) as f32);
        discharge
            .new_dataset::<f32>()
            .shape((n, self.nt))
            .create("Cathode-anode voltage")?
            .write(voltage.view())?;
        let current = Array2::<f32>::from_shape_fn((n, self.nt), |(r, _)| 2.0 * (r + 1) as f32);
        discharge
            .new_dataset::<f32>()
            .shape((n, self.nt))
            .create("Discharge current")?
            .write(current.view())?;

        let gas = msi.create_group("Gas pressure")?;
        let rows: Vec<GasPressureSummary> = (1..=n as u32)
            .map(|shot| GasPressureSummary {
                Shot: shot,
                Timestamp: f64::from(shot),
                Valid: 1,
                FillPressure: 3.2e-5,
            })
            .collect();
        gas.new_dataset::<GasPressureSummary>()
            .shape((n,))
            .create("Gas pressure summary")?
            .write(arr1(&rows).view())?;
        let partials = Array2::<f32>::from_shape_fn((n, 50), |(r, _)| (r + 1) as f32);
        gas.new_dataset::<f32>()
            .shape((n, 50))
            .create("RGA partial pressures")?
            .write(partials.view())?;

        let heater = msi.create_group("Heater")?;
        let rows: Vec<HeaterSummary> = (1..=n as u32)
            .map(|shot| HeaterSummary {
                Shot: shot,
                Timestamp: f64::from(shot),
                Valid: 1,
                Current: 60.0,
                Voltage: 12.0,
                Temperature: 1500.0,
            })
            .collect();
        heater
            .new_dataset::<HeaterSummary>()
            .shape((n,))
            .create("Heater summary")?
            .write(arr1(&rows).view())?;

        let array = msi.create_group("Interferometer array")?;
        for i in 0..INTERFEROMETER_COUNT {
            let igroup = array.create_group(&format!("Interferometer [{i}]"))?;
            let rows: Vec<InterferometerSummary> = (1..=n as u32)
                .map(|shot| InterferometerSummary {
                    Shot: shot,
                    Timestamp: f64::from(shot),
                    Valid: 1,
                    PeakDensity: 1e13 * (i + 1) as f32,
                })
                .collect();
            igroup
                .new_dataset::<InterferometerSummary>()
                .shape((n,))
                .create("Interferometer summary list")?
                .write(arr1(&rows).view())?;
            let trace = Array2::<f32>::from_elem((n, INTERFEROMETER_NT), i as f32);
            igroup
                .new_dataset::<f32>()
                .shape((n, INTERFEROMETER_NT))
                .create("Interferometer trace")?
                .write(trace.view())?;
        }

        let magnetic = msi.create_group("Magnetic field")?;
        let rows: Vec<MagneticFieldSummary> = (1..=n as u32)
            .map(|shot| MagneticFieldSummary {
                Shot: shot,
                Timestamp: f64::from(shot),
                Valid: 1,
                PeakField: 1.5e3,
            })
            .collect();
        magnetic
            .new_dataset::<MagneticFieldSummary>()
            .shape((n,))
            .create("Magnetic field summary")?
            .write(arr1(&rows).view())?;
        let profile = Array2::<f32>::from_shape_fn((n, 64), |(r, _)| (r + 1) as f32);
        magnetic
            .new_dataset::<f32>()
            .shape((n, 64))
            .create("Magnetic field profile")?
            .write(profile.view())?;

        Ok(())
    }
}
