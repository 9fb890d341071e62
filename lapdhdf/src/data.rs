//! Reading digitized signal out of a run file.

use std::collections::HashMap;
use std::ops::Range;
use std::path::PathBuf;

use lapdhdf_map::{ClockRate, DatasetOptions, SignalHeader};
use ndarray::{Array2, Axis};
use tracing::warn;

use crate::wrap::{File, FileError};

/// Which shots of a dataset to read.
///
/// Shot numbers are the 1-based values the control system stamped into the
/// header dataset, not row indices.
#[derive(Debug, Clone, Default)]
pub enum Shotnum {
    /// Every recorded shot.
    #[default]
    All,
    One(u32),
    List(Vec<u32>),
    Range(Range<u32>),
}

/// Selectors for [`File::read_data`].
#[derive(Debug, Default, Clone)]
pub struct ReadOptions<'a> {
    /// Digitizer to read from. Defaults to the file's main digitizer.
    pub digitizer: Option<&'a str>,
    /// Adc the connection should belong to.
    pub adc: Option<&'a str>,
    /// Digitizer configuration. Defaults to the sole active one.
    pub config_name: Option<&'a str>,
    pub shotnum: Shotnum,
}

/// Provenance and scaling for one read signal.
#[derive(Debug, Clone)]
pub struct SignalInfo {
    pub source_file: PathBuf,
    pub dataset_name: String,
    pub dataset_path: String,
    pub digitizer: String,
    pub adc: String,
    pub config_name: String,
    pub bit: u8,
    pub clock_rate: ClockRate,
    pub board: u32,
    pub channel: u32,
    /// Voltage of digitizer count zero, taken from the header dataset.
    pub voltage_offset: f64,
    pub shot_average: Option<u32>,
    pub sample_average: Option<u32>,
}

/// Digitized signal, one row per requested shot.
#[derive(Debug, Clone)]
pub struct SignalData {
    pub signal: Array2<i16>,
    pub shotnum: Vec<u32>,
    pub info: SignalInfo,
}

impl SignalData {
    /// Seconds between samples, accounting for hardware sample averaging.
    pub fn dt(&self) -> f64 {
        let averaged = f64::from(self.info.sample_average.unwrap_or(1));
        averaged / self.info.clock_rate.as_hz()
    }

    /// Volts per digitizer count.
    pub fn dv(&self) -> f64 {
        let steps = (1u64 << self.info.bit) - 1;
        2.0 * self.info.voltage_offset.abs() / steps as f64
    }

    /// The signal converted from digitizer counts to volts.
    pub fn as_volts(&self) -> Array2<f64> {
        let dv = self.dv();
        let offset = self.info.voltage_offset;
        self.signal.mapv(|count| offset + dv * f64::from(count))
    }

    /// Sample times in seconds, starting at zero.
    pub fn time_axis(&self) -> Vec<f64> {
        let dt = self.dt();
        (0..self.signal.ncols()).map(|i| i as f64 * dt).collect()
    }
}

/// Normalize a shot request: drop the invalid shot number 0, sort, and
/// de-duplicate. `None` means every recorded shot.
pub(crate) fn condition_shotnum(shotnum: &Shotnum) -> Result<Option<Vec<u32>>, FileError> {
    let wanted = match shotnum {
        Shotnum::All => return Ok(None),
        Shotnum::One(shot) => vec![*shot],
        Shotnum::List(shots) => shots.clone(),
        Shotnum::Range(range) => range.clone().collect(),
    };
    let mut wanted: Vec<u32> = wanted.into_iter().filter(|&s| s > 0).collect();
    wanted.sort_unstable();
    wanted.dedup();
    if wanted.is_empty() {
        return Err(FileError::EmptyShotnum);
    }
    Ok(Some(wanted))
}

pub(crate) fn read_data(
    file: &File,
    board: u32,
    channel: u32,
    opts: &ReadOptions<'_>,
) -> Result<SignalData, FileError> {
    let map = file.file_map();
    let digi = match opts.digitizer {
        Some(name) => map.digitizer(name)?,
        None => {
            let digi = map.main_digitizer().ok_or(FileError::NoDigitizers)?;
            warn!(digitizer = %digi.name(), "no digitizer specified, assuming the main one");
            digi
        }
    };

    let dset_opts = DatasetOptions {
        config_name: opts.config_name,
        adc: opts.adc,
    };
    let (dataset_name, dinfo) = digi.construct_dataset_name(board, channel, &dset_opts)?;
    let dataset_path = format!("{}/{}", digi.path(), dataset_name);
    let header_path = format!("{}/{} headers", digi.path(), dataset_name);

    let headers: Vec<SignalHeader> = file.hdf().dataset(&header_path)?.read_raw()?;
    let recorded: Vec<u32> = headers.iter().map(|h| h.Shot).collect();

    let (indices, shotnum) = match condition_shotnum(&opts.shotnum)? {
        None => (None, recorded.clone()),
        Some(wanted) => {
            let positions: HashMap<u32, usize> = recorded
                .iter()
                .enumerate()
                .map(|(i, &shot)| (shot, i))
                .collect();
            let mut indices = Vec::with_capacity(wanted.len());
            let mut missing = Vec::new();
            for shot in &wanted {
                match positions.get(shot) {
                    Some(&i) => indices.push(i),
                    None => missing.push(*shot),
                }
            }
            if !missing.is_empty() {
                return Err(FileError::MissingShots(missing));
            }
            (Some(indices), wanted)
        }
    };

    let full: Array2<i16> = file.hdf().dataset(&dataset_path)?.read_2d()?;
    let signal = match &indices {
        None => full,
        Some(indices) => full.select(Axis(0), indices),
    };

    let info = SignalInfo {
        source_file: file.path().to_path_buf(),
        dataset_name,
        dataset_path,
        digitizer: dinfo.digitizer,
        adc: dinfo.adc,
        config_name: dinfo.config_name,
        bit: dinfo.bit,
        clock_rate: dinfo.clock_rate,
        board,
        channel,
        voltage_offset: headers.first().map(|h| h.Offset).unwrap_or_default(),
        shot_average: dinfo.shot_average,
        sample_average: dinfo.sample_average,
    };

    Ok(SignalData {
        signal,
        shotnum,
        info,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use lapdhdf_map::faux::FauxLapd;

    #[test]
    fn condition_shotnum_normalizes() {
        let out = condition_shotnum(&Shotnum::List(vec![5, 1, 5, 0, 3])).unwrap();
        assert_eq!(out, Some(vec![1, 3, 5]));
        assert!(condition_shotnum(&Shotnum::All).unwrap().is_none());
        assert_eq!(
            condition_shotnum(&Shotnum::Range(2..5)).unwrap(),
            Some(vec![2, 3, 4])
        );
        assert!(matches!(
            condition_shotnum(&Shotnum::One(0)),
            Err(FileError::EmptyShotnum)
        ));
        assert!(matches!(
            condition_shotnum(&Shotnum::List(vec![0])),
            Err(FileError::EmptyShotnum)
        ));
    }

    #[test]
    fn read_all_shots() {
        let faux = FauxLapd::builder()
            .connections(&[(1, &[2])])
            .build()
            .unwrap();
        let file = File::open(faux.path()).unwrap();
        let data = file.read_data(1, 2, &ReadOptions::default()).unwrap();

        assert_eq!(data.signal.dim(), (faux.nshot(), faux.nt()));
        assert_eq!(data.shotnum, (1..=faux.nshot() as u32).collect::<Vec<_>>());
        assert!(data.signal.iter().all(|&s| s == 12));
        assert_eq!(data.info.dataset_name, "config01 [1:2]");
        assert_eq!(data.info.voltage_offset, -2.5);
    }

    #[test]
    fn read_a_subset_of_shots() {
        let faux = FauxLapd::builder().build().unwrap();
        let file = File::open(faux.path()).unwrap();
        let opts = ReadOptions {
            shotnum: Shotnum::List(vec![7, 2, 7]),
            ..Default::default()
        };
        let data = file.read_data(0, 0, &opts).unwrap();
        assert_eq!(data.shotnum, vec![2, 7]);
        assert_eq!(data.signal.nrows(), 2);
    }

    #[test]
    fn missing_shots_are_an_error() {
        let faux = FauxLapd::builder().nshot(5).build().unwrap();
        let file = File::open(faux.path()).unwrap();
        let opts = ReadOptions {
            shotnum: Shotnum::Range(4..8),
            ..Default::default()
        };
        match file.read_data(0, 0, &opts) {
            Err(FileError::MissingShots(missing)) => assert_eq!(missing, vec![6, 7]),
            other => panic!("expected MissingShots, got {other:?}"),
        }
    }

    #[test]
    fn scaling_follows_the_header_offset() {
        let faux = FauxLapd::builder().build().unwrap();
        let file = File::open(faux.path()).unwrap();
        let data = file.read_data(0, 0, &ReadOptions::default()).unwrap();

        // 14-bit adc spanning 2 * 2.5 V
        let dv = 5.0 / 16383.0;
        assert!((data.dv() - dv).abs() < 1e-12);
        assert!((data.dt() - 1e-8).abs() < 1e-20);
        let volts = data.as_volts();
        assert!((volts[[0, 0]] - (-2.5)).abs() < 1e-9);
        assert_eq!(data.time_axis().len(), faux.nt());
    }

    #[test]
    fn unknown_digitizer_is_an_error() {
        let faux = FauxLapd::builder().build().unwrap();
        let file = File::open(faux.path()).unwrap();
        let opts = ReadOptions {
            digitizer: Some("SIS crate"),
            ..Default::default()
        };
        assert!(file.read_data(0, 0, &opts).is_err());
    }
}
