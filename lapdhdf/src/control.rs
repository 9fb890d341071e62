//! Reading per-shot control-device state.

use lapdhdf_map::{ConType, ControlDetail, MapError, RunTimeListRow};
use tracing::warn;

use crate::data::{condition_shotnum, Shotnum};
use crate::wrap::{File, FileError};

/// Where a control result came from.
#[derive(Debug, Clone)]
pub struct ControlInfo {
    pub device_name: String,
    pub device_path: String,
    pub configuration: String,
    pub contype: ConType,
}

/// Per-shot state recorded by one control device configuration.
#[derive(Debug, Clone)]
pub struct ControlData {
    pub shotnum: Vec<u32>,
    /// Index into the device's command list, per shot.
    pub command_index: Vec<u32>,
    /// The command value in effect, per shot. NaN when the device carries
    /// no resolvable command list.
    pub command_value: Vec<f64>,
    pub info: ControlInfo,
}

pub(crate) fn read_control(
    file: &File,
    name: &str,
    config_name: Option<&str>,
    shotnum: &Shotnum,
) -> Result<ControlData, FileError> {
    let cmap = file.file_map().control(name)?;

    let config = match config_name {
        Some(requested) => {
            cmap.configs()
                .get(requested)
                .ok_or_else(|| MapError::UnknownConfig {
                    device: cmap.name().to_string(),
                    config: requested.to_string(),
                })?
        }
        None => {
            // a mapped control device always has at least one configuration
            let mut configs = cmap.configs().iter();
            let (cname, config) = match (configs.next(), configs.next()) {
                (Some(only), None) => only,
                _ => {
                    return Err(FileError::Map(MapError::AmbiguousConfig {
                        device: cmap.name().to_string(),
                        candidates: cmap.configs().keys().cloned().collect(),
                    }))
                }
            };
            warn!(device = %cmap.name(), config = %cname, "no configuration specified, assuming the only one");
            config
        }
    };

    let dataset_path = format!("{}/{}", cmap.path(), cmap.construct_dataset_name());
    let all_rows: Vec<RunTimeListRow> = file.hdf().dataset(&dataset_path)?.read_raw()?;
    let rows: Vec<&RunTimeListRow> = all_rows
        .iter()
        .filter(|row| row.configuration.as_str() == config.name)
        .collect();

    let rows: Vec<&RunTimeListRow> = match condition_shotnum(shotnum)? {
        None => rows,
        Some(wanted) => {
            let mut selected = Vec::with_capacity(wanted.len());
            let mut missing = Vec::new();
            for shot in &wanted {
                match rows.iter().find(|row| row.shot == *shot) {
                    Some(row) => selected.push(*row),
                    None => missing.push(*shot),
                }
            }
            if !missing.is_empty() {
                return Err(FileError::MissingShots(missing));
            }
            selected
        }
    };

    let command_value = rows
        .iter()
        .map(|row| match &config.detail {
            ControlDetail::Waveform { frequencies } => frequencies
                .get(row.command_index as usize)
                .copied()
                .unwrap_or(f64::NAN),
            ControlDetail::Power { .. } => f64::NAN,
        })
        .collect();

    Ok(ControlData {
        shotnum: rows.iter().map(|row| row.shot).collect(),
        command_index: rows.iter().map(|row| row.command_index).collect(),
        command_value,
        info: ControlInfo {
            device_name: cmap.name().to_string(),
            device_path: cmap.path().to_string(),
            configuration: config.name.clone(),
            contype: cmap.contype(),
        },
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use lapdhdf_map::faux::FauxLapd;

    #[test]
    fn read_waveform_state() {
        let faux = FauxLapd::builder().with_waveform().build().unwrap();
        let file = File::open(faux.path()).unwrap();
        let data = file
            .read_controls("Waveform", None, &Shotnum::All)
            .unwrap();

        assert_eq!(data.shotnum.len(), faux.nshot());
        assert_eq!(data.info.contype, ConType::Waveform);
        assert_eq!(data.info.configuration, "waveform_config01");
        // command index cycles 0, 1, 2 and resolves against the FREQ list
        assert_eq!(data.command_index[0], 0);
        assert_eq!(data.command_index[4], 1);
        assert_eq!(data.command_value[0], 40000.0);
        assert_eq!(data.command_value[4], 80000.0);
        assert_eq!(data.command_value[2], 120000.0);
    }

    #[test]
    fn read_a_subset_of_shots() {
        let faux = FauxLapd::builder().with_waveform().build().unwrap();
        let file = File::open(faux.path()).unwrap();
        let data = file
            .read_controls("Waveform", None, &Shotnum::List(vec![9, 3]))
            .unwrap();
        assert_eq!(data.shotnum, vec![3, 9]);
        assert_eq!(data.command_index, vec![2, 2]);
    }

    #[test]
    fn power_supply_state_has_no_command_values() {
        let faux = FauxLapd::builder().with_n5700ps().build().unwrap();
        let file = File::open(faux.path()).unwrap();
        let data = file
            .read_controls("N5700_PS", None, &Shotnum::All)
            .unwrap();
        assert_eq!(data.info.contype, ConType::Power);
        assert!(data.command_value.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn unknown_configuration_is_an_error() {
        let faux = FauxLapd::builder().with_waveform().build().unwrap();
        let file = File::open(faux.path()).unwrap();
        let result = file.read_controls("Waveform", Some("nope"), &Shotnum::All);
        assert!(matches!(
            result,
            Err(FileError::Map(MapError::UnknownConfig { .. }))
        ));
    }

    #[test]
    fn unknown_device_is_an_error() {
        let faux = FauxLapd::builder().build().unwrap();
        let file = File::open(faux.path()).unwrap();
        assert!(file
            .read_controls("Waveform", None, &Shotnum::All)
            .is_err());
    }
}
