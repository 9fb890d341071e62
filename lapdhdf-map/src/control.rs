//! Mapping of control devices.
//!
//! Control devices live beside the digitizers under `/Raw data + config` and
//! record per-shot state rather than signals. Two are recognized here: the
//! `Waveform` generator, which carries a command list of programmed
//! frequencies, and the `N5700_PS` power supply. Both record their state in
//! a single `"Run time list"` dataset whose rows tag each shot with the
//! configuration it ran under and the index of the command in effect.

use std::collections::BTreeMap;
use std::fmt;
use std::mem;
use std::sync::OnceLock;

use hdf5::types::{CompoundField, CompoundType, FixedAscii, TypeDescriptor};
use hdf5::{Group, H5Type};
use regex::Regex;
use tracing::warn;

use crate::attr::read_str_attr;
use crate::error::MapError;

fn freq_command_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(FREQ\s)(?P<value>\d+\.\d+)").unwrap())
}

/// The broad category of state a control device records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConType {
    Motion,
    Waveform,
    Power,
    Timing,
}

impl fmt::Display for ConType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Motion => "motion",
            Self::Waveform => "waveform",
            Self::Power => "power",
            Self::Timing => "timing",
        })
    }
}

/// One row of a control device's `"Run time list"` dataset.
///
/// The control system names the compound members `Shot number`,
/// `Configuration name`, and `Command index`. Member names with spaces are
/// beyond the derive, so the type descriptor is written out by hand.
#[derive(Debug, Clone, PartialEq)]
#[repr(C)]
pub struct RunTimeListRow {
    pub shot: u32,
    pub configuration: FixedAscii<120>,
    pub command_index: u32,
}

unsafe impl H5Type for RunTimeListRow {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::Compound(CompoundType {
            fields: vec![
                CompoundField::typed::<u32>(
                    "Shot number",
                    mem::offset_of!(RunTimeListRow, shot),
                    0,
                ),
                CompoundField::typed::<FixedAscii<120>>(
                    "Configuration name",
                    mem::offset_of!(RunTimeListRow, configuration),
                    1,
                ),
                CompoundField::typed::<u32>(
                    "Command index",
                    mem::offset_of!(RunTimeListRow, command_index),
                    2,
                ),
            ],
            size: mem::size_of::<RunTimeListRow>(),
        })
    }
}

/// Device-specific configuration detail.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlDetail {
    /// Waveform generator: the programmed frequencies, in command order.
    Waveform { frequencies: Vec<f64> },
    /// Power supply state.
    Power {
        supply_device: Option<String>,
        initial_state: Option<String>,
    },
}

/// One configuration subgroup of a control device.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlConfig {
    pub name: String,
    pub path: String,
    pub ip_address: Option<String>,
    pub detail: ControlDetail,
}

/// Mapping of one control device group.
#[derive(Debug, Clone)]
pub struct ControlMap {
    name: String,
    path: String,
    contype: ConType,
    configs: BTreeMap<String, ControlConfig>,
}

impl ControlMap {
    /// Group name of the waveform generator.
    pub const WAVEFORM_GROUP: &'static str = "Waveform";
    /// Group name of the N5700 power supply.
    pub const N5700_GROUP: &'static str = "N5700_PS";
    /// The one dataset every recognized control device records into.
    pub const DATASET_NAME: &'static str = "Run time list";

    /// Map a `Waveform` generator group.
    pub fn waveform(group: &Group) -> Result<Self, MapError> {
        let mut map = Self::common(group, ConType::Waveform)?;
        for sub in group.member_names()? {
            let Ok(cgroup) = group.group(&sub) else {
                continue;
            };
            let commands = read_str_attr(&cgroup, "Waveform command list")?.unwrap_or_default();
            let frequencies = parse_freq_commands(&commands);
            if frequencies.is_empty() {
                warn!(group = %cgroup.name(), "no FREQ commands found in 'Waveform command list'");
            }
            map.configs.insert(
                sub.clone(),
                ControlConfig {
                    name: sub,
                    path: cgroup.name(),
                    ip_address: read_str_attr(&cgroup, "IP address")?,
                    detail: ControlDetail::Waveform { frequencies },
                },
            );
        }
        map.finish()
    }

    /// Map an `N5700_PS` power supply group.
    pub fn n5700ps(group: &Group) -> Result<Self, MapError> {
        let mut map = Self::common(group, ConType::Power)?;
        for sub in group.member_names()? {
            let Ok(cgroup) = group.group(&sub) else {
                continue;
            };
            map.configs.insert(
                sub.clone(),
                ControlConfig {
                    name: sub,
                    path: cgroup.name(),
                    ip_address: read_str_attr(&cgroup, "IP address")?,
                    detail: ControlDetail::Power {
                        supply_device: read_str_attr(&cgroup, "Power supply device")?,
                        initial_state: read_str_attr(&cgroup, "Initial state")?,
                    },
                },
            );
        }
        map.finish()
    }

    fn common(group: &Group, contype: ConType) -> Result<Self, MapError> {
        let path = group.name();
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        if group.dataset(Self::DATASET_NAME).is_err() {
            return Err(MapError::mapping(
                path,
                format!("control device has no '{}' dataset", Self::DATASET_NAME),
            ));
        }
        Ok(Self {
            name,
            path,
            contype,
            configs: BTreeMap::new(),
        })
    }

    fn finish(self) -> Result<Self, MapError> {
        if self.configs.is_empty() {
            return Err(MapError::mapping(
                self.path.as_str(),
                "unable to identify any configuration group",
            ));
        }
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn contype(&self) -> ConType {
        self.contype
    }

    pub fn configs(&self) -> &BTreeMap<String, ControlConfig> {
        &self.configs
    }

    /// Name of the dataset state is recorded into. Every recognized control
    /// device uses the same one, so this takes no selectors.
    pub fn construct_dataset_name(&self) -> &'static str {
        Self::DATASET_NAME
    }

    /// Whether each dataset row belongs to exactly one configuration, which
    /// holds whenever only one configuration exists.
    pub fn one_config_per_dataset(&self) -> bool {
        self.configs.len() == 1
    }

    /// Whether the device's configurations carry a command list that row
    /// indices can be resolved against.
    pub fn has_command_list(&self) -> bool {
        self.contype == ConType::Waveform
    }
}

/// Pull the `FREQ <float>` values out of a newline-separated command list.
fn parse_freq_commands(commands: &str) -> Vec<f64> {
    commands
        .lines()
        .filter_map(|line| freq_command_re().captures(line))
        .filter_map(|caps| caps["value"].parse::<f64>().ok())
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::faux::FauxLapd;

    #[test]
    fn run_time_list_member_names_match_the_control_system() {
        let TypeDescriptor::Compound(compound) = RunTimeListRow::type_descriptor() else {
            panic!("expected a compound descriptor");
        };
        let names: Vec<&str> = compound.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            ["Shot number", "Configuration name", "Command index"]
        );
        assert_eq!(compound.size, mem::size_of::<RunTimeListRow>());
    }

    #[test]
    fn parse_command_list() {
        let commands = "FREQ 40000.0\nFREQ 80000.0\nVOLT 25.0\nFREQ 120000.0";
        assert_eq!(
            parse_freq_commands(commands),
            vec![40000.0, 80000.0, 120000.0]
        );
        assert!(parse_freq_commands("VOLT 25.0").is_empty());
    }

    #[test]
    fn map_waveform() {
        let faux = FauxLapd::builder().with_waveform().build().unwrap();
        let group = faux
            .file()
            .and_then(|f| f.group("Raw data + config/Waveform"))
            .unwrap();
        let map = ControlMap::waveform(&group).unwrap();

        assert_eq!(map.name(), "Waveform");
        assert_eq!(map.contype(), ConType::Waveform);
        assert_eq!(map.construct_dataset_name(), "Run time list");
        assert!(map.one_config_per_dataset());
        assert!(map.has_command_list());

        let config = map.configs().values().next().unwrap();
        assert_eq!(config.ip_address.as_deref(), Some("192.168.1.100"));
        match &config.detail {
            ControlDetail::Waveform { frequencies } => {
                assert_eq!(frequencies, &vec![40000.0, 80000.0, 120000.0]);
            }
            other => panic!("expected waveform detail, got {other:?}"),
        }
    }

    #[test]
    fn map_n5700ps() {
        let faux = FauxLapd::builder().with_n5700ps().build().unwrap();
        let group = faux
            .file()
            .and_then(|f| f.group("Raw data + config/N5700_PS"))
            .unwrap();
        let map = ControlMap::n5700ps(&group).unwrap();

        assert_eq!(map.contype(), ConType::Power);
        assert!(!map.has_command_list());
        let config = map.configs().values().next().unwrap();
        match &config.detail {
            ControlDetail::Power {
                supply_device,
                initial_state,
            } => {
                assert_eq!(supply_device.as_deref(), Some("N5751A"));
                assert!(initial_state.is_some());
            }
            other => panic!("expected power detail, got {other:?}"),
        }
    }

    #[test]
    fn missing_run_time_list_is_an_error() {
        let faux = FauxLapd::builder().with_waveform().build().unwrap();
        let group = faux
            .file()
            .and_then(|f| f.group("Raw data + config/Waveform"))
            .unwrap();
        group.unlink(ControlMap::DATASET_NAME).unwrap();
        assert!(matches!(
            ControlMap::waveform(&group),
            Err(MapError::Mapping { .. })
        ));
    }
}
