//! Mapping of the SIS 3301 digitizer.
//!
//! The SIS 3301 records its setup as subgroups named `Configuration: <name>`
//! of the digitizer group, each holding `Boards[i]`/`Channels[j]` subgroups
//! that carry the `Board` and `Channel` attributes. A configuration is
//! *active* when the digitizer group contains at least one dataset named for
//! it, `"<config name> [<board>:<channel>]"`. Every signal dataset is paired
//! with a header dataset, `"<dataset name> headers"`, one compound row per
//! recorded shot.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use hdf5::types::TypeDescriptor;
use hdf5::{Dataset, Group, H5Type};
use regex::Regex;
use tracing::warn;

use crate::error::MapError;

fn config_group_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Configuration: (?P<name>.+)$").unwrap())
}

fn board_group_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Boards\[\d+\]$").unwrap())
}

fn channel_group_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Channels\[\d+\]$").unwrap())
}

fn signal_dataset_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?P<config>.+) \[(?P<board>\d+):(?P<channel>\d+)\]$").unwrap())
}

fn sample_average_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Average (?P<n>\d+) Samples$").unwrap())
}

/// Units the LaPD control system expresses clock rates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FreqUnit {
    Hz,
    KHz,
    MHz,
    GHz,
}

impl FreqUnit {
    /// Multiplier taking a rate in this unit to Hz.
    pub fn factor(&self) -> f64 {
        match self {
            Self::Hz => 1.0,
            Self::KHz => 1e3,
            Self::MHz => 1e6,
            Self::GHz => 1e9,
        }
    }
}

impl fmt::Display for FreqUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hz => "Hz",
            Self::KHz => "kHz",
            Self::MHz => "MHz",
            Self::GHz => "GHz",
        })
    }
}

/// A sample clock rate, kept in the unit the hardware reports it in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockRate {
    pub value: f64,
    pub unit: FreqUnit,
}

impl ClockRate {
    pub const fn new(value: f64, unit: FreqUnit) -> Self {
        Self { value, unit }
    }

    pub fn as_hz(&self) -> f64 {
        self.value * self.unit.factor()
    }
}

impl fmt::Display for ClockRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// One row of a `"<dataset name> headers"` dataset.
///
/// Field names mirror the compound member names the control system writes,
/// which is what lets the HDF5 library match them up by name on read.
#[derive(H5Type, Debug, Clone, Copy, PartialEq)]
#[repr(C)]
#[allow(non_snake_case)]
pub struct SignalHeader {
    pub Shot: u32,
    pub Scale: f64,
    pub Offset: f64,
}

/// Digitization parameters shared by every channel of a board.
#[derive(Debug, Clone, PartialEq)]
pub struct AdcInfo {
    pub bit: u8,
    pub clock_rate: ClockRate,
    /// Software shot averaging, `None` when disabled.
    pub shot_average: Option<u32>,
    /// Hardware sample averaging, `None` when disabled.
    pub sample_average: Option<u32>,
    /// Rows per signal dataset of the board. `-1` when the board's datasets
    /// disagree, `0` when the configuration recorded no data.
    pub nshotnum: i64,
    /// Samples per row of the board's signal datasets, with the same
    /// sentinel values as `nshotnum`.
    pub nt: i64,
}

/// A digitizer board and the channels connected on it.
#[derive(Debug, Clone, PartialEq)]
pub struct AdcConnection {
    pub board: u32,
    pub channels: Vec<u32>,
    pub info: AdcInfo,
}

/// One `Configuration: <name>` subgroup of the digitizer.
#[derive(Debug, Clone, PartialEq)]
pub struct DigiConfig {
    pub name: String,
    pub path: String,
    /// Whether any signal dataset was recorded for this configuration.
    pub active: bool,
    pub connections: Vec<AdcConnection>,
}

/// Selectors for [`Sis3301Map::construct_dataset_name`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DatasetOptions<'a> {
    /// Configuration to look the connection up under. When `None`, the sole
    /// active configuration is assumed.
    pub config_name: Option<&'a str>,
    /// Analog-digital converter the connection should belong to. The
    /// SIS 3301 has exactly one, so this is a validity check.
    pub adc: Option<&'a str>,
}

/// Everything known about a signal dataset, resolved alongside its name.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetInfo {
    pub adc: String,
    pub bit: u8,
    pub clock_rate: ClockRate,
    pub config_name: String,
    pub digitizer: String,
    pub nshotnum: i64,
    pub nt: i64,
    pub sample_average: Option<u32>,
    pub shot_average: Option<u32>,
}

/// Mapping of one SIS 3301 digitizer group.
#[derive(Debug, Clone)]
pub struct Sis3301Map {
    name: String,
    path: String,
    configs: BTreeMap<String, DigiConfig>,
    active_configs: Vec<String>,
}

impl Sis3301Map {
    /// Group name the control system gives this digitizer.
    pub const GROUP_NAME: &'static str = "SIS 3301";
    /// The digitizer's only analog-digital converter.
    pub const ADC: &'static str = "SIS 3301";
    /// Sample resolution of the adc.
    pub const BIT: u8 = 14;
    /// Native clock rate of the adc.
    pub const CLOCK_RATE: ClockRate = ClockRate::new(100.0, FreqUnit::MHz);

    /// Build the mapping from the digitizer's group.
    ///
    /// Fails when no configuration group can be identified, when none is
    /// active, or when an active configuration is internally inconsistent.
    /// Recoverable oddities are logged and the offending item is skipped.
    pub fn new(group: &Group) -> Result<Self, MapError> {
        let path = group.name();
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();

        let mut dataset_names = Vec::new();
        let mut subgroup_names = Vec::new();
        for member in group.member_names()? {
            if group.group(&member).is_ok() {
                subgroup_names.push(member);
            } else {
                dataset_names.push(member);
            }
        }

        // configurations with recorded data
        let mut active_names: Vec<String> = dataset_names
            .iter()
            .filter_map(|n| signal_dataset_re().captures(n))
            .map(|c| c["config"].to_string())
            .collect();
        active_names.sort();
        active_names.dedup();

        let mut configs = BTreeMap::new();
        for sub in &subgroup_names {
            let Some(caps) = config_group_re().captures(sub) else {
                continue;
            };
            let config_name = caps["name"].to_string();
            let cgroup = group.group(sub)?;
            let active = active_names.contains(&config_name);
            let config = Self::map_config(group, &cgroup, &config_name, active)?;
            configs.insert(config_name, config);
        }

        if configs.is_empty() {
            return Err(MapError::mapping(
                path,
                "unable to identify any configuration group",
            ));
        }

        let active_configs: Vec<String> = configs
            .values()
            .filter(|c| c.active)
            .map(|c| c.name.clone())
            .collect();
        if active_configs.is_empty() {
            return Err(MapError::mapping(
                path,
                "none of the configurations are active",
            ));
        }

        Ok(Self {
            name,
            path,
            configs,
            active_configs,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn configs(&self) -> &BTreeMap<String, DigiConfig> {
        &self.configs
    }

    /// Names of configurations with recorded data, sorted.
    pub fn active_configs(&self) -> &[String] {
        &self.active_configs
    }

    /// Name of the signal dataset for `(board, channel)`.
    pub fn dataset_name(config: &str, board: u32, channel: u32) -> String {
        format!("{config} [{board}:{channel}]")
    }

    /// Name of the header dataset paired with a signal dataset.
    pub fn header_dataset_name(dataset: &str) -> String {
        format!("{dataset} headers")
    }

    /// Resolve the signal dataset recorded for `(board, channel)`.
    ///
    /// With no `config_name` in `opts` the sole active configuration is
    /// assumed (with a warning); zero or several active configurations make
    /// the omission an error.
    pub fn construct_dataset_name(
        &self,
        board: u32,
        channel: u32,
        opts: &DatasetOptions<'_>,
    ) -> Result<(String, DatasetInfo), MapError> {
        let config = match opts.config_name {
            Some(requested) => {
                let config = self.configs.get(requested).ok_or_else(|| {
                    MapError::UnknownConfig {
                        device: self.name.clone(),
                        config: requested.to_string(),
                    }
                })?;
                if !config.active {
                    return Err(MapError::InactiveConfig {
                        device: self.name.clone(),
                        config: requested.to_string(),
                    });
                }
                config
            }
            None => match self.active_configs.as_slice() {
                [] => {
                    return Err(MapError::NoActiveConfig {
                        device: self.name.clone(),
                    })
                }
                [sole] => {
                    warn!(
                        digitizer = %self.name,
                        config = %sole,
                        "no configuration specified, assuming the sole active one"
                    );
                    &self.configs[sole]
                }
                _ => {
                    return Err(MapError::AmbiguousConfig {
                        device: self.name.clone(),
                        candidates: self.active_configs.clone(),
                    })
                }
            },
        };

        if let Some(adc) = opts.adc {
            if adc != Self::ADC {
                return Err(MapError::UnknownAdc {
                    device: self.name.clone(),
                    adc: adc.to_string(),
                });
            }
        }

        let conn = config
            .connections
            .iter()
            .find(|c| c.board == board && c.channels.contains(&channel))
            .ok_or_else(|| MapError::NotConnected {
                config: config.name.clone(),
                board,
                channel,
            })?;

        let name = Self::dataset_name(&config.name, board, channel);
        let info = DatasetInfo {
            adc: Self::ADC.to_string(),
            bit: conn.info.bit,
            clock_rate: conn.info.clock_rate,
            config_name: config.name.clone(),
            digitizer: self.name.clone(),
            nshotnum: conn.info.nshotnum,
            nt: conn.info.nt,
            sample_average: conn.info.sample_average,
            shot_average: conn.info.shot_average,
        };
        Ok((name, info))
    }

    fn map_config(
        digi_group: &Group,
        cgroup: &Group,
        config_name: &str,
        active: bool,
    ) -> Result<DigiConfig, MapError> {
        let cpath = cgroup.name();
        let shot_average = Self::read_shot_average(cgroup);
        let sample_average = Self::read_sample_average(cgroup);

        let mut connections = Self::find_adc_connections(cgroup, active)?;
        if active {
            Self::attach_datasets(digi_group, config_name, &mut connections)?;
            if connections.is_empty() {
                return Err(MapError::mapping(
                    cpath,
                    "active configuration has no surviving adc connections",
                ));
            }
        }

        for conn in &mut connections {
            conn.info.shot_average = shot_average;
            conn.info.sample_average = sample_average;
        }

        Ok(DigiConfig {
            name: config_name.to_string(),
            path: cpath,
            active,
            connections,
        })
    }

    fn read_shot_average(cgroup: &Group) -> Option<u32> {
        let attr = cgroup.attr("Shots to average").ok()?;
        match attr.read_scalar::<i64>() {
            Ok(n) if n > 1 => Some(n as u32),
            Ok(_) => None,
            Err(_) => {
                warn!(group = %cgroup.name(), "'Shots to average' attribute is not an integer");
                None
            }
        }
    }

    fn read_sample_average(cgroup: &Group) -> Option<u32> {
        let value = match crate::attr::read_str_attr(cgroup, "Samples to average") {
            Ok(Some(value)) => value,
            Ok(None) | Err(_) => return None,
        };
        if value == "No averaging" {
            return None;
        }
        match sample_average_re()
            .captures(&value)
            .and_then(|c| c["n"].parse::<u32>().ok())
        {
            Some(n) if n > 1 => Some(n),
            Some(_) => None,
            None => {
                warn!(
                    group = %cgroup.name(),
                    value = %value,
                    "unable to parse 'Samples to average' attribute"
                );
                None
            }
        }
    }

    /// Walk the `Boards[i]`/`Channels[j]` subgroups of a configuration.
    ///
    /// A malformed board or channel in an *active* configuration that cannot
    /// be attributed to a single item is a hard error; in inactive
    /// configurations everything recoverable is logged and skipped.
    fn find_adc_connections(
        cgroup: &Group,
        active: bool,
    ) -> Result<Vec<AdcConnection>, MapError> {
        let mut connections: Vec<AdcConnection> = Vec::new();

        for sub in cgroup.member_names()? {
            if !board_group_re().is_match(&sub) {
                warn!(group = %cgroup.name(), member = %sub, "not a board configuration group, skipping");
                continue;
            }
            let bgroup = cgroup.group(&sub)?;
            let bpath = bgroup.name();

            let battr = bgroup.attr("Board").map_err(|_| {
                MapError::mapping(bpath.as_str(), "board group is missing the 'Board' attribute")
            })?;
            let board = match battr.read_scalar::<i64>() {
                Ok(b) if b >= 0 => b as u32,
                Ok(b) => {
                    warn!(group = %bpath, board = b, "'Board' attribute is negative, skipping board");
                    continue;
                }
                Err(_) => {
                    warn!(group = %bpath, "'Board' attribute is not an integer, skipping board");
                    continue;
                }
            };
            if connections.iter().any(|c| c.board == board) {
                if active {
                    return Err(MapError::mapping(
                        bpath.as_str(),
                        format!("board {board} is connected more than once"),
                    ));
                }
                warn!(group = %bpath, board, "board connected more than once, skipping duplicate");
                continue;
            }

            let mut channels: Vec<u32> = Vec::new();
            let mut drop_board = false;
            for chsub in bgroup.member_names()? {
                if !channel_group_re().is_match(&chsub) {
                    warn!(group = %bpath, member = %chsub, "not a channel configuration group, skipping");
                    continue;
                }
                let chgroup = bgroup.group(&chsub)?;
                let chpath = chgroup.name();

                let chattr = chgroup.attr("Channel").map_err(|_| {
                    MapError::mapping(
                        chpath.as_str(),
                        "channel group is missing the 'Channel' attribute",
                    )
                })?;
                let channel = match chattr.read_scalar::<i64>() {
                    Ok(c) if c >= 0 => c as u32,
                    Ok(c) => {
                        warn!(group = %chpath, channel = c, "'Channel' attribute is negative, skipping channel");
                        continue;
                    }
                    Err(_) => {
                        warn!(group = %chpath, "'Channel' attribute is not an integer, skipping channel");
                        continue;
                    }
                };
                if channels.contains(&channel) {
                    warn!(group = %bpath, board, channel, "duplicate channel on board, dropping board");
                    drop_board = true;
                    break;
                }
                channels.push(channel);
            }

            if drop_board {
                continue;
            }
            if channels.is_empty() {
                warn!(group = %bpath, board, "board has no connected channels, skipping board");
                continue;
            }
            channels.sort_unstable();

            connections.push(AdcConnection {
                board,
                channels,
                info: AdcInfo {
                    bit: Self::BIT,
                    clock_rate: Self::CLOCK_RATE,
                    shot_average: None,
                    sample_average: None,
                    nshotnum: 0,
                    nt: 0,
                },
            });
        }

        connections.sort_unstable_by_key(|c| c.board);
        Ok(connections)
    }

    /// Verify the recorded datasets of an active configuration and fill in
    /// per-board shot/sample counts. Channels whose datasets are unusable
    /// are dropped, then boards left with no channels.
    fn attach_datasets(
        digi_group: &Group,
        config_name: &str,
        connections: &mut Vec<AdcConnection>,
    ) -> Result<(), MapError> {
        for conn in connections.iter_mut() {
            let mut nshotnum: Option<i64> = None;
            let mut nt: Option<i64> = None;

            conn.channels.retain(|&channel| {
                let dname = Self::dataset_name(config_name, conn.board, channel);
                let dset = match digi_group.dataset(&dname) {
                    Ok(dset) => dset,
                    Err(_) => {
                        warn!(dataset = %dname, "signal dataset not found, dropping channel");
                        return false;
                    }
                };
                if dataset_is_compound(&dset) {
                    warn!(dataset = %dname, "signal dataset has a compound type, dropping channel");
                    return false;
                }
                let shape = dset.shape();
                if shape.len() != 2 {
                    warn!(dataset = %dname, ndim = shape.len(), "signal dataset is not 2-dimensional, dropping channel");
                    return false;
                }

                let hname = Self::header_dataset_name(&dname);
                let header = match digi_group.dataset(&hname) {
                    Ok(header) => header,
                    Err(_) => {
                        warn!(dataset = %hname, "header dataset not found, dropping channel");
                        return false;
                    }
                };
                if !header_has_shot_field(&header) {
                    warn!(dataset = %hname, "header dataset has no scalar unsigned 'Shot' field, dropping channel");
                    return false;
                }
                let nrows = shape[0] as i64;
                if header.shape().first().copied().unwrap_or(0) as i64 != nrows {
                    warn!(dataset = %dname, "header and signal datasets disagree on row count, dropping channel");
                    return false;
                }

                match nt {
                    None => nt = Some(shape[1] as i64),
                    Some(-1) => {}
                    Some(current) if current != shape[1] as i64 => {
                        warn!(board = conn.board, "signal datasets disagree on sample count");
                        nt = Some(-1);
                    }
                    Some(_) => {}
                }
                match nshotnum {
                    None => nshotnum = Some(nrows),
                    Some(-1) => {}
                    Some(current) if current != nrows => {
                        warn!(board = conn.board, "signal datasets disagree on shot count");
                        nshotnum = Some(-1);
                    }
                    Some(_) => {}
                }
                true
            });

            conn.info.nshotnum = nshotnum.unwrap_or(0);
            conn.info.nt = nt.unwrap_or(0);
        }

        connections.retain(|conn| {
            if conn.channels.is_empty() {
                warn!(board = conn.board, "board has no surviving channels, dropping board");
                false
            } else {
                true
            }
        });
        Ok(())
    }
}

fn dataset_is_compound(dset: &Dataset) -> bool {
    matches!(
        dset.dtype().and_then(|d| d.to_descriptor()),
        Ok(TypeDescriptor::Compound(_))
    )
}

/// Headers must carry a scalar unsigned `Shot` member. The HDF5 library will
/// happily convert a float or array member on read, so the type descriptor
/// has to be inspected up front.
fn header_has_shot_field(header: &Dataset) -> bool {
    match header.dtype().and_then(|d| d.to_descriptor()) {
        Ok(TypeDescriptor::Compound(compound)) => compound
            .fields
            .iter()
            .any(|f| f.name == "Shot" && matches!(f.ty, TypeDescriptor::Unsigned(_))),
        _ => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::faux::FauxLapd;

    fn digi_group(faux: &FauxLapd) -> Group {
        faux.file()
            .and_then(|f| f.group("Raw data + config"))
            .and_then(|g| g.group(Sis3301Map::GROUP_NAME))
            .unwrap()
    }

    #[test]
    fn map_single_active_config() {
        let faux = FauxLapd::builder()
            .connections(&[(1, &[0, 3]), (5, &[1])])
            .build()
            .unwrap();
        let map = Sis3301Map::new(&digi_group(&faux)).unwrap();

        assert_eq!(map.name(), "SIS 3301");
        assert_eq!(map.active_configs(), ["config01"]);
        let config = &map.configs()["config01"];
        assert!(config.active);
        assert_eq!(config.connections.len(), 2);
        assert_eq!(config.connections[0].board, 1);
        assert_eq!(config.connections[0].channels, vec![0, 3]);
        assert_eq!(config.connections[1].board, 5);
        assert_eq!(config.connections[1].channels, vec![1]);

        let info = &config.connections[0].info;
        assert_eq!(info.bit, 14);
        assert_eq!(info.clock_rate.to_string(), "100 MHz");
        assert_eq!(info.nshotnum, faux.nshot() as i64);
        assert_eq!(info.nt, faux.nt() as i64);
    }

    #[test]
    fn inactive_configs_are_mapped_but_not_active() {
        let faux = FauxLapd::builder()
            .n_configs(3)
            .active(&["config02"])
            .build()
            .unwrap();
        let map = Sis3301Map::new(&digi_group(&faux)).unwrap();
        assert_eq!(map.configs().len(), 3);
        assert_eq!(map.active_configs(), ["config02"]);
        assert!(!map.configs()["config01"].active);
        assert_eq!(map.configs()["config01"].connections[0].info.nshotnum, 0);
    }

    #[test]
    fn averaging_attributes() {
        let faux = FauxLapd::builder()
            .shot_average(4)
            .sample_average(8)
            .build()
            .unwrap();
        let map = Sis3301Map::new(&digi_group(&faux)).unwrap();
        let info = &map.configs()["config01"].connections[0].info;
        assert_eq!(info.shot_average, Some(4));
        assert_eq!(info.sample_average, Some(8));
    }

    #[test]
    fn no_config_groups_is_an_error() {
        let faux = FauxLapd::builder().build().unwrap();
        let group = digi_group(&faux);
        for member in group.member_names().unwrap() {
            group.unlink(&member).unwrap();
        }
        assert!(matches!(
            Sis3301Map::new(&group),
            Err(MapError::Mapping { .. })
        ));
    }

    #[test]
    fn no_active_config_is_an_error() {
        let faux = FauxLapd::builder().build().unwrap();
        let group = digi_group(&faux);
        // remove the signal datasets, leaving only configuration groups
        for member in group.member_names().unwrap() {
            if group.dataset(&member).is_ok() {
                group.unlink(&member).unwrap();
            }
        }
        assert!(matches!(
            Sis3301Map::new(&group),
            Err(MapError::Mapping { .. })
        ));
    }

    #[test]
    fn missing_board_attribute_is_an_error() {
        let faux = FauxLapd::builder().build().unwrap();
        let group = digi_group(&faux);
        // a board group with no 'Board' attribute at all
        group
            .group("Configuration: config01")
            .unwrap()
            .create_group("Boards[9]")
            .unwrap();
        assert!(matches!(
            Sis3301Map::new(&group),
            Err(MapError::Mapping { .. })
        ));
    }

    #[test]
    fn missing_dataset_drops_the_channel() {
        let faux = FauxLapd::builder()
            .connections(&[(0, &[0, 1])])
            .build()
            .unwrap();
        let group = digi_group(&faux);
        group.unlink("config01 [0:1]").unwrap();
        let map = Sis3301Map::new(&group).unwrap();
        assert_eq!(map.configs()["config01"].connections[0].channels, vec![0]);
    }

    #[test]
    fn construct_dataset_name_assumes_sole_active_config() {
        let faux = FauxLapd::builder()
            .connections(&[(2, &[4])])
            .build()
            .unwrap();
        let map = Sis3301Map::new(&digi_group(&faux)).unwrap();
        let (name, info) = map
            .construct_dataset_name(2, 4, &DatasetOptions::default())
            .unwrap();
        assert_eq!(name, "config01 [2:4]");
        assert_eq!(info.config_name, "config01");
        assert_eq!(info.digitizer, "SIS 3301");
        assert_eq!(info.adc, "SIS 3301");
    }

    #[test]
    fn construct_dataset_name_rejects_bad_requests() {
        let faux = FauxLapd::builder()
            .connections(&[(2, &[4])])
            .build()
            .unwrap();
        let map = Sis3301Map::new(&digi_group(&faux)).unwrap();

        let unknown = DatasetOptions {
            config_name: Some("nope"),
            adc: None,
        };
        assert!(matches!(
            map.construct_dataset_name(2, 4, &unknown),
            Err(MapError::UnknownConfig { .. })
        ));

        let bad_adc = DatasetOptions {
            config_name: None,
            adc: Some("SIS crate"),
        };
        assert!(matches!(
            map.construct_dataset_name(2, 4, &bad_adc),
            Err(MapError::UnknownAdc { .. })
        ));

        assert!(matches!(
            map.construct_dataset_name(2, 5, &DatasetOptions::default()),
            Err(MapError::NotConnected { .. })
        ));
    }

    #[test]
    fn multiple_active_configs_require_a_choice() {
        let faux = FauxLapd::builder()
            .n_configs(2)
            .active(&["config01", "config02"])
            .build()
            .unwrap();
        let map = Sis3301Map::new(&digi_group(&faux)).unwrap();
        assert!(matches!(
            map.construct_dataset_name(0, 0, &DatasetOptions::default()),
            Err(MapError::AmbiguousConfig { .. })
        ));
        let picked = DatasetOptions {
            config_name: Some("config02"),
            adc: None,
        };
        let (name, _) = map.construct_dataset_name(0, 0, &picked).unwrap();
        assert_eq!(name, "config02 [0:0]");
    }
}
