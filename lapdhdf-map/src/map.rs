//! The top-level map of a LaPD run file.

use std::collections::BTreeMap;

use hdf5::Group;
use tracing::warn;

use crate::control::ControlMap;
use crate::digitizer::Sis3301Map;
use crate::error::MapError;
use crate::msi::{MsiKind, MsiMap};

/// Everything recognized in one LaPD HDF5 file.
///
/// Construction never fails outright on a malformed device: a device group
/// that cannot be mapped is logged, recorded under [`LapdMap::unknowns`],
/// and left out of the map.
#[derive(Debug, Clone, Default)]
pub struct LapdMap {
    msi: BTreeMap<String, MsiMap>,
    digitizers: BTreeMap<String, Sis3301Map>,
    controls: BTreeMap<String, ControlMap>,
    has_data_run_sequence: bool,
    /// Paths of groups that were found but not recognized or not mappable.
    unknowns: Vec<String>,
    msi_found: bool,
    data_found: bool,
}

impl LapdMap {
    /// Group holding the machine-state diagnostics.
    pub const MSI_GROUP: &'static str = "MSI";
    /// Group holding digitizer and control device data.
    pub const DATA_GROUP: &'static str = "Raw data + config";
    /// Subgroup of [`Self::DATA_GROUP`] recording the run sequence.
    pub const DATA_RUN_SEQUENCE: &'static str = "Data run sequence";

    /// Map the file rooted at `root`.
    pub fn new(root: &Group) -> Result<Self, MapError> {
        let mut map = Self::default();

        if let Ok(msi_group) = root.group(Self::MSI_GROUP) {
            map.msi_found = true;
            map.map_msi(&msi_group)?;
        } else {
            warn!("file has no '{}' group", Self::MSI_GROUP);
        }

        if let Ok(data_group) = root.group(Self::DATA_GROUP) {
            map.data_found = true;
            map.map_data(&data_group)?;
        } else {
            warn!("file has no '{}' group", Self::DATA_GROUP);
        }

        Ok(map)
    }

    fn map_msi(&mut self, msi_group: &Group) -> Result<(), MapError> {
        for member in msi_group.member_names()? {
            let Ok(group) = msi_group.group(&member) else {
                continue;
            };
            if MsiKind::from_group_name(&member).is_none() {
                warn!(group = %group.name(), "not a recognized MSI diagnostic");
                self.unknowns.push(group.name());
                continue;
            }
            match MsiMap::new(&group) {
                Ok(map) => {
                    self.msi.insert(member, map);
                }
                Err(e) => {
                    warn!(group = %group.name(), error = %e, "unable to map MSI diagnostic");
                    self.unknowns.push(group.name());
                }
            }
        }
        Ok(())
    }

    fn map_data(&mut self, data_group: &Group) -> Result<(), MapError> {
        for member in data_group.member_names()? {
            let Ok(group) = data_group.group(&member) else {
                continue;
            };
            match member.as_str() {
                Sis3301Map::GROUP_NAME => match Sis3301Map::new(&group) {
                    Ok(map) => {
                        self.digitizers.insert(member, map);
                    }
                    Err(e) => {
                        warn!(group = %group.name(), error = %e, "unable to map digitizer");
                        self.unknowns.push(group.name());
                    }
                },
                ControlMap::WAVEFORM_GROUP => match ControlMap::waveform(&group) {
                    Ok(map) => {
                        self.controls.insert(member, map);
                    }
                    Err(e) => {
                        warn!(group = %group.name(), error = %e, "unable to map control device");
                        self.unknowns.push(group.name());
                    }
                },
                ControlMap::N5700_GROUP => match ControlMap::n5700ps(&group) {
                    Ok(map) => {
                        self.controls.insert(member, map);
                    }
                    Err(e) => {
                        warn!(group = %group.name(), error = %e, "unable to map control device");
                        self.unknowns.push(group.name());
                    }
                },
                Self::DATA_RUN_SEQUENCE => {
                    self.has_data_run_sequence = true;
                }
                _ => {
                    warn!(group = %group.name(), "not a recognized device group");
                    self.unknowns.push(group.name());
                }
            }
        }
        Ok(())
    }

    pub fn msi(&self) -> &BTreeMap<String, MsiMap> {
        &self.msi
    }

    pub fn digitizers(&self) -> &BTreeMap<String, Sis3301Map> {
        &self.digitizers
    }

    pub fn controls(&self) -> &BTreeMap<String, ControlMap> {
        &self.controls
    }

    pub fn unknowns(&self) -> &[String] {
        &self.unknowns
    }

    pub fn has_msi_group(&self) -> bool {
        self.msi_found
    }

    pub fn has_data_group(&self) -> bool {
        self.data_found
    }

    pub fn has_data_run_sequence(&self) -> bool {
        self.has_data_run_sequence
    }

    /// The digitizer reads default to when none is named. With a single
    /// digitizer mapped that one is it; files with several have no
    /// automatic choice and the first by name is taken.
    pub fn main_digitizer(&self) -> Option<&Sis3301Map> {
        self.digitizers.values().next()
    }

    pub fn digitizer(&self, name: &str) -> Result<&Sis3301Map, MapError> {
        self.digitizers
            .get(name)
            .ok_or_else(|| MapError::UnknownDevice {
                kind: "digitizer",
                name: name.to_string(),
            })
    }

    pub fn control(&self, name: &str) -> Result<&ControlMap, MapError> {
        self.controls
            .get(name)
            .ok_or_else(|| MapError::UnknownDevice {
                kind: "control device",
                name: name.to_string(),
            })
    }

    pub fn msi_diagnostic(&self, name: &str) -> Result<&MsiMap, MapError> {
        self.msi.get(name).ok_or_else(|| MapError::UnknownDevice {
            kind: "MSI diagnostic",
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::faux::FauxLapd;

    #[test]
    fn map_everything() {
        let faux = FauxLapd::builder()
            .with_msi()
            .with_waveform()
            .with_n5700ps()
            .with_data_run_sequence()
            .build()
            .unwrap();
        let file = faux.file().unwrap();
        let map = LapdMap::new(&file).unwrap();

        assert!(map.has_msi_group());
        assert!(map.has_data_group());
        assert!(map.has_data_run_sequence());
        assert_eq!(map.msi().len(), 5);
        assert_eq!(map.digitizers().len(), 1);
        assert_eq!(map.controls().len(), 2);
        assert!(map.unknowns().is_empty());
        assert_eq!(map.main_digitizer().unwrap().name(), "SIS 3301");
    }

    #[test]
    fn unknown_groups_are_recorded() {
        let faux = FauxLapd::builder()
            .with_unknown_group("Fancy probe")
            .build()
            .unwrap();
        let file = faux.file().unwrap();
        let map = LapdMap::new(&file).unwrap();
        assert_eq!(
            map.unknowns(),
            ["/Raw data + config/Fancy probe".to_string()]
        );
    }

    #[test]
    fn a_broken_device_does_not_break_the_map() {
        let faux = FauxLapd::builder().with_waveform().build().unwrap();
        let file = faux.file().unwrap();
        file.group("Raw data + config/Waveform")
            .unwrap()
            .unlink(ControlMap::DATASET_NAME)
            .unwrap();

        let map = LapdMap::new(&file).unwrap();
        assert!(map.controls().is_empty());
        assert_eq!(map.digitizers().len(), 1);
        assert_eq!(map.unknowns(), ["/Raw data + config/Waveform".to_string()]);
    }

    #[test]
    fn lookups_report_unknown_devices() {
        let faux = FauxLapd::builder().build().unwrap();
        let file = faux.file().unwrap();
        let map = LapdMap::new(&file).unwrap();
        assert!(map.digitizer("SIS 3301").is_ok());
        assert!(matches!(
            map.control("Waveform"),
            Err(MapError::UnknownDevice { .. })
        ));
        assert!(matches!(
            map.msi_diagnostic("Discharge"),
            Err(MapError::UnknownDevice { .. })
        ));
    }
}
