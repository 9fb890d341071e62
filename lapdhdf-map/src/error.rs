/// The ways building or querying a device mapping can fail.
///
/// Malformed-but-recognizable structure inside a device group is reported as
/// [`MapError::Mapping`] with the offending group path; recoverable oddities
/// (a stray subgroup, a missing dataset for one channel) are logged as
/// warnings instead and the offending item is dropped from the map.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// An error surfaced by the HDF5 library itself.
    #[error(transparent)]
    Hdf5(#[from] hdf5::Error),
    /// The group exists but could not be interpreted as the device it claims
    /// to be.
    #[error("unable to map '{path}': {why}")]
    Mapping { path: String, why: String },
    /// A device of the given kind is not present in the mapping.
    #[error("unknown {kind} '{name}'")]
    UnknownDevice { kind: &'static str, name: String },
    /// The named configuration does not exist for the device.
    #[error("'{config}' is not a configuration of '{device}'")]
    UnknownConfig { device: String, config: String },
    /// The named configuration exists but recorded no data.
    #[error("configuration '{config}' of '{device}' is not active")]
    InactiveConfig { device: String, config: String },
    /// No configuration recorded any data, so none can be assumed.
    #[error("'{device}' has no active configuration")]
    NoActiveConfig { device: String },
    /// More than one configuration is active and none was specified.
    #[error("'{device}' has multiple active configurations ({candidates:?}), one must be specified")]
    AmbiguousConfig {
        device: String,
        candidates: Vec<String>,
    },
    /// The requested adc is not an adc of the digitizer.
    #[error("'{adc}' is not an adc of digitizer '{device}'")]
    UnknownAdc { device: String, adc: String },
    /// The board/channel combination is not connected under the
    /// configuration.
    #[error("board {board}, channel {channel} is not connected under configuration '{config}'")]
    NotConnected {
        config: String,
        board: u32,
        channel: u32,
    },
}

impl MapError {
    pub(crate) fn mapping(path: impl Into<String>, why: impl Into<String>) -> Self {
        Self::Mapping {
            path: path.into(),
            why: why.into(),
        }
    }
}
