//! Small helpers for string-valued HDF5 attributes.
//!
//! LaPD files store string attributes in a few different flavors depending
//! on the control-system version that wrote them, so reads try the variable
//! length types in order rather than committing to one.

use std::str::FromStr;

use hdf5::types::{VarLenAscii, VarLenUnicode};
use hdf5::Group;

/// Read a string attribute from `group`, tolerating both unicode and ascii
/// storage. Returns `None` when the attribute is absent or not a string.
pub fn read_str_attr(group: &Group, name: &str) -> hdf5::Result<Option<String>> {
    let attr = match group.attr(name) {
        Ok(attr) => attr,
        Err(_) => return Ok(None),
    };
    if let Ok(value) = attr.read_scalar::<VarLenUnicode>() {
        return Ok(Some(value.to_string()));
    }
    if let Ok(value) = attr.read_scalar::<VarLenAscii>() {
        return Ok(Some(value.to_string()));
    }
    Ok(None)
}

/// Write a variable-length unicode string attribute onto `group`.
pub fn write_str_attr(group: &Group, name: &str, value: &str) -> hdf5::Result<()> {
    let value = VarLenUnicode::from_str(value).map_err(|e| hdf5::Error::from(e.to_string()))?;
    group
        .new_attr::<VarLenUnicode>()
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}
