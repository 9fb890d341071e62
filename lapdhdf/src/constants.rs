//! Names and aliases fixed by the LaPD facility.

/// Resolve a user-supplied diagnostic name, case-insensitively and through
/// the short names in common use around the lab, to the group name the
/// control system writes.
pub fn resolve_msi_name(name: &str) -> Option<&'static str> {
    match name.to_lowercase().as_str() {
        "discharge" => Some("Discharge"),
        "gas pressure" | "pressure" | "partial pressure" | "partial pressures" => {
            Some("Gas pressure")
        }
        "heater" => Some("Heater"),
        "interferometer array" | "interferometer" | "interarr" => Some("Interferometer array"),
        "magnetic field" | "b" | "bfield" => Some("Magnetic field"),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn aliases_resolve() {
        assert_eq!(resolve_msi_name("discharge"), Some("Discharge"));
        assert_eq!(resolve_msi_name("Gas Pressure"), Some("Gas pressure"));
        assert_eq!(resolve_msi_name("partial pressures"), Some("Gas pressure"));
        assert_eq!(resolve_msi_name("interarr"), Some("Interferometer array"));
        assert_eq!(resolve_msi_name("bfield"), Some("Magnetic field"));
        assert_eq!(resolve_msi_name("B"), Some("Magnetic field"));
        assert_eq!(resolve_msi_name("langmuir probe"), None);
    }
}
