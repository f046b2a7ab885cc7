//! Storage keys shared with existing on-device data.

pub const MAINTENANCE_CATEGORIES: &str = "maintenanceCategories";
pub const MAINTENANCE_HISTORY: &str = "maintenanceHistory";
pub const CURRENT_MILEAGE: &str = "maintenanceCurrentMileage";
pub const CHECKLIST: &str = "checklistData";
pub const REPLACE_HISTORY: &str = "replaceHistory";

/// Keys are plain identifiers so they map safely onto file names.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_validation() {
        assert!(is_valid_key(MAINTENANCE_CATEGORIES));
        assert!(is_valid_key("fuel_efficiency-2"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("../etc/passwd"));
        assert!(!is_valid_key("a b"));
    }
}
