//! Floor partition keys

use serde::{Deserialize, Serialize};

/// Physical floors shown on the building directory, top to bottom.
///
/// The building has no 13th or 4th floor.
pub const BUILDING_FLOORS: [u32; 17] = [19, 18, 17, 16, 15, 14, 12, 11, 10, 9, 8, 7, 6, 5, 3, 2, 1];

/// Partition key for messages.
///
/// Either a physical floor number or [`Floor::GENERAL`], the building-wide
/// discussion area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Floor(u32);

impl Floor {
    /// Sentinel for the general, building-wide discussion.
    pub const GENERAL: Floor = Floor(999);

    /// Create a floor from its raw number.
    pub const fn new(number: u32) -> Self {
        Self(number)
    }

    /// The raw partition value.
    pub const fn number(&self) -> u32 {
        self.0
    }

    /// Whether this is the building-wide discussion area.
    pub fn is_general(&self) -> bool {
        *self == Self::GENERAL
    }

    /// Heading shown at the top of a floor's feed.
    pub fn title(&self) -> String {
        if self.is_general() {
            "General Building Discussion".to_string()
        } else {
            format!("Floor {} Community", self.0)
        }
    }

    /// Compact label used in back buttons and prompts.
    pub fn short_label(&self) -> String {
        if self.is_general() {
            "General".to_string()
        } else {
            format!("Floor {}", self.0)
        }
    }

    /// Every selectable area: general discussion first, then the physical
    /// floors from the top down.
    pub fn directory() -> Vec<Floor> {
        std::iter::once(Self::GENERAL)
            .chain(BUILDING_FLOORS.iter().copied().map(Floor))
            .collect()
    }
}

impl From<u32> for Floor {
    fn from(number: u32) -> Self {
        Self(number)
    }
}

impl std::fmt::Display for Floor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_general_titles() {
        assert!(Floor::GENERAL.is_general());
        assert_eq!(Floor::GENERAL.title(), "General Building Discussion");
        assert_eq!(Floor::GENERAL.short_label(), "General");
        assert_eq!(Floor::new(999), Floor::GENERAL);
    }

    #[test]
    fn test_physical_floor_titles() {
        let floor = Floor::new(3);
        assert!(!floor.is_general());
        assert_eq!(floor.title(), "Floor 3 Community");
        assert_eq!(floor.to_string(), "Floor 3");
    }

    #[test]
    fn test_directory_skips_unlucky_floors() {
        let directory = Floor::directory();
        assert_eq!(directory.len(), 18);
        assert_eq!(directory[0], Floor::GENERAL);
        assert_eq!(directory[1], Floor::new(19));
        assert!(!directory.contains(&Floor::new(13)));
        assert!(!directory.contains(&Floor::new(4)));
    }
}
