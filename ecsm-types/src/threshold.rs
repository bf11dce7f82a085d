//! Threshold vocabulary of the actuation engine.
use postcard::experimental::max_size::MaxSize;
use serde::{Deserialize, Serialize};

/// A press or release reference point of a key.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, MaxSize, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Threshold {
    /// Fixed sensor value
    Static(u16),
    /// Distance from the key's tracked extremum
    Dynamic(u16),
}

impl Threshold {
    pub const fn is_dynamic(&self) -> bool {
        matches!(self, Threshold::Dynamic(_))
    }

    /// The raw value carried by the threshold, either a level or a delta.
    pub const fn value(&self) -> u16 {
        match self {
            Threshold::Static(v) | Threshold::Dynamic(v) => *v,
        }
    }
}

/// Actuation and release references of one key.
///
/// The two references are independent, a key can actuate at a static level
/// and release dynamically, or the other way around.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, MaxSize, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActuationProfile {
    pub actuation: Threshold,
    pub release: Threshold,
}

impl ActuationProfile {
    pub const fn new(actuation: Threshold, release: Threshold) -> Self {
        Self { actuation, release }
    }

    pub const fn fixed(actuation: u16, release: u16) -> Self {
        Self::new(Threshold::Static(actuation), Threshold::Static(release))
    }

    pub const fn rapid(actuation_delta: u16, release_delta: u16) -> Self {
        Self::new(Threshold::Dynamic(actuation_delta), Threshold::Dynamic(release_delta))
    }
}

/// Message which replaces the profile of a single key.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, MaxSize, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyProfileUpdate {
    pub row: u8,
    pub col: u8,
    pub profile: ActuationProfile,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_profile_update_wire_size() {
        let update = KeyProfileUpdate {
            row: 2,
            col: 14,
            profile: ActuationProfile::new(Threshold::Static(550), Threshold::Dynamic(40)),
        };
        let mut buf = [0u8; KeyProfileUpdate::POSTCARD_MAX_SIZE];
        let used = postcard::to_slice(&update, &mut buf).unwrap();
        assert!(used.len() <= KeyProfileUpdate::POSTCARD_MAX_SIZE);
        let decoded: KeyProfileUpdate = postcard::from_bytes(used).unwrap();
        assert_eq!(decoded, update);
    }

    #[test]
    fn test_threshold_value() {
        assert_eq!(Threshold::Static(550).value(), 550);
        assert!(Threshold::Dynamic(20).is_dynamic());
        assert!(!ActuationProfile::fixed(100, 80).release.is_dynamic());
    }
}
