//! Press/release decision of a single analog key.
//!
//! Every key is a two state machine, released or pressed. A key leaves its state when
//! the reading crosses the configured reference: either a static level, or a delta from
//! the extremum tracked since the last transition.
use ecsm_types::threshold::{ActuationProfile, Threshold};

use crate::calibration::KeyCalibration;

/// Decide the next state of a key from one reading.
///
/// Returns the new pressed state if the key changed its state, `None` otherwise.
/// The extremum of `cal` is updated in both cases.
pub fn decide(cal: &mut KeyCalibration, profile: &ActuationProfile, pressed: bool, reading: u16) -> Option<bool> {
    let clamped = cal.clamp(reading);

    if !pressed {
        let actuated = reading >= cal.deadzone
            && match profile.actuation {
                Threshold::Static(level) => reading > level,
                Threshold::Dynamic(delta) => reading > cal.extremum.saturating_add(delta),
            };
        if actuated {
            cal.extremum = clamped;
            return Some(true);
        }
        if clamped < cal.extremum {
            cal.extremum = clamped;
        }
    } else {
        let released = reading < cal.deadzone
            || match profile.release {
                Threshold::Static(level) => reading < level,
                Threshold::Dynamic(delta) => reading.saturating_add(delta) < cal.extremum,
            };
        if released {
            cal.extremum = clamped;
            return Some(false);
        }
        if clamped > cal.extremum {
            cal.extremum = clamped;
        }
    }

    None
}
