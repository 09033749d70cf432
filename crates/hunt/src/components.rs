//! Adapter between [`OrbData`] and the host's opaque per-item component bag.
//!
//! The host engine persists item state as a string-keyed bag of primitive
//! values. This module is the only place that touches raw keys; everything
//! else in the crate works on the typed struct. Absent keys decode to the
//! zero value, which models a never-touched item without explicit
//! initialization.

use crate::encoding::{DigitMask, RuneMask};
use crate::orb::{OrbData, OrbState, X_DIGIT_COUNT, Y_DIGIT_COUNT, Z_DIGIT_COUNT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A primitive value in the component bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ComponentValue {
    /// Integer-valued component.
    Int(i64),
    /// Text-valued component.
    Text(String),
}

impl ComponentValue {
    fn as_int(&self) -> Option<i64> {
        match self {
            ComponentValue::Int(v) => Some(*v),
            ComponentValue::Text(_) => None,
        }
    }

    fn as_text(&self) -> Option<&str> {
        match self {
            ComponentValue::Text(v) => Some(v),
            ComponentValue::Int(_) => None,
        }
    }
}

/// String-keyed component bag, as the host persists it.
pub type ComponentBag = BTreeMap<String, ComponentValue>;

const KEY_STATE: &str = "orb_state";
const KEY_KILL_COUNT: &str = "orb_kill_count";
const KEY_REVEALED_RUNES: &str = "orb_revealed_runes";
const KEY_X_DIGITS: &str = "orb_x_digits";
const KEY_Y_DIGITS: &str = "orb_y_digits";
const KEY_Z_DIGITS: &str = "orb_z_digits";
const KEY_PROXIMITY: &str = "orb_proximity";
const KEY_FATHOM_MARK: &str = "orb_fathom_mark";
const KEY_EDITION: &str = "orb_edition";

impl OrbData {
    /// Serialize to the component bag. Zero-valued fields are omitted so a
    /// fresh orb round-trips to an empty bag.
    pub fn to_components(&self) -> ComponentBag {
        let mut bag = ComponentBag::new();

        if self.state != OrbState::Empty {
            bag.insert(KEY_STATE.into(), ComponentValue::Int(self.state.to_value()));
        }
        if self.kill_count != 0 {
            bag.insert(
                KEY_KILL_COUNT.into(),
                ComponentValue::Int(self.kill_count as i64),
            );
        }
        if self.runes.bits() != 0 {
            bag.insert(
                KEY_REVEALED_RUNES.into(),
                ComponentValue::Int(self.runes.bits() as i64),
            );
        }
        if self.x_digits.bits() != 0 {
            bag.insert(
                KEY_X_DIGITS.into(),
                ComponentValue::Int(self.x_digits.bits() as i64),
            );
        }
        if self.y_digits.bits() != 0 {
            bag.insert(
                KEY_Y_DIGITS.into(),
                ComponentValue::Int(self.y_digits.bits() as i64),
            );
        }
        if self.z_digits.bits() != 0 {
            bag.insert(
                KEY_Z_DIGITS.into(),
                ComponentValue::Int(self.z_digits.bits() as i64),
            );
        }
        if self.proximity != 0 {
            bag.insert(
                KEY_PROXIMITY.into(),
                ComponentValue::Int(self.proximity as i64),
            );
        }
        if let Some(mark) = &self.fathom_mark {
            bag.insert(KEY_FATHOM_MARK.into(), ComponentValue::Text(mark.clone()));
        }
        if let Some(edition) = self.edition {
            bag.insert(KEY_EDITION.into(), ComponentValue::Int(edition as i64));
        }

        bag
    }

    /// Deserialize from a component bag, defaulting absent fields.
    pub fn from_components(bag: &ComponentBag) -> Self {
        let int = |key: &str| bag.get(key).and_then(ComponentValue::as_int).unwrap_or(0);

        Self {
            state: OrbState::from_value(int(KEY_STATE)),
            kill_count: int(KEY_KILL_COUNT).max(0) as u32,
            runes: RuneMask::from_bits(int(KEY_REVEALED_RUNES).max(0) as u32),
            x_digits: DigitMask::from_bits(int(KEY_X_DIGITS).max(0) as u16, X_DIGIT_COUNT),
            y_digits: DigitMask::from_bits(int(KEY_Y_DIGITS).max(0) as u16, Y_DIGIT_COUNT),
            z_digits: DigitMask::from_bits(int(KEY_Z_DIGITS).max(0) as u16, Z_DIGIT_COUNT),
            proximity: int(KEY_PROXIMITY).clamp(0, 4) as u8,
            fathom_mark: bag
                .get(KEY_FATHOM_MARK)
                .and_then(ComponentValue::as_text)
                .map(str::to_string),
            edition: match int(KEY_EDITION) {
                v if v > 0 => Some(v as u32),
                _ => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HuntConfig;

    #[test]
    fn empty_bag_decodes_to_fresh_orb() {
        let bag = ComponentBag::new();
        assert_eq!(OrbData::from_components(&bag), OrbData::new());
    }

    #[test]
    fn fresh_orb_encodes_to_empty_bag() {
        assert!(OrbData::new().to_components().is_empty());
    }

    #[test]
    fn progressed_orb_roundtrips() {
        let config = HuntConfig::default();
        let mut orb = OrbData::new();
        for _ in 0..12 {
            orb.on_battle_won(&config);
        }
        orb.reveal_x_digit(0, true);
        orb.reveal_x_digit(2, false);
        orb.reveal_all_z();
        orb.proximity = 2;

        let decoded = OrbData::from_components(&orb.to_components());
        assert_eq!(decoded, orb);
    }

    #[test]
    fn trophy_orb_roundtrips_edition() {
        let mut orb = OrbData::new();
        orb.edition = Some(3);
        orb.fathom_mark = Some("II below".into());

        let bag = orb.to_components();
        assert_eq!(bag.get("orb_edition"), Some(&ComponentValue::Int(3)));
        assert_eq!(OrbData::from_components(&bag), orb);
    }

    #[test]
    fn malformed_values_decode_to_defaults() {
        let mut bag = ComponentBag::new();
        bag.insert("orb_state".into(), ComponentValue::Text("junk".into()));
        bag.insert("orb_edition".into(), ComponentValue::Int(-5));

        let orb = OrbData::from_components(&bag);
        assert_eq!(orb.state, OrbState::Empty);
        assert_eq!(orb.edition, None);
    }
}
