//! The well-known-constant table carried under extension tag 40.
//!
//! The forward direction (selector → value) is the source of truth; the
//! reverse lookup walks the selector list so the two can never disagree.

use crate::{
    types::{Color, ObjectRef, Rotation, Vector2, Vector3, Vector4},
    value::Value,
};

/// Every assigned selector, in table order.
const SELECTORS: [u8; 30] = [
    0, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 40, 41,
    51, 52, 53, 54, 55, 60, 61,
];

const ROTATION_ZERO_SELECTOR: u8 = 70;

/// The value a selector stands for, or `None` for an unassigned selector.
pub(crate) fn constant_value(selector: u8) -> Option<Value> {
    let value = match selector {
        0 => Value::Object(ObjectRef::UNASSIGNED),
        10 => Value::Color(Color::WHITE),
        11 => Value::Color(Color::GRAY),
        12 => Value::Color(Color::BLACK),
        13 => Value::Color(Color::TRANSPARENT),
        14 => Value::Color(Color::RED),
        15 => Value::Color(Color::GREEN),
        16 => Value::Color(Color::BLUE),
        17 => Value::Color(Color::CYAN),
        18 => Value::Color(Color::MAGENTA),
        19 => Value::Color(Color::YELLOW),
        20 => Value::Color(Color::ORANGE),
        21 => Value::Color(Color::PURPLE),
        22 => Value::Color(Color::BROWN),
        23 => Value::Color(Color::PINK),
        24 => Value::Color(Color::TAN),
        25 => Value::Color(Color::RUBY),
        26 => Value::Color(Color::EMERALD),
        27 => Value::Color(Color::SAPPHIRE),
        28 => Value::Color(Color::SILVER),
        29 => Value::Color(Color::SMOKE),
        40 => Value::Vector2(Vector2::ONE),
        41 => Value::Vector2(Vector2::ZERO),
        51 => Value::Vector3(Vector3::ONE),
        52 => Value::Vector3(Vector3::ZERO),
        53 => Value::Vector3(Vector3::FORWARD),
        54 => Value::Vector3(Vector3::UP),
        55 => Value::Vector3(Vector3::RIGHT),
        60 => Value::Vector4(Vector4::ONE),
        61 => Value::Vector4(Vector4::ZERO),
        ROTATION_ZERO_SELECTOR => Value::Rotation(Rotation::ZERO),
        _ => return None,
    };
    Some(value)
}

/// The selector for a value, when that value has one. Only kinds that appear
/// in the table are worth probing; everything else short-circuits.
pub(crate) fn constant_selector(value: &Value) -> Option<u8> {
    match value {
        Value::Object(o) if !o.is_unassigned() => return None,
        Value::Object(_) => return Some(0),
        Value::Rotation(_) => {
            return (constant_value(ROTATION_ZERO_SELECTOR).as_ref() == Some(value))
                .then_some(ROTATION_ZERO_SELECTOR)
        }
        Value::Color(_) | Value::Vector2(_) | Value::Vector3(_) | Value::Vector4(_) => {}
        _ => return None,
    }
    SELECTORS
        .iter()
        .copied()
        .find(|&sel| constant_value(sel).as_ref() == Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_selector_round_trips() {
        let mut assigned = SELECTORS.to_vec();
        assigned.push(ROTATION_ZERO_SELECTOR);
        for sel in assigned {
            let value = constant_value(sel).unwrap();
            assert_eq!(constant_selector(&value), Some(sel), "selector {}", sel);
        }
    }

    #[test]
    fn near_misses_have_no_selector() {
        assert_eq!(constant_selector(&Value::Color(Color::rgb(1, 0, 0))), None);
        assert_eq!(
            constant_selector(&Value::Vector3(Vector3::new(0.0, 1.0, 1.0))),
            None
        );
        assert_eq!(
            constant_selector(&Value::Object(ObjectRef::new("8D4B561900000092"))),
            None
        );
        assert_eq!(constant_selector(&Value::from(0i64)), None);
        assert_eq!(
            constant_selector(&Value::Rotation(Rotation::new(0.0, 0.0, 1.0))),
            None
        );
    }

    #[test]
    fn gaps_are_unassigned() {
        for sel in [1, 9, 30, 39, 42, 50, 56, 59, 62, 69, 71, 255] {
            assert!(constant_value(sel).is_none(), "selector {}", sel);
        }
    }
}
