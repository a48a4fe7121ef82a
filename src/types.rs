//! Game-domain value types carried through the codec as extensions.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// A 2D vector of `f32` components.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };
    pub const ONE: Vector2 = Vector2 { x: 1.0, y: 1.0 };

    pub fn new(x: f32, y: f32) -> Vector2 {
        Vector2 { x, y }
    }
}

/// A 3D vector of `f32` components. X is forward, Z is up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    pub const ONE: Vector3 = Vector3 {
        x: 1.0,
        y: 1.0,
        z: 1.0,
    };
    pub const FORWARD: Vector3 = Vector3 {
        x: 1.0,
        y: 0.0,
        z: 0.0,
    };
    pub const RIGHT: Vector3 = Vector3 {
        x: 0.0,
        y: 1.0,
        z: 0.0,
    };
    pub const UP: Vector3 = Vector3 {
        x: 0.0,
        y: 0.0,
        z: 1.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Vector3 {
        Vector3 { x, y, z }
    }
}

/// A 4D vector of `f32` components.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vector4 {
    pub const ZERO: Vector4 = Vector4 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 0.0,
    };
    pub const ONE: Vector4 = Vector4 {
        x: 1.0,
        y: 1.0,
        z: 1.0,
        w: 1.0,
    };

    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Vector4 {
        Vector4 { x, y, z, w }
    }
}

/// An Euler rotation in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Rotation {
    pub const ZERO: Rotation = Rotation {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Rotation {
        Rotation { x, y, z }
    }
}

/// An RGBA color with 8-bit channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const GRAY: Color = Color::rgb(128, 128, 128);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const CYAN: Color = Color::rgb(0, 255, 255);
    pub const MAGENTA: Color = Color::rgb(255, 0, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const ORANGE: Color = Color::rgb(255, 165, 0);
    pub const PURPLE: Color = Color::rgb(128, 0, 128);
    pub const BROWN: Color = Color::rgb(165, 42, 42);
    pub const PINK: Color = Color::rgb(255, 192, 203);
    pub const TAN: Color = Color::rgb(210, 180, 140);
    pub const RUBY: Color = Color::rgb(224, 17, 95);
    pub const EMERALD: Color = Color::rgb(80, 200, 120);
    pub const SAPPHIRE: Color = Color::rgb(15, 82, 186);
    pub const SILVER: Color = Color::rgb(192, 192, 192);
    pub const SMOKE: Color = Color::rgb(245, 245, 245);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Color {
        Color { r, g, b, a }
    }

    /// An opaque color from its RGB channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color { r, g, b, a: 255 }
    }
}

fn player_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("^[0-9a-f]{32}$").unwrap())
}

fn object_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("^[0-9A-F]{16}$").unwrap())
}

/// A reference to a player, held as the host's player-id string.
///
/// Ids that are exactly 32 lowercase hex characters have a 16-byte packed
/// form; anything else travels as the verbatim string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    id: String,
}

impl PlayerRef {
    pub fn new(id: impl Into<String>) -> PlayerRef {
        PlayerRef { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The two big-endian halves of the id, if the id provably survives the
    /// round trip through them.
    pub fn packed(&self) -> Option<(u64, u64)> {
        if !player_id_regex().is_match(&self.id) {
            return None;
        }
        let hi = u64::from_str_radix(&self.id[..16], 16).ok()?;
        let lo = u64::from_str_radix(&self.id[16..], 16).ok()?;
        Some((hi, lo))
    }

    pub fn from_packed(hi: u64, lo: u64) -> PlayerRef {
        PlayerRef {
            id: format!("{:016x}{:016x}", hi, lo),
        }
    }
}

impl fmt::Display for PlayerRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// A reference to a placed object, held as the host's reference-id string.
///
/// The empty id is the unassigned reference. Ids that are exactly 16
/// uppercase hex characters have an 8-byte packed form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    id: String,
}

impl ObjectRef {
    pub const UNASSIGNED: ObjectRef = ObjectRef { id: String::new() };

    pub fn new(id: impl Into<String>) -> ObjectRef {
        ObjectRef { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_unassigned(&self) -> bool {
        self.id.is_empty()
    }

    /// The id as a big-endian word, if the id provably survives the round
    /// trip through it.
    pub fn packed(&self) -> Option<u64> {
        if !object_id_regex().is_match(&self.id) {
            return None;
        }
        u64::from_str_radix(&self.id, 16).ok()
    }

    pub fn from_packed(word: u64) -> ObjectRef {
        ObjectRef {
            id: format!("{:016X}", word),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_packing() {
        let p = PlayerRef::new("52e2395cd7cf4e9f8f31d767c4822222");
        let (hi, lo) = p.packed().unwrap();
        assert_eq!(PlayerRef::from_packed(hi, lo), p);

        // Uppercase, short, and decorated ids have no packed form.
        assert!(PlayerRef::new("52E2395CD7CF4E9F8F31D767C4822222")
            .packed()
            .is_none());
        assert!(PlayerRef::new("52e2395c").packed().is_none());
        assert!(PlayerRef::new("").packed().is_none());
    }

    #[test]
    fn object_packing() {
        let o = ObjectRef::new("8D4B561900000092");
        assert_eq!(ObjectRef::from_packed(o.packed().unwrap()), o);

        assert!(ObjectRef::new("8d4b561900000092").packed().is_none());
        assert!(ObjectRef::new("8D4B561900000092:Cube").packed().is_none());
        assert!(ObjectRef::UNASSIGNED.packed().is_none());
        assert!(ObjectRef::UNASSIGNED.is_unassigned());
        assert!(!o.is_unassigned());
    }

    #[test]
    fn named_constants() {
        assert_eq!(Color::WHITE, Color::new(255, 255, 255, 255));
        assert_eq!(Color::TRANSPARENT.a, 0);
        assert_eq!(Vector3::UP, Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(Vector3::FORWARD.x, 1.0);
        assert_eq!(Rotation::ZERO, Rotation::default());
    }
}
