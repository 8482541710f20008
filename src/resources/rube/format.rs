//! Serde model of a R.U.B.E. scene file.
//!
//! Rube writes Box2D worlds as JSON with a few quirks:
//! * floats are plain numbers or 8 hex digits holding the IEEE-754 bits,
//! * a zero vector is written as the number `0`,
//! * vertex lists are stored as two parallel arrays `{ "x": [..], "y": [..] }`.

use cgmath::Vector2;
use serde::{Deserialize, Deserializer, de};

use crate::error::SampleError;

/// Decode Rube's hex float encoding, e.g. `"3F800000"` is `1.0`.
pub fn parse_hex_float(text: &str) -> Result<f32, SampleError> {
    if text.len() != 8 {
        return Err(SampleError::InvalidHexFloat(text.to_string()));
    }
    u32::from_str_radix(text, 16)
        .map(f32::from_bits)
        .map_err(|_| SampleError::InvalidHexFloat(text.to_string()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFloat {
    Number(f32),
    Hex(String),
}

impl RawFloat {
    fn value(self) -> Result<f32, SampleError> {
        match self {
            RawFloat::Number(n) => Ok(n),
            RawFloat::Hex(text) => parse_hex_float(&text),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RubeFloat(pub f32);

impl<'de> Deserialize<'de> for RubeFloat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawFloat::deserialize(deserializer)?
            .value()
            .map(RubeFloat)
            .map_err(de::Error::custom)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawVec {
    Point { x: RubeFloat, y: RubeFloat },
    Zero(f32),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RubeVec(pub Vector2<f32>);

impl Default for RubeVec {
    fn default() -> Self {
        RubeVec(Vector2::new(0.0, 0.0))
    }
}

impl<'de> Deserialize<'de> for RubeVec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawVec::deserialize(deserializer)? {
            RawVec::Point { x, y } => Ok(RubeVec(Vector2::new(x.0, y.0))),
            RawVec::Zero(n) if n == 0.0 => Ok(RubeVec::default()),
            RawVec::Zero(n) => Err(de::Error::custom(format!(
                "expected a vector or 0, found {}",
                n
            ))),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct RubeVertices {
    #[serde(default)]
    pub x: Vec<RubeFloat>,
    #[serde(default)]
    pub y: Vec<RubeFloat>,
}

impl RubeVertices {
    pub fn points(&self) -> Result<Vec<Vector2<f32>>, SampleError> {
        if self.x.len() != self.y.len() {
            return Err(SampleError::MismatchedVertices {
                xs: self.x.len(),
                ys: self.y.len(),
            });
        }
        Ok(self
            .x
            .iter()
            .zip(self.y.iter())
            .map(|(x, y)| Vector2::new(x.0, y.0))
            .collect())
    }
}

fn one() -> RubeFloat {
    RubeFloat(1.0)
}

fn yes() -> bool {
    true
}

fn default_steps() -> RubeFloat {
    RubeFloat(60.0)
}

fn default_gravity() -> RubeVec {
    RubeVec(Vector2::new(0.0, -10.0))
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RubeWorld {
    #[serde(default = "default_gravity")]
    pub gravity: RubeVec,
    #[serde(default = "yes")]
    pub allow_sleep: bool,
    #[serde(default)]
    pub velocity_iterations: u32,
    #[serde(default = "default_steps")]
    pub steps_per_second: RubeFloat,
    #[serde(default)]
    pub body: Vec<RubeBody>,
    #[serde(default)]
    pub joint: Vec<RubeJoint>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RubeBodyType {
    #[default]
    Static,
    Kinematic,
    Dynamic,
}

impl<'de> Deserialize<'de> for RubeBodyType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(RubeBodyType::Static),
            1 => Ok(RubeBodyType::Kinematic),
            2 => Ok(RubeBodyType::Dynamic),
            other => Err(de::Error::custom(format!("unknown body type {}", other))),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RubeBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub body_type: RubeBodyType,
    #[serde(default)]
    pub position: RubeVec,
    #[serde(default)]
    pub angle: RubeFloat,
    #[serde(default)]
    pub linear_velocity: RubeVec,
    #[serde(default)]
    pub angular_velocity: RubeFloat,
    #[serde(default)]
    pub linear_damping: RubeFloat,
    #[serde(default)]
    pub angular_damping: RubeFloat,
    #[serde(default = "one")]
    pub gravity_scale: RubeFloat,
    #[serde(default)]
    pub bullet: bool,
    #[serde(default)]
    pub fixed_rotation: bool,
    #[serde(default = "yes")]
    pub awake: bool,
    #[serde(default)]
    pub fixture: Vec<RubeFixture>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RubeCircle {
    #[serde(default)]
    pub center: RubeVec,
    pub radius: RubeFloat,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RubePolygon {
    #[serde(default)]
    pub vertices: RubeVertices,
}

fn default_category() -> u32 {
    0x0001
}

fn default_mask() -> u32 {
    0xFFFF
}

#[derive(Clone, Debug, Deserialize)]
pub struct RubeFixture {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub density: RubeFloat,
    #[serde(default)]
    pub friction: RubeFloat,
    #[serde(default)]
    pub restitution: RubeFloat,
    #[serde(default)]
    pub sensor: bool,
    #[serde(rename = "filter-categoryBits", default = "default_category")]
    pub category_bits: u32,
    #[serde(rename = "filter-maskBits", default = "default_mask")]
    pub mask_bits: u32,
    #[serde(rename = "filter-groupIndex", default)]
    pub group_index: i32,
    #[serde(default)]
    pub circle: Option<RubeCircle>,
    #[serde(default)]
    pub polygon: Option<RubePolygon>,
    #[serde(default)]
    pub chain: Option<RubePolygon>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RubeJoint {
    #[serde(rename = "type")]
    pub joint_type: String,
    #[serde(default)]
    pub name: Option<String>,
    pub body_a: usize,
    pub body_b: usize,
    #[serde(default)]
    pub anchor_a: RubeVec,
    #[serde(default)]
    pub anchor_b: RubeVec,
    #[serde(default)]
    pub collide_connected: bool,
    #[serde(default)]
    pub local_axis_a: RubeVec,
    #[serde(default)]
    pub ref_angle: RubeFloat,
    #[serde(default)]
    pub enable_limit: bool,
    #[serde(default)]
    pub lower_limit: RubeFloat,
    #[serde(default)]
    pub upper_limit: RubeFloat,
    #[serde(default)]
    pub enable_motor: bool,
    #[serde(default)]
    pub motor_speed: RubeFloat,
    #[serde(default)]
    pub max_motor_torque: RubeFloat,
    #[serde(default)]
    pub max_motor_force: RubeFloat,
    #[serde(default)]
    pub length: RubeFloat,
    #[serde(default)]
    pub frequency: RubeFloat,
    #[serde(default)]
    pub damping_ratio: RubeFloat,
    #[serde(default)]
    pub max_length: RubeFloat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_floats_decode_to_their_bits() {
        assert_eq!(parse_hex_float("3F800000").unwrap(), 1.0);
        assert_eq!(parse_hex_float("C1200000").unwrap(), -10.0);
        assert!(parse_hex_float("3F80").is_err());
        assert!(parse_hex_float("nothex!!").is_err());
    }

    #[test]
    fn floats_accept_numbers_and_hex() {
        let values: Vec<RubeFloat> = serde_json::from_str(r#"[2.5, "40000000"]"#).unwrap();
        assert_eq!(values, vec![RubeFloat(2.5), RubeFloat(2.0)]);
    }

    #[test]
    fn zero_is_the_zero_vector() {
        let v: RubeVec = serde_json::from_str("0").unwrap();
        assert_eq!(v.0, Vector2::new(0.0, 0.0));
        let v: RubeVec = serde_json::from_str(r#"{"x": 1.5, "y": "3F800000"}"#).unwrap();
        assert_eq!(v.0, Vector2::new(1.5, 1.0));
        assert!(serde_json::from_str::<RubeVec>("3").is_err());
    }

    #[test]
    fn vertex_lists_need_matching_lengths() {
        let ok: RubeVertices = serde_json::from_str(r#"{"x": [0, 1, 1], "y": [0, 0, 1]}"#).unwrap();
        assert_eq!(ok.points().unwrap().len(), 3);
        let bad: RubeVertices = serde_json::from_str(r#"{"x": [0, 1], "y": [0]}"#).unwrap();
        assert!(matches!(
            bad.points(),
            Err(SampleError::MismatchedVertices { xs: 2, ys: 1 })
        ));
    }
}
