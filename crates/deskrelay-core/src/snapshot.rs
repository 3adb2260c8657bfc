//! The Control Snapshot wire model.
//!
//! A viewer describes its input state as a JSON object posted to the relay:
//!
//! ```json
//! {
//!   "mouse": { "x": 0.25, "y": 0.5, "buttons": 1, "wheel": { "y": 3 } },
//!   "keys":  [ { "key": "a", "code": "KeyA", "keyCode": 65 } ],
//!   "time":  1718000000000
//! }
//! ```
//!
//! The snapshot is *state*, not a list of events: `buttons` and `keys` say
//! what is held right now, and the host diffs consecutive snapshots to work
//! out which presses and releases to inject.  The only exception is
//! `wheel.y`, a one-shot count of notches scrolled since the previous
//! snapshot.
//!
//! # Lenient decoding
//!
//! Decoding never rejects a well-formed JSON object because of a bad field.
//! A non-numeric coordinate, button mask or wheel value decodes as absent,
//! and a key entry that is neither an object nor a string is dropped.  The
//! replay engine skips only the sub-update whose data is missing, so a
//! viewer bug in one field cannot stall the others.
//!
//! # Who sets `time`?
//!
//! Only the relay.  It stamps `time` at the moment it accepts the POST and
//! overwrites anything the viewer sent, so every freshness comparison the
//! host makes is against one clock.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Largest wheel step count applied from one snapshot, in either direction.
pub const MAX_WHEEL_STEPS: i32 = 20;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors that can occur while decoding a control snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The body is not valid JSON.
    #[error("control snapshot is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// The body is valid JSON but not an object.
    #[error("control snapshot must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

// ── Mouse buttons ─────────────────────────────────────────────────────────────

/// A mouse button, identified by its bit in the snapshot's `buttons` mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
}

impl MouseButton {
    /// All buttons in bit order.
    pub const ALL: [MouseButton; 5] = [
        MouseButton::Left,
        MouseButton::Right,
        MouseButton::Middle,
        MouseButton::Back,
        MouseButton::Forward,
    ];

    /// Bit this button occupies in [`ButtonMask`] (DOM `MouseEvent.buttons` order).
    pub fn bit(self) -> u8 {
        match self {
            MouseButton::Left => 1 << 0,
            MouseButton::Right => 1 << 1,
            MouseButton::Middle => 1 << 2,
            MouseButton::Back => 1 << 3,
            MouseButton::Forward => 1 << 4,
        }
    }

    /// X11 core pointer button number.
    ///
    /// X11 numbers middle as 2 and right as 3, the reverse of the DOM bit
    /// order.  Buttons 4–7 are reserved for wheel clicks, so back/forward are
    /// 8 and 9.
    pub fn x11_button(self) -> u8 {
        match self {
            MouseButton::Left => 1,
            MouseButton::Middle => 2,
            MouseButton::Right => 3,
            MouseButton::Back => 8,
            MouseButton::Forward => 9,
        }
    }
}

/// Set of held mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ButtonMask(u8);

impl ButtonMask {
    /// Mask with every defined bit set.
    pub const ALL_BITS: u8 = 0x1F;

    /// No buttons held.
    pub const NONE: ButtonMask = ButtonMask(0);

    /// Builds a mask, discarding bits that do not name a known button.
    pub fn from_bits_truncate(bits: u8) -> Self {
        ButtonMask(bits & Self::ALL_BITS)
    }

    /// Raw bit value.
    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, button: MouseButton) -> bool {
        self.0 & button.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Buttons held in `self` but not in `next`, in bit order.
    pub fn released_in(self, next: ButtonMask) -> impl Iterator<Item = MouseButton> {
        MouseButton::ALL
            .into_iter()
            .filter(move |&b| self.contains(b) && !next.contains(b))
    }

    /// Buttons held in `next` but not in `self`, in bit order.
    pub fn pressed_in(self, next: ButtonMask) -> impl Iterator<Item = MouseButton> {
        MouseButton::ALL
            .into_iter()
            .filter(move |&b| !self.contains(b) && next.contains(b))
    }
}

// ── Keys ──────────────────────────────────────────────────────────────────────

/// One held key as reported by the viewer.
///
/// A key carries up to three identifiers because the two input backends
/// understand different things: `code` is the physical position
/// (`KeyboardEvent.code`, e.g. `"KeyA"`), `key` is the character the
/// viewer's layout produced (`"a"`, `"ü"`, `"Shift"`), and `keyCode` is the
/// legacy numeric code aligned with Windows Virtual Key numbering.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyId {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(rename = "keyCode", default, skip_serializing_if = "Option::is_none")]
    pub key_code: Option<u16>,
}

/// The value two [`KeyId`]s are compared by when diffing held keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyIdentity {
    Code(String),
    KeyCode(u16),
    Key(String),
}

impl KeyId {
    /// A key identified only by its physical position.
    pub fn from_code(code: impl Into<String>) -> Self {
        KeyId {
            code: Some(code.into()),
            ..KeyId::default()
        }
    }

    /// A key identified only by its numeric code.
    pub fn from_key_code(key_code: u16) -> Self {
        KeyId {
            key_code: Some(key_code),
            ..KeyId::default()
        }
    }

    /// Attaches the produced character.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attaches the numeric code.
    pub fn with_key_code(mut self, key_code: u16) -> Self {
        self.key_code = Some(key_code);
        self
    }

    /// Identity used for diffing: physical position first, then numeric
    /// code, then produced character.
    ///
    /// Returns `None` when the key carries no identifier at all.
    pub fn identity(&self) -> Option<KeyIdentity> {
        if let Some(code) = self.code.as_deref().filter(|c| !c.is_empty()) {
            return Some(KeyIdentity::Code(code.to_owned()));
        }
        if let Some(key_code) = self.key_code {
            return Some(KeyIdentity::KeyCode(key_code));
        }
        self.key
            .as_deref()
            .filter(|k| !k.is_empty())
            .map(|k| KeyIdentity::Key(k.to_owned()))
    }

    /// The produced character, if it is exactly one character long.
    pub fn produced_char(&self) -> Option<char> {
        let key = self.key.as_deref()?;
        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }

    fn from_value(value: &Value) -> Option<KeyId> {
        let id = match value {
            Value::String(s) => KeyId::from_code(s.clone()),
            Value::Object(map) => KeyId {
                key: map.get("key").and_then(Value::as_str).map(str::to_owned),
                code: map.get("code").and_then(Value::as_str).map(str::to_owned),
                key_code: map
                    .get("keyCode")
                    .and_then(Value::as_u64)
                    .and_then(|n| u16::try_from(n).ok()),
            },
            _ => return None,
        };
        id.identity().map(|_| id)
    }
}

// ── Mouse state ───────────────────────────────────────────────────────────────

/// Wheel movement since the previous snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Wheel {
    /// Notches scrolled; positive is down (DOM `deltaY` convention).
    pub y: i32,
}

/// Pointer part of a snapshot.  Every field may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MouseState {
    /// Horizontal position normalized to the viewport, nominally 0..=1.
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// Vertical position normalized to the viewport, nominally 0..=1.
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, deserialize_with = "lenient_buttons", skip_serializing_if = "Option::is_none")]
    pub buttons: Option<ButtonMask>,
    #[serde(default, deserialize_with = "lenient_wheel", skip_serializing_if = "Option::is_none")]
    pub wheel: Option<Wheel>,
}

impl MouseState {
    /// Pointer at a normalized position with the given buttons held.
    pub fn at(x: f64, y: f64, buttons: u8) -> Self {
        MouseState {
            x: Some(x),
            y: Some(y),
            buttons: Some(ButtonMask::from_bits_truncate(buttons)),
            wheel: None,
        }
    }

    /// Both coordinates, if both are present.
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.x?, self.y?))
    }

    /// Wheel notches clamped to ±[`MAX_WHEEL_STEPS`]; zero when absent.
    pub fn wheel_steps(&self) -> i32 {
        self.wheel
            .map(|w| w.y.clamp(-MAX_WHEEL_STEPS, MAX_WHEEL_STEPS))
            .unwrap_or(0)
    }
}

// ── Snapshot ──────────────────────────────────────────────────────────────────

/// Input state of one viewer at one instant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlSnapshot {
    #[serde(default, deserialize_with = "lenient_mouse", skip_serializing_if = "Option::is_none")]
    pub mouse: Option<MouseState>,
    /// Keys held; `None` means the snapshot says nothing about keys.
    #[serde(default, deserialize_with = "lenient_keys", skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<KeyId>>,
    /// Epoch milliseconds, stamped by the relay at ingestion.
    #[serde(default, deserialize_with = "lenient_u64", skip_serializing_if = "Option::is_none")]
    pub time: Option<u64>,
    #[serde(default, deserialize_with = "lenient_bool", skip_serializing_if = "Option::is_none")]
    pub wake: Option<bool>,
    #[serde(default, deserialize_with = "lenient_u64", skip_serializing_if = "Option::is_none")]
    pub wake_tick: Option<u64>,
}

impl ControlSnapshot {
    /// Decodes a snapshot from a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::InvalidJson`] if `bytes` is not JSON and
    /// [`SnapshotError::NotAnObject`] for any other JSON value (the derived
    /// deserializer would otherwise read `[]` as an empty snapshot).  Bad
    /// individual fields are not errors.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let value: Value = serde_json::from_slice(bytes)?;
        let kind = match &value {
            Value::Object(_) => return Ok(serde_json::from_value(value)?),
            Value::Array(_) => "an array",
            Value::String(_) => "a string",
            Value::Number(_) => "a number",
            Value::Bool(_) => "a boolean",
            Value::Null => "null",
        };
        Err(SnapshotError::NotAnObject(kind))
    }

    /// The snapshot a viewer sends when it closes: nothing held, no wheel.
    pub fn neutral() -> Self {
        ControlSnapshot {
            mouse: Some(MouseState {
                x: None,
                y: None,
                buttons: Some(ButtonMask::NONE),
                wheel: Some(Wheel { y: 0 }),
            }),
            keys: Some(Vec::new()),
            ..ControlSnapshot::default()
        }
    }

    /// A liveness-only snapshot carrying no input state.
    pub fn heartbeat(tick: u64) -> Self {
        ControlSnapshot {
            wake: Some(true),
            wake_tick: Some(tick),
            ..ControlSnapshot::default()
        }
    }

    /// Returns `true` if this snapshot only signals liveness.
    pub fn is_heartbeat(&self) -> bool {
        self.wake.is_some() && self.mouse.is_none() && self.keys.is_none()
    }
}

// ── Lenient field decoders ────────────────────────────────────────────────────

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(v.as_f64().filter(|f| f.is_finite()))
}

fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(v.as_u64())
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(v.as_bool())
}

fn lenient_buttons<'de, D: Deserializer<'de>>(d: D) -> Result<Option<ButtonMask>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(v.as_u64()
        .map(|n| ButtonMask::from_bits_truncate((n & u64::from(ButtonMask::ALL_BITS)) as u8)))
}

fn lenient_wheel<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Wheel>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(v.get("y")
        .and_then(Value::as_f64)
        .filter(|f| f.is_finite())
        .map(|f| Wheel {
            y: f.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32,
        }))
}

fn lenient_mouse<'de, D: Deserializer<'de>>(d: D) -> Result<Option<MouseState>, D::Error> {
    let v = Value::deserialize(d)?;
    if !v.is_object() {
        return Ok(None);
    }
    Ok(serde_json::from_value(v).ok())
}

fn lenient_keys<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<KeyId>>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(v.as_array()
        .map(|items| items.iter().filter_map(KeyId::from_value).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> ControlSnapshot {
        ControlSnapshot::from_slice(json.as_bytes()).expect("object decodes")
    }

    #[test]
    fn test_full_snapshot_decodes() {
        // Arrange
        let json = r#"{
            "mouse": {"x": 0.25, "y": 0.75, "buttons": 5, "wheel": {"y": -2}},
            "keys": [{"key": "a", "code": "KeyA", "keyCode": 65}],
            "time": 1700000000000
        }"#;

        // Act
        let snap = decode(json);

        // Assert
        let mouse = snap.mouse.unwrap();
        assert_eq!(mouse.position(), Some((0.25, 0.75)));
        assert!(mouse.buttons.unwrap().contains(MouseButton::Left));
        assert!(mouse.buttons.unwrap().contains(MouseButton::Middle));
        assert!(!mouse.buttons.unwrap().contains(MouseButton::Right));
        assert_eq!(mouse.wheel_steps(), -2);
        let keys = snap.keys.unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].code.as_deref(), Some("KeyA"));
        assert_eq!(keys[0].key_code, Some(65));
        assert_eq!(snap.time, Some(1_700_000_000_000));
    }

    #[test]
    fn test_non_numeric_coordinates_decode_as_absent() {
        let snap = decode(r#"{"mouse": {"x": "left", "y": null, "buttons": 1}}"#);
        let mouse = snap.mouse.unwrap();
        assert_eq!(mouse.x, None);
        assert_eq!(mouse.y, None);
        assert_eq!(mouse.position(), None);
        // The button mask in the same object is unaffected.
        assert_eq!(mouse.buttons, Some(ButtonMask::from_bits_truncate(1)));
    }

    #[test]
    fn test_mouse_that_is_not_an_object_is_dropped() {
        let snap = decode(r#"{"mouse": 12, "keys": []}"#);
        assert!(snap.mouse.is_none());
        assert_eq!(snap.keys, Some(vec![]));
    }

    #[test]
    fn test_invalid_key_entries_are_dropped_and_strings_accepted() {
        // Arrange
        let json = r#"{"keys": ["ShiftLeft", 7, null, {}, {"keyCode": 65}, {"key": "ü"}]}"#;

        // Act
        let keys = decode(json).keys.unwrap();

        // Assert
        assert_eq!(
            keys,
            vec![
                KeyId::from_code("ShiftLeft"),
                KeyId::from_key_code(65),
                KeyId::default().with_key("ü"),
            ]
        );
    }

    #[test]
    fn test_keys_that_are_not_an_array_decode_as_absent() {
        assert_eq!(decode(r#"{"keys": "KeyA"}"#).keys, None);
    }

    #[test]
    fn test_unknown_button_bits_are_discarded() {
        let snap = decode(r#"{"mouse": {"buttons": 255}}"#);
        assert_eq!(snap.mouse.unwrap().buttons.unwrap().bits(), ButtonMask::ALL_BITS);
    }

    #[test]
    fn test_non_object_body_is_an_error() {
        assert!(ControlSnapshot::from_slice(b"[1,2]").is_err());
        assert!(ControlSnapshot::from_slice(b"not json").is_err());
    }

    #[test]
    fn test_json_values_other_than_objects_are_rejected() {
        for body in ["[]", "[1,2]", "\"mouse\"", "42", "true", "null"] {
            let err = ControlSnapshot::from_slice(body.as_bytes()).unwrap_err();
            assert!(matches!(err, SnapshotError::NotAnObject(_)), "{body} gave {err:?}");
        }
        assert!(matches!(
            ControlSnapshot::from_slice(b"{oops").unwrap_err(),
            SnapshotError::InvalidJson(_)
        ));
        assert_eq!(ControlSnapshot::from_slice(b"{}").unwrap(), ControlSnapshot::default());
    }

    #[test]
    fn test_wheel_steps_are_clamped() {
        let mut mouse = MouseState::default();
        for (raw, expected) in [(500, 20), (-500, -20), (20, 20), (-3, -3), (0, 0)] {
            mouse.wheel = Some(Wheel { y: raw });
            assert_eq!(mouse.wheel_steps(), expected, "wheel {raw}");
        }
        mouse.wheel = None;
        assert_eq!(mouse.wheel_steps(), 0);
    }

    #[test]
    fn test_huge_wheel_value_saturates_before_clamp() {
        let snap = decode(r#"{"mouse": {"wheel": {"y": 1e300}}}"#);
        assert_eq!(snap.mouse.unwrap().wheel_steps(), MAX_WHEEL_STEPS);
    }

    #[test]
    fn test_key_identity_prefers_code_then_key_code_then_key() {
        let full = KeyId::from_code("KeyQ").with_key("a").with_key_code(65);
        assert_eq!(full.identity(), Some(KeyIdentity::Code("KeyQ".into())));

        let numeric = KeyId::from_key_code(65).with_key("a");
        assert_eq!(numeric.identity(), Some(KeyIdentity::KeyCode(65)));

        let char_only = KeyId::default().with_key("a");
        assert_eq!(char_only.identity(), Some(KeyIdentity::Key("a".into())));

        assert_eq!(KeyId::default().identity(), None);
    }

    #[test]
    fn test_produced_char_only_for_single_characters() {
        assert_eq!(KeyId::default().with_key("ü").produced_char(), Some('ü'));
        assert_eq!(KeyId::default().with_key("Shift").produced_char(), None);
        assert_eq!(KeyId::from_code("KeyA").produced_char(), None);
    }

    #[test]
    fn test_button_diff_iterators() {
        // Arrange: left held, then right+middle held
        let before = ButtonMask::from_bits_truncate(0b001);
        let after = ButtonMask::from_bits_truncate(0b110);

        // Act
        let released: Vec<_> = before.released_in(after).collect();
        let pressed: Vec<_> = before.pressed_in(after).collect();

        // Assert
        assert_eq!(released, vec![MouseButton::Left]);
        assert_eq!(pressed, vec![MouseButton::Right, MouseButton::Middle]);
    }

    #[test]
    fn test_x11_button_numbers() {
        assert_eq!(MouseButton::Left.x11_button(), 1);
        assert_eq!(MouseButton::Middle.x11_button(), 2);
        assert_eq!(MouseButton::Right.x11_button(), 3);
        assert_eq!(MouseButton::Back.x11_button(), 8);
        assert_eq!(MouseButton::Forward.x11_button(), 9);
    }

    #[test]
    fn test_neutral_and_heartbeat_serialize_compactly() {
        assert_eq!(
            serde_json::to_string(&ControlSnapshot::neutral()).unwrap(),
            r#"{"mouse":{"buttons":0,"wheel":{"y":0}},"keys":[]}"#
        );
        assert_eq!(
            serde_json::to_string(&ControlSnapshot::heartbeat(3)).unwrap(),
            r#"{"wake":true,"wake_tick":3}"#
        );
        assert!(ControlSnapshot::heartbeat(3).is_heartbeat());
        assert!(!ControlSnapshot::neutral().is_heartbeat());
    }

    #[test]
    fn test_stamped_snapshot_survives_reserialization() {
        // Arrange: the relay re-serializes what it stored
        let mut snap = decode(r#"{"mouse": {"x": 0.5, "y": 0.5, "buttons": 1}, "time": 5}"#);
        snap.time = Some(42);

        // Act
        let json = serde_json::to_vec(&snap).unwrap();
        let back = ControlSnapshot::from_slice(&json).unwrap();

        // Assert
        assert_eq!(back, snap);
    }
}
