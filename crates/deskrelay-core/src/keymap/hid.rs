//! USB HID Usage IDs (page 0x07, Keyboard/Keypad page).
//!
//! The browser reports *physical* key positions as DOM `KeyboardEvent.code`
//! strings ("KeyA", "Digit1", "ShiftLeft", ...).  Each input backend wants
//! something different: `xdotool` wants X11 keysym names, the Windows
//! `SendInput` path wants Virtual Key codes.  Rather than maintaining one
//! table per (source, destination) pair, every table in this module tree maps
//! to and from [`HidKeyCode`], which is used purely as a pivot.
//!
//! Reference: USB HID Usage Tables 1.3, Section 10 (Keyboard/Keypad page 0x07).
//!
//! # Why HID codes and not characters?
//!
//! HID codes represent **physical key positions**, not characters.  The
//! character that a key produces depends on the keyboard layout (QWERTY,
//! AZERTY, Dvorak, ...) and the modifiers held down.  Holding a key is a
//! position concept; typing a character is a layout concept.  The replay
//! engine holds and releases positions, so the pivot is positional.

use serde::{Deserialize, Serialize};

/// USB HID Usage ID for keyboard keys (page 0x07).
///
/// The numeric value of each variant is its HID Usage ID on the keyboard/keypad page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u16)]
pub enum HidKeyCode {
    // Letters (HID 0x04–0x1D)
    KeyA = 0x04,
    KeyB = 0x05,
    KeyC = 0x06,
    KeyD = 0x07,
    KeyE = 0x08,
    KeyF = 0x09,
    KeyG = 0x0A,
    KeyH = 0x0B,
    KeyI = 0x0C,
    KeyJ = 0x0D,
    KeyK = 0x0E,
    KeyL = 0x0F,
    KeyM = 0x10,
    KeyN = 0x11,
    KeyO = 0x12,
    KeyP = 0x13,
    KeyQ = 0x14,
    KeyR = 0x15,
    KeyS = 0x16,
    KeyT = 0x17,
    KeyU = 0x18,
    KeyV = 0x19,
    KeyW = 0x1A,
    KeyX = 0x1B,
    KeyY = 0x1C,
    KeyZ = 0x1D,

    // Digits (HID 0x1E–0x27)
    Digit1 = 0x1E,
    Digit2 = 0x1F,
    Digit3 = 0x20,
    Digit4 = 0x21,
    Digit5 = 0x22,
    Digit6 = 0x23,
    Digit7 = 0x24,
    Digit8 = 0x25,
    Digit9 = 0x26,
    Digit0 = 0x27,

    // Control keys and punctuation (HID 0x28–0x38)
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,
    Minus = 0x2D,
    Equal = 0x2E,
    BracketLeft = 0x2F,
    BracketRight = 0x30,
    Backslash = 0x31,
    Semicolon = 0x33,
    Quote = 0x34,
    Backquote = 0x35,
    Comma = 0x36,
    Period = 0x37,
    Slash = 0x38,

    CapsLock = 0x39,

    // Function keys (HID 0x3A–0x45)
    F1 = 0x3A,
    F2 = 0x3B,
    F3 = 0x3C,
    F4 = 0x3D,
    F5 = 0x3E,
    F6 = 0x3F,
    F7 = 0x40,
    F8 = 0x41,
    F9 = 0x42,
    F10 = 0x43,
    F11 = 0x44,
    F12 = 0x45,

    // Navigation cluster (HID 0x46–0x52)
    PrintScreen = 0x46,
    ScrollLock = 0x47,
    Pause = 0x48,
    Insert = 0x49,
    Home = 0x4A,
    PageUp = 0x4B,
    Delete = 0x4C,
    End = 0x4D,
    PageDown = 0x4E,
    ArrowRight = 0x4F,
    ArrowLeft = 0x50,
    ArrowDown = 0x51,
    ArrowUp = 0x52,

    // Numpad (HID 0x53–0x63)
    NumLock = 0x53,
    NumpadDivide = 0x54,
    NumpadMultiply = 0x55,
    NumpadSubtract = 0x56,
    NumpadAdd = 0x57,
    NumpadEnter = 0x58,
    Numpad1 = 0x59,
    Numpad2 = 0x5A,
    Numpad3 = 0x5B,
    Numpad4 = 0x5C,
    Numpad5 = 0x5D,
    Numpad6 = 0x5E,
    Numpad7 = 0x5F,
    Numpad8 = 0x60,
    Numpad9 = 0x61,
    Numpad0 = 0x62,
    NumpadDecimal = 0x63,

    /// The extra key between left Shift and Z on ISO keyboards ("<>|").
    IntlBackslash = 0x64,
    ContextMenu = 0x65,

    // Modifier keys (HID 0xE0–0xE7)
    ControlLeft = 0xE0,
    ShiftLeft = 0xE1,
    AltLeft = 0xE2,
    MetaLeft = 0xE3,
    ControlRight = 0xE4,
    ShiftRight = 0xE5,
    AltRight = 0xE6,
    MetaRight = 0xE7,
}

impl HidKeyCode {
    /// Returns the raw USB HID Usage ID value for this key code.
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns `true` if this is a modifier key.
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            HidKeyCode::ControlLeft
                | HidKeyCode::ControlRight
                | HidKeyCode::ShiftLeft
                | HidKeyCode::ShiftRight
                | HidKeyCode::AltLeft
                | HidKeyCode::AltRight
                | HidKeyCode::MetaLeft
                | HidKeyCode::MetaRight
        )
    }

    /// Returns `true` for keys whose printed symbol moves between layouts.
    ///
    /// Letters and digits keep their position on virtually every Latin
    /// layout; the punctuation block does not (the key right of `P` is `[`
    /// on US QWERTY, `ü` on German QWERTZ, `^` on French AZERTY).
    pub fn is_layout_sensitive(self) -> bool {
        matches!(
            self,
            HidKeyCode::Minus
                | HidKeyCode::Equal
                | HidKeyCode::BracketLeft
                | HidKeyCode::BracketRight
                | HidKeyCode::Backslash
                | HidKeyCode::Semicolon
                | HidKeyCode::Quote
                | HidKeyCode::Backquote
                | HidKeyCode::Comma
                | HidKeyCode::Period
                | HidKeyCode::Slash
                | HidKeyCode::IntlBackslash
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_u16_returns_usage_id() {
        assert_eq!(HidKeyCode::KeyA.as_u16(), 0x04);
        assert_eq!(HidKeyCode::Enter.as_u16(), 0x28);
        assert_eq!(HidKeyCode::IntlBackslash.as_u16(), 0x64);
        assert_eq!(HidKeyCode::MetaRight.as_u16(), 0xE7);
    }

    #[test]
    fn test_all_letter_keys_are_contiguous() {
        let letters = [
            HidKeyCode::KeyA, HidKeyCode::KeyB, HidKeyCode::KeyC, HidKeyCode::KeyD,
            HidKeyCode::KeyE, HidKeyCode::KeyF, HidKeyCode::KeyG, HidKeyCode::KeyH,
            HidKeyCode::KeyI, HidKeyCode::KeyJ, HidKeyCode::KeyK, HidKeyCode::KeyL,
            HidKeyCode::KeyM, HidKeyCode::KeyN, HidKeyCode::KeyO, HidKeyCode::KeyP,
            HidKeyCode::KeyQ, HidKeyCode::KeyR, HidKeyCode::KeyS, HidKeyCode::KeyT,
            HidKeyCode::KeyU, HidKeyCode::KeyV, HidKeyCode::KeyW, HidKeyCode::KeyX,
            HidKeyCode::KeyY, HidKeyCode::KeyZ,
        ];
        for (i, &letter) in letters.iter().enumerate() {
            assert_eq!(letter.as_u16(), 0x04 + i as u16, "{letter:?}");
        }
    }

    #[test]
    fn test_modifier_keys_are_identified_correctly() {
        for m in [
            HidKeyCode::ControlLeft,
            HidKeyCode::ControlRight,
            HidKeyCode::ShiftLeft,
            HidKeyCode::ShiftRight,
            HidKeyCode::AltLeft,
            HidKeyCode::AltRight,
            HidKeyCode::MetaLeft,
            HidKeyCode::MetaRight,
        ] {
            assert!(m.is_modifier(), "{m:?} should be a modifier key");
        }
        assert!(!HidKeyCode::KeyA.is_modifier());
        assert!(!HidKeyCode::Space.is_modifier());
    }

    #[test]
    fn test_layout_sensitive_keys_are_the_punctuation_block() {
        assert!(HidKeyCode::BracketLeft.is_layout_sensitive());
        assert!(HidKeyCode::Semicolon.is_layout_sensitive());
        assert!(HidKeyCode::IntlBackslash.is_layout_sensitive());
        assert!(!HidKeyCode::KeyQ.is_layout_sensitive());
        assert!(!HidKeyCode::Digit2.is_layout_sensitive());
        assert!(!HidKeyCode::ShiftLeft.is_layout_sensitive());
    }
}
