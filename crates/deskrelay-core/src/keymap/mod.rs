//! Key identifier translation tables.
//!
//! The canonical representation is USB HID Usage IDs (page 0x07, Keyboard/Keypad).
//! Viewer identifiers are translated to HID on the way in and from HID to the
//! backend's native name on the way out.

pub mod dom_code;
pub mod hid;
pub mod windows_vk;
pub mod xdotool;

pub use hid::HidKeyCode;

use crate::snapshot::KeyId;

/// Resolves a viewer [`KeyId`] to what each input backend understands.
///
/// Both methods return `None` for keys the backend cannot express; callers
/// drop such keys silently.
pub struct KeyMapper;

impl KeyMapper {
    /// Resolves the physical key position of `key`, if any identifier names one.
    ///
    /// Tries the DOM `code` first, then the numeric `keyCode`, then a named
    /// `key` value that coincides with a DOM code (`"Enter"`, `"Tab"`).
    pub fn position(key: &KeyId) -> Option<HidKeyCode> {
        key.code
            .as_deref()
            .and_then(dom_code::dom_code_to_hid)
            .or_else(|| key.key_code.and_then(windows_vk::vk_to_hid))
            .or_else(|| key.key.as_deref().and_then(dom_code::dom_code_to_hid))
    }

    /// X11 keysym name for `xdotool keydown`/`keyup`.
    ///
    /// Layout-sensitive positions (the punctuation block) prefer the produced
    /// character so a German `ü` is sent as `udiaeresis` rather than the US
    /// `bracketleft`.  Keys with no known position fall back to the produced
    /// character alone.
    pub fn xdotool_name(key: &KeyId) -> Option<&'static str> {
        let by_char = || key.produced_char().and_then(xdotool::char_to_keysym);
        match Self::position(key) {
            Some(hid) if hid.is_layout_sensitive() => {
                by_char().or_else(|| xdotool::hid_to_keysym_name(hid))
            }
            Some(hid) => xdotool::hid_to_keysym_name(hid),
            None => by_char(),
        }
    }

    /// Windows Virtual Key code for `SendInput`.
    ///
    /// A `keyCode` that is already a native VK is used as-is; otherwise the
    /// physical position is mapped through the VK table.  Browser-specific
    /// numbers such as Firefox's 173 for `-` always take the second path.
    pub fn windows_vk(key: &KeyId) -> Option<u8> {
        if let Some(vk) = key.key_code.filter(|&vk| windows_vk::is_native_vk(vk)) {
            return u8::try_from(vk).ok();
        }
        Self::position(key).and_then(windows_vk::hid_to_vk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xdotool_letters_use_position() {
        // Arrange: AZERTY user pressing the key right of Tab produces "a"
        let key = KeyId::from_code("KeyQ").with_key("a");

        // Act / Assert: letters follow the position table
        assert_eq!(KeyMapper::xdotool_name(&key), Some("q"));
    }

    #[test]
    fn test_xdotool_punctuation_prefers_produced_char() {
        let german_ue = KeyId::from_code("BracketLeft").with_key("ü");
        assert_eq!(KeyMapper::xdotool_name(&german_ue), Some("udiaeresis"));

        let us_bracket = KeyId::from_code("BracketLeft").with_key("[");
        assert_eq!(KeyMapper::xdotool_name(&us_bracket), Some("bracketleft"));

        let no_char = KeyId::from_code("BracketLeft");
        assert_eq!(KeyMapper::xdotool_name(&no_char), Some("bracketleft"));
    }

    #[test]
    fn test_xdotool_punctuation_with_unmapped_char_falls_back_to_position() {
        let key = KeyId::from_code("Quote").with_key("☃");
        assert_eq!(KeyMapper::xdotool_name(&key), Some("apostrophe"));
    }

    #[test]
    fn test_xdotool_named_keys_and_modifiers() {
        assert_eq!(KeyMapper::xdotool_name(&KeyId::from_code("Enter")), Some("Return"));
        assert_eq!(KeyMapper::xdotool_name(&KeyId::from_code("ShiftLeft")), Some("Shift_L"));
        assert_eq!(KeyMapper::xdotool_name(&KeyId::from_code("F5")), Some("F5"));
    }

    #[test]
    fn test_xdotool_falls_back_to_key_code_then_char() {
        assert_eq!(KeyMapper::xdotool_name(&KeyId::from_key_code(0x0D)), Some("Return"));
        assert_eq!(KeyMapper::xdotool_name(&KeyId::default().with_key("-")), Some("minus"));
        assert_eq!(KeyMapper::xdotool_name(&KeyId::default().with_key("Escape")), Some("Escape"));
    }

    #[test]
    fn test_unmappable_keys_return_none() {
        let media = KeyId::from_code("MediaPlayPause").with_key("MediaPlayPause");
        assert_eq!(KeyMapper::xdotool_name(&media), None);
        assert_eq!(KeyMapper::windows_vk(&media), None);
    }

    #[test]
    fn test_windows_uses_key_code_directly_when_known() {
        // Generic VK_SHIFT as reported by browsers
        let shift = KeyId::from_code("ShiftRight").with_key_code(16);
        assert_eq!(KeyMapper::windows_vk(&shift), Some(16));
    }

    #[test]
    fn test_windows_reencodes_firefox_punctuation_key_codes() {
        // Arrange: Firefox reports 173/59/61 where other browsers send 189/186/187
        let minus = KeyId::from_code("Minus").with_key("-").with_key_code(173);
        let semicolon = KeyId::from_code("Semicolon").with_key(";").with_key_code(59);
        let equal = KeyId::from_code("Equal").with_key("=").with_key_code(61);

        // Act / Assert: 0xAD would be VK_VOLUME_MUTE
        assert_eq!(KeyMapper::windows_vk(&minus), Some(0xBD));
        assert_eq!(KeyMapper::windows_vk(&semicolon), Some(0xBA));
        assert_eq!(KeyMapper::windows_vk(&equal), Some(0xBB));
    }

    #[test]
    fn test_windows_firefox_key_code_without_code_still_maps() {
        assert_eq!(KeyMapper::windows_vk(&KeyId::from_key_code(173)), Some(0xBD));
        assert_eq!(KeyMapper::windows_vk(&KeyId::from_key_code(59)), Some(0xBA));
    }

    #[test]
    fn test_windows_maps_position_when_key_code_missing_or_unknown() {
        assert_eq!(KeyMapper::windows_vk(&KeyId::from_code("KeyA")), Some(0x41));
        assert_eq!(KeyMapper::windows_vk(&KeyId::from_code("ArrowUp").with_key_code(0)), Some(0x26));
        assert_eq!(KeyMapper::windows_vk(&KeyId::from_code("IntlBackslash")), Some(0xE2));
    }

    #[test]
    fn test_windows_char_only_keys_are_dropped() {
        assert_eq!(KeyMapper::windows_vk(&KeyId::default().with_key("ü")), None);
    }
}
