//! Windows Virtual Key (VK) code ↔ USB HID Usage ID translation table.
//!
//! Reference: Windows Virtual-Key Codes (winuser.h) and USB HID Usage Tables 1.3.
//! Windows VK codes range from 0x00 to 0xFF.
//!
//! # Why the browser's `keyCode` is (almost) a VK code
//!
//! The legacy DOM `KeyboardEvent.keyCode` property was modelled on Windows
//! VK numbering, so on every mainstream browser `keyCode` for letters,
//! digits, F-keys, navigation and modifiers is the VK code itself.  The
//! persistent Windows backend can therefore forward the numeric identifier
//! straight to `SendInput` once this table confirms the value is a canonical
//! VK.  Browsers only report the *generic* modifier VKs (`VK_SHIFT` = 0x10,
//! not `VK_LSHIFT` = 0xA0), and Firefox uses its own numbers for three
//! punctuation keys; both families are listed as decode-only aliases.  The
//! generic modifiers are valid VKs; the Firefox numbers are re-encoded.
//!
//! # How this table works
//!
//! `VK_TO_HID_TABLE` is a compile-time constant array of 256 entries, indexed
//! by VK code.  Position 0x41 holds `Some(HidKeyCode::KeyA)` because
//! Windows VK_A is 0x41.  Any VK code without a keyboard meaning stores `None`.

use super::hid::HidKeyCode;

/// Translates a Windows Virtual Key code to a HID Usage ID.
///
/// Accepts the generic modifier VKs and Firefox punctuation aliases in
/// addition to the canonical codes.  Returns `None` for VK codes that have no
/// keyboard HID equivalent (mouse button VKs, browser keys, unassigned).
pub fn vk_to_hid(vk: u16) -> Option<HidKeyCode> {
    if vk > 0xFF {
        return None;
    }
    VK_TO_HID_TABLE[vk as usize].or_else(|| {
        DECODE_ONLY_ALIASES
            .iter()
            .find(|&&(alias, _)| u16::from(alias) == vk)
            .map(|&(_, hid)| hid)
    })
}

/// Translates a HID Usage ID back to its canonical Windows Virtual Key code.
///
/// Decode-only aliases are never returned: `ShiftLeft` maps to `VK_LSHIFT`.
pub fn hid_to_vk(hid: HidKeyCode) -> Option<u8> {
    VK_TO_HID_TABLE
        .iter()
        .position(|&mapped| mapped == Some(hid))
        .map(|vk| vk as u8)
}

/// Returns `true` if `vk` can be handed to `SendInput` unchanged.
///
/// That holds for the canonical table entries and for the generic modifier
/// VKs, which Windows resolves itself.  Other decode-only aliases (Firefox's
/// 173 is `VK_VOLUME_MUTE`) must be re-encoded through [`hid_to_vk`].
pub fn is_native_vk(vk: u16) -> bool {
    if matches!(vk, VK_SHIFT | VK_CONTROL | VK_MENU) {
        return true;
    }
    let Ok(byte) = u8::try_from(vk) else {
        return false;
    };
    vk_to_hid(vk).and_then(hid_to_vk) == Some(byte)
}

const VK_SHIFT: u16 = 0x10;
const VK_CONTROL: u16 = 0x11;
const VK_MENU: u16 = 0x12;

/// VK codes that decode to a HID key but are never produced by [`hid_to_vk`].
const DECODE_ONLY_ALIASES: &[(u8, HidKeyCode)] = &[
    (0x10, HidKeyCode::ShiftLeft),   // VK_SHIFT (generic)
    (0x11, HidKeyCode::ControlLeft), // VK_CONTROL (generic)
    (0x12, HidKeyCode::AltLeft),     // VK_MENU (generic)
    (0x3B, HidKeyCode::Semicolon),   // Firefox ";"
    (0x3D, HidKeyCode::Equal),       // Firefox "="
    (0xAD, HidKeyCode::Minus),       // Firefox "-"
];

/// Canonical VK → HID mapping table indexed by VK code (0x00–0xFF).
///
/// Reference: https://learn.microsoft.com/windows/win32/inputdev/virtual-key-codes
const VK_TO_HID_TABLE: [Option<HidKeyCode>; 256] = {
    use HidKeyCode::*;
    let mut t: [Option<HidKeyCode>; 256] = [None; 256];

    // ── Alphabet keys (VK_A=0x41 … VK_Z=0x5A) ────────────────────────────────
    t[0x41] = Some(KeyA);
    t[0x42] = Some(KeyB);
    t[0x43] = Some(KeyC);
    t[0x44] = Some(KeyD);
    t[0x45] = Some(KeyE);
    t[0x46] = Some(KeyF);
    t[0x47] = Some(KeyG);
    t[0x48] = Some(KeyH);
    t[0x49] = Some(KeyI);
    t[0x4A] = Some(KeyJ);
    t[0x4B] = Some(KeyK);
    t[0x4C] = Some(KeyL);
    t[0x4D] = Some(KeyM);
    t[0x4E] = Some(KeyN);
    t[0x4F] = Some(KeyO);
    t[0x50] = Some(KeyP);
    t[0x51] = Some(KeyQ);
    t[0x52] = Some(KeyR);
    t[0x53] = Some(KeyS);
    t[0x54] = Some(KeyT);
    t[0x55] = Some(KeyU);
    t[0x56] = Some(KeyV);
    t[0x57] = Some(KeyW);
    t[0x58] = Some(KeyX);
    t[0x59] = Some(KeyY);
    t[0x5A] = Some(KeyZ);

    // ── Digit row (VK_0=0x30 … VK_9=0x39) ───────────────────────────────────
    t[0x30] = Some(Digit0);
    t[0x31] = Some(Digit1);
    t[0x32] = Some(Digit2);
    t[0x33] = Some(Digit3);
    t[0x34] = Some(Digit4);
    t[0x35] = Some(Digit5);
    t[0x36] = Some(Digit6);
    t[0x37] = Some(Digit7);
    t[0x38] = Some(Digit8);
    t[0x39] = Some(Digit9);

    // ── Control keys ─────────────────────────────────────────────────────────
    t[0x0D] = Some(Enter);       // VK_RETURN
    t[0x1B] = Some(Escape);      // VK_ESCAPE
    t[0x08] = Some(Backspace);   // VK_BACK
    t[0x09] = Some(Tab);         // VK_TAB
    t[0x20] = Some(Space);       // VK_SPACE
    t[0x14] = Some(CapsLock);    // VK_CAPITAL
    t[0x91] = Some(ScrollLock);  // VK_SCROLL
    t[0x13] = Some(Pause);       // VK_PAUSE
    t[0x2D] = Some(Insert);      // VK_INSERT
    t[0x24] = Some(Home);        // VK_HOME
    t[0x21] = Some(PageUp);      // VK_PRIOR
    t[0x2E] = Some(Delete);      // VK_DELETE
    t[0x23] = Some(End);         // VK_END
    t[0x22] = Some(PageDown);    // VK_NEXT
    t[0x2C] = Some(PrintScreen); // VK_SNAPSHOT
    t[0x5D] = Some(ContextMenu); // VK_APPS

    // ── Arrow keys ────────────────────────────────────────────────────────────
    t[0x25] = Some(ArrowLeft);
    t[0x26] = Some(ArrowUp);
    t[0x27] = Some(ArrowRight);
    t[0x28] = Some(ArrowDown);

    // ── Function keys (VK_F1=0x70 … VK_F12=0x7B) ─────────────────────────────
    t[0x70] = Some(F1);
    t[0x71] = Some(F2);
    t[0x72] = Some(F3);
    t[0x73] = Some(F4);
    t[0x74] = Some(F5);
    t[0x75] = Some(F6);
    t[0x76] = Some(F7);
    t[0x77] = Some(F8);
    t[0x78] = Some(F9);
    t[0x79] = Some(F10);
    t[0x7A] = Some(F11);
    t[0x7B] = Some(F12);

    // ── Numpad (VK_NUMPAD0=0x60 … VK_NUMPAD9=0x69) ───────────────────────────
    t[0x60] = Some(Numpad0);
    t[0x61] = Some(Numpad1);
    t[0x62] = Some(Numpad2);
    t[0x63] = Some(Numpad3);
    t[0x64] = Some(Numpad4);
    t[0x65] = Some(Numpad5);
    t[0x66] = Some(Numpad6);
    t[0x67] = Some(Numpad7);
    t[0x68] = Some(Numpad8);
    t[0x69] = Some(Numpad9);
    t[0x6A] = Some(NumpadMultiply); // VK_MULTIPLY
    t[0x6B] = Some(NumpadAdd);      // VK_ADD
    t[0x6D] = Some(NumpadSubtract); // VK_SUBTRACT
    t[0x6E] = Some(NumpadDecimal);  // VK_DECIMAL
    t[0x6F] = Some(NumpadDivide);   // VK_DIVIDE
    t[0x90] = Some(NumLock);        // VK_NUMLOCK

    // ── Punctuation / symbols ─────────────────────────────────────────────────
    t[0xBD] = Some(Minus);         // VK_OEM_MINUS  (- _)
    t[0xBB] = Some(Equal);         // VK_OEM_PLUS   (= +)
    t[0xDB] = Some(BracketLeft);   // VK_OEM_4      ([ {)
    t[0xDD] = Some(BracketRight);  // VK_OEM_6      (] })
    t[0xDC] = Some(Backslash);     // VK_OEM_5      (\ |)
    t[0xBA] = Some(Semicolon);     // VK_OEM_1      (; :)
    t[0xDE] = Some(Quote);         // VK_OEM_7      (' ")
    t[0xC0] = Some(Backquote);     // VK_OEM_3      (` ~)
    t[0xBC] = Some(Comma);         // VK_OEM_COMMA  (, <)
    t[0xBE] = Some(Period);        // VK_OEM_PERIOD (. >)
    t[0xBF] = Some(Slash);         // VK_OEM_2      (/ ?)
    t[0xE2] = Some(IntlBackslash); // VK_OEM_102    (< > on ISO boards)

    // ── Modifier keys ─────────────────────────────────────────────────────────
    t[0xA2] = Some(ControlLeft);  // VK_LCONTROL
    t[0xA3] = Some(ControlRight); // VK_RCONTROL
    t[0xA0] = Some(ShiftLeft);    // VK_LSHIFT
    t[0xA1] = Some(ShiftRight);   // VK_RSHIFT
    t[0xA4] = Some(AltLeft);      // VK_LMENU
    t[0xA5] = Some(AltRight);     // VK_RMENU
    t[0x5B] = Some(MetaLeft);     // VK_LWIN
    t[0x5C] = Some(MetaRight);    // VK_RWIN

    // NumpadEnter has no VK of its own (VK_RETURN + extended flag); it is
    // deliberately absent so hid_to_vk(NumpadEnter) reports no mapping.

    t
};
