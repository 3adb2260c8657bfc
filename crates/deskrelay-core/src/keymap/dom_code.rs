//! DOM `KeyboardEvent.code` string ↔ HID Usage ID translation table.
//!
//! The viewer reports the physical key position with the standard UI Events
//! `code` value.  Reference: <https://www.w3.org/TR/uievents-code/>.
//!
//! The table is a static slice of pairs searched linearly in both
//! directions.  With ~110 entries this is a handful of string comparisons
//! per key transition, which only happen on human typing timescales.

use super::hid::HidKeyCode;

/// Translates a DOM `code` string ("KeyA", "ShiftLeft", ...) to a [`HidKeyCode`].
///
/// Returns `None` for codes that have no keyboard/keypad HID equivalent
/// (media keys, "Unidentified", etc.).
pub fn dom_code_to_hid(code: &str) -> Option<HidKeyCode> {
    DOM_CODE_TABLE
        .iter()
        .find(|(dom, _)| *dom == code)
        .map(|&(_, hid)| hid)
}

/// Translates a [`HidKeyCode`] back to its DOM `code` string.
pub fn hid_to_dom_code(hid: HidKeyCode) -> Option<&'static str> {
    DOM_CODE_TABLE
        .iter()
        .find(|(_, mapped)| *mapped == hid)
        .map(|&(dom, _)| dom)
}

/// Complete DOM code ↔ HID mapping.  Each side appears exactly once.
pub(crate) const DOM_CODE_TABLE: &[(&str, HidKeyCode)] = {
    use HidKeyCode::*;
    &[
        // ── Letters ──────────────────────────────────────────────────────────
        ("KeyA", KeyA), ("KeyB", KeyB), ("KeyC", KeyC), ("KeyD", KeyD),
        ("KeyE", KeyE), ("KeyF", KeyF), ("KeyG", KeyG), ("KeyH", KeyH),
        ("KeyI", KeyI), ("KeyJ", KeyJ), ("KeyK", KeyK), ("KeyL", KeyL),
        ("KeyM", KeyM), ("KeyN", KeyN), ("KeyO", KeyO), ("KeyP", KeyP),
        ("KeyQ", KeyQ), ("KeyR", KeyR), ("KeyS", KeyS), ("KeyT", KeyT),
        ("KeyU", KeyU), ("KeyV", KeyV), ("KeyW", KeyW), ("KeyX", KeyX),
        ("KeyY", KeyY), ("KeyZ", KeyZ),
        // ── Digit row ────────────────────────────────────────────────────────
        ("Digit1", Digit1), ("Digit2", Digit2), ("Digit3", Digit3),
        ("Digit4", Digit4), ("Digit5", Digit5), ("Digit6", Digit6),
        ("Digit7", Digit7), ("Digit8", Digit8), ("Digit9", Digit9),
        ("Digit0", Digit0),
        // ── Control keys ─────────────────────────────────────────────────────
        ("Enter", Enter), ("Escape", Escape), ("Backspace", Backspace),
        ("Tab", Tab), ("Space", Space), ("CapsLock", CapsLock),
        // ── Punctuation ──────────────────────────────────────────────────────
        ("Minus", Minus), ("Equal", Equal), ("BracketLeft", BracketLeft),
        ("BracketRight", BracketRight), ("Backslash", Backslash),
        ("Semicolon", Semicolon), ("Quote", Quote), ("Backquote", Backquote),
        ("Comma", Comma), ("Period", Period), ("Slash", Slash),
        ("IntlBackslash", IntlBackslash),
        // ── Function keys ────────────────────────────────────────────────────
        ("F1", F1), ("F2", F2), ("F3", F3), ("F4", F4), ("F5", F5), ("F6", F6),
        ("F7", F7), ("F8", F8), ("F9", F9), ("F10", F10), ("F11", F11), ("F12", F12),
        // ── Navigation ───────────────────────────────────────────────────────
        ("PrintScreen", PrintScreen), ("ScrollLock", ScrollLock), ("Pause", Pause),
        ("Insert", Insert), ("Home", Home), ("PageUp", PageUp),
        ("Delete", Delete), ("End", End), ("PageDown", PageDown),
        ("ArrowRight", ArrowRight), ("ArrowLeft", ArrowLeft),
        ("ArrowDown", ArrowDown), ("ArrowUp", ArrowUp),
        // ── Numpad ───────────────────────────────────────────────────────────
        ("NumLock", NumLock), ("NumpadDivide", NumpadDivide),
        ("NumpadMultiply", NumpadMultiply), ("NumpadSubtract", NumpadSubtract),
        ("NumpadAdd", NumpadAdd), ("NumpadEnter", NumpadEnter),
        ("Numpad1", Numpad1), ("Numpad2", Numpad2), ("Numpad3", Numpad3),
        ("Numpad4", Numpad4), ("Numpad5", Numpad5), ("Numpad6", Numpad6),
        ("Numpad7", Numpad7), ("Numpad8", Numpad8), ("Numpad9", Numpad9),
        ("Numpad0", Numpad0), ("NumpadDecimal", NumpadDecimal),
        ("ContextMenu", ContextMenu),
        // ── Modifiers ────────────────────────────────────────────────────────
        ("ControlLeft", ControlLeft), ("ShiftLeft", ShiftLeft),
        ("AltLeft", AltLeft), ("MetaLeft", MetaLeft),
        ("ControlRight", ControlRight), ("ShiftRight", ShiftRight),
        ("AltRight", AltRight), ("MetaRight", MetaRight),
    ]
};
