//! HID Usage ID ↔ X11 keysym *name* table for the `xdotool` backend.
//!
//! `xdotool keydown <name>` resolves the name through `XStringToKeysym`, so
//! this table stores names from X11/keysymdef.h with the `XK_` prefix
//! stripped (`XK_Return` → `"Return"`).
//! Reference: https://gitlab.freedesktop.org/xorg/proto/xorgproto/-/blob/master/include/X11/keysymdef.h
//!
//! # Positions versus symbols (for beginners)
//!
//! X11 keysyms name *symbols*, not positions.  For letters, digits, F-keys,
//! navigation and modifiers the difference does not matter: the key to the
//! right of Tab is called `q` on QWERTY and `a` on AZERTY, but the letter the
//! user sees in the browser is what they expect on the remote side, and the
//! lower-case letter keysym is always present in the host keymap.
//!
//! Punctuation is different.  The key right of `P` produces `[` on US
//! QWERTY and `ü` on German QWERTZ.  Sending the US keysym `bracketleft` to
//! a German host makes xdotool search for a key producing `[`, which means
//! AltGr+8 there, and the user gets the wrong key held down.  For those keys
//! the produced character from the viewer (`KeyboardEvent.key`) is converted
//! through [`char_to_keysym`] instead, so the host emits the symbol the user
//! actually typed.

use super::hid::HidKeyCode;

/// Translates a [`HidKeyCode`] to its X11 keysym name.
///
/// Letters map to their lower-case keysym (`"a"`); X11 applies Shift itself.
pub fn hid_to_keysym_name(hid: HidKeyCode) -> Option<&'static str> {
    KEYSYM_TABLE
        .iter()
        .find(|(mapped, _)| *mapped == hid)
        .map(|&(_, name)| name)
}

/// Translates an X11 keysym name back to the key position it lives on in a
/// US layout.
pub fn keysym_name_to_hid(name: &str) -> Option<HidKeyCode> {
    KEYSYM_TABLE
        .iter()
        .find(|(_, mapped)| *mapped == name)
        .map(|&(hid, _)| hid)
}

/// Returns the keysym name for a single produced character.
///
/// ASCII letters and digits are their own keysym names.  Punctuation and the
/// Latin-1 letters common on European layouts go through an explicit table.
/// Returns `None` for characters with no entry.
pub fn char_to_keysym(c: char) -> Option<&'static str> {
    if c.is_ascii_alphanumeric() {
        return ASCII_ALNUM
            .iter()
            .find(|s| s.starts_with(c))
            .copied();
    }
    CHAR_KEYSYM_TABLE
        .iter()
        .find(|(ch, _)| *ch == c)
        .map(|&(_, name)| name)
}

const ASCII_ALNUM: &[&str] = &[
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o",
    "p", "q", "r", "s", "t", "u", "v", "w", "x", "y", "z", "A", "B", "C", "D",
    "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R", "S",
    "T", "U", "V", "W", "X", "Y", "Z", "0", "1", "2", "3", "4", "5", "6", "7",
    "8", "9",
];

/// Position → keysym name.  Each side appears exactly once.
pub(crate) const KEYSYM_TABLE: &[(HidKeyCode, &str)] = {
    use HidKeyCode::*;
    &[
        // ── Letters ──────────────────────────────────────────────────────────
        (KeyA, "a"), (KeyB, "b"), (KeyC, "c"), (KeyD, "d"), (KeyE, "e"),
        (KeyF, "f"), (KeyG, "g"), (KeyH, "h"), (KeyI, "i"), (KeyJ, "j"),
        (KeyK, "k"), (KeyL, "l"), (KeyM, "m"), (KeyN, "n"), (KeyO, "o"),
        (KeyP, "p"), (KeyQ, "q"), (KeyR, "r"), (KeyS, "s"), (KeyT, "t"),
        (KeyU, "u"), (KeyV, "v"), (KeyW, "w"), (KeyX, "x"), (KeyY, "y"),
        (KeyZ, "z"),
        // ── Digits ───────────────────────────────────────────────────────────
        (Digit1, "1"), (Digit2, "2"), (Digit3, "3"), (Digit4, "4"),
        (Digit5, "5"), (Digit6, "6"), (Digit7, "7"), (Digit8, "8"),
        (Digit9, "9"), (Digit0, "0"),
        // ── Control keys ─────────────────────────────────────────────────────
        (Enter, "Return"), (Escape, "Escape"), (Backspace, "BackSpace"),
        (Tab, "Tab"), (Space, "space"), (CapsLock, "Caps_Lock"),
        // ── Punctuation (US positions) ───────────────────────────────────────
        (Minus, "minus"), (Equal, "equal"), (BracketLeft, "bracketleft"),
        (BracketRight, "bracketright"), (Backslash, "backslash"),
        (Semicolon, "semicolon"), (Quote, "apostrophe"), (Backquote, "grave"),
        (Comma, "comma"), (Period, "period"), (Slash, "slash"),
        (IntlBackslash, "less"),
        // ── Function keys ────────────────────────────────────────────────────
        (F1, "F1"), (F2, "F2"), (F3, "F3"), (F4, "F4"), (F5, "F5"), (F6, "F6"),
        (F7, "F7"), (F8, "F8"), (F9, "F9"), (F10, "F10"), (F11, "F11"), (F12, "F12"),
        // ── Navigation ───────────────────────────────────────────────────────
        (PrintScreen, "Print"), (ScrollLock, "Scroll_Lock"), (Pause, "Pause"),
        (Insert, "Insert"), (Home, "Home"), (PageUp, "Prior"),
        (Delete, "Delete"), (End, "End"), (PageDown, "Next"),
        (ArrowRight, "Right"), (ArrowLeft, "Left"), (ArrowDown, "Down"),
        (ArrowUp, "Up"), (ContextMenu, "Menu"),
        // ── Numpad ───────────────────────────────────────────────────────────
        (NumLock, "Num_Lock"), (NumpadDivide, "KP_Divide"),
        (NumpadMultiply, "KP_Multiply"), (NumpadSubtract, "KP_Subtract"),
        (NumpadAdd, "KP_Add"), (NumpadEnter, "KP_Enter"),
        (Numpad1, "KP_1"), (Numpad2, "KP_2"), (Numpad3, "KP_3"),
        (Numpad4, "KP_4"), (Numpad5, "KP_5"), (Numpad6, "KP_6"),
        (Numpad7, "KP_7"), (Numpad8, "KP_8"), (Numpad9, "KP_9"),
        (Numpad0, "KP_0"), (NumpadDecimal, "KP_Decimal"),
        // ── Modifiers ────────────────────────────────────────────────────────
        (ControlLeft, "Control_L"), (ShiftLeft, "Shift_L"),
        (AltLeft, "Alt_L"), (MetaLeft, "Super_L"),
        (ControlRight, "Control_R"), (ShiftRight, "Shift_R"),
        (AltRight, "ISO_Level3_Shift"), (MetaRight, "Super_R"),
    ]
};

/// Produced character → keysym name for punctuation and Latin-1 letters.
const CHAR_KEYSYM_TABLE: &[(char, &str)] = &[
    // ASCII punctuation
    (' ', "space"),
    ('!', "exclam"),
    ('"', "quotedbl"),
    ('#', "numbersign"),
    ('$', "dollar"),
    ('%', "percent"),
    ('&', "ampersand"),
    ('\'', "apostrophe"),
    ('(', "parenleft"),
    (')', "parenright"),
    ('*', "asterisk"),
    ('+', "plus"),
    (',', "comma"),
    ('-', "minus"),
    ('.', "period"),
    ('/', "slash"),
    (':', "colon"),
    (';', "semicolon"),
    ('<', "less"),
    ('=', "equal"),
    ('>', "greater"),
    ('?', "question"),
    ('@', "at"),
    ('[', "bracketleft"),
    ('\\', "backslash"),
    (']', "bracketright"),
    ('^', "asciicircum"),
    ('_', "underscore"),
    ('`', "grave"),
    ('{', "braceleft"),
    ('|', "bar"),
    ('}', "braceright"),
    ('~', "asciitilde"),
    // Latin-1 symbols found on European layouts
    ('§', "section"),
    ('°', "degree"),
    ('´', "acute"),
    ('¨', "diaeresis"),
    ('£', "sterling"),
    ('€', "EuroSign"),
    ('µ', "mu"),
    ('²', "twosuperior"),
    ('¤', "currency"),
    ('½', "onehalf"),
    ('¡', "exclamdown"),
    ('¿', "questiondown"),
    ('«', "guillemotleft"),
    ('»', "guillemotright"),
    // Latin-1 letters that sit on punctuation positions
    ('ä', "adiaeresis"),
    ('ö', "odiaeresis"),
    ('ü', "udiaeresis"),
    ('Ä', "Adiaeresis"),
    ('Ö', "Odiaeresis"),
    ('Ü', "Udiaeresis"),
    ('ß', "ssharp"),
    ('é', "eacute"),
    ('è', "egrave"),
    ('à', "agrave"),
    ('ç', "ccedilla"),
    ('ù', "ugrave"),
    ('ñ', "ntilde"),
    ('Ñ', "Ntilde"),
    ('å', "aring"),
    ('Å', "Aring"),
    ('æ', "ae"),
    ('Æ', "AE"),
    ('ø', "oslash"),
    ('Ø', "Oslash"),
    ('ò', "ograve"),
    ('ì', "igrave"),
];
