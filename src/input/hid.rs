//! Fixed lookup tables: ASCII → HID, CSI letter → HID, tilde-sequence → HID,
//! SS3 letter → HID. All deterministic, per the decoding rules.

use crate::events::{HidCode, Modifiers};

/// Map a printable ASCII byte (32-126) to its HID code and modifiers.
///
/// Letters, digits (with `DIGIT_0` following `DIGIT_9`), and punctuation
/// each have a fixed key; the shifted glyph of a key sets `SHIFT`.
pub fn ascii_to_hid(b: u8) -> (HidCode, Modifiers) {
    match b {
        b'a'..=b'z' => (letter_hid(b - b'a'), Modifiers::empty()),
        b'A'..=b'Z' => (letter_hid(b - b'A'), Modifiers::SHIFT),
        b'1' => (HidCode::Digit1, Modifiers::empty()),
        b'2' => (HidCode::Digit2, Modifiers::empty()),
        b'3' => (HidCode::Digit3, Modifiers::empty()),
        b'4' => (HidCode::Digit4, Modifiers::empty()),
        b'5' => (HidCode::Digit5, Modifiers::empty()),
        b'6' => (HidCode::Digit6, Modifiers::empty()),
        b'7' => (HidCode::Digit7, Modifiers::empty()),
        b'8' => (HidCode::Digit8, Modifiers::empty()),
        b'9' => (HidCode::Digit9, Modifiers::empty()),
        b'0' => (HidCode::Digit0, Modifiers::empty()),
        b'!' => (HidCode::Digit1, Modifiers::SHIFT),
        b'@' => (HidCode::Digit2, Modifiers::SHIFT),
        b'#' => (HidCode::Digit3, Modifiers::SHIFT),
        b'$' => (HidCode::Digit4, Modifiers::SHIFT),
        b'%' => (HidCode::Digit5, Modifiers::SHIFT),
        b'^' => (HidCode::Digit6, Modifiers::SHIFT),
        b'&' => (HidCode::Digit7, Modifiers::SHIFT),
        b'*' => (HidCode::Digit8, Modifiers::SHIFT),
        b'(' => (HidCode::Digit9, Modifiers::SHIFT),
        b')' => (HidCode::Digit0, Modifiers::SHIFT),
        b' ' => (HidCode::Space, Modifiers::empty()),
        b'-' => (HidCode::Minus, Modifiers::empty()),
        b'_' => (HidCode::Minus, Modifiers::SHIFT),
        b'=' => (HidCode::Equal, Modifiers::empty()),
        b'+' => (HidCode::Equal, Modifiers::SHIFT),
        b'[' => (HidCode::LeftBracket, Modifiers::empty()),
        b'{' => (HidCode::LeftBracket, Modifiers::SHIFT),
        b']' => (HidCode::RightBracket, Modifiers::empty()),
        b'}' => (HidCode::RightBracket, Modifiers::SHIFT),
        b'\\' => (HidCode::Backslash, Modifiers::empty()),
        b'|' => (HidCode::Backslash, Modifiers::SHIFT),
        b';' => (HidCode::Semicolon, Modifiers::empty()),
        b':' => (HidCode::Semicolon, Modifiers::SHIFT),
        b'\'' => (HidCode::Apostrophe, Modifiers::empty()),
        b'"' => (HidCode::Apostrophe, Modifiers::SHIFT),
        b'`' => (HidCode::Grave, Modifiers::empty()),
        b'~' => (HidCode::Grave, Modifiers::SHIFT),
        b',' => (HidCode::Comma, Modifiers::empty()),
        b'<' => (HidCode::Comma, Modifiers::SHIFT),
        b'.' => (HidCode::Period, Modifiers::empty()),
        b'>' => (HidCode::Period, Modifiers::SHIFT),
        b'/' => (HidCode::Slash, Modifiers::empty()),
        b'?' => (HidCode::Slash, Modifiers::SHIFT),
        _ => (HidCode::Space, Modifiers::empty()),
    }
}

fn letter_hid(offset: u8) -> HidCode {
    const LETTERS: [HidCode; 26] = [
        HidCode::A,
        HidCode::B,
        HidCode::C,
        HidCode::D,
        HidCode::E,
        HidCode::F,
        HidCode::G,
        HidCode::H,
        HidCode::I,
        HidCode::J,
        HidCode::K,
        HidCode::L,
        HidCode::M,
        HidCode::N,
        HidCode::O,
        HidCode::P,
        HidCode::Q,
        HidCode::R,
        HidCode::S,
        HidCode::T,
        HidCode::U,
        HidCode::V,
        HidCode::W,
        HidCode::X,
        HidCode::Y,
        HidCode::Z,
    ];
    LETTERS[offset as usize]
}

/// CSI final letter (A/B/C/D/H/F) → HID code for arrows/home/end.
pub fn csi_letter_to_hid(letter: u8) -> Option<HidCode> {
    match letter {
        b'A' => Some(HidCode::Up),
        b'B' => Some(HidCode::Down),
        b'C' => Some(HidCode::Right),
        b'D' => Some(HidCode::Left),
        b'H' => Some(HidCode::Home),
        b'F' => Some(HidCode::End),
        _ => None,
    }
}

/// CSI `n ~` tilde-sequence numeric parameter → HID code.
pub fn tilde_seq_to_hid(n: u32) -> Option<HidCode> {
    match n {
        2 => Some(HidCode::Insert),
        3 => Some(HidCode::Delete),
        5 => Some(HidCode::PageUp),
        6 => Some(HidCode::PageDown),
        11 => Some(HidCode::F1),
        12 => Some(HidCode::F2),
        13 => Some(HidCode::F3),
        14 => Some(HidCode::F4),
        15 => Some(HidCode::F5),
        17 => Some(HidCode::F6),
        18 => Some(HidCode::F7),
        19 => Some(HidCode::F8),
        20 => Some(HidCode::F9),
        21 => Some(HidCode::F10),
        23 => Some(HidCode::F11),
        24 => Some(HidCode::F12),
        _ => None,
    }
}

/// SS3 letter (P/Q/R/S) → HID code for F1-F4.
pub fn ss3_letter_to_hid(letter: u8) -> Option<HidCode> {
    match letter {
        b'P' => Some(HidCode::F1),
        b'Q' => Some(HidCode::F2),
        b'R' => Some(HidCode::F3),
        b'S' => Some(HidCode::F4),
        _ => None,
    }
}

/// Decode the CSI modifier digit `m` (1-based) into our modifier bitset.
pub fn csi_modifier_digit_to_modifiers(m: u32) -> Modifiers {
    let base = m.saturating_sub(1);
    let mut mods = Modifiers::empty();
    if base & 1 != 0 {
        mods |= Modifiers::SHIFT;
    }
    if base & 2 != 0 {
        mods |= Modifiers::ALT;
    }
    if base & 4 != 0 {
        mods |= Modifiers::CONTROL;
    }
    mods
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercase_letter_has_no_modifier() {
        assert_eq!(ascii_to_hid(b'a'), (HidCode::A, Modifiers::empty()));
    }

    #[test]
    fn uppercase_letter_sets_shift() {
        assert_eq!(ascii_to_hid(b'A'), (HidCode::A, Modifiers::SHIFT));
    }

    #[test]
    fn shifted_digit_symbol_maps_to_digit_with_shift() {
        assert_eq!(ascii_to_hid(b'!'), (HidCode::Digit1, Modifiers::SHIFT));
    }

    #[test]
    fn digit_0_follows_digit_9() {
        assert_eq!(ascii_to_hid(b'9').0, HidCode::Digit9);
        assert_eq!(ascii_to_hid(b'0').0, HidCode::Digit0);
    }

    #[test]
    fn csi_tables_match_fixed_spec() {
        assert_eq!(csi_letter_to_hid(b'A'), Some(HidCode::Up));
        assert_eq!(csi_letter_to_hid(b'F'), Some(HidCode::End));
        assert_eq!(tilde_seq_to_hid(3), Some(HidCode::Delete));
        assert_eq!(tilde_seq_to_hid(24), Some(HidCode::F12));
        assert_eq!(ss3_letter_to_hid(b'P'), Some(HidCode::F1));
    }

    #[test]
    fn ctrl_shift_modifier_digit_decodes_both_bits() {
        // CSI "1;6A" -> m=6 -> (6-1)=5 = 0b101 = SHIFT|CONTROL
        let mods = csi_modifier_digit_to_modifiers(6);
        assert!(mods.contains(Modifiers::SHIFT));
        assert!(mods.contains(Modifiers::CONTROL));
        assert!(!mods.contains(Modifiers::ALT));
    }
}
