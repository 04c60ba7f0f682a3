//! HID keyboard usage codes used by the panel.

/// Function-key number of the first button: button 0 types `F12`.
pub const BUTTON_BASE_FUNCTION_KEY: u8 = 12;

/// Highest function key the panel can type.
pub const MAX_FUNCTION_KEY: u8 = 24;

/// Keyboard usage codes, values from the HID usage tables (keyboard page 0x07).
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyCode {
    /// Reserved, no key.
    No = 0x00,
    /// `;` and `:`
    Semicolon = 0x33,
    /// `F1`
    F1 = 0x3A,
    /// `F2`
    F2 = 0x3B,
    /// `F3`
    F3 = 0x3C,
    /// `F4`
    F4 = 0x3D,
    /// `F5`
    F5 = 0x3E,
    /// `F6`
    F6 = 0x3F,
    /// `F7`
    F7 = 0x40,
    /// `F8`
    F8 = 0x41,
    /// `F9`
    F9 = 0x42,
    /// `F10`
    F10 = 0x43,
    /// `F11`
    F11 = 0x44,
    /// `F12`
    F12 = 0x45,
    /// `F13`
    F13 = 0x68,
    /// `F14`
    F14 = 0x69,
    /// `F15`
    F15 = 0x6A,
    /// `F16`
    F16 = 0x6B,
    /// `F17`
    F17 = 0x6C,
    /// `F18`
    F18 = 0x6D,
    /// `F19`
    F19 = 0x6E,
    /// `F20`
    F20 = 0x6F,
    /// `F21`
    F21 = 0x70,
    /// `F22`
    F22 = 0x71,
    /// `F23`
    F23 = 0x72,
    /// `F24`
    F24 = 0x73,
}

/// Function keys indexed by `number - 1`.
const FUNCTION_KEYS: [KeyCode; MAX_FUNCTION_KEY as usize] = [
    KeyCode::F1,
    KeyCode::F2,
    KeyCode::F3,
    KeyCode::F4,
    KeyCode::F5,
    KeyCode::F6,
    KeyCode::F7,
    KeyCode::F8,
    KeyCode::F9,
    KeyCode::F10,
    KeyCode::F11,
    KeyCode::F12,
    KeyCode::F13,
    KeyCode::F14,
    KeyCode::F15,
    KeyCode::F16,
    KeyCode::F17,
    KeyCode::F18,
    KeyCode::F19,
    KeyCode::F20,
    KeyCode::F21,
    KeyCode::F22,
    KeyCode::F23,
    KeyCode::F24,
];

const FUNCTION_KEY_LABELS: [&str; MAX_FUNCTION_KEY as usize] = [
    "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12", "F13", "F14", "F15", "F16", "F17",
    "F18", "F19", "F20", "F21", "F22", "F23", "F24",
];

impl KeyCode {
    /// Returns the key `F<number>`, `None` outside `F1..=F24`.
    pub const fn function_key(number: u8) -> Option<KeyCode> {
        if number == 0 || number > MAX_FUNCTION_KEY {
            return None;
        }
        Some(FUNCTION_KEYS[(number - 1) as usize])
    }

    /// Function-key number of this key, `None` if it isn't a function key.
    pub fn function_number(self) -> Option<u8> {
        FUNCTION_KEYS
            .iter()
            .position(|k| *k == self)
            .map(|idx| idx as u8 + 1)
    }

    /// Raw HID usage id.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Human readable name, used in diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            KeyCode::No => "No",
            KeyCode::Semicolon => ";",
            key => match key.function_number() {
                Some(n) => FUNCTION_KEY_LABELS[(n - 1) as usize],
                None => "?",
            },
        }
    }
}

/// Key typed by the button at `offset` in the button list: `F12 + offset`.
///
/// Offsets past `F24` resolve to `None`.
pub const fn button_key(offset: u8) -> Option<KeyCode> {
    match BUTTON_BASE_FUNCTION_KEY.checked_add(offset) {
        Some(number) => KeyCode::function_key(number),
        None => None,
    }
}
