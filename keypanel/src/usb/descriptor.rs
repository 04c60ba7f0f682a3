use usbd_hid::descriptor::generator_prelude::*;

use crate::keycode::KeyCode;

/// KeyboardReport describes a report and its companion descriptor that can be
/// used to send keyboard button presses to a host and receive the status of the
/// keyboard LEDs.
///
/// The layout is the 8-byte boot keyboard report.
#[gen_hid_descriptor(
    (collection = APPLICATION, usage_page = GENERIC_DESKTOP, usage = KEYBOARD) = {
        (usage_page = KEYBOARD, usage_min = 0xE0, usage_max = 0xE7) = {
            #[packed_bits = 8] #[item_settings(data,variable,absolute)] modifier=input;
        };
        (logical_min = 0,) = {
            #[item_settings(constant,variable,absolute)] reserved=input;
        };
        (usage_page = LEDS, usage_min = 0x01, usage_max = 0x05) = {
            #[packed_bits = 5] #[item_settings(data,variable,absolute)] leds=output;
        };
        (usage_page = KEYBOARD, usage_min = 0x00, usage_max = 0xDD) = {
            #[item_settings(data,array,absolute)] keycodes=input;
        };
    }
)]
// `gen_hid_descriptor` derives `Debug`, `Clone`, `Copy`, `PartialEq` and `Eq`
#[derive(Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    pub modifier: u8,
    pub reserved: u8,
    pub leds: u8,
    pub keycodes: [u8; 6],
}

impl KeyboardReport {
    /// Report with `key` as the only pressed key.
    pub fn pressed(key: KeyCode) -> Self {
        let mut report = Self::default();
        report.keycodes[0] = key.as_u8();
        report
    }

    /// Report with every key released.
    pub fn released() -> Self {
        Self::default()
    }

    /// Whether no key is pressed in this report.
    pub fn is_released(&self) -> bool {
        self.modifier == 0 && self.keycodes.iter().all(|k| *k == 0)
    }
}
