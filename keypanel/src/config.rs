use embassy_time::Duration;

use crate::input::Role;

/// Idle delay at the end of every scan.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Hold after a button typed its key.
pub const DEFAULT_BUTTON_DEBOUNCE: Duration = Duration::from_millis(200);

/// The config struct for the panel.
///
/// Everything here is compiled in, nothing is loaded or changed at runtime.
#[derive(Default)]
pub struct PanelConfig<'a> {
    pub usb_config: KeyboardUsbConfig<'a>,
    pub scan_config: ScanConfig,
}

/// Config for the usb device
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardUsbConfig<'a> {
    /// Vender id
    pub vid: u16,
    /// Product id
    pub pid: u16,
    /// Manufacturer
    pub manufacturer: &'a str,
    /// Product name
    pub product_name: &'a str,
    /// Serial number
    pub serial_number: &'a str,
}

impl Default for KeyboardUsbConfig<'_> {
    fn default() -> Self {
        Self {
            vid: 0x4c4b,
            pid: 0x4651,
            manufacturer: "keypanel",
            product_name: "Key Panel",
            serial_number: "000001",
        }
    }
}

/// Timing of the scan loop
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanConfig {
    /// Delay at the end of every iteration, whether or not anything fired
    pub poll_interval: Duration,
    pub debounce: DebounceConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            debounce: DebounceConfig::default(),
        }
    }
}

/// Hold applied after a channel of the given role typed a key, before the next channel is handled.
///
/// Only buttons hold by default. Toggle switches and the ignition line are edge detected and
/// get no bounce protection unless a hold is configured here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DebounceConfig {
    pub button: Duration,
    pub toggle_switch: Duration,
    pub ignition: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            button: DEFAULT_BUTTON_DEBOUNCE,
            toggle_switch: Duration::from_ticks(0),
            ignition: Duration::from_ticks(0),
        }
    }
}

impl DebounceConfig {
    /// Same hold for every role.
    pub const fn uniform(hold: Duration) -> Self {
        Self {
            button: hold,
            toggle_switch: hold,
            ignition: hold,
        }
    }

    /// Hold after a key from a channel of `role`, `None` when the role doesn't hold.
    pub fn hold_after(&self, role: Role) -> Option<Duration> {
        let hold = match role {
            Role::MomentaryButton => self.button,
            Role::ToggleSwitch => self.toggle_switch,
            Role::IgnitionLine => self.ignition,
        };
        if hold.as_ticks() == 0 { None } else { Some(hold) }
    }
}
