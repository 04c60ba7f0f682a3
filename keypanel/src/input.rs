//! Input surface: the ordered set of channels sampled once per scan.
//!
//! Every channel is a single pulled-up input pin. Its role decides how a raw level becomes a
//! logical state and which changes of that state are reported.

use embedded_hal::digital::{Error as _, ErrorKind, InputPin};
use heapless::Vec;

use crate::keycode::{KeyCode, button_key};

/// Role of an input channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    /// Active low push button, reported as `Pressed` on every scan while it is held.
    MomentaryButton,
    /// Latching switch, logical state is the raw level. Only changes are reported.
    ToggleSwitch,
    /// Active low ignition line. Only changes are reported, both directions type the same key.
    IgnitionLine,
}

/// How a channel finds its key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyMapping {
    /// `F12 + offset`, offsets past `F24` have no key
    FunctionKeyOffset(u8),
    /// A pre-assigned key
    Fixed(KeyCode),
}

impl KeyMapping {
    pub fn key(&self) -> Option<KeyCode> {
        match *self {
            KeyMapping::FunctionKeyOffset(offset) => button_key(offset),
            KeyMapping::Fixed(key) => Some(key),
        }
    }
}

/// Result of sampling one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputSignal {
    Pressed,
    Released,
    NoChange,
    ToggledOn,
    ToggledOff,
}

impl InputSignal {
    /// Whether this signal types a key.
    pub fn fires(self) -> bool {
        matches!(
            self,
            InputSignal::Pressed | InputSignal::ToggledOn | InputSignal::ToggledOff
        )
    }
}

/// A classified, non-idle signal of a channel in the current scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelEvent {
    /// Index of the channel in the input surface
    pub id: u8,
    pub role: Role,
    pub mapping: KeyMapping,
    pub signal: InputSignal,
}

/// A single monitored input.
pub struct Channel<In: InputPin> {
    pin: In,
    role: Role,
    mapping: KeyMapping,
    /// Logical state at the end of the last successful sample, `None` before the first one
    last_state: Option<bool>,
}

impl<In: InputPin> Channel<In> {
    /// A button typing `F12 + offset` while held.
    pub fn button(pin: In, offset: u8) -> Self {
        Self::new(pin, Role::MomentaryButton, KeyMapping::FunctionKeyOffset(offset))
    }

    /// A toggle switch typing `key` whenever it flips.
    pub fn toggle_switch(pin: In, key: KeyCode) -> Self {
        Self::new(pin, Role::ToggleSwitch, KeyMapping::Fixed(key))
    }

    /// An ignition line typing `key` when it is asserted and again when it is released.
    pub fn ignition(pin: In, key: KeyCode) -> Self {
        Self::new(pin, Role::IgnitionLine, KeyMapping::Fixed(key))
    }

    fn new(pin: In, role: Role, mapping: KeyMapping) -> Self {
        Self {
            pin,
            role,
            mapping,
            last_state: None,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn mapping(&self) -> KeyMapping {
        self.mapping
    }

    /// Logical state seen by the last successful sample.
    pub fn last_state(&self) -> Option<bool> {
        self.last_state
    }

    /// Read the pin once and classify the result against the previous logical state.
    ///
    /// On a read error the stored state is left untouched, so the next sample compares
    /// against the last good reading.
    pub fn sample(&mut self) -> Result<InputSignal, In::Error> {
        let level = self.pin.is_high()?;
        let current = logical_state(self.role, level);
        let previous = self.last_state.replace(current);
        Ok(classify(self.role, previous, current))
    }
}

/// Pins idle high (pull-up). Buttons and the ignition line are active low.
fn logical_state(role: Role, level: bool) -> bool {
    match role {
        Role::MomentaryButton | Role::IgnitionLine => !level,
        Role::ToggleSwitch => level,
    }
}

fn classify(role: Role, previous: Option<bool>, current: bool) -> InputSignal {
    match role {
        Role::MomentaryButton => {
            if current {
                InputSignal::Pressed
            } else if previous == Some(true) {
                InputSignal::Released
            } else {
                InputSignal::NoChange
            }
        }
        Role::ToggleSwitch | Role::IgnitionLine => match previous {
            // First good read settles the channel
            None => InputSignal::NoChange,
            Some(previous) if previous == current => InputSignal::NoChange,
            Some(_) if current => InputSignal::ToggledOn,
            Some(_) => InputSignal::ToggledOff,
        },
    }
}

/// A pin that couldn't be read during a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReadFault {
    pub channel: u8,
    pub kind: ErrorKind,
}

/// Outcome of one scan over all channels.
#[derive(Debug, Default)]
pub struct ScanReport<const N: usize> {
    /// Non-idle signals in channel id order
    pub events: Vec<ChannelEvent, N>,
    /// Channels whose pin could not be read
    pub faulted: Vec<ReadFault, N>,
}

/// Channel ids are `u8`, a surface holds at most this many channels.
pub const MAX_CHANNELS: usize = u8::MAX as usize + 1;

/// All channels of the panel, in id order.
pub struct InputSurface<In: InputPin, const N: usize> {
    channels: [Channel<In>; N],
}

impl<In: InputPin, const N: usize> InputSurface<In, N> {
    pub fn new(channels: [Channel<In>; N]) -> Self {
        const { assert!(N <= MAX_CHANNELS, "too many channels for u8 channel ids") };
        let surface = Self { channels };
        surface.check_layout();
        surface
    }

    /// Sample every channel once, in id order.
    pub fn scan(&mut self) -> ScanReport<N> {
        let mut report = ScanReport {
            events: Vec::new(),
            faulted: Vec::new(),
        };

        for (id, channel) in self.channels.iter_mut().enumerate() {
            match channel.sample() {
                Ok(InputSignal::NoChange) => {}
                Ok(signal) => {
                    trace!("Channel {}: {:?}", id, signal);
                    let _ = report.events.push(ChannelEvent {
                        id: id as u8,
                        role: channel.role,
                        mapping: channel.mapping,
                        signal,
                    });
                }
                Err(e) => {
                    debug!("Read channel {} error: {:?}, retry in next scan", id, e.kind());
                    let _ = report.faulted.push(ReadFault {
                        channel: id as u8,
                        kind: e.kind(),
                    });
                }
            }
        }

        report
    }

    /// Ids of channels that can never type a key.
    pub fn unmapped_channels(&self) -> impl Iterator<Item = u8> + '_ {
        self.channels
            .iter()
            .enumerate()
            .filter(|(_, channel)| channel.mapping.key().is_none())
            .map(|(id, _)| id as u8)
    }

    pub fn channels(&self) -> &[Channel<In>; N] {
        &self.channels
    }

    fn check_layout(&self) {
        for id in self.unmapped_channels() {
            warn!("Channel {} is out of the function key range and will never send", id);
        }

        for (id, channel) in self.channels.iter().enumerate() {
            let Some(key) = channel.mapping.key() else {
                continue;
            };
            if let Some(first) = self.channels[..id]
                .iter()
                .position(|other| other.mapping.key() == Some(key))
            {
                warn!("Channel {} sends {:?}, same as channel {}", id, key, first);
            }
        }
    }
}

#[doc(hidden)]
pub struct ButtonOffsets(u8);

impl ButtonOffsets {
    pub const fn new() -> Self {
        Self(0)
    }

    /// Offset of the next declared button
    pub fn next_offset(&mut self) -> u8 {
        let offset = self.0;
        self.0 = self.0.saturating_add(1);
        offset
    }
}

/// Build the channel array of a panel.
///
/// Buttons get offsets in declaration order, so the first one types `F12`. Channel ids follow
/// the polling order: buttons, the ignition line, then toggle switches.
///
/// ```ignore
/// let channels = panel_channels! {
///     buttons: [b0, b1, b2],
///     ignition: (ign, KeyCode::Semicolon),
///     switches: [(s0, KeyCode::F20), (s1, KeyCode::F21)],
/// };
/// ```
#[macro_export]
macro_rules! panel_channels {
    (
        buttons: [$($button:expr),* $(,)?]
        $(, ignition: ($ignition:expr, $ignition_key:expr))?
        $(, switches: [$(($switch:expr, $switch_key:expr)),* $(,)?])?
        $(,)?
    ) => {{
        #[allow(unused_mut, unused_variables)]
        let mut offsets = $crate::input::ButtonOffsets::new();
        [
            $($crate::input::Channel::button($button, offsets.next_offset()),)*
            $($crate::input::Channel::ignition($ignition, $ignition_key),)?
            $($($crate::input::Channel::toggle_switch($switch, $switch_key),)*)?
        ]
    }};
}
