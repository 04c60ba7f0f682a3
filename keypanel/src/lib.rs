#![doc = include_str!("../../README.md")]
//! ## Feature flags
#![doc = document_features::document_features!()]
#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_usb::driver::Driver;
use embedded_hal::digital::InputPin;
use embedded_hal_async::delay::DelayNs;

pub mod config;
pub mod dispatcher;
pub mod hid;
pub mod input;
pub mod keycode;
pub mod panel;
pub mod usb;

pub use config::{DebounceConfig, KeyboardUsbConfig, PanelConfig, ScanConfig};
pub use dispatcher::{Diagnostic, DiagnosticSink, Dispatcher, KeyRecord, LogSink};
pub use input::{Channel, InputSurface};
pub use keycode::KeyCode;
pub use panel::{Panel, PanelError};

/// Mutex used by every channel in the crate
pub type RawMutex = CriticalSectionRawMutex;

/// Run the panel on a USB device until the host goes away.
///
/// The scan loop starts once the host has enabled the keyboard endpoint. The returned error is
/// the one that stopped it, the board is expected to reset afterwards.
pub async fn run_panel<D, In, Dl, const N: usize>(
    channels: [Channel<In>; N],
    driver: D,
    delay: Dl,
    config: PanelConfig<'static>,
) -> PanelError
where
    D: Driver<'static>,
    In: InputPin,
    Dl: DelayNs,
{
    let mut builder = usb::new_usb_builder(driver, config.usb_config);
    let keyboard_writer = usb::build_keyboard_writer(&mut builder);
    let mut usb_device = builder.build();

    let panel_task = async {
        let mut writer = usb::UsbKeyboardWriter::new(keyboard_writer);
        writer.ready().await;

        let surface = InputSurface::new(channels);
        let dispatcher = Dispatcher::new(writer, LogSink);
        let mut panel = Panel::new(surface, dispatcher, delay, config.scan_config);
        match panel.run().await {
            Ok(never) => match never {},
            Err(e) => e,
        }
    };

    match select(usb_device.run(), panel_task).await {
        Either::First(never) => never,
        Either::Second(e) => e,
    }
}
