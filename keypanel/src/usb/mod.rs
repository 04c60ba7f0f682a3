pub mod descriptor;

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_usb::class::hid::{Config, HidBootProtocol, HidSubclass, HidWriter, ReportId, RequestHandler, State};
use embassy_usb::control::OutResponse;
use embassy_usb::driver::Driver;
use embassy_usb::{Builder, Handler};
use static_cell::StaticCell;
use usbd_hid::descriptor::SerializedDescriptor;

use crate::config::KeyboardUsbConfig;
use crate::hid::{HidError, HidWriterTrait};
use descriptor::KeyboardReport;

/// Whether the host has configured the device
pub(crate) static USB_CONFIGURED: AtomicBool = AtomicBool::new(false);

/// Writes keyboard reports to the USB HID endpoint.
pub struct UsbKeyboardWriter<'d, D: Driver<'d>> {
    keyboard_writer: HidWriter<'d, D, 8>,
}

impl<'d, D: Driver<'d>> UsbKeyboardWriter<'d, D> {
    pub fn new(keyboard_writer: HidWriter<'d, D, 8>) -> Self {
        Self { keyboard_writer }
    }

    /// Wait until the host enables the endpoint.
    pub async fn ready(&mut self) {
        self.keyboard_writer.ready().await;
        info!("Keyboard endpoint ready");
    }
}

impl<'d, D: Driver<'d>> HidWriterTrait for UsbKeyboardWriter<'d, D> {
    type ReportType = KeyboardReport;

    async fn write_report(&mut self, report: Self::ReportType) -> Result<usize, HidError> {
        if !USB_CONFIGURED.load(Ordering::Acquire) {
            return Err(HidError::UsbDisabled);
        }
        self.keyboard_writer
            .write_serialize(&report)
            .await
            .map_err(HidError::UsbEndpointError)?;
        Ok(8)
    }
}

pub fn new_usb_builder<D: Driver<'static>>(driver: D, keyboard_config: KeyboardUsbConfig<'static>) -> Builder<'static, D> {
    // Create embassy-usb Config
    let mut usb_config = embassy_usb::Config::new(keyboard_config.vid, keyboard_config.pid);
    usb_config.manufacturer = Some(keyboard_config.manufacturer);
    usb_config.product = Some(keyboard_config.product_name);
    usb_config.serial_number = Some(keyboard_config.serial_number);
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;

    const USB_BUF_SIZE: usize = 128;

    static CONFIG_DESC: StaticCell<[u8; USB_BUF_SIZE]> = StaticCell::new();
    static BOS_DESC: StaticCell<[u8; 16]> = StaticCell::new();
    static MSOS_DESC: StaticCell<[u8; 16]> = StaticCell::new();
    static CONTROL_BUF: StaticCell<[u8; USB_BUF_SIZE]> = StaticCell::new();

    let mut builder = Builder::new(
        driver,
        usb_config,
        &mut CONFIG_DESC.init([0; USB_BUF_SIZE])[..],
        &mut BOS_DESC.init([0; 16])[..],
        &mut MSOS_DESC.init([0; 16])[..],
        &mut CONTROL_BUF.init([0; USB_BUF_SIZE])[..],
    );

    static DEVICE_HANDLER: StaticCell<UsbDeviceHandler> = StaticCell::new();
    builder.handler(DEVICE_HANDLER.init(UsbDeviceHandler::new()));

    builder
}

/// Add the keyboard interface to the device.
pub fn build_keyboard_writer<D: Driver<'static>>(builder: &mut Builder<'static, D>) -> HidWriter<'static, D, 8> {
    static KEYBOARD_STATE: StaticCell<State> = StaticCell::new();
    static KEYBOARD_HANDLER: StaticCell<UsbRequestHandler> = StaticCell::new();

    let hid_config = Config {
        report_descriptor: KeyboardReport::desc(),
        request_handler: Some(KEYBOARD_HANDLER.init(UsbRequestHandler {})),
        poll_ms: 1,
        max_packet_size: 8,
        hid_subclass: HidSubclass::Boot,
        hid_boot_protocol: HidBootProtocol::Keyboard,
    };

    HidWriter::new(builder, KEYBOARD_STATE.init(State::new()), hid_config)
}

pub(crate) struct UsbRequestHandler {}

impl RequestHandler for UsbRequestHandler {
    fn set_report(&mut self, id: ReportId, data: &[u8]) -> OutResponse {
        // Host LED state, the panel has no LEDs
        debug!("Set report for {:?}: {:?}", id, data);
        OutResponse::Accepted
    }
}

pub(crate) struct UsbDeviceHandler {}

impl UsbDeviceHandler {
    fn new() -> Self {
        UsbDeviceHandler {}
    }
}

impl Handler for UsbDeviceHandler {
    fn enabled(&mut self, enabled: bool) {
        if enabled {
            info!("Device enabled");
        } else {
            info!("Device disabled");
            USB_CONFIGURED.store(false, Ordering::Release);
        }
    }

    fn reset(&mut self) {
        info!("Bus reset, the Vbus current limit is 100mA");
        USB_CONFIGURED.store(false, Ordering::Release);
    }

    fn addressed(&mut self, addr: u8) {
        info!("USB address set to: {}", addr);
    }

    fn configured(&mut self, configured: bool) {
        if configured {
            info!("Device configured, it may now draw up to the configured current from Vbus.");
        } else {
            info!("Device is no longer configured, the Vbus current limit is 100mA.");
        }
        USB_CONFIGURED.store(configured, Ordering::Release);
    }

    fn suspended(&mut self, suspended: bool) {
        if suspended {
            info!("Device suspended");
        } else {
            info!("Device resumed");
        }
    }
}
