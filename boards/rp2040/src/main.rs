#![no_main]
#![no_std]

#[macro_use]
mod macros;

use defmt::{error, info};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::peripherals::USB;
use embassy_rp::usb::{Driver, InterruptHandler};
use embassy_time::Delay;
use keypanel::config::{KeyboardUsbConfig, PanelConfig};
use keypanel::keycode::KeyCode;
use keypanel::run_panel;
use panic_probe as _;

bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => InterruptHandler<USB>;
});

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Key panel start!");
    // Initialize peripherals
    let p = embassy_rp::init(Default::default());

    // Create the usb driver, from the HAL
    let driver = Driver::new(p.USB, Irqs);

    // Buttons type F12..F19, the switches F20..F24
    #[rustfmt::skip]
    let channels = config_panel_pins_rp! {
        peripherals: p,
        buttons: [PIN_0, PIN_1, PIN_2, PIN_3, PIN_4, PIN_5, PIN_6, PIN_7],
        ignition: (PIN_13, KeyCode::Semicolon),
        switches: [
            (PIN_8, KeyCode::F20),
            (PIN_9, KeyCode::F21),
            (PIN_10, KeyCode::F22),
            (PIN_11, KeyCode::F23),
            (PIN_12, KeyCode::F24),
        ],
    };

    let config = PanelConfig {
        usb_config: KeyboardUsbConfig {
            vid: 0x4c4b,
            pid: 0x4651,
            manufacturer: "keypanel",
            product_name: "Pico Key Panel",
            serial_number: "pico:000001",
        },
        ..Default::default()
    };

    let e = run_panel(channels, driver, Delay, config).await;
    error!("Panel stopped with {:?}, resetting", e);
    cortex_m::peripheral::SCB::sys_reset();
}
