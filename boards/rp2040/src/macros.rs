/// Build the panel channels from Pico pin names, every pin is an input with pull-up.
macro_rules! config_panel_pins_rp {
    (
        peripherals: $p:ident,
        buttons: [$($button:ident),* $(,)?],
        ignition: ($ignition:ident, $ignition_key:expr),
        switches: [$(($switch:ident, $switch_key:expr)),* $(,)?] $(,)?
    ) => {
        keypanel::panel_channels! {
            buttons: [$(Input::new($p.$button, Pull::Up)),*],
            ignition: (Input::new($p.$ignition, Pull::Up), $ignition_key),
            switches: [$((Input::new($p.$switch, Pull::Up), $switch_key)),*],
        }
    };
}
