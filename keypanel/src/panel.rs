//! The scan loop.
//!
//! Every iteration goes `Sampling -> Dispatching -> Idle`:
//!
//! - Sampling first retries a release-all report that didn't go out in an earlier iteration, then
//!   reads every channel once and classifies the result.
//! - Dispatching types the key of every fired signal in channel id order. A channel whose role
//!   has a debounce hold delays everything after it, including the next sample.
//! - Idle waits for the poll interval, whether or not anything fired.
//!
//! There is no terminal state, the loop only stops on a fatal HID error.

use core::convert::Infallible;

use embassy_time::Duration;
use embedded_hal::digital::InputPin;
use embedded_hal_async::delay::DelayNs;
use heapless::Vec;

use crate::config::ScanConfig;
use crate::dispatcher::{Diagnostic, DiagnosticSink, Dispatch, Dispatcher};
use crate::hid::{HidError, HidWriterTrait};
use crate::input::InputSurface;
use crate::keycode::KeyCode;
use crate::usb::descriptor::KeyboardReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PanelError {
    /// The HID device is gone
    Hid(HidError),
}

impl From<HidError> for PanelError {
    fn from(e: HidError) -> Self {
        PanelError::Hid(e)
    }
}

/// What one pass of sampling and dispatching did.
#[derive(Debug, Default)]
pub struct PollReport<const N: usize> {
    /// Keys tapped, as `(channel id, key)`, in dispatch order
    pub sent: Vec<(u8, KeyCode), N>,
    /// Channels whose key couldn't be written
    pub failed: Vec<u8, N>,
    /// Channels whose pin couldn't be read
    pub faulted: Vec<u8, N>,
}

pub struct Panel<In: InputPin, W, S, D, const N: usize> {
    surface: InputSurface<In, N>,
    dispatcher: Dispatcher<W, S>,
    delay: D,
    config: ScanConfig,
}

impl<In, W, S, D, const N: usize> Panel<In, W, S, D, N>
where
    In: InputPin,
    W: HidWriterTrait<ReportType = KeyboardReport>,
    S: DiagnosticSink,
    D: DelayNs,
{
    pub fn new(surface: InputSurface<In, N>, dispatcher: Dispatcher<W, S>, delay: D, config: ScanConfig) -> Self {
        Self {
            surface,
            dispatcher,
            delay,
            config,
        }
    }

    /// Sample all channels and dispatch what fired.
    pub async fn poll(&mut self) -> Result<PollReport<N>, PanelError> {
        self.dispatcher.flush_release().await?;

        let scan = self.surface.scan();
        let mut report = PollReport::default();
        for fault in scan.faulted.iter() {
            self.dispatcher.record(Diagnostic::ReadFault(*fault));
            let _ = report.faulted.push(fault.channel);
        }

        for event in scan.events.iter() {
            let typed = match self.dispatcher.dispatch(event).await? {
                Dispatch::Sent(key) => {
                    let _ = report.sent.push((event.id, key));
                    true
                }
                Dispatch::Failed(_) => {
                    let _ = report.failed.push(event.id);
                    true
                }
                Dispatch::Dropped => false,
            };

            if typed {
                if let Some(hold) = self.config.debounce.hold_after(event.role) {
                    self.wait(hold).await;
                }
            }
        }

        Ok(report)
    }

    /// One full iteration: `poll`, then the idle delay.
    pub async fn step(&mut self) -> Result<PollReport<N>, PanelError> {
        let report = self.poll().await?;
        self.wait(self.config.poll_interval).await;
        Ok(report)
    }

    /// Run the scan loop, only returns on a fatal error.
    pub async fn run(&mut self) -> Result<Infallible, PanelError> {
        info!("Panel scan loop started, poll interval {}ms", self.config.poll_interval.as_millis());
        loop {
            self.step().await?;
        }
    }

    pub fn surface(&self) -> &InputSurface<In, N> {
        &self.surface
    }

    pub fn dispatcher(&self) -> &Dispatcher<W, S> {
        &self.dispatcher
    }

    async fn wait(&mut self, duration: Duration) {
        let us = duration.as_micros().min(u32::MAX as u64) as u32;
        self.delay.delay_us(us).await;
    }
}
