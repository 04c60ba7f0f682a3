//! Event dispatcher: turns channel events into key taps on the HID writer.

use embassy_sync::channel::Sender;

use crate::RawMutex;
use crate::hid::{HidError, HidWriterTrait};
use crate::input::{ChannelEvent, InputSignal, KeyMapping, ReadFault};
use crate::keycode::KeyCode;
use crate::usb::descriptor::KeyboardReport;

/// Diagnostic record of a typed key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyRecord {
    pub channel: u8,
    pub key: KeyCode,
    pub label: &'static str,
}

/// A report that couldn't be written to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WriteFault {
    /// Channel whose tap the report belongs to
    pub channel: u8,
    /// Pressed key, `KeyCode::No` for the release-all report
    pub key: KeyCode,
    pub error: HidError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Diagnostic {
    /// A key reached the host
    Key(KeyRecord),
    ReadFault(ReadFault),
    WriteFault(WriteFault),
}

/// Receiver of diagnostics. Recording must not block and must not fail.
pub trait DiagnosticSink {
    fn record(&mut self, diagnostic: Diagnostic);
}

/// Writes every diagnostic to the log.
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn record(&mut self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::Key(record) => info!("Channel {}: pressed {}", record.channel, record.label),
            Diagnostic::ReadFault(fault) => warn!("Read channel {} error: {:?}", fault.channel, fault.kind),
            Diagnostic::WriteFault(fault) => warn!(
                "Send {:?} of channel {} error: {:?}",
                fault.key, fault.channel, fault.error
            ),
        }
    }
}

/// Forwards diagnostics to a channel, they are dropped when the channel is full.
pub struct ChannelSink<'a, const N: usize> {
    sender: Sender<'a, RawMutex, Diagnostic, N>,
}

impl<'a, const N: usize> ChannelSink<'a, N> {
    pub fn new(sender: Sender<'a, RawMutex, Diagnostic, N>) -> Self {
        Self { sender }
    }
}

impl<const N: usize> DiagnosticSink for ChannelSink<'_, N> {
    fn record(&mut self, diagnostic: Diagnostic) {
        if self.sender.try_send(diagnostic).is_err() {
            trace!("Diagnostic channel full, {:?} dropped", diagnostic);
        }
    }
}

/// Key typed by a signal, `None` if the signal doesn't fire or the mapping is out of range.
///
/// Both directions of a toggle switch or the ignition line type the same key.
pub fn resolve_key(mapping: KeyMapping, signal: InputSignal) -> Option<KeyCode> {
    if !signal.fires() {
        return None;
    }
    mapping.key()
}

/// What happened to a dispatched event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dispatch {
    /// The key was tapped
    Sent(KeyCode),
    /// Nothing to type
    Dropped,
    /// The tap didn't reach the host, the loop carries on
    Failed(KeyCode),
}

pub struct Dispatcher<W, S> {
    writer: W,
    sink: S,
    /// Channel whose release-all report didn't go out
    pending_release: Option<u8>,
}

impl<W: HidWriterTrait<ReportType = KeyboardReport>, S: DiagnosticSink> Dispatcher<W, S> {
    pub fn new(writer: W, sink: S) -> Self {
        Self {
            writer,
            sink,
            pending_release: None,
        }
    }

    /// Type the key of `event`, if any.
    ///
    /// Only fatal HID errors are returned, transient ones are recorded and reported as `Dispatch::Failed`.
    pub async fn dispatch(&mut self, event: &ChannelEvent) -> Result<Dispatch, HidError> {
        let Some(key) = resolve_key(event.mapping, event.signal) else {
            if event.signal.fires() {
                debug!("Channel {} has no key in range, {:?} dropped", event.id, event.signal);
            }
            return Ok(Dispatch::Dropped);
        };

        match self.tap(event.id, key).await {
            Ok(()) => {
                self.record(Diagnostic::Key(KeyRecord {
                    channel: event.id,
                    key,
                    label: key.label(),
                }));
                Ok(Dispatch::Sent(key))
            }
            Err(e) => {
                self.record_write_fault(event.id, key, e);
                if e.is_fatal() {
                    error!("HID device lost while sending {:?}: {:?}", key, e);
                    Err(e)
                } else {
                    Ok(Dispatch::Failed(key))
                }
            }
        }
    }

    /// Press `key` then release all keys, returns the result of the press.
    ///
    /// A release that fails transiently is kept pending and retried by `flush_release`.
    pub async fn tap(&mut self, channel: u8, key: KeyCode) -> Result<(), HidError> {
        let pressed = self.writer.write_report(KeyboardReport::pressed(key)).await;
        if let Err(e) = pressed {
            if e.is_fatal() {
                return Err(e);
            }
        }

        // Released even if the press didn't go out
        match self.writer.write_report(KeyboardReport::released()).await {
            Ok(_) => self.pending_release = None,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                self.record_write_fault(channel, KeyCode::No, e);
                self.pending_release = Some(channel);
            }
        }
        pressed.map(|_| ())
    }

    /// Retry the release-all report of an earlier tap, if it didn't go out.
    ///
    /// Only fatal errors are returned, the release stays pending after a transient one.
    pub async fn flush_release(&mut self) -> Result<(), HidError> {
        let Some(channel) = self.pending_release else {
            return Ok(());
        };
        match self.writer.write_report(KeyboardReport::released()).await {
            Ok(_) => {
                debug!("Pending release of channel {} sent", channel);
                self.pending_release = None;
                Ok(())
            }
            Err(e) => {
                self.record_write_fault(channel, KeyCode::No, e);
                if e.is_fatal() { Err(e) } else { Ok(()) }
            }
        }
    }

    /// Whether a release-all report is still owed to the host.
    pub fn release_pending(&self) -> bool {
        self.pending_release.is_some()
    }

    pub fn record(&mut self, diagnostic: Diagnostic) {
        self.sink.record(diagnostic);
    }

    fn record_write_fault(&mut self, channel: u8, key: KeyCode, error: HidError) {
        self.record(Diagnostic::WriteFault(WriteFault { channel, key, error }));
    }
}
