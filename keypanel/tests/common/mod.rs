#![allow(dead_code)]

use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, InputPin};
use embedded_hal_async::delay::DelayNs;
use keypanel::config::ScanConfig;
use keypanel::dispatcher::{Diagnostic, DiagnosticSink, Dispatcher, KeyRecord, WriteFault};
use keypanel::hid::{HidError, HidWriterTrait};
use keypanel::input::{Channel, InputSurface, ReadFault};
use keypanel::keycode::KeyCode;
use keypanel::panel::Panel;
use keypanel::usb::descriptor::KeyboardReport;

// Init logger for tests
#[ctor::ctor]
pub fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

const NS_PER_MS: u64 = 1_000_000;

/// Virtual time shared by the delay, the pins and the writer, in nanoseconds.
#[derive(Clone, Default)]
pub struct Clock(Rc<Cell<u64>>);

impl Clock {
    pub fn now_ms(&self) -> u64 {
        self.0.get() / NS_PER_MS
    }

    fn advance_ns(&self, ns: u64) {
        self.0.set(self.0.get() + ns);
    }
}

/// Delay that completes immediately and moves the clock forward.
pub struct TestDelay {
    clock: Clock,
    /// Every requested delay, in milliseconds
    pub waits: Rc<RefCell<Vec<u64>>>,
}

impl TestDelay {
    pub fn new(clock: &Clock) -> Self {
        Self {
            clock: clock.clone(),
            waits: Rc::default(),
        }
    }
}

impl DelayNs for TestDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.clock.advance_ns(ns as u64);
        self.waits.borrow_mut().push(ns as u64 / NS_PER_MS);
    }
}

/// Pin following a fixed level timeline.
///
/// `changes` holds `(time in ms, level)` pairs sorted by time. The level before the first
/// change is `initial`.
pub struct TimelinePin {
    clock: Clock,
    initial: bool,
    changes: Vec<(u64, bool)>,
}

impl TimelinePin {
    pub fn new(clock: &Clock, initial: bool, changes: &[(u64, bool)]) -> Self {
        Self {
            clock: clock.clone(),
            initial,
            changes: changes.to_vec(),
        }
    }

    /// Pin that stays at `level` forever
    pub fn steady(clock: &Clock, level: bool) -> Self {
        Self::new(clock, level, &[])
    }

    fn level(&self) -> bool {
        let now = self.clock.now_ms();
        self.changes
            .iter()
            .take_while(|(at, _)| *at <= now)
            .last()
            .map_or(self.initial, |(_, level)| *level)
    }
}

impl ErrorType for TimelinePin {
    type Error = Infallible;
}

impl InputPin for TimelinePin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level())
    }
}

/// HID writer recording every report with the time it was written.
///
/// Queued outcomes are consumed by the next writes in order: `Some` fails the write, `None` lets
/// it through.
#[derive(Clone)]
pub struct TestWriter {
    clock: Clock,
    pub reports: Rc<RefCell<Vec<(u64, KeyboardReport)>>>,
    pub outcomes: Rc<RefCell<VecDeque<Option<HidError>>>>,
}

impl TestWriter {
    pub fn new(clock: &Clock) -> Self {
        Self {
            clock: clock.clone(),
            reports: Rc::default(),
            outcomes: Rc::default(),
        }
    }

    pub fn fail_next(&self, error: HidError) {
        self.outcomes.borrow_mut().push_back(Some(error));
    }

    pub fn succeed_next(&self) {
        self.outcomes.borrow_mut().push_back(None);
    }

    pub fn last_report(&self) -> Option<KeyboardReport> {
        self.reports.borrow().last().map(|(_, report)| *report)
    }

    /// Keys of the press reports, with the time they were written.
    pub fn typed(&self) -> Vec<(u64, KeyCode)> {
        self.reports
            .borrow()
            .iter()
            .filter(|(_, report)| !report.is_released())
            .map(|(at, report)| (*at, key_of(report)))
            .collect()
    }

    pub fn typed_keys(&self) -> Vec<KeyCode> {
        self.typed().into_iter().map(|(_, key)| key).collect()
    }
}

impl HidWriterTrait for TestWriter {
    type ReportType = KeyboardReport;

    async fn write_report(&mut self, report: KeyboardReport) -> Result<usize, HidError> {
        if let Some(Some(error)) = self.outcomes.borrow_mut().pop_front() {
            return Err(error);
        }
        self.reports.borrow_mut().push((self.clock.now_ms(), report));
        Ok(8)
    }
}

fn key_of(report: &KeyboardReport) -> KeyCode {
    (1..=24)
        .filter_map(KeyCode::function_key)
        .chain([KeyCode::Semicolon])
        .find(|key| key.as_u8() == report.keycodes[0])
        .unwrap_or(KeyCode::No)
}

/// Sink keeping every diagnostic.
#[derive(Clone, Default)]
pub struct TestSink {
    pub records: Rc<RefCell<Vec<Diagnostic>>>,
}

impl TestSink {
    pub fn keys(&self) -> Vec<KeyRecord> {
        self.records
            .borrow()
            .iter()
            .filter_map(|d| match d {
                Diagnostic::Key(record) => Some(*record),
                _ => None,
            })
            .collect()
    }

    pub fn read_faults(&self) -> Vec<ReadFault> {
        self.records
            .borrow()
            .iter()
            .filter_map(|d| match d {
                Diagnostic::ReadFault(fault) => Some(*fault),
                _ => None,
            })
            .collect()
    }

    pub fn write_faults(&self) -> Vec<WriteFault> {
        self.records
            .borrow()
            .iter()
            .filter_map(|d| match d {
                Diagnostic::WriteFault(fault) => Some(*fault),
                _ => None,
            })
            .collect()
    }
}

impl DiagnosticSink for TestSink {
    fn record(&mut self, diagnostic: Diagnostic) {
        self.records.borrow_mut().push(diagnostic);
    }
}

pub type TestPanel<const N: usize> = Panel<TimelinePin, TestWriter, TestSink, TestDelay, N>;

/// Everything a panel test needs to look at after running the panel.
pub struct Harness {
    pub clock: Clock,
    pub writer: TestWriter,
    pub sink: TestSink,
    pub waits: Rc<RefCell<Vec<u64>>>,
}

pub fn create_test_panel<const N: usize>(
    clock: &Clock,
    channels: [Channel<TimelinePin>; N],
    config: ScanConfig,
) -> (TestPanel<N>, Harness) {
    let writer = TestWriter::new(clock);
    let sink = TestSink::default();
    let delay = TestDelay::new(clock);
    let harness = Harness {
        clock: clock.clone(),
        writer: writer.clone(),
        sink: sink.clone(),
        waits: delay.waits.clone(),
    };
    let panel = Panel::new(
        InputSurface::new(channels),
        Dispatcher::new(writer, sink),
        delay,
        config,
    );
    (panel, harness)
}
