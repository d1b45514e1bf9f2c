//! Mock hardware for integration tests.
//!
//! The fake GPIO and the recording printer share one journal, so tests can
//! assert on the relative order of pin operations and printer actions.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use embedded_hal::digital::PinState;
use filamentwatch::app::events::MonitorEvent;
use filamentwatch::app::ports::{EdgeCallback, EventSink, GpioError, GpioPort, PrintActionSink};
use filamentwatch::config::PluginSettings;
use filamentwatch::pins::{Edge, PinNumbering, Pull};
use filamentwatch::runtime::EdgeRuntime;
use filamentwatch::sensors::monitor::MonitorPorts;

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Numbering(PinNumbering),
    Configure(i32),
    Read(i32),
    Register(i32),
    Unregister(i32),
    Pause,
    Cancel,
    Send(Vec<String>),
}

pub type Journal = Arc<Mutex<Vec<Call>>>;

fn record(journal: &Journal, call: Call) {
    journal.lock().unwrap().push(call);
}

// ── FakeGpio ──────────────────────────────────────────────────

type SharedCallback = Arc<dyn Fn(i32) + Send + Sync>;

/// Fake GPIO bank.  Unset pins read low, the ok level under
/// [`test_settings`].  Levels change only through [`FakeGpio::set_level`];
/// edges are delivered only through [`FakeGpio::fire`].
pub struct FakeGpio {
    journal: Journal,
    levels: Mutex<HashMap<i32, PinState>>,
    callbacks: Mutex<HashMap<i32, SharedCallback>>,
    failing_reads: Mutex<HashSet<i32>>,
    reject_numbering: Mutex<bool>,
}

#[allow(dead_code)]
impl FakeGpio {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            levels: Mutex::new(HashMap::new()),
            callbacks: Mutex::new(HashMap::new()),
            failing_reads: Mutex::new(HashSet::new()),
            reject_numbering: Mutex::new(false),
        }
    }

    pub fn set_level(&self, pin: i32, level: PinState) {
        self.levels.lock().unwrap().insert(pin, level);
    }

    /// Deliver one raw edge to the callback registered on `pin`.
    /// Returns false if none is registered.
    pub fn fire(&self, pin: i32) -> bool {
        let callback = self.callbacks.lock().unwrap().get(&pin).cloned();
        match callback {
            Some(callback) => {
                callback(pin);
                true
            }
            None => false,
        }
    }

    pub fn fail_reads(&self, pin: i32) {
        self.failing_reads.lock().unwrap().insert(pin);
    }

    pub fn reject_numbering(&self) {
        *self.reject_numbering.lock().unwrap() = true;
    }

    pub fn is_registered(&self, pin: i32) -> bool {
        self.callbacks.lock().unwrap().contains_key(&pin)
    }
}

impl GpioPort for FakeGpio {
    fn set_numbering(&self, mode: PinNumbering) -> Result<(), GpioError> {
        record(&self.journal, Call::Numbering(mode));
        if *self.reject_numbering.lock().unwrap() {
            return Err(GpioError::NumberingRejected);
        }
        Ok(())
    }

    fn configure_input(&self, pin: i32, _pull: Pull) -> Result<(), GpioError> {
        record(&self.journal, Call::Configure(pin));
        Ok(())
    }

    fn read(&self, pin: i32) -> Result<PinState, GpioError> {
        record(&self.journal, Call::Read(pin));
        if self.failing_reads.lock().unwrap().contains(&pin) {
            return Err(GpioError::ReadFailed(pin));
        }
        Ok(self
            .levels
            .lock()
            .unwrap()
            .get(&pin)
            .copied()
            .unwrap_or(PinState::Low))
    }

    fn register_edge_callback(
        &self,
        pin: i32,
        _edge: Edge,
        _bounce: Duration,
        callback: EdgeCallback,
    ) -> Result<(), GpioError> {
        record(&self.journal, Call::Register(pin));
        let mut callbacks = self.callbacks.lock().unwrap();
        if callbacks.contains_key(&pin) {
            return Err(GpioError::EdgeDetectFailed(pin));
        }
        callbacks.insert(pin, Arc::from(callback));
        Ok(())
    }

    fn unregister_edge_callback(&self, pin: i32) {
        record(&self.journal, Call::Unregister(pin));
        let removed = self.callbacks.lock().unwrap().remove(&pin);
        drop(removed);
    }
}

// ── RecordingPrinter ──────────────────────────────────────────

pub struct RecordingPrinter {
    journal: Journal,
}

impl PrintActionSink for RecordingPrinter {
    fn pause(&self) {
        record(&self.journal, Call::Pause);
    }

    fn cancel(&self) {
        record(&self.journal, Call::Cancel);
    }

    fn send_commands(&self, commands: &[String]) {
        record(&self.journal, Call::Send(commands.to_vec()));
    }
}

// ── RecordingEvents ───────────────────────────────────────────

#[derive(Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<MonitorEvent>>,
}

#[allow(dead_code)]
impl RecordingEvents {
    pub fn events(&self) -> Vec<MonitorEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&MonitorEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingEvents {
    fn emit(&self, event: &MonitorEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// Everything a monitor or coordinator needs, wired to fakes.
pub struct Rig {
    pub journal: Journal,
    pub gpio: Arc<FakeGpio>,
    pub events: Arc<RecordingEvents>,
    pub ports: MonitorPorts,
    pub runtime: EdgeRuntime,
}

#[allow(dead_code)]
impl Rig {
    pub fn new() -> Self {
        let journal: Journal = Arc::default();
        let gpio = Arc::new(FakeGpio::new(Arc::clone(&journal)));
        let events = Arc::new(RecordingEvents::default());
        let ports = MonitorPorts {
            gpio: gpio.clone(),
            actions: Arc::new(RecordingPrinter {
                journal: Arc::clone(&journal),
            }),
            events: events.clone(),
        };
        Self {
            journal,
            gpio,
            events,
            ports,
            runtime: EdgeRuntime::start().unwrap(),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.journal.lock().unwrap().clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.journal.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    /// Journal without pin reads, which depend on timing.
    pub fn actions(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::Read(_)))
            .collect()
    }

    pub fn clear(&self) {
        self.journal.lock().unwrap().clear();
    }
}

// ── Helpers ───────────────────────────────────────────────────

pub const NONUNIFORM_PIN: i32 = 11;
pub const OVERFILL_PIN: i32 = 13;
/// Short bounce so debounce tasks finish quickly.
pub const TEST_BOUNCE_MS: u32 = 5;

/// Both sensors enabled with a short bounce, fault level high.
pub fn test_settings() -> PluginSettings {
    let mut settings = PluginSettings::default();
    settings.nonuniform.pin = NONUNIFORM_PIN;
    settings.nonuniform.bounce_ms = TEST_BOUNCE_MS;
    settings.overfill.pin = OVERFILL_PIN;
    settings.overfill.bounce_ms = TEST_BOUNCE_MS;
    settings
}

/// Poll `cond` until it holds or a 2 s deadline passes.
#[allow(dead_code)]
pub fn wait_until(cond: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    cond()
}
