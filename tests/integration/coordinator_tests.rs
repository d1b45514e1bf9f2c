//! Integration tests for the print-lifecycle coordinator.

use embedded_hal::digital::PinState;
use futures_lite::future::block_on;

use filamentwatch::app::coordinator::PrintLifecycleCoordinator;
use filamentwatch::app::events::MonitorEvent;
use filamentwatch::config::PluginSettings;
use filamentwatch::events::PrintPhase;
use filamentwatch::pins::PinNumbering;
use filamentwatch::sensors::{SensorKind, SensorStatus};

use crate::mock_hw::{Call, NONUNIFORM_PIN, OVERFILL_PIN, Rig, test_settings};

fn coordinator(rig: &Rig, settings: PluginSettings) -> PrintLifecycleCoordinator {
    PrintLifecycleCoordinator::new(settings, rig.ports.clone(), rig.runtime.clone())
}

fn position(calls: &[Call], call: &Call) -> Option<usize> {
    calls.iter().position(|c| c == call)
}

// ── Setup ─────────────────────────────────────────────────────

#[test]
fn setup_selects_numbering_and_configures_enabled_pins() {
    let rig = Rig::new();
    let mut settings = test_settings();
    settings.mode = PinNumbering::Bcm;
    let _coordinator = coordinator(&rig, settings);

    assert_eq!(
        rig.actions(),
        vec![
            Call::Numbering(PinNumbering::Bcm),
            Call::Configure(NONUNIFORM_PIN),
            Call::Configure(OVERFILL_PIN),
        ]
    );
}

#[test]
fn no_configured_pins_touch_no_hardware() {
    let rig = Rig::new();
    let mut coordinator = coordinator(&rig, PluginSettings::default());

    coordinator.on_event(PrintPhase::Started);
    coordinator.on_event(PrintPhase::Done);

    assert!(rig.calls().is_empty(), "unexpected calls: {:?}", rig.calls());
    for kind in SensorKind::ALL {
        assert_eq!(coordinator.status(kind), SensorStatus::Disabled);
    }
}

#[test]
fn rejected_numbering_disables_enabled_sensors() {
    let rig = Rig::new();
    rig.gpio.reject_numbering();
    let mut coordinator = coordinator(&rig, test_settings());

    coordinator.on_event(PrintPhase::Started);

    assert_eq!(rig.count(&Call::Register(NONUNIFORM_PIN)), 0);
    assert_eq!(rig.count(&Call::Register(OVERFILL_PIN)), 0);
    for kind in SensorKind::ALL {
        assert_eq!(coordinator.status(kind), SensorStatus::Disabled);
    }
}

// ── Started ───────────────────────────────────────────────────

#[test]
fn started_arms_both_sensors() {
    let rig = Rig::new();
    let mut coordinator = coordinator(&rig, test_settings());
    rig.clear();

    coordinator.on_host_event("PrintStarted");

    assert_eq!(rig.count(&Call::Cancel), 0);
    assert!(rig.gpio.is_registered(NONUNIFORM_PIN));
    assert!(rig.gpio.is_registered(OVERFILL_PIN));
    assert_eq!(coordinator.phase(), PrintPhase::Started);
    assert_eq!(
        rig.events.count(|e| *e == MonitorEvent::Lifecycle(PrintPhase::Started)),
        1
    );
}

#[test]
fn started_on_faulting_sensor_cancels_before_arming() {
    let rig = Rig::new();
    let mut coordinator = coordinator(&rig, test_settings());
    rig.gpio.set_level(OVERFILL_PIN, PinState::High);
    rig.clear();

    coordinator.on_event(PrintPhase::Started);

    let calls = rig.actions();
    let cancel = position(&calls, &Call::Cancel).expect("print cancelled");
    let register = position(&calls, &Call::Register(OVERFILL_PIN)).expect("sensor armed");
    assert!(cancel < register, "cancel must precede arming: {:?}", calls);
    assert_eq!(rig.count(&Call::Cancel), 1);
    assert_eq!(
        rig.events.count(|e| *e == MonitorEvent::PrintAborted(SensorKind::Overfill)),
        1
    );
}

#[test]
fn one_sensor_with_bad_settings_leaves_the_other_protected() {
    let rig = Rig::new();
    let mut settings = test_settings();
    settings.overfill.bounce_ms = 0;
    let mut coordinator = coordinator(&rig, settings);

    coordinator.on_event(PrintPhase::Started);

    assert!(rig.gpio.is_registered(NONUNIFORM_PIN));
    assert!(!rig.gpio.is_registered(OVERFILL_PIN));
    assert_eq!(coordinator.status(SensorKind::Nonuniform), SensorStatus::Ok);
    assert_eq!(coordinator.status(SensorKind::Overfill), SensorStatus::Disabled);
}

// ── Done and friends ──────────────────────────────────────────

#[test]
fn done_disarms_each_sensor_exactly_once() {
    let rig = Rig::new();
    let mut coordinator = coordinator(&rig, test_settings());
    coordinator.on_event(PrintPhase::Started);
    rig.clear();

    coordinator.on_event(PrintPhase::Done);

    assert_eq!(rig.count(&Call::Unregister(NONUNIFORM_PIN)), 1);
    assert_eq!(rig.count(&Call::Unregister(OVERFILL_PIN)), 1);
    assert!(!rig.gpio.is_registered(NONUNIFORM_PIN));
    assert!(!rig.gpio.is_registered(OVERFILL_PIN));
}

#[test]
fn terminal_phases_disarm_even_when_never_armed() {
    for phase in [
        PrintPhase::Done,
        PrintPhase::Failed,
        PrintPhase::Cancelled,
        PrintPhase::Error,
    ] {
        let rig = Rig::new();
        let mut coordinator = coordinator(&rig, test_settings());
        rig.clear();

        coordinator.on_event(phase);

        assert_eq!(rig.count(&Call::Unregister(NONUNIFORM_PIN)), 1, "{}", phase);
        assert_eq!(rig.count(&Call::Unregister(OVERFILL_PIN)), 1, "{}", phase);
    }
}

#[test]
fn paused_keeps_sensors_armed() {
    let rig = Rig::new();
    let mut coordinator = coordinator(&rig, test_settings());
    coordinator.on_event(PrintPhase::Started);
    rig.clear();

    coordinator.on_host_event("PrintPaused");

    assert!(rig.calls().is_empty());
    assert!(rig.gpio.is_registered(NONUNIFORM_PIN));
    assert_eq!(coordinator.phase(), PrintPhase::Paused);
}

#[test]
fn unknown_host_event_is_ignored() {
    let rig = Rig::new();
    let mut coordinator = coordinator(&rig, test_settings());
    rig.clear();

    coordinator.on_host_event("FileSelected");

    assert!(rig.calls().is_empty());
    assert_eq!(coordinator.phase(), PrintPhase::Idle);
}

// ── Resumed ───────────────────────────────────────────────────

#[test]
fn resumed_resets_latch() {
    let rig = Rig::new();
    let mut settings = test_settings();
    settings.send_gcode_only_once = true;
    let mut coordinator = coordinator(&rig, settings);
    coordinator.on_event(PrintPhase::Started);

    rig.gpio.set_level(NONUNIFORM_PIN, PinState::High);
    let monitor = coordinator.monitor(SensorKind::Nonuniform).clone();
    block_on(monitor.on_edge(NONUNIFORM_PIN));
    assert!(monitor.snapshot().latched);
    assert_eq!(rig.count(&Call::Pause), 1);

    // Operator fixes the filament and resumes.
    rig.gpio.set_level(NONUNIFORM_PIN, PinState::Low);
    coordinator.on_event(PrintPhase::Resumed);

    assert!(!monitor.snapshot().latched);
    assert_eq!(coordinator.status(SensorKind::Nonuniform), SensorStatus::Ok);
}

#[test]
fn status_after_cancel_follows_live_level() {
    let rig = Rig::new();
    let mut settings = test_settings();
    settings.send_gcode_only_once = true;
    let mut coordinator = coordinator(&rig, settings);
    coordinator.on_event(PrintPhase::Started);

    rig.gpio.set_level(NONUNIFORM_PIN, PinState::High);
    let monitor = coordinator.monitor(SensorKind::Nonuniform).clone();
    block_on(monitor.on_edge(NONUNIFORM_PIN));
    assert_eq!(coordinator.status(SensorKind::Nonuniform), SensorStatus::Fault);

    coordinator.on_event(PrintPhase::Cancelled);
    rig.gpio.set_level(NONUNIFORM_PIN, PinState::Low);

    assert!(!monitor.snapshot().armed);
    assert_eq!(coordinator.status(SensorKind::Nonuniform), SensorStatus::Ok);
    assert_eq!(coordinator.status_json(SensorKind::Nonuniform), r#"{"status":"1"}"#);
}

// ── Settings reload ───────────────────────────────────────────

#[test]
fn apply_settings_mid_print_rearms_on_new_pins() {
    let rig = Rig::new();
    let mut coordinator = coordinator(&rig, test_settings());
    coordinator.on_event(PrintPhase::Started);

    let mut settings = test_settings();
    settings.nonuniform.pin = 15;
    coordinator.apply_settings(settings);

    assert!(!rig.gpio.is_registered(NONUNIFORM_PIN));
    assert!(rig.gpio.is_registered(15));
    assert!(rig.gpio.is_registered(OVERFILL_PIN));
    assert_eq!(coordinator.settings().nonuniform.pin, 15);
}

#[test]
fn apply_settings_while_idle_does_not_arm() {
    let rig = Rig::new();
    let mut coordinator = coordinator(&rig, PluginSettings::default());

    coordinator.apply_settings(test_settings());

    assert_eq!(rig.count(&Call::Configure(NONUNIFORM_PIN)), 1);
    assert!(!rig.gpio.is_registered(NONUNIFORM_PIN));
    assert_eq!(coordinator.status(SensorKind::Nonuniform), SensorStatus::Ok);
}

// ── Status API ────────────────────────────────────────────────

#[test]
fn status_json_uses_wire_codes() {
    let rig = Rig::new();
    let mut settings = test_settings();
    settings.overfill.pin = -1;
    let coordinator = coordinator(&rig, settings);

    assert_eq!(coordinator.status_json(SensorKind::Nonuniform), r#"{"status":"1"}"#);
    assert_eq!(coordinator.status_json(SensorKind::Overfill), r#"{"status":"-1"}"#);

    rig.gpio.set_level(NONUNIFORM_PIN, PinState::High);
    assert_eq!(coordinator.status_json(SensorKind::Nonuniform), r#"{"status":"0"}"#);
}
