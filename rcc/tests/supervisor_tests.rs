//! Supervisor behavior tests against scripted motor and show controllers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rcc::RideSupervisor;
use rcc::hmi::RideTelemetry;
use rcc::safety;
use rcc_common::hmi::TelemetryReader;
use rcc_common::motor::{MotorControllerState, MotorService, ServiceError};
use rcc_common::panel::{
    MomentaryButton, MomentarySwitch, PanelEvent, SustainedSwitch, panel_channel,
};
use rcc_common::show::ShowController;
use rcc_common::status::ControllerStatus;
use rcc_common::telemetry::ControllerTelemetry;
use rcc_common::timing::ShutdownSignal;

type Journal = Arc<Mutex<Vec<String>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scripted motor service that records commands into a shared journal.
struct MockMotor {
    journal: Journal,
    state: Mutex<MotorControllerState>,
    status: Mutex<ControllerStatus>,
    estop_active: AtomicBool,
    stale: AtomicBool,
}

impl MockMotor {
    fn healthy(journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            journal: Arc::clone(journal),
            state: Mutex::new(MotorControllerState::Idle),
            status: Mutex::new(ControllerStatus::Normal),
            estop_active: AtomicBool::new(false),
            stale: AtomicBool::new(false),
        })
    }

    fn set_state(&self, state: MotorControllerState) {
        *lock(&self.state) = state;
    }

    fn set_status(&self, status: ControllerStatus) {
        *lock(&self.status) = status;
    }

    fn set_estop_active(&self, active: bool) {
        self.estop_active.store(active, Ordering::Relaxed);
    }

    fn set_stale(&self, stale: bool) {
        self.stale.store(stale, Ordering::Relaxed);
    }
}

impl MotorService for MockMotor {
    fn start(&self) -> Result<(), ServiceError> {
        Ok(())
    }

    fn shutdown(&self) {
        lock(&self.journal).push("shutdown".to_string());
    }

    fn start_ride_sequence(&self) {
        lock(&self.journal).push("start_ride_sequence".to_string());
    }

    fn home(&self) {
        lock(&self.journal).push("home".to_string());
    }

    fn jog_motor(&self, motor: u8, direction: i8) -> bool {
        lock(&self.journal).push(format!("jog({motor},{direction})"));
        true
    }

    fn stop_motion(&self) {
        lock(&self.journal).push("stop_motion".to_string());
    }

    fn halt_motion(&self) {
        lock(&self.journal).push("halt_motion".to_string());
    }

    fn state(&self) -> MotorControllerState {
        *lock(&self.state)
    }

    fn motor_speeds(&self) -> (f64, f64) {
        (0.0, 0.0)
    }

    fn motor_positions(&self) -> (i32, i32) {
        (0, 0)
    }

    fn motor_currents(&self) -> (f64, f64) {
        (0.0, 0.0)
    }

    fn voltage(&self) -> f64 {
        12.0
    }

    fn temperature(&self, _sensor: u8) -> f64 {
        25.0
    }

    fn controller_status(&self) -> ControllerStatus {
        *lock(&self.status)
    }

    fn telemetry(&self) -> ControllerTelemetry {
        ControllerTelemetry::default()
    }

    fn telemetry_age(&self) -> f64 {
        if self.stale.load(Ordering::Relaxed) {
            f64::INFINITY
        } else {
            0.0
        }
    }

    fn is_telemetry_stale(&self) -> bool {
        self.stale.load(Ordering::Relaxed)
    }

    fn is_estop_active(&self) -> bool {
        self.estop_active.load(Ordering::Relaxed)
    }
}

/// Scripted show controller sharing the same journal.
struct MockShow {
    journal: Journal,
}

impl ShowController for MockShow {
    fn start_show(&self) {
        lock(&self.journal).push("start_show".to_string());
    }

    fn stop_show(&self) {
        lock(&self.journal).push("stop_show".to_string());
    }

    fn status(&self) -> String {
        "Stopped".to_string()
    }
}

struct Rig {
    journal: Journal,
    motor: Arc<MockMotor>,
    supervisor: RideSupervisor,
    events: SyncSender<PanelEvent>,
}

fn rig() -> Rig {
    let journal: Journal = Arc::new(Mutex::new(Vec::new()));
    let motor = MockMotor::healthy(&journal);
    let show = Arc::new(MockShow {
        journal: Arc::clone(&journal),
    });
    let (events, rx) = panel_channel();
    let supervisor = RideSupervisor::new(
        Arc::clone(&motor) as Arc<dyn MotorService>,
        show as Arc<dyn ShowController>,
        rx,
        ShutdownSignal::new(),
    );
    Rig {
        journal,
        motor,
        supervisor,
        events,
    }
}

impl Rig {
    fn journal(&self) -> Vec<String> {
        lock(&self.journal).clone()
    }
}

#[test]
fn estop_event_latches_before_next_event() {
    let mut rig = rig();

    // E-Stop followed immediately by a dispatch attempt in the same drain.
    rig.events
        .send(PanelEvent::EStop(MomentaryButton::Pressed))
        .unwrap();
    rig.events
        .send(PanelEvent::Dispatch(MomentaryButton::Pressed))
        .unwrap();
    rig.supervisor.tick();

    assert!(rig.supervisor.is_estop_latched());
    let journal = rig.journal();
    assert_eq!(journal[0], "halt_motion");
    assert_eq!(journal[1], "stop_show");
    assert!(!journal.contains(&"start_ride_sequence".to_string()));
    assert!(!journal.contains(&"start_show".to_string()));
}

#[test]
fn dispatch_starts_show_then_sequence() {
    let mut rig = rig();

    rig.events
        .send(PanelEvent::Dispatch(MomentaryButton::Pressed))
        .unwrap();
    rig.supervisor.tick();

    assert_eq!(rig.journal(), vec!["start_show", "start_ride_sequence"]);
}

#[test]
fn dispatch_ignored_in_maintenance_mode() {
    let mut rig = rig();

    rig.events
        .send(PanelEvent::Maintenance(SustainedSwitch::On))
        .unwrap();
    rig.events
        .send(PanelEvent::Dispatch(MomentaryButton::Pressed))
        .unwrap();
    rig.supervisor.tick();

    assert!(rig.supervisor.maintenance_mode());
    // Entering maintenance stops the show; dispatch adds nothing.
    assert_eq!(rig.journal(), vec!["stop_show"]);
}

#[test]
fn dispatch_refused_while_motor_disabled() {
    let mut rig = rig();
    rig.motor.set_state(MotorControllerState::Disabled);

    rig.events
        .send(PanelEvent::Dispatch(MomentaryButton::Pressed))
        .unwrap();
    rig.supervisor.tick();

    assert!(rig.journal().is_empty());
    assert!(!rig.supervisor.is_estop_latched());
}

#[test]
fn dispatch_refused_on_stale_telemetry() {
    let mut rig = rig();
    rig.motor.set_stale(true);

    rig.events
        .send(PanelEvent::Dispatch(MomentaryButton::Pressed))
        .unwrap();
    rig.supervisor.tick();

    // The stale snapshot also trips the safety evaluation and latches.
    assert!(rig.supervisor.is_estop_latched());
    let journal = rig.journal();
    assert!(!journal.contains(&"start_show".to_string()));
    assert!(journal.contains(&"halt_motion".to_string()));
}

#[test]
fn stop_event_stops_motion_and_show() {
    let mut rig = rig();

    rig.events
        .send(PanelEvent::Stop(MomentaryButton::Pressed))
        .unwrap();
    rig.supervisor.tick();

    assert_eq!(rig.journal(), vec!["stop_motion", "stop_show"]);
    assert!(!rig.supervisor.is_estop_latched());
}

#[test]
fn hardware_estop_latches_from_constraint_evaluation() {
    let mut rig = rig();
    rig.motor.set_estop_active(true);
    rig.motor.set_status(ControllerStatus::EStop);

    rig.supervisor.tick();

    assert!(rig.supervisor.is_estop_latched());
    assert_eq!(rig.journal(), vec!["halt_motion", "stop_show"]);

    // The latch is sticky: the next tick does not halt again.
    rig.supervisor.tick();
    assert_eq!(rig.journal().len(), 2);
}

#[test]
fn abnormal_status_latches() {
    let mut rig = rig();
    rig.motor.set_status(ControllerStatus::M1DriverFault);

    rig.supervisor.tick();

    assert!(rig.supervisor.is_estop_latched());
    assert!(rig.journal().contains(&"halt_motion".to_string()));
}

#[test]
fn reset_refused_while_hardware_estop_active() {
    let mut rig = rig();
    rig.motor.set_estop_active(true);
    rig.supervisor.tick();
    assert!(rig.supervisor.is_estop_latched());

    rig.events
        .send(PanelEvent::Reset(MomentaryButton::Pressed))
        .unwrap();
    rig.supervisor.tick();

    assert!(rig.supervisor.is_estop_latched());
}

#[test]
fn reset_clears_latch_after_hardware_estop_clears() {
    let mut rig = rig();
    rig.motor.set_estop_active(true);
    rig.supervisor.tick();
    assert!(rig.supervisor.is_estop_latched());

    rig.motor.set_estop_active(false);
    rig.events
        .send(PanelEvent::Reset(MomentaryButton::Pressed))
        .unwrap();
    rig.supervisor.tick();

    assert!(!rig.supervisor.is_estop_latched());

    // Dispatch works again after the latch clears.
    rig.events
        .send(PanelEvent::Dispatch(MomentaryButton::Pressed))
        .unwrap();
    rig.supervisor.tick();
    assert!(rig.journal().contains(&"start_ride_sequence".to_string()));
}

#[test]
fn jog_ignored_outside_maintenance() {
    let mut rig = rig();

    rig.events
        .send(PanelEvent::Jog(MomentarySwitch::Up))
        .unwrap();
    rig.supervisor.tick();

    assert!(rig.journal().is_empty());
}

#[test]
fn jog_in_maintenance_drives_both_motors() {
    let mut rig = rig();

    rig.events
        .send(PanelEvent::Maintenance(SustainedSwitch::On))
        .unwrap();
    rig.events
        .send(PanelEvent::Jog(MomentarySwitch::Up))
        .unwrap();
    rig.supervisor.tick();

    let journal = rig.journal();
    assert!(journal.contains(&"jog(1,1)".to_string()));
    assert!(journal.contains(&"jog(2,1)".to_string()));

    rig.events
        .send(PanelEvent::Jog(MomentarySwitch::Down))
        .unwrap();
    rig.events
        .send(PanelEvent::Jog(MomentarySwitch::Neutral))
        .unwrap();
    rig.supervisor.tick();

    let journal = rig.journal();
    assert!(journal.contains(&"jog(1,-1)".to_string()));
    assert!(journal.contains(&"jog(2,-1)".to_string()));
    assert!(journal.contains(&"stop_motion".to_string()));
}

#[test]
fn jog_ignored_while_latched() {
    let mut rig = rig();

    rig.events
        .send(PanelEvent::Maintenance(SustainedSwitch::On))
        .unwrap();
    rig.events
        .send(PanelEvent::EStop(MomentaryButton::Pressed))
        .unwrap();
    rig.events
        .send(PanelEvent::Jog(MomentarySwitch::Up))
        .unwrap();
    rig.supervisor.tick();

    let journal = rig.journal();
    assert!(!journal.iter().any(|entry| entry.starts_with("jog(")));
}

#[test]
fn released_edges_are_ignored() {
    let mut rig = rig();

    rig.events
        .send(PanelEvent::Dispatch(MomentaryButton::Released))
        .unwrap();
    rig.events
        .send(PanelEvent::EStop(MomentaryButton::Released))
        .unwrap();
    rig.events
        .send(PanelEvent::Stop(MomentaryButton::Released))
        .unwrap();
    rig.supervisor.tick();

    assert!(rig.journal().is_empty());
    assert!(!rig.supervisor.is_estop_latched());
}

#[test]
fn maintenance_third_position_is_noop() {
    let mut rig = rig();

    rig.events
        .send(PanelEvent::Maintenance(SustainedSwitch::Maintenance))
        .unwrap();
    rig.supervisor.tick();

    assert!(rig.journal().is_empty());
    assert!(!rig.supervisor.maintenance_mode());
}

#[test]
fn hmi_reader_reflects_service_and_show() {
    let journal: Journal = Arc::new(Mutex::new(Vec::new()));
    let motor = MockMotor::healthy(&journal);
    let show = Arc::new(MockShow {
        journal: Arc::clone(&journal),
    });
    let reader = RideTelemetry::new(
        Arc::clone(&motor) as Arc<dyn MotorService>,
        show as Arc<dyn ShowController>,
    );

    assert_eq!(reader.motor_speeds(), (0.0, 0.0));
    assert_eq!(reader.motor_positions(), (0, 0));
    assert_eq!(reader.controller_state(), MotorControllerState::Idle);
    assert_eq!(reader.show_status(), "Stopped");

    reader.start_show();
    reader.stop_show();
    assert_eq!(lock(&journal).clone(), vec!["start_show", "stop_show"]);
}

// ─── Constraint ordering ────────────────────────────────────────────

#[test]
fn estop_constraint_wins_over_stale() {
    let journal: Journal = Arc::new(Mutex::new(Vec::new()));
    let motor = MockMotor::healthy(&journal);
    motor.set_estop_active(true);
    motor.set_stale(true);

    let reason = safety::check_constraints(motor.as_ref()).expect("violation");
    assert_eq!(reason, "MC E-Stop Active.");
}

#[test]
fn stale_constraint_wins_over_abnormal_status() {
    let journal: Journal = Arc::new(Mutex::new(Vec::new()));
    let motor = MockMotor::healthy(&journal);
    motor.set_stale(true);
    motor.set_status(ControllerStatus::TemperatureError);

    let reason = safety::check_constraints(motor.as_ref()).expect("violation");
    assert!(reason.starts_with("MC Telemetry stale ->"));
}

#[test]
fn abnormal_status_reason_names_the_status() {
    let journal: Journal = Arc::new(Mutex::new(Vec::new()));
    let motor = MockMotor::healthy(&journal);
    motor.set_status(ControllerStatus::M2DriverFault);

    let reason = safety::check_constraints(motor.as_ref()).expect("violation");
    assert_eq!(reason, "MC Abnormal Status: M2 Driver Fault Error");
}

#[test]
fn constraints_skipped_while_disabled() {
    let journal: Journal = Arc::new(Mutex::new(Vec::new()));
    let motor = MockMotor::healthy(&journal);
    motor.set_state(MotorControllerState::Disabled);
    motor.set_estop_active(true);
    motor.set_stale(true);

    assert!(safety::check_constraints(motor.as_ref()).is_none());
}
