//! The ride supervisor: master control loop and operator event dispatch.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, SyncSender};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use rcc_common::motor::{MotorControllerState, MotorService, ServiceError};
use rcc_common::panel::{
    MomentaryButton, MomentarySwitch, PanelEvent, PanelEventSource, SustainedSwitch,
};
use rcc_common::show::ShowController;
use rcc_common::timing::{LoopTimer, ShutdownSignal};

use crate::safety;

/// Default period between telemetry log lines.
pub const DEFAULT_TELEMETRY_PERIOD: Duration = Duration::from_secs(2);

/// Master controller for the ride.
///
/// Owns the two supervisor flags (`maintenance_mode`,
/// `estop_software_latched`), drains panel events in FIFO order, evaluates
/// the safety constraints, and emits periodic telemetry. All handler code
/// runs on the thread calling [`RideSupervisor::run`].
pub struct RideSupervisor {
    motor: Arc<dyn MotorService>,
    show: Arc<dyn ShowController>,
    events: Receiver<PanelEvent>,
    shutdown: ShutdownSignal,
    maintenance_mode: bool,
    estop_latched: bool,
    timer: LoopTimer,
    telemetry_period: Duration,
    last_emit: Instant,
}

impl RideSupervisor {
    /// Compose a supervisor over the service, show, and panel queue.
    pub fn new(
        motor: Arc<dyn MotorService>,
        show: Arc<dyn ShowController>,
        events: Receiver<PanelEvent>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            motor,
            show,
            events,
            shutdown,
            maintenance_mode: false,
            estop_latched: false,
            timer: LoopTimer::new(),
            telemetry_period: DEFAULT_TELEMETRY_PERIOD,
            last_emit: Instant::now(),
        }
    }

    /// Override the telemetry emit period.
    pub fn with_telemetry_period(mut self, period: Duration) -> Self {
        self.telemetry_period = period;
        self
    }

    /// Whether the software E-Stop latch is set.
    pub fn is_estop_latched(&self) -> bool {
        self.estop_latched
    }

    /// Whether maintenance mode is active.
    pub fn maintenance_mode(&self) -> bool {
        self.maintenance_mode
    }

    /// Supervisor loop timing statistics.
    pub fn loop_timer(&self) -> &LoopTimer {
        &self.timer
    }

    /// Blocking call to run the ride control computer.
    ///
    /// Starts the panel worker and the motor service, then loops at roughly
    /// 1 kHz until the shutdown signal fires. On exit the show is stopped and
    /// the motor service shut down.
    pub fn run(
        &mut self,
        mut panel: Box<dyn PanelEventSource>,
        panel_events: SyncSender<PanelEvent>,
    ) -> Result<(), ServiceError> {
        info!("Starting ride control computer");

        let panel_shutdown = self.shutdown.clone();
        let panel_handle = thread::Builder::new()
            .name("panel-events".to_string())
            .spawn(move || panel.run(&panel_events, &panel_shutdown))
            .map_err(|e| ServiceError::Startup(e.to_string()))?;

        self.motor.start()?;

        while !self.shutdown.is_signaled() {
            self.tick();
            thread::sleep(Duration::from_millis(1));
        }

        info!("Shutting down ride control computer");
        self.show.stop_show();
        self.motor.shutdown();
        let _ = panel_handle.join();
        Ok(())
    }

    /// One supervisor iteration: drain events, evaluate safety, emit
    /// telemetry, tick the loop timer.
    pub fn tick(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
        }

        if !self.estop_latched {
            if let Some(reason) = safety::check_constraints(self.motor.as_ref()) {
                self.latch_estop(&reason);
            }
        }

        self.emit_telemetry();
        self.timer.tick();
    }

    // ─── Event Handlers ─────────────────────────────────────────────

    fn handle_event(&mut self, event: PanelEvent) {
        match event {
            PanelEvent::Dispatch(MomentaryButton::Pressed) => self.on_dispatch(),
            PanelEvent::Reset(MomentaryButton::Pressed) => self.on_reset(),
            PanelEvent::Stop(MomentaryButton::Pressed) => self.on_stop(),
            PanelEvent::EStop(MomentaryButton::Pressed) => {
                self.latch_estop("panel E-Stop pressed");
            }
            PanelEvent::Maintenance(position) => self.on_maintenance(position),
            PanelEvent::Jog(position) => self.on_jog(position),
            // Release edges carry no action.
            PanelEvent::Dispatch(MomentaryButton::Released)
            | PanelEvent::Reset(MomentaryButton::Released)
            | PanelEvent::Stop(MomentaryButton::Released)
            | PanelEvent::EStop(MomentaryButton::Released) => {}
        }
    }

    fn on_dispatch(&mut self) {
        if self.estop_latched {
            warn!("Dispatch ignored: E-Stop latched");
            return;
        }
        if self.maintenance_mode {
            info!("Dispatch ignored: maintenance mode active");
            return;
        }
        if self.motor.state() == MotorControllerState::Disabled {
            warn!("Dispatch refused: motor controller not ready");
            return;
        }
        if let Some(reason) = safety::check_constraints(self.motor.as_ref()) {
            warn!("Dispatch refused: {reason}");
            return;
        }

        info!("Dispatch pressed");
        self.show.start_show();
        self.motor.start_ride_sequence();
    }

    fn on_reset(&mut self) {
        if !self.estop_latched {
            info!("Reset pressed with no latch active");
            return;
        }
        if self.motor.is_estop_active() {
            warn!("Reset refused: hardware E-Stop still active");
            return;
        }
        info!("E-Stop latch cleared");
        self.estop_latched = false;
    }

    fn on_stop(&mut self) {
        info!("Stop pressed");
        self.motor.stop_motion();
        self.show.stop_show();
    }

    fn on_maintenance(&mut self, position: SustainedSwitch) {
        match position {
            SustainedSwitch::On => {
                info!("Maintenance mode enabled");
                self.maintenance_mode = true;
                self.show.stop_show();
            }
            SustainedSwitch::Off => {
                info!("Maintenance mode disabled");
                self.maintenance_mode = false;
            }
            SustainedSwitch::Maintenance => {
                debug!("Maintenance switch third position is reserved; ignoring");
            }
        }
    }

    fn on_jog(&mut self, position: MomentarySwitch) {
        if !self.maintenance_mode || self.estop_latched {
            debug!("Jog ignored outside maintenance mode");
            return;
        }
        match position {
            MomentarySwitch::Up => {
                self.motor.jog_motor(1, 1);
                self.motor.jog_motor(2, 1);
            }
            MomentarySwitch::Down => {
                self.motor.jog_motor(1, -1);
                self.motor.jog_motor(2, -1);
            }
            MomentarySwitch::Neutral => {
                self.motor.stop_motion();
            }
        }
    }

    // ─── Safety ─────────────────────────────────────────────────────

    /// Set the software latch and bring everything to a stop.
    ///
    /// Runs synchronously inside the event drain, so the halt and show stop
    /// land before any further panel event is handled.
    fn latch_estop(&mut self, reason: &str) {
        if self.estop_latched {
            return;
        }
        error!("E-Stop latched: {reason}");
        self.estop_latched = true;
        self.motor.halt_motion();
        self.show.stop_show();
    }

    // ─── Telemetry ──────────────────────────────────────────────────

    fn emit_telemetry(&mut self) {
        if self.last_emit.elapsed() < self.telemetry_period {
            return;
        }
        self.last_emit = Instant::now();

        let (speed1, speed2) = self.motor.motor_speeds();
        let (pos1, pos2) = self.motor.motor_positions();
        info!(
            state = %self.motor.state(),
            status = %self.motor.controller_status(),
            voltage = self.motor.voltage(),
            speed1,
            speed2,
            pos1,
            pos2,
            latched = self.estop_latched,
            maintenance = self.maintenance_mode,
            loop_avg_s = self.timer.avg(),
            loop_p95_s = self.timer.p95(),
            "ride telemetry"
        );
        self.timer.reset();
    }
}
