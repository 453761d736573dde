//! Motion worker
//!
//! Owns a [`MovementExecutor`] on a dedicated thread and feeds it requests
//! over a channel. Handles are cheap to clone; every clone talks to the same
//! worker and shares its state cell, so a second request while one is in
//! flight fails fast with [`MotionError::Busy`].

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use log::{error, info};
use rand::Rng;

use super::backend::InputBackend;
use super::clock::MotionClock;
use super::error::{MotionError, MotionResult};
use super::executor::{MotionCommand, MotionOutcome, MovementExecutor};
use super::state::{CancelToken, MotionState, StateCell};
use crate::profile::FatigueLevel;

enum Job {
    Run {
        command: MotionCommand,
        reply: Sender<MotionResult<MotionOutcome>>,
    },
    ResetNoise,
    ResetSession,
    SetFatigue(FatigueLevel),
    Shutdown,
}

/// Pending result of a submitted request
#[derive(Debug)]
pub struct MotionTicket {
    reply: Receiver<MotionResult<MotionOutcome>>,
}

impl MotionTicket {
    /// Block until the worker finishes the request
    pub fn wait(self) -> MotionResult<MotionOutcome> {
        self.reply.recv().unwrap_or(Err(MotionError::WorkerUnavailable))
    }
}

/// Handle to the motion worker thread
#[derive(Debug, Clone)]
pub struct MotionController {
    jobs: Sender<Job>,
    state: StateCell,
    cancel: CancelToken,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl MotionController {
    /// Move `executor` onto a new worker thread
    pub fn spawn<B, C, R>(executor: MovementExecutor<B, C, R>) -> MotionResult<Self>
    where
        B: InputBackend + 'static,
        C: MotionClock + 'static,
        R: Rng + Send + 'static,
    {
        let state = executor.state_cell();
        let cancel = executor.cancel_token();
        let (jobs, queue) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("motion-worker".into())
            .spawn(move || worker_loop(executor, queue))
            .map_err(|e| {
                error!("Failed to spawn motion worker: {}", e);
                MotionError::WorkerUnavailable
            })?;

        info!("Motion worker started");

        Ok(Self {
            jobs,
            state,
            cancel,
            worker: Arc::new(Mutex::new(Some(handle))),
        })
    }

    /// Queue `command`, rejecting it if a motion is already in progress
    pub fn submit(&self, command: MotionCommand) -> MotionResult<MotionTicket> {
        self.state.try_reserve()?;
        self.cancel.begin();

        let (reply, receiver) = mpsc::channel();
        if self.jobs.send(Job::Run { command, reply }).is_err() {
            self.state.release();
            return Err(MotionError::WorkerUnavailable);
        }
        Ok(MotionTicket { reply: receiver })
    }

    /// Submit `command` and wait for it
    pub fn execute(&self, command: MotionCommand) -> MotionResult<MotionOutcome> {
        self.submit(command)?.wait()
    }

    pub fn state(&self) -> MotionState {
        self.state.get()
    }

    /// Interrupt the most recently submitted motion if it is still running
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn reset_noise(&self) -> MotionResult<()> {
        self.send(Job::ResetNoise)
    }

    pub fn reset_session(&self) -> MotionResult<()> {
        self.send(Job::ResetSession)
    }

    pub fn set_fatigue(&self, fatigue: FatigueLevel) -> MotionResult<()> {
        self.send(Job::SetFatigue(fatigue))
    }

    /// Stop the worker after it drains queued jobs, interrupting the current motion
    pub fn shutdown(&self) {
        self.cancel();
        // The worker may already be gone
        let _ = self.jobs.send(Job::Shutdown);

        let handle = match self.worker.lock() {
            Ok(mut worker) => worker.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("Motion worker panicked");
            }
        }
    }

    fn send(&self, job: Job) -> MotionResult<()> {
        self.jobs.send(job).map_err(|_| MotionError::WorkerUnavailable)
    }
}

fn worker_loop<B, C, R>(mut executor: MovementExecutor<B, C, R>, queue: Receiver<Job>)
where
    B: InputBackend,
    C: MotionClock,
    R: Rng,
{
    let mut completed = 0usize;

    while let Ok(job) = queue.recv() {
        match job {
            Job::Run { command, reply } => {
                let result = executor.run_reserved(command);
                completed += 1;
                if reply.send(result).is_err() {
                    log::debug!("Result of {:?} dropped, ticket abandoned", command);
                }
            }
            Job::ResetNoise => executor.reset_noise(),
            Job::ResetSession => executor.reset_session(),
            Job::SetFatigue(level) => executor.set_fatigue(level),
            Job::Shutdown => break,
        }
    }

    info!("Motion worker stopped after {} requests", completed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MotionConfig;
    use crate::geometry::ScreenPoint;
    use crate::motion::backend::{BackendError, MouseButton, RecordingBackend, ScrollDirection};
    use crate::motion::clock::VirtualClock;
    use crate::profile::MotionProfile;
    use crate::stealth::HumanizeConfig;

    /// Blocks on the first move until the test opens the gate
    struct GatedBackend {
        log: RecordingBackend,
        gate: Option<Receiver<()>>,
    }

    impl InputBackend for GatedBackend {
        fn move_absolute(&mut self, point: ScreenPoint) -> Result<(), BackendError> {
            if let Some(gate) = self.gate.take() {
                let _ = gate.recv();
            }
            self.log.move_absolute(point)
        }

        fn button_down(&mut self, button: MouseButton) -> Result<(), BackendError> {
            self.log.button_down(button)
        }

        fn button_up(&mut self, button: MouseButton) -> Result<(), BackendError> {
            self.log.button_up(button)
        }

        fn scroll(&mut self, direction: ScrollDirection) -> Result<(), BackendError> {
            self.log.scroll(direction)
        }
    }

    fn config() -> MotionConfig {
        MotionConfig {
            humanize: HumanizeConfig::disabled(),
            ..MotionConfig::deterministic(3)
        }
    }

    fn controller() -> (MotionController, RecordingBackend) {
        let clock = VirtualClock::new();
        let backend = RecordingBackend::new().with_clock(clock.clone());
        let executor =
            MovementExecutor::new(config(), MotionProfile::default(), backend.clone(), clock)
                .unwrap();
        (MotionController::spawn(executor).unwrap(), backend)
    }

    fn gated() -> (MotionController, Sender<()>) {
        let (open, gate) = mpsc::channel();
        let backend = GatedBackend {
            log: RecordingBackend::new(),
            gate: Some(gate),
        };
        let executor =
            MovementExecutor::new(config(), MotionProfile::default(), backend, VirtualClock::new())
                .unwrap();
        (MotionController::spawn(executor).unwrap(), open)
    }

    fn far_move() -> MotionCommand {
        MotionCommand::MoveTo {
            target: ScreenPoint::new(100, 100),
            width: 20.0,
        }
    }

    #[test]
    fn test_worker_runs_commands() {
        let (controller, backend) = controller();

        let outcome = controller.execute(far_move()).unwrap();
        assert_eq!(outcome.final_position, ScreenPoint::new(100, 100));
        assert_eq!(backend.moves().last(), Some(&ScreenPoint::new(100, 100)));

        controller.execute(MotionCommand::Scroll { amount: 2 }).unwrap();
        assert_eq!(controller.state(), MotionState::Idle);

        controller.set_fatigue(FatigueLevel::new(0.5)).unwrap();
        controller.reset_noise().unwrap();
        controller.reset_session().unwrap();
        controller.shutdown();
    }

    #[test]
    fn test_second_request_is_busy() {
        let (controller, open) = gated();
        let ticket = controller.submit(far_move()).unwrap();

        let handle = controller.clone();
        assert!(matches!(handle.submit(far_move()), Err(MotionError::Busy(_))));

        open.send(()).unwrap();
        assert!(ticket.wait().is_ok());
        assert_eq!(controller.state(), MotionState::Idle);
        assert!(handle.execute(MotionCommand::Scroll { amount: 1 }).is_ok());
        controller.shutdown();
    }

    #[test]
    fn test_cancel_interrupts_motion() {
        let (controller, open) = gated();
        let ticket = controller.submit(far_move()).unwrap();

        controller.cancel();
        open.send(()).unwrap();
        assert!(matches!(ticket.wait(), Err(MotionError::Interrupted { .. })));

        assert_eq!(controller.state(), MotionState::Idle);
        assert!(controller.execute(MotionCommand::Scroll { amount: 1 }).is_ok());
        controller.shutdown();
    }

    #[test]
    fn test_late_cancel_does_not_leak() {
        let (controller, backend) = controller();
        controller.execute(far_move()).unwrap();

        // Lands after the worker already finished the motion
        controller.cancel();

        let outcome = controller
            .execute(MotionCommand::MoveTo {
                target: ScreenPoint::new(300, 220),
                width: 20.0,
            })
            .unwrap();
        assert_eq!(outcome.final_position, ScreenPoint::new(300, 220));
        assert_eq!(backend.moves().last(), Some(&ScreenPoint::new(300, 220)));
        controller.shutdown();
    }

    #[test]
    fn test_requests_after_shutdown_fail() {
        let (controller, _) = controller();
        controller.shutdown();

        assert_eq!(controller.submit(far_move()).err(), Some(MotionError::WorkerUnavailable));
        assert_eq!(controller.state(), MotionState::Idle);
        assert_eq!(controller.reset_noise(), Err(MotionError::WorkerUnavailable));
        // Shutting down twice is harmless
        controller.shutdown();
    }
}
