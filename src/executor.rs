//! Executes single transition steps against a device.
//!
//! A step runs in a fixed order: guard, then tap or swipe, then the settle
//! wait. The wait is the step's base duration plus a random jitter so the
//! action cadence is never fixed.

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::actor::ActorState;
use crate::device::DeviceController;
use crate::errors::NavError;
use crate::graph::TransitionStep;
use crate::guard::ExpressionEvaluator;
use crate::regions::AreaLookup;
use crate::screen::ScreenState;

/// Wait parameters applied after every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepTiming {
    pub jitter_min: Duration,
    pub jitter_max: Duration,
    /// Extra wait after a swipe for scrolling to stop.
    pub swipe_settle: Duration,
    /// Honour each step's own base wait.
    pub step_waits: bool,
}

impl Default for StepTiming {
    fn default() -> Self {
        Self {
            jitter_min: Duration::from_millis(700),
            jitter_max: Duration::from_millis(1000),
            swipe_settle: Duration::from_millis(500),
            step_waits: true,
        }
    }
}

impl StepTiming {
    pub fn from_millis(jitter_min: u64, jitter_max: u64, swipe_settle: u64) -> Self {
        Self {
            jitter_min: Duration::from_millis(jitter_min),
            jitter_max: Duration::from_millis(jitter_max),
            swipe_settle: Duration::from_millis(swipe_settle),
            step_waits: true,
        }
    }

    /// No waiting at all, for simulated runs. Step base waits are skipped too.
    pub fn instant() -> Self {
        Self {
            step_waits: false,
            ..Self::from_millis(0, 0, 0)
        }
    }

    /// A jitter in `[jitter_min, jitter_max]`. An inverted range is swapped.
    pub fn jitter(&self, rng: &mut impl Rng) -> Duration {
        let (lo, hi) = if self.jitter_min <= self.jitter_max {
            (self.jitter_min, self.jitter_max)
        } else {
            (self.jitter_max, self.jitter_min)
        };
        let (lo, hi) = (lo.as_millis() as u64, hi.as_millis() as u64);
        Duration::from_millis(rng.gen_range(lo..=hi))
    }

    /// Total wait after `step`.
    pub fn settle_for(&self, step: &TransitionStep, rng: &mut impl Rng) -> Duration {
        let own = if self.step_waits { step.wait } else { Duration::ZERO };
        let base = own + self.jitter(rng);
        if step.swipe.is_some() {
            base + self.swipe_settle
        } else {
            base
        }
    }
}

/// What a step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Tapped { region: String },
    Swiped,
    /// Wait-only step.
    Waited,
    /// The guard evaluated to false; nothing was touched.
    GuardBlocked { guard: String },
}

impl StepOutcome {
    pub fn is_blocked(&self) -> bool {
        matches!(self, StepOutcome::GuardBlocked { .. })
    }
}

/// Runs steps for one actor.
pub struct StepExecutor {
    device: Arc<dyn DeviceController>,
    regions: Arc<AreaLookup>,
    evaluator: Arc<dyn ExpressionEvaluator>,
    timing: StepTiming,
}

impl StepExecutor {
    pub fn new(
        device: Arc<dyn DeviceController>,
        regions: Arc<AreaLookup>,
        evaluator: Arc<dyn ExpressionEvaluator>,
    ) -> Self {
        Self {
            device,
            regions,
            evaluator,
            timing: StepTiming::default(),
        }
    }

    pub fn with_timing(mut self, timing: StepTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn timing(&self) -> StepTiming {
        self.timing
    }

    /// Execute one step of the edge `from -> to`.
    pub async fn execute(
        &self,
        step: &TransitionStep,
        from: &ScreenState,
        to: &ScreenState,
        state: &ActorState,
    ) -> Result<StepOutcome, NavError> {
        if let Some(guard) = &step.guard {
            let active = self
                .evaluator
                .evaluate(guard, state)
                .map_err(|source| NavError::Guard {
                    from: from.clone(),
                    to: to.clone(),
                    source,
                })?;
            if !active {
                info!(%from, %to, guard = %guard, "Precondition not active");
                return Ok(StepOutcome::GuardBlocked {
                    guard: guard.clone(),
                });
            }
        }

        let outcome = if let Some(region) = &step.tap {
            let rect = self
                .regions
                .get(region)
                .ok_or_else(|| NavError::UnknownRegion {
                    from: from.clone(),
                    to: to.clone(),
                    region: region.clone(),
                })?;
            self.device.tap(region, rect).await.inspect_err(|e| {
                error!(%from, %to, region = %region, error = %e, "Tap failed");
            })?;
            StepOutcome::Tapped {
                region: region.clone(),
            }
        } else if let Some(swipe) = &step.swipe {
            self.device.swipe(swipe).await.inspect_err(|e| {
                error!(%from, %to, error = %e, "Swipe failed");
            })?;
            StepOutcome::Swiped
        } else {
            StepOutcome::Waited
        };

        let wait = self.timing.settle_for(step, &mut rand::thread_rng());
        debug!(label = %step.label, wait_ms = wait.as_millis() as u64, "Settling");
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Screenshot;
    use crate::errors::DeviceError;
    use crate::graph::Swipe;
    use crate::guard::GuardEvaluator;
    use crate::regions::PixelRect;
    use async_trait::async_trait;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingDevice {
        actions: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl DeviceController for RecordingDevice {
        async fn capture(&self, path: &Path) -> Result<Screenshot, DeviceError> {
            Ok(Screenshot::new(path))
        }

        async fn tap(&self, region: &str, _rect: PixelRect) -> Result<(), DeviceError> {
            if self.fail {
                return Err(DeviceError::Disconnected("test".into()));
            }
            self.actions.lock().unwrap().push(format!("tap {}", region));
            Ok(())
        }

        async fn swipe(&self, swipe: &Swipe) -> Result<(), DeviceError> {
            self.actions
                .lock()
                .unwrap()
                .push(format!("swipe {}->{}", swipe.x1, swipe.x2));
            Ok(())
        }
    }

    fn executor(device: Arc<RecordingDevice>) -> StepExecutor {
        StepExecutor::new(
            device,
            Arc::new(AreaLookup::synthetic(["to_mail", "to_tundra_adventure"])),
            Arc::new(GuardEvaluator::new()),
        )
        .with_timing(StepTiming::instant())
    }

    fn edge() -> (ScreenState, ScreenState) {
        ("main_city".into(), "mail".into())
    }

    // ========================================================================
    // Timing
    // ========================================================================

    #[test]
    fn test_jitter_within_default_range() {
        let timing = StepTiming::default();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let ms = timing.jitter(&mut rng).as_millis();
            assert!((700..=1000).contains(&ms), "jitter {}ms", ms);
        }
    }

    #[test]
    fn test_inverted_range_is_swapped() {
        let timing = StepTiming::from_millis(900, 800, 0);
        let mut rng = StdRng::seed_from_u64(5);
        let ms = timing.jitter(&mut rng).as_millis();
        assert!((800..=900).contains(&ms));
    }

    #[test]
    fn test_settle_adds_base_and_swipe_settle() {
        let timing = StepTiming::from_millis(100, 100, 500);
        let mut rng = StdRng::seed_from_u64(1);

        let tap = TransitionStep::tap("to_mail").with_wait_ms(300);
        assert_eq!(timing.settle_for(&tap, &mut rng), Duration::from_millis(400));

        let swipe = TransitionStep::swipe(Swipe::RIGHT_300);
        assert_eq!(timing.settle_for(&swipe, &mut rng), Duration::from_millis(600));
    }

    #[test]
    fn test_instant_timing_skips_step_waits() {
        let mut rng = StdRng::seed_from_u64(3);
        let pause = TransitionStep::pause(Duration::from_secs(5));
        assert_eq!(StepTiming::instant().settle_for(&pause, &mut rng), Duration::ZERO);
        assert_eq!(
            StepTiming::from_millis(0, 0, 0).settle_for(&pause, &mut rng),
            Duration::from_secs(5)
        );
    }

    // ========================================================================
    // Execution
    // ========================================================================

    #[tokio::test]
    async fn test_tap_step() {
        let device = Arc::new(RecordingDevice::default());
        let (from, to) = edge();
        let outcome = executor(device.clone())
            .execute(&TransitionStep::tap("to_mail"), &from, &to, &ActorState::default())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            StepOutcome::Tapped {
                region: "to_mail".into()
            }
        );
        assert_eq!(*device.actions.lock().unwrap(), vec!["tap to_mail"]);
    }

    #[tokio::test]
    async fn test_swipe_and_wait_steps() {
        let device = Arc::new(RecordingDevice::default());
        let exec = executor(device.clone());
        let (from, to) = edge();
        let state = ActorState::default();

        let swiped = exec
            .execute(&TransitionStep::swipe(Swipe::RIGHT_300), &from, &to, &state)
            .await
            .unwrap();
        assert_eq!(swiped, StepOutcome::Swiped);

        let waited = exec
            .execute(&TransitionStep::pause(Duration::ZERO), &from, &to, &state)
            .await
            .unwrap();
        assert_eq!(waited, StepOutcome::Waited);
        assert_eq!(*device.actions.lock().unwrap(), vec!["swipe 540->240"]);
    }

    #[tokio::test]
    async fn test_false_guard_blocks_without_tapping() {
        let device = Arc::new(RecordingDevice::default());
        let mut state = ActorState::default();
        state.set_fact("events.tundra.active", false);
        let step = TransitionStep::tap("to_tundra_adventure").with_guard("events.tundra.active");
        let (from, to) = edge();

        let outcome = executor(device.clone())
            .execute(&step, &from, &to, &state)
            .await
            .unwrap();
        assert!(outcome.is_blocked());
        assert!(device.actions.lock().unwrap().is_empty());

        state.set_fact("events.tundra.active", true);
        let outcome = executor(device.clone())
            .execute(&step, &from, &to, &state)
            .await
            .unwrap();
        assert!(!outcome.is_blocked());
    }

    #[tokio::test]
    async fn test_broken_guard_is_configuration_error() {
        let device = Arc::new(RecordingDevice::default());
        let step = TransitionStep::tap("to_mail").with_guard("events.missing");
        let (from, to) = edge();
        let err = executor(device)
            .execute(&step, &from, &to, &ActorState::default())
            .await
            .unwrap_err();
        assert!(matches!(err, NavError::Guard { .. }));
        assert_eq!(err.kind(), crate::errors::ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_unknown_region_is_fatal() {
        let device = Arc::new(RecordingDevice::default());
        let (from, to) = edge();
        let err = executor(device.clone())
            .execute(&TransitionStep::tap("to_nowhere"), &from, &to, &ActorState::default())
            .await
            .unwrap_err();
        match err {
            NavError::UnknownRegion { region, .. } => assert_eq!(region, "to_nowhere"),
            other => panic!("Expected UnknownRegion, got {:?}", other),
        }
        assert!(device.actions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_device_failure_propagates() {
        let device = Arc::new(RecordingDevice {
            fail: true,
            ..Default::default()
        });
        let (from, to) = edge();
        let err = executor(device)
            .execute(&TransitionStep::tap("to_mail"), &from, &to, &ActorState::default())
            .await
            .unwrap_err();
        assert!(err.is_recoverable_by_reconnect());
    }
}
