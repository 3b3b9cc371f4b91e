//! Single-shot DP control-mode change.

use std::sync::Arc;

use crate::clients::ControlModeClient;
use crate::machine::{MissionContext, Outcome, State};
use crate::shared::CancelToken;
use crate::types::DpControlMode;

/// Requests one control-mode change and always succeeds.
///
/// The service is fire-and-forget: a failed request is logged but does not
/// change the outcome, so re-executing with the same mode is idempotent.
pub struct ControlModeSwitch {
    mode: DpControlMode,
    client: Arc<dyn ControlModeClient>,
}

impl ControlModeSwitch {
    pub fn new(mode: DpControlMode, client: Arc<dyn ControlModeClient>) -> Self {
        Self { mode, client }
    }
}

impl State for ControlModeSwitch {
    fn outcomes(&self) -> &'static [Outcome] {
        &[Outcome::Succeeded, Outcome::Aborted, Outcome::Preempted]
    }

    fn execute(&mut self, _ctx: &mut MissionContext, _cancel: &CancelToken) -> Outcome {
        match self.client.set_mode(self.mode) {
            Ok(()) => tracing::info!("Changed DP control mode to {}", self.mode.as_str()),
            Err(e) => tracing::warn!(
                "Control mode request '{}' not delivered: {}",
                self.mode.as_str(),
                e
            ),
        }
        Outcome::Succeeded
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::clients::ModeSendError;

    #[derive(Default)]
    struct CountingMode {
        requests: AtomicUsize,
    }

    impl ControlModeClient for CountingMode {
        fn set_mode(&self, _mode: DpControlMode) -> Result<(), ModeSendError> {
            self.requests.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    struct FailingMode;

    impl ControlModeClient for FailingMode {
        fn set_mode(&self, _mode: DpControlMode) -> Result<(), ModeSendError> {
            Err(ModeSendError)
        }
    }

    #[test]
    fn test_idempotent_repeat_succeeds() {
        let client = Arc::new(CountingMode::default());
        let mut state = ControlModeSwitch::new(DpControlMode::PoseHeadingHold, client.clone());
        let mut ctx = MissionContext::default();
        let cancel = CancelToken::new();

        assert_eq!(state.execute(&mut ctx, &cancel), Outcome::Succeeded);
        assert_eq!(state.execute(&mut ctx, &cancel), Outcome::Succeeded);
        assert_eq!(client.requests.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_service_failure_still_succeeds() {
        let mut state = ControlModeSwitch::new(DpControlMode::OpenLoop, Arc::new(FailingMode));
        let mut ctx = MissionContext::default();
        assert_eq!(
            state.execute(&mut ctx, &CancelToken::new()),
            Outcome::Succeeded
        );
    }
}
