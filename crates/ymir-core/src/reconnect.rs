// ── Reconnect supervision ──
//
// Bounded, cancellable connect-command retries for a printer that
// reported HTTP 409. One supervisor value drives one run; the monitor
// builds a fresh one every time it enters RECONNECTING.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use strum::Display;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use ymir_api::{DeviceApi, HttpOutcome};

use crate::error::CoreError;

// ── ReconnectPolicy ──────────────────────────────────────────────────

/// Exponential backoff policy for connect-command retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Connect commands sent before giving up. Default: 5.
    pub max_attempts: u32,
    /// Wait before the second attempt. Default: 1s.
    pub base_delay: Duration,
    /// Upper bound on any single wait. Default: 30s.
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl ReconnectPolicy {
    /// Wait after the `failures`-th consecutive failed attempt (0-based).
    ///
    /// `delay = min(base * 2^failures, max)`
    pub fn delay_for(&self, failures: u32) -> Duration {
        2_u32
            .checked_pow(failures)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_attempts == 0 {
            return Err(CoreError::Config {
                message: "reconnect max_attempts must be at least 1".into(),
            });
        }
        if self.base_delay.is_zero() {
            return Err(CoreError::Config {
                message: "reconnect base delay must be greater than zero".into(),
            });
        }
        if self.max_delay < self.base_delay {
            return Err(CoreError::Config {
                message: format!(
                    "reconnect max delay ({:?}) is shorter than the base delay ({:?})",
                    self.max_delay, self.base_delay
                ),
            });
        }
        Ok(())
    }
}

// ── Supervisor state ─────────────────────────────────────────────────

/// Lifecycle of one supervisor run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SupervisorPhase {
    Idle,
    Attempting,
    Succeeded,
    Exhausted,
    Forbidden,
    Cancelled,
}

/// Progress of an in-flight reconnect sequence, published to readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconnectAttemptState {
    pub attempts_made: u32,
    pub max_attempts: u32,
    /// When the next connect command will be sent.
    pub next_attempt_at: Option<DateTime<Utc>>,
    /// Why the most recent attempt failed.
    pub last_failure: Option<String>,
}

/// Terminal result of a supervisor run.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconnectOutcome {
    /// The host accepted a connect command.
    Succeeded { attempts: u32 },
    /// Every attempt failed. `last_error` is the final attempt's failure.
    Exhausted { attempts: u32, last_error: CoreError },
    /// The host refused the API key. Auth failures are never retried.
    Forbidden { attempts: u32 },
    /// The session was cancelled. No command is sent after this point.
    Cancelled { attempts: u32 },
}

impl ReconnectOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Succeeded { attempts }
            | Self::Exhausted { attempts, .. }
            | Self::Forbidden { attempts }
            | Self::Cancelled { attempts } => *attempts,
        }
    }
}

// ── ReconnectSupervisor ──────────────────────────────────────────────

/// Drives connect-command attempts for one printer until one succeeds,
/// the host refuses the API key, the policy is exhausted, or the token
/// is cancelled.
pub struct ReconnectSupervisor<'a, C> {
    client: &'a C,
    policy: ReconnectPolicy,
    request_timeout: Duration,
    cancel: CancellationToken,
    phase: SupervisorPhase,
}

impl<'a, C: DeviceApi> ReconnectSupervisor<'a, C> {
    pub fn new(
        client: &'a C,
        policy: ReconnectPolicy,
        request_timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            policy,
            request_timeout,
            cancel,
            phase: SupervisorPhase::Idle,
        }
    }

    pub fn phase(&self) -> SupervisorPhase {
        self.phase
    }

    /// Run the attempt loop to a terminal outcome.
    ///
    /// The first connect command goes out immediately. `on_attempt` is
    /// called before the first attempt and after every failed attempt
    /// that will be retried.
    pub async fn run(
        &mut self,
        mut on_attempt: impl FnMut(&ReconnectAttemptState),
    ) -> ReconnectOutcome {
        self.phase = SupervisorPhase::Attempting;
        on_attempt(&ReconnectAttemptState {
            attempts_made: 0,
            max_attempts: self.policy.max_attempts,
            next_attempt_at: Some(Utc::now()),
            last_failure: None,
        });

        let mut attempts: u32 = 0;
        loop {
            let sent = tokio::select! {
                biased;
                () = self.cancel.cancelled() => None,
                outcome = self.client.send_connect_command(self.request_timeout) => Some(outcome),
            };
            let Some(outcome) = sent else {
                return self.cancelled(attempts);
            };
            attempts += 1;

            let Some(error) = attempt_error(&outcome) else {
                info!(attempt = attempts, "connect command accepted");
                self.phase = SupervisorPhase::Succeeded;
                return ReconnectOutcome::Succeeded { attempts };
            };

            if error.is_auth() {
                warn!(attempt = attempts, "connect command forbidden, not retrying");
                self.phase = SupervisorPhase::Forbidden;
                return ReconnectOutcome::Forbidden { attempts };
            }

            if attempts >= self.policy.max_attempts {
                warn!(
                    attempts,
                    error = %error,
                    "reconnect attempts exhausted, giving up"
                );
                self.phase = SupervisorPhase::Exhausted;
                return ReconnectOutcome::Exhausted {
                    attempts,
                    last_error: error,
                };
            }

            let delay = self.policy.delay_for(attempts - 1);
            warn!(
                attempt = attempts,
                max_attempts = self.policy.max_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "connect attempt failed, backing off"
            );
            on_attempt(&ReconnectAttemptState {
                attempts_made: attempts,
                max_attempts: self.policy.max_attempts,
                next_attempt_at: TimeDelta::from_std(delay).ok().map(|d| Utc::now() + d),
                last_failure: Some(error.to_string()),
            });

            let interrupted = tokio::select! {
                biased;
                () = self.cancel.cancelled() => true,
                () = tokio::time::sleep(delay) => false,
            };
            if interrupted {
                return self.cancelled(attempts);
            }
        }
    }

    fn cancelled(&mut self, attempts: u32) -> ReconnectOutcome {
        debug!(attempts, "reconnect cancelled");
        self.phase = SupervisorPhase::Cancelled;
        ReconnectOutcome::Cancelled { attempts }
    }
}

/// Why a connect attempt failed, or `None` if the host accepted it.
fn attempt_error(outcome: &HttpOutcome) -> Option<CoreError> {
    match outcome {
        HttpOutcome::Ok { .. } => None,
        HttpOutcome::HttpError { status: 400 } => Some(CoreError::CommandRejected { status: 400 }),
        other => CoreError::from_outcome(other),
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use tokio::time::Instant;

    use super::*;
    use crate::test_support::{ScriptedDevice, no_content, status};

    const TIMEOUT: Duration = Duration::from_secs(3);

    fn gaps(times: &[Instant]) -> Vec<Duration> {
        times.windows(2).map(|w| w[1] - w[0]).collect()
    }

    #[test]
    fn default_policy() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
        assert_eq!(policy.max_delay, Duration::from_secs(30));
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn backoff_doubles_then_caps() {
        let policy = ReconnectPolicy::default();
        let delays: Vec<u64> = (0..7).map(|k| policy.delay_for(k).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 30, 30]);
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn invalid_policies_are_rejected() {
        let zero_attempts = ReconnectPolicy {
            max_attempts: 0,
            ..ReconnectPolicy::default()
        };
        assert!(zero_attempts.validate().is_err());

        let inverted = ReconnectPolicy {
            base_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(1),
            ..ReconnectPolicy::default()
        };
        assert!(inverted.validate().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_attempts_exhaust_with_increasing_delays() {
        let device = ScriptedDevice::new();
        device.connect.always(status(400));

        let mut supervisor = ReconnectSupervisor::new(
            &device,
            ReconnectPolicy::default(),
            TIMEOUT,
            CancellationToken::new(),
        );
        let mut observed = Vec::new();
        let outcome = supervisor.run(|s| observed.push(s.attempts_made)).await;

        assert_eq!(
            outcome,
            ReconnectOutcome::Exhausted {
                attempts: 5,
                last_error: CoreError::CommandRejected { status: 400 },
            }
        );
        assert_eq!(supervisor.phase(), SupervisorPhase::Exhausted);
        assert_eq!(device.connect.call_count(), 5);
        assert_eq!(
            gaps(&device.connect.call_times()),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
            ]
        );
        assert_eq!(observed, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn forbidden_connect_is_not_retried() {
        let device = ScriptedDevice::new();
        device.connect.always(status(403));

        let mut supervisor = ReconnectSupervisor::new(
            &device,
            ReconnectPolicy::default(),
            TIMEOUT,
            CancellationToken::new(),
        );
        let mut observed = Vec::new();
        let outcome = supervisor.run(|s| observed.push(s.attempts_made)).await;

        assert_eq!(outcome, ReconnectOutcome::Forbidden { attempts: 1 });
        assert_eq!(supervisor.phase(), SupervisorPhase::Forbidden);
        assert_eq!(device.connect.call_count(), 1);
        assert_eq!(observed, vec![0]);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(device.connect.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn forbidden_after_rejection_stops_immediately() {
        let device = ScriptedDevice::new();
        device.connect.push(status(400));
        device.connect.push(status(403));
        device.connect.always(no_content());

        let mut supervisor = ReconnectSupervisor::new(
            &device,
            ReconnectPolicy::default(),
            TIMEOUT,
            CancellationToken::new(),
        );
        let outcome = supervisor.run(|_| {}).await;

        assert_eq!(outcome, ReconnectOutcome::Forbidden { attempts: 2 });
        assert_eq!(device.connect.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn delays_are_capped() {
        let device = ScriptedDevice::new();
        device.connect.always(status(409));

        let policy = ReconnectPolicy {
            max_attempts: 4,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(5),
        };
        let mut supervisor =
            ReconnectSupervisor::new(&device, policy, TIMEOUT, CancellationToken::new());
        let outcome = supervisor.run(|_| {}).await;

        assert_eq!(outcome.attempts(), 4);
        assert_eq!(
            gaps(&device.connect.call_times()),
            vec![
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(5),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_second_attempt() {
        let device = ScriptedDevice::new();
        device.connect.push(status(400));
        device.connect.push(no_content());

        let mut supervisor = ReconnectSupervisor::new(
            &device,
            ReconnectPolicy::default(),
            TIMEOUT,
            CancellationToken::new(),
        );
        let outcome = supervisor.run(|_| {}).await;

        assert_eq!(outcome, ReconnectOutcome::Succeeded { attempts: 2 });
        assert_eq!(supervisor.phase(), SupervisorPhase::Succeeded);
        assert_eq!(device.connect.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_mid_backoff_sends_nothing_more() {
        let device = Arc::new(ScriptedDevice::new());
        device.connect.always(status(400));
        let cancel = CancellationToken::new();

        let task = {
            let device = Arc::clone(&device);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let mut supervisor = ReconnectSupervisor::new(
                    device.as_ref(),
                    ReconnectPolicy::default(),
                    TIMEOUT,
                    cancel,
                );
                supervisor.run(|_| {}).await
            })
        };

        // First attempt is immediate; the second would go out at t=1s.
        tokio::time::sleep(Duration::from_millis(500)).await;
        cancel.cancel();

        let outcome = task.await.expect("supervisor task");
        assert_eq!(outcome, ReconnectOutcome::Cancelled { attempts: 1 });

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(device.connect.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn already_cancelled_sends_no_command() {
        let device = ScriptedDevice::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut supervisor =
            ReconnectSupervisor::new(&device, ReconnectPolicy::default(), TIMEOUT, cancel);
        let outcome = supervisor.run(|_| {}).await;

        assert_eq!(outcome, ReconnectOutcome::Cancelled { attempts: 0 });
        assert_eq!(device.connect.call_count(), 0);
    }
}
