//! Push publisher with statum state machine for the send cycle
//!
//! Samples the stick on a fixed cadence and posts a JSON snapshot to the
//! server whenever the state differs from the last one that was delivered.
//!
//! # State Machine
//!
//! ```text
//! Idle ──► Sampled ──► (unchanged) ──► Idle
//!              │
//!              └──► Sending ──► Delivered / TimedOut / Failed ──► Idle
//! ```
//!
//! # Failure policy
//!
//! A failed send is simply retried on the next tick if the state is still
//! different; failures never suppress sending. The consecutive failure
//! counter only decides when to re-run network association: after
//! [`MAX_RETRIES`] failures in a row the link is re-associated once and the
//! counter starts over, whether or not association worked. Changes that are
//! superseded before a send goes through are not queued.

use chrono::Local;
use statum::{machine, state};
use std::time::Duration;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::payload::SnapshotPayload;
use crate::joystick::{JoystickState, Language, ReferenceState, Sampler, MAX_RETRIES, SEND_INTERVAL_MS};
use crate::net::{NetworkLink, Transport, TransportError};

/// Default upper bound for one send, connect included.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_millis(2000);

/// How often the loop logs aggregate statistics.
const STATS_INTERVAL_SECS: i64 = 30;

/// What the status indicator should show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkStatus {
    Ok,
    Failing,
}

/// Output that reflects whether sends are going through (an LED, usually).
pub trait StatusIndicator: Send {
    fn show(&mut self, status: LinkStatus);
}

/// Indicator for setups without a status LED.
pub struct NullIndicator;

impl StatusIndicator for NullIndicator {
    fn show(&mut self, _status: LinkStatus) {}
}

#[derive(Clone, Debug)]
pub struct PushSettings {
    pub send_timeout: Duration,
    pub language: Language,
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            send_timeout: DEFAULT_SEND_TIMEOUT,
            language: Language::default(),
        }
    }
}

/// Counts consecutive send failures and says when to re-associate.
#[derive(Clone, Debug)]
pub struct FailureTracker {
    consecutive: u32,
    limit: u32,
}

impl FailureTracker {
    pub fn new(limit: u32) -> Self {
        Self {
            consecutive: 0,
            limit,
        }
    }

    /// Records a failure. Returns true when the limit is reached, in which
    /// case the counter is already back at zero.
    pub fn record_failure(&mut self) -> bool {
        self.consecutive += 1;
        if self.consecutive >= self.limit {
            self.consecutive = 0;
            true
        } else {
            false
        }
    }

    pub fn record_success(&mut self) {
        self.consecutive = 0;
    }

    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }
}

#[derive(Debug)]
pub enum SendOutcome {
    Delivered,
    TimedOut,
    Failed(TransportError),
}

#[derive(Debug)]
pub enum CycleOutcome {
    /// Nothing to publish.
    Skipped,
    Sent {
        outcome: SendOutcome,
        reassociated: bool,
    },
}

#[state]
#[derive(Debug, Clone)]
pub enum PushState {
    Idle,
    Sampled(JoystickState),
    Sending(JoystickState),
}

#[machine]
pub struct PushClient<S: PushState> {
    sampler: Sampler,
    reference: ReferenceState,
    transport: Box<dyn Transport>,
    link: Box<dyn NetworkLink>,
    indicator: Box<dyn StatusIndicator>,
    failures: FailureTracker,
    settings: PushSettings,
}

/// Result of checking a fresh sample against the last delivered state.
pub enum Gate {
    Unchanged(PushClient<Idle>),
    Changed(PushClient<Sending>),
}

impl<S: PushState> PushClient<S> {
    /// Last state the server acknowledged receiving (as far as we can tell).
    pub fn reference(&self) -> &JoystickState {
        self.reference.current()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.failures.consecutive()
    }
}

impl PushClient<Idle> {
    pub fn create(
        sampler: Sampler,
        transport: Box<dyn Transport>,
        link: Box<dyn NetworkLink>,
        mut indicator: Box<dyn StatusIndicator>,
        settings: PushSettings,
    ) -> Self {
        info!("Creating push client with settings: {:?}", settings);
        indicator.show(LinkStatus::Failing);

        Self::new(
            sampler,
            ReferenceState::default(),
            transport,
            link,
            indicator,
            FailureTracker::new(MAX_RETRIES),
            settings,
        )
    }

    /// Reads the stick and flags the sample against the reference.
    pub fn sample(mut self) -> PushClient<Sampled> {
        let state = self.sampler.sample().flag_change(self.reference.current());
        self.transition_with(state)
    }

    /// One full pass through the state machine.
    pub async fn run_cycle(self) -> (PushClient<Idle>, CycleOutcome) {
        match self.sample().gate() {
            Gate::Unchanged(idle) => (idle, CycleOutcome::Skipped),
            Gate::Changed(sending) => sending.send().await,
        }
    }
}

impl PushClient<Sampled> {
    pub fn gate(self) -> Gate {
        match self.get_state_data().copied() {
            Some(state) if state.changed => {
                debug!("Change detected: {:?}", state);
                Gate::Changed(self.transition_with(state))
            }
            Some(_) => Gate::Unchanged(self.transition()),
            None => {
                warn!("No sample found in Sampled state, this should not happen");
                Gate::Unchanged(self.transition())
            }
        }
    }
}

impl PushClient<Sending> {
    /// Sends the pending snapshot and settles the outcome.
    pub async fn send(mut self) -> (PushClient<Idle>, CycleOutcome) {
        let state = self.get_state_data().copied().unwrap_or_else(|| {
            warn!("No snapshot found in Sending state, this should not happen");
            *self.reference.current()
        });

        let outcome = self.deliver(&state).await;
        let mut reassociated = false;

        match &outcome {
            SendOutcome::Delivered => {
                info!(
                    "Sent: {} ({:.2}, {:.2}) button={}",
                    state.direction.label(self.settings.language),
                    state.x,
                    state.y,
                    state.button_pressed
                );
                self.reference.accept(state);
                self.failures.record_success();
                self.indicator.show(LinkStatus::Ok);
            }
            failed => {
                self.indicator.show(LinkStatus::Failing);
                let reassociate = self.failures.record_failure();
                match failed {
                    SendOutcome::TimedOut => warn!(
                        "Send timed out after {:?}",
                        self.settings.send_timeout
                    ),
                    SendOutcome::Failed(e) => warn!("Send failed: {}", e),
                    SendOutcome::Delivered => {}
                }

                if reassociate {
                    warn!(
                        "{} consecutive send failures, re-associating network",
                        MAX_RETRIES
                    );
                    match self.link.associate().await {
                        Ok(()) => info!("Network re-associated"),
                        Err(e) => error!("Network re-association failed: {}", e),
                    }
                    reassociated = true;
                } else {
                    debug!(
                        "Consecutive failures: {}/{}",
                        self.failures.consecutive(),
                        MAX_RETRIES
                    );
                }
            }
        }

        (
            self.transition(),
            CycleOutcome::Sent {
                outcome,
                reassociated,
            },
        )
    }

    async fn deliver(&mut self, state: &JoystickState) -> SendOutcome {
        let body = match SnapshotPayload::from_state(state, self.settings.language).to_json() {
            Ok(body) => body,
            Err(e) => return SendOutcome::Failed(TransportError::Encode(e)),
        };

        match timeout(self.settings.send_timeout, self.transport.post_json(&body)).await {
            Ok(Ok(())) => SendOutcome::Delivered,
            Ok(Err(e)) => SendOutcome::Failed(e),
            Err(_) => SendOutcome::TimedOut,
        }
    }
}

#[derive(Debug, Default)]
struct PushStats {
    cycles: u64,
    skipped: u64,
    delivered: u64,
    failed: u64,
    reassociations: u64,
}

impl PushStats {
    fn record(&mut self, outcome: &CycleOutcome) {
        self.cycles += 1;
        match outcome {
            CycleOutcome::Skipped => self.skipped += 1,
            CycleOutcome::Sent {
                outcome,
                reassociated,
            } => {
                match outcome {
                    SendOutcome::Delivered => self.delivered += 1,
                    SendOutcome::TimedOut | SendOutcome::Failed(_) => self.failed += 1,
                }
                if *reassociated {
                    self.reassociations += 1;
                }
            }
        }
    }
}

/// Runs send cycles every [`SEND_INTERVAL_MS`] until `shutdown` fires.
///
/// Shutdown is only checked between cycles, so a send in flight always
/// completes.
pub async fn run_push_loop(mut client: PushClient<Idle>, shutdown: CancellationToken) {
    info!("Starting push loop with {}ms interval", SEND_INTERVAL_MS);

    let mut ticker = interval(Duration::from_millis(SEND_INTERVAL_MS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut stats = PushStats::default();
    let mut last_stats_time = Local::now();
    let stats_interval = chrono::Duration::seconds(STATS_INTERVAL_SECS);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Push loop stopping");
                return;
            }
            _ = ticker.tick() => {}
        }

        let (idle, outcome) = client.run_cycle().await;
        client = idle;
        stats.record(&outcome);

        let now = Local::now();
        if now - last_stats_time > stats_interval {
            info!(
                "Push stats: {} cycles, {} skipped, {} delivered, {} failed, {} re-associations in {} seconds",
                stats.cycles,
                stats.skipped,
                stats.delivered,
                stats.failed,
                stats.reassociations,
                (now - last_stats_time).num_seconds()
            );
            stats = PushStats::default();
            last_stats_time = now;
        }
    }
}
