// Call-presence detection
//
// The call site exposes no join/leave event, so presence is inferred by
// polling two cheap signals: a meeting-code-shaped path segment in the URL
// and at least one call-UI marker element on the page. Edge transitions on
// that boolean drive auto start/stop requests to the coordinator.

use anyhow::Result;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::coordinator::CoordinatorHandle;

/// What the host page looks like right now, as sampled by the probe
#[derive(Debug, Clone, Default)]
pub struct PageSnapshot {
    /// URL path of the observed tab
    pub url_path: String,
    /// Number of call-UI marker elements currently present
    pub call_ui_markers: usize,
    /// Whether the page is visible (polling may have been suspended while
    /// the tab was backgrounded)
    pub visible: bool,
}

/// Samples the observed page. Implemented by the host integration; tests
/// script it.
#[async_trait::async_trait]
pub trait PresenceProbe: Send + Sync {
    async fn snapshot(&self) -> PageSnapshot;
}

/// Action the detector wants taken after evaluating a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceAction {
    /// Joined a call: request auto start once the settle delay elapses
    StartAfterSettle,
    /// Left the call: request an auto-triggered stop
    Stop,
}

/// Detector tuning
#[derive(Debug, Clone)]
pub struct PresenceConfig {
    /// Polling cadence
    pub poll_interval: Duration,
    /// Wait after a join edge so the call UI can finish loading
    pub settle_delay: Duration,
    /// The tab this detector watches; forwarded with start requests
    pub tab_id: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            settle_delay: Duration::from_secs(3),
            tab_id: 0,
        }
    }
}

/// Edge-detecting presence state machine.
///
/// Pure apart from its previous-state flags: `tick` maps a snapshot to an
/// optional action, and the run loop wires it to a probe, the timers, and the
/// coordinator.
pub struct PresenceDetector {
    config: PresenceConfig,
    settings: Settings,
    in_call: bool,
    was_visible: bool,
}

impl PresenceDetector {
    pub fn new(config: PresenceConfig, settings: Settings) -> Self {
        Self {
            config,
            settings,
            in_call: false,
            was_visible: true,
        }
    }

    /// Evaluate one snapshot against the previous state.
    ///
    /// Actions are already gated by the auto-start/auto-stop settings; a
    /// `None` means nothing to do.
    pub fn tick(&mut self, snapshot: &PageSnapshot) -> Option<PresenceAction> {
        let now_in_call = is_call_visible(snapshot);
        let was_in_call = self.in_call;
        self.in_call = now_in_call;
        self.was_visible = snapshot.visible;

        if now_in_call && !was_in_call {
            debug!("Presence edge: joined call at {}", snapshot.url_path);
            if self.settings.auto_start {
                return Some(PresenceAction::StartAfterSettle);
            }
        }

        if !now_in_call && was_in_call {
            debug!("Presence edge: left call");
            if self.settings.auto_stop {
                return Some(PresenceAction::Stop);
            }
        }

        None
    }

    /// Whether a snapshot warrants an immediate out-of-cadence re-check
    /// (the page just became visible again after being backgrounded)
    pub fn visibility_regained(&self, snapshot: &PageSnapshot) -> bool {
        snapshot.visible && !self.was_visible
    }

    /// Poll the probe until `shutdown` flips, translating presence edges
    /// into coordinator requests. Rejections ("already recording", "not
    /// recording") are expected races and only logged: the coordinator's
    /// state is authoritative.
    pub async fn run(
        mut self,
        probe: impl PresenceProbe,
        coordinator: CoordinatorHandle,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        info!(
            "Presence detector watching tab {} (poll every {:?})",
            self.config.tab_id, self.config.poll_interval
        );

        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            let mut snapshot = probe.snapshot().await;

            // Polling was suspended while backgrounded; the state may have
            // changed without us seeing the edge, so look again immediately
            if self.visibility_regained(&snapshot) {
                debug!("Page visibility regained, re-checking presence");
                snapshot = probe.snapshot().await;
            }

            let Some(action) = self.tick(&snapshot) else {
                continue;
            };

            match action {
                PresenceAction::StartAfterSettle => {
                    tokio::time::sleep(self.config.settle_delay).await;
                    if let Err(e) = coordinator.start_recording(self.config.tab_id).await {
                        warn!("Auto start rejected: {}", e);
                    }
                }
                PresenceAction::Stop => {
                    if let Err(e) = coordinator.stop_recording(true).await {
                        warn!("Auto stop rejected: {}", e);
                    }
                }
            }
        }

        info!("Presence detector stopped");
        Ok(())
    }
}

/// The presence signal: a meeting-code-shaped path segment AND at least one
/// call-UI marker element
pub fn is_call_visible(snapshot: &PageSnapshot) -> bool {
    snapshot.call_ui_markers > 0
        && snapshot
            .url_path
            .split('/')
            .any(looks_like_meeting_code)
}

/// Meeting codes look like `abc-defg-hjk`: lower-case alphabetic groups
/// joined by dashes
fn looks_like_meeting_code(segment: &str) -> bool {
    let groups: Vec<&str> = segment.split('-').collect();
    if groups.len() < 3 {
        return false;
    }

    groups
        .iter()
        .all(|g| !g.is_empty() && g.chars().all(|c| c.is_ascii_lowercase()))
}
