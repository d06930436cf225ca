use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use time::{Duration, OffsetDateTime};

use crate::models::BatteryAlertRecord;

/// Tuning knobs for the battery alert gate.
///
/// Passed in explicitly; there is no process-wide alerting configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatePolicy {
    /// Alerts are only considered when the observed level is at or below this
    pub threshold: i64,
    /// Minimum time since the last alert before a repeat fires regardless of level
    pub cooldown: Duration,
    /// Minimum further drop below the last alerted level that re-fires inside the cooldown window
    pub min_drop: i64,
}

impl GatePolicy {
    pub fn validate(&self) -> Result<(), GateError> {
        if !(0..=100).contains(&self.threshold) {
            return Err(GateError::InvalidInput(format!(
                "threshold must be between 0 and 100, got {}",
                self.threshold
            )));
        }
        if self.cooldown < Duration::ZERO {
            return Err(GateError::InvalidInput(
                "cooldown must not be negative".to_string(),
            ));
        }
        if self.min_drop < 0 {
            return Err(GateError::InvalidInput(format!(
                "min_drop must not be negative, got {}",
                self.min_drop
            )));
        }
        Ok(())
    }
}

/// Outcome of one battery observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Emit,
    Suppress,
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("alert history store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("concurrent battery observations for device {0} conflicted twice")]
    ConcurrentConflict(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("alert history store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for GateError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => GateError::StoreUnavailable(msg),
        }
    }
}

/// Result of a conditional write against the alert history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    Applied,
    Conflict,
}

/// Keyed alert-history storage with an atomic conditional update.
///
/// `compare_and_set` must apply `new` only if the device's current record
/// still equals `expected` (or is absent when `expected` is `None`); a lost
/// race reports `Conflict` without writing anything.
#[async_trait]
pub trait AlertHistoryStore: Send + Sync {
    async fn get(&self, device_id: &str) -> Result<Option<BatteryAlertRecord>, StoreError>;

    async fn compare_and_set(
        &self,
        expected: Option<&BatteryAlertRecord>,
        new: &BatteryAlertRecord,
    ) -> Result<CasOutcome, StoreError>;
}

/// Pure decision rule, evaluated in order:
///
/// 1. Not low enough to alert → Suppress.
/// 2. No history → Emit (first alert).
/// 3. Cooldown fully elapsed (boundary inclusive) → Emit.
/// 4. Inside the window: Emit only if the level dropped at least `min_drop`
///    points below the level at the last alert.
///
/// The drop is measured against the last *alerted* level, never against the
/// minimum seen since.
pub fn evaluate(
    observed_level: i64,
    now: OffsetDateTime,
    policy: &GatePolicy,
    history: Option<&BatteryAlertRecord>,
) -> Decision {
    if observed_level > policy.threshold {
        return Decision::Suppress;
    }

    let Some(record) = history else {
        return Decision::Emit;
    };

    let elapsed = now - record.last_alert_at;
    if elapsed >= policy.cooldown {
        return Decision::Emit;
    }

    let drop = record.battery_level_at_alert - observed_level;
    if drop >= policy.min_drop {
        Decision::Emit
    } else {
        Decision::Suppress
    }
}

/// Guarded write path for battery observations.
///
/// Reads the device's history, applies [`evaluate`], and on Emit installs the
/// updated record through the store's conditional update. A lost race is
/// retried exactly once against the freshly read record; a second conflict
/// surfaces as [`GateError::ConcurrentConflict`].
#[derive(Clone)]
pub struct BatteryAlertGate {
    store: Arc<dyn AlertHistoryStore>,
    policy: GatePolicy,
}

impl BatteryAlertGate {
    pub fn new(store: Arc<dyn AlertHistoryStore>, policy: GatePolicy) -> Result<Self, GateError> {
        policy.validate()?;
        Ok(Self { store, policy })
    }

    pub fn policy(&self) -> &GatePolicy {
        &self.policy
    }

    /// Run one observation through read-decide-write.
    ///
    /// Fails closed: input validation happens before any store access, and a
    /// store failure leaves the record untouched with no alert emitted.
    pub async fn observe(
        &self,
        device_id: &str,
        observed_level: i64,
        now: OffsetDateTime,
    ) -> Result<Decision, GateError> {
        if !(0..=100).contains(&observed_level) {
            return Err(GateError::InvalidInput(format!(
                "battery level must be between 0 and 100, got {}",
                observed_level
            )));
        }

        let history = self.store.get(device_id).await?;
        if let Some(decision) = self
            .decide_and_write(device_id, observed_level, now, history.as_ref())
            .await?
        {
            return Ok(decision);
        }

        // Lost the conditional write; re-read and re-evaluate once.
        tracing::debug!(
            "Battery observation for device {} lost a write race, retrying",
            device_id
        );
        let fresh = self.store.get(device_id).await?;
        match self
            .decide_and_write(device_id, observed_level, now, fresh.as_ref())
            .await?
        {
            Some(decision) => Ok(decision),
            None => Err(GateError::ConcurrentConflict(device_id.to_string())),
        }
    }

    /// One evaluate-then-CAS round; `None` means the write lost a race.
    async fn decide_and_write(
        &self,
        device_id: &str,
        observed_level: i64,
        now: OffsetDateTime,
        history: Option<&BatteryAlertRecord>,
    ) -> Result<Option<Decision>, GateError> {
        match evaluate(observed_level, now, &self.policy, history) {
            Decision::Suppress => Ok(Some(Decision::Suppress)),
            Decision::Emit => {
                let next = match history {
                    None => BatteryAlertRecord::first_alert(device_id, observed_level, now),
                    Some(record) => record.realerted(observed_level, now),
                };
                match self.store.compare_and_set(history, &next).await? {
                    CasOutcome::Applied => Ok(Some(Decision::Emit)),
                    CasOutcome::Conflict => Ok(None),
                }
            }
        }
    }
}
