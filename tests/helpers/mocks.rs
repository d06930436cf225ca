use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use lockwatch::models::BatteryAlertRecord;
use lockwatch::services::{
    AlertHistoryStore, CasOutcome, PushError, PushMessage, PushSender, StoreError,
};

/// In-memory alert history with injectable outages and lost races
#[derive(Default)]
pub struct MockHistoryStore {
    record: Mutex<Option<BatteryAlertRecord>>,
    unavailable: Mutex<bool>,
    force_conflicts: AtomicUsize,
    conflict_winner: Mutex<Option<BatteryAlertRecord>>,
    pub get_calls: AtomicUsize,
    pub cas_calls: AtomicUsize,
}

impl MockHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: BatteryAlertRecord) -> Self {
        let store = Self::default();
        *store.record.lock().unwrap() = Some(record);
        store
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }

    /// Make the next `n` conditional writes lose their race
    pub fn force_conflicts(&self, n: usize) {
        self.force_conflicts.store(n, Ordering::SeqCst);
    }

    /// Record the simulated racing writer installs on the first forced conflict
    pub fn set_conflict_winner(&self, record: BatteryAlertRecord) {
        *self.conflict_winner.lock().unwrap() = Some(record);
    }

    pub fn record(&self) -> Option<BatteryAlertRecord> {
        self.record.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertHistoryStore for MockHistoryStore {
    async fn get(&self, _device_id: &str) -> Result<Option<BatteryAlertRecord>, StoreError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if *self.unavailable.lock().unwrap() {
            return Err(StoreError::Unavailable("store offline".to_string()));
        }
        Ok(self.record.lock().unwrap().clone())
    }

    async fn compare_and_set(
        &self,
        expected: Option<&BatteryAlertRecord>,
        new: &BatteryAlertRecord,
    ) -> Result<CasOutcome, StoreError> {
        self.cas_calls.fetch_add(1, Ordering::SeqCst);
        if *self.unavailable.lock().unwrap() {
            return Err(StoreError::Unavailable("store offline".to_string()));
        }

        if self.force_conflicts.load(Ordering::SeqCst) > 0 {
            self.force_conflicts.fetch_sub(1, Ordering::SeqCst);
            if let Some(winner) = self.conflict_winner.lock().unwrap().take() {
                *self.record.lock().unwrap() = Some(winner);
            }
            return Ok(CasOutcome::Conflict);
        }

        let mut current = self.record.lock().unwrap();
        let matches = match (expected, current.as_ref()) {
            (None, None) => true,
            (Some(expected), Some(current)) => expected == current,
            _ => false,
        };

        if matches {
            *current = Some(new.clone());
            Ok(CasOutcome::Applied)
        } else {
            Ok(CasOutcome::Conflict)
        }
    }
}

/// Push sender that records every send and returns a canned result
pub struct MockPushSender {
    result: Mutex<Result<String, String>>,
    pub sent: Mutex<Vec<(String, PushMessage)>>,
}

impl MockPushSender {
    pub fn succeeding(provider_message_id: &str) -> Self {
        Self {
            result: Mutex::new(Ok(provider_message_id.to_string())),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(detail: &str) -> Self {
        Self {
            result: Mutex::new(Err(detail.to_string())),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl PushSender for MockPushSender {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<String, PushError> {
        self.sent
            .lock()
            .unwrap()
            .push((token.to_string(), message.clone()));

        match &*self.result.lock().unwrap() {
            Ok(id) => Ok(id.clone()),
            Err(detail) => Err(PushError::Provider {
                status: 401,
                detail: detail.clone(),
            }),
        }
    }
}
