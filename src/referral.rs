//! Persisted referral record
//!
//! The record lives under four independent storage keys (see
//! [`crate::storage::keys`]). The code and its timestamp are always written
//! and evicted together; a new code drops any visit id recorded for the old
//! one. Storage failures are logged and treated as an absent value.

use std::sync::Arc;

use crate::storage::{keys, StorageAdapter};

/// Source of the current time, in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// One part of the persisted referral record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferralField {
    Code,
    RecordedAt,
    VisitId,
    AffiliateId,
}

impl ReferralField {
    pub const ALL: [ReferralField; 4] = [
        ReferralField::Code,
        ReferralField::RecordedAt,
        ReferralField::VisitId,
        ReferralField::AffiliateId,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Code => keys::REF,
            Self::RecordedAt => keys::REF_TIME,
            Self::VisitId => keys::VISIT_ID,
            Self::AffiliateId => keys::AFFILIATE_ID,
        }
    }
}

#[derive(Clone)]
pub struct ReferralStore {
    storage: Arc<dyn StorageAdapter>,
    clock: Arc<dyn Clock>,
}

impl ReferralStore {
    pub fn new(storage: Arc<dyn StorageAdapter>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Current referral code, or `None` if absent or expired.
    ///
    /// With a `cookie_duration_ms`, a code older than that is evicted along
    /// with its timestamp and visit id. Without one (no session yet) the
    /// age is not checked.
    pub async fn get(&self, cookie_duration_ms: Option<u64>) -> Option<String> {
        let code = self.read(keys::REF).await;
        let recorded_at = self.read(keys::REF_TIME).await;

        if let (Some(max_age), Some(recorded_at)) = (cookie_duration_ms, recorded_at) {
            let age = self
                .clock
                .now_millis()
                .saturating_sub(parse_millis(&recorded_at));
            if u64::try_from(age).is_ok_and(|age| age > max_age) {
                tracing::debug!(age_ms = age, max_age_ms = max_age, "Referral code expired");
                self.clear(&[
                    ReferralField::Code,
                    ReferralField::RecordedAt,
                    ReferralField::VisitId,
                ])
                .await;
                return None;
            }
        }

        code
    }

    /// Store `code` as the current referral.
    ///
    /// Writing the code that is already stored does nothing, so the
    /// timestamp of the original attribution is kept.
    pub async fn set(&self, code: &str) {
        if self.read(keys::REF).await.as_deref() == Some(code) {
            return;
        }

        tracing::info!(code, "Recording referral code");
        self.write(keys::REF, code).await;
        self.write(keys::REF_TIME, &self.clock.now_millis().to_string())
            .await;
        self.delete(keys::VISIT_ID).await;
    }

    /// Remove the given parts of the record.
    pub async fn clear(&self, fields: &[ReferralField]) {
        for field in fields {
            self.delete(field.key()).await;
        }
    }

    /// When the current code was recorded, in milliseconds since the epoch.
    pub async fn recorded_at(&self) -> Option<i64> {
        self.read(keys::REF_TIME)
            .await
            .map(|raw| parse_millis(&raw))
    }

    pub async fn visit_id(&self) -> Option<String> {
        self.read(keys::VISIT_ID).await
    }

    pub async fn set_visit_id(&self, visit_id: &str) {
        self.write(keys::VISIT_ID, visit_id).await;
    }

    pub async fn affiliate_id(&self) -> Option<String> {
        self.read(keys::AFFILIATE_ID).await
    }

    pub async fn set_affiliate_id(&self, affiliate_id: &str) {
        self.write(keys::AFFILIATE_ID, affiliate_id).await;
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read referral state");
                None
            }
        }
    }

    async fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.storage.set(key, value).await {
            tracing::warn!(key, error = %e, "Failed to write referral state");
        }
    }

    async fn delete(&self, key: &str) {
        if let Err(e) = self.storage.remove(key).await {
            tracing::warn!(key, error = %e, "Failed to remove referral state");
        }
    }
}

/// An unparseable timestamp counts as the epoch, so the code expires.
fn parse_millis(raw: &str) -> i64 {
    raw.trim().parse().unwrap_or(0)
}

impl std::fmt::Debug for ReferralStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferralStore")
            .field("storage", &"<storage>")
            .finish()
    }
}
