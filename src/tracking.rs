//! Page-view and conversion reporting

use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::{GoaffproError, Result};
use crate::goaffpro::Session;
use crate::referral::{ReferralField, ReferralStore};
use crate::transport::{paths, ApiRequest, Transport};
use crate::types::{ConversionData, VisitResponse, VisitResult};

pub struct TrackingClient {
    transport: Arc<dyn Transport>,
    referrals: ReferralStore,
}

impl TrackingClient {
    pub fn new(transport: Arc<dyn Transport>, referrals: ReferralStore) -> Self {
        Self {
            transport,
            referrals,
        }
    }

    /// Report a page view for the current referral.
    ///
    /// Returns `Ok(None)` without touching the network when no referral code
    /// is stored. On success the returned visit id and affiliate id are
    /// persisted so a later conversion can be tied to this visit.
    pub async fn track_page_view(&self, session: Option<&Session>) -> Result<Option<VisitResult>> {
        let cookie_duration = session.map(|s| s.config.cookie_duration_ms);
        let Some(code) = self.referrals.get(cookie_duration).await else {
            return Ok(None);
        };

        let Some(session) = session else {
            let err = GoaffproError::not_initialized("track_page_view");
            tracing::error!("{}", err.message);
            return Err(err);
        };

        let visit_id = self.referrals.visit_id().await;
        let body = json!({
            "ref": code,
            "id": visit_id,
        });

        let response = self
            .transport
            .send(ApiRequest::post(paths::TRACK_VISIT, &session.public_token, body))
            .await?;
        let visit = VisitResult::from(serde_json::from_value::<VisitResponse>(response)?);

        if let Some(id) = &visit.id {
            self.referrals.set_visit_id(id).await;
        }
        if let Some(affiliate_id) = &visit.affiliate_id {
            self.referrals.set_affiliate_id(affiliate_id).await;
        }

        tracing::debug!(visit_id = ?visit.id, affiliate_id = ?visit.affiliate_id, "Page view tracked");
        Ok(Some(visit))
    }

    /// Report a completed order and return the server's response.
    ///
    /// The order is attributed to the stored referral code, if any. After a
    /// successful call the visit id is always cleared; the code, timestamp
    /// and affiliate id are cleared only when the configuration asks for it.
    /// A failed call leaves the stored state untouched.
    pub async fn track_conversion(
        &self,
        session: Option<&Session>,
        data: ConversionData,
    ) -> Result<Value> {
        let Some(session) = session else {
            let err = GoaffproError::not_initialized("track_conversion");
            tracing::error!("{}", err.message);
            return Err(err);
        };

        let code = self
            .referrals
            .get(Some(session.config.cookie_duration_ms))
            .await;
        let visit_id = match code {
            Some(_) => self.referrals.visit_id().await,
            None => None,
        };

        let body = json!({
            "data": data,
            "ref": code,
            "visit_id": visit_id,
        });

        let response = self
            .transport
            .send(ApiRequest::post(
                paths::TRACK_CONVERSION,
                &session.public_token,
                body,
            ))
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Conversion tracking failed"))?;

        if session.config.remove_tracking_after_order {
            self.referrals
                .clear(&[
                    ReferralField::Code,
                    ReferralField::RecordedAt,
                    ReferralField::AffiliateId,
                ])
                .await;
        }
        self.referrals.clear(&[ReferralField::VisitId]).await;

        Ok(response)
    }
}

impl std::fmt::Debug for TrackingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingClient").finish_non_exhaustive()
    }
}
