//! Affiliate profile lookup

use std::sync::Arc;

use crate::error::{GoaffproError, Result};
use crate::goaffpro::Session;
use crate::referral::ReferralStore;
use crate::transport::{paths, ApiRequest, Transport};
use crate::types::{AffiliateProfile, AffiliateResponse};

/// Fields requested from the affiliate endpoint
const PROFILE_FIELDS: &str = "name,first_name,last_name,comments,profile_photo,company_name,coupon";

pub struct ProfileClient {
    transport: Arc<dyn Transport>,
    referrals: ReferralStore,
}

impl ProfileClient {
    pub fn new(transport: Arc<dyn Transport>, referrals: ReferralStore) -> Self {
        Self {
            transport,
            referrals,
        }
    }

    /// Look up the public profile of the affiliate behind `referral_code`,
    /// or behind the stored referral code when none is given.
    ///
    /// Returns `Ok(None)` without a network call when there is no code to
    /// look up. Results are not cached.
    pub async fn get_affiliate_details(
        &self,
        session: Option<&Session>,
        referral_code: Option<&str>,
    ) -> Result<Option<AffiliateProfile>> {
        let code = match referral_code.filter(|c| !c.is_empty()) {
            Some(code) => Some(code.to_string()),
            None => {
                self.referrals
                    .get(session.map(|s| s.config.cookie_duration_ms))
                    .await
            }
        };
        let Some(code) = code else {
            return Ok(None);
        };

        let session = session.ok_or_else(|| GoaffproError::not_initialized("get_affiliate_details"))?;

        let path = format!(
            "{}?fields={}&ref_code={}",
            paths::AFFILIATE,
            PROFILE_FIELDS,
            urlencoding::encode(&code)
        );

        let response = self
            .transport
            .send(ApiRequest::get(path, &session.public_token))
            .await?;
        let profile: AffiliateResponse = serde_json::from_value(response)?;

        Ok(Some(profile.into()))
    }
}

impl std::fmt::Debug for ProfileClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileClient").finish_non_exhaustive()
    }
}
