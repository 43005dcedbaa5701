//! Referral attribution
//!
//! Decides, for each incoming link or app open, whether the stored referral
//! code changes:
//!
//! - `LastTouch`: a link carrying a referral always overwrites.
//! - `FirstTouch`: the first open locks the session. With nothing stored the
//!   code becomes [`ORGANIC`], with or without a referral link, and is never
//!   overwritten afterwards.
//! - `FirstTouchNonblocking`: the first referral link is stored; later ones
//!   are ignored.
//!
//! Before a configuration is resolved only `ref` is recognised and a
//! referral link overwrites, as for last touch.

use url::Url;

use crate::config::{Config, LinkAttribution, DEFAULT_IDENTIFIER};
use crate::referral::ReferralStore;

/// Code recorded for first-touch sessions that did not start from a referral
pub const ORGANIC: &str = "organic";

/// Find the referral code in `url`'s query string.
///
/// The first parameter (in query order) whose lower-cased name matches one
/// of `identifiers` wins. Identifiers are trimmed and lower-cased before
/// matching. The value is returned as it appears in the link, without
/// percent-decoding, and ends at the next `=`. A matching parameter with an
/// empty or missing value yields `None`.
pub fn find_referral_code<S: AsRef<str>>(identifiers: &[S], url: &str) -> Option<String> {
    if identifiers.is_empty() {
        return None;
    }

    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!(url, error = %e, "Ignoring unparseable URL");
            return None;
        }
    };

    let query = parsed.query()?;

    let wanted: Vec<String> = identifiers
        .iter()
        .map(|i| i.as_ref().trim().to_lowercase())
        .collect();

    let mut parts = query
        .split('&')
        .map(|pair| pair.split('='))
        .find_map(|mut parts| {
            let name = parts.next()?;
            wanted.contains(&name.to_lowercase()).then_some(parts)
        })?;

    parts
        .next()
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Applies the configured attribution policy to the referral store.
pub struct AttributionEngine<'a> {
    store: &'a ReferralStore,
    config: Option<&'a Config>,
}

impl<'a> AttributionEngine<'a> {
    /// `config` is `None` until the session has been initialized.
    pub fn new(store: &'a ReferralStore, config: Option<&'a Config>) -> Self {
        Self { store, config }
    }

    /// Process one link event. `url` is `None` for a plain app open.
    pub async fn process(&self, url: Option<&str>) {
        let cookie_duration = self.config.map(|c| c.cookie_duration_ms);
        let strategy = self.config.map(|c| c.link_attribution);

        if let Some(url) = url {
            let candidate = match self.config {
                Some(config) => find_referral_code(&config.identifiers, url),
                None => find_referral_code(&[DEFAULT_IDENTIFIER], url),
            };

            if let Some(candidate) = candidate {
                tracing::debug!(candidate = %candidate, strategy = ?strategy, "Referral link received");

                match strategy {
                    Some(LinkAttribution::FirstTouch) => {
                        if self.store.get(cookie_duration).await.is_none() {
                            self.store.set(ORGANIC).await;
                        }
                    }
                    Some(LinkAttribution::FirstTouchNonblocking) => {
                        if self.store.get(cookie_duration).await.is_none() {
                            self.store.set(&candidate).await;
                        }
                    }
                    Some(LinkAttribution::LastTouch) | None => {
                        self.store.set(&candidate).await;
                    }
                }
            }
        }

        // first touch locks on the very first open, link or not
        if strategy == Some(LinkAttribution::FirstTouch)
            && self.store.get(cookie_duration).await.is_none()
        {
            self.store.set(ORGANIC).await;
        }
    }
}
