//! GoAffPro client

use serde_json::Value;
use std::sync::{Arc, RwLock};

use crate::attribution::AttributionEngine;
use crate::config::{resolve_config, Config};
use crate::error::{GoaffproError, Result};
use crate::links::LinkSource;
use crate::profile::ProfileClient;
use crate::referral::{Clock, ReferralField, ReferralStore, SystemClock};
use crate::storage::{MemoryStorage, StorageAdapter};
use crate::tracking::TrackingClient;
use crate::transport::{HttpTransport, Transport};
use crate::types::{AffiliateProfile, ConversionData, InitResult, VisitResult};

/// Configuration options for the GoAffPro client
#[derive(Clone, Default)]
pub struct GoaffproOptions {
    /// GoAffPro API URL (default: "https://api.goaffpro.com"). Ignored when
    /// a custom transport is given.
    pub base_url: Option<String>,
    /// Custom storage adapter (default: MemoryStorage)
    pub storage: Option<Arc<dyn StorageAdapter>>,
    /// Custom transport (default: HttpTransport)
    pub transport: Option<Arc<dyn Transport>>,
    /// Time source for referral expiry (default: SystemClock)
    pub clock: Option<Arc<dyn Clock>>,
}

impl std::fmt::Debug for GoaffproOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoaffproOptions")
            .field("base_url", &self.base_url)
            .field("storage", &self.storage.as_ref().map(|_| "<storage>"))
            .field("transport", &self.transport.as_ref().map(|_| "<transport>"))
            .field("clock", &self.clock.as_ref().map(|_| "<clock>"))
            .finish()
    }
}

/// State established by [`Goaffpro::init`]: the store's public token and
/// the attribution configuration resolved for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub public_token: String,
    pub config: Config,
}

/// GoAffPro SDK client.
///
/// Create it at startup, call [`init`](Self::init) once, then feed it links
/// with [`handle_url`](Self::handle_url) or [`listen`](Self::listen).
///
/// Calls that change attribution are not synchronized with each other.
/// Hosts that care about strict ordering should drive them from one task.
///
/// # Example
/// ```rust,ignore
/// use goaffpro_sdk::{Goaffpro, Order};
///
/// let goaffpro = Goaffpro::new(Default::default())?;
/// goaffpro.init("public-token", None, Some("myapp://shop?ref=jane")).await?;
///
/// // later, at checkout
/// goaffpro.track_conversion(Order { id: Some("1001".into()), ..Default::default() }).await?;
/// ```
pub struct Goaffpro {
    session: RwLock<Option<Arc<Session>>>,
    transport: Arc<dyn Transport>,
    referrals: ReferralStore,
    tracking: TrackingClient,
    profiles: ProfileClient,
}

impl Goaffpro {
    /// Create a new, uninitialized client.
    pub fn new(options: GoaffproOptions) -> Result<Self> {
        let transport: Arc<dyn Transport> = match options.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(options.base_url.as_deref())?),
        };

        let storage: Arc<dyn StorageAdapter> =
            options.storage.unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let clock: Arc<dyn Clock> = options.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let referrals = ReferralStore::new(storage, clock);

        Ok(Self {
            session: RwLock::new(None),
            tracking: TrackingClient::new(transport.clone(), referrals.clone()),
            profiles: ProfileClient::new(transport.clone(), referrals.clone()),
            transport,
            referrals,
        })
    }

    // ==================== Lifecycle ====================

    /// Initialize the SDK. Call it when the app launches.
    ///
    /// Resolves the attribution configuration (`config` if given, otherwise
    /// the store's dashboard settings), processes the launch URL and reports
    /// a page view. A failed page view is logged and does not fail `init`.
    pub async fn init(
        &self,
        public_token: &str,
        config: Option<Config>,
        initial_url: Option<&str>,
    ) -> Result<InitResult> {
        if public_token.is_empty() {
            return Err(GoaffproError::validation("public_token is required"));
        }

        let config = resolve_config(self.transport.as_ref(), public_token, config).await;
        tracing::info!(link_attribution = %config.link_attribution, "GoAffPro SDK initialized");

        let session = Arc::new(Session {
            public_token: public_token.to_string(),
            config,
        });
        // the slot only ever holds a complete Arc, so a poisoned lock is still usable
        *self.session.write().unwrap_or_else(|e| e.into_inner()) = Some(session);

        self.handle_url(initial_url).await;

        if let Err(e) = self.track_page_view().await {
            tracing::warn!(error = %e, "Initial page view was not tracked");
        }

        Ok(InitResult {
            success: true,
            ref_code: self.referral_code().await,
        })
    }

    /// Initialize using the launch URL reported by `links`.
    pub async fn init_from_source<L: LinkSource + ?Sized>(
        &self,
        public_token: &str,
        config: Option<Config>,
        links: &mut L,
    ) -> Result<InitResult> {
        let initial_url = links.initial_url().await;
        self.init(public_token, config, initial_url.as_deref()).await
    }

    /// Apply the attribution policy to one link event.
    ///
    /// `url` is `None` when the app was opened without a link.
    pub async fn handle_url(&self, url: Option<&str>) {
        let session = self.session();
        AttributionEngine::new(&self.referrals, session.as_deref().map(|s| &s.config))
            .process(url)
            .await;
    }

    /// Process every URL from `links`, one at a time, until it closes.
    pub async fn listen<L: LinkSource + ?Sized>(&self, links: &mut L) {
        while let Some(url) = links.next_url().await {
            tracing::debug!(url = %url, "Received URL");
            self.handle_url(Some(&url)).await;
        }
    }

    // ==================== Tracking ====================

    /// Report a page view for the current referral.
    ///
    /// Does nothing if the customer did not arrive through a referral link.
    pub async fn track_page_view(&self) -> Result<Option<VisitResult>> {
        let session = self.session();
        self.tracking.track_page_view(session.as_deref()).await
    }

    /// Attribute a completed order to the current referral.
    pub async fn track_conversion(&self, order: impl Into<ConversionData>) -> Result<Value> {
        let session = self.session();
        self.tracking
            .track_conversion(session.as_deref(), order.into())
            .await
    }

    /// Public profile of the affiliate behind `referral_code`, or behind the
    /// current referral when `None`.
    pub async fn get_affiliate_details(
        &self,
        referral_code: Option<&str>,
    ) -> Result<Option<AffiliateProfile>> {
        let session = self.session();
        self.profiles
            .get_affiliate_details(session.as_deref(), referral_code)
            .await
    }

    // ==================== Referral State ====================

    /// The current referral code, if one is stored and not expired.
    pub async fn referral_code(&self) -> Option<String> {
        let session = self.session();
        self.referrals
            .get(session.map(|s| s.config.cookie_duration_ms))
            .await
    }

    /// Overwrite the current referral code, bypassing the attribution policy.
    pub async fn set_referral_code(&self, referral_code: &str) {
        self.referrals.set(referral_code).await;
    }

    pub async fn visit_id(&self) -> Option<String> {
        self.referrals.visit_id().await
    }

    pub async fn affiliate_id(&self) -> Option<String> {
        self.referrals.affiliate_id().await
    }

    /// Forget all persisted referral state.
    pub async fn clear_referral(&self) {
        self.referrals.clear(&ReferralField::ALL).await;
    }

    // ==================== Session ====================

    pub fn is_initialized(&self) -> bool {
        self.session().is_some()
    }

    pub fn public_token(&self) -> Option<String> {
        self.session().map(|s| s.public_token.clone())
    }

    pub fn config(&self) -> Option<Config> {
        self.session().map(|s| s.config.clone())
    }

    fn session(&self) -> Option<Arc<Session>> {
        self.session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl std::fmt::Debug for Goaffpro {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Goaffpro")
            .field("initialized", &self.is_initialized())
            .field("config", &self.config())
            .finish()
    }
}
