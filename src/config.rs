//! Attribution configuration and its resolution

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GoaffproError, Result};
use crate::transport::{paths, ApiRequest, Transport};

const MILLIS_PER_DAY: u64 = 24 * 60 * 60 * 1000;

/// Default cookie duration: 7 days
pub const DEFAULT_COOKIE_DURATION_MS: u64 = 7 * MILLIS_PER_DAY;

/// Query parameter used when nothing else is configured
pub const DEFAULT_IDENTIFIER: &str = "ref";

/// Policy deciding which referral code wins across visits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkAttribution {
    /// Credit the most recent qualifying link
    #[default]
    LastTouch,
    /// Lock on the first app open; un-referred first opens are marked organic
    FirstTouch,
    /// Lock on the first real referral
    FirstTouchNonblocking,
}

impl LinkAttribution {
    /// Map the dashboard's `first_touch_or_last` value.
    ///
    /// Only the two first-touch spellings are recognised; anything else
    /// (including the numeric `0` the dashboard uses for last touch) is
    /// last touch.
    pub fn from_remote(value: &Value) -> Self {
        match value.as_str() {
            Some("first_touch") => Self::FirstTouch,
            Some("first_touch_nonblocking") => Self::FirstTouchNonblocking,
            _ => Self::LastTouch,
        }
    }
}

impl std::fmt::Display for LinkAttribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LastTouch => write!(f, "last_touch"),
            Self::FirstTouch => write!(f, "first_touch"),
            Self::FirstTouchNonblocking => write!(f, "first_touch_nonblocking"),
        }
    }
}

/// Attribution configuration, fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Maximum age of a stored referral code, in milliseconds
    pub cookie_duration_ms: u64,
    /// Query parameter names carrying a referral code, matched case-insensitively
    pub identifiers: Vec<String>,
    /// Forget the referral code after a conversion is tracked
    pub remove_tracking_after_order: bool,
    pub link_attribution: LinkAttribution,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cookie_duration_ms: DEFAULT_COOKIE_DURATION_MS,
            identifiers: vec![DEFAULT_IDENTIFIER.to_string()],
            remove_tracking_after_order: false,
            link_attribution: LinkAttribution::LastTouch,
        }
    }
}

impl Config {
    /// Parse a caller-supplied configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| GoaffproError::validation(format!("Invalid configuration: {}", e)))
    }

    /// Map the `/v1/sdk/config.json` response onto a `Config`.
    ///
    /// Absent fields take their default; fields of the wrong shape make the
    /// whole response malformed.
    pub fn from_remote(value: Value) -> Result<Self> {
        #[derive(Deserialize)]
        struct RemoteConfig {
            first_touch_or_last: Option<Value>,
            identifiers: Option<Vec<String>>,
            cookie_duration: Option<Value>,
            remove_tracking_post_order: Option<Value>,
        }

        let remote: RemoteConfig = serde_json::from_value(value)
            .map_err(|e| GoaffproError::validation(format!("Malformed remote config: {}", e)))?;

        let defaults = Self::default();

        let cookie_duration_ms = match remote.cookie_duration {
            None | Some(Value::Null) => defaults.cookie_duration_ms,
            Some(v) => millis_from_value(&v).ok_or_else(|| {
                GoaffproError::validation(format!("Malformed cookie_duration: {}", v))
            })?,
        };

        Ok(Self {
            cookie_duration_ms,
            identifiers: remote.identifiers.unwrap_or(defaults.identifiers),
            remove_tracking_after_order: remote
                .remove_tracking_post_order
                .as_ref()
                .map(truthy)
                .unwrap_or(false),
            link_attribution: remote
                .first_touch_or_last
                .as_ref()
                .map(LinkAttribution::from_remote)
                .unwrap_or_default(),
        })
    }
}

fn millis_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0" && s != "false",
        _ => false,
    }
}

/// Resolve the configuration for a session.
///
/// An override is used as-is. Otherwise the dashboard configuration is
/// fetched; any failure falls back to [`Config::default`].
pub async fn resolve_config(
    transport: &dyn Transport,
    public_token: &str,
    override_config: Option<Config>,
) -> Config {
    if let Some(config) = override_config {
        tracing::debug!("Using caller-supplied configuration");
        return config;
    }

    let fetched = transport
        .send(ApiRequest::get(paths::CONFIG, public_token))
        .await
        .and_then(Config::from_remote);

    match fetched {
        Ok(config) => {
            tracing::debug!(
                link_attribution = %config.link_attribution,
                identifiers = ?config.identifiers,
                "Fetched remote configuration"
            );
            config
        }
        Err(e) => {
            tracing::warn!(error = %e, "Using default config. Public token may be invalid");
            Config::default()
        }
    }
}
