//! # GoAffPro SDK
//!
//! Rust SDK for [GoAffPro](https://goaffpro.com) affiliate tracking.
//! Captures referral codes from deep links, keeps them for the store's cookie
//! duration, and reports visits and orders so affiliates get credited.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use goaffpro_sdk::{Goaffpro, GoaffproOptions, Order};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let goaffpro = Goaffpro::new(GoaffproOptions::default())?;
//!
//!     // On launch: resolves the store's config, processes the launch URL
//!     // and reports a page view if the customer was referred.
//!     let init = goaffpro.init("your-public-token", None, Some("myapp://?ref=jane")).await?;
//!     println!("Referred by: {:?}", init.ref_code);
//!
//!     // Every link the app receives afterwards
//!     goaffpro.handle_url(Some("myapp://product/42?ref=john")).await;
//!
//!     // At checkout
//!     let order = Order {
//!         id: Some("1001".into()),
//!         total: Some(49.99),
//!         ..Default::default()
//!     };
//!     goaffpro.track_conversion(order).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `native-storage` (default): File-based storage in an app data directory
//! - `native-tls` (default): Use native TLS for HTTPS
//! - `rustls-tls`: Use rustls for HTTPS (alternative to native-tls)
//! - `cli` (default): The `goaffpro` command-line tool
//!
//! ## Attribution
//!
//! The store's dashboard picks one of three policies, see
//! [`LinkAttribution`]. Referral state is persisted through a
//! [`StorageAdapter`] and expires lazily after the configured cookie duration.

pub mod attribution;
pub mod config;
pub mod error;
pub mod goaffpro;
pub mod links;
pub mod profile;
pub mod referral;
pub mod storage;
pub mod tracking;
pub mod transport;
pub mod types;

// Main client
pub use goaffpro::{Goaffpro, GoaffproOptions, Session};

// Error types
pub use error::{GoaffproError, GoaffproErrorCode, Result};

// Configuration
pub use config::{resolve_config, Config, LinkAttribution};

// Attribution
pub use attribution::{find_referral_code, AttributionEngine, ORGANIC};
pub use referral::{Clock, ReferralField, ReferralStore, SystemClock};

// Storage
pub use storage::{MemoryStorage, StorageAdapter};

#[cfg(feature = "native-storage")]
pub use storage::FileStorage;

// Links and transport
pub use links::{ChannelLinkSource, LinkSender, LinkSource};
pub use transport::{ApiRequest, HttpTransport, Method, Transport, DEFAULT_BASE_URL};

// Types
pub use types::{
    AffiliateProfile, ConversionData, Customer, InitResult, LineItem, Order, VisitResult,
};
