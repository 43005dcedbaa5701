//! Test utilities and fixtures for GoAffPro SDK integration tests

#![allow(dead_code, unused_imports)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

pub use goaffpro_sdk::storage::keys;
pub use goaffpro_sdk::transport::paths;
pub use goaffpro_sdk::*;

pub const TOKEN: &str = "test-public-token";
pub const DAY_MS: u64 = 24 * 60 * 60 * 1000;

/// Start of the test clock: 2024-01-01T00:00:00Z
pub const T0: i64 = 1_704_067_200_000;

/// Clock that only moves when told to
pub struct FixedClock(AtomicI64);

impl FixedClock {
    pub fn at(millis: i64) -> Arc<Self> {
        Arc::new(Self(AtomicI64::new(millis)))
    }

    pub fn advance(&self, millis: i64) {
        self.0.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Transport that records every request and answers from canned responses
/// keyed by path (query string ignored).
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<String, std::result::Result<Value, GoaffproError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, path: &str, response: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), Ok(response));
    }

    pub fn fail(&self, path: &str, error: GoaffproError) {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), Err(error));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| route(&r.path) == path)
            .collect()
    }
}

fn route(path: &str) -> &str {
    path.split('?').next().unwrap_or(path)
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value> {
        let key = route(&request.path).to_string();
        self.requests.lock().unwrap().push(request);

        self.responses
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Err(GoaffproError::network(format!("no response for {}", key))))
    }
}

pub struct TestClient {
    pub goaffpro: Goaffpro,
    pub transport: Arc<MockTransport>,
    pub storage: Arc<MemoryStorage>,
    pub clock: Arc<FixedClock>,
}

/// Uninitialized client wired to a mock transport, in-memory storage and a
/// fixed clock.
pub fn test_client() -> TestClient {
    let transport = MockTransport::new();
    let storage = Arc::new(MemoryStorage::new());
    let clock = FixedClock::at(T0);

    let goaffpro = Goaffpro::new(GoaffproOptions {
        base_url: None,
        storage: Some(storage.clone()),
        transport: Some(transport.clone()),
        clock: Some(clock.clone()),
    })
    .expect("Failed to create test client");

    TestClient {
        goaffpro,
        transport,
        storage,
        clock,
    }
}

/// Referral store over fresh in-memory storage and a fixed clock
pub fn test_store() -> (ReferralStore, Arc<MemoryStorage>, Arc<FixedClock>) {
    let storage = Arc::new(MemoryStorage::new());
    let clock = FixedClock::at(T0);
    (
        ReferralStore::new(storage.clone(), clock.clone()),
        storage,
        clock,
    )
}

pub fn config_with(link_attribution: LinkAttribution) -> Config {
    Config {
        link_attribution,
        ..Default::default()
    }
}

pub fn visit_response(id: &str, affiliate_id: &str) -> Value {
    serde_json::json!({ "id": id, "affiliate_id": affiliate_id })
}
