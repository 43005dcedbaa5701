//! Type definitions for the GoAffPro SDK

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Customer attached to an order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// One line of an order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: u32,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
}

/// A completed order.
///
/// Forwarded to the conversion endpoint as-is; the SDK does not validate it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Order date, RFC 3339
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_items: Option<Vec<LineItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupons: Option<Vec<String>>,
}

/// Payload of a conversion: a typed order or an order id/number string
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConversionData {
    Order(Box<Order>),
    Raw(String),
}

impl From<Order> for ConversionData {
    fn from(order: Order) -> Self {
        Self::Order(Box::new(order))
    }
}

impl From<String> for ConversionData {
    fn from(raw: String) -> Self {
        Self::Raw(raw)
    }
}

impl From<&str> for ConversionData {
    fn from(raw: &str) -> Self {
        Self::Raw(raw.to_string())
    }
}

/// Result from tracking a page view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitResult {
    /// Visit id issued by the server
    pub id: Option<String>,
    /// Affiliate credited with the visit
    pub affiliate_id: Option<String>,
}

/// API response for the visit endpoint.
///
/// Ids arrive as numbers or strings depending on the store.
#[derive(Debug, Deserialize)]
pub(crate) struct VisitResponse {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub affiliate_id: Option<Value>,
}

impl From<VisitResponse> for VisitResult {
    fn from(r: VisitResponse) -> Self {
        Self {
            id: r.id.as_ref().and_then(id_string),
            affiliate_id: r.affiliate_id.as_ref().and_then(id_string),
        }
    }
}

/// Render a JSON id as a string; null, false, zero and empty are no id.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

/// Public profile of an affiliate
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AffiliateProfile {
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub profile_photo_url: Option<String>,
    pub company_name: Option<String>,
    pub coupon: Option<String>,
}

/// API response for the affiliate endpoint
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct AffiliateResponse {
    pub name: Option<String>,
    pub fname: Option<String>,
    pub lname: Option<String>,
    pub comments: Option<String>,
    pub profile_photo: Option<String>,
    pub company_name: Option<String>,
    pub coupon: Option<String>,
}

impl From<AffiliateResponse> for AffiliateProfile {
    fn from(r: AffiliateResponse) -> Self {
        Self {
            name: r.name,
            first_name: r.fname,
            last_name: r.lname,
            bio: r.comments,
            profile_photo_url: r.profile_photo,
            company_name: r.company_name,
            coupon: r.coupon,
        }
    }
}

/// Result from `init`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitResult {
    pub success: bool,
    /// Referral code in effect after the launch URL was processed
    pub ref_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_conversion_data_serializes_untagged() {
        let raw = serde_json::to_value(ConversionData::from("#1001")).unwrap();
        assert_eq!(raw, json!("#1001"));

        let order = Order {
            id: Some("1001".into()),
            total: Some(49.5),
            ..Default::default()
        };
        let value = serde_json::to_value(ConversionData::from(order)).unwrap();
        assert_eq!(value, json!({"id": "1001", "total": 49.5}));
    }

    #[test]
    fn test_visit_response_ids_accept_numbers_and_strings() {
        let r: VisitResponse = serde_json::from_value(json!({"id": 991, "affiliate_id": "77"})).unwrap();
        let result = VisitResult::from(r);
        assert_eq!(result.id.as_deref(), Some("991"));
        assert_eq!(result.affiliate_id.as_deref(), Some("77"));

        let r: VisitResponse = serde_json::from_value(json!({"id": null, "affiliate_id": 0})).unwrap();
        let result = VisitResult::from(r);
        assert_eq!(result.id, None);
        assert_eq!(result.affiliate_id, None);
    }

    #[test]
    fn test_affiliate_response_remaps_fields() {
        let r: AffiliateResponse = serde_json::from_value(json!({
            "name": "Jane Doe",
            "fname": "Jane",
            "lname": "Doe",
            "comments": "Runs a cooking blog",
            "profile_photo": "https://cdn.example/jane.png",
            "company_name": "Jane's Kitchen",
            "coupon": "JANE10"
        }))
        .unwrap();

        let profile = AffiliateProfile::from(r);
        assert_eq!(profile.first_name.as_deref(), Some("Jane"));
        assert_eq!(profile.last_name.as_deref(), Some("Doe"));
        assert_eq!(profile.bio.as_deref(), Some("Runs a cooking blog"));
        assert_eq!(profile.profile_photo_url.as_deref(), Some("https://cdn.example/jane.png"));
        assert_eq!(profile.coupon.as_deref(), Some("JANE10"));
    }
}
