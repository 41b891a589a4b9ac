//! Backend records as the client sees them.
//!
//! Each type has a `from_backend` adapter that reads through
//! [`Fields`](crate::normalize::Fields). Values are fresh copies per fetch
//! and are never merged in place.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::constants::{FALLBACK_FARM_NAME, FALLBACK_RESTAURANT_NAME};
use crate::error::DecodeError;
use crate::normalize::{unwrap_envelope, Fields};

// ---------------------------------------------------------------------------
// Receipt
// ---------------------------------------------------------------------------

/// A proof-of-purchase record, redeemable once for a badge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub receipt_id: String,
    pub restaurant_name: String,
    pub batch_id: String,
    pub farm_name: String,
    pub product_name: Option<String>,
    pub amount_paid: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Set by the backend; mirrored locally once a claim settles.
    pub claimed: bool,
}

impl Receipt {
    /// Normalize a `GET /receipt/{id}` body. `requested_id` fills in a
    /// missing `receiptId`.
    pub fn from_backend(body: &Value, requested_id: &str) -> Result<Self, DecodeError> {
        let f = Fields::new(unwrap_envelope(body, &["receipt", "data"]))?;
        let farmer = f.nested(&["farmer"]);

        let farm_name = f
            .text(&["farmName", "farm_name"])
            .or_else(|| farmer.and_then(|fr| fr.text(&["farmName", "farm_name", "name"])))
            .unwrap_or_else(|| FALLBACK_FARM_NAME.to_string());

        Ok(Self {
            receipt_id: f
                .text(&["receiptId", "receipt_id"])
                .unwrap_or_else(|| requested_id.to_string()),
            restaurant_name: f
                .text(&["restaurantName", "restaurant_name"])
                .unwrap_or_else(|| FALLBACK_RESTAURANT_NAME.to_string()),
            batch_id: f.text(&["batchId", "batch_id"]).unwrap_or_default(),
            farm_name,
            product_name: f.text(&["productName", "product_name"]),
            amount_paid: f.number(&["amountPaid", "amount_paid"]),
            created_at: f.time(&["createdAt", "created_at"]),
            expires_at: f.time(&["expiresAt", "expires_at"]),
            claimed: f.flag(&["claimed", "isClaimed", "is_claimed"]),
        })
    }

    /// `now > expiresAt`; a receipt without an expiry never expires locally.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| now > exp)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Body of a successful `POST /receipt/{id}/claim-badge`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimGrant {
    pub farm_name: Option<String>,
    pub batch_id: Option<String>,
    pub transaction_hash: Option<String>,
}

impl ClaimGrant {
    pub fn from_backend(body: &Value) -> Result<Self, DecodeError> {
        let f = Fields::new(unwrap_envelope(body, &["data", "badge"]))?;
        Ok(Self {
            farm_name: f.text(&["farmName", "farm_name"]),
            batch_id: f.text(&["batchId", "batch_id"]),
            transaction_hash: f.text(&["transactionHash", "transaction_hash", "txHash"]),
        })
    }
}

/// What a restaurant gets back after generating a receipt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedReceipt {
    /// Also the QR value to print on the customer's receipt.
    pub receipt_id: String,
    pub batch_id: String,
    pub amount_paid: f64,
    pub expires_at: Option<DateTime<Utc>>,
}

impl CreatedReceipt {
    /// `batch_id` and `amount_paid` are the submitted values, used when the
    /// backend does not echo them.
    pub fn from_backend(body: &Value, batch_id: &str, amount_paid: f64) -> Result<Self, DecodeError> {
        let f = Fields::new(unwrap_envelope(body, &["receipt", "data"]))?;
        Ok(Self {
            receipt_id: f
                .text(&["receiptId", "receipt_id"])
                .ok_or(DecodeError::MissingField("receiptId"))?,
            batch_id: f
                .text(&["batchId", "batch_id"])
                .unwrap_or_else(|| batch_id.to_string()),
            amount_paid: f.number(&["amountPaid", "amount_paid"]).unwrap_or(amount_paid),
            expires_at: f.time(&["expiresAt", "expires_at"]),
        })
    }
}

// ---------------------------------------------------------------------------
// Badge
// ---------------------------------------------------------------------------

/// A collectible record of support for a farm. Display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub farm_name: String,
    pub batch_id: String,
    pub product_name: Option<String>,
    pub restaurant_name: Option<String>,
    pub unlock_date: Option<DateTime<Utc>>,
}

impl Badge {
    pub fn from_backend(item: &Value) -> Result<Self, DecodeError> {
        let f = Fields::new(item)?;
        Ok(Self {
            farm_name: f
                .text(&["farmName", "farm_name"])
                .unwrap_or_else(|| FALLBACK_FARM_NAME.to_string()),
            batch_id: f.text(&["batchId", "batch_id"]).unwrap_or_default(),
            product_name: f.text(&["productName", "product_name"]),
            restaurant_name: f.text(&["restaurantName", "restaurant_name"]),
            unlock_date: f.time(&["unlockDate", "unlocked_at", "unlock_date"]),
        })
    }
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Farmer {
    pub name: String,
    pub location: String,
    pub description: Option<String>,
    pub certifications: Vec<String>,
}

/// Read-only traceability record for a unit of produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub batch_id: String,
    pub farmer: Farmer,
    pub crop_type: Option<String>,
    pub product_name: Option<String>,
    pub harvest_date: Option<DateTime<Utc>>,
    pub quantity: Option<String>,
}

impl Batch {
    /// Normalize a `GET /batch/{id}` body (`{success, data}`) or a single
    /// entry of the restaurant batch list.
    pub fn from_backend(body: &Value) -> Result<Self, DecodeError> {
        let f = Fields::new(unwrap_envelope(body, &["data", "batch"]))?;
        let farmer = f
            .nested(&["farmer"])
            .map(|fr| Farmer {
                name: fr
                    .text(&["name", "farmName", "farm_name"])
                    .unwrap_or_else(|| FALLBACK_FARM_NAME.to_string()),
                location: fr.text(&["location"]).unwrap_or_default(),
                description: fr.text(&["description"]),
                certifications: fr.text_list(&["certifications"]),
            })
            .unwrap_or_else(|| Farmer {
                name: f
                    .text(&["farmName", "farm_name"])
                    .unwrap_or_else(|| FALLBACK_FARM_NAME.to_string()),
                ..Farmer::default()
            });

        Ok(Self {
            batch_id: f
                .text(&["batchId", "batch_id"])
                .ok_or(DecodeError::MissingField("batchId"))?,
            farmer,
            crop_type: f.text(&["cropType", "crop_type", "productType", "product_type"]),
            product_name: f.text(&["productName", "product_name"]),
            harvest_date: f.time(&["harvestDate", "harvest_date"]),
            quantity: f.text(&["quantity"]),
        })
    }

    /// Label used in batch pickers.
    pub fn label(&self) -> &str {
        self.product_name
            .as_deref()
            .or(self.crop_type.as_deref())
            .unwrap_or("Product")
    }
}

/// Another restaurant sourcing from the same farm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NearbyRestaurant {
    pub name: String,
    pub postcode: Option<String>,
}

impl NearbyRestaurant {
    pub fn from_backend(item: &Value) -> Result<Self, DecodeError> {
        let f = Fields::new(item)?;
        Ok(Self {
            name: f
                .text(&["name", "restaurantName", "restaurant_name"])
                .ok_or(DecodeError::MissingField("name"))?,
            postcode: f.text(&["postcode"]),
        })
    }
}

// ---------------------------------------------------------------------------
// Farmer portal records
// ---------------------------------------------------------------------------

/// Result of the gasless farm registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmRegistration {
    pub farm_name: String,
    pub farmer_address: String,
    pub transaction_hash: Option<String>,
}

impl FarmRegistration {
    pub fn from_backend(body: &Value, farm_name: &str, farmer_address: &str) -> Result<Self, DecodeError> {
        let f = Fields::new(unwrap_envelope(body, &["data"]))?;
        Ok(Self {
            farm_name: f
                .text(&["farmName", "farm_name"])
                .unwrap_or_else(|| farm_name.to_string()),
            farmer_address: f
                .text(&["farmerAddress", "farmer_address"])
                .unwrap_or_else(|| farmer_address.to_string()),
            transaction_hash: f.text(&["transactionHash", "transaction_hash"]),
        })
    }
}

/// Result of the gasless batch creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCreated {
    /// Also the QR value to print on the produce label.
    pub batch_id: String,
    pub product_name: String,
    pub transaction_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmerProfile {
    pub farm_name: String,
    pub location: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmerBatch {
    pub batch_id: String,
    pub product_type: String,
    pub product_name: String,
    pub quantity: String,
    pub unit: String,
    pub transaction_hash: Option<String>,
    pub unlocks: u64,
    pub scans: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FarmerDashboard {
    pub farmer: FarmerProfile,
    pub batches: Vec<FarmerBatch>,
}

impl FarmerDashboard {
    pub fn from_backend(body: &Value) -> Result<Self, DecodeError> {
        let root = Fields::new(unwrap_envelope(body, &["data"]))?;
        let farmer = root
            .nested(&["farmer"])
            .ok_or(DecodeError::MissingField("farmer"))?;

        let batches = root
            .list(&["batches"])
            .iter()
            .filter_map(|item| Fields::new(item).ok())
            .map(|b| FarmerBatch {
                batch_id: b.text(&["batchId", "batch_id"]).unwrap_or_else(|| "Unknown".into()),
                product_type: b
                    .text(&["productType", "product_type"])
                    .unwrap_or_else(|| "Unknown".into()),
                product_name: b
                    .text(&["productName", "product_name"])
                    .unwrap_or_else(|| "Unknown".into()),
                quantity: b.text(&["quantity"]).unwrap_or_else(|| "0".into()),
                unit: b.text(&["unit"]).unwrap_or_default(),
                transaction_hash: b.text(&["transactionHash", "transaction_hash"]),
                unlocks: b.count(&["unlocks"]),
                scans: b.count(&["scans"]),
            })
            .collect();

        Ok(Self {
            farmer: FarmerProfile {
                farm_name: farmer
                    .text(&["farmName", "farm_name", "name"])
                    .unwrap_or_else(|| FALLBACK_FARM_NAME.to_string()),
                location: farmer.text(&["location"]).unwrap_or_default(),
                address: farmer
                    .text(&["address", "farmerAddress", "farmer_address"])
                    .unwrap_or_default(),
            },
            batches,
        })
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    pub fn total_unlocks(&self) -> u64 {
        self.batches.iter().map(|b| b.unlocks).sum()
    }

    pub fn total_scans(&self) -> u64 {
        self.batches.iter().map(|b| b.scans).sum()
    }
}

/// Explorer link for a transaction hash.
pub fn explorer_tx_url(base: &str, transaction_hash: &str) -> String {
    format!("{base}{transaction_hash}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_receipt_camel_case() {
        let body = json!({
            "success": true,
            "receipt": {
                "receiptId": "RECEIPT-20260201-ABC123",
                "restaurantName": "The Green Table",
                "batchId": "VEG-001",
                "farmName": "Green Valley",
                "productName": "Carrots",
                "amountPaid": 12.5,
                "createdAt": "2026-02-01T10:00:00Z",
                "expiresAt": "2026-02-08T10:00:00Z",
                "claimed": false
            }
        });
        let r = Receipt::from_backend(&body, "ignored").unwrap();
        assert_eq!(r.receipt_id, "RECEIPT-20260201-ABC123");
        assert_eq!(r.restaurant_name, "The Green Table");
        assert_eq!(r.farm_name, "Green Valley");
        assert_eq!(r.amount_paid, Some(12.5));
        assert!(!r.claimed);
    }

    #[test]
    fn test_receipt_snake_case_and_fallbacks() {
        let body = json!({
            "restaurant_name": "Oak Bistro",
            "batch_id": "VEG-002",
            "farmer": { "farmName": "Oak Hill" },
            "amount_paid": "9.99",
            "expires_at": "2020-01-01T00:00:00Z",
            "claimed": true
        });
        let r = Receipt::from_backend(&body, "RECEIPT-9").unwrap();
        assert_eq!(r.receipt_id, "RECEIPT-9");
        assert_eq!(r.batch_id, "VEG-002");
        assert_eq!(r.farm_name, "Oak Hill");
        assert_eq!(r.amount_paid, Some(9.99));
        assert!(r.claimed);
        assert!(r.is_expired());
    }

    #[test]
    fn test_receipt_defaults() {
        let r = Receipt::from_backend(&json!({}), "RECEIPT-1").unwrap();
        assert_eq!(r.farm_name, FALLBACK_FARM_NAME);
        assert_eq!(r.restaurant_name, FALLBACK_RESTAURANT_NAME);
        assert!(!r.is_expired());
    }

    #[test]
    fn test_receipt_rejects_non_object() {
        assert!(Receipt::from_backend(&json!("nope"), "R").is_err());
    }

    #[test]
    fn test_batch_story() {
        let body = json!({
            "success": true,
            "data": {
                "batchId": "VEGMIX-001",
                "farmer": {
                    "name": "Green Valley",
                    "location": "Cornwall, UK",
                    "certifications": "Organic"
                },
                "cropType": "Vegetable",
                "harvestDate": "2026-01-29T00:00:00Z",
                "quantity": 50
            }
        });
        let b = Batch::from_backend(&body).unwrap();
        assert_eq!(b.batch_id, "VEGMIX-001");
        assert_eq!(b.farmer.name, "Green Valley");
        assert_eq!(b.farmer.certifications, vec!["Organic"]);
        assert_eq!(b.quantity.as_deref(), Some("50"));
        assert_eq!(b.label(), "Vegetable");
    }

    #[test]
    fn test_badge_unlocked_at_alias() {
        let b = Badge::from_backend(&json!({
            "farm_name": "Oak Hill",
            "batch_id": "B-1",
            "unlocked_at": "2026-02-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(b.farm_name, "Oak Hill");
        assert!(b.unlock_date.is_some());
        assert!(b.product_name.is_none());
    }

    #[test]
    fn test_claim_grant_snake_case() {
        let g = ClaimGrant::from_backend(&json!({
            "success": true,
            "farm_name": "Green Valley",
            "transaction_hash": "0xabc"
        }))
        .unwrap();
        assert_eq!(g.farm_name.as_deref(), Some("Green Valley"));
        assert_eq!(g.transaction_hash.as_deref(), Some("0xabc"));
        assert_eq!(g.batch_id, None);
    }

    #[test]
    fn test_created_receipt_requires_id() {
        assert!(CreatedReceipt::from_backend(&json!({ "success": true }), "B", 1.0).is_err());
        let c = CreatedReceipt::from_backend(
            &json!({ "receipt": { "receipt_id": "RECEIPT-7" } }),
            "VEG-1",
            4.5,
        )
        .unwrap();
        assert_eq!(c.receipt_id, "RECEIPT-7");
        assert_eq!(c.batch_id, "VEG-1");
        assert_eq!(c.amount_paid, 4.5);
    }

    #[test]
    fn test_dashboard_totals() {
        let d = FarmerDashboard::from_backend(&json!({
            "farmer": { "farmName": "Green Valley", "location": "Cornwall", "address": "0x1" },
            "batches": [
                { "batchId": "A", "unlocks": 3, "scans": 10 },
                { "batchId": "B", "scans": "4" },
                { "batchId": { "oops": true } }
            ]
        }))
        .unwrap();
        assert_eq!(d.batch_count(), 3);
        assert_eq!(d.total_unlocks(), 3);
        assert_eq!(d.total_scans(), 14);
        assert_eq!(d.batches[2].batch_id, "Unknown");
    }

    #[test]
    fn test_explorer_url() {
        assert_eq!(
            explorer_tx_url(crate::constants::DEFAULT_EXPLORER_TX_URL, "0xdead"),
            "https://sepolia.etherscan.io/tx/0xdead"
        );
    }
}
