//! Receipt fetch and badge claim, at most one claim in flight per receipt.
//!
//! The coordinator keeps a local mirror of every receipt it has fetched.
//! Once a claim settles as granted or already claimed the mirror is marked
//! claimed and no later call reaches the backend for that receipt.
//!
//! Mutual exclusion is a plain "claiming" set: the client runs on one
//! cooperative task, so the set is only touched between suspension points.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use farmpass_shared::constants::FALLBACK_FARM_NAME;
use farmpass_shared::models::{ClaimGrant, Receipt};

use crate::api::Backend;
use crate::error::ApiError;

/// A response tagged with the identifier it was requested for.
#[derive(Debug)]
pub struct Tagged<T> {
    pub id: String,
    pub value: T,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimResult {
    Success {
        farm_name: String,
        batch_id: String,
        transaction_hash: Option<String>,
    },
    AlreadyClaimed,
    Expired,
    Unauthenticated,
    NetworkError(String),
    /// Rejected locally: a claim for this receipt is still pending.
    InFlight,
    NotFound,
    Rejected { message: String },
}

impl ClaimResult {
    /// Settled outcomes after which the claim action is never offered again.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::AlreadyClaimed)
    }
}

pub struct ClaimCoordinator<B: Backend> {
    backend: Arc<B>,
    receipts: RefCell<HashMap<String, Receipt>>,
    claimed: RefCell<HashSet<String>>,
    claiming: RefCell<HashSet<String>>,
}

/// Clears the claiming flag on every exit path, including a dropped future.
struct ClaimingGuard<'a> {
    claiming: &'a RefCell<HashSet<String>>,
    receipt_id: String,
}

impl Drop for ClaimingGuard<'_> {
    fn drop(&mut self) {
        self.claiming.borrow_mut().remove(&self.receipt_id);
    }
}

impl<B: Backend> ClaimCoordinator<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            receipts: RefCell::new(HashMap::new()),
            claimed: RefCell::new(HashSet::new()),
            claiming: RefCell::new(HashSet::new()),
        }
    }

    /// Fetch a fresh copy of the receipt. A receipt this coordinator has
    /// already settled stays claimed even if the backend lags.
    pub async fn fetch_receipt(&self, receipt_id: &str) -> Tagged<Result<Receipt, ApiError>> {
        let value = match self.backend.receipt(receipt_id).await {
            Ok(mut receipt) => {
                receipt.claimed |= self.claimed.borrow().contains(receipt_id);
                self.receipts
                    .borrow_mut()
                    .insert(receipt_id.to_string(), receipt.clone());
                debug!(receipt_id, claimed = receipt.claimed, "receipt fetched");
                Ok(receipt)
            }
            Err(e) => {
                warn!(receipt_id, error = %e, "receipt fetch failed");
                Err(e)
            }
        };
        Tagged {
            id: receipt_id.to_string(),
            value,
        }
    }

    /// Local copy of a fetched receipt.
    pub fn receipt(&self, receipt_id: &str) -> Option<Receipt> {
        self.receipts.borrow().get(receipt_id).cloned()
    }

    pub fn is_claiming(&self, receipt_id: &str) -> bool {
        self.claiming.borrow().contains(receipt_id)
    }

    pub fn is_claimed(&self, receipt_id: &str) -> bool {
        self.claimed.borrow().contains(receipt_id)
    }

    pub async fn claim(&self, receipt_id: &str, token: Option<&str>) -> ClaimResult {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return ClaimResult::Unauthenticated;
        };

        if self
            .receipts
            .borrow()
            .get(receipt_id)
            .is_some_and(Receipt::is_expired)
        {
            debug!(receipt_id, "claim refused locally: receipt expired");
            return ClaimResult::Expired;
        }
        if self.is_claimed(receipt_id) {
            debug!(receipt_id, "claim refused locally: already claimed");
            return ClaimResult::AlreadyClaimed;
        }
        if !self.claiming.borrow_mut().insert(receipt_id.to_string()) {
            debug!(receipt_id, "claim refused locally: already in flight");
            return ClaimResult::InFlight;
        }
        let _guard = ClaimingGuard {
            claiming: &self.claiming,
            receipt_id: receipt_id.to_string(),
        };

        info!(receipt_id, "submitting claim");
        let result = match self.backend.claim_badge(receipt_id, token).await {
            Ok(grant) => self.granted(receipt_id, grant),
            Err(e) => classify_rejection(&e),
        };

        if result.is_final() {
            self.mark_claimed(receipt_id);
        }
        info!(receipt_id, outcome = ?result, "claim settled");
        result
    }

    fn granted(&self, receipt_id: &str, grant: ClaimGrant) -> ClaimResult {
        let mirror = self.receipts.borrow();
        let local = mirror.get(receipt_id);
        ClaimResult::Success {
            farm_name: grant
                .farm_name
                .or_else(|| local.map(|r| r.farm_name.clone()))
                .unwrap_or_else(|| FALLBACK_FARM_NAME.to_string()),
            batch_id: grant
                .batch_id
                .or_else(|| local.map(|r| r.batch_id.clone()))
                .unwrap_or_default(),
            transaction_hash: grant.transaction_hash,
        }
    }

    fn mark_claimed(&self, receipt_id: &str) {
        self.claimed.borrow_mut().insert(receipt_id.to_string());
        if let Some(r) = self.receipts.borrow_mut().get_mut(receipt_id) {
            r.claimed = true;
        }
    }
}

/// Map a failed claim call onto a [`ClaimResult`].
///
/// The backend reports business rules only as prose, so "already claimed"
/// and "expired" are recognised by substring until it sends a code.
fn classify_rejection(err: &ApiError) -> ClaimResult {
    let message = err.backend_message().unwrap_or_default().to_lowercase();

    if message.contains("already claimed") || message.contains("already been") {
        return ClaimResult::AlreadyClaimed;
    }
    match err {
        // A token can expire too; that is a login problem, not a receipt one.
        ApiError::Unauthenticated { .. } => ClaimResult::Unauthenticated,
        _ if message.contains("expired") => ClaimResult::Expired,
        ApiError::NotFound(_) => ClaimResult::NotFound,
        ApiError::Network(_) | ApiError::Decode(_) | ApiError::InvalidUrl(_) => {
            ClaimResult::NetworkError(err.to_string())
        }
        ApiError::Rejected { message, .. } => ClaimResult::Rejected {
            message: message.clone(),
        },
    }
}
