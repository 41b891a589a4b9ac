use serde::{Deserialize, Serialize};

use crate::constants::RECEIPT_PREFIX;

/// What a scanned (or typed) QR value points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ScanPayload {
    #[serde(rename_all = "camelCase")]
    Receipt { receipt_id: String },
    #[serde(rename_all = "camelCase")]
    Batch { batch_id: String },
}

impl ScanPayload {
    /// The identifier carried by either variant.
    pub fn id(&self) -> &str {
        match self {
            Self::Receipt { receipt_id } => receipt_id,
            Self::Batch { batch_id } => batch_id,
        }
    }

    pub fn is_receipt(&self) -> bool {
        matches!(self, Self::Receipt { .. })
    }
}

/// Classify a raw scanned or typed string.
///
/// The input is trimmed; a case-insensitive `RECEIPT-` prefix selects the
/// receipt path and anything else is a batch id kept verbatim. Total: an
/// empty string becomes a batch with an empty id, so callers reject empty
/// input before getting here.
pub fn classify(raw: &str) -> ScanPayload {
    let trimmed = raw.trim();
    let is_receipt = trimmed
        .get(..RECEIPT_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(RECEIPT_PREFIX));

    if is_receipt {
        ScanPayload::Receipt {
            receipt_id: trimmed.to_string(),
        }
    } else {
        ScanPayload::Batch {
            batch_id: trimmed.to_string(),
        }
    }
}
