use std::collections::HashSet;

use serde_json::Value;
use tracing::warn;

use farmpass_shared::models::Badge;

/// The badge collection as displayed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BadgeSummary {
    /// Backend order, one entry per badge held.
    pub badges: Vec<Badge>,
    pub total: usize,
    pub distinct_farms: usize,
}

/// Normalize raw badge entries. Only the farm statistic is deduplicated;
/// several badges from one farm are all kept.
pub fn aggregate(raw: &[Value]) -> BadgeSummary {
    let badges: Vec<Badge> = raw
        .iter()
        .filter_map(|item| match Badge::from_backend(item) {
            Ok(badge) => Some(badge),
            Err(e) => {
                warn!(error = %e, "skipping malformed badge entry");
                None
            }
        })
        .collect();

    let distinct_farms = badges
        .iter()
        .map(|b| b.farm_name.as_str())
        .collect::<HashSet<_>>()
        .len();

    BadgeSummary {
        total: badges.len(),
        distinct_farms,
        badges,
    }
}
