/// Application name
pub const APP_NAME: &str = "FarmPass";

/// Default backend REST root (includes the `/api` segment)
pub const DEFAULT_API_URL: &str = "http://localhost:3002/api";

/// Prefix that marks a scanned string as a purchase receipt (matched case-insensitively)
pub const RECEIPT_PREFIX: &str = "RECEIPT-";

/// Receipts are redeemable for this many days after creation (enforced by the backend)
pub const RECEIPT_VALIDITY_DAYS: i64 = 7;

/// Storage keys, one per authenticated domain
pub const CUSTOMER_SESSION_KEY: &str = "customer-session";
pub const RESTAURANT_SESSION_KEY: &str = "restaurant-session";

/// Block explorer prefix for transaction links (display only)
pub const DEFAULT_EXPLORER_TX_URL: &str = "https://sepolia.etherscan.io/tx/";

/// Minimum restaurant account password length
pub const MIN_PASSWORD_LEN: usize = 6;

/// Product types a farmer may register a batch under
pub const PRODUCT_TYPES: [&str; 5] = ["Vegetable", "Fruit", "Meat", "Dairy", "Grain"];

/// Quantity units accepted for a batch
pub const BATCH_UNITS: [&str; 4] = ["kg", "units", "litres", "dozen"];

/// Fallback labels used when the backend omits a name
pub const FALLBACK_FARM_NAME: &str = "Farm";
pub const FALLBACK_RESTAURANT_NAME: &str = "Restaurant";
