//! Constants used throughout the EHR core crate.

/// Page size requested from FHIR searches. Lists are not paginated.
pub const SEARCH_COUNT: u32 = 1000;

/// Media type sent in `Accept` (and `Content-Type` for creates) on FHIR requests.
pub const FHIR_JSON_CONTENT_TYPE: &str = "application/fhir+json";

/// Default REST server address.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Default local function host address.
pub const DEFAULT_FUNCTIONS_ADDR: &str = "0.0.0.0:3001";

/// Default return URL after logout.
pub const DEFAULT_LOGOUT_REDIRECT_URL: &str = "/";

/// Seconds before expiry at which a cached access token is treated as stale.
pub const TOKEN_EXPIRY_SKEW_SECS: i64 = 60;

/// Lifetime assumed for an access token whose grant response carries no `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Identifier assigner whose value is shown as the card-on-file identifier for self-pay patients.
pub const CARD_ON_FILE_ASSIGNER: &str = "CardPointe";

/// Timeout applied to every outbound HTTP request (FHIR, platform, token grant).
pub const HTTP_TIMEOUT_SECS: u64 = 30;
