pub mod path;
pub mod rate_limit;

pub use path::{is_hidden_segment, parse_content_path, ContentPath, PathError};
pub use rate_limit::{
    extract_client_key, AdmissionResult, ClientLimiterRegistry, Quota, QuotaFuture, QuotaProvider,
    RateGate, TokenBucket,
};
