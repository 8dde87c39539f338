pub mod rate_limit_validation;
pub mod request;

pub use rate_limit_validation::check_admission;
pub use request::handle_request;
