//! Coarse classification of lookup response statuses.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStatus {
    Found,
    NotFound,
    Unauthorized,
    RateLimited,
    OtherError,
}

/// Map an HTTP status code onto a lookup status.
pub fn classify(status: u16) -> LookupStatus {
    match status {
        200 => LookupStatus::Found,
        404 => LookupStatus::NotFound,
        401 => LookupStatus::Unauthorized,
        429 => LookupStatus::RateLimited,
        _ => LookupStatus::OtherError,
    }
}

impl LookupStatus {
    pub fn is_success(self) -> bool {
        self == LookupStatus::Found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify(200), LookupStatus::Found);
        assert_eq!(classify(404), LookupStatus::NotFound);
        assert_eq!(classify(401), LookupStatus::Unauthorized);
        assert_eq!(classify(429), LookupStatus::RateLimited);
        assert_eq!(classify(503), LookupStatus::OtherError);
        assert_eq!(classify(201), LookupStatus::OtherError);
        assert_eq!(classify(403), LookupStatus::OtherError);
    }
}
