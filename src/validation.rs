//! Status code validation policies.

use crate::{MoyaError, Response, Result};
use http::StatusCode;

/// Which response status codes a target accepts.
///
/// # Examples
///
/// ```
/// use moya::{Response, ValidationType};
/// use http::StatusCode;
///
/// let policy = ValidationType::SuccessCodes;
///
/// assert!(policy.validate(Response::new(StatusCode::OK, "")).is_ok());
///
/// let err = policy.validate(Response::new(StatusCode::NOT_FOUND, "")).unwrap_err();
/// assert_eq!(err.response().unwrap().status_code, StatusCode::NOT_FOUND);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum ValidationType {
    /// Accept every status code.
    #[default]
    None,

    /// Accept 2xx.
    SuccessCodes,

    /// Accept 2xx and 3xx.
    SuccessAndRedirectCodes,

    /// Accept exactly the listed codes.
    CustomCodes(Vec<u16>),
}

impl ValidationType {
    /// The accepted status codes. Empty for [`ValidationType::None`].
    pub fn status_codes(&self) -> Vec<u16> {
        match self {
            ValidationType::None => Vec::new(),
            ValidationType::SuccessCodes => (200..300).collect(),
            ValidationType::SuccessAndRedirectCodes => (200..400).collect(),
            ValidationType::CustomCodes(codes) => codes.clone(),
        }
    }

    /// Returns `true` if `status` passes this policy.
    pub fn accepts(&self, status: StatusCode) -> bool {
        let code = status.as_u16();
        match self {
            ValidationType::None => true,
            ValidationType::SuccessCodes => (200..300).contains(&code),
            ValidationType::SuccessAndRedirectCodes => (200..400).contains(&code),
            ValidationType::CustomCodes(codes) => codes.contains(&code),
        }
    }

    /// Passes the response through, or fails with [`MoyaError::StatusCode`].
    ///
    /// Only the status code is inspected; the body is never read.
    pub fn validate(&self, response: Response) -> Result<Response> {
        if self.accepts(response.status_code) {
            Ok(response)
        } else {
            tracing::warn!(
                status = response.status_code.as_u16(),
                validation = ?self,
                "Response status code rejected by validation policy"
            );
            Err(MoyaError::StatusCode(response))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(code: u16) -> Response {
        Response::new(StatusCode::from_u16(code).unwrap(), "")
    }

    #[test]
    fn test_none_accepts_everything() {
        for code in [100, 200, 204, 301, 404, 418, 500, 503, 599] {
            assert!(ValidationType::None.validate(response(code)).is_ok());
        }
        assert!(ValidationType::None.status_codes().is_empty());
    }

    #[test]
    fn test_default_is_none() {
        assert_eq!(ValidationType::default(), ValidationType::None);
    }

    #[test]
    fn test_success_codes() {
        let policy = ValidationType::SuccessCodes;
        assert!(policy.validate(response(200)).is_ok());
        assert!(policy.validate(response(299)).is_ok());
        assert!(policy.validate(response(302)).is_err());

        match policy.validate(response(404)) {
            Err(MoyaError::StatusCode(resp)) => assert_eq!(resp.status_code.as_u16(), 404),
            other => panic!("Expected StatusCode error, got {:?}", other),
        }
    }

    #[test]
    fn test_success_and_redirect_codes() {
        let policy = ValidationType::SuccessAndRedirectCodes;
        assert!(policy.validate(response(200)).is_ok());
        assert!(policy.validate(response(304)).is_ok());
        assert!(policy.validate(response(400)).is_err());
        assert_eq!(policy.status_codes().len(), 200);
    }

    #[test]
    fn test_custom_codes() {
        let policy = ValidationType::CustomCodes(vec![200, 404]);
        assert!(policy.validate(response(404)).is_ok());
        assert!(policy.validate(response(201)).is_err());
        assert_eq!(policy.status_codes(), vec![200, 404]);
    }
}
