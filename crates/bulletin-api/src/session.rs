//! Request identity supplied by the upstream gateway.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use bulletin_core::tenant::TenantScope;
use uuid::Uuid;

use crate::error::ApiError;

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const EMPLOYEE_HEADER: &str = "x-employee-id";

/// The tenant a request acts for and, when the caller is an employee, their
/// id. Authentication happens upstream; these headers are trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
  pub scope:       TenantScope,
  pub employee_id: Option<Uuid>,
}

impl Session {
  /// Parse the identity headers.
  pub fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
    let tenant_id = header_uuid(headers, TENANT_HEADER)?
      .ok_or_else(|| ApiError::BadRequest(format!("missing {TENANT_HEADER} header")))?;
    Ok(Self {
      scope:       TenantScope::new(tenant_id),
      employee_id: header_uuid(headers, EMPLOYEE_HEADER)?,
    })
  }

  /// The employee id, or a 400 for callers without one.
  pub fn employee(&self) -> Result<Uuid, ApiError> {
    self.employee_id.ok_or_else(|| {
      ApiError::BadRequest(format!("{EMPLOYEE_HEADER} header is required"))
    })
  }
}

fn header_uuid(headers: &HeaderMap, name: &str) -> Result<Option<Uuid>, ApiError> {
  let Some(value) = headers.get(name) else {
    return Ok(None);
  };
  let value = value
    .to_str()
    .map_err(|_| ApiError::BadRequest(format!("{name} is not valid text")))?;
  Uuid::parse_str(value.trim())
    .map(Some)
    .map_err(|_| ApiError::BadRequest(format!("{name} is not a valid id")))
}

impl<St> FromRequestParts<St> for Session
where
  St: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &St,
  ) -> Result<Self, Self::Rejection> {
    Session::from_headers(&parts.headers)
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  #[test]
  fn parses_tenant_and_optional_employee() {
    let tenant = Uuid::new_v4();
    let mut headers = HeaderMap::new();
    headers.insert(TENANT_HEADER, HeaderValue::from_str(&tenant.to_string()).unwrap());

    let session = Session::from_headers(&headers).unwrap();
    assert_eq!(session.scope.tenant_id, tenant);
    assert!(session.employee_id.is_none());
    assert!(matches!(session.employee(), Err(ApiError::BadRequest(_))));

    let employee = Uuid::new_v4();
    headers.insert(EMPLOYEE_HEADER, HeaderValue::from_str(&employee.to_string()).unwrap());
    let session = Session::from_headers(&headers).unwrap();
    assert_eq!(session.employee().unwrap(), employee);
  }

  #[test]
  fn missing_or_malformed_tenant_is_rejected() {
    assert!(matches!(
      Session::from_headers(&HeaderMap::new()),
      Err(ApiError::BadRequest(_))
    ));

    let mut headers = HeaderMap::new();
    headers.insert(TENANT_HEADER, HeaderValue::from_static("acme"));
    assert!(matches!(
      Session::from_headers(&headers),
      Err(ApiError::BadRequest(_))
    ));
  }
}
