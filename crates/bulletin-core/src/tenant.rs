//! Tenant scoping.
//!
//! Every query in Bulletin is isolated to one organisation. The scope is
//! always passed explicitly; nothing reads an ambient "current tenant".

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The organisation on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantScope {
  pub tenant_id: Uuid,
}

impl TenantScope {
  pub fn new(tenant_id: Uuid) -> Self { Self { tenant_id } }

  /// Whether a record owned by `owner` is visible in this scope.
  pub fn contains(&self, owner: Uuid) -> bool { self.tenant_id == owner }
}

impl From<Uuid> for TenantScope {
  fn from(tenant_id: Uuid) -> Self { Self::new(tenant_id) }
}
