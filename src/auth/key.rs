//! Cache identity derived from a service account description.

// self
use crate::{
	_prelude::*,
	auth::{AccountEmail, ServiceAccount},
};

/// Identifies one cacheable token lineage: the account email, its ordered scopes, and the
/// optional delegation email.
///
/// Key material and expiration never participate: two descriptions that differ only
/// in those fields share a cache entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialKey {
	/// Service account email.
	pub email: AccountEmail,
	/// Fingerprint of the ordered scope list.
	pub scope_fingerprint: String,
	/// Delegation email, when the token is requested on behalf of a user.
	pub delegation: Option<AccountEmail>,
}
impl CredentialKey {
	/// Derives the key for the provided account.
	pub fn new(account: &ServiceAccount) -> Self {
		Self {
			email: account.email.clone(),
			scope_fingerprint: account.scopes.fingerprint(),
			delegation: account.delegation.clone(),
		}
	}
}
impl Display for CredentialKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match &self.delegation {
			Some(subject) => write!(f, "{}:{}>{subject}", self.email, self.scope_fingerprint),
			None => write!(f, "{}:{}", self.email, self.scope_fingerprint),
		}
	}
}
