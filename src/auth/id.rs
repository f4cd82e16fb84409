//! Validated email identifiers for service accounts and delegated subjects.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const EMAIL_MAX_LEN: usize = 254;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} email cannot be empty.")]
	Empty {
		/// Which email was rejected (account, delegation).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} email contains whitespace.")]
	ContainsWhitespace {
		/// Which email was rejected (account, delegation).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} email exceeds {max} characters.")]
	TooLong {
		/// Which email was rejected (account, delegation).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Email address of a service account or of the user it acts on behalf of.
///
/// Used verbatim as the JWT `iss` (account) or `sub` (delegation) claim, so it is only checked
/// for emptiness, whitespace, and length; mailbox syntax is left to the token endpoint.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountEmail(String);
impl AccountEmail {
	/// Creates a new email identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		Self::with_kind("Account", value)
	}

	pub(crate) fn with_kind(
		kind: &'static str,
		value: impl AsRef<str>,
	) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		validate_view(kind, view)?;

		Ok(Self(view.to_owned()))
	}
}
impl Deref for AccountEmail {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for AccountEmail {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for AccountEmail {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<AccountEmail> for String {
	fn from(value: AccountEmail) -> Self {
		value.0
	}
}
impl TryFrom<String> for AccountEmail {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view("Account", &value)?;

		Ok(Self(value))
	}
}
impl Debug for AccountEmail {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "AccountEmail({})", self.0)
	}
}
impl Display for AccountEmail {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for AccountEmail {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > EMAIL_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: EMAIL_MAX_LEN });
	}

	Ok(())
}
