// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Password policy validation.
//!
//! This module enforces password requirements for portal accounts. The
//! requirements come from the `password.*` configuration parameters.

use thiserror::Error;

/// Password policy errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    /// Password is too short.
    #[error("Password must be at least {min_length} characters long")]
    TooShort { min_length: usize },

    /// Password lacks a required character class.
    #[error("Password must contain at least one {class}")]
    MissingCharacterClass { class: &'static str },

    /// Password matches a forbidden value.
    #[error("Password must not match {field}")]
    MatchesForbiddenField { field: String },

    /// Password and confirmation do not match.
    #[error("Password and confirmation do not match")]
    ConfirmationMismatch,

    /// Password was used recently.
    #[error("Password must differ from the last {count} passwords")]
    RecentlyUsed { count: usize },
}

/// Password policy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    /// Minimum password length.
    pub min_length: usize,
    /// Require an uppercase letter.
    pub require_upper: bool,
    /// Require a digit.
    pub require_number: bool,
    /// Require a symbol.
    pub require_special: bool,
    /// Number of previous passwords that may not be reused (0 disables).
    pub disallow_reuse: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_upper: true,
            require_number: true,
            require_special: false,
            disallow_reuse: 3,
        }
    }
}

impl PasswordPolicy {
    /// Validates a password against the policy.
    ///
    /// # Arguments
    ///
    /// * `password` - The password to validate
    /// * `confirmation` - The password confirmation
    /// * `login` - The account login (password must not match)
    /// * `display_name` - The account display name (password must not match)
    ///
    /// # Errors
    ///
    /// Returns a `PasswordPolicyError` if the password does not meet policy requirements.
    pub fn validate(
        &self,
        password: &str,
        confirmation: &str,
        login: &str,
        display_name: &str,
    ) -> Result<(), PasswordPolicyError> {
        if password != confirmation {
            return Err(PasswordPolicyError::ConfirmationMismatch);
        }

        if password.chars().count() < self.min_length {
            return Err(PasswordPolicyError::TooShort {
                min_length: self.min_length,
            });
        }

        if self.require_upper && !password.chars().any(char::is_uppercase) {
            return Err(PasswordPolicyError::MissingCharacterClass {
                class: "uppercase letter",
            });
        }
        if self.require_number && !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(PasswordPolicyError::MissingCharacterClass { class: "digit" });
        }
        if self.require_special && !password.chars().any(|c| !c.is_alphanumeric()) {
            return Err(PasswordPolicyError::MissingCharacterClass { class: "symbol" });
        }

        // Case-insensitive
        let password_lower: String = password.to_lowercase();
        if password_lower == login.to_lowercase() {
            return Err(PasswordPolicyError::MatchesForbiddenField {
                field: String::from("login"),
            });
        }
        if password_lower == display_name.to_lowercase() {
            return Err(PasswordPolicyError::MatchesForbiddenField {
                field: String::from("display_name"),
            });
        }

        Ok(())
    }

    /// Rejects a password matching any of the given recent bcrypt hashes.
    ///
    /// Hashes that fail to verify are treated as non-matching.
    ///
    /// # Errors
    ///
    /// Returns `RecentlyUsed` if the password matches one of the hashes.
    pub fn check_reuse(
        &self,
        password: &str,
        recent_hashes: &[String],
    ) -> Result<(), PasswordPolicyError> {
        if self.disallow_reuse == 0 {
            return Ok(());
        }
        let reused = recent_hashes
            .iter()
            .take(self.disallow_reuse)
            .any(|hash| bcrypt::verify(password, hash).unwrap_or(false));
        if reused {
            return Err(PasswordPolicyError::RecentlyUsed {
                count: self.disallow_reuse,
            });
        }
        Ok(())
    }
}
