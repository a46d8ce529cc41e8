use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::auth::accounts::{Account, AccountStore};
use crate::content::validation::is_valid_email;
use crate::guard::policy::{format_countdown, GuardDecision};
use crate::guard::LoginGuard;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// Rejected before reaching the guard; costs no attempt.
    InvalidInput(String),
    InvalidCredentials { attempts_remaining: u32 },
    /// Valid credentials without the admin role.
    NotAuthorized,
    LockedOut { remaining_seconds: i64 },
}

impl LoginError {
    pub fn status(&self) -> StatusCode {
        match self {
            LoginError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            LoginError::InvalidCredentials { .. } => StatusCode::UNAUTHORIZED,
            LoginError::NotAuthorized => StatusCode::FORBIDDEN,
            LoginError::LockedOut { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    pub fn message(&self) -> String {
        match self {
            LoginError::InvalidInput(msg) => msg.clone(),
            LoginError::InvalidCredentials { attempts_remaining } => format!(
                "Neplatné přihlašovací údaje. Zbývající pokusy: {}.",
                attempts_remaining
            ),
            LoginError::NotAuthorized => "Tento účet nemá administrátorská oprávnění.".to_string(),
            LoginError::LockedOut { remaining_seconds } => format!(
                "Příliš mnoho neúspěšných pokusů. Zkuste to znovu za {}.",
                format_countdown(*remaining_seconds)
            ),
        }
    }

    pub fn remaining_seconds(&self) -> Option<i64> {
        match self {
            LoginError::LockedOut { remaining_seconds } => Some(*remaining_seconds),
            _ => None,
        }
    }
}

fn validate_input(form: &LoginForm) -> Result<(), LoginError> {
    let email = form.email.trim();
    if email.is_empty() || form.password.is_empty() {
        return Err(LoginError::InvalidInput(
            "E-mail a heslo jsou povinné.".to_string(),
        ));
    }
    if !is_valid_email(email) {
        return Err(LoginError::InvalidInput("Neplatná e-mailová adresa.".to_string()));
    }
    Ok(())
}

/// Runs one sign-in attempt for `client` through the guard.
pub fn attempt_login(
    guard: &mut LoginGuard,
    accounts: &AccountStore,
    client: &str,
    form: &LoginForm,
    now: DateTime<Utc>,
) -> Result<Account, LoginError> {
    validate_input(form)?;

    let check = guard.check_allowed(client, now);
    if !check.allowed {
        return Err(LoginError::LockedOut {
            remaining_seconds: check.remaining_block_seconds,
        });
    }

    let Some(account) = accounts.sign_in(&form.email, &form.password) else {
        return Err(match guard.record_failure(client, now) {
            GuardDecision::StillOpen { attempts_remaining } => {
                LoginError::InvalidCredentials { attempts_remaining }
            }
            GuardDecision::Blocked {
                remaining_seconds, ..
            } => LoginError::LockedOut { remaining_seconds },
        });
    };

    // A non-admin sign-in neither counts as a failure nor ends the streak.
    if !account.is_admin() {
        tracing::warn!("Sign-in without admin role: {}", account.email);
        return Err(LoginError::NotAuthorized);
    }

    guard.record_success(client);
    tracing::info!("Admin signed in: {}", account.email);
    Ok(account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::accounts::Role;
    use crate::config::AdminConfig;
    use crate::guard::store::MemoryStore;
    use argon2::password_hash::rand_core::OsRng;
    use argon2::password_hash::{PasswordHasher, SaltString};
    use argon2::Argon2;
    use chrono::TimeDelta;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CLIENT: &str = "192.0.2.10";

    fn accounts() -> AccountStore {
        let admin = AdminConfig {
            email: "admin@example.org".to_string(),
            password: "correct".to_string(),
        };
        AccountStore::load(&admin, None).unwrap()
    }

    fn accounts_with_editor() -> (AccountStore, NamedTempFile) {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(b"editor-pw", &salt)
            .unwrap()
            .to_string();
        let mut file = NamedTempFile::new().unwrap();
        let content = serde_json::json!({
            "accounts": [{ "email": "editor@example.org", "password_hash": hash, "role": Role::Editor }]
        });
        write!(file, "{}", content).unwrap();
        let admin = AdminConfig {
            email: "admin@example.org".to_string(),
            password: "correct".to_string(),
        };
        (AccountStore::load(&admin, Some(file.path())).unwrap(), file)
    }

    fn guard() -> LoginGuard {
        LoginGuard::new(Box::new(MemoryStore::new()))
    }

    fn form(email: &str, password: &str) -> LoginForm {
        LoginForm {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_successful_login() {
        let mut guard = guard();
        let account = attempt_login(
            &mut guard,
            &accounts(),
            CLIENT,
            &form("admin@example.org", "correct"),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(account.email, "admin@example.org");
    }

    #[test]
    fn test_invalid_input_costs_no_attempt() {
        let mut guard = guard();
        let accounts = accounts();
        let now = Utc::now();
        for bad in [form("", "x"), form("admin@example.org", ""), form("not-an-email", "x")] {
            let err = attempt_login(&mut guard, &accounts, CLIENT, &bad, now).unwrap_err();
            assert!(matches!(err, LoginError::InvalidInput(_)));
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
        assert!(guard.state(CLIENT).is_empty());
    }

    #[test]
    fn test_failures_then_lockout() {
        let mut guard = guard();
        let accounts = accounts();
        let now = Utc::now();
        let wrong = form("admin@example.org", "wrong");

        for expected in [4, 3, 2, 1] {
            assert_eq!(
                attempt_login(&mut guard, &accounts, CLIENT, &wrong, now).unwrap_err(),
                LoginError::InvalidCredentials {
                    attempts_remaining: expected
                }
            );
        }
        assert_eq!(
            attempt_login(&mut guard, &accounts, CLIENT, &wrong, now).unwrap_err(),
            LoginError::LockedOut {
                remaining_seconds: 900
            }
        );

        // Correct password is refused while locked out
        let right = form("admin@example.org", "correct");
        let err = attempt_login(&mut guard, &accounts, CLIENT, &right, now).unwrap_err();
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(guard.state(CLIENT).attempt_count, 5);

        let later = now + TimeDelta::seconds(901);
        assert!(attempt_login(&mut guard, &accounts, CLIENT, &right, later).is_ok());
        assert!(guard.state(CLIENT).is_empty());
    }

    #[test]
    fn test_success_resets_count() {
        let mut guard = guard();
        let accounts = accounts();
        let now = Utc::now();
        for _ in 0..3 {
            let _ = attempt_login(&mut guard, &accounts, CLIENT, &form("admin@example.org", "x"), now);
        }
        attempt_login(&mut guard, &accounts, CLIENT, &form("admin@example.org", "correct"), now)
            .unwrap();
        assert!(guard.state(CLIENT).is_empty());
    }

    #[test]
    fn test_non_admin_is_not_counted() {
        let (accounts, _file) = accounts_with_editor();
        let mut guard = guard();
        let now = Utc::now();
        for _ in 0..6 {
            let err = attempt_login(
                &mut guard,
                &accounts,
                CLIENT,
                &form("editor@example.org", "editor-pw"),
                now,
            )
            .unwrap_err();
            assert_eq!(err, LoginError::NotAuthorized);
        }
        assert!(guard.state(CLIENT).is_empty());
    }

    #[test]
    fn test_non_admin_login_keeps_failure_streak() {
        let (accounts, _file) = accounts_with_editor();
        let mut guard = guard();
        let now = Utc::now();
        let wrong = form("admin@example.org", "wrong");
        let editor = form("editor@example.org", "editor-pw");

        for _ in 0..4 {
            attempt_login(&mut guard, &accounts, CLIENT, &wrong, now).unwrap_err();
        }
        assert_eq!(
            attempt_login(&mut guard, &accounts, CLIENT, &editor, now).unwrap_err(),
            LoginError::NotAuthorized
        );
        assert_eq!(guard.state(CLIENT).attempt_count, 4);

        assert_eq!(
            attempt_login(&mut guard, &accounts, CLIENT, &wrong, now).unwrap_err(),
            LoginError::LockedOut {
                remaining_seconds: 900
            }
        );
    }

    #[test]
    fn test_messages() {
        assert!(LoginError::LockedOut {
            remaining_seconds: 900
        }
        .message()
        .contains("15:00"));
        assert!(LoginError::InvalidCredentials {
            attempts_remaining: 2
        }
        .message()
        .contains("Zbývající pokusy: 2"));
        assert_eq!(
            LoginError::InvalidCredentials {
                attempts_remaining: 4
            }
            .message(),
            "Neplatné přihlašovací údaje. Zbývající pokusy: 4."
        );
    }
}
