use std::path::Path;

use argon2::password_hash::{PasswordHash, PasswordVerifier};
use argon2::Argon2;
use serde::{Deserialize, Serialize};

use crate::config::AdminConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub email: String,
    pub role: Role,
}

impl Account {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone)]
enum Credential {
    Plain(String),
    Argon2(String),
}

#[derive(Debug, Clone)]
struct AccountEntry {
    account: Account,
    credential: Credential,
}

#[derive(Debug, Deserialize)]
struct AccountFileEntry {
    email: String,
    password_hash: String,
    role: Role,
}

#[derive(Debug, Deserialize)]
struct AccountsFile {
    accounts: Vec<AccountFileEntry>,
}

pub struct AccountStore {
    entries: Vec<AccountEntry>,
}

impl AccountStore {
    /// The configured admin plus any accounts listed in `accounts_path`.
    pub fn load(admin: &AdminConfig, accounts_path: Option<&Path>) -> anyhow::Result<Self> {
        let mut store = AccountStore {
            entries: vec![AccountEntry {
                account: Account {
                    email: admin.email.clone(),
                    role: Role::Admin,
                },
                credential: Credential::Plain(admin.password.clone()),
            }],
        };

        if let Some(path) = accounts_path {
            let content = std::fs::read_to_string(path)?;
            let file: AccountsFile = serde_json::from_str(&content)?;
            for entry in file.accounts {
                PasswordHash::new(&entry.password_hash).map_err(|e| {
                    anyhow::anyhow!("Invalid password hash for {}: {}", entry.email, e)
                })?;
                store.entries.push(AccountEntry {
                    account: Account {
                        email: entry.email,
                        role: entry.role,
                    },
                    credential: Credential::Argon2(entry.password_hash),
                });
            }
        }

        Ok(store)
    }

    /// Returns the account when the email and password match.
    pub fn sign_in(&self, email: &str, password: &str) -> Option<Account> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.account.email.eq_ignore_ascii_case(email.trim()))?;

        let valid = match &entry.credential {
            Credential::Plain(expected) => expected == password,
            Credential::Argon2(hash) => PasswordHash::new(hash)
                .map(|parsed| {
                    Argon2::default()
                        .verify_password(password.as_bytes(), &parsed)
                        .is_ok()
                })
                .unwrap_or(false),
        };

        valid.then(|| entry.account.clone())
    }
}
