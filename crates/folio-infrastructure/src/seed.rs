//! JSON seed data for the in-memory backend.
//!
//! ```json
//! {
//!   "accounts": [
//!     { "id": "u1", "email": "ada@example.com", "password": "secret",
//!       "full_name": "Ada", "role": "admin" }
//!   ],
//!   "tables": {
//!     "categories": [ { "id": "c1", "name": "Guides", "slug": "guides" } ]
//!   }
//! }
//! ```

use crate::memory::{InMemoryAuthService, InMemoryRowStore};
use folio_core::Result;
use folio_core::profile::{PROFILES_TABLE, Profile, Role};
use folio_core::store::{Row, encode_row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// An account with its profile row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedAccount {
    pub id: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub role: Role,
    /// When false no profile row is written, as for a freshly registered user
    #[serde(default = "default_true")]
    pub with_profile: bool,
}

fn default_true() -> bool {
    true
}

/// Seed file contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Seed {
    pub accounts: Vec<SeedAccount>,
    /// Raw rows per table
    pub tables: BTreeMap<String, Vec<Row>>,
}

impl Seed {
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_json_str(&content)
    }

    /// Registers the accounts and writes profile and table rows.
    pub fn apply(&self, auth: &InMemoryAuthService, rows: &InMemoryRowStore) -> Result<()> {
        let now = chrono::Utc::now();
        for account in &self.accounts {
            auth.add_account(account.id.as_str(), &account.email, &account.password);
            if account.with_profile {
                let profile = Profile {
                    id: account.id.clone(),
                    full_name: account.full_name.clone(),
                    avatar_url: account.avatar_url.clone(),
                    role: account.role,
                    created_at: Some(now),
                    updated_at: Some(now),
                };
                rows.seed(PROFILES_TABLE, [encode_row(&profile)?]);
            }
        }
        for (table, table_rows) in &self.tables {
            rows.seed(table, table_rows.iter().cloned());
        }
        tracing::info!(
            accounts = self.accounts.len(),
            tables = self.tables.len(),
            "Applied seed"
        );
        Ok(())
    }
}
