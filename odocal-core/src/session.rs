//! Login session for one sync pass.

use serde_json::{Value, json};

use crate::error::{OdooError, OdooResult};

/// Credentials plus the principal obtained by authenticating with them.
///
/// A `Session` is built per sync invocation and dropped afterwards.
/// It is never persisted by the core; the CLI keeps its own profile
/// file and rebuilds a fresh session from it each run.
#[derive(Debug, Clone)]
pub struct Session {
    /// Base URL of the Odoo instance, e.g. `https://erp.example.com`
    pub endpoint: String,
    /// Database (realm) name
    pub database: String,
    pub username: String,
    pub password: String,
    /// Numeric principal, set by a successful authenticate call
    pub uid: Option<i64>,
}

impl Session {
    pub fn new(endpoint: &str, database: &str, username: &str, password: &str) -> Self {
        Session {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            database: database.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            uid: None,
        }
    }

    /// The `[database, uid, password]` prefix every `execute_kw` call
    /// starts with. Fails if the session was never authenticated.
    pub fn execute_kw_prefix(&self) -> OdooResult<(i64, Vec<Value>)> {
        let uid = self
            .uid
            .ok_or_else(|| OdooError::Protocol("session is not authenticated".into()))?;
        let prefix = vec![json!(self.database), json!(uid), json!(self.password)];
        Ok((uid, prefix))
    }
}
