//! Authentication against the `common` service.

use serde_json::json;
use tracing::debug;

use crate::error::{OdooError, OdooResult};
use crate::rpc::RpcClient;
use crate::session::Session;

/// Exchange the session credentials for a numeric principal.
///
/// One `common.authenticate` call. A non-null numeric result is the
/// uid; a null (or `false`, which Odoo sends for bad credentials)
/// result means the credentials were rejected. Transport failures
/// propagate distinctly so callers can word their guidance.
pub async fn authenticate(client: &dyn RpcClient, session: &Session) -> OdooResult<i64> {
    let args = vec![
        json!(session.database),
        json!(session.username),
        json!(session.password),
        json!({}),
    ];

    let result = client
        .call(&session.endpoint, "common", "authenticate", args)
        .await?;

    match result.as_i64() {
        Some(uid) => {
            debug!(uid, "authenticated");
            Ok(uid)
        }
        None => Err(OdooError::InvalidCredentials),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::testing::ScriptedRpc;

    fn session() -> Session {
        Session::new("https://erp.example.com", "prod", "alice", "secret")
    }

    #[tokio::test]
    async fn integer_result_is_the_principal() {
        let rpc = ScriptedRpc::new(vec![Ok(serde_json::json!(7))]);
        let uid = authenticate(&rpc, &session()).await.unwrap();
        assert_eq!(uid, 7);
    }

    #[tokio::test]
    async fn null_result_is_invalid_credentials() {
        let rpc = ScriptedRpc::new(vec![Ok(serde_json::Value::Null)]);
        let err = authenticate(&rpc, &session()).await.unwrap_err();
        assert!(matches!(err, OdooError::InvalidCredentials));
    }

    #[tokio::test]
    async fn false_result_is_invalid_credentials() {
        let rpc = ScriptedRpc::new(vec![Ok(serde_json::json!(false))]);
        let err = authenticate(&rpc, &session()).await.unwrap_err();
        assert!(matches!(err, OdooError::InvalidCredentials));
    }

    #[tokio::test]
    async fn transport_failure_stays_distinct() {
        let rpc = ScriptedRpc::new(vec![Err(OdooError::Unreachable("dns".into()))]);
        let err = authenticate(&rpc, &session()).await.unwrap_err();
        assert!(err.is_transport());
    }
}
