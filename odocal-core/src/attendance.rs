//! Attendance records linking a partner to the events they take part in.

use serde_json::json;
use tracing::debug;

use crate::error::OdooResult;
use crate::rpc::RpcClient;
use crate::session::Session;

/// Find the ids of all `calendar.attendee` records for a partner.
///
/// An empty result is valid: the partner simply attends nothing, and
/// the chain ends with "no events".
pub async fn resolve_attendance(
    client: &dyn RpcClient,
    session: &Session,
    partner_id: i64,
) -> OdooResult<Vec<i64>> {
    let (_, mut args) = session.execute_kw_prefix()?;
    args.extend([
        json!("calendar.attendee"),
        json!("search"),
        json!([[["partner_id", "=", partner_id]]]),
    ]);

    let result = client
        .call(&session.endpoint, "object", "execute_kw", args)
        .await?;

    let ids: Vec<i64> = result
        .as_array()
        .map(|rows| rows.iter().filter_map(|v| v.as_i64()).collect())
        .unwrap_or_default();

    debug!(partner_id, count = ids.len(), "resolved attendance records");
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::testing::ScriptedRpc;

    fn session() -> Session {
        let mut session = Session::new("https://erp.example.com", "prod", "alice", "secret");
        session.uid = Some(7);
        session
    }

    #[tokio::test]
    async fn returns_matching_ids() {
        let rpc = ScriptedRpc::new(vec![Ok(serde_json::json!([11, 12, 13]))]);
        let ids = resolve_attendance(&rpc, &session(), 42).await.unwrap();
        assert_eq!(ids, vec![11, 12, 13]);

        let call = &rpc.calls()[0];
        assert_eq!(call.args[3], "calendar.attendee");
        assert_eq!(call.args[4], "search");
        assert_eq!(call.args[5], serde_json::json!([[["partner_id", "=", 42]]]));
    }

    #[tokio::test]
    async fn empty_result_is_valid() {
        let rpc = ScriptedRpc::new(vec![Ok(serde_json::json!([]))]);
        let ids = resolve_attendance(&rpc, &session(), 42).await.unwrap();
        assert!(ids.is_empty());
    }
}
