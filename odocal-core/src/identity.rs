//! Partner and timezone resolution from the user's own record.

use chrono_tz::Tz;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::OdooResult;
use crate::rpc::RpcClient;
use crate::session::Session;

/// Map the authenticated principal to its durable partner id.
///
/// `res.users.partner_id` arrives as a relational tuple, normally
/// `[id, "Display Name"]`, but the wire shape is a heterogeneous
/// array; the first numeric element is the identifier. `Ok(None)`
/// means the user has no partner record, which ends the chain with
/// "no calendar possible" rather than an error.
pub async fn resolve_partner(
    client: &dyn RpcClient,
    session: &Session,
) -> OdooResult<Option<i64>> {
    let record = read_own_record(client, session, "partner_id").await?;

    let partner = record
        .as_ref()
        .and_then(|r| r.get("partner_id"))
        .and_then(first_numeric);

    if partner.is_none() {
        warn!("user record has no partner_id; no calendar possible");
    }
    Ok(partner)
}

/// Resolve the user's preferred timezone, falling back to UTC on any
/// failure. The fallback is deliberate: a missing or unknown `tz`
/// must never sink the chain.
pub async fn resolve_timezone(client: &dyn RpcClient, session: &Session) -> Tz {
    let record = match read_own_record(client, session, "tz").await {
        Ok(record) => record,
        Err(err) => {
            warn!(%err, "timezone lookup failed, defaulting to UTC");
            return Tz::UTC;
        }
    };

    let name = record
        .as_ref()
        .and_then(|r| r.get("tz"))
        .and_then(Value::as_str)
        .unwrap_or("UTC");

    match name.parse::<Tz>() {
        Ok(tz) => {
            debug!(%tz, "resolved user timezone");
            tz
        }
        Err(_) => {
            warn!(name, "unknown timezone name, defaulting to UTC");
            Tz::UTC
        }
    }
}

/// Read the principal's own `res.users` record, requesting one field.
async fn read_own_record(
    client: &dyn RpcClient,
    session: &Session,
    field: &str,
) -> OdooResult<Option<Value>> {
    let (uid, mut args) = session.execute_kw_prefix()?;
    args.extend([
        json!("res.users"),
        json!("read"),
        json!([uid]),
        json!({ "fields": [field] }),
    ]);

    let result = client
        .call(&session.endpoint, "object", "execute_kw", args)
        .await?;

    Ok(result.as_array().and_then(|rows| rows.first().cloned()))
}

/// First numeric element of a heterogeneous array, the shape Odoo
/// uses for many-to-one fields. Any other shape yields nothing.
fn first_numeric(value: &Value) -> Option<i64> {
    value
        .as_array()?
        .iter()
        .find_map(|element| element.as_i64())
}
