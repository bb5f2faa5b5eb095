//! The opening handshake performed once per connection, before any
//! application request is sent — a fixed five-frame exchange with no
//! acknowledgements — followed immediately by the first `authorizeConnection`
//! request, which is an ordinary signed request, not part of the handshake
//! proper.
//!
//! Unlike a version-table handshake that negotiates a shared protocol
//! version out of a proposed range, DAX's handshake has no negotiation: the
//! frame sequence is fixed and never branches, and the peer sends nothing
//! back until the `authorizeConnection` reply.

use rand::Rng;

use dax_codec::Value;
use dax_protocol::wire::{method, HANDSHAKE_MAGIC, SERVICE_ID};
use dax_protocol::Reply;
use tracing::debug;

use crate::bearer::FrameBuffer;
use crate::endpoint::Endpoint;
use crate::error::Error;
use crate::signer::Signer;

pub async fn perform(
    frame: &mut FrameBuffer,
    endpoint: &Endpoint,
    user_agent: &str,
    signer: &impl Signer,
) -> Result<(), Error> {
    frame.write_value(&Value::text(HANDSHAKE_MAGIC)).await?;
    frame.write_value(&Value::UInt(0)).await?; // layering marker
    frame.write_value(&Value::text(session_id())).await?;
    frame
        .write_value(&Value::map([(
            Value::text("UserAgent"),
            Value::text(user_agent.to_string()),
        )]))
        .await?;
    frame.write_value(&Value::UInt(0)).await?; // client mode
    debug!(%endpoint, "sent handshake frames");

    authorize(frame, user_agent, signer).await?;

    debug!(%endpoint, "handshake complete");
    Ok(())
}

/// Sends a freshly signed `authorizeConnection` request and confirms the
/// server accepted it. Also used for periodic re-authentication on an
/// already-open connection.
///
/// The frame is six concatenated top-level CBE values in a fixed order —
/// `U(service_id) U(method_id) T(access_key) T(signature) B(string_to_sign)
/// (T(token)|Null) (T(user_agent)|Null)` — not a CBE map; the signer is
/// always invoked against an empty payload and the canonical host
/// `dax.amazonaws.com`, entirely inside the `Signer` implementation.
pub async fn authorize(
    frame: &mut FrameBuffer,
    user_agent: &str,
    signer: &impl Signer,
) -> Result<(), Error> {
    let signed = signer.sign().await?;

    frame.write_value(&Value::UInt(SERVICE_ID)).await?;
    frame
        .write_value(&Value::UInt(method::AUTHORIZE_CONNECTION))
        .await?;
    frame.write_value(&Value::text(signed.access_key)).await?;
    frame.write_value(&Value::text(signed.signature)).await?;
    frame
        .write_value(&Value::Bytes(signed.string_to_sign))
        .await?;
    frame.write_value(&opt_text(signed.token)).await?;
    frame
        .write_value(&opt_text(Some(user_agent.to_string())))
        .await?;

    let descriptor = frame.read_value().await?;
    let reply = if Reply::descriptor_is_error(&descriptor) {
        Reply::from_parts(descriptor, Value::Null)?
    } else {
        let body = frame.read_value().await?;
        Reply::from_parts(descriptor, body)?
    };

    reply
        .into_result()
        .map_err(|e| Error::AuthFailed(e.to_string()))?;

    Ok(())
}

fn opt_text(value: Option<String>) -> Value {
    match value {
        Some(s) => Value::text(s),
        None => Value::Null,
    }
}

/// `now_ms * 1000 + random(0..999)`, stable for the life of a connection.
fn session_id() -> String {
    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock is after the Unix epoch")
        .as_millis() as u64;
    let jitter = rand::thread_rng().gen_range(0..1000u64);
    (now_ms * 1000 + jitter).to_string()
}
