//! Flow ids and device tokens.
//!
//! A flow id is 64 hex chars: a random 32 hex salt followed by the first
//! 32 hex chars of `HMAC-SHA256(key, salt "\n" hex(begin_time) "\n" user_agent)`.
//! The device token a client echoes back is `device_id.flow_id.begin_time`.

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{FlowMetricsError, Result};

type HmacSha256 = Hmac<Sha256>;

const SALT_BYTES: usize = 16;
const SIG_HEX_LEN: usize = 32;
const FLOW_ID_LEN: usize = SALT_BYTES * 2 + SIG_HEX_LEN;
const DEVICE_ID_LEN: usize = 32;

/// Wall clock in epoch millis (0 if the clock is before the epoch).
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Per-request flow identity. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowContext {
    pub flow_id: String,
    pub flow_begin_time: u64,
    pub device_id: String,
}

impl FlowContext {
    /// Token string a client sends back to resume this flow.
    pub fn token(&self) -> String {
        format!("{}.{}.{}", self.device_id, self.flow_id, self.flow_begin_time)
    }
}

/// How the flow for a request was obtained. Resolved once at handler entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowResolution {
    /// A valid, unexpired device token was presented.
    Resumed(FlowContext),
    /// No usable token; a new flow was minted.
    Fresh(FlowContext),
}

impl FlowResolution {
    pub fn context(&self) -> &FlowContext {
        match self {
            FlowResolution::Resumed(ctx) | FlowResolution::Fresh(ctx) => ctx,
        }
    }

    pub fn into_context(self) -> FlowContext {
        match self {
            FlowResolution::Resumed(ctx) | FlowResolution::Fresh(ctx) => ctx,
        }
    }

    /// Label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FlowResolution::Resumed(_) => "resumed",
            FlowResolution::Fresh(_) => "fresh",
        }
    }
}

/// Mints and verifies flow ids with the configured key and expiry.
/// Construct once at startup, then share.
#[derive(Clone)]
pub struct FlowSigner {
    mac: HmacSha256,
    expiry_ms: u64,
}

impl FlowSigner {
    pub fn new(key: &str, expiry_ms: u64) -> Result<Self> {
        if key.is_empty() {
            return Err(FlowMetricsError::BadRequest("flow_id_key must not be empty".into()));
        }
        let mac = HmacSha256::new_from_slice(key.as_bytes())
            .map_err(|e| FlowMetricsError::Internal(format!("hmac init failed: {e}")))?;
        Ok(Self { mac, expiry_ms })
    }

    fn keyed(&self, salt: &str, begin: u64, user_agent: &str) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(format!("{salt}\n{begin:x}\n{user_agent}").as_bytes());
        mac
    }

    /// Mint a fresh flow at `now` for the given user agent.
    pub fn mint(&self, user_agent: &str, now: u64) -> FlowContext {
        let salt = hex::encode(rand::random::<[u8; SALT_BYTES]>());
        let digest = self.keyed(&salt, now, user_agent).finalize().into_bytes();
        let sig = hex::encode(digest);
        FlowContext {
            flow_id: format!("{salt}{}", &sig[..SIG_HEX_LEN]),
            flow_begin_time: now,
            device_id: uuid::Uuid::new_v4().simple().to_string(),
        }
    }

    /// Check that `flow_id` was signed by this key for `begin`/`user_agent`
    /// and has not expired at `now`.
    pub fn verify_flow_id(&self, flow_id: &str, begin: u64, user_agent: &str, now: u64) -> Result<()> {
        if flow_id.len() != FLOW_ID_LEN || !is_lower_hex(flow_id) {
            return Err(FlowMetricsError::InvalidToken("malformed flow id"));
        }
        if begin > now {
            return Err(FlowMetricsError::InvalidToken("begin time in the future"));
        }
        if now - begin > self.expiry_ms {
            return Err(FlowMetricsError::InvalidToken("expired"));
        }

        let (salt, sig) = flow_id.split_at(SALT_BYTES * 2);
        let sig = hex::decode(sig).map_err(|_| FlowMetricsError::InvalidToken("malformed signature"))?;
        self.keyed(salt, begin, user_agent)
            .verify_truncated_left(&sig)
            .map_err(|_| FlowMetricsError::InvalidToken("bad signature"))
    }

    /// Parse and verify a `device_id.flow_id.begin_time` token.
    pub fn parse_token(&self, token: &str, user_agent: &str, now: u64) -> Result<FlowContext> {
        let mut parts = token.trim().splitn(3, '.');
        let (Some(device_id), Some(flow_id), Some(begin)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(FlowMetricsError::InvalidToken("expected device_id.flow_id.begin_time"));
        };

        if device_id.len() != DEVICE_ID_LEN || !is_lower_hex(device_id) {
            return Err(FlowMetricsError::InvalidToken("malformed device id"));
        }
        let begin: u64 = begin
            .parse()
            .map_err(|_| FlowMetricsError::InvalidToken("malformed begin time"))?;

        self.verify_flow_id(flow_id, begin, user_agent, now)?;

        Ok(FlowContext {
            flow_id: flow_id.to_string(),
            flow_begin_time: begin,
            device_id: device_id.to_string(),
        })
    }

    /// Resume the flow named by `token` if it verifies, otherwise mint one.
    pub fn resolve(&self, token: Option<&str>, user_agent: &str, now: u64) -> FlowResolution {
        if let Some(token) = token {
            match self.parse_token(token, user_agent, now) {
                Ok(ctx) => return FlowResolution::Resumed(ctx),
                Err(e) => tracing::debug!(error = %e, "flow token rejected, minting fresh flow"),
            }
        }
        FlowResolution::Fresh(self.mint(user_agent, now))
    }
}

fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;

    const UA: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:60.0) Firefox/60.0";
    const T0: u64 = 1_500_000_000_000;

    fn signer() -> FlowSigner {
        FlowSigner::new("foo", 7_200_000).unwrap()
    }

    #[test]
    fn mint_shapes() {
        let ctx = signer().mint(UA, T0);
        assert_eq!(ctx.flow_id.len(), 64);
        assert_eq!(ctx.device_id.len(), 32);
        assert_eq!(ctx.flow_begin_time, T0);
        assert_ne!(ctx.flow_id, ctx.device_id);
    }

    #[test]
    fn mint_is_unique() {
        let s = signer();
        assert_ne!(s.mint(UA, T0).flow_id, s.mint(UA, T0).flow_id);
    }

    #[test]
    fn token_round_trip_resumes() {
        let s = signer();
        let ctx = s.mint(UA, T0);
        let res = s.resolve(Some(&ctx.token()), UA, T0 + 1000);
        assert_eq!(res, FlowResolution::Resumed(ctx));
        assert_eq!(res.kind(), "resumed");
    }

    #[test]
    fn expired_token_is_fresh() {
        let s = signer();
        let ctx = s.mint(UA, T0);
        let err = s.parse_token(&ctx.token(), UA, T0 + 7_200_001).unwrap_err();
        assert_eq!(err.to_string(), "invalid flow token: expired");

        let res = s.resolve(Some(&ctx.token()), UA, T0 + 7_200_001);
        assert!(matches!(res, FlowResolution::Fresh(_)));
        assert_ne!(res.context().flow_id, ctx.flow_id);
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let s = signer();
        let ctx = s.mint(UA, T0);
        assert!(s.parse_token(&ctx.token(), UA, T0 + 7_200_000).is_ok());
    }

    #[test]
    fn other_user_agent_is_rejected() {
        let s = signer();
        let ctx = s.mint(UA, T0);
        assert!(s.parse_token(&ctx.token(), "curl/7.0", T0).is_err());
    }

    #[test]
    fn other_key_is_rejected() {
        let ctx = signer().mint(UA, T0);
        let other = FlowSigner::new("bar", 7_200_000).unwrap();
        assert!(other.parse_token(&ctx.token(), UA, T0).is_err());
    }

    #[test]
    fn tampered_begin_time_is_rejected() {
        let s = signer();
        let ctx = s.mint(UA, T0);
        let forged = FlowContext { flow_begin_time: T0 + 1, ..ctx };
        assert!(s.parse_token(&forged.token(), UA, T0 + 10).is_err());
    }

    #[test]
    fn future_begin_time_is_rejected() {
        let s = signer();
        let ctx = s.mint(UA, T0);
        let err = s.parse_token(&ctx.token(), UA, T0 - 1).unwrap_err();
        assert_eq!(err.client_code().as_str(), "INVALID_TOKEN");
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        let s = signer();
        for t in ["", "abc", "a.b.c", "a.b", "..."] {
            assert!(s.parse_token(t, UA, T0).is_err(), "token={t:?}");
        }
    }

    #[test]
    fn empty_key_is_refused() {
        let err = FlowSigner::new("", 1).err().expect("must fail");
        assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
    }
}
