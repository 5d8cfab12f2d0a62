//! Verdict model: the classified outcome of a decode attempt.
//!
//! Rejections are ordinary values, not faults. Every rejection carries a
//! `ReasonCode`; callers map the code to user-facing feedback.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a token was accepted or rejected.
///
/// Serialized as kebab-case (`unauthorized-type`, `malformed-token`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReasonCode {
    Ok,
    UnauthorizedType,
    MalformedToken,
    VersionMismatch,
    Expired,
    WrongPayloadShape,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::Ok => "ok",
            ReasonCode::UnauthorizedType => "unauthorized-type",
            ReasonCode::MalformedToken => "malformed-token",
            ReasonCode::VersionMismatch => "version-mismatch",
            ReasonCode::Expired => "expired",
            ReasonCode::WrongPayloadShape => "wrong-payload-shape",
        }
    }

    /// A rejection that callers must log as a potential attack.
    pub fn is_security_signal(&self) -> bool {
        matches!(self, ReasonCode::UnauthorizedType)
    }

    /// Every rejection is permanent for the token that caused it.
    /// Resubmitting the same token yields the same verdict.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of a decode attempt.
///
/// Also the error type of [`crate::SafeDecoder::decode`], so it composes with `?`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{reason_code}: {detail}")]
pub struct PolicyVerdict {
    pub accepted: bool,
    pub reason_code: ReasonCode,

    /// Diagnostic text. May name attacker-controlled class names; do not
    /// echo it back to the submitter.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
}

impl PolicyVerdict {
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            reason_code: ReasonCode::Ok,
            detail: String::new(),
        }
    }

    pub fn rejected(reason_code: ReasonCode, detail: impl Into<String>) -> Self {
        Self {
            accepted: false,
            reason_code,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ReasonCode::Ok, "\"ok\"")]
    #[case(ReasonCode::UnauthorizedType, "\"unauthorized-type\"")]
    #[case(ReasonCode::MalformedToken, "\"malformed-token\"")]
    #[case(ReasonCode::VersionMismatch, "\"version-mismatch\"")]
    #[case(ReasonCode::Expired, "\"expired\"")]
    #[case(ReasonCode::WrongPayloadShape, "\"wrong-payload-shape\"")]
    fn reason_code_serializes_kebab_case(#[case] code: ReasonCode, #[case] expected: &str) {
        assert_eq!(serde_json::to_string(&code).unwrap(), expected);
        assert_eq!(format!("\"{code}\""), expected);
    }

    #[test]
    fn only_unauthorized_type_is_a_security_signal() {
        assert!(ReasonCode::UnauthorizedType.is_security_signal());
        assert!(!ReasonCode::Expired.is_security_signal());
        assert!(!ReasonCode::MalformedToken.is_retryable());
    }

    #[test]
    fn verdict_json_shape() {
        let v = PolicyVerdict::rejected(ReasonCode::Expired, "too old");
        let json: serde_json::Value = serde_json::to_value(&v).unwrap();
        assert_eq!(json["accepted"], false);
        assert_eq!(json["reasonCode"], "expired");
        assert_eq!(json["detail"], "too old");

        let ok = serde_json::to_value(PolicyVerdict::accepted()).unwrap();
        assert_eq!(ok["reasonCode"], "ok");
        assert!(ok.get("detail").is_none());
    }

    #[test]
    fn verdict_displays_as_error() {
        let v = PolicyVerdict::rejected(ReasonCode::VersionMismatch, "found 1");
        assert_eq!(v.to_string(), "version-mismatch: found 1");
    }
}
