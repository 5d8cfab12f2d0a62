//! Feedback - 判定結果を利用者向けの応答に変換する
//!
//! コアは `PolicyVerdict` を返すだけです。理由コードをメッセージキーと
//! 完了フラグに対応付けるのは呼び出し側（この CLI）の責務です。

use serde::Serialize;
use taskgate_core::{PolicyVerdict, ReasonCode};
use tracing::debug;

/// Message key for a reason code.
pub fn feedback_key(code: ReasonCode) -> &'static str {
    match code {
        ReasonCode::Ok => "insecure-deserialization.success",
        ReasonCode::VersionMismatch => "insecure-deserialization.invalidversion",
        ReasonCode::Expired => "insecure-deserialization.expired",
        ReasonCode::WrongPayloadShape => "insecure-deserialization.stringobject",
        ReasonCode::UnauthorizedType => "insecure-deserialization.unauthorized",
        ReasonCode::MalformedToken => "insecure-deserialization.malformed",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackResult {
    pub lesson_completed: bool,
    pub feedback: &'static str,
    pub verdict: PolicyVerdict,
}

impl AttackResult {
    /// Builds the response for one verdict.
    ///
    /// Security rejections are answered without their detail, so the
    /// response does not tell a prober what the gate saw. The decoder has
    /// already logged them as warnings.
    pub fn from_verdict(mut verdict: PolicyVerdict) -> Self {
        if verdict.reason_code.is_security_signal() {
            debug!(detail = %verdict.detail, "detail withheld from response");
            verdict.detail.clear();
        }
        Self {
            lesson_completed: verdict.accepted,
            feedback: feedback_key(verdict.reason_code),
            verdict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io;
    use std::sync::{Arc, Mutex};

    struct LogSink(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogSink {
        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[rstest]
    #[case(ReasonCode::Ok, "insecure-deserialization.success")]
    #[case(ReasonCode::VersionMismatch, "insecure-deserialization.invalidversion")]
    #[case(ReasonCode::Expired, "insecure-deserialization.expired")]
    #[case(ReasonCode::WrongPayloadShape, "insecure-deserialization.stringobject")]
    #[case(ReasonCode::UnauthorizedType, "insecure-deserialization.unauthorized")]
    #[case(ReasonCode::MalformedToken, "insecure-deserialization.malformed")]
    fn every_reason_has_a_key(#[case] code: ReasonCode, #[case] key: &str) {
        assert_eq!(feedback_key(code), key);
    }

    #[test]
    fn accepted_completes_the_lesson() {
        let result = AttackResult::from_verdict(PolicyVerdict::accepted());
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["lessonCompleted"], true);
        assert_eq!(json["feedback"], "insecure-deserialization.success");
        assert_eq!(json["verdict"]["reasonCode"], "ok");
    }

    #[test]
    fn ordinary_rejection_keeps_detail() {
        let verdict = PolicyVerdict::rejected(ReasonCode::Expired, "too old");
        let result = AttackResult::from_verdict(verdict);

        assert!(!result.lesson_completed);
        assert_eq!(result.verdict.detail, "too old");
    }

    #[test]
    fn security_rejection_hides_detail() {
        let verdict = PolicyVerdict::rejected(
            ReasonCode::UnauthorizedType,
            "type `org.example.Gadget` is not allowlisted",
        );
        let json = serde_json::to_value(AttackResult::from_verdict(verdict)).unwrap();

        assert_eq!(json["verdict"]["reasonCode"], "unauthorized-type");
        assert!(json["verdict"].get("detail").is_none());
    }

    #[test]
    fn security_rejection_is_not_warned_again() {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buf);
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || LogSink(Arc::clone(&sink)))
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();
        let verdict = PolicyVerdict::rejected(ReasonCode::UnauthorizedType, "gadget");

        tracing::subscriber::with_default(subscriber, || AttackResult::from_verdict(verdict));

        let logs = String::from_utf8(buf.lock().unwrap().clone()).unwrap();
        assert!(!logs.contains("WARN"), "{logs}");
        assert!(logs.contains("detail withheld"), "{logs}");
    }
}
