//! Batch decoding: one token per line, one JSON result per line.
//!
//! デコードは CPU だけを使う同期処理なので `spawn_blocking` に載せ、
//! `Arc<SafeDecoder>` を全タスクで共有します（ロック不要）。
//! 結果は入力と同じ順序で返します。

use std::sync::Arc;

use anyhow::Result;
use taskgate_core::SafeDecoder;
use tracing::debug;

use crate::feedback::AttackResult;

/// Decodes every non-blank line of `input` concurrently.
pub async fn decode_lines(decoder: Arc<SafeDecoder>, input: &str) -> Result<Vec<AttackResult>> {
    let handles: Vec<_> = input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let decoder = Arc::clone(&decoder);
            let token = line.to_owned();
            tokio::task::spawn_blocking(move || decoder.verdict(&token))
        })
        .collect();
    debug!(tokens = handles.len(), "batch submitted");

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(AttackResult::from_verdict(handle.await?));
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};
    use taskgate_core::ports::FixedClock;
    use taskgate_core::{DecodedTask, DecoderConfig, ReasonCode, TokenEncoder};

    #[tokio::test(flavor = "multi_thread")]
    async fn results_follow_input_order() {
        let now = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let decoder = Arc::new(
            SafeDecoder::with_clock(DecoderConfig::default(), Arc::new(FixedClock::new(now)))
                .unwrap(),
        );
        let fresh = TokenEncoder::encode(&DecodedTask::new(
            "sleep 5",
            "wait",
            now + TimeDelta::seconds(5),
        ));
        let stale = TokenEncoder::encode(&DecodedTask::new(
            "sleep 5",
            "wait",
            now - TimeDelta::seconds(5),
        ));
        let input = format!("{fresh}\n\n  {stale}  \nnot a token\n{fresh}\n");

        let codes: Vec<ReasonCode> = decode_lines(decoder, &input)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.verdict.reason_code)
            .collect();

        assert_eq!(
            codes,
            vec![
                ReasonCode::Ok,
                ReasonCode::Expired,
                ReasonCode::MalformedToken,
                ReasonCode::Ok,
            ]
        );
    }

    #[tokio::test]
    async fn blank_input_yields_nothing() {
        let decoder = Arc::new(SafeDecoder::new(DecoderConfig::default()).unwrap());
        assert!(decode_lines(decoder, "\n \n").await.unwrap().is_empty());
    }
}
