//! SafeDecoder - 信頼できないトークンを DecodedTask か拒否に変換する
//!
//! # デコードフロー
//! 1. base64 → バイト列（失敗: malformed-token）
//! 2. 型ゲート付き構造デコード（unauthorized-type / version-mismatch /
//!    wrong-payload-shape / malformed-token）
//! 3. 実体化した値の型を `downcast` で再確認（unauthorized-type）
//! 4. 業務ルール（expired）
//!
//! 各ステップは前のステップが成功したときだけ実行されます。
//! 拒否の経路に副作用はありません。トークンの中身を実行することもありません。
//!
//! # Thread Safety
//! 共有可変状態はありません。`Arc<SafeDecoder>` を複数スレッドから
//! ロックなしで使えます。

use std::sync::Arc;

use tracing::{debug, debug_span, field, warn};

use crate::config::{ConfigError, DecoderConfig};
use crate::domain::errors::DecodeError;
use crate::domain::policy::{BusinessRule, ExpiryRule, MaxLeadRule};
use crate::domain::state::DecodeStage;
use crate::domain::task::DecodedTask;
use crate::domain::verdict::PolicyVerdict;
use crate::ports::{Clock, SystemClock};
use crate::stream::reader::GatedReader;
use crate::typed::StreamClass;
use crate::typed::codec::TokenCodec;
use crate::typed::registry::TypeAllowlist;

pub struct SafeDecoder {
    allowlist: TypeAllowlist,
    config: DecoderConfig,
    rules: Vec<Box<dyn BusinessRule>>,
    clock: Arc<dyn Clock>,
}

impl SafeDecoder {
    /// Decoder on the local wall clock.
    pub fn new(config: DecoderConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: DecoderConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        let allowlist = TypeAllowlist::only::<DecodedTask>(config.schema_version)?;
        Self::with_allowlist(config, allowlist, clock)
    }

    pub(crate) fn with_allowlist(
        config: DecoderConfig,
        allowlist: TypeAllowlist,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rules: Vec<Box<dyn BusinessRule>> =
            vec![Box::new(ExpiryRule::new(config.expiry_tolerance()?))];
        if let Some(max_lead) = config.max_lead()? {
            rules.push(Box::new(MaxLeadRule::new(max_lead)));
        }

        Ok(Self {
            allowlist,
            config,
            rules,
            clock,
        })
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn allowlist(&self) -> &TypeAllowlist {
        &self.allowlist
    }

    pub fn decode(&self, token: &str) -> Result<DecodedTask, PolicyVerdict> {
        let span = debug_span!("decode", token_len = token.len(), stage = field::Empty);
        let _enter = span.enter();

        let mut stage = DecodeStage::Received;
        let result = self.run(token, &mut stage);

        let terminal = match &result {
            Ok(_) => DecodeStage::Accepted,
            Err(_) => DecodeStage::Rejected,
        };
        span.record("stage", stage.as_str());

        match &result {
            Ok(task) => debug!(task_name = %task.task_name, "token accepted"),
            Err(verdict) => debug!(
                reason = %verdict.reason_code,
                detail = %verdict.detail,
                last_stage = stage.as_str(),
                "token rejected"
            ),
        }
        debug!(stage = terminal.as_str(), "decode finished");

        result
    }

    /// Collapses `decode` into a verdict.
    pub fn verdict(&self, token: &str) -> PolicyVerdict {
        match self.decode(token) {
            Ok(_) => PolicyVerdict::accepted(),
            Err(verdict) => verdict,
        }
    }

    fn run(&self, token: &str, stage: &mut DecodeStage) -> Result<DecodedTask, PolicyVerdict> {
        *stage = DecodeStage::Decoding;
        if token.len() > self.config.max_token_bytes {
            return Err(DecodeError::TokenTooLarge {
                length: token.len(),
                limit: self.config.max_token_bytes,
            }
            .into());
        }
        let bytes = TokenCodec::decode_text(token)
            .map_err(|e| DecodeError::InvalidEncoding(e.to_string()))?;

        let value = GatedReader::new(&bytes, &self.allowlist, self.config.limits())
            .read_top_level()
            .map_err(reject)?;

        let task = value
            .downcast::<DecodedTask>()
            .map_err(|_| {
                reject(DecodeError::TypeConfirmation {
                    expected: DecodedTask::CLASS_NAME,
                })
            })?;
        *stage = DecodeStage::TypeChecked;

        let now = self.clock.now();
        for rule in &self.rules {
            rule.check(&task, now)?;
        }
        *stage = DecodeStage::BusinessRuleChecked;

        Ok(*task)
    }
}

/// Converts a decode failure into a verdict. Type-gate rejections are a
/// potential attack and are logged here with the offending class name.
fn reject(err: DecodeError) -> PolicyVerdict {
    if err.reason().is_security_signal() {
        warn!(
            class_name = err.class_name().unwrap_or("<unknown>"),
            detail = %err,
            "token rejected by type gate"
        );
    }
    err.into()
}

impl std::fmt::Debug for SafeDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafeDecoder")
            .field("allowlist", &self.allowlist)
            .field("config", &self.config)
            .field(
                "rules",
                &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
