//! State - デコード呼び出しごとの状態
//!
//! 状態は永続化されず、1 回の `decode` 呼び出しの中だけで遷移します。

/// DecodeStage はデコードの進行段階
///
/// # 状態遷移
/// - received: トークン受領
/// - decoding: base64 → バイト列 → 型ゲート付き構造デコード
/// - type_checked: 許可型であることを確認済み
/// - business_rule_checked: 期限などの業務ルールを通過
/// - accepted / rejected: 終端
///
/// デコーダ内部でのリトライはありません。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStage {
    Received,
    Decoding,
    TypeChecked,
    BusinessRuleChecked,
    Accepted,
    Rejected,
}

impl DecodeStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecodeStage::Received => "received",
            DecodeStage::Decoding => "decoding",
            DecodeStage::TypeChecked => "type_checked",
            DecodeStage::BusinessRuleChecked => "business_rule_checked",
            DecodeStage::Accepted => "accepted",
            DecodeStage::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DecodeStage::Accepted | DecodeStage::Rejected)
    }
}
