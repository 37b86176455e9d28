/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! keepassxc-cli連携で発生するエラーの定義
//!

use thiserror::Error;

/// 検索結果が無い場合にkeepassxc-cliが出力するメッセージ
pub(crate) const NO_RESULTS_MESSAGE: &str = "No results for that search term.";

///
/// keepassxc-cli連携処理のエラー
///
/// # 注記
/// いずれのバリアントも資格情報を含まない。`Invocation`のメッセージはアンロ
/// ックのプロンプト行を取り除いた後のものになる。
///
#[derive(Debug, Error)]
pub(crate) enum KpxcError {
    /// 外部プロセスの起動に失敗した
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// 外部プロセスが異常終了した
    #[error("{message}")]
    Invocation {
        status: Option<i32>,
        message: String,
    },

    /// 検索にヒットするエントリが無かった
    #[error("{}", NO_RESULTS_MESSAGE)]
    NoResults,

    /// 取り出した属性が空だった
    #[error("attribute \"{0}\" is empty")]
    EmptyAttribute(String),

    /// 必須の設定項目が欠けている
    #[error("required setting is missing: {0}")]
    MissingSetting(&'static str),

    /// 出力が想定した行構成になっていない
    #[error("unexpected output layout: {0}")]
    ParseLayout(String),
}

impl KpxcError {
    ///
    /// 異常終了時のエラーメッセージからエラーオブジェクトを生成する
    ///
    /// # 注記
    /// メッセージが検索結果なしを示すものであれば`NoResults`を返す。
    ///
    pub(crate) fn from_failure(status: Option<i32>, message: String) -> Self {
        if message.trim() == NO_RESULTS_MESSAGE {
            Self::NoResults
        } else {
            Self::Invocation { status, message }
        }
    }
}
