/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! 対話セッションでの入力行の読み込み
//!

use std::io::{self, Write};

use anyhow::Result;

///
/// 対話的な入力を扱うためのトレイト
///
pub(crate) trait Prompter {
    ///
    /// 1行の読み込み
    ///
    /// # 引数
    /// * `prompt` - プロンプト文字列
    ///
    /// # 戻り値
    /// 読み込んだ行(改行は除く)を`Some()`でラップして返す。入力の終端に達し
    /// た場合は`None`を返す。
    ///
    fn read_line(&self, prompt: &str) -> Result<Option<String>>;
}

///
/// 標準入出力を用いたプロンプト実装
///
/// # 注記
/// プロンプトは標準エラー出力に表示する(標準出力は入力テキスト用)。
///
#[derive(Default)]
pub(crate) struct StdPrompter;

// Prompterトレイトの実装
impl Prompter for StdPrompter {
    fn read_line(&self, prompt: &str) -> Result<Option<String>> {
        eprint!("{}", prompt);
        io::stderr().flush().ok();

        let mut buf = String::new();
        if io::stdin().read_line(&mut buf)? == 0 {
            return Ok(None);
        }

        Ok(Some(buf.trim_end_matches(['\r', '\n']).to_string()))
    }
}
