/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! サブコマンドの処理を提供するモジュール
//!

pub(crate) mod add;
pub(crate) mod clip;
pub(crate) mod edit;
pub(crate) mod generate;
pub(crate) mod groups;
pub(crate) mod key;
pub(crate) mod list;
pub(crate) mod matching;
pub(crate) mod prompt;
pub(crate) mod search;
pub(crate) mod select;
pub(crate) mod shell;
pub(crate) mod show;
pub(crate) mod util;

use anyhow::Result;

use crate::cmd_args::Options;
use crate::keepassxc::{EntryIdentity, KeePassXC};
use crate::repository::{EntrySource, Repository};

///
/// コマンドコンテキスト集約するトレイト
///
pub(crate) trait CommandContext {
    ///
    /// サブコマンドの実行
    ///
    /// # 注記
    /// コンテキストは自身のリポジトリを所有し、実行中はそれを排他的に借用す
    /// る。
    ///
    fn exec(&mut self) -> Result<()>;
}

///
/// リポジトリのオープン
///
/// # 引数
/// * `opts` - オプション情報
/// * `source` - エントリ一覧の取得元
///
/// # 戻り値
/// 必須の設定が揃っている場合はリポジトリを`Ok()`でラップして返す。
///
/// # 注記
/// 設定が欠けている場合はkeepassxc-cliを起動する前にエラーとなる。
///
pub(crate) fn open_repository<S>(opts: &Options, source: S) -> Result<Repository<S>>
where
    S: EntrySource,
{
    Ok(Repository::new(KeePassXC::new(opts.keepassxc_options()?), source))
}

///
/// エントリ一覧の出力行の生成
///
/// # 引数
/// * `entries` - 出力するエントリのリスト
/// * `json` - JSON形式で出力するか否か
///
pub(crate) fn entry_lines(entries: &[EntryIdentity], json: bool) -> Result<Vec<String>> {
    if json {
        return Ok(vec![serde_json::to_string_pretty(entries)?]);
    }

    Ok(entries.iter()
        .map(|entry| entry.entry_name().to_string())
        .collect())
}

///
/// 出力行の表示
///
pub(crate) fn print_lines(lines: &[String]) {
    lines.iter().for_each(|line| println!("{}", line));
}

#[cfg(test)]
mod tests {
    use super::*;

    ///
    /// テキスト出力ではエントリ名が1行ずつ並ぶことを確認
    ///
    #[test]
    fn entry_lines_as_text() {
        let entries = vec![
            EntryIdentity::new("GitHub", "Work"),
            EntryIdentity::new("Router", ""),
        ];

        assert_eq!(entry_lines(&entries, false).unwrap(), vec!["/Work/GitHub", "/Router"]);
    }

    ///
    /// JSON出力のフィールド名を確認
    ///
    #[test]
    fn entry_lines_as_json() {
        let entries = vec![EntryIdentity::new("GitHub", "Work")];
        let lines = entry_lines(&entries, true).unwrap();

        let value: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(value[0]["title"], "GitHub");
        assert_eq!(value[0]["description"], "Work");
        assert_eq!(value[0]["entryName"], "/Work/GitHub");
    }
}
