/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! showサブコマンドの実装
//!

use anyhow::Result;
use serde_json::json;

use crate::cmd_args::{Options, ShowOpts};
use crate::keepassxc::{AccountRecord, Attribute, CliRunner, KpxcError, ProcessRunner};
use crate::repository::{DatabaseListing, Repository};
use super::util::masked;
use super::{open_repository, print_lines, CommandContext};

///
/// showサブコマンドのコンテキスト情報をパックした構造体
///
struct ShowCommandContext<R: CliRunner = ProcessRunner> {
    /// エントリリポジトリ
    repository: Repository<DatabaseListing, R>,

    /// 対象のエントリ名
    entry: String,

    /// 表示する属性(`None`の場合は全属性)
    attribute: Option<Attribute>,

    /// パスワードを伏せずに表示するか否か
    reveal: bool,

    /// JSON形式で出力するか否か
    json: bool,
}

impl ShowCommandContext {
    ///
    /// オブジェクトの生成
    ///
    fn new(opts: &Options, sub_opts: &ShowOpts) -> Result<Self> {
        Ok(Self {
            repository: open_repository(opts, DatabaseListing)?,
            entry: sub_opts.entry(),
            attribute: sub_opts.attribute(),
            reveal: sub_opts.reveal(),
            json: opts.json(),
        })
    }
}

impl<R: CliRunner> ShowCommandContext<R> {
    ///
    /// 出力行の生成
    ///
    /// # 注記
    /// 属性を個別に指定した場合はその値をそのまま出力する(空の場合はエラー)。
    ///
    fn lines(&self) -> Result<Vec<String>> {
        let Some(attribute) = self.attribute else {
            let record = self.repository.full_record(&self.entry)?;
            return record_lines(&record, self.reveal, self.json);
        };

        let value = self.repository.attribute(&self.entry, attribute)?;
        if value.is_empty() {
            return Err(KpxcError::EmptyAttribute(attribute.to_string()).into());
        }

        if self.json {
            let value = json!({
                "entryName": self.entry,
                "attribute": attribute.as_str(),
                "value": value,
            });

            return Ok(vec![serde_json::to_string_pretty(&value)?]);
        }

        Ok(vec![value])
    }
}

// CommandContextトレイトの実装
impl<R: CliRunner> CommandContext for ShowCommandContext<R> {
    fn exec(&mut self) -> Result<()> {
        print_lines(&self.lines()?);
        Ok(())
    }
}

///
/// エントリの全属性の出力行の生成
///
/// # 引数
/// * `record` - エントリの全属性
/// * `reveal` - パスワードを伏せずに表示するか否か
/// * `json` - JSON形式で出力するか否か
///
/// # 注記
/// 複数行の備考は2行目以降を字下げして出力する。
///
pub(super) fn record_lines(record: &AccountRecord, reveal: bool, json: bool)
    -> Result<Vec<String>>
{
    let record = AccountRecord {
        password: masked(&record.password, reveal),
        ..record.clone()
    };

    if json {
        return Ok(vec![serde_json::to_string_pretty(&record)?]);
    }

    let mut lines = vec![
        format!("Title:    {}", record.title),
        format!("UserName: {}", record.username),
        format!("Password: {}", record.password),
        format!("URL:      {}", record.url),
    ];

    let mut notes = record.notes.lines();
    lines.push(format!("Notes:    {}", notes.next().unwrap_or_default()));
    lines.extend(notes.map(|line| format!("          {}", line)));

    lines.push(format!("Uuid:     {}", record.uuid));
    lines.push(format!("Tags:     {}", record.tags));

    Ok(lines)
}

///
/// コマンドコンテキストの生成
///
pub(crate) fn build_context(opts: &Options, sub_opts: &ShowOpts)
    -> Result<Box<dyn CommandContext>>
{
    Ok(Box::new(ShowCommandContext::new(opts, sub_opts)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keepassxc::invoker::test::{client_for_test, FakeRunner};

    const RECORD: &str = "Title: Bank\nUserName: me\nPassword: pw123\nURL: https://bank.example\n\
        Notes: line1\nline2\nUuid: {0a1b}\nTags: money\n";

    fn build_context(attribute: Option<Attribute>, reveal: bool, json: bool)
        -> ShowCommandContext<FakeRunner>
    {
        ShowCommandContext {
            repository: Repository::new(client_for_test(), DatabaseListing),
            entry: "/Bank".to_string(),
            attribute,
            reveal,
            json,
        }
    }

    ///
    /// 全属性の表示でパスワードが伏せられることを確認
    ///
    #[test]
    fn show_record_masks_password() {
        let ctx = build_context(None, false, false);
        ctx.repository.client().runner().push_ok(RECORD);

        let lines = ctx.lines().unwrap();
        assert!(lines.contains(&"Password: ********".to_string()));
        assert!(lines.contains(&"Notes:    line1".to_string()));
        assert!(lines.contains(&"          line2".to_string()));
        assert!(!lines.iter().any(|line| line.contains("pw123")));
    }

    ///
    /// revealを指定した場合はパスワードが表示されることを確認
    ///
    #[test]
    fn show_record_reveal_json() {
        let ctx = build_context(None, true, true);
        ctx.repository.client().runner().push_ok(RECORD);

        let lines = ctx.lines().unwrap();
        let value: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(value["password"], "pw123");
        assert_eq!(value["notes"], "line1\nline2");
    }

    ///
    /// 個別の属性がそのまま出力されることを確認
    ///
    #[test]
    fn show_single_attribute() {
        let ctx = build_context(Some(Attribute::UserName), false, false);
        ctx.repository.client().runner().push_ok("me\n");

        assert_eq!(ctx.lines().unwrap(), vec!["me"]);
    }

    ///
    /// 空の属性がエラーになることを確認
    ///
    #[test]
    fn show_empty_attribute() {
        let ctx = build_context(Some(Attribute::Url), false, false);
        ctx.repository.client().runner().push_ok("\n");

        let err = ctx.lines().unwrap_err();
        assert!(err.to_string().contains("url"));
    }
}
