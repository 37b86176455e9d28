/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! editサブコマンドの実装
//!

use anyhow::Result;

use crate::cmd_args::{AccountOpts, Options};
use crate::keepassxc::{AccountInfo, CliRunner, GenerationRules, ProcessRunner};
use crate::repository::{DatabaseListing, Repository, SaveMode};
use super::add::save_entry;
use super::{open_repository, print_lines, CommandContext};

///
/// editサブコマンドのコンテキスト情報をパックした構造体
///
/// # 注記
/// 指定しなかった属性は変更しない。
///
struct EditCommandContext<R: CliRunner = ProcessRunner> {
    /// エントリリポジトリ
    repository: Repository<DatabaseListing, R>,

    /// 編集するエントリの情報
    info: AccountInfo,

    /// パスワードの生成ルール
    rules: Option<GenerationRules>,

    /// パスワードを伏せずに表示するか否か
    reveal: bool,

    /// JSON形式で出力するか否か
    json: bool,
}

impl EditCommandContext {
    ///
    /// オブジェクトの生成
    ///
    fn new(opts: &Options, sub_opts: &AccountOpts) -> Result<Self> {
        Ok(Self {
            repository: open_repository(opts, DatabaseListing)?,
            info: sub_opts.account_info(),
            rules: sub_opts.rules(),
            reveal: sub_opts.reveal(),
            json: opts.json(),
        })
    }
}

impl<R: CliRunner> EditCommandContext<R> {
    ///
    /// 編集の実行
    ///
    fn lines(&mut self) -> Result<Vec<String>> {
        save_entry(
            &mut self.repository,
            SaveMode::Edit,
            &self.info,
            self.rules.as_ref(),
            self.reveal,
            self.json,
        )
    }
}

// CommandContextトレイトの実装
impl<R: CliRunner> CommandContext for EditCommandContext<R> {
    fn exec(&mut self) -> Result<()> {
        print_lines(&self.lines()?);
        Ok(())
    }
}

///
/// コマンドコンテキストの生成
///
pub(crate) fn build_context(opts: &Options, sub_opts: &AccountOpts)
    -> Result<Box<dyn CommandContext>>
{
    Ok(Box::new(EditCommandContext::new(opts, sub_opts)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd_args::GenerateOpts;
    use crate::keepassxc::invoker::test::{client_for_test, FakeRunner};

    fn build_context(rules: Option<GenerationRules>) -> EditCommandContext<FakeRunner> {
        EditCommandContext {
            repository: Repository::new(client_for_test(), DatabaseListing),
            info: AccountOpts::new_for_test("Router", None, None).account_info(),
            rules,
            reveal: true,
            json: true,
        }
    }

    ///
    /// パスワード再生成の指定が引数に反映されることを確認
    ///
    #[test]
    fn edit_regenerates_password() {
        let rules = GenerateOpts::new_for_test(Some(10), true).rules();
        let mut ctx = build_context(Some(rules));
        ctx.repository.client().runner().push_ok("Successfully edited entry Router.\n");
        ctx.repository.client().runner().push_ok(
            "Title: Router\nUserName: admin\nPassword: 0123456789\nURL: \nNotes: \nUuid: {2}\nTags: \n"
        );

        let lines = ctx.lines().unwrap();
        let value: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(value["password"], "0123456789");

        let calls = ctx.repository.client().runner().calls();
        assert_eq!(calls[0].args, vec![
            "edit", "/tmp/db.kdbx", "/Router", "--generate", "--length", "10", "--numeric",
        ]);
    }
}
