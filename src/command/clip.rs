/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! clipサブコマンドの実装
//!

use anyhow::Result;

use crate::cmd_args::{ClipOpts, Options};
use crate::keepassxc::{Attribute, CliRunner, ProcessRunner};
use crate::repository::{DatabaseListing, Repository};
use super::{open_repository, CommandContext};

///
/// clipサブコマンドのコンテキスト情報をパックした構造体
///
/// # 注記
/// コピーとクリップボードの消去はkeepassxc-cliに任せる。
///
struct ClipCommandContext<R: CliRunner = ProcessRunner> {
    /// エントリリポジトリ
    repository: Repository<DatabaseListing, R>,

    /// 対象のエントリ名
    entry: String,

    /// コピーする属性
    attribute: Attribute,
}

impl ClipCommandContext {
    ///
    /// オブジェクトの生成
    ///
    fn new(opts: &Options, sub_opts: &ClipOpts) -> Result<Self> {
        Ok(Self {
            repository: open_repository(opts, DatabaseListing)?,
            entry: sub_opts.entry(),
            attribute: sub_opts.attribute(),
        })
    }
}

impl<R: CliRunner> ClipCommandContext<R> {
    ///
    /// コピーの実行
    ///
    /// # 戻り値
    /// keepassxc-cliの出力(前後の空白を除く)を返す。
    ///
    fn clip(&self) -> Result<String> {
        Ok(self.repository.client().clip_attribute(&self.entry, self.attribute)?)
    }
}

// CommandContextトレイトの実装
impl<R: CliRunner> CommandContext for ClipCommandContext<R> {
    fn exec(&mut self) -> Result<()> {
        let message = self.clip()?;

        if !message.is_empty() {
            eprintln!("{}", message);
        }

        Ok(())
    }
}

///
/// コマンドコンテキストの生成
///
pub(crate) fn build_context(opts: &Options, sub_opts: &ClipOpts)
    -> Result<Box<dyn CommandContext>>
{
    Ok(Box::new(ClipCommandContext::new(opts, sub_opts)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keepassxc::invoker::test::client_for_test;

    ///
    /// 属性指定がkeepassxc-cliの引数に反映されることを確認
    ///
    #[test]
    fn clip_arguments() {
        let ctx = ClipCommandContext {
            repository: Repository::new(client_for_test(), DatabaseListing),
            entry: "/Work/GitHub".to_string(),
            attribute: Attribute::UserName,
        };
        ctx.repository.client().runner().push_ok("Entry's username copied to the clipboard!\n");

        assert_eq!(ctx.clip().unwrap(), "Entry's username copied to the clipboard!");

        let calls = ctx.repository.client().runner().calls();
        assert_eq!(calls[0].args, vec![
            "clip", "/tmp/db.kdbx", "/Work/GitHub", "--attribute", "username",
        ]);
    }

    ///
    /// ワンタイムパスワードは--totpで要求されることを確認
    ///
    #[test]
    fn clip_totp() {
        let ctx = ClipCommandContext {
            repository: Repository::new(client_for_test(), DatabaseListing),
            entry: "/Work/GitHub".to_string(),
            attribute: Attribute::Totp,
        };

        ctx.clip().unwrap();

        let calls = ctx.repository.client().runner().calls();
        assert_eq!(calls[0].args.last().map(String::as_str), Some("--totp"));
    }
}
