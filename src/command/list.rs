/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! listサブコマンドの実装
//!

use anyhow::Result;

use crate::cmd_args::{ListOpts, Options};
use crate::keepassxc::{CliRunner, EntryIdentity, ProcessRunner};
use crate::repository::{DatabaseListing, Repository};
use super::{entry_lines, open_repository, print_lines, CommandContext};

///
/// listサブコマンドのコンテキスト情報をパックした構造体
///
struct ListCommandContext<R: CliRunner = ProcessRunner> {
    /// エントリリポジトリ
    repository: Repository<DatabaseListing, R>,

    /// 表示対象のグループ
    group: Option<String>,

    /// JSON形式で出力するか否か
    json: bool,
}

impl ListCommandContext {
    ///
    /// オブジェクトの生成
    ///
    fn new(opts: &Options, sub_opts: &ListOpts) -> Result<Self> {
        Ok(Self {
            repository: open_repository(opts, DatabaseListing)?,
            group: sub_opts.group(),
            json: opts.json(),
        })
    }
}

impl<R: CliRunner> ListCommandContext<R> {
    ///
    /// 表示対象のエントリの収集
    ///
    /// # 注記
    /// グループ指定は前後の"/"を無視して完全一致で比較する。
    ///
    fn collect(&mut self) -> Result<Vec<EntryIdentity>> {
        let group = self.group.as_deref().map(|group| group.trim_matches('/'));

        Ok(self.repository.entries()?
            .iter()
            .filter(|entry| group.is_none_or(|group| entry.group() == group))
            .cloned()
            .collect())
    }
}

// CommandContextトレイトの実装
impl<R: CliRunner> CommandContext for ListCommandContext<R> {
    fn exec(&mut self) -> Result<()> {
        let entries = self.collect()?;
        print_lines(&entry_lines(&entries, self.json)?);
        Ok(())
    }
}

///
/// コマンドコンテキストの生成
///
pub(crate) fn build_context(opts: &Options, sub_opts: &ListOpts)
    -> Result<Box<dyn CommandContext>>
{
    Ok(Box::new(ListCommandContext::new(opts, sub_opts)?))
}
