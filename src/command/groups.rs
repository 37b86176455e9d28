/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! groupsサブコマンドの実装
//!

use anyhow::Result;

use crate::cmd_args::Options;
use crate::keepassxc::{CliRunner, ProcessRunner};
use crate::repository::{DatabaseListing, Repository};
use super::util::group_label;
use super::{open_repository, print_lines, CommandContext};

///
/// groupsサブコマンドのコンテキスト情報をパックした構造体
///
struct GroupsCommandContext<R: CliRunner = ProcessRunner> {
    /// エントリリポジトリ
    repository: Repository<DatabaseListing, R>,

    /// JSON形式で出力するか否か
    json: bool,
}

impl GroupsCommandContext {
    ///
    /// オブジェクトの生成
    ///
    fn new(opts: &Options) -> Result<Self> {
        Ok(Self {
            repository: open_repository(opts, DatabaseListing)?,
            json: opts.json(),
        })
    }
}

impl<R: CliRunner> GroupsCommandContext<R> {
    ///
    /// 出力行の生成
    ///
    /// # 注記
    /// JSON出力ではルートグループを空文字列のまま出力する。
    ///
    fn lines(&mut self) -> Result<Vec<String>> {
        let groups = self.repository.groups()?;

        if self.json {
            return Ok(vec![serde_json::to_string_pretty(&groups)?]);
        }

        Ok(groups.iter()
            .map(|group| group_label(group).to_string())
            .collect())
    }
}

// CommandContextトレイトの実装
impl<R: CliRunner> CommandContext for GroupsCommandContext<R> {
    fn exec(&mut self) -> Result<()> {
        print_lines(&self.lines()?);
        Ok(())
    }
}

///
/// コマンドコンテキストの生成
///
pub(crate) fn build_context(opts: &Options) -> Result<Box<dyn CommandContext>> {
    Ok(Box::new(GroupsCommandContext::new(opts)?))
}
