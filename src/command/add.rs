/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! addサブコマンドの実装
//!

use anyhow::{Context, Result};

use crate::cmd_args::{AccountOpts, Options};
use crate::keepassxc::{AccountInfo, CliRunner, GenerationRules, ProcessRunner};
use crate::repository::{DatabaseListing, EntrySource, Repository, SaveMode};
use super::show::record_lines;
use super::{open_repository, print_lines, CommandContext};

///
/// addサブコマンドのコンテキスト情報をパックした構造体
///
struct AddCommandContext<R: CliRunner = ProcessRunner> {
    /// エントリリポジトリ
    repository: Repository<DatabaseListing, R>,

    /// 追加するエントリの情報
    info: AccountInfo,

    /// パスワードの生成ルール
    rules: Option<GenerationRules>,

    /// パスワードを伏せずに表示するか否か
    reveal: bool,

    /// JSON形式で出力するか否か
    json: bool,
}

impl AddCommandContext {
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

// CommandContextトレイトの実装
impl<R: CliRunner> CommandContext for AddCommandContext<R> {
    fn exec(&mut self) -> Result<()> {
        let lines = save_entry(
            &mut self.repository,
            SaveMode::Add,
            &self.info,
            self.rules.as_ref(),
            self.reveal,
            self.json,
        )?;

        print_lines(&lines);
        Ok(())
    }
}

///
/// エントリの保存と保存結果の出力行の生成
///
/// # 引数
/// * `repository` - エントリリポジトリ
/// * `mode` - 追加か編集か
/// * `info` - 保存するエントリの情報
/// * `rules` - パスワードの生成ルール(生成しない場合は`None`)
/// * `reveal` - パスワードを伏せずに表示するか否か
/// * `json` - JSON形式で出力するか否か
///
/// # 注記
/// 保存後にエントリの全属性を読み直して出力する。
///
pub(super) fn save_entry<S, R>(
    repository: &mut Repository<S, R>,
    mode: SaveMode,
    info: &AccountInfo,
    rules: Option<&GenerationRules>,
    reveal: bool,
    json: bool,
) -> Result<Vec<String>>
where
    S: EntrySource,
    R: CliRunner,
{
    let entry_name = repository.save_entry(mode, info, rules)
        .with_context(|| format!("{}の保存に失敗しました", info.entry_name()))?;

    let record = repository.full_record(&entry_name)?;
    record_lines(&record, reveal, json)
}

///
/// コマンドコンテキストの生成
///
pub(crate) fn build_context(opts: &Options, sub_opts: &AccountOpts)
    -> Result<Box<dyn CommandContext>>
{
    Ok(Box::new(AddCommandContext::new(opts, sub_opts)?))
}
