/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! generateサブコマンドの実装
//!

use std::path::PathBuf;

use anyhow::Result;
use serde_json::json;

use crate::cmd_args::{GenerateOpts, Options};
use crate::keepassxc::{generate_password, CliRunner, GenerationRules, ProcessRunner};
use super::{print_lines, CommandContext};

///
/// generateサブコマンドのコンテキスト情報をパックした構造体
///
/// # 注記
/// データベースも資格情報も用いないため、リポジトリは持たない。
///
struct GenerateCommandContext<R: CliRunner = ProcessRunner> {
    /// コマンドランナー
    runner: R,

    /// keepassxc-cliへのパス
    cli: PathBuf,

    /// 生成ルール
    rules: GenerationRules,

    /// JSON形式で出力するか否か
    json: bool,
}

impl GenerateCommandContext {
    ///
    /// オブジェクトの生成
    ///
    fn new(opts: &Options, sub_opts: &GenerateOpts) -> Self {
        Self {
            runner: ProcessRunner,
            cli: opts.cli(),
            rules: sub_opts.rules(),
            json: opts.json(),
        }
    }
}

impl<R: CliRunner> GenerateCommandContext<R> {
    ///
    /// 出力行の生成
    ///
    fn lines(&self) -> Result<Vec<String>> {
        let password = generate_password(&self.runner, &self.cli, &self.rules)?;

        if self.json {
            let value = json!({
                "password": password,
                "rules": self.rules,
            });

            return Ok(vec![serde_json::to_string_pretty(&value)?]);
        }

        Ok(vec![password])
    }
}

// CommandContextトレイトの実装
impl<R: CliRunner> CommandContext for GenerateCommandContext<R> {
    fn exec(&mut self) -> Result<()> {
        print_lines(&self.lines()?);
        Ok(())
    }
}

///
/// コマンドコンテキストの生成
///
pub(crate) fn build_context(opts: &Options, sub_opts: &GenerateOpts)
    -> Result<Box<dyn CommandContext>>
{
    Ok(Box::new(GenerateCommandContext::new(opts, sub_opts)))
}
