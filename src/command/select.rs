/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! selectサブコマンドの実装
//!

use anyhow::Result;

use crate::cmd_args::{Options, SelectOpts};
use crate::dispatch::{Dispatcher, Outcome};
use crate::host::{ConsoleHost, HostRuntime};
use crate::keepassxc::{CliRunner, ProcessRunner};
use crate::repository::{DatabaseListing, Repository};
use super::key::describe;
use super::{open_repository, CommandContext};

///
/// selectサブコマンドのコンテキスト情報をパックした構造体
///
struct SelectCommandContext<R: CliRunner = ProcessRunner, H: HostRuntime = ConsoleHost> {
    /// エントリリポジトリ
    repository: Repository<DatabaseListing, R>,

    /// ホスト
    host: H,

    /// ディスパッチャ
    dispatcher: Dispatcher,

    /// 対象のエントリ名
    entry: String,
}

impl SelectCommandContext {
    ///
    /// オブジェクトの生成
    ///
    fn new(opts: &Options, sub_opts: &SelectOpts) -> Result<Self> {
        Ok(Self {
            repository: open_repository(opts, DatabaseListing)?,
            host: ConsoleHost,
            dispatcher: Dispatcher::new(),
            entry: sub_opts.entry(),
        })
    }
}

impl<R: CliRunner, H: HostRuntime> SelectCommandContext<R, H> {
    ///
    /// エントリ選択時の処理の実行
    ///
    fn run(&self) -> Outcome {
        self.dispatcher.select(&self.repository, &self.host, &self.entry)
    }
}

// CommandContextトレイトの実装
impl<R: CliRunner, H: HostRuntime> CommandContext for SelectCommandContext<R, H> {
    fn exec(&mut self) -> Result<()> {
        if let Some(message) = describe(&self.run()) {
            log::info!("{}", message);
        }

        Ok(())
    }
}

///
/// コマンドコンテキストの生成
///
pub(crate) fn build_context(opts: &Options, sub_opts: &SelectOpts)
    -> Result<Box<dyn CommandContext>>
{
    Ok(Box::new(SelectCommandContext::new(opts, sub_opts)?))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::dispatch::Modifier;
    use crate::host::test::{HostCall, RecordingHost};
    use crate::host::Key;
    use crate::keepassxc::invoker::test::{client_for_test, FakeRunner};

    fn build_context() -> SelectCommandContext<FakeRunner, RecordingHost> {
        SelectCommandContext {
            repository: Repository::new(client_for_test(), DatabaseListing),
            host: RecordingHost::new(),
            dispatcher: Dispatcher::new()
                .with_primary(Modifier::Ctrl)
                .with_delays(Duration::ZERO, Duration::ZERO),
            entry: "/Bank".to_string(),
        }
    }

    ///
    /// ユーザ名、Tab、パスワードの順に入力されることを確認
    ///
    #[test]
    fn select_types_account() {
        let ctx = build_context();
        ctx.repository.client().runner().push_ok(
            "Title: Bank\nUserName: me\nPassword: pw\nURL: \nNotes: \nUuid: {1}\nTags: \n"
        );

        assert_eq!(ctx.run(), Outcome::Typed);
        assert_eq!(ctx.host.calls(), vec![
            HostCall::Hide,
            HostCall::Type("me".to_string()),
            HostCall::Key(Key::Tab),
            HostCall::Type("pw".to_string()),
        ]);

        let calls = ctx.repository.client().runner().calls();
        assert!(calls[0].args.contains(&"--show-protected".to_string()));
    }

    ///
    /// 取得に失敗した場合は通知のみ行われることを確認
    ///
    #[test]
    fn select_reports_failure() {
        let ctx = build_context();
        ctx.repository.client().runner().push_err(
            crate::keepassxc::KpxcError::from_failure(Some(1), "Could not find entry".to_string())
        );

        assert!(matches!(ctx.run(), Outcome::Notified(_)));
        assert!(matches!(ctx.host.calls().as_slice(), [HostCall::Notify(_)]));
    }
}
