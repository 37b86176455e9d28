/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! keyサブコマンドの実装
//!

use anyhow::{anyhow, Result};

use crate::cmd_args::{KeyOpts, Options};
use crate::dispatch::{Dispatcher, KeyEvent, Outcome, LIST_CONTEXT};
use crate::host::{ConsoleHost, HostRuntime};
use crate::keepassxc::{CliRunner, ProcessRunner};
use crate::repository::{DatabaseListing, EntrySource, Repository};
use super::{open_repository, CommandContext};

///
/// keyサブコマンドのコンテキスト情報をパックした構造体
///
struct KeyCommandContext<R: CliRunner = ProcessRunner, H: HostRuntime = ConsoleHost> {
    /// エントリリポジトリ
    repository: Repository<DatabaseListing, R>,

    /// ホスト
    host: H,

    /// ディスパッチャ
    dispatcher: Dispatcher,

    /// キー入力
    combo: KeyEvent,

    /// 対象のエントリ名
    entry: String,
}

impl KeyCommandContext {
    ///
    /// オブジェクトの生成
    ///
    fn new(opts: &Options, sub_opts: &KeyOpts) -> Result<Self> {
        Ok(Self {
            repository: open_repository(opts, DatabaseListing)?,
            host: ConsoleHost,
            dispatcher: Dispatcher::new(),
            combo: sub_opts.combo(),
            entry: sub_opts.entry(),
        })
    }
}

impl<R: CliRunner, H: HostRuntime> KeyCommandContext<R, H> {
    ///
    /// キー入力に割り当てられた動作の実行
    ///
    fn run(&self) -> Result<Outcome> {
        dispatch_key(&self.dispatcher, &self.repository, &self.host, &self.combo, &self.entry)
    }
}

// CommandContextトレイトの実装
impl<R: CliRunner, H: HostRuntime> CommandContext for KeyCommandContext<R, H> {
    fn exec(&mut self) -> Result<()> {
        if let Some(message) = describe(&self.run()?) {
            eprintln!("{}", message);
        }

        Ok(())
    }
}

///
/// キー入力の解決と実行
///
/// # 戻り値
/// 実行結果を返す。キー入力に動作が割り当てられていない場合はエラーを返す。
///
pub(super) fn dispatch_key<S, R, H>(
    dispatcher: &Dispatcher,
    repository: &Repository<S, R>,
    host: &H,
    combo: &KeyEvent,
    entry_name: &str,
) -> Result<Outcome>
where
    S: EntrySource,
    R: CliRunner,
    H: HostRuntime,
{
    let action = dispatcher.resolve(combo, LIST_CONTEXT)
        .ok_or_else(|| anyhow!(
            "{} is not bound to any action (primary modifier is {})",
            combo,
            dispatcher.primary()
        ))?;

    Ok(dispatcher.execute(action, repository, host, entry_name))
}

///
/// 実行結果の表示用メッセージ
///
/// # 戻り値
/// 通知済みの場合は`None`を返す。
///
pub(super) fn describe(outcome: &Outcome) -> Option<String> {
    match outcome {
        Outcome::Copied(attribute) => Some(format!("{}をクリップボードにコピーしました", attribute)),
        Outcome::Typed => Some("入力しました".to_string()),
        Outcome::Opened => Some("URLを開きました".to_string()),
        Outcome::Notified(_) => None,
    }
}

///
/// コマンドコンテキストの生成
///
pub(crate) fn build_context(opts: &Options, sub_opts: &KeyOpts)
    -> Result<Box<dyn CommandContext>>
{
    Ok(Box::new(KeyCommandContext::new(opts, sub_opts)?))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::dispatch::Modifier;
    use crate::host::test::{HostCall, RecordingHost};
    use crate::keepassxc::invoker::test::{client_for_test, FakeRunner};
    use crate::keepassxc::Attribute;

    fn build_context(combo: &str) -> KeyCommandContext<FakeRunner, RecordingHost> {
        KeyCommandContext {
            repository: Repository::new(client_for_test(), DatabaseListing),
            host: RecordingHost::new(),
            dispatcher: Dispatcher::new()
                .with_primary(Modifier::Ctrl)
                .with_delays(Duration::ZERO, Duration::ZERO),
            combo: combo.parse().unwrap(),
            entry: "/Work/GitHub".to_string(),
        }
    }

    ///
    /// ctrl+bでユーザ名がクリップボードにコピーされることを確認
    ///
    #[test]
    fn key_copies_username() {
        let ctx = build_context("ctrl+b");
        ctx.repository.client().runner().push_ok("octocat\n");

        assert_eq!(ctx.run().unwrap(), Outcome::Copied(Attribute::UserName));
        assert_eq!(ctx.host.calls(), vec![
            HostCall::Copy("octocat".to_string()),
            HostCall::Hide,
        ]);
    }

    ///
    /// 割り当ての無いキー入力がエラーになることを確認
    ///
    #[test]
    fn key_not_bound() {
        let ctx = build_context("ctrl+z");
        let err = ctx.run().unwrap_err();

        assert!(err.to_string().contains("ctrl+z"));
        assert_eq!(ctx.repository.client().runner().call_count(), 0);
        assert!(ctx.host.calls().is_empty());
    }

    ///
    /// 通知済みの結果は表示メッセージを持たないことを確認
    ///
    #[test]
    fn describe_outcomes() {
        assert!(describe(&Outcome::Notified("x".to_string())).is_none());
        assert_eq!(
            describe(&Outcome::Copied(Attribute::Password)).as_deref(),
            Some("passwordをクリップボードにコピーしました"),
        );
    }
}
