/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! matchサブコマンドの実装
//!

use anyhow::Result;

use crate::cmd_args::{MatchOpts, Options};
use crate::keepassxc::{CliRunner, EntryIdentity, ProcessRunner};
use crate::repository::{ContextMatch, Repository};
use super::{entry_lines, open_repository, print_lines, CommandContext};

///
/// matchサブコマンドのコンテキスト情報をパックした構造体
///
struct MatchCommandContext<R: CliRunner = ProcessRunner> {
    /// ウィンドウ情報を取得元とするエントリリポジトリ
    repository: Repository<ContextMatch, R>,

    /// JSON形式で出力するか否か
    json: bool,
}

impl MatchCommandContext {
    ///
    /// オブジェクトの生成
    ///
    fn new(opts: &Options, sub_opts: &MatchOpts) -> Result<Self> {
        let source = ContextMatch::new(&sub_opts.window_context()?);
        log::debug!("match keyword: {:?}", source.keyword());

        Ok(Self {
            repository: open_repository(opts, source)?,
            json: opts.json(),
        })
    }
}

impl<R: CliRunner> MatchCommandContext<R> {
    ///
    /// 該当するエントリと通知メッセージの収集
    ///
    fn collect(&mut self) -> Result<(Vec<EntryIdentity>, Option<String>)> {
        let entries = self.repository.entries()?.to_vec();
        Ok((entries, self.repository.take_notice()))
    }
}

// CommandContextトレイトの実装
impl<R: CliRunner> CommandContext for MatchCommandContext<R> {
    fn exec(&mut self) -> Result<()> {
        let (entries, notice) = self.collect()?;

        if let Some(notice) = notice {
            eprintln!("{}", notice);
        }

        print_lines(&entry_lines(&entries, self.json)?);
        Ok(())
    }
}

///
/// コマンドコンテキストの生成
///
pub(crate) fn build_context(opts: &Options, sub_opts: &MatchOpts)
    -> Result<Box<dyn CommandContext>>
{
    Ok(Box::new(MatchCommandContext::new(opts, sub_opts)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keepassxc::invoker::test::{client_for_test, FakeRunner};
    use crate::keepassxc::KpxcError;

    fn build_context(url: Option<&str>, title: Option<&str>)
        -> MatchCommandContext<FakeRunner>
    {
        let opts = MatchOpts::new_for_test(url, title);
        let source = ContextMatch::new(&opts.window_context().unwrap());

        MatchCommandContext {
            repository: Repository::new(client_for_test(), source),
            json: false,
        }
    }

    ///
    /// URLから求めたキーワードで検索されることを確認
    ///
    #[test]
    fn match_by_url() {
        let mut ctx = build_context(Some("https://login.github.com/session"), None);
        ctx.repository.client().runner().push_ok("/Work/GitHub\n");

        let (entries, notice) = ctx.collect().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(notice.is_none());

        let calls = ctx.repository.client().runner().calls();
        assert_eq!(calls[0].args.last().map(String::as_str), Some("github.com"));
    }

    ///
    /// 該当なしの場合に全エントリへフォールバックし通知が残ることを確認
    ///
    #[test]
    fn match_falls_back_to_full_listing() {
        let mut ctx = build_context(None, Some("Inbox | Fastmail"));
        ctx.repository.client().runner().push_err(KpxcError::NoResults);
        ctx.repository.client().runner().push_ok("/Work/GitHub\n/Personal/Email\n");

        let (entries, notice) = ctx.collect().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(notice.unwrap().contains("「Inbox」"));
    }

    ///
    /// 結果はキャッシュされず毎回検索されることを確認
    ///
    #[test]
    fn match_is_never_cached() {
        let mut ctx = build_context(None, Some("GitHub"));
        ctx.repository.client().runner().push_ok("/Work/GitHub\n");
        ctx.repository.client().runner().push_ok("/Work/GitHub\n");

        ctx.collect().unwrap();
        ctx.collect().unwrap();

        assert_eq!(ctx.repository.client().runner().call_count(), 2);
    }
}
