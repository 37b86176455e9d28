/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! searchサブコマンドの実装
//!

use anyhow::Result;

use crate::cmd_args::{Options, SearchOpts};
use crate::keepassxc::{CliRunner, EntryIdentity, ProcessRunner};
use crate::repository::{DatabaseListing, Repository};
use crate::search::SearchEngine;
use super::{entry_lines, open_repository, print_lines, CommandContext};

///
/// searchサブコマンドのコンテキスト情報をパックした構造体
///
struct SearchCommandContext<R: CliRunner = ProcessRunner> {
    /// エントリリポジトリ
    repository: Repository<DatabaseListing, R>,

    /// 検索エンジン
    engine: SearchEngine,

    /// 検索クエリ
    query: String,

    /// JSON形式で出力するか否か
    json: bool,
}

impl SearchCommandContext {
    ///
    /// オブジェクトの生成
    ///
    fn new(opts: &Options, sub_opts: &SearchOpts) -> Result<Self> {
        Ok(Self {
            repository: open_repository(opts, DatabaseListing)?,
            engine: SearchEngine::new(),
            query: sub_opts.query(),
            json: opts.json(),
        })
    }
}

impl<R: CliRunner> SearchCommandContext<R> {
    ///
    /// ヒットしたエントリの収集
    ///
    /// # 注記
    /// 全エントリの一覧(キャッシュ)に対してローカルで絞り込む。
    ///
    fn collect(&mut self) -> Result<Vec<EntryIdentity>> {
        let entries = self.repository.entries()?;

        Ok(self.engine.search(entries, &self.query)
            .into_iter()
            .cloned()
            .collect())
    }
}

// CommandContextトレイトの実装
impl<R: CliRunner> CommandContext for SearchCommandContext<R> {
    fn exec(&mut self) -> Result<()> {
        let hits = self.collect()?;

        if hits.is_empty() && !self.json {
            log::info!("no entries matched \"{}\"", self.query);
        }

        print_lines(&entry_lines(&hits, self.json)?);
        Ok(())
    }
}

///
/// コマンドコンテキストの生成
///
pub(crate) fn build_context(opts: &Options, sub_opts: &SearchOpts)
    -> Result<Box<dyn CommandContext>>
{
    Ok(Box::new(SearchCommandContext::new(opts, sub_opts)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keepassxc::invoker::test::{client_for_test, FakeRunner};

    fn build_context(query: &str) -> SearchCommandContext<FakeRunner> {
        let client = client_for_test();
        client.runner().push_ok("/Work/GitHub\n/Work/GitLab\n/Personal/Email\n");

        SearchCommandContext {
            repository: Repository::new(client, DatabaseListing),
            engine: SearchEngine::new(),
            query: SearchOpts::new_for_test(query).query(),
            json: false,
        }
    }

    ///
    /// 全トークンに一致したエントリのみが返ることを確認
    ///
    #[test]
    fn search_all_tokens() {
        let mut ctx = build_context("work hub");
        let hits = ctx.collect().unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entry_name(), "/Work/GitHub");
    }

    ///
    /// 引用符付きのトークンが部分一致のみで照合されることを確認
    ///
    #[test]
    fn search_quoted_token() {
        let mut ctx = build_context("\"mail\"");
        let hits = ctx.collect().unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title(), "Email");
    }

    ///
    /// 一覧の取得はkeepassxc-cliの呼び出し1回で済むことを確認
    ///
    #[test]
    fn search_uses_single_listing() {
        let mut ctx = build_context("git");
        assert_eq!(ctx.collect().unwrap().len(), 2);
        assert_eq!(ctx.repository.client().runner().call_count(), 1);
    }
}
