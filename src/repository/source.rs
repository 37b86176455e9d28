/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! エントリ一覧の取得元を定義するモジュール
//!

use std::path::Path;

use chrono::{DateTime, Local};

use crate::keepassxc::{CliRunner, EntryIdentity, KeePassXC, KeePassXCOptions, KpxcError};
use super::context::WindowContext;
use super::CacheState;

///
/// キャッシュの鮮度
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Freshness {
    /// キャッシュをそのまま使用できる
    Fresh,

    /// 取得し直す必要がある
    Stale {
        /// 取得後に記録する更新日時(取得できなかった場合は`None`)
        modified: Option<DateTime<Local>>,
    },
}

///
/// 取得元から得られたエントリ一覧
///
#[derive(Clone, Debug, Default)]
pub(crate) struct Listing {
    /// エントリのリスト
    pub(crate) entries: Vec<EntryIdentity>,

    /// 利用者に通知すべきメッセージ
    pub(crate) notice: Option<String>,
}

impl Listing {
    fn new(entries: Vec<EntryIdentity>) -> Self {
        Self { entries, notice: None }
    }
}

///
/// エントリ一覧の取得元が実装するトレイト
///
pub(crate) trait EntrySource {
    ///
    /// キャッシュの鮮度の判定
    ///
    /// # 引数
    /// * `cache` - 現在のキャッシュ(未取得または無効化済みの場合は`None`)
    /// * `options` - 現在の設定情報
    ///
    fn freshness(&self, cache: Option<&CacheState>, options: &KeePassXCOptions)
        -> Freshness;

    ///
    /// エントリ一覧の取得
    ///
    fn fetch<R: CliRunner>(&self, client: &KeePassXC<R>) -> Result<Listing, KpxcError>;
}

///
/// ファイルの更新日時を取得する
///
fn modified_time(path: &Path) -> std::io::Result<DateTime<Local>> {
    Ok(std::fs::metadata(path)?.modified()?.into())
}

///
/// データベース全体を一覧の取得元とするソース
///
/// # 注記
/// データベースファイルの更新日時が記録済みの日時より新しくなった場合にのみ
/// 取得し直す。更新日時が取得できない場合は常に取得し直す。
///
#[derive(Clone, Debug, Default)]
pub(crate) struct DatabaseListing;

impl EntrySource for DatabaseListing {
    fn freshness(&self, cache: Option<&CacheState>, options: &KeePassXCOptions)
        -> Freshness
    {
        let modified = match modified_time(options.database()) {
            Ok(modified) => modified,
            Err(err) => {
                log::warn!(
                    "stat {} failed ({}), assume stale",
                    options.database().display(),
                    err
                );
                return Freshness::Stale { modified: None };
            }
        };

        match cache.and_then(CacheState::last_modified) {
            Some(last) if modified <= last => Freshness::Fresh,
            last => {
                log::debug!(
                    "database modified: {} (recorded {})",
                    modified.to_rfc3339(),
                    last.map(|dt| dt.to_rfc3339()).unwrap_or_else(|| "-".to_string()),
                );
                Freshness::Stale { modified: Some(modified) }
            }
        }
    }

    fn fetch<R: CliRunner>(&self, client: &KeePassXC<R>) -> Result<Listing, KpxcError> {
        Ok(Listing::new(client.entry_list()?))
    }
}

///
/// 操作中のウィンドウ情報から得たキーワードで検索するソース
///
/// # 注記
/// 検索結果はキャッシュしない。キーワードに該当するエントリが無い場合は全エ
/// ントリの一覧にフォールバックする。
///
#[derive(Clone, Debug)]
pub(crate) struct ContextMatch {
    /// 検索キーワード
    keyword: Option<String>,
}

impl ContextMatch {
    ///
    /// ウィンドウ情報からのオブジェクトの生成
    ///
    pub(crate) fn new(context: &WindowContext) -> Self {
        Self { keyword: context.search_keyword() }
    }

    ///
    /// 検索キーワードへのアクセサ
    ///
    pub(crate) fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }
}

impl EntrySource for ContextMatch {
    fn freshness(&self, _cache: Option<&CacheState>, _options: &KeePassXCOptions)
        -> Freshness
    {
        Freshness::Stale { modified: None }
    }

    fn fetch<R: CliRunner>(&self, client: &KeePassXC<R>) -> Result<Listing, KpxcError> {
        let Some(keyword) = &self.keyword else {
            return Ok(Listing {
                entries: Vec::new(),
                notice: Some("検索キーワードを取得できませんでした".to_string()),
            });
        };

        match client.search_entries(keyword) {
            Ok(entries) => Ok(Listing::new(entries)),

            Err(KpxcError::NoResults) => {
                log::info!("no entries for \"{}\", fall back to full listing", keyword);

                Ok(Listing {
                    entries: client.entry_list()?,
                    notice: Some(format!(
                        "「{}」に該当するエントリが無いため全エントリを表示します",
                        keyword
                    )),
                })
            }

            Err(err) => Err(err),
        }
    }
}
