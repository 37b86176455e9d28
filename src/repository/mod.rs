/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! エントリ一覧のキャッシュを管理するモジュール
//!

pub(crate) mod context;
pub(crate) mod source;

use chrono::{DateTime, Local};
use fnv::FnvHashSet;

use crate::keepassxc::{
    AccountInfo, AccountRecord, Attribute, CliRunner, EntryIdentity,
    GenerationRules, KeePassXC, KeePassXCOptions, KpxcError, ProcessRunner
};
pub(crate) use context::WindowContext;
pub(crate) use source::{ContextMatch, DatabaseListing, EntrySource, Freshness};

///
/// キャッシュしているエントリ一覧
///
#[derive(Clone, Debug)]
pub(crate) struct CacheState {
    /// エントリのリスト
    entries: Vec<EntryIdentity>,

    /// 取得時点でのデータベースの更新日時
    last_modified: Option<DateTime<Local>>,
}

impl CacheState {
    ///
    /// エントリのリストへのアクセサ
    ///
    pub(crate) fn entries(&self) -> &[EntryIdentity] {
        &self.entries
    }

    ///
    /// 記録済みの更新日時へのアクセサ
    ///
    pub(crate) fn last_modified(&self) -> Option<DateTime<Local>> {
        self.last_modified
    }
}

///
/// エントリの保存方法
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SaveMode {
    /// 新規追加
    Add,

    /// 既存エントリの編集
    Edit,
}

///
/// エントリ一覧の取得とキャッシュを担う構造体
///
/// # 注記
/// キャッシュの更新は`&mut self`を要求するため、同一リポジトリに対する更新が
/// 同時に走ることはない。
///
pub(crate) struct Repository<S: EntrySource, R: CliRunner = ProcessRunner> {
    /// keepassxc-cliのクライアント
    client: KeePassXC<R>,

    /// 一覧の取得元
    source: S,

    /// キャッシュ(未取得または無効化済みの場合は`None`)
    cache: Option<CacheState>,

    /// 直近の取得で発生した通知メッセージ
    notice: Option<String>,
}

impl<S: EntrySource, R: CliRunner> Repository<S, R> {
    ///
    /// オブジェクトの生成
    ///
    /// # 注記
    /// 生成直後のキャッシュは空で、最初のアクセスで取得が行われる。
    ///
    pub(crate) fn new(client: KeePassXC<R>, source: S) -> Self {
        Self { client, source, cache: None, notice: None }
    }

    ///
    /// クライアントへのアクセサ
    ///
    pub(crate) fn client(&self) -> &KeePassXC<R> {
        &self.client
    }

    ///
    /// 設定情報の差し替え
    ///
    /// # 注記
    /// データベース、資格情報、キーファイルのいずれかが変わった場合はキャッシュ
    /// を無効化する。
    ///
    pub(crate) fn set_options(&mut self, options: KeePassXCOptions) {
        if self.client.options().differs_in_source(&options) {
            log::debug!("settings changed, invalidate cache");
            self.invalidate();
        }

        self.client.set_options(options);
    }

    ///
    /// キャッシュの無効化
    ///
    pub(crate) fn invalidate(&mut self) {
        self.cache = None;
    }

    ///
    /// キャッシュが古くなっているかを判定する
    ///
    pub(crate) fn is_stale(&self) -> bool {
        matches!(
            self.source.freshness(self.cache.as_ref(), self.client.options()),
            Freshness::Stale { .. }
        )
    }

    ///
    /// 直近の取得で発生した通知メッセージを取り出す
    ///
    pub(crate) fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    ///
    /// キャッシュ済みのエントリのリスト
    ///
    fn cached(&self) -> &[EntryIdentity] {
        self.cache.as_ref().map(CacheState::entries).unwrap_or_default()
    }

    ///
    /// エントリ一覧の取得
    ///
    /// # 戻り値
    /// キャッシュが新しければキャッシュを、古ければ取得し直した一覧を返す。
    ///
    /// # 注記
    /// 取得に失敗した場合はキャッシュを更新せずにエラーを返すため、次回のアク
    /// セスで再び取得が行われる。エントリのリストと更新日時は同時に置き換える。
    ///
    pub(crate) fn entries(&mut self) -> Result<&[EntryIdentity], KpxcError> {
        let modified = match self.source.freshness(self.cache.as_ref(), self.client.options()) {
            Freshness::Fresh => {
                log::debug!("use cached entry list ({} entries)", self.cached().len());
                return Ok(self.cached());
            }

            Freshness::Stale { modified } => modified,
        };

        let listing = self.source.fetch(&self.client)?;

        log::info!("entry list refreshed ({} entries)", listing.entries.len());

        self.notice = listing.notice;
        self.cache = Some(CacheState {
            entries: listing.entries,
            last_modified: modified,
        });

        Ok(self.cached())
    }

    ///
    /// 一覧に現れるグループの列挙
    ///
    /// # 戻り値
    /// 初出順に重複を除いたグループ名のリストを返す(ルートは空文字列)。
    ///
    pub(crate) fn groups(&mut self) -> Result<Vec<String>, KpxcError> {
        let mut seen = FnvHashSet::default();

        Ok(self.entries()?
            .iter()
            .filter(|entry| seen.insert(entry.group().to_string()))
            .map(|entry| entry.group().to_string())
            .collect())
    }

    ///
    /// エントリの属性値の取得
    ///
    /// # 注記
    /// キャッシュを経由せず常にkeepassxc-cliを呼び出す。
    ///
    pub(crate) fn attribute(&self, entry_name: &str, attribute: Attribute)
        -> Result<String, KpxcError>
    {
        self.client.show_attribute(entry_name, attribute)
    }

    ///
    /// エントリの全属性の取得
    ///
    /// # 注記
    /// キャッシュを経由せず常にkeepassxc-cliを呼び出す。
    ///
    pub(crate) fn full_record(&self, entry_name: &str) -> Result<AccountRecord, KpxcError> {
        self.client.show_entry(entry_name)
    }

    ///
    /// エントリの追加/編集
    ///
    /// # 戻り値
    /// 保存したエントリのエントリ名を返す。
    ///
    /// # 注記
    /// 成功した場合はキャッシュを無効化する。
    ///
    pub(crate) fn save_entry(
        &mut self,
        mode: SaveMode,
        info: &AccountInfo,
        rules: Option<&GenerationRules>,
    ) -> Result<String, KpxcError> {
        let entry_name = match mode {
            SaveMode::Add => self.client.add_entry(info, rules)?,
            SaveMode::Edit => self.client.edit_entry(info, rules)?,
        };

        self.invalidate();
        Ok(entry_name)
    }
}
