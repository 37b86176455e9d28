/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! keepassxc-cliとの間でやり取りする型を定義するモジュール
//!

use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Error};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use super::error::KpxcError;

///
/// keepassxc-cliの呼び出しに必要な設定情報をまとめた構造体
///
/// # 注記
/// 資格情報は`SecretString`で保持し、`Debug`出力では伏せ字になる。
///
#[derive(Debug)]
pub(crate) struct KeePassXCOptions {
    /// keepassxc-cliの実行ファイルへのパス
    cli: PathBuf,

    /// データベースファイルへのパス
    database: PathBuf,

    /// データベースのアンロックに用いる資格情報
    password: SecretString,

    /// キーファイルへのパス
    key_file: Option<PathBuf>,
}

impl KeePassXCOptions {
    ///
    /// オブジェクトの生成
    ///
    /// # 引数
    /// * `cli` - keepassxc-cliの実行ファイルへのパス
    /// * `database` - データベースファイルへのパス
    /// * `password` - データベースのアンロックに用いる資格情報
    /// * `key_file` - キーファイルへのパス(空パスは未指定として扱う)
    ///
    /// # 戻り値
    /// 必須項目が揃っている場合はオブジェクトを`Ok()`でラップして返す。欠けて
    /// いる場合は`KpxcError::MissingSetting`を返す。
    ///
    pub(crate) fn new<P, Q>(
        cli: P,
        database: Q,
        password: SecretString,
        key_file: Option<PathBuf>,
    ) -> Result<Self, KpxcError>
    where
        P: Into<PathBuf>,
        Q: Into<PathBuf>,
    {
        let cli = cli.into();
        let database = database.into();

        if cli.as_os_str().is_empty() {
            return Err(KpxcError::MissingSetting("cli"));
        }

        if database.as_os_str().is_empty() {
            return Err(KpxcError::MissingSetting("database"));
        }

        if password.expose_secret().is_empty() {
            return Err(KpxcError::MissingSetting("password"));
        }

        let key_file = key_file.filter(|path| !path.as_os_str().is_empty());

        Ok(Self { cli, database, password, key_file })
    }

    ///
    /// keepassxc-cliへのパスへのアクセサ
    ///
    pub(crate) fn cli(&self) -> &Path {
        &self.cli
    }

    ///
    /// データベースファイルへのパスへのアクセサ
    ///
    pub(crate) fn database(&self) -> &Path {
        &self.database
    }

    ///
    /// 資格情報へのアクセサ
    ///
    pub(crate) fn password(&self) -> &SecretString {
        &self.password
    }

    ///
    /// キーファイルへのパスへのアクセサ
    ///
    pub(crate) fn key_file(&self) -> Option<&Path> {
        self.key_file.as_deref()
    }

    ///
    /// データベースファイルを差し替えた設定情報を返す
    ///
    pub(crate) fn with_database<P>(mut self, database: P) -> Self
    where
        P: Into<PathBuf>,
    {
        self.database = database.into();
        self
    }

    ///
    /// キャッシュの無効化が必要な差分があるかを判定する
    ///
    /// # 戻り値
    /// データベース、資格情報、キーファイルのいずれかが異なる場合は`true`を返
    /// す。
    ///
    pub(crate) fn differs_in_source(&self, other: &Self) -> bool {
        self.database != other.database
            || self.key_file != other.key_file
            || self.password.expose_secret() != other.password.expose_secret()
    }
}

// Cloneトレイトの実装
impl Clone for KeePassXCOptions {
    fn clone(&self) -> Self {
        Self {
            cli: self.cli.clone(),
            database: self.database.clone(),
            password: SecretString::from(self.password.expose_secret().to_owned()),
            key_file: self.key_file.clone(),
        }
    }
}

///
/// 一覧表示用のエントリ識別情報
///
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub(crate) struct EntryIdentity {
    /// エントリのタイトル
    title: String,

    /// 所属グループ("/"区切り、ルートの場合は空文字列)
    #[serde(rename = "description")]
    group: String,

    /// "/group/.../title"形式のエントリ名
    #[serde(rename = "entryName")]
    entry_name: String,
}

impl EntryIdentity {
    ///
    /// タイトルとグループからオブジェクトを生成する
    ///
    pub(crate) fn new<T, G>(title: T, group: G) -> Self
    where
        T: Into<String>,
        G: Into<String>,
    {
        let title = title.into();
        let group = group.into();
        let entry_name = entry_name(&title, &group);

        Self { title, group, entry_name }
    }

    ///
    /// タイトルへのアクセサ
    ///
    pub(crate) fn title(&self) -> &str {
        &self.title
    }

    ///
    /// グループへのアクセサ
    ///
    pub(crate) fn group(&self) -> &str {
        &self.group
    }

    ///
    /// エントリ名へのアクセサ
    ///
    pub(crate) fn entry_name(&self) -> &str {
        &self.entry_name
    }
}

///
/// タイトルとグループからエントリ名を生成する
///
/// # 戻り値
/// グループが空の場合は"/title"、それ以外は"/group/title"を返す。
///
pub(crate) fn entry_name(title: &str, group: &str) -> String {
    if group.is_empty() {
        format!("/{title}")
    } else {
        format!("/{group}/{title}")
    }
}

///
/// エントリの全属性をまとめた構造体
///
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub(crate) struct AccountRecord {
    pub(crate) title: String,
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) url: String,
    pub(crate) notes: String,
    pub(crate) uuid: String,
    pub(crate) tags: String,
}

///
/// エントリの追加/編集時に指定する情報
///
#[derive(Clone, Debug, Default)]
pub(crate) struct AccountInfo {
    /// タイトル
    pub(crate) title: String,

    /// 所属グループ(空文字列でルート)
    pub(crate) group: String,

    /// ユーザ名
    pub(crate) username: Option<String>,

    /// URL
    pub(crate) url: Option<String>,

    /// 備考
    pub(crate) notes: Option<String>,
}

impl AccountInfo {
    ///
    /// 対象となるエントリ名を返す
    ///
    pub(crate) fn entry_name(&self) -> String {
        entry_name(&self.title, &self.group)
    }
}

///
/// 個別に取り出し可能な属性を表す列挙型
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Attribute {
    Title,
    UserName,
    Password,
    Url,
    Notes,

    /// ワンタイムパスワード(レコードには保存されていない)
    Totp,
}

impl Attribute {
    ///
    /// keepassxc-cliに渡す属性名を返す
    ///
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::UserName => "username",
            Self::Password => "password",
            Self::Url => "url",
            Self::Notes => "notes",
            Self::Totp => "totp",
        }
    }
}

// Displayトレイトの実装
impl Display for Attribute {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// FromStrトレイトの実装
impl FromStr for Attribute {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "title" => Ok(Self::Title),
            "username" | "user" => Ok(Self::UserName),
            "password" | "pass" => Ok(Self::Password),
            "url" => Ok(Self::Url),
            "notes" => Ok(Self::Notes),
            "totp" | "otp" => Ok(Self::Totp),
            _ => Err(anyhow!("unknown attribute: {s}")),
        }
    }
}
