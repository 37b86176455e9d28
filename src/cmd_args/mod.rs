/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! コマンドライン引数を取り扱うモジュール
//!

mod config;
mod logger;

use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use directories::BaseDirs;
use secrecy::{ExposeSecret, SecretString};

use crate::command::{
    add, clip, edit, generate, groups, key, list, matching, search, select,
    shell, show, CommandContext
};
use crate::dispatch::KeyEvent;
use crate::keepassxc::{
    AccountInfo, Attribute, GenerationRules, KeePassXCOptions, KpxcError
};
use crate::repository::WindowContext;
use config::Config;

/// keepassxc-cliの既定のコマンド名
pub(crate) const DEFAULT_CLI: &str = "keepassxc-cli";

/// 資格情報を読み出す既定の環境変数名
const DEFAULT_PASSWORD_ENV: &str = "KPXCMGR_PASSWORD";

/// 既定のログレベル
pub(crate) const DEFAULT_LOG_LEVEL: &str = "warn";

/// 既定のログ出力先(標準エラー出力)
pub(crate) const DEFAULT_LOG_OUTPUT: &str = "-";

/// デフォルトのデータパス
static DEFAULT_DATA_PATH: LazyLock<Option<PathBuf>> = LazyLock::new(|| {
    BaseDirs::new()
        .map(|dirs| dirs.data_local_dir().join(env!("CARGO_PKG_NAME")))
});

///
/// デフォルトのコンフィグレーションファイルのパス情報を生成
///
/// # 戻り値
/// コンフィギュレーションファイルのパス情報(ホームディレクトリが特定できない
/// 場合は`None`)
///
fn default_config_path() -> Option<PathBuf> {
    DEFAULT_DATA_PATH.as_ref().map(|path| path.join("config.toml"))
}

///
/// グローバルオプション情報を格納する構造体
///
/// # 注記
/// 資格情報はコマンドライン引数では受け取らない(環境変数または標準入力から読
/// み込む)。
///
#[derive(Parser, Debug)]
#[command(
    name = "kpxcmgr",
    about = "keepassxc-cliを用いたエントリの検索と属性の取り出し",
    version,
    long_about = None,
    subcommand_required = false,
    arg_required_else_help = true,
)]
pub struct Options {
    /// config.tomlを使用する場合のパス
    #[arg(short = 'c', long = "config")]
    config_path: Option<PathBuf>,

    /// keepassxc-cliのパス
    #[arg(long = "cli", value_name = "PATH")]
    cli: Option<PathBuf>,

    /// データベースファイルのパス
    #[arg(short = 'd', long = "database", value_name = "PATH")]
    database: Option<PathBuf>,

    /// キーファイルのパス
    #[arg(short = 'k', long = "key-file", value_name = "PATH")]
    key_file: Option<PathBuf>,

    /// 資格情報を読み出す環境変数名
    #[arg(long = "password-env", value_name = "VAR",
        default_value = DEFAULT_PASSWORD_ENV)]
    password_env: String,

    /// 資格情報を標準入力の1行目から読み込む
    #[arg(long = "password-stdin")]
    password_stdin: bool,

    /// ログレベル
    #[arg(long = "log-level", value_name = "LEVEL")]
    log_level: Option<String>,

    /// ログの出力先("-"で標準エラー出力)
    #[arg(long = "log-output", value_name = "PATH")]
    log_output: Option<PathBuf>,

    /// 出力形式をJSONに変更するか否かを表すフラグ
    #[arg(long = "json-output")]
    json: bool,

    /// 設定情報の表示
    #[arg(long = "show-options")]
    show_options: bool,

    /// デフォルト設定情報の保存
    #[arg(long = "save-default")]
    save_default: bool,

    /// 実行するサブコマンド
    #[command(subcommand)]
    command: Option<Command>,

    /// 標準入力から読み込んだ資格情報
    #[arg(skip)]
    password: Option<SecretString>,
}

impl Options {
    ///
    /// keepassxc-cliへのパスへのアクセサ
    ///
    /// # 戻り値
    /// 未指定の場合は既定のコマンド名を返す。
    ///
    pub(crate) fn cli(&self) -> PathBuf {
        self.cli.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CLI))
    }

    ///
    /// ログレベルへのアクセサ
    ///
    pub(crate) fn log_level(&self) -> String {
        self.log_level.clone().unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
    }

    ///
    /// ログの出力先へのアクセサ
    ///
    pub(crate) fn log_output(&self) -> PathBuf {
        self.log_output.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_OUTPUT))
    }

    ///
    /// JSON出力の指定有無を返す
    ///
    pub(crate) fn json(&self) -> bool {
        self.json
    }

    ///
    /// 資格情報の取得
    ///
    /// # 戻り値
    /// 標準入力から読み込み済みであればそれを、そうでなければ環境変数の値を返
    /// す。いずれも無い場合は空の資格情報を返す。
    ///
    fn password(&self) -> SecretString {
        if let Some(password) = &self.password {
            return SecretString::from(password.expose_secret().to_owned());
        }

        SecretString::from(std::env::var(&self.password_env).unwrap_or_default())
    }

    ///
    /// keepassxc-cliの呼び出しに用いる設定情報の生成
    ///
    /// # 戻り値
    /// 必須項目(keepassxc-cliのパス、データベース、資格情報)が揃っている場合は
    /// 設定情報を`Ok()`でラップして返す。
    ///
    pub(crate) fn keepassxc_options(&self) -> Result<KeePassXCOptions, KpxcError> {
        KeePassXCOptions::new(
            self.cli(),
            self.database.clone().unwrap_or_default(),
            self.password(),
            self.key_file.clone(),
        )
    }

    ///
    /// コンフィギュレーションファイルの適用
    ///
    /// # 戻り値
    /// 処理に成功した場合は`Ok(())`を返す。
    ///
    /// # 注記
    /// config.tomlを読み込みオプション情報に反映する。コマンドラインでの指定
    /// が優先される。
    ///
    fn apply_config(&mut self) -> Result<()> {
        let path = if let Some(path) = &self.config_path {
            // オプションでコンフィギュレーションファイルのパスが指定されて
            // いる場合、そのパスに何もなければエラー
            if !path.exists() {
                return Err(anyhow!("{} is not exists", path.display()));
            }

            path.clone()

        } else if let Some(path) = default_config_path() {
            path

        } else {
            return Ok(());
        };

        // この時点でパスに何も無い場合はそのまま何もせず正常終了
        if !path.exists() {
            return Ok(());
        }

        if !path.is_file() {
            return Err(anyhow!("{} is not file", path.display()));
        }

        let config = config::load(&path)
            .map_err(|err| anyhow!("{}: {}", path.display(), err))?;

        self.cli = self.cli.take().or_else(|| config.cli());
        self.database = self.database.take().or_else(|| config.database());
        self.key_file = self.key_file.take().or_else(|| config.key_file());
        self.log_level = self.log_level.take().or_else(|| config.log_level());
        self.log_output = self.log_output.take().or_else(|| config.log_output());

        Ok(())
    }

    ///
    /// オプション情報のバリデート
    ///
    /// # 戻り値
    /// オプション情報に矛盾が無い場合は`Ok(())`を返す。
    ///
    fn validate(&mut self) -> Result<()> {
        if self.show_options && self.save_default {
            return Err(anyhow!(
                "--show-options and --save-default can't be specified mutually"
            ));
        }

        if self.password_stdin && matches!(self.command, Some(Command::Shell)) {
            return Err(anyhow!(
                "--password-stdin can't be used with the shell command"
            ));
        }

        if let Some(command) = &mut self.command {
            let opts: Option<&mut dyn Validate> = match command {
                Command::Search(opts) => Some(opts),
                Command::Match(opts) => Some(opts),
                Command::Generate(opts) => Some(opts),
                Command::Add(opts) => Some(opts),
                Command::Edit(opts) => Some(opts),
                _ => None
            };

            if let Some(opts) = opts {
                opts.validate()?;
            }
        }

        Ok(())
    }

    ///
    /// 標準入力からの資格情報の読み込み
    ///
    fn read_password(&mut self) -> Result<()> {
        if !self.password_stdin {
            return Ok(());
        }

        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;

        let line = line.trim_end_matches(['\r', '\n']).to_string();
        self.password = Some(SecretString::from(line));

        Ok(())
    }

    ///
    /// オプション設定内容の表示
    ///
    fn show_options(&self) {
        let config_path = match (&self.config_path, default_config_path()) {
            (Some(path), _) => path.display().to_string(),
            (None, Some(path)) if path.exists() => path.display().to_string(),
            _ => "(none)".to_string(),
        };

        let database = self.database.as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "(none)".to_string());

        let key_file = self.key_file.as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "(none)".to_string());

        let password = if self.password().expose_secret().is_empty() {
            "(unset)"
        } else {
            "(set)"
        };

        println!("global options");
        println!("   config path:   {}", config_path);
        println!("   cli:           {}", self.cli().display());
        println!("   database path: {}", database);
        println!("   key file:      {}", key_file);
        println!("   password:      {} via {}", password, self.password_source());
        println!("   log level:     {}", self.log_level());
        println!("   log output:    {}", self.log_output().display());

        // サブコマンドが指定されており、そのサブコマンドがオプションを持つなら
        // そのオプションも表示する。
        if let Some(command) = &self.command {
            let opts: Option<&dyn ShowOptions> = match command {
                Command::Search(opts) => Some(opts),
                Command::Match(opts) => Some(opts),
                Command::Show(opts) => Some(opts),
                Command::Clip(opts) => Some(opts),
                Command::Key(opts) => Some(opts),
                Command::Generate(opts) => Some(opts),
                Command::Add(opts) => Some(opts),
                Command::Edit(opts) => Some(opts),
                _ => None,
            };

            if let Some(opts) = opts {
                println!();
                opts.show_options();
            }
        }
    }

    ///
    /// 資格情報の入手元の表示用文字列
    ///
    fn password_source(&self) -> String {
        if self.password_stdin {
            "stdin".to_string()
        } else {
            format!("${}", self.password_env)
        }
    }

    ///
    /// サブコマンドのコマンドコンテキストの生成
    ///
    pub(crate) fn build_context(&self) -> Result<Box<dyn CommandContext>> {
        match &self.command {
            Some(Command::List(opts)) => list::build_context(self, opts),
            Some(Command::Search(opts)) => search::build_context(self, opts),
            Some(Command::Match(opts)) => matching::build_context(self, opts),
            Some(Command::Show(opts)) => show::build_context(self, opts),
            Some(Command::Clip(opts)) => clip::build_context(self, opts),
            Some(Command::Key(opts)) => key::build_context(self, opts),
            Some(Command::Select(opts)) => select::build_context(self, opts),
            Some(Command::Generate(opts)) => generate::build_context(self, opts),
            Some(Command::Add(opts)) => add::build_context(self, opts),
            Some(Command::Edit(opts)) => edit::build_context(self, opts),
            Some(Command::Groups) => groups::build_context(self),
            Some(Command::Shell) => shell::build_context(self),
            None => Err(anyhow!("command not specified")),
        }
    }

    #[cfg(test)]
    ///
    /// テスト用に資格情報を設定する
    ///
    pub(crate) fn set_password_for_test(&mut self, password: &str) {
        self.password = Some(SecretString::from(password.to_string()));
    }
}

///
/// サブコマンドの定義
///
#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// 全エントリの一覧
    #[command(alias = "l", visible_alias = "ls")]
    List(ListOpts),

    /// エントリの絞り込み検索
    #[command(alias = "s")]
    Search(SearchOpts),

    /// ウィンドウ情報に基づくエントリの検索
    #[command(alias = "m")]
    Match(MatchOpts),

    /// エントリの属性の表示
    Show(ShowOpts),

    /// keepassxc-cliによるクリップボードへのコピー
    Clip(ClipOpts),

    /// キー入力の組み合わせに割り当てられた動作の実行
    #[command(alias = "k")]
    Key(KeyOpts),

    /// エントリのユーザ名とパスワードの入力
    Select(SelectOpts),

    /// パスワードの生成
    #[command(alias = "g")]
    Generate(GenerateOpts),

    /// エントリの追加
    #[command(alias = "a")]
    Add(AccountOpts),

    /// 既存エントリの編集
    #[command(alias = "e")]
    Edit(AccountOpts),

    /// グループの一覧
    Groups,

    /// 対話セッション
    Shell,
}

///
/// show_options()実装を要求するトレイト
///
trait ShowOptions {
    ///
    /// オプション設定内容の表示
    ///
    fn show_options(&self);
}

///
/// validate()実装を要求するトレイト
///
trait Validate {
    ///
    /// オプション設定内容の検証
    ///
    fn validate(&mut self) -> Result<()>;
}

///
/// サブコマンドlistのオプション
///
#[derive(Clone, Args, Debug)]
pub(crate) struct ListOpts {
    /// 表示対象のグループ(ルートは空文字列)
    #[arg(short = 'g', long = "group", value_name = "GROUP")]
    group: Option<String>,
}

impl ListOpts {
    ///
    /// 表示対象のグループへのアクセサ
    ///
    pub(crate) fn group(&self) -> Option<String> {
        self.group.clone()
    }

    #[cfg(test)]
    ///
    /// テスト用のコンストラクタ
    ///
    pub(crate) fn new_for_test(group: Option<&str>) -> Self {
        Self { group: group.map(str::to_string) }
    }
}

///
/// サブコマンドsearchのオプション
///
#[derive(Clone, Args, Debug)]
pub(crate) struct SearchOpts {
    /// 検索クエリ(引用符で囲んだ語は部分一致のみで照合)
    #[arg(required = true, num_args = 1..)]
    query: Vec<String>,
}

impl SearchOpts {
    ///
    /// 検索クエリへのアクセサ
    ///
    /// # 戻り値
    /// 空白で連結したクエリ文字列を返す
    ///
    pub(crate) fn query(&self) -> String {
        self.query.join(" ")
    }

    #[cfg(test)]
    ///
    /// テスト用のコンストラクタ
    ///
    pub(crate) fn new_for_test(query: &str) -> Self {
        Self { query: vec![query.to_string()] }
    }
}

// ShowOptionsトレイトの実装
impl ShowOptions for SearchOpts {
    fn show_options(&self) {
        println!("search command options");
        println!("   query:   {}", self.query());
    }
}

// Validateトレイトの実装
impl Validate for SearchOpts {
    fn validate(&mut self) -> Result<()> {
        if self.query().trim().is_empty() {
            return Err(anyhow!("search query is empty"));
        }

        Ok(())
    }
}

///
/// サブコマンドmatchのオプション
///
#[derive(Clone, Args, Debug)]
pub(crate) struct MatchOpts {
    /// ブラウザで表示中のURL
    #[arg(short = 'u', long = "url", value_name = "URL")]
    url: Option<String>,

    /// 操作中のウィンドウのタイトル
    #[arg(short = 't', long = "title", value_name = "TITLE")]
    title: Option<String>,
}

impl MatchOpts {
    ///
    /// ウィンドウ情報の取得
    ///
    /// # 注記
    /// URLが指定されている場合はURLを優先する。
    ///
    pub(crate) fn window_context(&self) -> Result<WindowContext> {
        match (&self.url, &self.title) {
            (Some(url), _) => Ok(WindowContext::Url(url.clone())),
            (None, Some(title)) => Ok(WindowContext::Title(title.clone())),
            (None, None) => Err(anyhow!("either --url or --title is required")),
        }
    }

    #[cfg(test)]
    ///
    /// テスト用のコンストラクタ
    ///
    pub(crate) fn new_for_test(url: Option<&str>, title: Option<&str>) -> Self {
        Self {
            url: url.map(str::to_string),
            title: title.map(str::to_string),
        }
    }
}

// ShowOptionsトレイトの実装
impl ShowOptions for MatchOpts {
    fn show_options(&self) {
        println!("match command options");
        println!("   url:     {}", self.url.as_deref().unwrap_or("(none)"));
        println!("   title:   {}", self.title.as_deref().unwrap_or("(none)"));
    }
}

// Validateトレイトの実装
impl Validate for MatchOpts {
    fn validate(&mut self) -> Result<()> {
        if self.url.is_some() && self.title.is_some() {
            return Err(anyhow!("--url and --title can't be specified mutually"));
        }

        self.window_context().map(|_| ())
    }
}

///
/// サブコマンドshowのオプション
///
#[derive(Clone, Args, Debug)]
pub(crate) struct ShowOpts {
    /// 表示する属性(未指定時は全属性)
    #[arg(short = 'a', long = "attribute", value_name = "NAME")]
    attribute: Option<Attribute>,

    /// パスワードを伏せずに表示する
    #[arg(long = "reveal")]
    reveal: bool,

    /// 対象のエントリ名("/group/title"形式)
    #[arg()]
    entry: String,
}

impl ShowOpts {
    ///
    /// 対象のエントリ名へのアクセサ
    ///
    pub(crate) fn entry(&self) -> String {
        self.entry.clone()
    }

    ///
    /// 表示する属性へのアクセサ
    ///
    pub(crate) fn attribute(&self) -> Option<Attribute> {
        self.attribute
    }

    ///
    /// パスワードを表示するか否か
    ///
    pub(crate) fn reveal(&self) -> bool {
        self.reveal
    }
}

// ShowOptionsトレイトの実装
impl ShowOptions for ShowOpts {
    fn show_options(&self) {
        let attribute = self.attribute
            .map(|attr| attr.to_string())
            .unwrap_or_else(|| "(all)".to_string());

        println!("show command options");
        println!("   entry:      {}", self.entry);
        println!("   attribute:  {}", attribute);
        println!("   reveal:     {}", self.reveal);
    }
}

///
/// サブコマンドclipのオプション
///
#[derive(Clone, Args, Debug)]
pub(crate) struct ClipOpts {
    /// コピーする属性
    #[arg(short = 'a', long = "attribute", value_name = "NAME",
        default_value = "password")]
    attribute: Attribute,

    /// 対象のエントリ名("/group/title"形式)
    #[arg()]
    entry: String,
}

impl ClipOpts {
    ///
    /// 対象のエントリ名へのアクセサ
    ///
    pub(crate) fn entry(&self) -> String {
        self.entry.clone()
    }

    ///
    /// コピーする属性へのアクセサ
    ///
    pub(crate) fn attribute(&self) -> Attribute {
        self.attribute
    }
}

// ShowOptionsトレイトの実装
impl ShowOptions for ClipOpts {
    fn show_options(&self) {
        println!("clip command options");
        println!("   entry:      {}", self.entry);
        println!("   attribute:  {}", self.attribute);
    }
}

///
/// サブコマンドkeyのオプション
///
#[derive(Clone, Args, Debug)]
pub(crate) struct KeyOpts {
    /// キー入力の組み合わせ("ctrl+shift+u"形式)
    #[arg(value_name = "COMBO")]
    combo: KeyEvent,

    /// 対象のエントリ名("/group/title"形式)
    #[arg()]
    entry: String,
}

impl KeyOpts {
    ///
    /// キー入力へのアクセサ
    ///
    pub(crate) fn combo(&self) -> KeyEvent {
        self.combo
    }

    ///
    /// 対象のエントリ名へのアクセサ
    ///
    pub(crate) fn entry(&self) -> String {
        self.entry.clone()
    }
}

// ShowOptionsトレイトの実装
impl ShowOptions for KeyOpts {
    fn show_options(&self) {
        println!("key command options");
        println!("   combo:   {}", self.combo);
        println!("   entry:   {}", self.entry);
    }
}

///
/// サブコマンドselectのオプション
///
#[derive(Clone, Args, Debug)]
pub(crate) struct SelectOpts {
    /// 対象のエントリ名("/group/title"形式)
    #[arg()]
    entry: String,
}

impl SelectOpts {
    ///
    /// 対象のエントリ名へのアクセサ
    ///
    pub(crate) fn entry(&self) -> String {
        self.entry.clone()
    }
}

///
/// パスワード生成ルールのオプション
///
/// # 注記
/// 文字種を1つも指定しない場合は既定の文字種(英大小文字、数字、記号)を用い
/// る。
///
#[derive(Clone, Args, Debug, Default)]
pub(crate) struct GenerateOpts {
    /// パスワード長(既定は16)
    #[arg(short = 'L', long = "length", value_name = "N")]
    length: Option<u32>,

    /// 英小文字を使用する
    #[arg(short = 'l', long = "lower")]
    lower: bool,

    /// 英大文字を使用する
    #[arg(short = 'U', long = "upper")]
    upper: bool,

    /// 数字を使用する
    #[arg(short = 'n', long = "numeric")]
    numeric: bool,

    /// 記号を使用する
    #[arg(short = 's', long = "special")]
    special: bool,

    /// 拡張ASCIIを使用する
    #[arg(short = 'e', long = "extended")]
    extended: bool,

    /// 除外する文字
    #[arg(short = 'x', long = "exclude", value_name = "CHARS")]
    exclude: Option<String>,

    /// 独自の文字セット
    #[arg(long = "custom", value_name = "CHARS")]
    custom: Option<String>,
}

impl GenerateOpts {
    ///
    /// 生成ルールの構築
    ///
    /// # 戻り値
    /// 長さを文字種に応じて丸めた生成ルールを返す。
    ///
    pub(crate) fn rules(&self) -> GenerationRules {
        let defaults = GenerationRules::default();
        let any_class = self.lower || self.upper || self.numeric
            || self.special || self.extended || self.custom.is_some();

        let rules = if any_class {
            GenerationRules {
                length: self.length.or(defaults.length),
                lower: self.lower,
                upper: self.upper,
                numeric: self.numeric,
                special: self.special,
                extended: self.extended,
                exclude: self.exclude.clone(),
                custom: self.custom.clone(),
            }
        } else {
            GenerationRules {
                length: self.length.or(defaults.length),
                exclude: self.exclude.clone(),
                ..defaults
            }
        };

        rules.normalized()
    }

    #[cfg(test)]
    ///
    /// テスト用のコンストラクタ
    ///
    pub(crate) fn new_for_test(length: Option<u32>, numeric_only: bool) -> Self {
        Self {
            length,
            numeric: numeric_only,
            ..Self::default()
        }
    }
}

// ShowOptionsトレイトの実装
impl ShowOptions for GenerateOpts {
    fn show_options(&self) {
        let rules = self.rules();

        println!("generate command options");
        println!("   length:     {}", rules.length.unwrap_or_default());
        println!("   lower:      {}", rules.lower);
        println!("   upper:      {}", rules.upper);
        println!("   numeric:    {}", rules.numeric);
        println!("   special:    {}", rules.special);
        println!("   extended:   {}", rules.extended);
        println!("   exclude:    {}", rules.exclude.as_deref().unwrap_or("(none)"));
        println!("   custom:     {}", rules.custom.as_deref().unwrap_or("(none)"));
    }
}

// Validateトレイトの実装
impl Validate for GenerateOpts {
    fn validate(&mut self) -> Result<()> {
        if self.length == Some(0) {
            return Err(anyhow!("password length must be greater than 0"));
        }

        Ok(())
    }
}

///
/// サブコマンドadd/editのオプション
///
#[derive(Clone, Args, Debug)]
pub(crate) struct AccountOpts {
    /// 所属グループ("/"区切り、省略時はルート)
    #[arg(short = 'g', long = "group", value_name = "GROUP")]
    group: Option<String>,

    /// ユーザ名
    #[arg(short = 'u', long = "username", value_name = "NAME")]
    username: Option<String>,

    /// URL
    #[arg(long = "url", value_name = "URL")]
    url: Option<String>,

    /// 備考
    #[arg(long = "notes", value_name = "TEXT")]
    notes: Option<String>,

    /// パスワードを生成して設定する
    #[arg(long = "generate")]
    generate: bool,

    /// パスワードの生成ルール
    #[command(flatten)]
    rules: GenerateOpts,

    /// パスワードを伏せずに表示する
    #[arg(long = "reveal")]
    reveal: bool,

    /// エントリのタイトル
    #[arg()]
    title: String,
}

impl AccountOpts {
    ///
    /// エントリの情報の構築
    ///
    pub(crate) fn account_info(&self) -> AccountInfo {
        AccountInfo {
            title: self.title.clone(),
            group: self.group.clone()
                .map(|group| group.trim_matches('/').to_string())
                .unwrap_or_default(),
            username: self.username.clone(),
            url: self.url.clone(),
            notes: self.notes.clone(),
        }
    }

    ///
    /// パスワードの生成ルール
    ///
    /// # 戻り値
    /// `--generate`が指定されている場合のみ`Some()`でラップして返す。
    ///
    pub(crate) fn rules(&self) -> Option<GenerationRules> {
        self.generate.then(|| self.rules.rules())
    }

    ///
    /// パスワードを表示するか否か
    ///
    pub(crate) fn reveal(&self) -> bool {
        self.reveal
    }

    #[cfg(test)]
    ///
    /// テスト用のコンストラクタ
    ///
    pub(crate) fn new_for_test(title: &str, group: Option<&str>, username: Option<&str>)
        -> Self
    {
        Self {
            group: group.map(str::to_string),
            username: username.map(str::to_string),
            url: None,
            notes: None,
            generate: false,
            rules: GenerateOpts::default(),
            reveal: false,
            title: title.to_string(),
        }
    }
}

// ShowOptionsトレイトの実装
impl ShowOptions for AccountOpts {
    fn show_options(&self) {
        let info = self.account_info();

        println!("account options");
        println!("   entry name: {}", info.entry_name());
        println!("   username:   {}", info.username.as_deref().unwrap_or("(unchanged)"));
        println!("   url:        {}", info.url.as_deref().unwrap_or("(unchanged)"));
        println!("   notes:      {}", info.notes.as_deref().unwrap_or("(unchanged)"));
        println!("   generate:   {}", self.generate);

        if self.generate {
            println!();
            self.rules.show_options();
        }
    }
}

// Validateトレイトの実装
impl Validate for AccountOpts {
    fn validate(&mut self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(anyhow!("entry title is empty"));
        }

        if self.title.contains('/') {
            return Err(anyhow!("entry title can't contain '/'"));
        }

        self.rules.validate()
    }
}

///
/// コマンドライン引数のパース処理
///
/// # 戻り値
/// オプション情報をまとめたオブジェクトを返す。
///
pub(crate) fn parse() -> Result<Arc<Options>> {
    let mut opts = Options::parse();

    /*
     * コンフィギュレーションファイルの適用
     */
    opts.apply_config()?;

    /*
     * ロガーの初期化
     */
    logger::init(&opts)?;

    /*
     * 設定情報のバリデーション
     */
    opts.validate()?;

    /*
     * 設定情報の表示
     */
    if opts.show_options {
        opts.show_options();
        std::process::exit(0);
    }

    /*
     * デフォルト設定の保存
     */
    if opts.save_default {
        let path = opts.config_path.clone()
            .or_else(default_config_path)
            .ok_or_else(|| anyhow!("can't determine the config path"))?;

        Config::default().save(&path)?;
        println!("write default config to {}", path.display());
        std::process::exit(0);
    }

    /*
     * 資格情報の読み込み
     */
    opts.read_password()?;

    /*
     * 設定情報の返却
     */
    Ok(Arc::new(opts))
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    ///
    /// 引数列からテスト用のオプション情報を生成する
    ///
    pub(crate) fn options_from(args: &[&str]) -> Options {
        let mut opts = Options::try_parse_from(
            std::iter::once("kpxcmgr").chain(args.iter().copied())
        ).unwrap();

        opts.validate().unwrap();
        opts
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::test::options_from;
    use super::*;

    ///
    /// 資格情報が無い場合に設定不足として扱われることを確認
    ///
    #[test]
    fn missing_password_is_reported() {
        let opts = options_from(&[
            "--password-env", "KPXCMGR_TEST_UNSET_VARIABLE", "-d", "/tmp/db.kdbx", "list",
        ]);

        let err = opts.keepassxc_options().unwrap_err();
        assert!(matches!(err, KpxcError::MissingSetting("password")));
    }

    ///
    /// データベース未指定が設定不足として扱われることを確認
    ///
    #[test]
    fn missing_database_is_reported() {
        let mut opts = options_from(&["list"]);
        opts.set_password_for_test("pw");

        let err = opts.keepassxc_options().unwrap_err();
        assert!(matches!(err, KpxcError::MissingSetting("database")));
    }

    ///
    /// コマンドラインの指定から設定情報が組み立てられることを確認
    ///
    #[test]
    fn keepassxc_options_from_arguments() {
        let mut opts = options_from(&[
            "--cli", "/opt/kp/keepassxc-cli", "-d", "/tmp/db.kdbx", "groups",
        ]);
        opts.set_password_for_test("pw");

        let options = opts.keepassxc_options().unwrap();
        assert_eq!(options.cli(), Path::new("/opt/kp/keepassxc-cli"));
        assert_eq!(options.database(), Path::new("/tmp/db.kdbx"));
        assert!(options.key_file().is_none());
        assert!(!format!("{:?}", opts).contains("\"pw\""));
    }

    ///
    /// 生成ルールの既定値と文字種指定を確認
    ///
    #[test]
    fn generate_rules() {
        let opts = GenerateOpts::default();
        assert_eq!(opts.rules(), GenerationRules::default());

        let opts = GenerateOpts::new_for_test(Some(4), true);
        let rules = opts.rules();
        assert_eq!(rules.length, Some(4));
        assert!(rules.numeric);
        assert!(!rules.lower && !rules.upper && !rules.special);

        // 記号を含む場合は最低長に丸められる
        let opts = GenerateOpts { length: Some(2), special: true, ..GenerateOpts::default() };
        assert_eq!(opts.rules().length, Some(6));
    }

    ///
    /// add/editのオプションからエントリ情報が組み立てられることを確認
    ///
    #[test]
    fn account_options() {
        let opts = options_from(&[
            "add", "-g", "/Work/Dev/", "-u", "octocat", "--generate", "-L", "24", "GitHub",
        ]);

        let Some(Command::Add(account)) = &opts.command else {
            panic!("unexpected command");
        };

        assert_eq!(account.account_info().entry_name(), "/Work/Dev/GitHub");
        assert_eq!(account.rules().unwrap().length, Some(24));

        let account = AccountOpts::new_for_test("Mail", None, None);
        assert!(account.rules().is_none());
        assert_eq!(account.account_info().entry_name(), "/Mail");
    }

    ///
    /// キー入力の組み合わせが引数として解釈されることを確認
    ///
    #[test]
    fn key_combo_argument() {
        let opts = options_from(&["key", "ctrl+shift+u", "/Work/Site"]);

        let Some(Command::Key(key)) = &opts.command else {
            panic!("unexpected command");
        };

        assert_eq!(key.combo().to_string(), "ctrl+shift+u");
        assert_eq!(key.entry(), "/Work/Site");
    }

    ///
    /// matchのURLとタイトルが同時に指定できないことを確認
    ///
    #[test]
    fn match_requires_single_source() {
        let mut opts = MatchOpts::new_for_test(Some("https://a.example"), Some("A"));
        assert!(opts.validate().is_err());

        let mut opts = MatchOpts::new_for_test(None, None);
        assert!(opts.validate().is_err());

        let mut opts = MatchOpts::new_for_test(None, Some("Inbox | Fastmail"));
        assert!(opts.validate().is_ok());
    }
}
