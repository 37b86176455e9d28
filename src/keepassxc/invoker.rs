/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! keepassxc-cliの起動処理をまとめたモジュール
//!

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use secrecy::ExposeSecret;

use super::error::KpxcError;
use super::parser::{parse_listing, parse_record, parse_record_strict};
use super::rules::{push_value, GenerationRules};
use super::types::{
    AccountInfo, AccountRecord, Attribute, EntryIdentity, KeePassXCOptions
};

/// アンロック時の対話プロンプトの書き出し(対応言語分)
const UNLOCK_PROMPTS: [&str; 2] = [
    "Enter password to unlock",
    "输入密码以解锁",
];

///
/// 外部コマンドの実行を抽象化するトレイト
///
pub(crate) trait CliRunner {
    ///
    /// 外部コマンドを実行し標準出力を返す
    ///
    /// # 引数
    /// * `program` - 実行ファイルへのパス
    /// * `args` - コマンドライン引数
    /// * `input` - 標準入力に書き込む1行(資格情報)
    ///
    /// # 戻り値
    /// 正常終了した場合は標準出力の内容を`Ok()`でラップして返す。起動できなか
    /// った場合や異常終了した場合はエラー情報を`Err()`でラップして返す。
    ///
    fn run(&self, program: &Path, args: &[String], input: Option<&str>)
        -> Result<String, KpxcError>;
}

///
/// 子プロセスとして外部コマンドを実行するランナー
///
#[derive(Debug, Default)]
pub(crate) struct ProcessRunner;

impl CliRunner for ProcessRunner {
    fn run(&self, program: &Path, args: &[String], input: Option<&str>)
        -> Result<String, KpxcError>
    {
        let spawn_error = |source| KpxcError::Spawn {
            program: program.display().to_string(),
            source,
        };

        let stdin = if input.is_some() { Stdio::piped() } else { Stdio::null() };

        let mut child = Command::new(program)
            .args(args)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        /*
         * 資格情報は引数ではなく標準入力で渡す
         */
        if let (Some(mut pipe), Some(input)) = (child.stdin.take(), input) {
            // 先に終了したプロセスへの書き込み失敗は終了ステータスで判断する
            if let Err(err) = writeln!(pipe, "{}", input) {
                log::debug!("write to stdin failed: {}", err);
            }
        }

        let output = child.wait_with_output().map_err(spawn_error)?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let mut message = sanitize_message(&stderr);

        if message.trim().is_empty() {
            message = format!("{} exited with {}", program.display(), output.status);
        }

        Err(KpxcError::from_failure(output.status.code(), message))
    }
}

///
/// エラーメッセージからアンロックのプロンプトを取り除く
///
/// # 注記
/// プロンプト行は取り除くが、プロンプトに続けて同じ行に出力されたメッセージ
/// は残す。
///
pub(crate) fn sanitize_message(message: &str) -> String {
    message.lines()
        .filter_map(|line| {
            let line = line.trim_end_matches('\r');

            if !UNLOCK_PROMPTS.iter().any(|prompt| line.starts_with(prompt)) {
                return Some(line);
            }

            line.split_once(": ")
                .map(|(_, rest)| rest)
                .filter(|rest| !rest.trim().is_empty())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

///
/// パスワードの生成
///
/// # 引数
/// * `runner` - コマンドランナー
/// * `cli` - keepassxc-cliの実行ファイルへのパス
/// * `rules` - 生成ルール
///
/// # 注記
/// データベースも資格情報も使用しないため、設定情報が揃っていなくても呼び出
/// せる。
///
pub(crate) fn generate_password<R: CliRunner>(
    runner: &R,
    cli: &Path,
    rules: &GenerationRules,
) -> Result<String, KpxcError> {
    let mut args = vec!["generate".to_string()];
    args.extend(rules.to_args());

    log::debug!("run {} {:?}", cli.display(), args);

    let stdout = runner.run(cli, &args, None)?;
    Ok(stdout.trim().to_string())
}

///
/// keepassxc-cliのサブコマンド呼び出しを提供する構造体
///
#[derive(Debug)]
pub(crate) struct KeePassXC<R: CliRunner = ProcessRunner> {
    /// コマンドランナー
    runner: R,

    /// 呼び出しに用いる設定情報
    options: KeePassXCOptions,
}

impl KeePassXC<ProcessRunner> {
    ///
    /// 子プロセスで実行するクライアントの生成
    ///
    pub(crate) fn new(options: KeePassXCOptions) -> Self {
        Self::with_runner(ProcessRunner, options)
    }
}

impl<R: CliRunner> KeePassXC<R> {
    ///
    /// 任意のランナーを用いるクライアントの生成
    ///
    pub(crate) fn with_runner(runner: R, options: KeePassXCOptions) -> Self {
        Self { runner, options }
    }

    ///
    /// 設定情報へのアクセサ
    ///
    pub(crate) fn options(&self) -> &KeePassXCOptions {
        &self.options
    }

    ///
    /// 設定情報の差し替え
    ///
    pub(crate) fn set_options(&mut self, options: KeePassXCOptions) {
        self.options = options;
    }

    ///
    /// ランナーへのアクセサ
    ///
    #[cfg(test)]
    pub(crate) fn runner(&self) -> &R {
        &self.runner
    }

    ///
    /// データベースを対象とするサブコマンドの実行
    ///
    /// # 引数
    /// * `subcommand` - サブコマンド名
    /// * `extra` - データベースパス(およびキーファイル指定)の後に続く引数
    ///
    /// # 戻り値
    /// 標準出力の内容を返す。
    ///
    /// # 注記
    /// 失敗しても再試行は行わない。
    ///
    pub(crate) fn run(&self, subcommand: &str, extra: &[String])
        -> Result<String, KpxcError>
    {
        let mut args = vec![
            subcommand.to_string(),
            self.options.database().display().to_string(),
        ];

        if let Some(key_file) = self.options.key_file() {
            args.push("--key-file".to_string());
            args.push(key_file.display().to_string());
        }

        args.extend_from_slice(extra);

        log::debug!("run {} {:?} (credential via stdin)", self.options.cli().display(), args);

        self.runner.run(
            self.options.cli(),
            &args,
            Some(self.options.password().expose_secret()),
        )
    }

    ///
    /// キーワードによるエントリ検索
    ///
    /// # 戻り値
    /// ヒットしたエントリのリストを返す。ヒットしなかった場合は
    /// `KpxcError::NoResults`を返す。
    ///
    pub(crate) fn search_entries(&self, keyword: &str)
        -> Result<Vec<EntryIdentity>, KpxcError>
    {
        let stdout = self.run("search", &[keyword.to_string()])?;
        Ok(parse_listing(stdout.trim()))
    }

    ///
    /// 全エントリの一覧
    ///
    /// # 注記
    /// 空キーワードによる検索で取得する。エントリが無い場合は空のリストを返す。
    ///
    pub(crate) fn entry_list(&self) -> Result<Vec<EntryIdentity>, KpxcError> {
        match self.search_entries("") {
            Err(KpxcError::NoResults) => Ok(Vec::new()),
            result => result,
        }
    }

    ///
    /// エントリの属性値の取得
    ///
    pub(crate) fn show_attribute(&self, entry_name: &str, attribute: Attribute)
        -> Result<String, KpxcError>
    {
        let mut args = vec![entry_name.to_string()];

        if attribute == Attribute::Totp {
            args.push("--totp".to_string());
        } else {
            args.push("--attributes".to_string());
            args.push(attribute.as_str().to_string());
        }

        let stdout = self.run("show", &args)?;
        Ok(stdout.trim_end().to_string())
    }

    ///
    /// エントリの全属性の取得
    ///
    /// # 注記
    /// 出力の行構成が想定と異なる場合は警告を記録した上で、取り出せるフィール
    /// ドだけを埋めたレコードを返す。
    ///
    pub(crate) fn show_entry(&self, entry_name: &str)
        -> Result<AccountRecord, KpxcError>
    {
        let stdout = self.run(
            "show",
            &[entry_name.to_string(), "--show-protected".to_string()],
        )?;

        match parse_record_strict(&stdout) {
            Ok(record) => Ok(record),
            Err(err) => {
                log::warn!("{} ({}), fall back to best-effort parsing", err, entry_name);
                Ok(parse_record(&stdout))
            }
        }
    }

    ///
    /// keepassxc-cli側でのクリップボードへのコピー
    ///
    pub(crate) fn clip_attribute(&self, entry_name: &str, attribute: Attribute)
        -> Result<String, KpxcError>
    {
        let mut args = vec![entry_name.to_string()];

        if attribute == Attribute::Totp {
            args.push("--totp".to_string());
        } else {
            args.push("--attribute".to_string());
            args.push(attribute.as_str().to_string());
        }

        let stdout = self.run("clip", &args)?;
        Ok(stdout.trim().to_string())
    }

    ///
    /// エントリの追加
    ///
    /// # 戻り値
    /// 追加したエントリのエントリ名を返す。
    ///
    pub(crate) fn add_entry(&self, info: &AccountInfo, rules: Option<&GenerationRules>)
        -> Result<String, KpxcError>
    {
        self.operate_entry("add", info, rules)
    }

    ///
    /// エントリの編集
    ///
    /// # 戻り値
    /// 編集したエントリのエントリ名を返す。
    ///
    pub(crate) fn edit_entry(&self, info: &AccountInfo, rules: Option<&GenerationRules>)
        -> Result<String, KpxcError>
    {
        self.operate_entry("edit", info, rules)
    }

    ///
    /// エントリの追加/編集の共通処理
    ///
    fn operate_entry(
        &self,
        subcommand: &str,
        info: &AccountInfo,
        rules: Option<&GenerationRules>,
    ) -> Result<String, KpxcError> {
        let entry_name = info.entry_name();
        let mut args = vec![entry_name.clone()];

        push_value(&mut args, "--username", info.username.as_deref());
        push_value(&mut args, "--url", info.url.as_deref());
        push_value(&mut args, "--notes", info.notes.as_deref());

        if let Some(rules) = rules {
            args.push("--generate".to_string());
            args.extend(rules.to_args());
        }

        let stdout = self.run(subcommand, &args)?;
        log::info!("{} {}: {}", subcommand, entry_name, stdout.trim());

        Ok(entry_name)
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::path::{Path, PathBuf};

    use secrecy::SecretString;

    use super::*;

    ///
    /// 記録された1回分の呼び出し
    ///
    #[derive(Clone, Debug)]
    pub(crate) struct Call {
        pub(crate) program: PathBuf,
        pub(crate) args: Vec<String>,
        pub(crate) input: Option<String>,
    }

    /// 呼び出しを記録し、予め積んだ結果を順に返すランナー（テスト用）
    #[derive(Default)]
    pub(crate) struct FakeRunner {
        calls: RefCell<Vec<Call>>,
        results: RefCell<VecDeque<Result<String, KpxcError>>>,
    }

    impl FakeRunner {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn push_ok(&self, stdout: &str) {
            self.results.borrow_mut().push_back(Ok(stdout.to_string()));
        }

        pub(crate) fn push_err(&self, err: KpxcError) {
            self.results.borrow_mut().push_back(Err(err));
        }

        pub(crate) fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl CliRunner for FakeRunner {
        fn run(&self, program: &Path, args: &[String], input: Option<&str>)
            -> Result<String, KpxcError>
        {
            self.calls.borrow_mut().push(Call {
                program: program.to_path_buf(),
                args: args.to_vec(),
                input: input.map(str::to_string),
            });

            self.results
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    pub(crate) fn options_for_test(database: &Path) -> KeePassXCOptions {
        KeePassXCOptions::new(
            "keepassxc-cli",
            database,
            SecretString::from("s3cr3t".to_string()),
            None,
        ).unwrap()
    }

    pub(crate) fn client_for_test() -> KeePassXC<FakeRunner> {
        KeePassXC::with_runner(FakeRunner::new(), options_for_test(Path::new("/tmp/db.kdbx")))
    }
}
