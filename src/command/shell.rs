/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! shellサブコマンド(対話セッション)の実装
//!

use anyhow::{anyhow, Context, Result};
use strsim::jaro_winkler;

use crate::cmd_args::Options;
use crate::dispatch::{Dispatcher, KeyEvent};
use crate::host::{ConsoleHost, HostRuntime};
use crate::keepassxc::{CliRunner, EntryIdentity, ProcessRunner};
use crate::repository::{DatabaseListing, Repository};
use crate::search::SearchEngine;
use super::key::{describe, dispatch_key};
use super::prompt::{Prompter, StdPrompter};
use super::util::{group_label, is_blank};
use super::{open_repository, print_lines, CommandContext};

/// プロンプト文字列
const PROMPT: &str = "kpxcmgr> ";

/// セッションで受け付けるコマンド
const COMMANDS: [&str; 10] = [
    "list", "search", "select", "key", "refresh", "groups", "open", "status", "help", "quit",
];

/// コマンド名の候補を提示する際の類似度の閾値
const SUGGEST_THRESHOLD: f64 = 0.8;

/// ヘルプメッセージ
const HELP: [&str; 11] = [
    "list                 全エントリの一覧(更新があった場合のみ再取得)",
    "/<query>             エントリの絞り込み",
    "search <query>       エントリの絞り込み",
    "select <n>           n番目のエントリのユーザ名とパスワードを入力",
    "key <combo> <n>      n番目のエントリに対してキー入力の動作を実行",
    "refresh              一覧を強制的に再取得",
    "groups               グループの一覧",
    "open <path>          対象のデータベースファイルを切り替える",
    "status               一覧の取得状況を表示",
    "help                 このメッセージ",
    "quit                 終了",
];

///
/// 1行分の入力の処理結果
///
#[derive(Debug, PartialEq, Eq)]
enum Step {
    /// 出力して継続
    Print(Vec<String>),

    /// セッションの終了
    Quit,
}

///
/// shellサブコマンドのコンテキスト情報をパックした構造体
///
/// # 注記
/// セッションの間1つのリポジトリを保持し続けるため、データベースに更新が無
/// い限り一覧の取得は最初の1回で済む。
///
struct ShellCommandContext<
    R: CliRunner = ProcessRunner,
    H: HostRuntime = ConsoleHost,
    P: Prompter = StdPrompter,
> {
    /// エントリリポジトリ
    repository: Repository<DatabaseListing, R>,

    /// 検索エンジン
    engine: SearchEngine,

    /// ディスパッチャ
    dispatcher: Dispatcher,

    /// ホスト
    host: H,

    /// 入力行の読み込み元
    prompter: P,

    /// 直近に表示したエントリのリスト(番号指定の対象)
    view: Vec<EntryIdentity>,
}

impl ShellCommandContext {
    ///
    /// オブジェクトの生成
    ///
    fn new(opts: &Options) -> Result<Self> {
        Ok(Self {
            repository: open_repository(opts, DatabaseListing)?,
            engine: SearchEngine::new(),
            dispatcher: Dispatcher::new(),
            host: ConsoleHost,
            prompter: StdPrompter,
            view: Vec::new(),
        })
    }
}

impl<R, H, P> ShellCommandContext<R, H, P>
where
    R: CliRunner,
    H: HostRuntime,
    P: Prompter,
{
    ///
    /// 1行分の入力の処理
    ///
    fn handle(&mut self, line: &str) -> Result<Step> {
        let line = line.trim();

        if is_blank(line) {
            return Ok(Step::Print(Vec::new()));
        }

        if let Some(query) = line.strip_prefix('/') {
            return self.search(query).map(Step::Print);
        }

        let (command, rest) = line.split_once(char::is_whitespace)
            .map(|(command, rest)| (command, rest.trim()))
            .unwrap_or((line, ""));

        match command {
            "list" | "ls" => self.list().map(Step::Print),
            "search" | "s" => self.search(rest).map(Step::Print),
            "select" => self.select(rest).map(Step::Print),
            "key" | "k" => self.key(rest).map(Step::Print),
            "refresh" => {
                self.repository.invalidate();
                self.list().map(Step::Print)
            }
            "groups" => self.groups().map(Step::Print),
            "open" => self.open(rest).map(Step::Print),
            "status" => Ok(Step::Print(self.status())),
            "help" | "?" => Ok(Step::Print(HELP.iter().map(|line| line.to_string()).collect())),
            "quit" | "exit" | "q" => Ok(Step::Quit),
            _ => Err(unknown_command(command)),
        }
    }

    ///
    /// 全エントリの一覧
    ///
    fn list(&mut self) -> Result<Vec<String>> {
        self.view = self.repository.entries()?.to_vec();
        Ok(self.numbered())
    }

    ///
    /// エントリの絞り込み
    ///
    /// # 注記
    /// クエリが空の場合は全エントリの一覧と同じ扱いとする。
    ///
    fn search(&mut self, query: &str) -> Result<Vec<String>> {
        if is_blank(query) {
            return self.list();
        }

        let entries = self.repository.entries()?;
        self.view = self.engine.search(entries, query)
            .into_iter()
            .cloned()
            .collect();

        Ok(self.numbered())
    }

    ///
    /// グループの一覧
    ///
    fn groups(&mut self) -> Result<Vec<String>> {
        Ok(self.repository.groups()?
            .iter()
            .map(|group| group_label(group).to_string())
            .collect())
    }

    ///
    /// データベースファイルの切り替え
    ///
    /// # 注記
    /// 資格情報とキーファイルはそのまま引き継ぐ。データベースが変わった場合は
    /// キャッシュが無効化され、次の一覧で取得し直す。
    ///
    fn open(&mut self, path: &str) -> Result<Vec<String>> {
        if is_blank(path) {
            return Err(anyhow!("usage: open <path>"));
        }

        let options = self.repository.client().options().clone().with_database(path);
        self.repository.set_options(options);
        self.view.clear();

        self.list()
    }

    ///
    /// 一覧の取得状況
    ///
    fn status(&self) -> Vec<String> {
        let database = self.repository.client().options().database().display().to_string();
        let state = if self.repository.is_stale() {
            "一覧は次回の表示時に取得し直します"
        } else {
            "一覧はキャッシュ済みです"
        };

        vec![database, state.to_string()]
    }

    ///
    /// エントリ選択時の処理
    ///
    fn select(&mut self, number: &str) -> Result<Vec<String>> {
        let entry = self.pick(number)?;
        let outcome = self.dispatcher.select(&self.repository, &self.host, &entry);

        Ok(describe(&outcome).into_iter().collect())
    }

    ///
    /// キー入力に割り当てられた動作の実行
    ///
    fn key(&mut self, args: &str) -> Result<Vec<String>> {
        let (combo, number) = args.split_once(char::is_whitespace)
            .ok_or_else(|| anyhow!("usage: key <combo> <n>"))?;

        let combo: KeyEvent = combo.parse()?;
        let entry = self.pick(number.trim())?;
        let outcome = dispatch_key(&self.dispatcher, &self.repository, &self.host, &combo, &entry)?;

        Ok(describe(&outcome).into_iter().collect())
    }

    ///
    /// 番号で指定されたエントリのエントリ名
    ///
    /// # 引数
    /// * `number` - 直近に表示した一覧での番号(1始まり)
    ///
    fn pick(&self, number: &str) -> Result<String> {
        let index = number.parse::<usize>()
            .with_context(|| format!("invalid entry number: \"{}\"", number))?;

        index.checked_sub(1)
            .and_then(|index| self.view.get(index))
            .map(|entry| entry.entry_name().to_string())
            .ok_or_else(|| anyhow!("entry number {} is out of range", index))
    }

    ///
    /// 番号付きの一覧の出力行
    ///
    fn numbered(&self) -> Vec<String> {
        if self.view.is_empty() {
            return vec!["(該当するエントリはありません)".to_string()];
        }

        self.view.iter()
            .enumerate()
            .map(|(index, entry)| format!("{:>3}  {}", index + 1, entry.entry_name()))
            .collect()
    }
}

// CommandContextトレイトの実装
impl<R, H, P> CommandContext for ShellCommandContext<R, H, P>
where
    R: CliRunner,
    H: HostRuntime,
    P: Prompter,
{
    fn exec(&mut self) -> Result<()> {
        while let Some(line) = self.prompter.read_line(PROMPT)? {
            match self.handle(&line) {
                Ok(Step::Print(lines)) => print_lines(&lines),
                Ok(Step::Quit) => break,
                Err(err) => {
                    log::warn!("{:#}", err);
                    eprintln!("error: {:#}", err);
                }
            }
        }

        Ok(())
    }
}

///
/// 未知のコマンドに対するエラーの生成
///
/// # 注記
/// 綴りの近いコマンドがあれば候補として提示する。
///
fn unknown_command(command: &str) -> anyhow::Error {
    let suggestion = COMMANDS.iter()
        .map(|name| (*name, jaro_winkler(name, command)))
        .filter(|(_, score)| *score >= SUGGEST_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1));

    match suggestion {
        Some((name, _)) => anyhow!("unknown command: {} (did you mean \"{}\"?)", command, name),
        None => anyhow!("unknown command: {} (type \"help\" for usage)", command),
    }
}

///
/// コマンドコンテキストの生成
///
pub(crate) fn build_context(opts: &Options) -> Result<Box<dyn CommandContext>> {
    Ok(Box::new(ShellCommandContext::new(opts)?))
}
