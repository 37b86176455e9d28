/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! ロガーの初期化処理をまとめたモジュール
//!

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use flexi_logger::{
    Cleanup, Criterion, DeferredNow, FileSpec, Logger, LoggerHandle, Naming, WriteMode
};
use log::Record;

use super::Options;

/// ログファイル1本あたりの最大サイズ(バイト)
const MAX_LOG_SIZE: u64 = 2 * 1024 * 1024;

/// 保管するログファイルの最大数
const MAX_LOG_FILES: usize = 10;

/// ローテーション時のファイル名に付与するタイムスタンプの形式
const ROTATE_STAMP: &str = "%Y%m%d-%H%M%S";

///
/// ログの出力先
///
#[derive(Debug, PartialEq, Eq)]
enum LogTarget {
    /// 標準エラー出力(標準出力は入力用のテキストに使うため)
    Stderr,

    /// 単一ファイルへの追記
    File(PathBuf),

    /// ディレクトリ内へのローテーション付き出力
    Rotate(PathBuf),
}

impl LogTarget {
    ///
    /// 出力先の指定からの振り分け
    ///
    /// # 注記
    /// "-"は標準エラー出力、既存のファイルはそのファイル、既存のディレクトリ
    /// はローテーション付きの出力とする。存在しないパスは拡張子があればファイ
    /// ル、無ければディレクトリとして扱う。
    ///
    fn select(path: &Path) -> Result<Self> {
        if path == Path::new("-") {
            return Ok(Self::Stderr);
        }

        match (path.exists(), path.is_file(), path.is_dir()) {
            (true, true, _) => Ok(Self::File(path.to_path_buf())),
            (true, _, true) => Ok(Self::Rotate(path.to_path_buf())),
            (true, _, _) => Err(anyhow!("invalid log output path: {}", path.display())),
            (false, _, _) if path.extension().is_some() => Ok(Self::File(path.to_path_buf())),
            (false, _, _) => Ok(Self::Rotate(path.to_path_buf())),
        }
    }

    ///
    /// 出力先に応じたロガーの開始
    ///
    fn start(&self, level: &str) -> Result<LoggerHandle> {
        let logger = Logger::try_with_env_or_str(level)?
            .format(format)
            .write_mode(WriteMode::Direct);

        let handle = match self {
            Self::Stderr => logger.log_to_stderr().start()?,

            Self::File(path) => logger
                .log_to_file(FileSpec::try_from(prepare_file(path)?)?)
                .append()
                .start()?,

            Self::Rotate(path) => logger
                .log_to_file(FileSpec::try_from(prepare_dir(path)?.join("log"))?.suffix("txt"))
                .append()
                .rotate(
                    Criterion::Size(MAX_LOG_SIZE),
                    Naming::TimestampsCustomFormat {
                        current_infix: None,
                        format: ROTATE_STAMP,
                    },
                    Cleanup::KeepLogFiles(MAX_LOG_FILES),
                )
                .start()?,
        };

        Ok(handle)
    }
}

///
/// ロガーの初期化
///
/// # 引数
/// * `opts` - 設定情報をパックしたオブジェクト
///
/// # 注記
/// ロガーはプロセス終了まで動作させ続ける。
///
pub(super) fn init(opts: &Options) -> Result<()> {
    let level = opts.log_level();
    let path = opts.log_output();

    let handle = LogTarget::select(&path)?.start(&level)?;
    std::mem::forget(handle);

    log::debug!("logger started (level: {}, output: {})", level, path.display());
    Ok(())
}

///
/// ログ1行分の書式化
///
/// # 注記
/// `[日時 レベル] - メッセージ (ファイル名:行番号)`の形式で出力する。
///
fn format(writer: &mut dyn Write, now: &mut DeferredNow, record: &Record)
    -> std::io::Result<()>
{
    let stamp = now.format("%Y-%m-%d %H:%M:%S");
    write!(writer, "[{stamp} {:5}] - {} ({})", record.level(), record.args(), source_info(record))
}

/// 出力元を`ファイル名:行番号`で表す(不明な部分は`?`で埋める)
fn source_info(record: &Record) -> String {
    let name = record.file()
        .and_then(|file| Path::new(file).file_name())
        .map_or_else(|| "?????".into(), |name| name.to_string_lossy().into_owned());

    match record.line() {
        Some(line) => format!("{name}:{line}"),
        None => format!("{name}:???"),
    }
}

///
/// 出力先のファイルの準備
///
/// # 戻り値
/// 正規化したファイルのパスを返す。
///
/// # 注記
/// 親ディレクトリやファイルが無い場合は作成する。
///
fn prepare_file(path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        File::create(path)?;
    }

    Ok(std::fs::canonicalize(path)?)
}

///
/// 出力先のディレクトリの準備
///
/// # 戻り値
/// 正規化したディレクトリのパスを返す。
///
fn prepare_dir(path: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(path)?;
    Ok(std::fs::canonicalize(path)?)
}

#[cfg(test)]
mod tests {
    use ulid::Ulid;

    use super::*;

    ///
    /// ソースコード情報がベースネームと行番号になることを確認
    ///
    #[test]
    fn source_info_uses_basename() {
        let record = Record::builder()
            .args(format_args!("x"))
            .file(Some("src/repository/source.rs"))
            .line(Some(42))
            .build();
        assert_eq!(source_info(&record), "source.rs:42");

        let record = Record::builder().args(format_args!("x")).build();
        assert_eq!(source_info(&record), "?????:???");
    }

    ///
    /// 出力先の指定が振り分けられることを確認
    ///
    #[test]
    fn select_log_target() {
        assert_eq!(LogTarget::select(Path::new("-")).unwrap(), LogTarget::Stderr);

        let base = std::env::temp_dir().join(format!("kpxcmgr-log-test-{}", Ulid::new()));
        let file = base.join("kpxcmgr.log");
        assert_eq!(LogTarget::select(&file).unwrap(), LogTarget::File(file.clone()));
        assert_eq!(LogTarget::select(&base).unwrap(), LogTarget::Rotate(base.clone()));

        // 既存のディレクトリは拡張子の有無によらずローテーション扱い
        let dir = base.join("logs.d");
        std::fs::create_dir_all(&dir).unwrap();
        assert_eq!(LogTarget::select(&dir).unwrap(), LogTarget::Rotate(dir.clone()));

        std::fs::remove_dir_all(base).ok();
    }
}
