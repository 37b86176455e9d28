/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! コンフィギュレーション情報の定義
//!

use std::default::Default;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use super::{DEFAULT_CLI, DEFAULT_LOG_LEVEL, DEFAULT_LOG_OUTPUT};

///
/// コンフィギュレーションデータを集約する構造体
///
/// # 注記
/// 資格情報は保存対象に含めない。
///
#[derive(Debug, Deserialize, Serialize)]
pub(super) struct Config {
    global: Option<GlobalInfo>,
}

impl Config {
    ///
    /// グローバル設定から値を取り出す
    ///
    fn global<T, F>(&self, f: F) -> Option<T>
    where
        F: Fn(&GlobalInfo) -> Option<&T>,
        T: Clone,
    {
        self.global.as_ref().and_then(f).cloned()
    }

    ///
    /// keepassxc-cliへのパスへのアクセサ
    ///
    /// # 戻り値
    /// パスが設定されている場合は`Some()`でラップして返す。
    ///
    pub(super) fn cli(&self) -> Option<PathBuf> {
        self.global(|global| global.cli.as_ref())
    }

    ///
    /// データベースファイルへのパスへのアクセサ
    ///
    /// # 戻り値
    /// データベースファイルパスが設定されている場合はパス情報を`Some()`でラップ
    /// して返す。
    ///
    pub(super) fn database(&self) -> Option<PathBuf> {
        self.global(|global| global.database.as_ref())
    }

    ///
    /// キーファイルへのパスへのアクセサ
    ///
    pub(super) fn key_file(&self) -> Option<PathBuf> {
        self.global(|global| global.key_file.as_ref())
    }

    ///
    /// ログレベルへのアクセサ
    ///
    pub(super) fn log_level(&self) -> Option<String> {
        self.global(|global| global.log_level.as_ref())
    }

    ///
    /// ログの出力先へのアクセサ
    ///
    pub(super) fn log_output(&self) -> Option<PathBuf> {
        self.global(|global| global.log_output.as_ref())
    }

    ///
    /// コンフィギュレーション情報の保存
    ///
    /// # 戻り値
    /// 保存に成功した場合は`Ok(())`を返す。失敗した場合はエラー情報を`Err()`で
    /// ラップして返す。
    ///
    pub(super) fn save<P>(&self, path: P) -> Result<()>
    where
        P: AsRef<Path>
    {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if let Err(err) = std::fs::write(path, &toml::to_string(self)?) {
            Err(anyhow!("write config error: {}", err))
        } else {
            Ok(())
        }
    }
}

// Defaultトレイトの実装
impl Default for Config {
    fn default() -> Self {
        Self {
            global: Some(GlobalInfo {
                cli: Some(PathBuf::from(DEFAULT_CLI)),
                database: None,
                key_file: None,
                log_level: Some(DEFAULT_LOG_LEVEL.to_string()),
                log_output: Some(PathBuf::from(DEFAULT_LOG_OUTPUT)),
            })
        }
    }
}

///
/// グローバル設定を格納する構造体
///
#[derive(Debug, Deserialize, Serialize)]
struct GlobalInfo {
    /// keepassxc-cliへのパス
    #[serde(skip_serializing_if = "Option::is_none")]
    cli: Option<PathBuf>,

    /// データベースファイルへのパス
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<PathBuf>,

    /// キーファイルへのパス
    #[serde(skip_serializing_if = "Option::is_none")]
    key_file: Option<PathBuf>,

    /// ログレベル
    #[serde(skip_serializing_if = "Option::is_none")]
    log_level: Option<String>,

    /// ログの出力先
    #[serde(skip_serializing_if = "Option::is_none")]
    log_output: Option<PathBuf>,
}

///
/// コンフィギュレーション情報の読み込み
///
pub(super) fn load<P>(path: P) -> Result<Config>
where
    P: AsRef<Path>
{
    Ok(toml::from_str(&std::fs::read_to_string(path)?)?)
}

#[cfg(test)]
mod tests {
    use ulid::Ulid;

    use super::*;

    ///
    /// 保存した既定設定を読み戻せ、資格情報が含まれないことを確認
    ///
    #[test]
    fn save_and_load_default() {
        let path = std::env::temp_dir()
            .join(format!("kpxcmgr-config-test-{}", Ulid::new()))
            .join("config.toml");

        Config::default().save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("[global]"));
        assert!(!text.contains("password"));

        let config = load(&path).unwrap();
        assert_eq!(config.cli(), Some(PathBuf::from(DEFAULT_CLI)));
        assert_eq!(config.database(), None);
        assert_eq!(config.log_level().as_deref(), Some(DEFAULT_LOG_LEVEL));

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    ///
    /// 部分的な設定ファイルを読み込めることを確認
    ///
    #[test]
    fn load_partial() {
        let path = std::env::temp_dir()
            .join(format!("kpxcmgr-config-test-{}.toml", Ulid::new()));
        std::fs::write(
            &path,
            "[global]\ndatabase = \"/home/me/db.kdbx\"\nkey_file = \"/home/me/db.key\"\n",
        ).unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.database(), Some(PathBuf::from("/home/me/db.kdbx")));
        assert_eq!(config.key_file(), Some(PathBuf::from("/home/me/db.key")));
        assert_eq!(config.cli(), None);
        assert_eq!(config.log_output(), None);

        std::fs::remove_file(path).ok();
    }
}
