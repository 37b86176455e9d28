/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! キー入力に応じたエントリ属性の取り出し処理をまとめたモジュール
//!

pub(crate) mod keys;

use std::thread;
use std::time::Duration;

use crate::host::{HostRuntime, Key};
use crate::keepassxc::{Attribute, CliRunner, KpxcError};
use crate::repository::{EntrySource, Repository};
pub(crate) use keys::{KeyEvent, Modifier};

/// エントリ一覧画面の識別子
pub(crate) const LIST_CONTEXT: &str = "keepassxc-list";

/// ウィンドウを隠してから入力を開始するまでの待ち時間
const TYPE_DELAY: Duration = Duration::from_millis(100);

/// ユーザ名の入力からパスワードの入力までの待ち時間
const FIELD_PAUSE: Duration = Duration::from_millis(50);

///
/// キー入力に割り当てられた動作
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    /// 属性値をクリップボードにコピーする
    Copy(Attribute),

    /// 属性値をフォーカスされている対象に入力する
    Type(Attribute),

    /// URLを外部のアプリケーションで開く
    OpenUrl,
}

///
/// 動作の実行結果
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// クリップボードにコピーした
    Copied(Attribute),

    /// 入力した
    Typed,

    /// 外部のアプリケーションで開いた
    Opened,

    /// 実行せず利用者に通知した
    Notified(String),
}

///
/// キー入力と動作の対応付けおよび動作の実行を担う構造体
///
pub(crate) struct Dispatcher {
    /// 自身が担当する画面の識別子
    context: String,

    /// 主修飾キー
    primary: Modifier,

    /// ウィンドウを隠してから入力を開始するまでの待ち時間
    type_delay: Duration,

    /// ユーザ名とパスワードの入力の間の待ち時間
    field_pause: Duration,
}

impl Dispatcher {
    ///
    /// オブジェクトの生成
    ///
    /// # 注記
    /// 主修飾キーにはプラットフォームの既定(macOSではCmd、それ以外ではCtrl)
    /// を用いる。
    ///
    pub(crate) fn new() -> Self {
        Self {
            context: LIST_CONTEXT.to_string(),
            primary: Modifier::platform_primary(),
            type_delay: TYPE_DELAY,
            field_pause: FIELD_PAUSE,
        }
    }

    ///
    /// 主修飾キーを差し替える
    ///
    #[cfg(test)]
    pub(crate) fn with_primary(mut self, primary: Modifier) -> Self {
        self.primary = primary;
        self
    }

    ///
    /// 待ち時間を差し替える
    ///
    #[cfg(test)]
    pub(crate) fn with_delays(mut self, type_delay: Duration, field_pause: Duration) -> Self {
        self.type_delay = type_delay;
        self.field_pause = field_pause;
        self
    }

    ///
    /// 主修飾キーへのアクセサ
    ///
    pub(crate) fn primary(&self) -> Modifier {
        self.primary
    }

    ///
    /// キー入力に対応する動作を求める
    ///
    /// # 引数
    /// * `event` - キー入力
    /// * `active_context` - 現在アクティブな画面の識別子
    ///
    /// # 戻り値
    /// 対応する動作がある場合は`Some()`でラップして返す。主修飾キーが押されて
    /// いない場合や他の画面宛てのキー入力の場合は`None`を返す。
    ///
    /// # 注記
    /// Shiftの有無でコピーと入力を切り替える。ただしShift+UはURLを開く。
    ///
    pub(crate) fn resolve(&self, event: &KeyEvent, active_context: &str) -> Option<Action> {
        if active_context != self.context {
            log::debug!("ignore {} for context {}", event, active_context);
            return None;
        }

        if !event.has(self.primary) {
            return None;
        }

        let attribute = match event.key() {
            'B' => Attribute::UserName,
            'C' => Attribute::Password,
            'U' => Attribute::Url,
            'I' => Attribute::Title,
            'T' => Attribute::Totp,
            _ => return None,
        };

        let action = match (event.has(Modifier::Shift), attribute) {
            (true, Attribute::Url) => Action::OpenUrl,
            (true, attribute) => Action::Type(attribute),
            (false, attribute) => Action::Copy(attribute),
        };

        log::debug!("{} -> {:?}", event, action);
        Some(action)
    }

    ///
    /// 動作の実行
    ///
    /// # 戻り値
    /// 実行結果を返す。属性の取得に失敗した場合や属性が空だった場合は通知を行
    /// った上で`Outcome::Notified`を返す。
    ///
    pub(crate) fn execute<S, R, H>(
        &self,
        action: Action,
        repo: &Repository<S, R>,
        host: &H,
        entry_name: &str,
    ) -> Outcome
    where
        S: EntrySource,
        R: CliRunner,
        H: HostRuntime,
    {
        let attribute = match action {
            Action::Copy(attribute) | Action::Type(attribute) => attribute,
            Action::OpenUrl => Attribute::Url,
        };

        let value = match repo.attribute(entry_name, attribute) {
            Ok(value) if value.is_empty() => {
                return notify(host, KpxcError::EmptyAttribute(attribute.to_string()));
            }
            Ok(value) => value,
            Err(err) => return report(host, err),
        };

        let result = match action {
            Action::Copy(attribute) => host.copy_text(&value)
                .map(|_| {
                    host.hide_window();
                    Outcome::Copied(attribute)
                }),

            Action::Type(_) => {
                host.hide_window();
                thread::sleep(self.type_delay);
                host.type_text(&value).map(|_| Outcome::Typed)
            }

            Action::OpenUrl => host.open_external(&value)
                .map(|_| {
                    host.hide_window();
                    Outcome::Opened
                }),
        };

        result.unwrap_or_else(|err| report(host, format!("{:#}", err)))
    }

    ///
    /// エントリ選択時の処理
    ///
    /// # 注記
    /// ユーザ名とパスワードがともに空の場合は備考を通知する。いずれか一方のみ
    /// が設定されている場合はそれだけを、両方設定されている場合はユーザ名、
    /// Tab、パスワードの順に入力する。
    ///
    pub(crate) fn select<S, R, H>(&self, repo: &Repository<S, R>, host: &H, entry_name: &str)
        -> Outcome
    where
        S: EntrySource,
        R: CliRunner,
        H: HostRuntime,
    {
        let record = match repo.full_record(entry_name) {
            Ok(record) => record,
            Err(err) => return report(host, err),
        };

        if record.username.is_empty() && record.password.is_empty() {
            if record.notes.is_empty() {
                return notify(host, "ユーザ名とパスワードが登録されていません");
            }

            return notify(host, record.notes);
        }

        host.hide_window();
        thread::sleep(self.type_delay);

        match self.type_account(host, &record.username, &record.password) {
            Ok(()) => Outcome::Typed,
            Err(err) => report(host, format!("{:#}", err)),
        }
    }

    ///
    /// ユーザ名とパスワードの入力
    ///
    fn type_account<H: HostRuntime>(&self, host: &H, username: &str, password: &str)
        -> anyhow::Result<()>
    {
        if username.is_empty() {
            return host.type_text(password);
        }

        host.type_text(username)?;

        if !password.is_empty() {
            host.tap_key(Key::Tab)?;
            thread::sleep(self.field_pause);
            host.type_text(password)?;
        }

        Ok(())
    }
}

// Defaultトレイトの実装
impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

///
/// 利用者への通知
///
fn notify<H, M>(host: &H, message: M) -> Outcome
where
    H: HostRuntime,
    M: ToString,
{
    let message = message.to_string();
    host.notify(&message);

    Outcome::Notified(message)
}

///
/// 失敗の通知
///
/// # 注記
/// 通知に加えてログにも記録する(備考などの内容はログに残さない)。
///
fn report<H, M>(host: &H, message: M) -> Outcome
where
    H: HostRuntime,
    M: ToString,
{
    let message = message.to_string();
    log::warn!("{}", message);

    notify(host, message)
}
