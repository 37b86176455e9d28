/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! クリップボードやキー入力などの外部への副作用をまとめたモジュール
//!

use std::io::Write;

use anyhow::{Context, Result};
use arboard::Clipboard;

///
/// 単独で送出するキー
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Key {
    Tab,
}

///
/// 外部への副作用を提供するトレイト
///
pub(crate) trait HostRuntime {
    ///
    /// クリップボードへのテキストの書き込み
    ///
    fn copy_text(&self, text: &str) -> Result<()>;

    ///
    /// フォーカスされている対象へのテキストの入力
    ///
    fn type_text(&self, text: &str) -> Result<()>;

    ///
    /// 単独キーの送出
    ///
    fn tap_key(&self, key: Key) -> Result<()>;

    ///
    /// 自身のウィンドウを隠す
    ///
    fn hide_window(&self);

    ///
    /// URLを外部のアプリケーションで開く
    ///
    fn open_external(&self, url: &str) -> Result<()>;

    ///
    /// 利用者への通知
    ///
    fn notify(&self, message: &str);
}

///
/// 端末上で動作する場合のホスト実装
///
/// # 注記
/// 入力するテキストは標準出力に書き出す(外部の入力ツールへパイプで渡すこと
/// を想定)。ウィンドウを持たないため`hide_window()`は何も行わない。
///
#[derive(Debug, Default)]
pub(crate) struct ConsoleHost;

impl ConsoleHost {
    fn write_stdout(text: &str) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

// HostRuntimeトレイトの実装
impl HostRuntime for ConsoleHost {
    fn copy_text(&self, text: &str) -> Result<()> {
        let mut clipboard = Clipboard::new()
            .context("クリップボードを開けませんでした")?;

        clipboard.set_text(text.to_owned())
            .context("クリップボードへの書き込みに失敗しました")?;

        log::debug!("copied {} chars to clipboard", text.chars().count());
        Ok(())
    }

    fn type_text(&self, text: &str) -> Result<()> {
        Self::write_stdout(text)
    }

    fn tap_key(&self, key: Key) -> Result<()> {
        match key {
            Key::Tab => Self::write_stdout("\t"),
        }
    }

    fn hide_window(&self) {
        log::debug!("hide window (no-op on console)");
    }

    fn open_external(&self, url: &str) -> Result<()> {
        log::debug!("open {}", url);
        open::that(url).with_context(|| format!("URLを開けませんでした: {url}"))
    }

    fn notify(&self, message: &str) {
        eprintln!("{}", message);
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::cell::RefCell;

    use anyhow::anyhow;

    use super::*;

    ///
    /// 記録されたホスト呼び出し
    ///
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub(crate) enum HostCall {
        Copy(String),
        Type(String),
        Key(Key),
        Hide,
        Open(String),
        Notify(String),
    }

    /// 呼び出しを順に記録するホスト（テスト用）
    #[derive(Default)]
    pub(crate) struct RecordingHost {
        calls: RefCell<Vec<HostCall>>,
        clipboard_broken: bool,
    }

    impl RecordingHost {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn with_broken_clipboard() -> Self {
            Self { clipboard_broken: true, ..Self::default() }
        }

        pub(crate) fn calls(&self) -> Vec<HostCall> {
            self.calls.borrow().clone()
        }

        fn record(&self, call: HostCall) {
            self.calls.borrow_mut().push(call);
        }
    }

    impl HostRuntime for RecordingHost {
        fn copy_text(&self, text: &str) -> Result<()> {
            if self.clipboard_broken {
                return Err(anyhow!("clipboard unavailable"));
            }

            self.record(HostCall::Copy(text.to_string()));
            Ok(())
        }

        fn type_text(&self, text: &str) -> Result<()> {
            self.record(HostCall::Type(text.to_string()));
            Ok(())
        }

        fn tap_key(&self, key: Key) -> Result<()> {
            self.record(HostCall::Key(key));
            Ok(())
        }

        fn hide_window(&self) {
            self.record(HostCall::Hide);
        }

        fn open_external(&self, url: &str) -> Result<()> {
            self.record(HostCall::Open(url.to_string()));
            Ok(())
        }

        fn notify(&self, message: &str) {
            self.record(HostCall::Notify(message.to_string()));
        }
    }
}
