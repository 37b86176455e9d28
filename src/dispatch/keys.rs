/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! キー入力の組み合わせを表現する型の定義
//!

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use anyhow::{anyhow, Error};
use strsim::jaro_winkler;

/// 修飾キー名の候補を提示する際の類似度の閾値
const SUGGEST_THRESHOLD: f64 = 0.7;

/// 修飾キーとして受け付ける名前
const MODIFIER_NAMES: [(&str, Modifier); 9] = [
    ("ctrl", Modifier::Ctrl),
    ("control", Modifier::Ctrl),
    ("cmd", Modifier::Meta),
    ("command", Modifier::Meta),
    ("meta", Modifier::Meta),
    ("super", Modifier::Meta),
    ("shift", Modifier::Shift),
    ("alt", Modifier::Alt),
    ("option", Modifier::Alt),
];

///
/// 修飾キー
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Modifier {
    /// Cmdキー(macOS)またはSuper/Windowsキー
    Meta,

    /// Ctrlキー
    Ctrl,

    /// Shiftキー
    Shift,

    /// Alt/Optionキー
    Alt,
}

impl Modifier {
    ///
    /// プラットフォームで主となる修飾キーを返す
    ///
    /// # 戻り値
    /// macOSでは`Meta`、それ以外では`Ctrl`を返す。
    ///
    pub(crate) fn platform_primary() -> Self {
        if cfg!(target_os = "macos") {
            Self::Meta
        } else {
            Self::Ctrl
        }
    }

    ///
    /// 表示名を返す
    ///
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Meta => "cmd",
            Self::Ctrl => "ctrl",
            Self::Shift => "shift",
            Self::Alt => "alt",
        }
    }
}

// Displayトレイトの実装
impl Display for Modifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// FromStrトレイトの実装
impl FromStr for Modifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();

        if let Some((_, modifier)) = MODIFIER_NAMES.iter().find(|(n, _)| *n == name) {
            return Ok(*modifier);
        }

        let suggestion = MODIFIER_NAMES.iter()
            .map(|(n, _)| (*n, jaro_winkler(n, &name)))
            .filter(|(_, score)| *score >= SUGGEST_THRESHOLD)
            .max_by(|a, b| a.1.total_cmp(&b.1));

        match suggestion {
            Some((n, _)) => Err(anyhow!("unknown modifier: {s} (did you mean \"{n}\"?)")),
            None => Err(anyhow!("unknown modifier: {s}")),
        }
    }
}

///
/// 1回分のキー入力(修飾キーの組み合わせを含む)
///
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct KeyEvent {
    /// 押下されたキー(英字は大文字に正規化)
    key: char,

    /// Meta(Cmd)キー押下の有無
    meta: bool,

    /// Ctrlキー押下の有無
    ctrl: bool,

    /// Shiftキー押下の有無
    shift: bool,

    /// Altキー押下の有無
    alt: bool,
}

impl KeyEvent {
    ///
    /// 修飾キー無しのオブジェクトの生成
    ///
    pub(crate) fn new(key: char) -> Self {
        Self { key: key.to_ascii_uppercase(), ..Self::default() }
    }

    ///
    /// 修飾キーを追加する
    ///
    pub(crate) fn with(mut self, modifier: Modifier) -> Self {
        match modifier {
            Modifier::Meta => self.meta = true,
            Modifier::Ctrl => self.ctrl = true,
            Modifier::Shift => self.shift = true,
            Modifier::Alt => self.alt = true,
        }

        self
    }

    ///
    /// キーへのアクセサ
    ///
    pub(crate) fn key(&self) -> char {
        self.key
    }

    ///
    /// 指定した修飾キーが押下されているかを返す
    ///
    pub(crate) fn has(&self, modifier: Modifier) -> bool {
        match modifier {
            Modifier::Meta => self.meta,
            Modifier::Ctrl => self.ctrl,
            Modifier::Shift => self.shift,
            Modifier::Alt => self.alt,
        }
    }
}

// Displayトレイトの実装
impl Display for KeyEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for modifier in [Modifier::Meta, Modifier::Ctrl, Modifier::Alt, Modifier::Shift] {
            if self.has(modifier) {
                write!(f, "{}+", modifier)?;
            }
        }

        write!(f, "{}", self.key.to_ascii_lowercase())
    }
}

// FromStrトレイトの実装
impl FromStr for KeyEvent {
    type Err = Error;

    ///
    /// "ctrl+shift+u"形式の文字列の解釈
    ///
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts: Vec<&str> = s.split('+').map(str::trim).collect();

        let key = parts.pop().unwrap_or_default();
        let mut chars = key.chars();

        let event = match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphanumeric() => KeyEvent::new(c),
            _ => return Err(anyhow!("invalid key in \"{s}\": \"{key}\"")),
        };

        parts.into_iter()
            .try_fold(event, |event, name| -> Result<Self, Error> {
                Ok(event.with(name.parse::<Modifier>()?))
            })
    }
}
