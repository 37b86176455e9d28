/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! パスワード生成ルールの定義
//!

use serde::{Deserialize, Serialize};

/// 生成するパスワード長の上限
pub(crate) const MAX_LENGTH: u32 = 256;

/// 記号を含める場合に最低限必要な長さ
const SPECIAL_MIN_LENGTH: u32 = 6;

///
/// パスワード生成ルールをまとめた構造体
///
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) struct GenerationRules {
    /// パスワード長
    pub(crate) length: Option<u32>,

    /// 英小文字を使用する
    pub(crate) lower: bool,

    /// 英大文字を使用する
    pub(crate) upper: bool,

    /// 数字を使用する
    pub(crate) numeric: bool,

    /// 記号を使用する
    pub(crate) special: bool,

    /// 拡張ASCIIを使用する
    pub(crate) extended: bool,

    /// 除外する文字
    pub(crate) exclude: Option<String>,

    /// 独自の文字セット
    pub(crate) custom: Option<String>,
}

impl GenerationRules {
    ///
    /// 有効な文字種に対して許容される長さに丸める
    ///
    /// # 注記
    /// 有効な文字種1つにつき1文字(記号のみ6文字)を下限とし、上限は
    /// `MAX_LENGTH`とする。下限は最低でも1。
    ///
    pub(crate) fn limit_length(&self, length: u32) -> u32 {
        let mut min = [self.lower, self.upper, self.numeric, self.extended]
            .iter()
            .filter(|enabled| **enabled)
            .count() as u32;

        if self.special {
            min += SPECIAL_MIN_LENGTH;
        }

        length.clamp(min.max(1), MAX_LENGTH)
    }

    ///
    /// 長さを丸めた上でルールを確定する
    ///
    pub(crate) fn normalized(mut self) -> Self {
        if let Some(length) = self.length {
            self.length = Some(self.limit_length(length));
        }

        self
    }

    ///
    /// keepassxc-cliに渡す引数列を生成する
    ///
    /// # 注記
    /// 設定されている(真または空でない)ルールのみ出力する。
    ///
    pub(crate) fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(length) = self.length.filter(|length| *length > 0) {
            args.push("--length".to_string());
            args.push(length.to_string());
        }

        let flags = [
            (self.lower, "--lower"),
            (self.upper, "--upper"),
            (self.numeric, "--numeric"),
            (self.special, "--special"),
            (self.extended, "--extended"),
        ];

        for (enabled, flag) in flags {
            if enabled {
                args.push(flag.to_string());
            }
        }

        push_value(&mut args, "--exclude", self.exclude.as_deref());
        push_value(&mut args, "--custom", self.custom.as_deref());

        args
    }
}

// Defaultトレイトの実装
impl Default for GenerationRules {
    fn default() -> Self {
        Self {
            length: Some(16),
            lower: true,
            upper: true,
            numeric: true,
            special: true,
            extended: false,
            exclude: None,
            custom: None,
        }
    }
}

///
/// 値が空でない場合のみオプションと値を追加する
///
pub(crate) fn push_value(args: &mut Vec<String>, name: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|value| !value.is_empty()) {
        args.push(name.to_string());
        args.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    ///
    /// 設定されたルールだけが引数に現れることを確認
    ///
    #[test]
    fn args_only_for_set_rules() {
        let rules = GenerationRules {
            length: Some(20),
            lower: true,
            upper: false,
            numeric: true,
            special: false,
            extended: false,
            exclude: Some(String::new()),
            custom: Some("abc123".into()),
        };

        assert_eq!(
            rules.to_args(),
            vec!["--length", "20", "--lower", "--numeric", "--custom", "abc123"]
        );
    }

    ///
    /// 長さ未指定時に--lengthが出力されないことを確認
    ///
    #[test]
    fn args_without_length() {
        let rules = GenerationRules {
            length: None,
            exclude: Some("O0l1".into()),
            ..GenerationRules::default()
        };

        assert_eq!(
            rules.to_args(),
            vec!["--lower", "--upper", "--numeric", "--special", "--exclude", "O0l1"]
        );
    }

    ///
    /// 文字種に応じて長さの下限と上限が適用されることを確認
    ///
    #[test]
    fn length_is_limited() {
        let rules = GenerationRules::default();

        // lower + upper + numeric = 3, special = 6
        assert_eq!(rules.limit_length(4), 9);
        assert_eq!(rules.limit_length(16), 16);
        assert_eq!(rules.limit_length(1000), MAX_LENGTH);

        let none = GenerationRules {
            lower: false,
            upper: false,
            numeric: false,
            special: false,
            ..GenerationRules::default()
        };
        assert_eq!(none.limit_length(0), 1);
    }
}
