/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! あいまい照合の実装
//!

use deunicode::deunicode;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use strsim::jaro_winkler;

/// タイプミス許容判定に用いる類似度の閾値
const TYPO_THRESHOLD: f64 = 0.85;

/// タイプミス許容判定を行うトークンの最小文字数
const TYPO_MIN_CHARS: usize = 4;

///
/// あいまい照合を提供するトレイト
///
pub(crate) trait FuzzyMatch {
    ///
    /// テキストがトークンにあいまい一致するかを判定する
    ///
    /// # 引数
    /// * `text` - 照合対象のテキスト
    /// * `token` - 利用者が入力したトークン
    ///
    fn fuzzy_match(&self, text: &str, token: &str) -> bool;
}

///
/// 翻字を考慮したあいまい照合器
///
/// # 注記
/// テキストそのものとASCIIへ翻字したテキストの双方に対して部分列照合を行う。
/// さらに4文字以上のトークンについては、テキスト中の単語とのJaro-Winkler類似
/// 度による軽微なタイプミスの許容を行う。
///
pub(crate) struct TransliterationMatcher {
    /// 部分列照合器
    skim: SkimMatcherV2,
}

impl TransliterationMatcher {
    ///
    /// オブジェクトの生成
    ///
    pub(crate) fn new() -> Self {
        Self { skim: SkimMatcherV2::default().ignore_case() }
    }

    ///
    /// 部分列照合
    ///
    fn subsequence(&self, text: &str, token: &str) -> bool {
        self.skim.fuzzy_match(text, token).is_some()
    }

    ///
    /// 単語単位のタイプミス許容照合
    ///
    fn typo_tolerant(text: &str, token: &str) -> bool {
        if token.chars().count() < TYPO_MIN_CHARS {
            return false;
        }

        let token = token.to_lowercase();

        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .any(|word| jaro_winkler(&token, word) >= TYPO_THRESHOLD)
    }
}

// Defaultトレイトの実装
impl Default for TransliterationMatcher {
    fn default() -> Self {
        Self::new()
    }
}

// FuzzyMatchトレイトの実装
impl FuzzyMatch for TransliterationMatcher {
    fn fuzzy_match(&self, text: &str, token: &str) -> bool {
        if text.is_empty() || token.is_empty() {
            return false;
        }

        if self.subsequence(text, token) {
            return true;
        }

        let ascii = deunicode(text);
        if ascii != text && self.subsequence(&ascii, token) {
            return true;
        }

        Self::typo_tolerant(&ascii, &deunicode(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    ///
    /// 部分列としての照合が大文字小文字を区別しないことを確認
    ///
    #[test]
    fn subsequence_ignores_case() {
        let matcher = TransliterationMatcher::new();

        assert!(matcher.fuzzy_match("GitHub", "gthb"));
        assert!(matcher.fuzzy_match("github", "GH"));
        assert!(!matcher.fuzzy_match("GitHub", "bg"));
    }

    ///
    /// ローマ字入力が漢字やアクセント付き文字にマッチすることを確認
    ///
    #[test]
    fn romanized_token_matches_native_script() {
        let matcher = TransliterationMatcher::new();

        assert!(matcher.fuzzy_match("中国银行", "zhongguo"));
        assert!(matcher.fuzzy_match("Café Crème", "cafe"));
        assert!(!matcher.fuzzy_match("中国银行", "riben"));
    }

    ///
    /// 4文字以上のトークンで軽微なタイプミスが許容されることを確認
    ///
    #[test]
    fn typo_tolerance_for_longer_tokens() {
        let matcher = TransliterationMatcher::new();

        assert!(matcher.fuzzy_match("Beta Server", "Btea"));
        assert!(!matcher.fuzzy_match("Beta", "Bta!x"));

        // 短いトークンは対象外
        assert!(!matcher.fuzzy_match("ab", "ba"));
    }

    ///
    /// 空文字列同士は一致しないことを確認
    ///
    #[test]
    fn empty_input_never_matches() {
        let matcher = TransliterationMatcher::new();

        assert!(!matcher.fuzzy_match("", "a"));
        assert!(!matcher.fuzzy_match("a", ""));
    }
}
