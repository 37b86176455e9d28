/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! エントリ一覧の絞り込み処理をまとめたモジュール
//!

pub(crate) mod matcher;

use crate::keepassxc::EntryIdentity;
pub(crate) use matcher::{FuzzyMatch, TransliterationMatcher};

///
/// 検索クエリを構成するトークン
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Token {
    /// 引用符で囲まれたトークン(部分一致のみ)
    Exact(String),

    /// 通常のトークン(あいまい照合または部分一致)
    Loose(String),
}

impl Token {
    ///
    /// 1語分の文字列からトークンを生成する
    ///
    /// # 注記
    /// 先頭と末尾が同じ引用符(`"`または`'`)の場合は外した上で`Exact`とする。
    ///
    fn new(word: &str) -> Self {
        for quote in ['"', '\''] {
            if word.len() >= 2 && word.starts_with(quote) && word.ends_with(quote) {
                return Self::Exact(word[1..word.len() - 1].to_string());
            }
        }

        Self::Loose(word.to_string())
    }
}

///
/// クエリ文字列をトークン列に分解する
///
pub(crate) fn tokenize(query: &str) -> Vec<Token> {
    query.split_whitespace().map(Token::new).collect()
}

///
/// 大文字小文字を区別しない部分一致
///
fn contains_ignore_case(text: &str, token: &str) -> bool {
    text.to_lowercase().contains(&token.to_lowercase())
}

///
/// エントリの絞り込みを行う構造体
///
pub(crate) struct SearchEngine<M: FuzzyMatch = TransliterationMatcher> {
    /// あいまい照合器
    matcher: M,
}

impl SearchEngine<TransliterationMatcher> {
    ///
    /// 既定の照合器を用いるオブジェクトの生成
    ///
    pub(crate) fn new() -> Self {
        Self::with_matcher(TransliterationMatcher::new())
    }
}

impl<M: FuzzyMatch> SearchEngine<M> {
    ///
    /// 任意の照合器を用いるオブジェクトの生成
    ///
    pub(crate) fn with_matcher(matcher: M) -> Self {
        Self { matcher }
    }

    ///
    /// 1トークン分の照合
    ///
    /// # 注記
    /// タイトルとグループ(description)のいずれかに一致すればよい。
    ///
    fn token_hit(&self, entry: &EntryIdentity, token: &Token) -> bool {
        let fields = [entry.title(), entry.group()];

        match token {
            Token::Exact(word) => fields.iter()
                .any(|field| contains_ignore_case(field, word)),

            Token::Loose(word) => fields.iter()
                .any(|field| {
                    contains_ignore_case(field, word)
                        || self.matcher.fuzzy_match(field, word)
                }),
        }
    }

    ///
    /// エントリの絞り込み
    ///
    /// # 引数
    /// * `entries` - 絞り込み対象のエントリ
    /// * `query` - 空白区切りの検索クエリ
    ///
    /// # 戻り値
    /// 全てのトークンに一致したエントリを元の順序のまま返す。クエリが空の場合
    /// は全エントリを返す。
    ///
    pub(crate) fn search<'a>(&self, entries: &'a [EntryIdentity], query: &str)
        -> Vec<&'a EntryIdentity>
    {
        let tokens = tokenize(query);

        log::debug!("search tokens: {:?}", tokens);

        entries.iter()
            .filter(|entry| tokens.iter().all(|token| self.token_hit(entry, token)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    ///
    /// 呼び出しが無いことを確認するための照合器（常に不一致）
    ///
    struct NeverMatch;

    impl FuzzyMatch for NeverMatch {
        fn fuzzy_match(&self, _text: &str, _token: &str) -> bool {
            false
        }
    }

    fn entries() -> Vec<EntryIdentity> {
        vec![
            EntryIdentity::new("GitHub", "Work"),
            EntryIdentity::new("GitLab", "Work"),
            EntryIdentity::new("Email", "Personal"),
            EntryIdentity::new("Gmail", "Personal"),
            EntryIdentity::new("中国银行", "Bank"),
        ]
    }

    fn titles(hits: &[&EntryIdentity]) -> Vec<String> {
        hits.iter().map(|e| e.title().to_string()).collect()
    }

    ///
    /// 引用符の有無によるトークンの分類を確認
    ///
    #[test]
    fn tokenize_quotes() {
        assert_eq!(tokenize(r#"  "Work" git 'a' "x' " "#), vec![
            Token::Exact("Work".into()),
            Token::Loose("git".into()),
            Token::Exact("a".into()),
            Token::Loose("\"x'".into()),
            Token::Loose("\"".into()),
        ]);
        assert!(tokenize("   ").is_empty());
    }

    ///
    /// 空クエリでは入力がそのまま返ることを確認
    ///
    #[test]
    fn empty_query_is_identity() {
        let entries = entries();
        let engine = SearchEngine::new();

        let hits = engine.search(&entries, "");
        assert_eq!(hits.len(), entries.len());
        assert!(hits.iter().zip(entries.iter()).all(|(a, b)| *a == b));
    }

    ///
    /// 引用符付きトークンと通常トークンがANDで評価され、元の順序が保たれること
    /// を確認
    ///
    #[test]
    fn quoted_and_bare_tokens_combine() {
        let entries = entries();
        let engine = SearchEngine::new();

        let hits = engine.search(&entries, r#""work" gt"#);
        assert_eq!(titles(&hits), vec!["GitHub", "GitLab"]);

        let hits = engine.search(&entries, r#""personal" gml"#);
        assert_eq!(titles(&hits), vec!["Gmail"]);
    }

    ///
    /// 引用符付きトークンがあいまい照合を使わないことを確認
    ///
    #[test]
    fn quoted_token_is_substring_only() {
        let entries = entries();
        let engine = SearchEngine::new();

        assert!(engine.search(&entries, r#""gthb""#).is_empty());
        assert_eq!(titles(&engine.search(&entries, r#""HUB""#)), vec!["GitHub"]);
    }

    ///
    /// あいまい照合が無くても部分一致でヒットすることを確認
    ///
    #[test]
    fn bare_token_falls_back_to_substring() {
        let entries = entries();
        let engine = SearchEngine::with_matcher(NeverMatch);

        assert_eq!(titles(&engine.search(&entries, "MAIL")), vec!["Email", "Gmail"]);
        assert!(engine.search(&entries, "gthb").is_empty());
    }

    ///
    /// ローマ字入力で漢字のタイトルが検索できることを確認
    ///
    #[test]
    fn transliterated_search() {
        let entries = entries();
        let engine = SearchEngine::new();

        assert_eq!(titles(&engine.search(&entries, "zhongguo")), vec!["中国银行"]);
    }
}
