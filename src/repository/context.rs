/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! 操作中のウィンドウ情報から検索キーワードを求めるモジュール
//!

use std::sync::LazyLock;

use regex::Regex;

/// URLからホスト部を取り出す正規表現
static URL_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://)([^/?#]+)").expect("regex compile failed")
});

/// ウィンドウタイトルの主な区切り
static TITLE_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r" - | \| | :: ").expect("regex compile failed")
});

///
/// 操作中のウィンドウの情報
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum WindowContext {
    /// ウィンドウタイトル
    Title(String),

    /// ブラウザで表示中のURL
    Url(String),
}

impl WindowContext {
    ///
    /// 検索キーワードを求める
    ///
    /// # 戻り値
    /// キーワードを得られた場合は`Some()`でラップして返す。
    ///
    pub(crate) fn search_keyword(&self) -> Option<String> {
        match self {
            Self::Title(title) => keyword_from_title(title),
            Self::Url(url) => keyword_from_url(url),
        }
    }
}

///
/// 分割した断片のうち最も短いものを返す
///
fn shortest<'a, I>(pieces: I) -> Option<String>
where
    I: Iterator<Item = &'a str>,
{
    pieces.map(str::trim)
        .filter(|piece| !piece.is_empty())
        .min_by_key(|piece| piece.chars().count())
        .map(str::to_string)
}

///
/// ウィンドウタイトルからキーワードを求める
///
/// # 注記
/// " - "、" | "、" :: "のいずれかを含む場合はそれらで分割した最短の断片、
/// " — "を含む場合はその右側、"-"または"_"を含む場合はそれで分割した最短の断
/// 片を採用する。いずれも含まない場合はタイトル全体を用いる。
///
fn keyword_from_title(title: &str) -> Option<String> {
    let title = title.trim();

    if TITLE_SEPARATOR.is_match(title) {
        shortest(TITLE_SEPARATOR.split(title))

    } else if let Some((_, right)) = title.split_once(" — ") {
        shortest(std::iter::once(right))

    } else if title.contains('-') {
        shortest(title.split('-'))

    } else if title.contains('_') {
        shortest(title.split('_'))

    } else {
        shortest(std::iter::once(title))
    }
}

///
/// URLからキーワードを求める
///
/// # 注記
/// ホスト名の末尾2ラベルを採用する(ポート番号は除く)。
///
fn keyword_from_url(url: &str) -> Option<String> {
    let host = URL_HOST.captures(url.trim())?.get(1)?.as_str();
    let host = host.rsplit('@').next().unwrap_or(host);
    let host = host.split(':').next().unwrap_or(host);

    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.is_empty() {
        return None;
    }

    Some(labels[labels.len().saturating_sub(2)..].join("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title(s: &str) -> Option<String> {
        WindowContext::Title(s.to_string()).search_keyword()
    }

    fn url(s: &str) -> Option<String> {
        WindowContext::Url(s.to_string()).search_keyword()
    }

    ///
    /// URLのホスト名の末尾2ラベルが採用されることを確認
    ///
    #[test]
    fn url_uses_last_two_host_labels() {
        assert_eq!(url("https://login.github.com/session?x=1"), Some("github.com".into()));
        assert_eq!(url("http://example.com"), Some("example.com".into()));
        assert_eq!(url("https://intranet:8443/path"), Some("intranet".into()));
        assert_eq!(url("https://user@mail.example.org/"), Some("example.org".into()));
        assert_eq!(url("about:blank"), None);
    }

    ///
    /// タイトルの区切りに応じた断片が採用されることを確認
    ///
    #[test]
    fn title_separators() {
        assert_eq!(title("Pull requests - GitHub - Zen"), Some("Zen".into()));
        assert_eq!(title("Inbox | Fastmail"), Some("Inbox".into()));
        assert_eq!(title("Dashboard :: Grafana"), Some("Grafana".into()));
        assert_eq!(title("Welcome — Bitbucket"), Some("Bitbucket".into()));
        assert_eq!(title("my-router-admin"), Some("my".into()));
        assert_eq!(title("nas_console"), Some("nas".into()));
        assert_eq!(title("Jenkins"), Some("Jenkins".into()));
        assert_eq!(title("   "), None);
    }
}
