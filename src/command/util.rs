/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! サブコマンド間で共有する小物関数
//!

/// 伏せ字
const MASK: &str = "********";

///
/// 文字列が空文字、または空白文字のみで構成されているかを判定する
///
pub(crate) fn is_blank(s: &str) -> bool {
    s.is_empty() || s.chars().all(char::is_whitespace)
}

///
/// グループ名の表示用文字列
///
/// # 戻り値
/// ルートグループ(空文字列)の場合は"(root)"を返す。
///
pub(crate) fn group_label(group: &str) -> &str {
    if group.is_empty() { "(root)" } else { group }
}

///
/// 秘匿値の表示用文字列
///
/// # 引数
/// * `value` - 秘匿値
/// * `reveal` - 伏せずに表示するか否か
///
/// # 戻り値
/// 空文字列はそのまま返す。
///
pub(crate) fn masked(value: &str, reveal: bool) -> String {
    if reveal || value.is_empty() {
        value.to_string()
    } else {
        MASK.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    ///
    /// 空文字/空白のみがtrue、それ以外はfalseになることを確認
    ///
    #[test]
    fn blank_empty_and_spaces() {
        assert!(is_blank(""));
        assert!(is_blank("   "));
        assert!(is_blank("　　"));
        assert!(!is_blank(" list "));
    }

    ///
    /// ルートグループの表示名を確認
    ///
    #[test]
    fn root_group_label() {
        assert_eq!(group_label(""), "(root)");
        assert_eq!(group_label("Work/Dev"), "Work/Dev");
    }

    ///
    /// 秘匿値が伏せ字になることを確認
    ///
    #[test]
    fn mask_secret() {
        assert_eq!(masked("s3cr3t", false), MASK);
        assert_eq!(masked("s3cr3t", true), "s3cr3t");
        assert_eq!(masked("", false), "");
    }
}
