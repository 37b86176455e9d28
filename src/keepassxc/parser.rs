/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! keepassxc-cliの出力を解釈するモジュール
//!
//! いずれの関数もI/Oを伴わない。
//!

use super::error::KpxcError;
use super::types::{AccountRecord, EntryIdentity};

/// フィールド行のラベルと値の区切り
const FIELD_SEPARATOR: &str = ": ";

/// 先頭から固定位置に並ぶフィールドのラベル
const FIXED_LABELS: [&str; 5] = ["Title", "UserName", "Password", "URL", "Notes"];

/// 末尾に並ぶフィールドのラベル
const TRAILING_LABELS: [&str; 2] = ["Uuid", "Tags"];

/// 備考行の位置
const NOTES_LINE: usize = 4;

///
/// 一覧出力の1行をエントリ識別情報に変換する
///
/// # 引数
/// * `line` - "/group/.../title"形式の行
///
/// # 戻り値
/// 最後のセグメントをタイトル、それ以前を"/"で連結したものをグループとしたエ
/// ントリ識別情報を返す。
///
pub(crate) fn parse_identity(line: &str) -> EntryIdentity {
    let path = line.strip_prefix('/').unwrap_or(line);

    match path.rsplit_once('/') {
        Some((group, title)) => EntryIdentity::new(title, group),
        None => EntryIdentity::new(path, ""),
    }
}

///
/// 一覧出力全体をエントリ識別情報のリストに変換する
///
/// # 注記
/// 空行は読み飛ばす。
///
pub(crate) fn parse_listing(stdout: &str) -> Vec<EntryIdentity> {
    stdout.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(parse_identity)
        .collect()
}

///
/// "Label: value"形式の行から値部分を取り出す
///
fn field_value(line: Option<&str>) -> String {
    line.and_then(|line| line.split_once(FIELD_SEPARATOR))
        .map(|(_, value)| value.to_string())
        .unwrap_or_default()
}

///
/// 全属性表示の出力を行単位に分割する
///
/// # 注記
/// 末尾の改行1つは行として扱わない。
///
fn record_lines(stdout: &str) -> Vec<&str> {
    let body = stdout.strip_suffix('\n').unwrap_or(stdout);

    body.split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .collect()
}

///
/// 全属性表示の出力をアカウントレコードに変換する
///
/// # 引数
/// * `stdout` - `show --show-protected`の出力
///
/// # 戻り値
/// 変換結果のアカウントレコード
///
/// # 注記
/// 先頭5行は固定位置(Title, UserName, Password, URL, Notes)、末尾2行はUuidと
/// Tagsとして扱う。備考行とUuid行の間にある行は複数行に渡る備考の続きとして
/// 連結する。行数が足りない場合は取り出せたフィールドだけを埋める。
///
pub(crate) fn parse_record(stdout: &str) -> AccountRecord {
    let lines = record_lines(stdout);
    let n = lines.len();

    let fixed = |index: usize| field_value(lines.get(index).copied());

    let (uuid, tags, continuation) = if n >= FIXED_LABELS.len() + TRAILING_LABELS.len() {
        (
            field_value(Some(lines[n - 2])),
            field_value(Some(lines[n - 1])),
            &lines[NOTES_LINE + 1..n - 2],
        )
    } else {
        (String::new(), String::new(), &lines[0..0])
    };

    let mut notes = fixed(NOTES_LINE);
    for line in continuation {
        notes.push('\n');
        notes.push_str(line);
    }

    AccountRecord {
        title: fixed(0),
        username: fixed(1),
        password: fixed(2),
        url: fixed(3),
        notes,
        uuid,
        tags,
    }
}

///
/// 全属性表示の出力を、行構成を検証しながらアカウントレコードに変換する
///
/// # 戻り値
/// 行数またはラベルが想定と異なる場合は`KpxcError::ParseLayout`を返す。
///
pub(crate) fn parse_record_strict(stdout: &str) -> Result<AccountRecord, KpxcError> {
    let lines = record_lines(stdout);
    let n = lines.len();
    let min = FIXED_LABELS.len() + TRAILING_LABELS.len();

    if n < min {
        return Err(KpxcError::ParseLayout(
            format!("expected at least {min} lines, got {n}")
        ));
    }

    let expected = FIXED_LABELS.iter()
        .enumerate()
        .chain(TRAILING_LABELS.iter().enumerate().map(|(i, l)| (n - 2 + i, l)));

    for (index, label) in expected {
        if !lines[index].starts_with(&format!("{label}:")) {
            return Err(KpxcError::ParseLayout(
                format!("line {} is not a {label} field", index + 1)
            ));
        }
    }

    Ok(parse_record(stdout))
}
