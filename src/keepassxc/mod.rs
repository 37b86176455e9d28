/*
 * KeePassXC CLI bridge
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA
 */

//!
//! keepassxc-cliとの連携処理をまとめたモジュール
//!

pub(crate) mod error;
pub(crate) mod invoker;
pub(crate) mod parser;
pub(crate) mod rules;
pub(crate) mod types;

pub(crate) use error::KpxcError;
pub(crate) use invoker::{generate_password, CliRunner, KeePassXC, ProcessRunner};
pub(crate) use rules::GenerationRules;
pub(crate) use types::{
    AccountInfo, AccountRecord, Attribute, EntryIdentity, KeePassXCOptions
};
