// SPDX-FileCopyrightText: 2023 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use binrw::binrw;

/// The language a row, sheet page, or string is written in.
///
/// Sheet data is stored once per supported language; [Language::None] is
/// used for language-agnostic sheets (item IDs, numeric constants, etc).
#[binrw]
#[brw(repr(u8))]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    /// Language-agnostic data.
    None = 0,
    /// Japanese.
    Japanese = 1,
    /// English.
    English = 2,
    /// German.
    German = 3,
    /// French.
    French = 4,
    /// Chinese (Simplified).
    ChineseSimplified = 5,
    /// Chinese (Traditional).
    ChineseTraditional = 6,
    /// Korean.
    Korean = 7,
}

impl Language {
    /// Returns the shorthand code used in `.exd` filenames, e.g. English becomes "en".
    /// [Language::None] has no suffix.
    pub fn shortname(&self) -> &'static str {
        match self {
            Language::None => "",
            Language::Japanese => "ja",
            Language::English => "en",
            Language::German => "de",
            Language::French => "fr",
            Language::ChineseSimplified => "chs",
            Language::ChineseTraditional => "cht",
            Language::Korean => "ko",
        }
    }
}
