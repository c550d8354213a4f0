// SPDX-FileCopyrightText: 2026 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::Path;

/// The root directory a file lives under. This is a fixed, known list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Category {
    /// Common files such as game fonts.
    Common = 0x00,
    /// Shared data between game maps.
    BackgroundCommon = 0x01,
    /// Game map data such as models and textures.
    Background = 0x02,
    /// Cutscene content such as animations.
    Cutscene = 0x03,
    /// Character model files and more.
    Character = 0x04,
    /// Compiled shaders.
    Shader = 0x05,
    /// UI layouts and textures.
    UI = 0x06,
    /// Sound effects.
    Sound = 0x07,
    /// Visual effects.
    VFX = 0x08,
    /// Leftover 1.0 UI scripting.
    UIScript = 0x09,
    /// Excel data.
    EXD = 0x0A,
    /// LUA game event scripts.
    GameScript = 0x0B,
    /// Music.
    Music = 0x0C,
    /// Used to test SqPack functionality.
    SqPackTest = 0x12,
    /// Debug files.
    Debug = 0x13,
}

impl Category {
    fn from_path_segment(segment: &str) -> Option<Category> {
        use Category::*;
        Some(match segment {
            "common" => Common,
            "bgcommon" => BackgroundCommon,
            "bg" => Background,
            "cut" => Cutscene,
            "chara" => Character,
            "shader" => Shader,
            "ui" => UI,
            "sound" => Sound,
            "vfx" => VFX,
            "ui_script" => UIScript,
            "exd" => EXD,
            "game_script" => GameScript,
            "music" => Music,
            "sqpack_test" => SqPackTest,
            "debug" => Debug,
            _ => return None,
        })
    }

    fn from_code(code: u8) -> Option<Category> {
        use Category::*;
        Some(match code {
            0x00 => Common,
            0x01 => BackgroundCommon,
            0x02 => Background,
            0x03 => Cutscene,
            0x04 => Character,
            0x05 => Shader,
            0x06 => UI,
            0x07 => Sound,
            0x08 => VFX,
            0x09 => UIScript,
            0x0A => EXD,
            0x0B => GameScript,
            0x0C => Music,
            0x12 => SqPackTest,
            0x13 => Debug,
            _ => return None,
        })
    }
}

/// Identifies a single SqPack shard: an expansion, a category within it, and a chunk
/// subdividing large categories. Derived from a shard's filename, e.g.
/// `0a0000.win32.index` is expansion 0, category [EXD](Category::EXD), chunk 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackId {
    pub expansion: u8,
    pub category: Category,
    pub chunk: u8,
}

impl PackId {
    /// Parses a shard's id out of its filename stem, expecting six hex digits
    /// `{category}{expansion}{chunk}` followed by `.win32.index[2]`.
    pub fn from_filename(path: &Path) -> Option<PackId> {
        let stem = path.file_name()?.to_str()?;
        let digits = stem.get(0..6)?;
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        let category = u8::from_str_radix(&digits[0..2], 16).ok()?;
        let expansion = u8::from_str_radix(&digits[2..4], 16).ok()?;
        let chunk = u8::from_str_radix(&digits[4..6], 16).ok()?;

        Some(PackId {
            expansion,
            category: Category::from_code(category)?,
            chunk,
        })
    }

    /// Resolves the expansion/category pair a virtual path names: the first
    /// segment is always the category, and the second segment is the expansion
    /// if it looks like `exN` (e.g. `bg/ex1/...`); otherwise expansion is 0.
    pub fn category_for_path(path: &str) -> Option<(u8, Category)> {
        let mut segments = path.split('/');
        let first = segments.next()?;
        let category = Category::from_path_segment(first)?;

        let expansion = segments
            .next()
            .and_then(|segment| segment.strip_prefix("ex"))
            .and_then(|rest| rest.parse::<u8>().ok())
            .unwrap_or(0);

        Some((expansion, category))
    }
}
