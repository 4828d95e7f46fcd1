// src/application/dto/mod.rs
//
// Data Transfer Objects
//
// CRITICAL PRINCIPLES:
// - DTOs are what the CLI prints (plain text or `--json`)
// - DTOs NEVER carry decoded pixels
// - Conversion FROM domain records only (never TO)

use serde::{Deserialize, Serialize};

use crate::domain::{MapAsset, TokenAsset};

// ============================================================================
// MAP DTOs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDto {
    pub name: String,
    pub path: String,
    pub tags: Vec<String>,
    pub thumbnail_path: String,
    pub origin: Option<String>,
    pub favorite: bool,
}

impl From<MapAsset> for MapDto {
    fn from(asset: MapAsset) -> Self {
        Self {
            name: asset.name,
            path: asset.path.display().to_string(),
            tags: asset.tags.into_iter().collect(),
            thumbnail_path: asset.thumbnail_path.display().to_string(),
            origin: asset.origin,
            favorite: asset.favorite,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagChangeDto {
    pub name: String,
    /// Tags actually added or removed
    pub changed: Vec<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameDto {
    pub old_name: String,
    pub new_name: String,
}

// ============================================================================
// TOKEN DTOs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenDto {
    pub name: String,
    pub path: String,
    pub width: u32,
    pub height: u32,
}

impl From<TokenAsset> for TokenDto {
    fn from(token: TokenAsset) -> Self {
        Self {
            name: token.name,
            path: token.path.display().to_string(),
            width: token.image.width(),
            height: token.image.height(),
        }
    }
}

// ============================================================================
// STREAM DTOs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameDto {
    pub index: usize,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramesReportDto {
    pub name: String,
    pub frame_count: Option<usize>,
    pub frames: Vec<FrameDto>,
}
