// src/application/commands/map_commands.rs
//
// Map Command Handlers
//
// RULES:
// - Call services
// - Return DTOs
// - Never contain business logic

use std::path::PathBuf;

use crate::application::{dto::*, state::AppState};
use crate::error::AppResult;
use crate::services::ImportRequest;

use super::search_limit;

/// Rank map names for a query
pub fn search_maps(state: &AppState, query: &str, limit: i64) -> Vec<String> {
    state.map_searcher.search(query, search_limit(limit))
}

pub fn get_map(state: &AppState, name: &str) -> AppResult<MapDto> {
    Ok(MapDto::from(state.catalog.get_asset(name)?))
}

pub fn list_favorites(state: &AppState) -> Vec<MapDto> {
    state
        .catalog
        .get_favorites()
        .into_iter()
        .map(MapDto::from)
        .collect()
}

/// Maps carrying any of the tags in `text`
pub fn maps_with_tags(state: &AppState, text: &str) -> Vec<MapDto> {
    state
        .catalog
        .assets_with_tags(text)
        .into_iter()
        .map(MapDto::from)
        .collect()
}

pub fn add_tags(state: &AppState, name: &str, text: &str) -> AppResult<TagChangeDto> {
    let changed = state.catalog.add_tags(name, text)?;
    tag_change(state, name, changed)
}

pub fn remove_tags(state: &AppState, name: &str, text: &str) -> AppResult<TagChangeDto> {
    let changed = state.catalog.remove_tags(name, text)?;
    tag_change(state, name, changed)
}

fn tag_change(state: &AppState, name: &str, changed: Vec<String>) -> AppResult<TagChangeDto> {
    let asset = state.catalog.get_asset(name)?;
    Ok(TagChangeDto {
        name: asset.name,
        changed,
        tags: asset.tags.into_iter().collect(),
    })
}

pub fn set_favorite(state: &AppState, name: &str, favorite: bool) -> AppResult<MapDto> {
    state.catalog.set_favorite(name, favorite)?;
    get_map(state, name)
}

pub fn rename_map(state: &AppState, name: &str, new_name: &str) -> AppResult<RenameDto> {
    let old_name = state.catalog.get_asset(name)?.name;
    let new_name = state.catalog.rename_asset(name, new_name)?;
    Ok(RenameDto { old_name, new_name })
}

/// Remove a map from the catalog and delete its files
pub fn remove_map(state: &AppState, name: &str) -> AppResult<MapDto> {
    Ok(MapDto::from(state.catalog.remove_asset(name)?))
}

pub fn import_map(
    state: &AppState,
    video_path: PathBuf,
    origin: Option<String>,
) -> AppResult<MapDto> {
    let asset = state.importer.import(ImportRequest { video_path, origin })?;
    Ok(MapDto::from(asset))
}
