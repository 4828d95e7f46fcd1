// src/application/commands/token_commands.rs
//
// Token Command Handlers

use crate::application::{dto::TokenDto, state::AppState};
use crate::error::AppResult;

use super::search_limit;

/// Rank token names for a query
pub fn search_tokens(state: &AppState, query: &str, limit: i64) -> Vec<String> {
    state.token_searcher.search(query, search_limit(limit))
}

pub fn get_token(state: &AppState, name: &str) -> AppResult<TokenDto> {
    Ok(TokenDto::from(state.tokens.get_token(name)?))
}
