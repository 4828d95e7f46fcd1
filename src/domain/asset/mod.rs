pub mod entity;
pub mod invariants;
pub mod naming;

pub use entity::{resolve_path, MapAsset, MapEntry, TokenAsset, TokenEntry};
pub use invariants::{validate_map_asset, validate_token_asset};
pub use naming::{ascii_clean, normalize_name, normalize_tag, tag_words, title_case, tokenize};
