// src/infrastructure/mod.rs
//
// Infrastructure Layer
//
// Contains implementation details that support the domain
// but are not part of the domain itself.
//
// RULES:
// - Infrastructure serves the domain
// - Infrastructure never dictates domain behavior
// - Infrastructure is replaceable

pub mod cache;
pub mod imaging;
pub mod worker_pool;

pub use cache::LruCache;
pub use imaging::{
    bgr_to_rgb, load_thumbnail, load_token_image, post_process_frame, remove_background, save_png, RawFrame,
};
pub use worker_pool::{build_all, default_worker_count, round_robin};
