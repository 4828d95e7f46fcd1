// src/events/types.rs
//
// All domain events in the system.
// Each event represents an immutable fact that has already occurred.
//
// CRITICAL RULES:
// - Events are facts, not commands
// - Events are emitted after the change is persisted
// - Events carry only the data needed to react

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Trait that all domain events must implement
pub trait DomainEvent: std::fmt::Debug + Clone {
    /// Unique identifier for this event instance
    fn event_id(&self) -> Uuid;

    /// When this event occurred
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Human-readable event type name
    fn event_type(&self) -> &'static str;
}

/// Declare an event from its payload fields.
///
/// Every event gets a fresh `event_id`, an `occurred_at` stamp, a
/// positional `new` over the payload, and its `DomainEvent` impl.
macro_rules! domain_event {
    ($(#[$meta:meta])* $name:ident { $($field:ident: $ty:ty),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Serialize, Deserialize)]
        pub struct $name {
            pub event_id: Uuid,
            pub occurred_at: DateTime<Utc>,
            $(pub $field: $ty,)*
        }

        impl $name {
            pub fn new($($field: $ty),*) -> Self {
                Self {
                    event_id: Uuid::new_v4(),
                    occurred_at: Utc::now(),
                    $($field,)*
                }
            }
        }

        impl DomainEvent for $name {
            fn event_id(&self) -> Uuid {
                self.event_id
            }

            fn occurred_at(&self) -> DateTime<Utc> {
                self.occurred_at
            }

            fn event_type(&self) -> &'static str {
                stringify!($name)
            }
        }
    };
}

// ============================================================================
// CATALOG EVENTS
// ============================================================================

domain_event! {
    /// Emitted once the bulk load barrier has been passed
    CatalogLoaded { asset_count: usize, tag_count: usize }
}

domain_event! {
    AssetAdded { name: String }
}

domain_event! {
    /// Emitted after the record and its files are gone
    AssetRemoved { name: String }
}

domain_event! {
    AssetRenamed { old_name: String, new_name: String }
}

domain_event! {
    AssetTagsChanged { name: String, added: Vec<String>, removed: Vec<String> }
}

domain_event! {
    FavoriteChanged { name: String, favorite: bool }
}

domain_event! {
    /// Emitted when a freshly downloaded video was probed and catalogued
    MediaImported { name: String, path: PathBuf }
}

// ============================================================================
// STREAM EVENTS
// ============================================================================

domain_event! {
    /// Emitted when the loader switches its active stream
    StreamActivated { name: String, frame_count: usize }
}

domain_event! {
    /// Emitted when a decode handle is closed
    StreamReleased { name: String }
}
