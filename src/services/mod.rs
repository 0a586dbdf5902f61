// Service exports
pub mod cache;
pub mod hub;
pub mod poll;
pub mod supabase;

pub use cache::{CacheKey, CacheStats, FeedCache};
pub use hub::{Hub, ProductSubscription, ZoneSubscription};
pub use poll::{poll_until, PollError, PollOptions};
pub use supabase::{SupabaseClient, SupabaseError, SupabaseTables};
