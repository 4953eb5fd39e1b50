// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "emoji_stats/mod.rs"]
pub mod emoji_stats;

#[path = "timezones/timezone_service.rs"]
pub mod timezones;

#[path = "stock/stock_service.rs"]
pub mod stock;

#[path = "youtube/thumbnail_service.rs"]
pub mod youtube;

#[path = "misc/misc_service.rs"]
pub mod misc;
