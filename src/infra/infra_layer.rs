// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "stock/yahoo_client.rs"]
pub mod stock;
