//! civic-feed/crates/services/src/lib.rs
//!
//! The client core: the request gateway with its single-flight refresh
//! coordination, the typed API clients built on top of it, and the feed
//! controller with its scroll and pull-to-refresh machinery.

pub mod clients;
pub mod feed;
pub mod gateway;
pub mod gesture;
pub mod refresh;

pub use clients::{FeedClient, SessionService};
pub use feed::{FeedController, FeedState, ScrollMetrics};
pub use gateway::RequestGateway;
pub use gesture::{GesturePhase, PullEffect, PullGesture};
pub use refresh::RefreshCoordinator;
