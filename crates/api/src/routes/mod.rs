//! Route groups, one module per resource.

mod evaluations;
mod health;
mod interviews;
mod responses;
mod stats;
mod subscriptions;
mod users;

pub use evaluations::evaluation_routes;
pub use health::health_routes;
pub use interviews::interview_routes;
pub use responses::response_routes;
pub use stats::stats_routes;
pub use subscriptions::subscription_routes;
pub use users::user_routes;
