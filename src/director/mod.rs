//! URL-based routing: scenes, query parameters and routes.
//!
//! A [`Director`] turns an inbound app URL into the ordered [`Scene`]s it
//! names plus the [`QueryParameter`]s it recognizes, and builds such URLs
//! back from scenes and parameters. A [`Route`] turns the terminal scene and
//! parameters into a concrete routing intent.

#[allow(clippy::module_inception)]
mod director;
mod query_parameter;
mod route;
mod scene;

pub use director::{Destination, Director};
pub(crate) use director::is_addressable;
pub use query_parameter::{QueryMap, QueryParameter};
pub use route::Route;
pub use scene::Scene;
