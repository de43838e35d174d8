use crate::director::query_parameter::QueryMap;
use crate::director::scene::Scene;

/// A routing intent that can be built from a terminal scene and the
/// recognized query parameters of a URL.
///
/// Returning `None` from [`from_parameters`](Route::from_parameters) is a
/// normal outcome meaning "no route for these parameters", e.g. when a
/// required parameter is missing or malformed.
pub trait Route: Sized {
    /// The scene this route is reached through.
    fn scene() -> Scene;

    fn from_parameters(scene: &Scene, parameters: &QueryMap) -> Option<Self>;
}
