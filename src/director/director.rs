use std::borrow::Cow;
use std::collections::HashMap;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::config::DirectorConfig;
use crate::director::query_parameter::{QueryMap, QueryParameter};
use crate::director::route::Route;
use crate::director::scene::Scene;
use crate::stagehand_log;

/// Escaped in every built component: all but RFC 3986 unreserved characters.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Where a URL leads: the scenes walked and the recognized parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Destination {
    pub scenes: Vec<Scene>,
    pub parameters: QueryMap,
}

/// Maps app URLs to scenes and query parameters, and back.
///
/// URLs have the shape `scheme://scene[/scene...][?key=value[&key=value...]]`.
/// Only URLs with the configured scheme whose host is a known scene are
/// handled. Immutable once built, so it can be shared freely across threads.
#[derive(Debug, Clone)]
pub struct Director {
    /// Only URLs that match this scheme will be parsed.
    scheme: String,
    /// Only scenes in this table will be parsed.
    scenes: HashMap<String, Scene>,
    /// Only query parameters in this table will be parsed.
    query_parameters: HashMap<String, QueryParameter>,
}

impl Director {
    /// Build a director for `scheme` recognizing the given scenes and query
    /// parameters.
    ///
    /// URL schemes are case-insensitive and `Url` normalizes them to lower
    /// case, so the scheme is stored lowercased.
    pub fn new(
        scheme: impl Into<String>,
        scenes: impl IntoIterator<Item = Scene>,
        query_parameters: impl IntoIterator<Item = QueryParameter>,
    ) -> Self {
        Self {
            scheme: scheme.into().to_ascii_lowercase(),
            scenes: scenes
                .into_iter()
                .map(|scene| (scene.raw_value().to_string(), scene))
                .collect(),
            query_parameters: query_parameters
                .into_iter()
                .map(|parameter| (parameter.raw_value().to_string(), parameter))
                .collect(),
        }
    }

    pub fn from_config(config: &DirectorConfig) -> Self {
        Self::new(
            config.scheme.clone(),
            config.scenes.iter().cloned(),
            config.query_parameters.iter().cloned(),
        )
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Look up a configured scene by its raw token.
    pub fn scene(&self, raw_value: &str) -> Option<&Scene> {
        self.scenes.get(raw_value)
    }

    /// Look up a configured query parameter by its raw token.
    pub fn query_parameter(&self, raw_value: &str) -> Option<&QueryParameter> {
        self.query_parameters.get(raw_value)
    }

    /// True if the URL matches the scheme and its host is a known scene.
    pub fn can_handle(&self, url: &Url) -> bool {
        url.scheme() == self.scheme && self.host_scene(url).is_some()
    }

    /// Decompose a URL into its scenes and recognized query parameters.
    ///
    /// Returns `None` when the URL cannot be handled.
    pub fn parse(&self, url: &Url) -> Option<Destination> {
        if !self.can_handle(url) {
            stagehand_log!("[Director] Cannot handle URL: {}", url);
            return None;
        }

        let destination = Destination {
            scenes: self.scenes_from_url(url),
            parameters: self.parameters_from_url(url),
        };
        stagehand_log!(
            "[Director] {} -> scenes {:?}, parameters {:?}",
            url,
            destination.scenes,
            destination.parameters
        );
        Some(destination)
    }

    /// Parse scenes from a URL, ignoring its query.
    pub fn decompose(&self, url: &Url) -> Vec<Scene> {
        self.parse(url)
            .map(|destination| destination.scenes)
            .unwrap_or_default()
    }

    /// Parse scenes from a URL and hand recognized query parameters to
    /// `handle_query`.
    ///
    /// `handle_query` runs at most once, before this returns, and only when
    /// at least one recognized parameter is present.
    pub fn decompose_with_query<F>(&self, url: &Url, handle_query: F) -> Vec<Scene>
    where
        F: FnOnce(QueryMap),
    {
        let Some(Destination { scenes, parameters }) = self.parse(url) else {
            return Vec::new();
        };
        if !parameters.is_empty() {
            handle_query(parameters);
        }
        scenes
    }

    /// Build the route `R` if the URL's terminal scene is `R::scene()`.
    pub fn route<R: Route>(&self, url: &Url) -> Option<R> {
        let destination = self.parse(url)?;
        let terminal = destination.scenes.last()?;
        if *terminal != R::scene() {
            stagehand_log!(
                "[Director] Terminal scene '{}' does not match route scene '{}'",
                terminal,
                R::scene()
            );
            return None;
        }
        R::from_parameters(terminal, &destination.parameters)
    }

    /// Create a URL for the given scenes and query parameters.
    ///
    /// Tokens and values are percent-encoded, so the URL decomposes back
    /// into the same scenes and parameters whatever characters they hold.
    /// Returns `None` for scenes that cannot be addressed (empty, `.` or
    /// `..`) or if the result is not a valid URL.
    pub fn build_url(&self, scenes: &[Scene], parameters: &QueryMap) -> Option<Url> {
        if let Some(scene) = scenes.iter().find(|scene| !is_addressable(scene.raw_value())) {
            stagehand_log!("[Director] Scene '{}' cannot be part of a URL", scene);
            return None;
        }

        let mut scene_url = format!("{}://", self.scheme);
        scene_url.push_str(
            &scenes
                .iter()
                .map(|scene| encode(scene.raw_value()))
                .collect::<Vec<_>>()
                .join("/"),
        );

        if !parameters.is_empty() {
            scene_url.push('?');
            let query = parameters
                .iter()
                .map(|(parameter, value)| {
                    format!("{}={}", encode(parameter.raw_value()), encode(value))
                })
                .collect::<Vec<_>>()
                .join("&");
            scene_url.push_str(&query);
        }

        match Url::parse(&scene_url) {
            Ok(url) => Some(url),
            Err(err) => {
                stagehand_log!("[Director] Invalid URL '{}': {}", scene_url, err);
                None
            }
        }
    }

    fn host_scene(&self, url: &Url) -> Option<&Scene> {
        let host = decode(url.host_str()?);
        self.scenes.get(host.as_ref())
    }

    /// Host scene first, then path segments until the first unknown one.
    fn scenes_from_url(&self, url: &Url) -> Vec<Scene> {
        let mut scenes = Vec::new();

        if let Some(scene) = self.host_scene(url) {
            scenes.push(scene.clone());
        }

        let segments = url
            .path_segments()
            .into_iter()
            .flatten()
            .filter(|segment| !segment.is_empty());
        for segment in segments {
            match self.scenes.get(decode(segment).as_ref()) {
                Some(scene) => scenes.push(scene.clone()),
                None => break,
            }
        }

        scenes
    }

    /// Splits on `&`, then each pair on its first `=`, then percent-decodes
    /// key and value. A pair without `=` has an empty value; later
    /// duplicates win.
    fn parameters_from_url(&self, url: &Url) -> QueryMap {
        let mut parameters = QueryMap::new();
        let Some(query) = url.query() else {
            return parameters;
        };

        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            if let Some(parameter) = self.query_parameters.get(decode(key).as_ref()) {
                parameters.insert(parameter.clone(), decode(value).into_owned());
            }
        }

        parameters
    }
}

/// Whether a scene survives URL path normalization.
pub(crate) fn is_addressable(token: &str) -> bool {
    !token.is_empty() && token != "." && token != ".."
}

fn encode(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT).to_string()
}

fn decode(raw: &str) -> Cow<'_, str> {
    percent_decode_str(raw).decode_utf8_lossy()
}
