// Road distances from an OSRM server's Route service
//
// Failures that may clear up on retry are UpstreamUnavailable, so the cost
// matrix falls back to the great-circle estimate for that pair. Only an
// explicit NoRoute answer is Unreachable.
// http://project-osrm.org/docs/v5.24.0/api/#route-service

use crate::error::CostError;
use crate::models::{Coordinate, Leg};
use crate::utils::distance::TravelCost;
use log::debug;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

/// Default user agent for OSRM requests
pub const DEFAULT_USER_AGENT: &str = "cheap-stop/0.1";

/// Default per-request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Configuration for [`OsrmProvider`]
#[derive(Debug, Clone)]
pub struct OsrmConfig {
    /// Base URL of the OSRM service (e.g. `"http://localhost:5000"`)
    pub base_url: String,
    /// Routing profile segment of the URL, `driving` by default
    pub profile: String,
    /// Timeout applied to each request
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "driving".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl OsrmConfig {
    /// Create a configuration for the given base URL
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// OSRM Route service response, reduced to what the optimizer needs
#[derive(Debug, Deserialize)]
struct RouteServiceResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<RouteSummary>,
}

/// Distance in meters, duration in seconds
#[derive(Debug, Deserialize)]
struct RouteSummary {
    distance: f64,
    duration: f64,
}

/// Blocking OSRM client used as a primary [`TravelCost`]
#[derive(Debug)]
pub struct OsrmProvider {
    client: Client,
    config: OsrmConfig,
}

impl OsrmProvider {
    /// Create a provider with default settings for `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::with_config(OsrmConfig::new(base_url))
    }

    /// Create a provider with explicit configuration
    pub fn with_config(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OsrmConfig {
        &self.config
    }

    /// `{base_url}/route/v1/{profile}/{lng},{lat};{lng},{lat}?overview=false`
    fn route_url(&self, from: &Coordinate, to: &Coordinate) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}?overview=false",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            from.lng,
            from.lat,
            to.lng,
            to.lat
        )
    }
}

impl TravelCost for OsrmProvider {
    fn cost(&self, from: Coordinate, to: Coordinate) -> Result<Leg, CostError> {
        if from == to {
            return Ok(Leg::ZERO);
        }

        let url = self.route_url(&from, &to);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| convert_reqwest_error(&err, &url))?;

        // OSRM reports NoRoute and friends in a JSON body with a 4xx status,
        // so the body is read before the status is judged.
        let status = response.status();
        let body: RouteServiceResponse =
            response
                .json()
                .map_err(|err| CostError::UpstreamUnavailable {
                    message: format!("{url} answered {status} with an unreadable body: {err}"),
                })?;

        debug!("OSRM {} -> {}", url, body.code);
        convert_response(body)
    }
}

fn convert_reqwest_error(error: &reqwest::Error, url: &str) -> CostError {
    let message = if error.is_timeout() {
        format!("request to {url} timed out")
    } else if let Some(status) = error.status() {
        format!("{url} answered {status}")
    } else {
        format!("request to {url} failed: {error}")
    };
    CostError::UpstreamUnavailable { message }
}

fn convert_response(response: RouteServiceResponse) -> Result<Leg, CostError> {
    match response.code.as_str() {
        "Ok" => response
            .routes
            .first()
            .map(|route| Leg::new(route.distance, route.duration))
            .ok_or_else(|| CostError::Unreachable {
                message: "OSRM returned no routes".to_string(),
            }),
        "NoRoute" => Err(CostError::Unreachable {
            message: response
                .message
                .unwrap_or_else(|| "no route found".to_string()),
        }),
        code => Err(CostError::UpstreamUnavailable {
            message: format!(
                "OSRM answered {code}: {}",
                response.message.unwrap_or_default()
            ),
        }),
    }
}
