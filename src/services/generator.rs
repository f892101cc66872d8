// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client for the external activity generator.
//!
//! The generator is an opaque HTTP service that proposes activities for a
//! city. Each call is made at most once per request and bounded by a timeout;
//! failures are reported as `ExternalService` and never retried here.

use crate::error::AppError;
use crate::models::CanonicalCity;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// A candidate activity proposed by the generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedActivity {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl GeneratedActivity {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            category: None,
            description: None,
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    city_key: &'a str,
    display_name: &'a str,
    state: &'a str,
    country: &'a str,
    /// Names already in the catalog, so the generator can avoid them.
    existing_names: &'a [String],
}

#[derive(Deserialize)]
struct GenerateResponse {
    activities: Vec<GeneratedActivity>,
}

/// Canned generator behaviour for tests.
#[cfg_attr(not(debug_assertions), allow(dead_code))]
struct MockGenerator {
    activities: Vec<GeneratedActivity>,
    delay: Option<Duration>,
    failure: Option<String>,
}

#[derive(Clone)]
#[cfg_attr(not(debug_assertions), allow(dead_code))]
enum Backend {
    Http { http: reqwest::Client, url: String },
    Mock(Arc<MockGenerator>),
    Disabled,
}

/// Activity generator client.
#[derive(Clone)]
pub struct ActivityGenerator {
    backend: Backend,
    timeout: Duration,
}

impl ActivityGenerator {
    /// Create a client for the generator at `url`.
    pub fn new(url: String, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to build generator client: {}", e))
            })?;

        Ok(Self {
            backend: Backend::Http { http, url },
            timeout,
        })
    }

    /// A generator that never proposes anything. Used when no URL is configured.
    pub fn disabled() -> Self {
        Self {
            backend: Backend::Disabled,
            timeout: Duration::ZERO,
        }
    }

    /// Create a mock generator that always returns `activities`.
    /// Only available in debug/test builds.
    #[cfg(debug_assertions)]
    pub fn new_mock(activities: Vec<GeneratedActivity>) -> Self {
        Self::mock(activities, None, None, Duration::from_secs(5))
    }

    /// Mock whose every call fails with `message`.
    #[cfg(debug_assertions)]
    pub fn new_mock_failure(message: &str) -> Self {
        Self::mock(Vec::new(), None, Some(message.to_string()), Duration::from_secs(5))
    }

    /// Mock that answers only after `delay`, bounded by `timeout`.
    #[cfg(debug_assertions)]
    pub fn new_mock_slow(
        activities: Vec<GeneratedActivity>,
        delay: Duration,
        timeout: Duration,
    ) -> Self {
        Self::mock(activities, Some(delay), None, timeout)
    }

    #[cfg(debug_assertions)]
    fn mock(
        activities: Vec<GeneratedActivity>,
        delay: Option<Duration>,
        failure: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            backend: Backend::Mock(Arc::new(MockGenerator {
                activities,
                delay,
                failure,
            })),
            timeout,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self.backend, Backend::Disabled)
    }

    /// Ask the generator for candidate activities in `city`.
    pub async fn generate(
        &self,
        city: &CanonicalCity,
        existing_names: &[String],
    ) -> Result<Vec<GeneratedActivity>, AppError> {
        match &self.backend {
            Backend::Disabled => Ok(Vec::new()),
            Backend::Mock(mock) => {
                tokio::time::timeout(self.timeout, async {
                    if let Some(delay) = mock.delay {
                        tokio::time::sleep(delay).await;
                    }
                    match &mock.failure {
                        Some(message) => Err(AppError::ExternalService(message.clone())),
                        None => Ok(mock.activities.clone()),
                    }
                })
                .await
                .map_err(|_| timeout_error(self.timeout))?
            }
            Backend::Http { http, url } => {
                let request = GenerateRequest {
                    city_key: &city.city_key,
                    display_name: &city.display_name,
                    state: &city.state,
                    country: &city.country,
                    existing_names,
                };

                tokio::time::timeout(self.timeout, call_http(http, url, &request))
                    .await
                    .map_err(|_| timeout_error(self.timeout))?
            }
        }
    }
}

fn timeout_error(timeout: Duration) -> AppError {
    AppError::ExternalService(format!(
        "Activity generator timed out after {}ms",
        timeout.as_millis()
    ))
}

async fn call_http(
    http: &reqwest::Client,
    url: &str,
    request: &GenerateRequest<'_>,
) -> Result<Vec<GeneratedActivity>, AppError> {
    let response = http
        .post(url)
        .json(request)
        .send()
        .await
        .map_err(|e| AppError::ExternalService(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::ExternalService(format!(
            "HTTP {}: {}",
            status, body
        )));
    }

    let parsed: GenerateResponse = response
        .json()
        .await
        .map_err(|e| AppError::ExternalService(format!("JSON parse error: {}", e)))?;

    Ok(parsed.activities)
}
