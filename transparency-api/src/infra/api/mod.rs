// This file is part of validator-transparency.
// Copyright (C) 2025 Validator Transparency Contributors
// SPDX-License-Identifier: Apache-2.0
// Licensed under the Apache License, Version 2.0 (the "License");
// You may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::Api;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{
        Method, StatusCode,
        header::{CACHE_CONTROL, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
    routing::get,
};
use log::info;
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{io, net::IpAddr};
use thiserror::Error;
use tokio::{
    net::TcpListener,
    signal::unix::{SignalKind, signal},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
};
use transparency_common::domain::KeyValueStore;
use trust_signals::{
    application::Monitor,
    domain::{InvalidVoteAccountError, Sources, ValidatorSelection, VoteAccount, VoteAccountInfo},
};

const JITO_CACHE_CONTROL: &str = "s-maxage=60, stale-while-revalidate=300";
const NO_STORE: &str = "no-store";

/// [Api] implementation based on axum.
pub struct AxumApi<S, K> {
    config: Config,
    monitor: Monitor<S, K>,
}

impl<S, K> AxumApi<S, K> {
    pub fn new(config: Config, monitor: Monitor<S, K>) -> Self {
        Self { config, monitor }
    }
}

impl<S, K> Api for AxumApi<S, K>
where
    S: Sources,
    K: KeyValueStore,
{
    type Error = AxumApiError;

    async fn serve(self) -> Result<(), Self::Error> {
        let Config {
            address,
            port,
            request_body_limit,
        } = self.config;

        let app = make_app(self.monitor, request_body_limit as usize);

        let listener = TcpListener::bind((address, port))
            .await
            .map_err(AxumApiError::Bind)?;
        info!(address:?, port; "listening to TCP connections");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(AxumApiError::Serve)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub address: IpAddr,

    pub port: u16,

    #[serde(with = "byte_unit_serde")]
    pub request_body_limit: u64,
}

#[derive(Debug, Error)]
pub enum AxumApiError {
    #[error("cannot bind tcp listener")]
    Bind(#[source] io::Error),

    #[error("cannot serve API")]
    Serve(#[source] io::Error),
}

/// Client errors, answered with 400 and `{"error": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing vote param")]
    MissingVote,

    #[error(transparent)]
    InvalidVote(#[from] InvalidVoteAccountError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.to_string() });
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct ValidatorQuery {
    vote: Option<String>,
    name: Option<String>,
}

impl ValidatorQuery {
    fn vote(&self) -> Result<VoteAccount, ApiError> {
        let vote = self
            .vote
            .as_deref()
            .map(str::trim)
            .filter(|vote| !vote.is_empty())
            .ok_or(ApiError::MissingVote)?;

        Ok(vote.parse()?)
    }
}

#[derive(Debug, Serialize)]
struct RpcResponse {
    ok: bool,
    data: Option<VoteAccountInfo>,

    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn make_app<S, K>(monitor: Monitor<S, K>, request_body_limit: usize) -> Router
where
    S: Sources,
    K: KeyValueStore,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/ready", get(ready))
        .route("/api/rpc", get(rpc::<S, K>))
        .route("/api/jito", get(jito::<S, K>))
        .route("/api/ratings", get(ratings::<S, K>))
        .route("/api/dashboard", get(dashboard::<S, K>))
        .with_state(monitor)
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(request_body_limit))
                .layer(cors),
        )
}

async fn ready() -> impl IntoResponse {
    StatusCode::OK
}

async fn rpc<S, K>(
    State(monitor): State<Monitor<S, K>>,
    Query(query): Query<ValidatorQuery>,
) -> Result<Response, ApiError>
where
    S: Sources,
    K: KeyValueStore,
{
    counter!("transparency_api_calls", "endpoint" => "rpc").increment(1);

    let vote = query.vote()?;

    let response = match monitor.vote_account(&vote).await {
        Ok(lookup) => {
            let body = RpcResponse {
                ok: lookup.is_some(),
                data: lookup.map(|lookup| lookup.info),
                error: None,
            };
            (StatusCode::OK, Json(body)).into_response()
        }

        Err(error) => {
            let body = RpcResponse {
                ok: false,
                data: None,
                error: Some(error.to_string()),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    };

    Ok(response)
}

async fn jito<S, K>(
    State(monitor): State<Monitor<S, K>>,
    Query(query): Query<ValidatorQuery>,
) -> Result<Response, ApiError>
where
    S: Sources,
    K: KeyValueStore,
{
    counter!("transparency_api_calls", "endpoint" => "jito").increment(1);

    let vote = query.vote()?;
    let status = monitor.jito(&vote).await;

    // Degraded answers must not be cached.
    let response = if status.error.is_none() {
        ([(CACHE_CONTROL, JITO_CACHE_CONTROL)], Json(status)).into_response()
    } else {
        Json(status).into_response()
    };

    Ok(response)
}

async fn ratings<S, K>(
    State(monitor): State<Monitor<S, K>>,
    Query(query): Query<ValidatorQuery>,
) -> Result<Response, ApiError>
where
    S: Sources,
    K: KeyValueStore,
{
    counter!("transparency_api_calls", "endpoint" => "ratings").increment(1);

    let vote = query.vote()?;
    let ratings = monitor.ratings(&vote).await;

    Ok(([(CACHE_CONTROL, NO_STORE)], Json(ratings)).into_response())
}

async fn dashboard<S, K>(
    State(monitor): State<Monitor<S, K>>,
    Query(query): Query<ValidatorQuery>,
) -> Result<Response, ApiError>
where
    S: Sources,
    K: KeyValueStore,
{
    counter!("transparency_api_calls", "endpoint" => "dashboard").increment(1);

    let selection = ValidatorSelection::from_params(
        query.vote.as_deref(),
        query.name.as_deref(),
        &monitor.config().validator,
    )?;
    let dashboard = monitor.dashboard(selection).await;

    Ok(([(CACHE_CONTROL, NO_STORE)], Json(dashboard)).into_response())
}

async fn shutdown_signal() {
    signal(SignalKind::terminate())
        .expect("install SIGTERM handler")
        .recv()
        .await;
}

#[cfg(test)]
mod tests {
    use crate::infra::api::make_app;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{
            Method, Request, StatusCode,
            header::{ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, ORIGIN},
        },
    };
    use assert_matches::assert_matches;
    use serde_json::{Value, json};
    use thiserror::Error;
    use tower::ServiceExt;
    use transparency_common::{
        domain::KeyValueStore, infra::kv_store::in_mem::InMemKeyValueStore,
    };
    use trust_signals::{
        application::{Config, Monitor},
        domain::{
            JitoStatus, Sources, StakewizRecord, TrilliumRating, VoteAccount, VoteAccountInfo,
            VoteAccountLookup,
        },
    };

    const VOTE: &str = "3QPGLackJy5LKctYYoPGmA4P8ncyE197jdxr1zP2ho8K";
    const UNAVAILABLE: &str = "Unavai1ab1e111111111111111111111111111111111";
    const UNKNOWN: &str = "Unknown1111111111111111111111111111111111";

    #[derive(Debug, Clone)]
    struct MockSources;

    #[derive(Debug, Error)]
    #[error("upstream unavailable")]
    struct MockSourcesError;

    impl Sources for MockSources {
        type Error = MockSourcesError;

        async fn vote_account(
            &self,
            vote: &VoteAccount,
        ) -> Result<Option<VoteAccountLookup>, Self::Error> {
            match &**vote {
                VOTE => Ok(Some(VoteAccountLookup {
                    info: VoteAccountInfo {
                        vote_pubkey: VOTE.to_owned(),
                        node_pubkey: Some("5pPRHniefFjkiaArbGX3Y8NUysJmQ9tMZg3FrFGwHzSm".to_owned()),
                        commission: Some(5),
                        epoch_credits: vec![],
                        activated_stake: None,
                        last_vote: None,
                        root_slot: None,
                    },
                    delinquent: false,
                })),
                UNAVAILABLE => Err(MockSourcesError),
                _ => Ok(None),
            }
        }

        async fn jito(&self, vote: &VoteAccount) -> Result<JitoStatus, Self::Error> {
            match &**vote {
                UNAVAILABLE => Err(MockSourcesError),
                vote => Ok(JitoStatus {
                    jito: vote == VOTE,
                    matched: (vote == VOTE).then(|| VOTE.to_owned()),
                    count: 1,
                    error: None,
                }),
            }
        }

        async fn stakewiz(
            &self,
            _vote: &VoteAccount,
        ) -> Result<Option<StakewizRecord>, Self::Error> {
            Ok(None)
        }

        async fn trillium(
            &self,
            _vote: &VoteAccount,
        ) -> Result<Option<TrilliumRating>, Self::Error> {
            Err(MockSourcesError)
        }
    }

    fn app() -> Router {
        app_with_store(InMemKeyValueStore::default())
    }

    fn app_with_store(store: InMemKeyValueStore) -> Router {
        let monitor = Monitor::new(Config::default(), MockSources, store);
        make_app(monitor, 1024)
    }

    async fn get(uri: &str) -> anyhow::Result<(StatusCode, Option<String>, Value)> {
        get_with(app(), uri).await
    }

    async fn get_with(
        app: Router,
        uri: &str,
    ) -> anyhow::Result<(StatusCode, Option<String>, Value)> {
        let request = Request::builder().uri(uri).body(Body::empty())?;
        let response = app.oneshot(request).await?;

        let status = response.status();
        let cache_control = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned);
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body)?
        };

        Ok((status, cache_control, body))
    }

    #[tokio::test]
    async fn test_ready() -> anyhow::Result<()> {
        let (status, _, _) = get("/ready").await?;
        assert_eq!(status, StatusCode::OK);

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_vote() -> anyhow::Result<()> {
        for uri in ["/api/rpc", "/api/jito?vote=", "/api/ratings?vote=%20"] {
            let (status, _, body) = get(uri).await?;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({ "error": "Missing vote param" }));
        }

        let (status, _, body) = get("/api/jito?vote=a%2Fb").await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        Ok(())
    }

    #[tokio::test]
    async fn test_rpc() -> anyhow::Result<()> {
        let (status, _, body) = get(&format!("/api/rpc?vote={VOTE}")).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], json!(true));
        assert_eq!(body["data"]["votePubkey"], json!(VOTE));
        assert_eq!(body["data"]["commission"], json!(5));

        let (status, _, body) = get(&format!("/api/rpc?vote={UNKNOWN}")).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "ok": false, "data": null }));

        let (status, _, body) = get(&format!("/api/rpc?vote={UNAVAILABLE}")).await?;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["ok"], json!(false));

        Ok(())
    }

    #[tokio::test]
    async fn test_jito() -> anyhow::Result<()> {
        let (status, cache_control, body) = get(&format!("/api/jito?vote={VOTE}")).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            cache_control.as_deref(),
            Some("s-maxage=60, stale-while-revalidate=300")
        );
        assert_eq!(body, json!({ "jito": true, "matched": VOTE, "count": 1 }));

        let (status, cache_control, body) = get(&format!("/api/jito?vote={UNAVAILABLE}")).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache_control, None);
        assert_eq!(
            body,
            json!({ "jito": false, "matched": null, "count": 0, "error": "proxy_error" })
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_ratings() -> anyhow::Result<()> {
        let (status, cache_control, body) = get(&format!("/api/ratings?vote={VOTE}")).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache_control.as_deref(), Some("no-store"));
        assert_eq!(body["vote"], json!(VOTE));
        assert_eq!(body["sources"]["stakewiz"], json!(null));
        assert_eq!(
            body["sources"]["trillium"],
            json!({ "error": "upstream unavailable" })
        );
        assert_eq!(body["derived"]["apy_values"], json!([]));
        assert_eq!(body["derived"]["apy_median"], json!(null));

        Ok(())
    }

    #[tokio::test]
    async fn test_dashboard() -> anyhow::Result<()> {
        let (status, cache_control, body) = get("/api/dashboard?name=Mine").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache_control.as_deref(), Some("no-store"));
        assert_eq!(body["validator"]["vote"], json!(VOTE));
        assert_eq!(body["validator"]["label"], json!("Mine"));
        assert_eq!(body["observation"]["status"], json!("healthy"));
        assert_eq!(body["stability"]["pills"].as_array().map(Vec::len), Some(5));
        assert!(body["stability"]["score"].is_u64());

        let (status, _, body) = get(&format!("/api/dashboard?vote={UNKNOWN}")).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["observation"]["status"], json!("not-found"));

        Ok(())
    }

    #[tokio::test]
    async fn test_dashboard_history_keys() -> anyhow::Result<()> {
        let store = InMemKeyValueStore::default();
        let long = "A".repeat(10_000);

        for vote in ["garbage1", "0OIl", long.as_str()] {
            let (status, _, body) =
                get_with(app_with_store(store.clone()), &format!("/api/dashboard?vote={vote}"))
                    .await?;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body["error"].is_string());
        }

        let (status, _, _) =
            get_with(app_with_store(store.clone()), &format!("/api/dashboard?vote={UNKNOWN}"))
                .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(store.get(&format!("stability-history:{UNKNOWN}")).await, Ok(None));

        let (status, _, _) =
            get_with(app_with_store(store.clone()), &format!("/api/dashboard?vote={VOTE}"))
                .await?;
        assert_eq!(status, StatusCode::OK);
        assert_matches!(store.get(&format!("stability-history:{VOTE}")).await, Ok(Some(_)));

        Ok(())
    }

    #[tokio::test]
    async fn test_cors() -> anyhow::Result<()> {
        let request = Request::builder()
            .uri("/ready")
            .header(ORIGIN, "https://someone.github.io")
            .body(Body::empty())?;
        let response = app().oneshot(request).await?;
        assert_eq!(
            response
                .headers()
                .get(ACCESS_CONTROL_ALLOW_ORIGIN)
                .map(|value| value.as_bytes()),
            Some(b"*".as_slice())
        );

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(format!("/api/jito?vote={VOTE}"))
            .header(ORIGIN, "https://someone.github.io")
            .header("access-control-request-method", "GET")
            .body(Body::empty())?;
        let response = app().oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::OK);

        Ok(())
    }
}
