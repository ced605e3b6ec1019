// Copyright 2025 Memophor Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTTP API handlers for the fortune service.
//!
//! - `GET /healthz` - Service health check
//! - `GET /metrics` - Prometheus metrics export
//! - `GET|POST /profiles` - List or register profiles
//! - `GET|PUT|DELETE /profiles/:id` - Read, edit or remove one profile
//! - `POST /profiles/:id/fortune` - Run today's fortune for a profile
//! - `GET /profiles/:id/fortune` - Latest observed fortune state
//! - `GET /images?url=` - Raw bytes of a cached image

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Local;
use tokio::sync::{watch, RwLock};
use uuid::Uuid;

use crate::cache::ImageCache;
use crate::error::AppError;
use crate::form::{ProfileForm, ProfileInput};
use crate::images::ImageService;
use crate::metrics::Metrics;
use crate::model::{ImageQuery, Profile, ProfileList};
use crate::orchestrator::{FortuneOrchestrator, FortuneView};
use crate::state::ProfileStore;
use crate::upstream::FortuneApi;

#[derive(Clone)]
pub struct AppState {
    pub profiles: ProfileStore,
    pub fortune_api: Arc<dyn FortuneApi>,
    pub images: Arc<dyn ImageService>,
    pub image_cache: ImageCache,
    pub metrics: Metrics,
    /// Latest fortune run per profile, as seen by its observers.
    pub sessions: Arc<RwLock<HashMap<Uuid, watch::Receiver<FortuneView>>>>,
}

impl AppState {
    pub fn new(
        profiles: ProfileStore,
        fortune_api: Arc<dyn FortuneApi>,
        images: Arc<dyn ImageService>,
        image_cache: ImageCache,
        metrics: Metrics,
    ) -> Self {
        Self {
            profiles,
            fortune_api,
            images,
            image_cache,
            metrics,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(metrics))
        .route("/profiles", get(list_profiles).post(create_profile))
        .route(
            "/profiles/:id",
            get(get_profile).put(update_profile).delete(delete_profile),
        )
        .route("/profiles/:id/fortune", get(get_fortune).post(run_fortune))
        .route("/images", get(get_image))
        .with_state(state)
}

/// Health check endpoint
pub async fn health() -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": "prefecture-fortune",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

/// Metrics endpoint
pub async fn metrics(State(state): State<AppState>) -> Result<String, AppError> {
    state.metrics.update_profiles(state.profiles.len().await);
    state.metrics.export()
}

pub async fn list_profiles(State(state): State<AppState>) -> Json<ProfileList> {
    Json(ProfileList {
        profiles: state.profiles.list().await,
    })
}

pub async fn create_profile(
    State(state): State<AppState>,
    Json(input): Json<ProfileInput>,
) -> Result<(StatusCode, Json<Profile>), AppError> {
    let mut form = ProfileForm::create();
    form.apply(input)?;
    let profile = form.save()?;

    let created = state.profiles.create(profile).await;
    state.metrics.update_profiles(state.profiles.len().await);

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Profile>, AppError> {
    state
        .profiles
        .get(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::not_found("profile not found"))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ProfileInput>,
) -> Result<Json<Profile>, AppError> {
    let Some(existing) = state.profiles.get(id).await else {
        return Err(AppError::not_found("profile not found"));
    };

    let mut form = ProfileForm::edit(existing);
    form.apply(input)?;
    let profile = form.save()?;

    state
        .profiles
        .update(profile)
        .await
        .map(Json)
        .ok_or_else(|| AppError::not_found("profile not found"))
}

pub async fn delete_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.profiles.delete(id).await {
        return Err(AppError::not_found("profile not found"));
    }

    state.sessions.write().await.remove(&id);
    state.metrics.update_profiles(state.profiles.len().await);

    Ok(StatusCode::NO_CONTENT)
}

/// Run today's fortune for a profile and return the terminal state
pub async fn run_fortune(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FortuneView>, AppError> {
    let Some(mut profile) = state.profiles.get(id).await else {
        return Err(AppError::not_found("profile not found"));
    };

    let orchestrator = FortuneOrchestrator::new(state.fortune_api.clone(), state.images.clone())
        .with_store(state.profiles.clone());
    state
        .sessions
        .write()
        .await
        .insert(id, orchestrator.subscribe());

    let today = Local::now().date_naive();
    let view = orchestrator.run(&mut profile, today).await;

    // A delete that raced the run found no session to remove.
    if state.profiles.get(id).await.is_none() {
        state.sessions.write().await.remove(&id);
    }

    Ok(Json(view))
}

/// Latest fortune state observed for a profile
pub async fn get_fortune(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FortuneView>, AppError> {
    let sessions = state.sessions.read().await;
    let Some(receiver) = sessions.get(&id) else {
        return Err(AppError::not_found("no fortune requested for this profile"));
    };

    let view = receiver.borrow().clone();
    Ok(Json(view))
}

/// Serve a cached image by its source URL
pub async fn get_image(
    State(state): State<AppState>,
    Query(query): Query<ImageQuery>,
) -> Result<Response, AppError> {
    if query.url.trim().is_empty() {
        return Err(AppError::bad_request("url query parameter is required"));
    }

    let Some(image) = state.image_cache.get(&query.url).await else {
        return Err(AppError::not_found("image not cached"));
    };

    Ok(([(header::CONTENT_TYPE, image.content_type)], image.bytes).into_response())
}
