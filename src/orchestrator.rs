// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Fortune retrieval flow.
//!
//! One run asks the fortune service for today's prefecture, attaches it to
//! the profile, then fetches the prefecture logo and searches a header photo
//! concurrently. Observers follow progress through a `watch` channel and see
//! `loading` followed by exactly one terminal state.

use std::sync::Arc;

use chrono::NaiveDate;
use futures_util::future;
use serde::Serialize;
use tokio::sync::watch;
use url::Url;

use crate::codec::FortuneRequest;
use crate::images::ImageService;
use crate::model::{FortuneResult, Image, Profile};
use crate::state::ProfileStore;
use crate::upstream::FortuneApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSlot {
    Logo,
    Header,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FetchPhase {
    Idle,
    Loading,
    Success,
    /// Fortune arrived but at least one image slot stayed empty.
    PartialFailure { missing: Vec<ImageSlot> },
    Failure,
}

/// Snapshot published to observers of a run.
#[derive(Debug, Clone, Serialize)]
pub struct FortuneView {
    pub phase: FetchPhase,
    pub is_loading: bool,
    pub fortune: Option<FortuneResult>,
    pub logo_image: Option<Image>,
    pub header_image: Option<Image>,
}

impl FortuneView {
    pub fn idle() -> Self {
        Self {
            phase: FetchPhase::Idle,
            is_loading: false,
            fortune: None,
            logo_image: None,
            header_image: None,
        }
    }

    fn loading() -> Self {
        Self {
            phase: FetchPhase::Loading,
            is_loading: true,
            ..Self::idle()
        }
    }

    fn failed() -> Self {
        Self {
            phase: FetchPhase::Failure,
            ..Self::idle()
        }
    }

    fn completed(fortune: FortuneResult, logo: Option<Image>, header: Option<Image>) -> Self {
        let mut missing = Vec::new();
        if logo.is_none() {
            missing.push(ImageSlot::Logo);
        }
        if header.is_none() {
            missing.push(ImageSlot::Header);
        }

        let phase = if missing.is_empty() {
            FetchPhase::Success
        } else {
            FetchPhase::PartialFailure { missing }
        };

        Self {
            phase,
            is_loading: false,
            fortune: Some(fortune),
            logo_image: logo,
            header_image: header,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self.phase, FetchPhase::Idle | FetchPhase::Loading)
    }
}

pub struct FortuneOrchestrator {
    api: Arc<dyn FortuneApi>,
    images: Arc<dyn ImageService>,
    store: Option<ProfileStore>,
    publisher: watch::Sender<FortuneView>,
}

impl FortuneOrchestrator {
    pub fn new(api: Arc<dyn FortuneApi>, images: Arc<dyn ImageService>) -> Self {
        let (publisher, _) = watch::channel(FortuneView::idle());
        Self {
            api,
            images,
            store: None,
            publisher,
        }
    }

    /// Also attach arriving fortunes to the stored copy of the profile.
    pub fn with_store(mut self, store: ProfileStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<FortuneView> {
        self.publisher.subscribe()
    }

    pub fn current(&self) -> FortuneView {
        self.publisher.borrow().clone()
    }

    fn publish(&self, view: FortuneView) {
        self.publisher.send_replace(view);
    }

    /// Run the fortune flow for `profile` as of `today` and return the
    /// terminal state. The fortune is attached to `profile`, and to the
    /// store when one is set, before any image is requested.
    pub async fn run(&self, profile: &mut Profile, today: NaiveDate) -> FortuneView {
        self.publish(FortuneView::loading());

        let request = FortuneRequest::new(profile, today);
        let fortune = match self.api.post_fortune(&request).await {
            Ok(fortune) => fortune,
            Err(error) => {
                tracing::warn!(%error, profile = %profile.id, "fortune lookup failed");
                let view = FortuneView::failed();
                self.publish(view.clone());
                return view;
            }
        };

        profile.attach_fortune(fortune.clone());
        if let Some(store) = &self.store {
            if !store.attach_fortune(profile.id, fortune.clone()).await {
                tracing::debug!(
                    profile = %profile.id,
                    "profile removed while its fortune was loading"
                );
            }
        }
        tracing::info!(
            profile = %profile.id,
            prefecture = %fortune.prefecture.name,
            "fortune received"
        );

        let prefecture = &fortune.prefecture;
        let (logo, header) = future::join(
            self.load_logo(&prefecture.logo_url),
            self.load_header(&prefecture.name),
        )
        .await;

        let view = FortuneView::completed(fortune, logo, header);
        self.publish(view.clone());
        view
    }

    async fn load_logo(&self, url: &Url) -> Option<Image> {
        match self.images.fetch_image(url).await {
            Ok(image) => Some(image),
            Err(error) => {
                tracing::warn!(%error, slot = "logo", url = %url, "image unavailable");
                None
            }
        }
    }

    async fn load_header(&self, query: &str) -> Option<Image> {
        match self.images.search_image(query).await {
            Ok(image) => Some(image),
            Err(error) => {
                tracing::warn!(%error, slot = "header", query, "image unavailable");
                None
            }
        }
    }
}
