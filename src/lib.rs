// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Prefecture fortune service.
//!
//! Registers profiles, asks a remote fortune service which Japanese
//! prefecture each profile draws today, and gathers the prefecture's logo and
//! a header photo through a shared image cache.

pub mod api;
pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod form;
pub mod images;
pub mod metrics;
pub mod model;
pub mod orchestrator;
pub mod state;
pub mod upstream;

pub use cache::ImageCache;
pub use codec::{decode_result, encode_request, FortuneRequest, YearMonthDay};
pub use error::{AppError, FetchError};
pub use images::{ImageClient, ImageService};
pub use model::{BloodType, FortuneResult, Image, MonthDay, Prefecture, Profile};
pub use orchestrator::{FetchPhase, FortuneOrchestrator, FortuneView, ImageSlot};
pub use upstream::{FortuneApi, FortuneClient};
