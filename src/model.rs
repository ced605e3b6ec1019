// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Data models for profiles, fortunes and prefecture imagery.
//!
//! Wire shapes follow the fortune service convention: snake_case keys and
//! dates split into `{year, month, day}` objects (see [`crate::codec`]).

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// ABO blood type, carried on the wire as its lower-case code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BloodType {
    A,
    B,
    Ab,
    O,
}

impl BloodType {
    /// Code sent to the fortune service.
    pub fn code(self) -> &'static str {
        match self {
            BloodType::A => "a",
            BloodType::B => "b",
            BloodType::Ab => "ab",
            BloodType::O => "o",
        }
    }

    pub fn display_name(self) -> String {
        self.code().to_uppercase()
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// A registered person whose fortune can be requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub birthday: NaiveDate,
    pub blood_type: BloodType,
    #[serde(default)]
    pub introduction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,

    /// Result of the latest fortune run. Lives for the session only.
    #[serde(default, skip_deserializing)]
    pub fortune: Option<FortuneResult>,
}

impl Profile {
    pub fn new(
        name: String,
        birthday: NaiveDate,
        blood_type: BloodType,
        introduction: Option<String>,
        icon: Option<Vec<u8>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            birthday,
            blood_type,
            introduction,
            icon,
            created_at: Utc::now(),
            fortune: None,
        }
    }

    pub fn update(
        &mut self,
        name: String,
        birthday: NaiveDate,
        blood_type: BloodType,
        introduction: Option<String>,
        icon: Option<Vec<u8>>,
    ) {
        self.name = name;
        self.birthday = birthday;
        self.blood_type = blood_type;
        self.introduction = introduction;
        self.icon = icon;
    }

    /// Replace the attached fortune in one assignment.
    pub fn attach_fortune(&mut self, fortune: FortuneResult) {
        self.fortune = Some(fortune);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

/// Prefecture returned by the fortune service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prefecture {
    pub name: String,
    pub capital: String,
    #[serde(default)]
    pub citizen_day: Option<MonthDay>,
    pub logo_url: Url,
    pub brief: String,
    pub has_coast_line: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FortuneResult {
    pub prefecture: Prefecture,
}

/// A fetched image that decoded successfully.
#[derive(Clone, Serialize)]
pub struct Image {
    pub source_url: String,
    pub content_type: String,
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub bytes: Bytes,
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("source_url", &self.source_url)
            .field("content_type", &self.content_type)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileList {
    pub profiles: Vec<Profile>,
}
