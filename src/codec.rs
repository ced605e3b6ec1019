//! Conversion between profiles and the fortune service wire format.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::model::{FortuneResult, Prefecture, Profile};

/// Calendar date as the fortune service expects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearMonthDay {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl From<NaiveDate> for YearMonthDay {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

/// Snapshot of a profile sent to `POST /my_fortune`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FortuneRequest {
    pub name: String,
    pub birthday: YearMonthDay,
    pub blood_type: &'static str,
    pub today: YearMonthDay,
}

impl FortuneRequest {
    pub fn new(profile: &Profile, today: NaiveDate) -> Self {
        Self {
            name: profile.name.clone(),
            birthday: profile.birthday.into(),
            blood_type: profile.blood_type.code(),
            today: today.into(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, FetchError> {
        serde_json::to_vec(self).map_err(FetchError::Decoding)
    }
}

// The service has been observed to answer both wrapped and bare.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireResult {
    Wrapped { prefecture: Prefecture },
    Bare(Prefecture),
}

pub fn encode_request(profile: &Profile, today: NaiveDate) -> Result<Vec<u8>, FetchError> {
    FortuneRequest::new(profile, today).to_bytes()
}

pub fn decode_result(bytes: &[u8]) -> Result<FortuneResult, FetchError> {
    let wire: WireResult = serde_json::from_slice(bytes).map_err(FetchError::Decoding)?;

    let prefecture = match wire {
        WireResult::Wrapped { prefecture } => prefecture,
        WireResult::Bare(prefecture) => prefecture,
    };

    Ok(FortuneResult { prefecture })
}
