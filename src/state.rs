use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::model::{BloodType, FortuneResult, Profile};

/// In-memory profile registry shared by request handlers.
#[derive(Clone, Default)]
pub struct ProfileStore {
    inner: Arc<RwLock<HashMap<Uuid, Profile>>>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, profile: Profile) -> Profile {
        let mut guard = self.inner.write().await;
        guard.insert(profile.id, profile.clone());
        drop(guard);

        tracing::debug!(id = %profile.id, "created profile");
        profile
    }

    /// Replace a stored profile. The session fortune is kept.
    pub async fn update(&self, mut profile: Profile) -> Option<Profile> {
        let mut guard = self.inner.write().await;
        let entry = guard.get_mut(&profile.id)?;

        profile.fortune = entry.fortune.take();
        *entry = profile.clone();
        Some(profile)
    }

    pub async fn delete(&self, id: Uuid) -> bool {
        let mut guard = self.inner.write().await;
        guard.remove(&id).is_some()
    }

    pub async fn get(&self, id: Uuid) -> Option<Profile> {
        let guard = self.inner.read().await;
        guard.get(&id).cloned()
    }

    /// All profiles ordered by name, ties broken by creation time.
    pub async fn list(&self) -> Vec<Profile> {
        let guard = self.inner.read().await;
        let mut profiles: Vec<Profile> = guard.values().cloned().collect();
        drop(guard);

        profiles.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        profiles
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn attach_fortune(&self, id: Uuid, fortune: FortuneResult) -> bool {
        let mut guard = self.inner.write().await;
        match guard.get_mut(&id) {
            Some(profile) => {
                profile.attach_fortune(fortune);
                true
            }
            None => false,
        }
    }

    /// Insert the demo profiles used for previews and UI runs.
    pub async fn seed_samples(&self) -> usize {
        let samples = [
            ("山田 太郎", (1988, 4, 12), BloodType::A, Some("よろしくお願いします！")),
            ("鈴木 花子", (1995, 9, 3), BloodType::B, None),
            ("佐藤 次郎", (2001, 6, 21), BloodType::O, Some("サッカー大好き！⚽️")),
            ("田渕 貴之", (1979, 11, 28), BloodType::Ab, Some("音楽とコーヒー☕️")),
        ];

        let mut seeded = 0;
        for (name, (year, month, day), blood_type, introduction) in samples {
            let Some(birthday) = NaiveDate::from_ymd_opt(year, month, day) else {
                continue;
            };
            let profile = Profile::new(
                name.to_string(),
                birthday,
                blood_type,
                introduction.map(str::to_string),
                None,
            );
            self.create(profile).await;
            seeded += 1;
        }
        seeded
    }
}
