//! Profile form: optional fields collected during entry, validated into an
//! immutable [`Profile`] on save.

use std::fmt;

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::model::{BloodType, Profile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Birthday,
    BloodType,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Field::Name => "name",
            Field::Birthday => "birthday",
            Field::BloodType => "blood_type",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(Field),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IconError {
    #[error("icon data is not a readable image")]
    DataCorrupted,
}

/// Whether the form creates a new profile or edits an existing one.
#[derive(Debug, Clone)]
pub enum FormMode {
    Create,
    Edit(Profile),
}

/// Raw form payload as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub birthday: Option<NaiveDate>,
    #[serde(default)]
    pub blood_type: Option<BloodType>,
    #[serde(default)]
    pub introduction: Option<String>,
    #[serde(default)]
    pub icon: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct ProfileForm {
    pub name: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub blood_type: Option<BloodType>,
    pub introduction: Option<String>,
    icon: Option<Vec<u8>>,
    mode: FormMode,
}

impl ProfileForm {
    pub fn create() -> Self {
        Self {
            name: None,
            birthday: None,
            blood_type: None,
            introduction: None,
            icon: None,
            mode: FormMode::Create,
        }
    }

    /// Start editing `profile`, pre-filling every field from it.
    pub fn edit(profile: Profile) -> Self {
        Self {
            name: Some(profile.name.clone()),
            birthday: Some(profile.birthday),
            blood_type: Some(profile.blood_type),
            introduction: profile.introduction.clone(),
            icon: profile.icon.clone(),
            mode: FormMode::Edit(profile),
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn icon(&self) -> Option<&[u8]> {
        self.icon.as_deref()
    }

    /// Overwrite the form fields with a submitted payload.
    pub fn apply(&mut self, input: ProfileInput) -> Result<(), IconError> {
        self.name = input.name;
        self.birthday = input.birthday;
        self.blood_type = input.blood_type;
        self.introduction = input.introduction;
        self.set_icon(input.icon)
    }

    /// Set the photo. `None` clears it; bytes must decode as an image.
    pub fn set_icon(&mut self, data: Option<Vec<u8>>) -> Result<(), IconError> {
        let Some(data) = data else {
            self.icon = None;
            return Ok(());
        };

        if image::load_from_memory(&data).is_err() {
            return Err(IconError::DataCorrupted);
        }

        self.icon = Some(data);
        Ok(())
    }

    /// Validate in order name, birthday, blood type and build the profile.
    pub fn save(self) -> Result<Profile, ValidationError> {
        let name = self
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or(ValidationError::MissingField(Field::Name))?;
        let birthday = self
            .birthday
            .ok_or(ValidationError::MissingField(Field::Birthday))?;
        let blood_type = self
            .blood_type
            .ok_or(ValidationError::MissingField(Field::BloodType))?;

        match self.mode {
            FormMode::Create => Ok(Profile::new(
                name,
                birthday,
                blood_type,
                self.introduction,
                self.icon,
            )),
            FormMode::Edit(mut existing) => {
                existing.update(name, birthday, blood_type, self.introduction, self.icon);
                Ok(existing)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn birthday() -> NaiveDate {
        NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
    }

    fn existing() -> Profile {
        Profile::new(
            "テストユーザー".to_string(),
            birthday(),
            BloodType::A,
            Some("よろしく".to_string()),
            None,
        )
    }

    fn png() -> Vec<u8> {
        let mut buffer = Vec::new();
        image::DynamicImage::ImageRgba8(image::RgbaImage::new(1, 1))
            .write_to(&mut Cursor::new(&mut buffer), image::ImageOutputFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn create_form_starts_empty() {
        let form = ProfileForm::create();
        assert!(form.name.is_none());
        assert!(form.birthday.is_none());
        assert!(form.blood_type.is_none());
        assert!(form.introduction.is_none());
        assert!(form.icon().is_none());
        assert!(matches!(form.mode(), FormMode::Create));
    }

    #[test]
    fn edit_form_prefills_from_profile() {
        let profile = existing();
        let id = profile.id;
        let form = ProfileForm::edit(profile);

        assert_eq!(form.name.as_deref(), Some("テストユーザー"));
        assert_eq!(form.birthday, Some(birthday()));
        assert_eq!(form.blood_type, Some(BloodType::A));
        assert_eq!(form.introduction.as_deref(), Some("よろしく"));
        assert!(matches!(form.mode(), FormMode::Edit(p) if p.id == id));
    }

    #[test]
    fn save_requires_name_first() {
        let form = ProfileForm::create();
        assert_eq!(
            form.save().unwrap_err(),
            ValidationError::MissingField(Field::Name)
        );

        let mut form = ProfileForm::create();
        form.name = Some("   ".to_string());
        form.birthday = Some(birthday());
        form.blood_type = Some(BloodType::B);
        assert_eq!(
            form.save().unwrap_err(),
            ValidationError::MissingField(Field::Name)
        );
    }

    #[test]
    fn save_requires_birthday_before_blood_type() {
        let mut form = ProfileForm::create();
        form.name = Some("テスト".to_string());
        assert_eq!(
            form.save().unwrap_err(),
            ValidationError::MissingField(Field::Birthday)
        );

        let mut form = ProfileForm::create();
        form.name = Some("テスト".to_string());
        form.birthday = Some(birthday());
        let err = form.save().unwrap_err();
        assert_eq!(err, ValidationError::MissingField(Field::BloodType));
        assert_eq!(err.to_string(), "blood_type is required");
    }

    #[test]
    fn save_creates_new_profile() {
        let mut form = ProfileForm::create();
        form.name = Some("新しいユーザー".to_string());
        form.birthday = Some(birthday());
        form.blood_type = Some(BloodType::O);
        form.introduction = Some("はじめまして".to_string());

        let profile = form.save().unwrap();
        assert_eq!(profile.name, "新しいユーザー");
        assert_eq!(profile.blood_type, BloodType::O);
        assert_eq!(profile.introduction.as_deref(), Some("はじめまして"));
        assert!(profile.fortune.is_none());
    }

    #[test]
    fn save_updates_existing_profile_in_place() {
        let original = existing();
        let mut form = ProfileForm::edit(original.clone());
        form.name = Some("更新されたユーザー".to_string());
        form.introduction = Some("更新しました".to_string());

        let updated = form.save().unwrap();
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.name, "更新されたユーザー");
        assert_eq!(updated.introduction.as_deref(), Some("更新しました"));
    }

    #[test]
    fn set_icon_rejects_corrupted_data() {
        let mut form = ProfileForm::create();
        assert_eq!(
            form.set_icon(Some(b"not an image".to_vec())),
            Err(IconError::DataCorrupted)
        );
        assert!(form.icon().is_none());

        form.set_icon(Some(png())).unwrap();
        assert!(form.icon().is_some());

        form.set_icon(None).unwrap();
        assert!(form.icon().is_none());
    }
}
