//! Account settings form for a customer's own profile.

use axum::body::Bytes;
use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;

use storekeep_core::Email;

use super::{FormErrors, REQUIRED, check_max_len, non_blank};
use crate::models::Customer;
use crate::services::media::{ImageKind, sniff_image};

/// Longest name, phone or email accepted.
pub const FIELD_MAX_LEN: usize = 200;

/// Largest profile picture accepted.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Name of the checkbox that removes the current picture.
pub const CLEAR_FIELD: &str = "profile_pic-clear";

/// A file sent in the `profile_pic` field.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Bytes,
}

/// Submitted account settings.
#[derive(Debug, Clone, Default)]
pub struct CustomerForm {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub profile_pic: Option<Upload>,
    pub clear_picture: bool,
}

/// What to do with the profile picture once the form is valid.
#[derive(Debug, Clone)]
pub enum PictureAction {
    Keep,
    Store { bytes: Bytes, kind: ImageKind },
    Clear,
}

/// Account settings that passed validation.
#[derive(Debug, Clone)]
pub struct ValidProfile {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub picture: PictureAction,
}

impl CustomerForm {
    /// Prefill the form from the stored profile.
    #[must_use]
    pub fn from_customer(customer: &Customer) -> Self {
        Self {
            name: customer.name.clone(),
            phone: customer.phone.clone().unwrap_or_default(),
            email: customer.email.clone().unwrap_or_default(),
            profile_pic: None,
            clear_picture: false,
        }
    }

    /// Read the form from a `multipart/form-data` body.
    ///
    /// Unknown fields are ignored. A file field submitted without a file
    /// counts as no upload.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid multipart data or exceeds
    /// the request body limit.
    pub async fn from_multipart(multipart: &mut Multipart) -> Result<Self, MultipartError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            match name.as_str() {
                "name" => form.name = field.text().await?,
                "phone" => form.phone = field.text().await?,
                "email" => form.email = field.text().await?,
                CLEAR_FIELD => form.clear_picture = !field.text().await?.is_empty(),
                "profile_pic" => {
                    let filename = field.file_name().unwrap_or_default().to_owned();
                    let bytes = field.bytes().await?;
                    if !filename.is_empty() || !bytes.is_empty() {
                        form.profile_pic = Some(Upload { filename, bytes });
                    }
                }
                _ => {}
            }
        }

        Ok(form)
    }

    /// # Errors
    ///
    /// Returns the field messages when any field is invalid.
    pub fn validate(&self) -> Result<ValidProfile, FormErrors> {
        let mut errors = FormErrors::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", REQUIRED);
        }
        check_max_len(&mut errors, "name", name, FIELD_MAX_LEN);
        check_max_len(&mut errors, "phone", self.phone.trim(), FIELD_MAX_LEN);
        check_max_len(&mut errors, "email", self.email.trim(), FIELD_MAX_LEN);

        let email = non_blank(&self.email);
        if let Some(email) = email
            && Email::parse(email).is_err()
        {
            errors.add("email", "Enter a valid email address.");
        }

        let picture = match (&self.profile_pic, self.clear_picture) {
            (Some(_), true) => {
                errors.add(
                    "profile_pic",
                    "Please either submit a file or check the clear checkbox, not both.",
                );
                PictureAction::Keep
            }
            (Some(upload), false) => validate_upload(&mut errors, upload),
            (None, true) => PictureAction::Clear,
            (None, false) => PictureAction::Keep,
        };

        errors.into_result(ValidProfile {
            name: name.to_owned(),
            phone: non_blank(&self.phone).map(str::to_owned),
            email: email.map(str::to_owned),
            picture,
        })
    }
}

fn validate_upload(errors: &mut FormErrors, upload: &Upload) -> PictureAction {
    if upload.bytes.is_empty() {
        errors.add("profile_pic", "The submitted file is empty.");
        return PictureAction::Keep;
    }
    if upload.bytes.len() > MAX_UPLOAD_BYTES {
        errors.add("profile_pic", "The uploaded file is too large (max 5 MB).");
        return PictureAction::Keep;
    }
    match sniff_image(&upload.bytes) {
        Some(kind) => PictureAction::Store {
            bytes: upload.bytes.clone(),
            kind,
        },
        None => {
            errors.add(
                "profile_pic",
                "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
            );
            PictureAction::Keep
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn form() -> CustomerForm {
        CustomerForm {
            name: "Peter Piper".to_owned(),
            phone: " 555-0100 ".to_owned(),
            email: String::new(),
            profile_pic: None,
            clear_picture: false,
        }
    }

    fn upload(bytes: &'static [u8]) -> Option<Upload> {
        Some(Upload {
            filename: "me.png".to_owned(),
            bytes: Bytes::from_static(bytes),
        })
    }

    #[test]
    fn test_plain_fields() {
        let valid = form().validate().unwrap();
        assert_eq!(valid.name, "Peter Piper");
        assert_eq!(valid.phone.as_deref(), Some("555-0100"));
        assert!(valid.email.is_none());
        assert!(matches!(valid.picture, PictureAction::Keep));
    }

    #[test]
    fn test_name_required_and_email_checked() {
        let errors = CustomerForm {
            name: "  ".to_owned(),
            email: "nope".to_owned(),
            ..form()
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors.get("name"), [REQUIRED.to_owned()]);
        assert!(errors.has("email"));
    }

    #[test]
    fn test_image_upload_is_sniffed() {
        let valid = CustomerForm {
            profile_pic: upload(PNG_HEADER),
            ..form()
        }
        .validate()
        .unwrap();
        assert!(matches!(
            valid.picture,
            PictureAction::Store {
                kind: ImageKind::Png,
                ..
            }
        ));

        let errors = CustomerForm {
            profile_pic: upload(b"#!/bin/sh\necho hi\n"),
            ..form()
        }
        .validate()
        .unwrap_err();
        assert!(errors.has("profile_pic"));
    }

    #[test]
    fn test_clear_and_upload_conflict() {
        let cleared = CustomerForm {
            clear_picture: true,
            ..form()
        }
        .validate()
        .unwrap();
        assert!(matches!(cleared.picture, PictureAction::Clear));

        let errors = CustomerForm {
            clear_picture: true,
            profile_pic: upload(PNG_HEADER),
            ..form()
        }
        .validate()
        .unwrap_err();
        assert!(errors.has("profile_pic"));
    }

    #[test]
    fn test_oversized_upload() {
        let big = vec![0u8; MAX_UPLOAD_BYTES + 1];
        let errors = CustomerForm {
            profile_pic: Some(Upload {
                filename: "big.png".to_owned(),
                bytes: Bytes::from(big),
            }),
            ..form()
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            errors.get("profile_pic"),
            ["The uploaded file is too large (max 5 MB).".to_owned()]
        );
    }
}
