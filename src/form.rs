//! Buffered multipart form: text fields by name, files in arrival order.

use std::collections::HashMap;

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;

use crate::{
    error::{AppError, AppResult},
    storage::Upload,
};

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: Vec<(String, Upload)>,
}

impl FormData {
    pub async fn from_multipart(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = FormData::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await?;
                    // Browsers send an empty part for untouched file inputs.
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    form.push_file(
                        name,
                        Upload {
                            file_name,
                            content_type,
                            bytes: bytes.to_vec(),
                        },
                    );
                }
                None => {
                    let value = field.text().await?;
                    form.insert_text(name, value);
                }
            }
        }
        Ok(form)
    }

    pub fn insert_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn push_file(&mut self, name: impl Into<String>, upload: Upload) {
        self.files.push((name.into(), upload));
    }

    /// Trimmed value; blank counts as absent.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn require(&self, name: &str) -> AppResult<String> {
        self.text(name)
            .ok_or_else(|| AppError::BadRequest(format!("{name} is required")))
    }

    /// Remove and return every file sent under `name`.
    pub fn take_files(&mut self, name: &str) -> Vec<Upload> {
        let (taken, rest): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.files).into_iter().partition(|(n, _)| n == name);
        self.files = rest;
        taken.into_iter().map(|(_, upload)| upload).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str) -> Upload {
        Upload {
            file_name: name.into(),
            content_type: Some("image/jpeg".into()),
            bytes: vec![1, 2, 3],
        }
    }

    #[test]
    fn files_are_grouped_by_field_name() {
        let mut form = FormData::default();
        form.push_file("selfies", upload("a.jpg"));
        form.push_file("report", upload("r.pdf"));
        form.push_file("selfies", upload("b.jpg"));

        let selfies = form.take_files("selfies");
        assert_eq!(
            selfies.iter().map(|u| u.file_name.as_str()).collect::<Vec<_>>(),
            ["a.jpg", "b.jpg"]
        );
        assert!(form.take_files("selfies").is_empty());
        assert_eq!(form.take_files("report").len(), 1);
    }

    #[test]
    fn blank_text_counts_as_missing() {
        let mut form = FormData::default();
        form.insert_text("full_name", "  Asha  ");
        form.insert_text("email", "   ");
        assert_eq!(form.text("full_name").as_deref(), Some("Asha"));
        assert_eq!(form.text("email"), None);
        assert!(matches!(form.require("email"), Err(AppError::BadRequest(_))));
    }
}
