//! Multipart parsing for `POST /generate`.

use std::io::Cursor;

use crate::error::QrError;
use crate::style::StyleForm;

/// A file field with a non-empty filename.
#[derive(Debug)]
pub struct Upload {
    /// Filename as sent by the browser.
    pub filename: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Everything the form submits.
#[derive(Debug, Default)]
pub struct Submission {
    /// Text to encode; empty when the field is absent.
    pub data: String,
    /// Raw style fields.
    pub style: StyleForm,
    /// Uploaded logo, if any.
    pub logo: Option<Upload>,
}

/// Parse a `multipart/form-data` body delimited by `boundary`.
///
/// # Errors
///
/// Returns [`QrError::Form`] if the body is not valid multipart data.
pub async fn parse(body: Vec<u8>, boundary: String) -> Result<Submission, QrError> {
    let mut multipart = multer::Multipart::with_reader(Cursor::new(body), boundary);
    let mut submission = Submission::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "logo" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                // Browsers send an empty part when no file is chosen.
                if !filename.is_empty() {
                    submission.logo = Some(Upload { filename, bytes: bytes.to_vec() });
                }
            }
            "data" => submission.data = field.text().await?,
            "fill_color" => submission.style.fill_color = Some(field.text().await?),
            "back_color" => submission.style.back_color = Some(field.text().await?),
            "box_size" => submission.style.box_size = Some(field.text().await?),
            "border" => submission.style.border = Some(field.text().await?),
            "error_correction" => submission.style.error_correction = Some(field.text().await?),
            _ => log::debug!("Ignoring form field '{name}'"),
        }
    }

    Ok(submission)
}
