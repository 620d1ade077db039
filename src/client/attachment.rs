use std::path::Path;

use base64::prelude::{BASE64_STANDARD, Engine as _};

use crate::error::{AppError, AppResult};

fn image_mime(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}

/// Reads a screenshot into a `data:` URL.
pub async fn read_data_url(path: &Path) -> AppResult<String> {
    let mime = image_mime(path).ok_or_else(|| {
        AppError::Configuration(format!("{} is not a supported image", path.display()))
    })?;
    let bytes = tokio::fs::read(path).await?;
    Ok(format!("data:{mime};base64,{}", BASE64_STANDARD.encode(bytes)))
}
