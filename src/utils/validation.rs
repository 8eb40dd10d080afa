use crate::utils::error::{MalError, Result};
use std::io;
use std::path::Path;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl ToString, reason: impl Into<String>) -> MalError {
    MalError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// API 根路徑：只接受 http(s)，且不可帶 query 或 fragment（請求路徑直接接在後面）
pub fn validate_api_base_url(field_name: &str, url_str: &str) -> Result<Url> {
    if url_str.trim().is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }

    let url = Url::parse(url_str)
        .map_err(|e| invalid(field_name, url_str, format!("Invalid URL format: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(
            field_name,
            url_str,
            format!("Unsupported URL scheme: {}", url.scheme()),
        ));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid(
            field_name,
            url_str,
            "The API root cannot carry a query string or fragment",
        ));
    }

    Ok(url)
}

/// 清單檔必須存在且是一般檔案
pub fn validate_existing_file(field_name: &str, path: &Path) -> Result<()> {
    if path.is_file() {
        return Ok(());
    }

    let message = if path.exists() {
        format!("'{}' ({}) is not a regular file", path.display(), field_name)
    } else {
        format!("'{}' ({}) does not exist", path.display(), field_name)
    };
    Err(MalError::IoError(io::Error::new(io::ErrorKind::NotFound, message)))
}

/// 副檔名比對不分大小寫（`animes.TXT` 也算 txt）
pub fn validate_file_extension(field_name: &str, path: &Path, allowed_extensions: &[&str]) -> Result<()> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(extension)
            if allowed_extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(extension)) =>
        {
            Ok(())
        }
        Some(extension) => Err(invalid(
            field_name,
            path.display(),
            format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                extension,
                allowed_extensions.join(", ")
            ),
        )),
        None => Err(invalid(
            field_name,
            path.display(),
            format!("Expected a .{} file", allowed_extensions.join(" or .")),
        )),
    }
}

/// 取出必填的文字參數，去掉前後空白；空字串視為無效
pub fn require_text<'a>(field_name: &str, value: Option<&'a str>) -> Result<&'a str> {
    let value = value.ok_or_else(|| MalError::MissingConfigError {
        field: field_name.to_string(),
    })?;

    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid(field_name, value, "Value cannot be empty or whitespace-only"));
    }
    Ok(trimmed)
}

pub fn require<T>(field_name: &str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| MalError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}
