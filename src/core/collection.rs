use crate::core::status::normalize_list_status;
use crate::domain::model::Collection;
use crate::utils::error::{MalError, Result};
use crate::utils::validation;
use serde::Serialize;
use std::path::{Path, PathBuf};

const NAME_SEPARATOR: &str = ":  ";

/// 解析清單中的一行 `Name:  Status - S.N Ep.M`
pub fn parse_list_line(line: &str, line_number: usize) -> Result<(String, String)> {
    tracing::debug!("Getting anime name and status from '{}'", line);

    let invalid = || MalError::InvalidListLine {
        line_number,
        line: line.to_string(),
    };

    let (name, status) = line.split_once(NAME_SEPARATOR).ok_or_else(invalid)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid());
    }

    Ok((name.to_string(), normalize_list_status(status.trim())))
}

pub fn parse_text_list(content: &str) -> Result<Collection> {
    // Windows 記事本存檔時會加上 BOM
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut collection = Collection::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let (name, status) = parse_list_line(line, index + 1)?;
        if let Some(previous) = collection.insert(name.clone(), status) {
            tracing::warn!("'{}' appears more than once, dropping '{}'", name, previous);
        }
    }

    Ok(collection)
}

/// 將文字清單轉為排序後的字典
pub fn convert_list_to_dict<P: AsRef<Path>>(file_path: P) -> Result<Collection> {
    let file_path = file_path.as_ref();
    tracing::debug!("Converting file '{}' to JSON", file_path.display());

    let content = std::fs::read_to_string(file_path)?;
    parse_text_list(&content)
}

pub fn read_json_file<P: AsRef<Path>>(file_path: P) -> Result<Collection> {
    let file_path = file_path.as_ref();
    tracing::debug!("Reading file '{}'", file_path.display());

    let content = std::fs::read_to_string(file_path)?;
    let collection: Collection = serde_json::from_str(&content)?;

    if let Some(name) = collection.keys().find(|name| name.trim().is_empty()) {
        return Err(MalError::ValidationError {
            message: format!("'{}' contains an empty anime name: {:?}", file_path.display(), name),
        });
    }

    Ok(collection)
}

/// 以 4 格縮排、鍵值排序的格式輸出 JSON
pub fn to_json_string(collection: &Collection) -> Result<String> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    collection.serialize(&mut serializer)?;
    buffer.push(b'\n');

    String::from_utf8(buffer).map_err(|e| MalError::ValidationError {
        message: format!("JSON output is not valid UTF-8: {}", e),
    })
}

pub fn write_json_file<P: AsRef<Path>>(collection: &Collection, file_path: P) -> Result<()> {
    let file_path = file_path.as_ref();
    tracing::debug!("Writing file '{}'", file_path.display());

    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(file_path, to_json_string(collection)?)?;
    Ok(())
}

/// 依副檔名讀取 `.txt` 或 `.json` 清單
pub fn load_collection<P: AsRef<Path>>(file_path: P) -> Result<Collection> {
    let file_path = file_path.as_ref();
    tracing::debug!("Validating file '{}'", file_path.display());

    validation::validate_existing_file("file", file_path)?;
    validation::validate_file_extension("file", file_path, &["txt", "json"])?;

    let extension = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if extension == "txt" {
        convert_list_to_dict(file_path)
    } else {
        read_json_file(file_path)
    }
}

/// 將文字清單轉存為 JSON，預設輸出至同目錄的 `<stem>.json`
pub fn convert_text_to_json<P: AsRef<Path>>(source: P, destination: Option<&Path>) -> Result<PathBuf> {
    let source = source.as_ref();
    validation::validate_existing_file("file", source)?;
    let collection = convert_list_to_dict(source)?;

    let destination = match destination {
        Some(path) => path.to_path_buf(),
        None => source.with_extension("json"),
    };

    write_json_file(&collection, &destination)?;
    tracing::info!(
        "Converted {} entries from '{}' to '{}'",
        collection.len(),
        source.display(),
        destination.display()
    );

    Ok(destination)
}
