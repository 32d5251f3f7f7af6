//! Upload intake: turns a picked or dropped path into a [`SelectedFile`].
//!
//! Only filesystem metadata is read here. The document itself is opened when
//! the upload is sent.

use crate::models::SelectedFile;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

const KB: u64 = 1024;
const MB: u64 = 1024 * 1024;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("{0} is not a file")]
    NotAFile(PathBuf),
    #[error("cannot read {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Pdf,
    Word,
    Excel,
    Image,
    Text,
    Generic,
}

impl FileKind {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => FileKind::Pdf,
            "doc" | "docx" => FileKind::Word,
            "xls" | "xlsx" => FileKind::Excel,
            "jpg" | "jpeg" | "png" => FileKind::Image,
            "txt" => FileKind::Text,
            _ => FileKind::Generic,
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            FileKind::Pdf => "[pdf]",
            FileKind::Word => "[doc]",
            FileKind::Excel => "[xls]",
            FileKind::Image => "[img]",
            FileKind::Text => "[txt]",
            FileKind::Generic => "[file]",
        }
    }
}

/// Human-readable size: bytes below 1 KiB, then two-decimal KB or MB.
pub fn format_size(bytes: u64) -> String {
    if bytes < KB {
        format!("{} bytes", bytes)
    } else if bytes < MB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    }
}

/// Text after the last dot, lowercased. A name without a dot has no extension.
pub fn extension_of(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}

pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// A drop may carry several files; only the first is used.
pub fn pick_first(paths: &[PathBuf]) -> Option<&PathBuf> {
    paths.first()
}

impl SelectedFile {
    pub fn from_path(path: &Path) -> Result<Self, IntakeError> {
        let meta = std::fs::metadata(path).map_err(|source| IntakeError::Metadata {
            path: path.to_path_buf(),
            source,
        })?;
        if !meta.is_file() {
            return Err(IntakeError::NotAFile(path.to_path_buf()));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Ok(Self {
            path: path.to_path_buf(),
            extension: extension_of(&name),
            name,
            size_bytes: meta.len(),
        })
    }

    pub fn kind(&self) -> FileKind {
        FileKind::from_extension(&self.extension)
    }

    pub fn upload(&self) -> providers::FileUpload {
        providers::FileUpload {
            path: self.path.clone(),
            file_name: self.name.clone(),
            mime: mime_for_extension(&self.extension).to_string(),
        }
    }
}
