//! アップロード受付
//!
//! ドロップ・ファイル選択されたファイルを診断前に検査する。
//! ここで弾かれたファイルはネットワークに送られない。

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::MediaKind;

/// 最大ファイルサイズ（20MiB）
pub const MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// 受け付けるMIMEタイプと拡張子
pub const ACCEPTED_TYPES: &[(&str, &[&str])] = &[
    ("image/jpeg", &["jpg", "jpeg"]),
    ("image/png", &["png"]),
    ("image/webp", &["webp"]),
    ("image/gif", &["gif"]),
    ("video/mp4", &["mp4"]),
    ("video/quicktime", &["mov"]),
    ("video/avi", &["avi"]),
    ("video/webm", &["webm"]),
];

/// ファイル選択ダイアログの `accept` 属性値
pub fn accept_attribute() -> String {
    ACCEPTED_TYPES
        .iter()
        .map(|(mime, _)| *mime)
        .collect::<Vec<_>>()
        .join(",")
}

/// 受け付けるMIMEタイプか
pub fn is_accepted_type(mime_type: &str) -> bool {
    let mime_type = mime_type.trim().to_ascii_lowercase();
    ACCEPTED_TYPES.iter().any(|(mime, _)| *mime == mime_type)
}

/// 拡張子からMIMEタイプを引く（ネイティブ側はContent-Typeの申告が無いため）
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    ACCEPTED_TYPES
        .iter()
        .find(|(_, exts)| exts.contains(&ext.as_str()))
        .map(|(mime, _)| *mime)
}

/// ファイルのメタ情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
}

impl FileMeta {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
        }
    }

    pub fn media_kind(&self) -> MediaKind {
        MediaKind::from_mime(&self.mime_type)
    }
}

/// 1ファイルを検査し、メディア種別を返す
pub fn validate(file: &FileMeta) -> Result<MediaKind, ValidationError> {
    if !is_accepted_type(&file.mime_type) {
        let shown = if file.mime_type.trim().is_empty() {
            file.name.clone()
        } else {
            file.mime_type.clone()
        };
        return Err(ValidationError::UnsupportedType(shown));
    }
    if file.size == 0 {
        return Err(ValidationError::Empty);
    }
    if file.size > MAX_UPLOAD_BYTES {
        return Err(ValidationError::TooLarge {
            size: file.size,
            max: MAX_UPLOAD_BYTES,
        });
    }
    Ok(file.media_kind())
}

/// 受付結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadDecision {
    /// 解析中のため無視（入力欄が無効）
    Ignored,
    Rejected(ValidationError),
    Accepted(FileMeta, MediaKind),
}

/// アップロード欄
///
/// 1回の操作で1ファイルだけ受け付ける。解析中は操作を無視する。
#[derive(Debug, Clone, Copy, Default)]
pub struct UploadSurface;

impl UploadSurface {
    pub fn new() -> Self {
        Self
    }

    pub fn offer(&self, files: &[FileMeta], busy: bool) -> UploadDecision {
        if busy {
            return UploadDecision::Ignored;
        }

        let file = match files {
            [] => return UploadDecision::Rejected(ValidationError::NoFile),
            [file] => file,
            many => return UploadDecision::Rejected(ValidationError::TooManyFiles(many.len())),
        };

        match validate(file) {
            Ok(kind) => UploadDecision::Accepted(file.clone(), kind),
            Err(e) => UploadDecision::Rejected(e),
        }
    }
}
