//! 入力パスの展開
//!
//! CLI引数のファイル/フォルダを、アップロード候補のリストに変換する。
//! フォルダは直下のみ対象で、対応拡張子以外は黙って除外する。

use crate::error::{PlantDoctorError, Result};
use plant_doctor_common::upload::mime_for_path;
use plant_doctor_common::FileMeta;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 拡張子から種別が分からない場合のContent-Type
const UNKNOWN_MIME: &str = "application/octet-stream";

/// アップロード候補
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub meta: FileMeta,
}

impl Candidate {
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)
            .map_err(|_| PlantDoctorError::FileNotFound(path.display().to_string()))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mime_type = mime_for_path(path).unwrap_or(UNKNOWN_MIME);

        Ok(Self {
            path: path.to_path_buf(),
            meta: FileMeta::new(name, mime_type, metadata.len()),
        })
    }

    /// 本体を読み込む（検査を通った後にだけ呼ぶ）
    pub fn read_payload(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(&self.path)?)
    }
}

/// パス一覧を候補に展開
///
/// 明示指定されたファイルは拡張子に関係なく候補にする（検査で弾く）。
pub fn collect_candidates(paths: &[PathBuf]) -> Result<Vec<Candidate>> {
    let mut candidates = Vec::new();

    for path in paths {
        if path.is_dir() {
            candidates.extend(scan_folder(path)?);
        } else {
            candidates.push(Candidate::from_path(path)?);
        }
    }

    Ok(candidates)
}

/// フォルダ直下の対応ファイルを列挙（ファイル名順）
pub fn scan_folder(folder: &Path) -> Result<Vec<Candidate>> {
    if !folder.exists() {
        return Err(PlantDoctorError::FileNotFound(folder.display().to_string()));
    }

    let mut candidates = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if mime_for_path(path).is_none() {
            tracing::debug!(path = %path.display(), "非対応の拡張子をスキップ");
            continue;
        }
        candidates.push(Candidate::from_path(path)?);
    }

    candidates.sort_by(|a, b| a.meta.name.cmp(&b.meta.name));

    Ok(candidates)
}
