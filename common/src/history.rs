//! 解析履歴
//!
//! 成功した解析のスナップショットを新しい順に最大10件保持する。
//! 容量は構造体側で強制し、超過分は追加時に最古から追い出す。

use std::collections::VecDeque;

use crate::preview::Preview;
use crate::types::{DiagnosisResult, MediaKind};

/// 履歴の最大件数
pub const HISTORY_CAPACITY: usize = 10;

/// 履歴エントリ（作成後は変更しない）
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: u64,
    pub file_name: String,
    pub media_kind: MediaKind,
    pub preview: Preview,
    pub result: DiagnosisResult,
    /// UNIXエポックからのミリ秒
    pub timestamp_ms: u64,
}

/// 容量固定の履歴リスト（先頭が最新）
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// 先頭に追加し、溢れた最古のエントリを返す
    pub fn push(&mut self, entry: HistoryEntry) -> Option<HistoryEntry> {
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_back()
        } else {
            None
        };
        self.entries.push_front(entry);
        evicted
    }

    pub fn get(&self, id: u64) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    /// 新しい順
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
