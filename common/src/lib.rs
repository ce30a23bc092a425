//! Plant Doctor Common Library
//!
//! CLIとWeb(WASM)で共有される型・状態機械・表示モデル

pub mod error;
pub mod history;
pub mod parser;
pub mod presentation;
pub mod preview;
pub mod service;
pub mod session;
pub mod types;
pub mod upload;

pub use error::{Error, Result, ValidationError};
pub use history::{History, HistoryEntry, HISTORY_CAPACITY};
pub use parser::{parse_envelope, parse_health, progress_percent};
pub use presentation::{
    BackendStatus, ResultHeader, ResultView, Section, SectionBody, SectionKind, SectionToggles,
    StatusBadge,
};
pub use preview::Preview;
pub use service::{DiagnosisService, DEFAULT_API_BASE, REQUEST_TIMEOUT_SECS};
pub use session::{AnalysisSession, SessionEvent, SessionStatus, Submission};
pub use types::{DiagnosisEnvelope, DiagnosisResult, HealthReport, HealthStatus, MediaKind};
pub use upload::{FileMeta, UploadDecision, UploadSurface, MAX_UPLOAD_BYTES};
