//! 診断サービス呼び出し

pub mod client;

pub use client::BrowserDiagnosisClient;
