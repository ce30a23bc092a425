//! UIコンポーネント

pub mod header;
pub mod history_panel;
pub mod loading_plant;
pub mod result_card;
pub mod toast;
pub mod upload_zone;
