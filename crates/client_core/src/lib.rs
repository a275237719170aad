//! Client side of the averages service: an HTTP gateway to the REST backend
//! and a controller that keeps an editable list in sync with it.

pub mod config;
pub mod confirm;
pub mod controller;
pub mod error;
pub mod gateway;
pub mod notice;

pub use config::{load_settings, GatewaySettings};
pub use confirm::{AlwaysConfirm, Confirm, NeverConfirm, DELETE_PROMPT};
pub use controller::{DeleteOutcome, RecordListController};
pub use error::GatewayError;
pub use gateway::{HttpRecordGateway, RecordGateway};
pub use notice::{Notice, NoticeCategory, NoticeContext};
