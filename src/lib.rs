//! PDI News - headlines, favorites and photo-to-text capture
//!
//! Reads top headlines and search results from NewsAPI, keeps favorite
//! articles in a local database, and extracts text from a captured photo.
//!
//! The capture flow lives in [`workflow`]: [`workflow::CaptureWorkflow`]
//! drives a [`capture::CameraProvider`] and a [`vision::TextRecognizer`] and
//! hands the recognized text to a [`workflow::ResultDelivery`] target, such
//! as [`workflow::ChannelDelivery`] for in-process callers.

pub mod app;
pub mod capture;
pub mod config;
pub mod news;
pub mod storage;
pub mod vision;
pub mod workflow;

pub use app::NewsApp;
