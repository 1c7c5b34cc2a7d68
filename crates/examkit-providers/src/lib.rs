//! examkit-providers: question sources, scoring services and configuration.
//!
//! Implements the `QuestionSource` and `RemoteScorer` traits from
//! `examkit-core` over HTTP, TOML question banks and in-memory mocks.

pub mod bank;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod mock;
pub mod questions;
pub mod scorer;

pub use bank::BankSource;
pub use cache::CachingSource;
pub use client::ApiClient;
pub use config::{
    create_question_source, create_scorer, load_config, load_config_from, ExamkitConfig,
};
pub use error::ProviderError;
pub use questions::HttpQuestionSource;
pub use scorer::HttpScorer;
