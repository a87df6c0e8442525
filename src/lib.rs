//! drive-i18n
//!
//! drive Web UI のロケールリソース（zh-CN / en-US）と、それを読み込み・検索・検証するためのライブラリ

pub mod builtin;
pub mod catalog;
pub mod check;
pub mod cli;
pub mod config;
pub mod indexer;
pub mod input;
pub mod key;
pub mod template;
pub mod types;

pub use catalog::{
    Catalog,
    LookupError,
};
pub use input::resource::LocaleResource;
pub use template::Args;
