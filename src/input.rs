//! Reading locale resources from text and files.

pub mod error;
pub mod format;
mod json;
pub mod locale;
mod module;
pub mod resource;

pub use error::ResourceError;
pub use format::ResourceFormat;
pub use resource::{
    LocaleResource,
    NodeMap,
    ResourceNode,
    ResourceOrigin,
};
