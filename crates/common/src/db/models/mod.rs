//! SeaORM entity models
//!
//! Meeting documents are written by the embedding service; this crate only
//! reads them.

mod document;

pub use document::{
    Entity as DocumentEntity,
    Model as Document,
    Column as DocumentColumn,
    DocumentMetadata,
};
