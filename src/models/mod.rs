mod metadata;

pub use metadata::{
    MetadataFailure, MetadataRequest, MetadataResult, PageMetadata, RequestedUrl,
    INVALID_INPUT_MESSAGE, NO_DESCRIPTION, NO_IMAGE, NO_TITLE,
};
