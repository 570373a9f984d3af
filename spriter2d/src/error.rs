use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown animation: {name}")]
    UnknownAnimation { name: String },

    #[error("invalid model for animation '{animation}': {message}")]
    InvalidModel { animation: String, message: String },

    #[cfg(feature = "json")]
    #[error("failed to parse SCON: {message}")]
    JsonParse { message: String },

    #[cfg(feature = "json")]
    #[error("unsupported or invalid SCON version string: {value}")]
    JsonSconVersion { value: String },

    #[cfg(feature = "json")]
    #[error("unknown timeline {timeline} referenced by mainline of animation '{animation}'")]
    JsonUnknownTimeline { animation: String, timeline: usize },

    #[cfg(feature = "json")]
    #[error("unknown tag id {tag} referenced by animation '{animation}'")]
    JsonUnknownTag { animation: String, tag: usize },

    #[cfg(feature = "json")]
    #[error("unknown obj_info {obj} referenced by timeline '{timeline}' in entity '{entity}'")]
    JsonUnknownObjectInfo {
        entity: String,
        timeline: String,
        obj: usize,
    },
}
