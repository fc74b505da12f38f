//! Engine error types.
//!
//! Misuse that can only be a programming mistake (a missing resource, a
//! missing scheduler, a missing component on a `get_*`) panics with a
//! descriptive message. Everything that can legitimately happen at runtime is
//! reported through [`EngineError`].

use std::path::PathBuf;

use thiserror::Error;

/// Error returned by a failing system.
pub type SystemError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type systems return.
pub type SystemResult = Result<(), SystemError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("cyclic dependency detected between schedulers")]
    CyclicSchedulers,

    #[error("scheduler `{0}` is not registered")]
    MissingScheduler(&'static str),

    #[error("system `{system}` in scheduler `{scheduler}` failed: {source}")]
    SystemFailed {
        scheduler: &'static str,
        system: String,
        #[source]
        source: SystemError,
    },

    #[error("failed to read config `{}`: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("`{}` is not an .obj file", .0.display())]
    NotObj(PathBuf),

    #[error("failed to load OBJ `{}`: {source}", path.display())]
    ObjLoad {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_failure_message_names_scheduler_and_system() {
        let err = EngineError::SystemFailed {
            scheduler: "Update",
            system: "spawn_wave".into(),
            source: "out of ammo".into(),
        };
        assert_eq!(
            err.to_string(),
            "system `spawn_wave` in scheduler `Update` failed: out of ammo"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn config_parse_converts_from_serde() {
        let parse: Result<u32, _> = serde_json::from_str("nope");
        let err: EngineError = parse.unwrap_err().into();
        assert!(matches!(err, EngineError::ConfigParse(_)));
    }
}
