/// Error types.
///
/// `SetupError` covers everything that can go wrong while building a
/// session (config, level data, entity geometry). These are fatal.
/// `TickError` covers per-tick failures; the session logs them and keeps
/// dispatching the remaining tasks.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::entity::EntityKind;
use crate::domain::projectile::ProjectileId;
use crate::sim::world::EnemyRef;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to read '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error in '{path}': {details}")]
    ConfigParse { path: PathBuf, details: String },

    #[error("invalid config value `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("failed to read level file '{path}': {source}")]
    LevelRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("level parse error: {0}")]
    LevelParse(String),

    #[error("invalid level: {0}")]
    InvalidLevel(String),

    #[error("invalid {kind:?} geometry: {reason}")]
    InvalidGeometry { kind: EntityKind, reason: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum TickError {
    #[error("projectile {0} is no longer active")]
    UnknownProjectile(ProjectileId),

    #[error("enemy {0:?} does not exist")]
    UnknownEnemy(EnemyRef),

    #[error("could not spawn projectile: {0}")]
    InvalidSpawn(String),
}
