#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod recorder;
pub mod resolver;
pub mod scene;
pub mod sessions;

pub use arcade_core::Clock;

pub use config::GameConfig;
pub use error::{RecorderError, SessionError};
pub use recorder::{AttemptRecorder, StorageRecorder};
pub use resolver::{ChallengeResolver, GameBlueprint};
pub use scene::{
    Dimensions, HeadlessTarget, MountOutcome, RenderTarget, Scene, SceneFactory, SceneHost,
    SceneSnapshot, SessionFactory, SessionScene, Surface,
};
pub use sessions::{
    AnswerOutcome, GameSession, PersistStatus, SessionPhase, SessionState, Termination,
};
