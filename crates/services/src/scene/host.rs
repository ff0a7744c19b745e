use std::sync::Arc;
use std::time::Duration;

use arcade_core::model::{ChallengeContext, GameKind};

use super::target::{Dimensions, RenderTarget, Surface};
use super::{Scene, SceneFactory, SceneSnapshot};
use crate::error::SessionError;
use crate::sessions::{AnswerOutcome, PersistStatus};

/// What `SceneHost::mount` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    /// A new scene is live.
    Mounted,
    /// Same game, size and context as the live scene; nothing changed.
    Unchanged,
    /// The render target was unavailable; nothing is mounted.
    Skipped,
}

struct Mounted {
    kind: GameKind,
    size: Dimensions,
    context: Arc<ChallengeContext>,
    surface: Surface,
    scene: Box<dyn Scene>,
}

/// Owns at most one live scene per mount point.
///
/// Remounting with a different game, size or context tears the old scene down
/// before the new one is built, so two instances never overlap.
pub struct SceneHost<T: RenderTarget> {
    target: T,
    factory: Arc<dyn SceneFactory>,
    mounted: Option<Mounted>,
}

impl<T: RenderTarget> SceneHost<T> {
    #[must_use]
    pub fn new(target: T, factory: Arc<dyn SceneFactory>) -> Self {
        Self {
            target,
            factory,
            mounted: None,
        }
    }

    /// Mount `kind` at `size` with `context`.
    ///
    /// Context identity is pointer identity: pass the same `Arc` to keep the
    /// live scene.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the new scene fails to initialize or start; the
    /// host is left empty.
    pub fn mount(
        &mut self,
        kind: GameKind,
        size: Dimensions,
        context: Arc<ChallengeContext>,
    ) -> Result<MountOutcome, SessionError> {
        if let Some(live) = &self.mounted {
            if live.kind == kind && live.size == size && Arc::ptr_eq(&live.context, &context) {
                return Ok(MountOutcome::Unchanged);
            }
        }

        self.unmount();

        let Some(surface) = self.target.allocate(size) else {
            log::warn!("render target unavailable for {kind} at {size}; nothing mounted");
            return Ok(MountOutcome::Skipped);
        };

        let mut scene = self.factory.build(kind);
        let started = scene
            .init(Arc::clone(&context))
            .and_then(|()| scene.create(surface));
        if let Err(err) = started {
            scene.teardown();
            self.target.release(surface);
            return Err(err);
        }

        log::debug!(
            "mounted {kind} for {} on surface {}",
            context.challenge_id(),
            surface.id
        );
        self.mounted = Some(Mounted {
            kind,
            size,
            context,
            surface,
            scene,
        });
        Ok(MountOutcome::Mounted)
    }

    /// Tear down the live scene, if any, and release its surface.
    pub fn unmount(&mut self) {
        if let Some(mut live) = self.mounted.take() {
            live.scene.teardown();
            self.target.release(live.surface);
            log::debug!("unmounted {} from surface {}", live.kind, live.surface.id);
        }
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// Advance the live scene. No-op when nothing is mounted.
    ///
    /// # Errors
    ///
    /// Propagates scene errors.
    pub fn update(&mut self, dt: Duration) -> Result<(), SessionError> {
        match self.mounted.as_mut() {
            Some(live) => live.scene.update(dt),
            None => Ok(()),
        }
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotRunning` when nothing is mounted.
    pub fn answer(&mut self, value: i64) -> Result<AnswerOutcome, SessionError> {
        match self.mounted.as_mut() {
            Some(live) => live.scene.answer(value),
            None => Err(SessionError::NotRunning),
        }
    }

    pub fn quit(&mut self) {
        if let Some(live) = self.mounted.as_mut() {
            live.scene.quit();
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<SceneSnapshot> {
        self.mounted.as_ref().map(|live| live.scene.snapshot())
    }

    pub fn persist_status(&mut self) -> Option<PersistStatus> {
        self.mounted.as_mut().map(|live| live.scene.persist_status())
    }

    pub async fn wait_persisted(&mut self) -> Option<PersistStatus> {
        match self.mounted.as_mut() {
            Some(live) => Some(live.scene.wait_persisted().await),
            None => None,
        }
    }

    #[must_use]
    pub fn target(&self) -> &T {
        &self.target
    }
}

impl<T: RenderTarget> Drop for SceneHost<T> {
    fn drop(&mut self) {
        self.unmount();
    }
}
