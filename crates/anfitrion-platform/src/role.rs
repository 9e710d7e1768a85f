//! Cloud worker-role runtime.
//!
//! The role runtime's only restart primitive is recycling the whole role
//! instance. The embedder supplies the call that reaches it.

use std::sync::Arc;

use anfitrion_core::{HostMode, PlatformRuntime};

use crate::detect::ROLE_INSTANCE_ENV;

type RecycleFn = Arc<dyn Fn() -> anfitrion_core::Result<()> + Send + Sync>;

/// Runtime for a role instance.
///
/// # Example
///
/// ```rust,ignore
/// let runtime = RoleRuntime::from_env().on_recycle(|| {
///     role_agent::request_recycle()?;
///     Ok(())
/// });
/// ```
#[derive(Clone, Default)]
pub struct RoleRuntime {
    instance_id: Option<String>,
    on_recycle: Option<RecycleFn>,
}

impl RoleRuntime {
    /// Creates a runtime without an instance ID.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the instance ID from `ANFITRION_ROLE_INSTANCE`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            instance_id: std::env::var(ROLE_INSTANCE_ENV).ok().filter(|v| !v.is_empty()),
            on_recycle: None,
        }
    }

    /// Sets the instance ID.
    #[must_use]
    pub fn with_instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = Some(instance_id.into());
        self
    }

    /// Sets the call that asks the role runtime for a recycle.
    #[must_use]
    pub fn on_recycle<F>(mut self, recycle: F) -> Self
    where
        F: Fn() -> anfitrion_core::Result<()> + Send + Sync + 'static,
    {
        self.on_recycle = Some(Arc::new(recycle));
        self
    }

    /// Returns the role instance ID.
    #[must_use]
    pub fn instance_id(&self) -> Option<&str> {
        self.instance_id.as_deref()
    }
}

impl std::fmt::Debug for RoleRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleRuntime")
            .field("instance_id", &self.instance_id)
            .field("on_recycle", &self.on_recycle.is_some())
            .finish()
    }
}

impl PlatformRuntime for RoleRuntime {
    fn mode(&self) -> HostMode {
        HostMode::Role
    }

    fn request_recycle(&self) -> anfitrion_core::Result<()> {
        tracing::info!(
            instance = self.instance_id.as_deref().unwrap_or("<unknown>"),
            "requesting role recycle"
        );
        match &self.on_recycle {
            Some(recycle) => recycle(),
            None => {
                tracing::warn!("no recycle hook configured, relying on the process exit");
                Ok(())
            }
        }
    }
}
