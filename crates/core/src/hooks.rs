/// Setup and teardown around one `perform` call.
pub trait PerformHooks: Send + Sync {
    fn setup(&self) {}
    fn teardown(&self) {}
}

/// Runs `setup` on entry and `teardown` on drop.
#[must_use = "teardown runs as soon as the scope is dropped"]
pub(crate) struct HookScope<'h> {
    hooks: Option<&'h dyn PerformHooks>,
}

impl<'h> HookScope<'h> {
    pub(crate) fn enter(hooks: Option<&'h dyn PerformHooks>) -> Self {
        if let Some(hooks) = hooks {
            hooks.setup();
        }
        Self { hooks }
    }
}

impl Drop for HookScope<'_> {
    fn drop(&mut self) {
        if let Some(hooks) = self.hooks {
            hooks.teardown();
        }
    }
}
