//! Default-home-screen role contracts.

use std::{cell::RefCell, future::Future, pin::Pin, rc::Rc};

/// Object-safe boxed future used by [`LauncherRoleService`].
pub type LauncherRoleFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Host service for the system "default home screen" role.
pub trait LauncherRoleService {
    /// Returns whether this launcher currently handles the home action.
    fn is_default_home<'a>(&'a self) -> LauncherRoleFuture<'a, Result<bool, String>>;

    /// Opens the system settings page where the user picks the default home app.
    fn open_home_settings<'a>(&'a self) -> LauncherRoleFuture<'a, Result<(), String>>;

    /// Gives up the default home role so the device leaves restricted mode.
    fn clear_default_home<'a>(&'a self) -> LauncherRoleFuture<'a, Result<(), String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op role service: reports the launcher as default and ignores role changes.
pub struct NoopLauncherRoleService;

impl LauncherRoleService for NoopLauncherRoleService {
    fn is_default_home<'a>(&'a self) -> LauncherRoleFuture<'a, Result<bool, String>> {
        Box::pin(async { Ok(true) })
    }

    fn open_home_settings<'a>(&'a self) -> LauncherRoleFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }

    fn clear_default_home<'a>(&'a self) -> LauncherRoleFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Default)]
struct RoleState {
    is_default: bool,
    settings_opened: u32,
    cleared: u32,
}

#[derive(Debug, Clone, Default)]
/// In-memory role service that records requested role changes; clones share state.
pub struct MemoryLauncherRoleService {
    inner: Rc<RefCell<RoleState>>,
}

impl MemoryLauncherRoleService {
    /// Creates a role service reporting `is_default`.
    pub fn new(is_default: bool) -> Self {
        Self {
            inner: Rc::new(RefCell::new(RoleState {
                is_default,
                ..RoleState::default()
            })),
        }
    }

    /// Returns how many times the home settings page was opened.
    pub fn settings_opened(&self) -> u32 {
        self.inner.borrow().settings_opened
    }

    /// Returns how many times the default role was cleared.
    pub fn cleared(&self) -> u32 {
        self.inner.borrow().cleared
    }
}

impl LauncherRoleService for MemoryLauncherRoleService {
    fn is_default_home<'a>(&'a self) -> LauncherRoleFuture<'a, Result<bool, String>> {
        Box::pin(async move { Ok(self.inner.borrow().is_default) })
    }

    fn open_home_settings<'a>(&'a self) -> LauncherRoleFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner.borrow_mut().settings_opened += 1;
            Ok(())
        })
    }

    fn clear_default_home<'a>(&'a self) -> LauncherRoleFuture<'a, Result<(), String>> {
        Box::pin(async move {
            let mut inner = self.inner.borrow_mut();
            inner.is_default = false;
            inner.cleared += 1;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    #[test]
    fn clearing_the_role_is_recorded_and_observable() {
        let role = MemoryLauncherRoleService::new(true);
        let role_obj: &dyn LauncherRoleService = &role;

        assert_eq!(block_on(role_obj.is_default_home()), Ok(true));
        block_on(role_obj.clear_default_home()).expect("clear");
        block_on(role_obj.open_home_settings()).expect("open settings");

        assert_eq!(block_on(role_obj.is_default_home()), Ok(false));
        assert_eq!(role.cleared(), 1);
        assert_eq!(role.settings_opened(), 1);
    }
}
