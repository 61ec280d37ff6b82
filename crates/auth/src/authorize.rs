use thiserror::Error;

use crate::permissions::{Action, ModuleId, Permission};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// `true` when any of `permissions` grants `action` on `module`.
pub fn can_perform(permissions: &[Permission], module: ModuleId, action: Action) -> bool {
    permissions.iter().any(|p| p.grants(module, action))
}

/// [`can_perform`] as a `Result`, naming the missing permission.
pub fn authorize(
    permissions: &[Permission],
    module: ModuleId,
    action: Action,
) -> Result<(), AuthzError> {
    if can_perform(permissions, module, action) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(
            Permission::of(module, action).as_str().to_string(),
        ))
    }
}
