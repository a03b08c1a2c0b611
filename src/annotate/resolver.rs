//! Fully qualified names of declarations.

use thiserror::Error;

use crate::model::{DeclId, Unit};

/// A declaration whose fully qualified name cannot be computed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("declaration {0} is not part of the unit")]
    Detached(DeclId),
    #[error("type {name} is declared outside of any package")]
    MissingPackage { name: String },
}

/// Fully qualified name of the declaration `id`.
///
/// Types contribute their name as a segment; fields, methods and other
/// members resolve to the name of their owning type.
pub fn resolve(unit: &Unit, id: DeclId) -> Result<String, IdentityError> {
    let decl = unit.get(id).ok_or(IdentityError::Detached(id))?;

    let scope = match decl.parent {
        Some(parent) => resolve(unit, parent)?,
        None if decl.kind.is_type() => unit
            .package()
            .map(str::to_string)
            .ok_or_else(|| IdentityError::MissingPackage {
                name: decl.name.clone(),
            })?,
        None => return Err(IdentityError::Detached(id)),
    };

    if decl.kind.is_type() {
        Ok(format!("{}.{}", scope, decl.name))
    } else {
        Ok(scope)
    }
}
