//! Single pass over a compilation unit applying configured annotations.

use tracing::debug;

use super::{merge, resolve, signature};
use crate::config::{AnnotationTarget, Configuration};
use crate::model::{AnnotationTag, DeclId, DeclKind, Unit};

/// Apply the configuration to every type declared in `unit`.
///
/// Returns `true` if any declaration's annotations were rewritten.
pub fn walk(unit: &mut Unit, config: &Configuration) -> bool {
    let mut changed = false;
    for root in unit.roots().to_vec() {
        match resolve(unit, root) {
            Ok(fqn) => changed |= walk_type(unit, config, root, &fqn),
            Err(err) => debug!(file = %unit.path().display(), error = %err, "skipping type"),
        }
    }
    changed
}

/// Apply class annotations to the type `id` named `fqn`, then its members.
fn walk_type(unit: &mut Unit, config: &Configuration, id: DeclId, fqn: &str) -> bool {
    let mut changed = apply(unit, id, config.lookup(AnnotationTarget::Class(fqn)));
    changed |= walk_members(unit, config, id, fqn);
    changed
}

fn walk_members(unit: &mut Unit, config: &Configuration, owner: DeclId, fqn: &str) -> bool {
    let members = match unit.get(owner) {
        Some(decl) => decl.members.clone(),
        None => return false,
    };

    let mut changed = false;
    for member in members {
        changed |= walk_member(unit, config, member, fqn);
    }
    changed
}

fn walk_member(unit: &mut Unit, config: &Configuration, id: DeclId, fqn: &str) -> bool {
    let Some(decl) = unit.get(id) else {
        return false;
    };

    match decl.kind {
        DeclKind::Class | DeclKind::Enum => {
            let nested = format!("{}.{}", fqn, decl.name);
            walk_type(unit, config, id, &nested)
        }
        DeclKind::Field => {
            if !in_scope(unit, id, fqn) {
                return false;
            }
            let name = decl.field_name().to_string();
            let desired = config.lookup(AnnotationTarget::Field { class: fqn, name: &name });
            apply(unit, id, desired)
        }
        DeclKind::Method => {
            let mut changed = false;
            if in_scope(unit, id, fqn) {
                let signature = signature::build(&decl.name, &decl.params);
                let desired = config.lookup(AnnotationTarget::Method {
                    class: fqn,
                    signature: &signature,
                });
                changed = apply(unit, id, desired);
            }
            // Local types declared in the method body.
            changed |= walk_members(unit, config, id, fqn);
            changed
        }
    }
}

/// Whether member `id` belongs directly to the type currently being walked.
fn in_scope(unit: &Unit, id: DeclId, fqn: &str) -> bool {
    match resolve(unit, id) {
        Ok(owner) => owner == fqn,
        Err(err) => {
            debug!(error = %err, "member has no resolvable owner");
            false
        }
    }
}

fn apply(unit: &mut Unit, id: DeclId, desired: &[AnnotationTag]) -> bool {
    if desired.is_empty() {
        return false;
    }
    let Some(decl) = unit.get_mut(id) else {
        return false;
    };
    let changed = merge(&mut decl.annotations, desired);
    if changed {
        debug!(kind = %decl.kind, name = %decl.name, count = desired.len(), "merged annotations");
        decl.touched = true;
    }
    changed
}
