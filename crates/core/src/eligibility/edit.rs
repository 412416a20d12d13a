//! Pure path-addressed tree edits.
//!
//! The rules builder UI keeps multiple in-flight copies of a tree (the
//! stored document and a draft under edit). Edits are therefore modeled as
//! pure functions: `apply_edit` returns a new tree and leaves its input
//! untouched, so no caller ever observes another caller's mutation.

use super::rules::{GroupLogic, GroupRule, NodePath, RuleNode};

/// An edit applied to the node addressed by a [`NodePath`].
#[derive(Debug, Clone)]
pub enum EditOp {
    /// Insert `node` at `index` among the target group's children.
    InsertChild { index: usize, node: RuleNode },
    /// Remove the child at `index` from the target group.
    RemoveChild { index: usize },
    /// Replace the target node wholesale. Replacing the root requires the
    /// replacement to be a group.
    ReplaceNode { node: RuleNode },
    /// Change the target group's combinator.
    SetLogic { logic: GroupLogic },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditError {
    #[error("no node exists at path {0}")]
    PathNotFound(NodePath),

    #[error("node at path {0} is not a group")]
    NotAGroup(NodePath),

    #[error("child index {index} out of bounds at path {path} (group has {len} children)")]
    IndexOutOfBounds {
        path: NodePath,
        index: usize,
        len: usize,
    },

    #[error("the root node must remain a group")]
    RootMustBeGroup,
}

/// Apply `op` to the node at `path`, returning the resulting tree.
pub fn apply_edit(root: &GroupRule, path: &NodePath, op: EditOp) -> Result<GroupRule, EditError> {
    if path.0.is_empty() {
        if let EditOp::ReplaceNode { node } = op {
            return match node {
                RuleNode::Group(group) => Ok(group),
                _ => Err(EditError::RootMustBeGroup),
            };
        }
    }

    let mut next = root.clone();
    edit_at(&mut next, path, &path.0, op)?;
    Ok(next)
}

/// Walk `remaining` child indices down from `group` and apply the edit.
fn edit_at(
    group: &mut GroupRule,
    full_path: &NodePath,
    remaining: &[usize],
    op: EditOp,
) -> Result<(), EditError> {
    let Some((&index, rest)) = remaining.split_first() else {
        return apply_to_group(group, full_path, op);
    };

    let child = group
        .children
        .get_mut(index)
        .ok_or_else(|| EditError::PathNotFound(full_path.clone()))?;

    if rest.is_empty() {
        return match op {
            EditOp::ReplaceNode { node } => {
                *child = node;
                Ok(())
            }
            other => match child {
                RuleNode::Group(target) => apply_to_group(target, full_path, other),
                _ => Err(EditError::NotAGroup(full_path.clone())),
            },
        };
    }

    match child {
        RuleNode::Group(nested) => edit_at(nested, full_path, rest, op),
        _ => Err(EditError::PathNotFound(full_path.clone())),
    }
}

fn apply_to_group(group: &mut GroupRule, path: &NodePath, op: EditOp) -> Result<(), EditError> {
    match op {
        EditOp::InsertChild { index, node } => {
            let len = group.children.len();
            if index > len {
                return Err(EditError::IndexOutOfBounds {
                    path: path.clone(),
                    index,
                    len,
                });
            }
            group.children.insert(index, node);
            Ok(())
        }
        EditOp::RemoveChild { index } => {
            let len = group.children.len();
            if index >= len {
                return Err(EditError::IndexOutOfBounds {
                    path: path.clone(),
                    index,
                    len,
                });
            }
            group.children.remove(index);
            Ok(())
        }
        EditOp::SetLogic { logic } => {
            group.logic = logic;
            Ok(())
        }
        // Root replacement is handled in edit_root; child replacement in
        // edit_at.
        EditOp::ReplaceNode { .. } => Err(EditError::NotAGroup(path.clone())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
