//! Permission tree construction
//!
//! Permissions reference their parent by code, not id. Rows whose parent
//! code matches nothing (or themselves) are promoted to roots; rows caught
//! in a parent cycle never reach a root and are left out.

use std::collections::{HashMap, HashSet};

use adm_core::Id;
use adm_db::PermissionRow;
use serde::Serialize;

/// One node of the permission tree
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PermissionNode {
    pub id: Id,
    pub name: String,
    pub code: String,
    pub parent_code: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: i32,
    pub sort: i32,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PermissionNode>,
    pub has_children: bool,
    pub checked: bool,
}

impl PermissionNode {
    fn from_row(row: PermissionRow, checked: bool) -> Self {
        Self {
            id: row.id,
            name: row.name,
            code: row.code,
            parent_code: row.parent_code,
            path: row.path,
            kind: row.kind,
            sort: row.sort,
            description: row.description,
            children: Vec::new(),
            has_children: false,
            checked,
        }
    }
}

/// Build the permission forest with no node checked
pub fn build_permission_tree(rows: Vec<PermissionRow>) -> Vec<PermissionNode> {
    build_checked_tree(rows, &HashSet::new())
}

/// Build the permission forest, marking nodes whose id is in `checked`
pub fn build_checked_tree(rows: Vec<PermissionRow>, checked: &HashSet<Id>) -> Vec<PermissionNode> {
    let index: HashMap<&str, usize> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| (row.code.as_str(), i))
        .collect();

    let mut roots = Vec::new();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); rows.len()];
    for (i, row) in rows.iter().enumerate() {
        match index.get(row.parent_code.as_str()) {
            Some(&parent) if parent != i => children[parent].push(i),
            _ => roots.push(i),
        }
    }

    let mut slots: Vec<Option<PermissionNode>> = rows
        .into_iter()
        .map(|row| {
            let is_checked = checked.contains(&row.id);
            Some(PermissionNode::from_row(row, is_checked))
        })
        .collect();

    let mut forest: Vec<PermissionNode> = roots
        .into_iter()
        .filter_map(|i| assemble(i, &children, &mut slots))
        .collect();
    sort_level(&mut forest);
    forest
}

fn assemble(
    i: usize,
    children: &[Vec<usize>],
    slots: &mut [Option<PermissionNode>],
) -> Option<PermissionNode> {
    let mut node = slots[i].take()?;
    node.children = children[i]
        .iter()
        .filter_map(|&child| assemble(child, children, slots))
        .collect();
    node.has_children = !node.children.is_empty();
    Some(node)
}

/// Stable sort by `(type, sort)`, applied recursively
fn sort_level(nodes: &mut [PermissionNode]) {
    nodes.sort_by_key(|node| (node.kind, node.sort));
    for node in nodes.iter_mut() {
        sort_level(&mut node.children);
    }
}
