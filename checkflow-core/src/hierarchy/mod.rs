//! Unit hierarchy snapshot and bounded tree walks
//!
//! Walks never trust the parent links: every traversal tracks visited nodes
//! and stops at `max_depth`, so a corrupted store cannot hang routing.

use crate::models::{Unit, UnitId};
use crate::store::{StoreError, WorkflowStore};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors raised while walking the unit tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("unit {0} not found")]
    UnknownUnit(UnitId),

    #[error("unit hierarchy contains a cycle through unit {0}")]
    Cycle(UnitId),

    #[error("unit hierarchy deeper than {0} levels")]
    TooDeep(usize),
}

/// Immutable view of all units
#[derive(Debug, Clone)]
pub struct UnitHierarchy {
    units: HashMap<UnitId, Unit>,
    max_depth: usize,
}

impl UnitHierarchy {
    pub fn new(units: Vec<Unit>, max_depth: usize) -> Self {
        Self {
            units: units.into_iter().map(|u| (u.id, u)).collect(),
            max_depth: max_depth.max(1),
        }
    }

    /// Snapshot every unit currently in `store`
    pub fn load(store: &dyn WorkflowStore, max_depth: usize) -> Result<Self, StoreError> {
        Ok(Self::new(store.list_units()?, max_depth))
    }

    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn contains(&self, id: UnitId) -> bool {
        self.units.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Chain from `unit` up to its root, `unit` first
    pub fn ancestors(&self, unit: UnitId) -> Result<Vec<&Unit>, HierarchyError> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(unit);

        while let Some(id) = current {
            if !visited.insert(id) {
                return Err(HierarchyError::Cycle(id));
            }
            if chain.len() >= self.max_depth {
                return Err(HierarchyError::TooDeep(self.max_depth));
            }
            let node = self.units.get(&id).ok_or(HierarchyError::UnknownUnit(id))?;
            chain.push(node);
            current = node.parent;
        }

        Ok(chain)
    }

    /// Chain from the root down to `unit`
    pub fn parent_chain(&self, unit: UnitId) -> Result<Vec<&Unit>, HierarchyError> {
        let mut chain = self.ancestors(unit)?;
        chain.reverse();
        Ok(chain)
    }

    pub fn root_of(&self, unit: UnitId) -> Result<&Unit, HierarchyError> {
        self.ancestors(unit)?
            .pop()
            .ok_or(HierarchyError::UnknownUnit(unit))
    }

    /// True when `ancestor` is `unit` or lies on its path to the root
    pub fn is_ancestor_or_self(
        &self,
        ancestor: UnitId,
        unit: UnitId,
    ) -> Result<bool, HierarchyError> {
        Ok(self.ancestors(unit)?.iter().any(|u| u.id == ancestor))
    }

    /// Direct children, ordered by code
    pub fn children(&self, unit: UnitId) -> Vec<&Unit> {
        let mut children: Vec<_> = self
            .units
            .values()
            .filter(|u| u.parent == Some(unit))
            .collect();
        children.sort_by(|a, b| a.code.cmp(&b.code));
        children
    }

    /// Every unit below `unit` (excluding itself), breadth-first
    pub fn descendants(&self, unit: UnitId) -> Result<Vec<&Unit>, HierarchyError> {
        if !self.contains(unit) {
            return Err(HierarchyError::UnknownUnit(unit));
        }

        let mut result = Vec::new();
        let mut visited = HashSet::from([unit]);
        let mut frontier = vec![unit];
        let mut depth = 0;

        while !frontier.is_empty() {
            depth += 1;
            if depth > self.max_depth {
                return Err(HierarchyError::TooDeep(self.max_depth));
            }
            let mut next = Vec::new();
            for id in frontier {
                for child in self.children(id) {
                    if !visited.insert(child.id) {
                        return Err(HierarchyError::Cycle(child.id));
                    }
                    next.push(child.id);
                    result.push(child);
                }
            }
            frontier = next;
        }

        Ok(result)
    }

    /// Human readable root-to-unit path, e.g. "HO > Region-3 > Branch-12"
    pub fn path_display(&self, unit: UnitId) -> Result<String, HierarchyError> {
        Ok(self
            .parent_chain(unit)?
            .iter()
            .map(|u| u.name.as_str())
            .collect::<Vec<_>>()
            .join(" > "))
    }

    /// Whether re-parenting `unit` under `new_parent` would close a cycle
    pub fn would_create_cycle(
        &self,
        unit: UnitId,
        new_parent: UnitId,
    ) -> Result<bool, HierarchyError> {
        if unit == new_parent {
            return Ok(true);
        }
        self.is_ancestor_or_self(unit, new_parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UnitType;
    use chrono::Utc;

    fn unit(id: u64, name: &str, parent: Option<u64>) -> Unit {
        Unit {
            id: UnitId(id),
            code: name.to_uppercase(),
            name: name.to_string(),
            unit_type: UnitType::Other,
            parent: parent.map(UnitId),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample() -> UnitHierarchy {
        UnitHierarchy::new(
            vec![
                unit(1, "HO", None),
                unit(2, "Region-3", Some(1)),
                unit(3, "Branch-12", Some(2)),
                unit(4, "Region-9", Some(1)),
                unit(5, "Branch-90", Some(4)),
            ],
            32,
        )
    }

    #[test]
    fn test_parent_chain_is_root_first() {
        let hierarchy = sample();
        let chain: Vec<_> = hierarchy
            .parent_chain(UnitId(3))
            .unwrap()
            .iter()
            .map(|u| u.id.value())
            .collect();
        assert_eq!(chain, vec![1, 2, 3]);
        assert_eq!(
            hierarchy.path_display(UnitId(3)).unwrap(),
            "HO > Region-3 > Branch-12"
        );
        assert_eq!(hierarchy.root_of(UnitId(5)).unwrap().id, UnitId(1));
    }

    #[test]
    fn test_ancestor_matching() {
        let hierarchy = sample();
        assert!(hierarchy
            .is_ancestor_or_self(UnitId(2), UnitId(3))
            .unwrap());
        assert!(hierarchy
            .is_ancestor_or_self(UnitId(3), UnitId(3))
            .unwrap());
        assert!(hierarchy
            .is_ancestor_or_self(UnitId(1), UnitId(5))
            .unwrap());
        assert!(!hierarchy
            .is_ancestor_or_self(UnitId(4), UnitId(3))
            .unwrap());
        // A child is never an ancestor of its parent
        assert!(!hierarchy
            .is_ancestor_or_self(UnitId(3), UnitId(2))
            .unwrap());
    }

    #[test]
    fn test_descendants() {
        let hierarchy = sample();
        let mut below: Vec<_> = hierarchy
            .descendants(UnitId(1))
            .unwrap()
            .iter()
            .map(|u| u.id.value())
            .collect();
        below.sort();
        assert_eq!(below, vec![2, 3, 4, 5]);
        assert!(hierarchy.descendants(UnitId(3)).unwrap().is_empty());
        assert_eq!(hierarchy.children(UnitId(1)).len(), 2);
    }

    #[test]
    fn test_cycle_detected() {
        let hierarchy = UnitHierarchy::new(
            vec![unit(1, "A", Some(2)), unit(2, "B", Some(1))],
            32,
        );
        assert_eq!(
            hierarchy.ancestors(UnitId(1)).unwrap_err(),
            HierarchyError::Cycle(UnitId(1))
        );
    }

    #[test]
    fn test_depth_bound() {
        let units = (1..=10)
            .map(|i| unit(i, &format!("U{}", i), if i == 1 { None } else { Some(i - 1) }))
            .collect();
        let hierarchy = UnitHierarchy::new(units, 4);
        assert_eq!(
            hierarchy.ancestors(UnitId(10)).unwrap_err(),
            HierarchyError::TooDeep(4)
        );
        assert!(hierarchy.ancestors(UnitId(4)).is_ok());
    }

    #[test]
    fn test_unknown_unit() {
        let hierarchy = sample();
        assert_eq!(
            hierarchy.ancestors(UnitId(42)).unwrap_err(),
            HierarchyError::UnknownUnit(UnitId(42))
        );
    }

    #[test]
    fn test_would_create_cycle() {
        let hierarchy = sample();
        assert!(hierarchy.would_create_cycle(UnitId(2), UnitId(3)).unwrap());
        assert!(hierarchy.would_create_cycle(UnitId(2), UnitId(2)).unwrap());
        assert!(!hierarchy.would_create_cycle(UnitId(3), UnitId(4)).unwrap());
    }
}
