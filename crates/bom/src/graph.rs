use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use stocksmith_core::{DomainError, DomainResult, ItemId, Quantity, ValueObject};

/// One edge of the BOM graph: producing a single unit of the parent
/// requires `per_unit` units of `component`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomLine {
    pub component: ItemId,
    pub per_unit: Quantity,
}

impl ValueObject for BomLine {}

/// Adjacency mapping from a parent item to its component lines.
///
/// The underlying join table can express cycles, so the graph accepts any
/// edge set and `check_acyclic` is run before every explosion. Lines keep
/// insertion order; that order is what makes explosion deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BomGraph {
    lines: HashMap<ItemId, Vec<BomLine>>,
}

impl BomGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component line under `parent`.
    ///
    /// Zero quantities, self-reference, and duplicate component lines are
    /// rejected here; cycles through intermediate items are only caught by
    /// `check_acyclic`, since edges arrive one at a time from authoring
    /// workflows that this core does not control.
    pub fn add_line(
        &mut self,
        parent: ItemId,
        component: ItemId,
        per_unit: Quantity,
    ) -> DomainResult<()> {
        if per_unit.is_zero() {
            return Err(DomainError::validation(
                "bom line quantity cannot be zero",
            ));
        }
        if parent == component {
            return Err(DomainError::validation(format!(
                "item {parent} cannot require itself"
            )));
        }
        let lines = self.lines.entry(parent).or_default();
        if lines.iter().any(|l| l.component == component) {
            return Err(DomainError::conflict(format!(
                "item {parent} already has a bom line for component {component}"
            )));
        }
        lines.push(BomLine { component, per_unit });
        Ok(())
    }

    /// Component lines of `parent`, in authoring order. Empty for raw or
    /// purchased items.
    pub fn lines(&self, parent: ItemId) -> &[BomLine] {
        self.lines.get(&parent).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_manufactured(&self, item: ItemId) -> bool {
        !self.lines(item).is_empty()
    }

    /// Verify no item reachable from `root` directly or transitively
    /// requires itself.
    ///
    /// DFS with an on-stack marker: revisiting a node that is still on the
    /// recursion stack signals a cycle, and the offending item is named in
    /// the error.
    pub fn check_acyclic(&self, root: ItemId) -> DomainResult<()> {
        let mut visiting = HashSet::new();
        let mut done = HashSet::new();
        self.visit(root, &mut visiting, &mut done)
    }

    fn visit(
        &self,
        node: ItemId,
        visiting: &mut HashSet<ItemId>,
        done: &mut HashSet<ItemId>,
    ) -> DomainResult<()> {
        if done.contains(&node) {
            return Ok(());
        }
        if !visiting.insert(node) {
            return Err(DomainError::CyclicBom { item: node });
        }
        for line in self.lines(node) {
            self.visit(line.component, visiting, done)?;
        }
        visiting.remove(&node);
        done.insert(node);
        Ok(())
    }
}
