//! BOM explosion: flatten a root item into total component requirements.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde::{Deserialize, Serialize};

use stocksmith_core::{DomainError, DomainResult, ItemId, Quantity};

use crate::graph::BomGraph;

/// Total requirement for one component of an exploded BOM.
///
/// The quantity is the sum over all root-to-component paths of the path's
/// per-unit products, times the requested output quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub item: ItemId,
    pub quantity: Quantity,
}

impl BomGraph {
    /// Explode `root` for an output of `output` units.
    ///
    /// Runs `check_acyclic` first; a cyclic graph is rejected before any
    /// traversal, so callers can rely on explosion terminating. The result
    /// order is first-visit depth-first preorder, which is deterministic
    /// for a given graph and is the order rejection messages use.
    ///
    /// A root with no lines (a raw or purchased component) explodes to an
    /// empty requirement set.
    pub fn explode(&self, root: ItemId, output: Quantity) -> DomainResult<Vec<Requirement>> {
        self.check_acyclic(root)?;

        let mut order = Vec::new();
        let mut totals: HashMap<ItemId, u64> = HashMap::new();
        self.accumulate(root, output.get(), &mut order, &mut totals)?;

        Ok(order
            .into_iter()
            .map(|item| Requirement {
                item,
                quantity: Quantity::new(totals[&item]),
            })
            .collect())
    }

    fn accumulate(
        &self,
        parent: ItemId,
        multiplier: u64,
        order: &mut Vec<ItemId>,
        totals: &mut HashMap<ItemId, u64>,
    ) -> DomainResult<()> {
        for line in self.lines(parent) {
            // Multiplicative along the path, additive across paths.
            let needed = line
                .per_unit
                .checked_mul(multiplier)
                .ok_or_else(|| overflow(line.component))?;
            match totals.entry(line.component) {
                Entry::Occupied(mut e) => {
                    *e.get_mut() = e
                        .get()
                        .checked_add(needed.get())
                        .ok_or_else(|| overflow(line.component))?;
                }
                Entry::Vacant(e) => {
                    e.insert(needed.get());
                    order.push(line.component);
                }
            }
            self.accumulate(line.component, needed.get(), order, totals)?;
        }
        Ok(())
    }
}

fn overflow(item: ItemId) -> DomainError {
    DomainError::validation(format!(
        "quantity overflow while exploding component {item}"
    ))
}
