//! Cascade mapping for removals.
//!
//! Removing an entity removes everything that depends on it. The full set is
//! worked out before anything changes, so a removal either applies as one
//! [`Delta`] or not at all:
//!
//! 1. walk dependents outward from the requested ids
//! 2. dissolve every surviving multiple birth left with fewer than two members
//! 3. re-densify layer orders if a layer goes

use std::collections::BTreeSet;

use genogram_foundation::{EntityId, Error, Result};
use genogram_storage::{Delta, Entity, EntitySnapshot, Graph, Relational};
use tracing::debug;

/// Which entities a removal may reach.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Scope {
    /// Any live entity.
    #[default]
    All,
    /// Proposed entities only; the requested ids must be proposed.
    Proposed,
}

impl Scope {
    fn includes(self, graph: &Graph, id: EntityId) -> bool {
        match self {
            Self::All => true,
            Self::Proposed => graph.is_proposed(id),
        }
    }
}

/// Maps the removal of `ids` to the delta that performs it.
///
/// # Errors
///
/// Returns `CascadeFailed` if a requested id is not live, and
/// `InvariantViolation` if it lies outside `scope`. The graph is never
/// touched.
pub fn map_removal(graph: &Graph, ids: &[EntityId], scope: Scope) -> Result<Delta> {
    let doomed = closure(graph, ids, scope)?;
    let mut delta = Delta::new();
    for id in &doomed {
        delta.record_before(graph.snapshot(*id)?);
    }
    dissolve_groups(graph, &doomed, &mut delta)?;
    densify_layers(graph, &doomed, &mut delta)?;
    debug!(
        requested = ids.len(),
        removed = delta.removed().len(),
        modified = delta.modified().len(),
        "mapped removal"
    );
    Ok(delta)
}

fn closure(graph: &Graph, ids: &[EntityId], scope: Scope) -> Result<BTreeSet<EntityId>> {
    let mut doomed = BTreeSet::new();
    let mut pending = Vec::with_capacity(ids.len());
    for id in ids {
        if !graph.contains(*id) {
            return Err(Error::cascade_failed(*id));
        }
        if !scope.includes(graph, *id) {
            return Err(Error::invariant(format!("{id} is not proposed")));
        }
        pending.push(*id);
    }
    while let Some(id) = pending.pop() {
        if !doomed.insert(id) {
            continue;
        }
        let entity = graph.get(id)?;
        pending.extend(
            entity
                .dependents()
                .into_iter()
                .filter(|d| scope.includes(graph, *d) && !doomed.contains(d)),
        );
    }
    Ok(doomed)
}

fn dissolve_groups(graph: &Graph, doomed: &BTreeSet<EntityId>, delta: &mut Delta) -> Result<()> {
    let touched: BTreeSet<EntityId> = doomed
        .iter()
        .filter_map(|id| graph.child_of(*id).ok())
        .map(genogram_storage::ChildOf::target)
        .filter(|target| !doomed.contains(target))
        .filter(|target| graph.multiple_birth(*target).is_ok())
        .collect();
    for group in touched {
        let mb = graph.multiple_birth(group)?;
        let survivors: Vec<EntityId> = mb
            .child_ofs()
            .iter()
            .copied()
            .filter(|link| !doomed.contains(link))
            .collect();
        if survivors.len() >= 2 {
            continue;
        }
        debug!(%group, pair_bond = %mb.pair_bond(), "dissolving multiple birth");
        delta.record_before(graph.snapshot(group)?);
        for survivor in survivors {
            let snapshot = graph.snapshot(survivor)?;
            let mut moved = snapshot.clone();
            if let Entity::ChildOf(link) = &snapshot.entity {
                moved.entity = Entity::ChildOf(link.retargeted(mb.pair_bond()));
            }
            delta.record_before(snapshot);
            delta.record_after(moved);
        }
    }
    Ok(())
}

fn densify_layers(graph: &Graph, doomed: &BTreeSet<EntityId>, delta: &mut Delta) -> Result<()> {
    if !doomed.iter().any(|id| graph.layer(*id).is_ok()) {
        return Ok(());
    }
    let remaining = graph
        .layers()
        .into_iter()
        .filter(|layer| !doomed.contains(&layer.id()));
    for (index, layer) in remaining.enumerate() {
        let index = u32::try_from(index).map_err(|_| Error::invariant("too many layers"))?;
        if layer.order() == index {
            continue;
        }
        let snapshot = graph.snapshot(layer.id())?;
        let moved = EntitySnapshot {
            entity: Entity::Layer(layer.reordered(index)),
            ..snapshot.clone()
        };
        delta.record_before(snapshot);
        delta.record_after(moved);
    }
    Ok(())
}
