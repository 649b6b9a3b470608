//! Full invariant sweep.

use genogram_foundation::{Error, Result};

use crate::entity::{Entity, Relational};
use crate::graph::Graph;

impl Graph {
    /// Checks every structural invariant of the graph.
    ///
    /// Edits keep these invariants incrementally; this sweep exists for tests
    /// and for checking freshly loaded diagrams.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` describing the first broken invariant.
    pub fn validate(&self) -> Result<()> {
        for entity in self.iter() {
            let id = entity.id();
            let proposed = self.proposed.contains(&id);
            self.check_references(entity, proposed)
                .map_err(|e| e.in_operation("validate"))?;
            self.check_shape(entity)?;
            for reference in entity.references() {
                let wired = self
                    .resolve(reference.target)
                    .is_some_and(|t| t.dependents().contains(&id));
                if !wired {
                    return Err(Error::invariant(format!(
                        "{} is missing back-reference to {id}",
                        reference.target
                    )));
                }
            }
            for dependent in entity.dependents() {
                let points_back = self
                    .resolve(dependent)
                    .is_some_and(|d| d.references().iter().any(|r| r.target == id));
                if !points_back {
                    return Err(Error::invariant(format!(
                        "{id} lists {dependent} as a dependent but it does not reference {id}"
                    )));
                }
            }
            if let Entity::MultipleBirth(mb) = entity {
                if mb.child_ofs.len() < 2 {
                    return Err(Error::invariant(format!(
                        "multiple birth {id} has {} members",
                        mb.child_ofs.len()
                    )));
                }
            }
        }

        for (index, layer) in self.layers().into_iter().enumerate() {
            if usize::try_from(layer.order).ok() != Some(index) {
                return Err(Error::invariant(format!(
                    "layer orders are not dense: {} has order {} at position {index}",
                    layer.id, layer.order
                )));
            }
            for (entity, row) in &layer.overrides {
                let owner = self.get(*entity).map_err(|_| {
                    Error::invariant(format!("layer {} overrides missing {entity}", layer.id))
                })?;
                if row.is_empty() {
                    return Err(Error::invariant(format!(
                        "layer {} holds an empty row for {entity}",
                        layer.id
                    )));
                }
                for (name, value) in row {
                    let info = self.property_info(owner.kind(), name)?;
                    if !info.layered || (info.geometry && !layer.store_geometry) {
                        return Err(Error::invariant(format!(
                            "layer {} cannot override {name} on {entity}",
                            layer.id
                        )));
                    }
                    if !info.ty.accepts(value) {
                        return Err(Error::type_mismatch(name, info.ty, value.value_type()));
                    }
                }
            }
        }

        for (entity, row) in &self.properties {
            let owner = self.get(*entity).map_err(|_| {
                Error::invariant(format!("property row for missing {entity}"))
            })?;
            if row.is_empty() {
                return Err(Error::invariant(format!("empty property row for {entity}")));
            }
            self.check_row(owner.kind(), row)?;
        }

        if let Some(stale) = self.proposed.iter().find(|id| !self.contains(**id)) {
            return Err(Error::invariant(format!("proposed {stale} is not live")));
        }
        Ok(())
    }
}
