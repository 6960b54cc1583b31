// pass.rs — Pass descriptor module: metadata, dependency resolution, artifact IDs
//
// Declares the generator's four passes, their dependency edges, and the
// artifacts they produce. Used by the pipeline runner to compute the minimal
// pass subset for each --emit target.

use std::collections::HashSet;

// ── Pass and Artifact identifiers ──────────────────────────────────────────

/// Identifies each generator pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassId {
    Read,
    Validate,
    BuildTable,
    Emit,
}

/// Machine-readable artifact identifiers. Each maps to a concrete type
/// in the generation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactId {
    RawParams, // RawParams
    Params,    // HardwareParams
    Table,     // TwiddleTable
    Generated, // GeneratedVhdl
}

// ── Pass descriptor ────────────────────────────────────────────────────────

/// Static metadata about a generator pass.
pub struct PassDescriptor {
    /// Human-readable name for diagnostics/verbose output.
    pub name: &'static str,
    /// Pass dependencies (other passes whose outputs this pass consumes).
    pub inputs: &'static [PassId],
    /// Artifacts this pass produces.
    pub outputs: &'static [ArtifactId],
    /// Postconditions, for documentation and verbose output.
    pub invariants: &'static str,
}

/// Return the static descriptor for a given pass.
pub fn descriptor(id: PassId) -> PassDescriptor {
    match id {
        PassId::Read => PassDescriptor {
            name: "read",
            inputs: &[],
            outputs: &[ArtifactId::RawParams],
            invariants: "every marker found is bound to its last readable value",
        },
        PassId::Validate => PassDescriptor {
            name: "validate",
            inputs: &[PassId::Read],
            outputs: &[ArtifactId::Params],
            invariants: "all parameters present, dsp count even and dividing N",
        },
        PassId::BuildTable => PassDescriptor {
            name: "build_table",
            inputs: &[PassId::Validate],
            outputs: &[ArtifactId::Table],
            invariants: "every (k, n) with k < N/2, n < N has a slot",
        },
        PassId::Emit => PassDescriptor {
            name: "emit",
            inputs: &[PassId::Validate, PassId::BuildTable],
            outputs: &[ArtifactId::Generated],
            invariants: "dsp_count/2 pairs of operations_per_slice*N literals",
        },
    }
}

// ── Dependency resolution ──────────────────────────────────────────────────

/// All pass IDs in declaration order (used for iteration).
pub const ALL_PASSES: [PassId; 4] = [
    PassId::Read,
    PassId::Validate,
    PassId::BuildTable,
    PassId::Emit,
];

/// Compute the minimal ordered set of passes needed to produce `terminal`.
/// Returns passes in topological (execution) order.
pub fn required_passes(terminal: PassId) -> Vec<PassId> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    visit(terminal, &mut visited, &mut order);
    order
}

fn visit(id: PassId, visited: &mut HashSet<PassId>, order: &mut Vec<PassId>) {
    if !visited.insert(id) {
        return;
    }
    for &dep in descriptor(id).inputs {
        visit(dep, visited, order);
    }
    order.push(id);
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_passes_validate_skips_table() {
        let passes = required_passes(PassId::Validate);
        assert_eq!(passes, vec![PassId::Read, PassId::Validate]);
        assert!(!passes.contains(&PassId::BuildTable));
    }

    #[test]
    fn required_passes_emit_includes_all() {
        let passes = required_passes(PassId::Emit);
        assert_eq!(passes, ALL_PASSES.to_vec());
    }

    #[test]
    fn required_passes_read_is_minimal() {
        assert_eq!(required_passes(PassId::Read), vec![PassId::Read]);
    }

    #[test]
    fn all_descriptors_have_outputs() {
        for pass in &ALL_PASSES {
            let desc = descriptor(*pass);
            assert!(
                !desc.outputs.is_empty(),
                "pass {:?} has no outputs declared",
                pass
            );
        }
    }

    #[test]
    fn dependency_edges_are_consistent() {
        for pass in &ALL_PASSES {
            let order = required_passes(*pass);
            let self_pos = order.iter().position(|p| p == pass).unwrap();
            for dep in descriptor(*pass).inputs {
                let dep_pos = order.iter().position(|p| p == dep).unwrap();
                assert!(
                    dep_pos < self_pos,
                    "{:?} depends on {:?} but it comes later in topological order",
                    pass,
                    dep
                );
            }
        }
    }
}
