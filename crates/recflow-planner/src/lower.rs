//! Lowering: assign `OpId`s in step order and emit bindings.

use std::collections::BTreeMap;

use recflow_core::id::OpId;

use crate::logical::LogicalPipeline;
use crate::physical::{OperatorBinding, PhysicalProgram, PhysicalStep};

pub fn lower_to_physical(lp: &LogicalPipeline) -> PhysicalProgram {
    let mut steps = Vec::with_capacity(lp.steps.len());
    let mut bindings = BTreeMap::new();

    for (i, s) in lp.steps.iter().enumerate() {
        let op = OpId::new(i as u64);
        bindings.insert(
            op,
            OperatorBinding {
                key: s.key.clone(),
                config: s.config.clone(),
            },
        );
        steps.push(PhysicalStep {
            op,
            name: s.id.clone(),
            inputs: s.inputs.clone(),
        });
    }

    PhysicalProgram {
        inputs: lp.inputs.clone(),
        steps,
        bindings,
        output: OpId::new(lp.output as u64),
    }
}

#[cfg(test)]
mod tests {
    use crate::plan_yaml;

    #[test]
    fn ids_follow_step_order() {
        let prog = plan_yaml(
            "inputs: [a, b]\nsteps:\n  - { id: m, op: merge, inputs: [a, b] }\n  - { id: g, op: batch, input: m }\n",
        )
        .unwrap();
        assert_eq!(prog.steps.len(), 2);
        assert_eq!(prog.steps[1].op.get(), 1);
        assert_eq!(prog.bindings[&prog.steps[0].op].key, "merge");
        assert_eq!(prog.output, prog.steps[1].op);
        assert!(prog.describe()[1].ends_with("(output)"));
    }
}
