use super::order::DomainValues;
use crate::basic_types::EmptyDomain;
use crate::engine::propagation::Constraint;
use crate::engine::propagation::DomainChange;
use crate::engine::propagation::PropagationContext;
use crate::engine::propagation::RevisionType;
use crate::engine::variable::VariableId;

/// Channeling between two equal-length arrays: `f[i] = j` iff `g[j] = i`.
///
/// Value consistent: `j` is supported in `f[i]` iff `i` is still present in
/// `g[j]`, and a bound entry immediately binds its mirror.
#[derive(Debug)]
pub(crate) struct Inverse {
    pub(crate) forward: Vec<VariableId>,
    pub(crate) backward: Vec<VariableId>,
}

impl Constraint for Inverse {
    fn name(&self) -> &'static str {
        "inverse"
    }

    fn variables(&self) -> Vec<VariableId> {
        let mut variables = self.forward.clone();
        variables.extend_from_slice(&self.backward);
        variables
    }

    fn revision_type(&self) -> RevisionType {
        RevisionType::Value
    }

    fn initial_arc_cons(&self, context: &mut PropagationContext<'_>) -> Result<(), EmptyDomain> {
        let len = self.forward.len() as i32;
        for &variable in self.forward.iter().chain(&self.backward) {
            context.set_min(variable, 0)?;
            context.set_max(variable, len - 1)?;
        }
        self.channel(context, &self.forward, &self.backward)?;
        self.channel(context, &self.backward, &self.forward)
    }

    fn local_arc_cons(
        &self,
        context: &mut PropagationContext<'_>,
        variable: VariableId,
        change: DomainChange,
    ) -> Result<(), EmptyDomain> {
        let (position, mirror) =
            if let Some(position) = self.forward.iter().position(|&v| v == variable) {
                (position, &self.backward)
            } else {
                let position = self
                    .backward
                    .iter()
                    .position(|&v| v == variable)
                    .expect("the changed variable belongs to the constraint");
                (position, &self.forward)
            };

        if let DomainChange::Removal(value) = change {
            if (0..mirror.len() as i32).contains(&value) {
                context.remove_value(mirror[value as usize], position as i32)?;
            }
        }
        if context.is_bound(variable) {
            let value = context.min(variable);
            context.set(mirror[value as usize], position as i32)?;
        }
        Ok(())
    }
}

impl Inverse {
    fn channel(
        &self,
        context: &mut PropagationContext<'_>,
        these: &[VariableId],
        those: &[VariableId],
    ) -> Result<(), EmptyDomain> {
        for (position, &variable) in these.iter().enumerate() {
            let unsupported: Vec<i32> = DomainValues::of(context, variable)
                .filter(|&value| !context.contains(those[value as usize], position as i32))
                .collect();
            for value in unsupported {
                context.remove_value(variable, value)?;
            }
            if context.is_bound(variable) {
                let value = context.min(variable);
                context.set(those[value as usize], position as i32)?;
            }
        }
        Ok(())
    }
}
