use super::condition::ValidCondition;
use super::expr::Expr;
use super::field::FieldReference;
use super::rules::CombinationMode;

/// Conditions sharing one field; a product satisfies the group if it
/// satisfies any of them.
#[derive(Debug, Clone)]
pub struct ConditionGroup<'a> {
    pub field: FieldReference,
    pub conditions: Vec<&'a ValidCondition>,
}

impl ConditionGroup<'_> {
    pub fn predicate(&self) -> Expr {
        Expr::any(
            self.conditions
                .iter()
                .map(|c| c.predicate().clone())
                .collect(),
        )
    }
}

/// Bucket conditions by field, groups ordered by each field's first occurrence
pub fn group_by_field(conditions: &[ValidCondition]) -> Vec<ConditionGroup<'_>> {
    let mut groups: Vec<ConditionGroup<'_>> = Vec::new();
    for condition in conditions {
        let field = condition.field_reference();
        match groups.iter_mut().find(|g| g.field == field) {
            Some(group) => group.conditions.push(condition),
            None => groups.push(ConditionGroup {
                field,
                conditions: vec![condition],
            }),
        }
    }
    groups
}

/// Compile validated conditions into one predicate.
///
/// Groups are OR-ed internally and combined across fields with `mode`.
/// No conditions compiles to [`Expr::nothing`].
pub fn compile(conditions: &[ValidCondition], mode: CombinationMode) -> Expr {
    if conditions.is_empty() {
        return Expr::nothing();
    }

    let groups: Vec<Expr> = group_by_field(conditions)
        .iter()
        .map(ConditionGroup::predicate)
        .collect();

    match mode {
        CombinationMode::All => Expr::all(groups),
        CombinationMode::Any => Expr::any(groups),
    }
}
