use super::compiler::compile;
use super::condition::{Condition, ValidCondition};
use super::errors::ConditionError;
use super::expr::{Expr, ProductAttributes};
use super::visibility::Visibility;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How condition groups of a collection are combined
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombinationMode {
    /// Intersection across groups
    All,
    /// Union across groups
    Any,
}

impl CombinationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CombinationMode::All => "all",
            CombinationMode::Any => "any",
        }
    }
}

impl std::fmt::Display for CombinationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CombinationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(CombinationMode::All),
            "any" => Ok(CombinationMode::Any),
            _ => Err(format!("Unknown combination mode: {}", s)),
        }
    }
}

/// Combination mode plus the ordered, validated conditions of one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRules {
    mode: CombinationMode,
    conditions: Vec<ValidCondition>,
}

impl CollectionRules {
    pub fn new(mode: CombinationMode) -> Self {
        Self {
            mode,
            conditions: Vec::new(),
        }
    }

    /// Validate every condition; the first invalid one is returned as the error
    pub fn from_conditions<I>(mode: CombinationMode, conditions: I) -> Result<Self, ConditionError>
    where
        I: IntoIterator<Item = Condition>,
    {
        let mut rules = Self::new(mode);
        for condition in conditions {
            rules.push(condition)?;
        }
        Ok(rules)
    }

    pub fn push(&mut self, condition: Condition) -> Result<(), ConditionError> {
        self.conditions.push(condition.validate()?);
        Ok(())
    }

    pub fn mode(&self) -> CombinationMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: CombinationMode) {
        self.mode = mode;
    }

    pub fn conditions(&self) -> &[ValidCondition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// User-condition predicate, without visibility
    pub fn predicate(&self) -> Expr {
        compile(&self.conditions, self.mode)
    }

    /// Evaluate against an in-memory product list, visibility included
    pub fn matching<'a, P: ProductAttributes>(
        &self,
        visibility: &Visibility,
        products: &'a [P],
    ) -> Vec<&'a P> {
        if self.is_empty() {
            return Vec::new();
        }
        let predicate = self.predicate();
        products
            .iter()
            .filter(|p| visibility.admits(*p) && predicate.matches(*p))
            .collect()
    }
}
