//! Structural rules over spatial object configurations.
//!
//! A rule is a named predicate over an [`ObjectSettings`]: the object, the
//! descriptors it declares as fixed or varying, and its count. A
//! [`RuleSet`] evaluates all of its rules and reports every failure at once.

use serde::{Deserialize, Serialize};
use sofa_spatial::{Descriptor, ObjectKind};

use crate::error::{ConventionError, Result};

/// A proposed configuration of one spatial object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSettings {
    pub kind: ObjectKind,
    /// Descriptors constant across measurements.
    pub fixed: Vec<Descriptor>,
    /// Descriptors that vary along `M`.
    pub varying: Vec<Descriptor>,
    pub count: usize,
}

impl ObjectSettings {
    pub fn new(kind: ObjectKind, count: usize) -> Self {
        Self {
            kind,
            fixed: Vec::new(),
            varying: Vec::new(),
            count,
        }
    }

    pub fn with_fixed(mut self, fixed: &[Descriptor]) -> Self {
        self.fixed = fixed.to_vec();
        self
    }

    pub fn with_varying(mut self, varying: &[Descriptor]) -> Self {
        self.varying = varying.to_vec();
        self
    }

    /// Whether `descriptor` is declared, fixed or varying.
    pub fn declares(&self, descriptor: Descriptor) -> bool {
        self.fixed.contains(&descriptor) || self.varying.contains(&descriptor)
    }

    pub fn varies(&self, descriptor: Descriptor) -> bool {
        self.varying.contains(&descriptor)
    }

    /// Declared descriptors in `Position, View, Up` order.
    pub fn declared(&self) -> Vec<Descriptor> {
        Descriptor::ALL
            .into_iter()
            .filter(|d| self.declares(*d))
            .collect()
    }
}

/// What a rule checks. `object: None` applies to every object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum RuleKind {
    /// The object must declare each of `descriptors`.
    Declares {
        object: Option<ObjectKind>,
        descriptors: Vec<Descriptor>,
    },
    /// Declaring `descriptor` requires declaring `requires`.
    DependsOn {
        object: Option<ObjectKind>,
        descriptor: Descriptor,
        requires: Descriptor,
    },
    /// The object count must be exactly `count`.
    Count { object: ObjectKind, count: usize },
}

/// A named structural rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    #[serde(flatten)]
    pub kind: RuleKind,
}

fn applies(object: Option<ObjectKind>, kind: ObjectKind) -> bool {
    object.is_none_or(|o| o == kind)
}

impl Rule {
    pub fn new(name: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// `<Object> count == <count>`.
    pub fn count(object: ObjectKind, count: usize) -> Self {
        Self::new(
            format!("{object} count == {count}"),
            RuleKind::Count { object, count },
        )
    }

    /// `<Object> View and Up`: the object must declare both.
    pub fn view_and_up(object: ObjectKind) -> Self {
        Self::new(
            format!("{object} View and Up"),
            RuleKind::Declares {
                object: Some(object),
                descriptors: vec![Descriptor::View, Descriptor::Up],
            },
        )
    }

    /// `Up requires View`, for every object.
    pub fn up_requires_view() -> Self {
        Self::new(
            "Up requires View",
            RuleKind::DependsOn {
                object: None,
                descriptor: Descriptor::Up,
                requires: Descriptor::View,
            },
        )
    }

    /// `Position required`, for every object.
    pub fn position_required() -> Self {
        Self::new(
            "Position required",
            RuleKind::Declares {
                object: None,
                descriptors: vec![Descriptor::Position],
            },
        )
    }

    pub fn check(&self, settings: &ObjectSettings) -> bool {
        match &self.kind {
            RuleKind::Declares {
                object,
                descriptors,
            } => {
                !applies(*object, settings.kind)
                    || descriptors.iter().all(|d| settings.declares(*d))
            }
            RuleKind::DependsOn {
                object,
                descriptor,
                requires,
            } => {
                !applies(*object, settings.kind)
                    || !settings.declares(*descriptor)
                    || settings.declares(*requires)
            }
            RuleKind::Count { object, count } => {
                *object != settings.kind || settings.count == *count
            }
        }
    }
}

/// An ordered list of rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// A set without any rule.
    pub fn new() -> Self {
        Self::default()
    }

    /// The rules every convention starts from.
    pub fn baseline() -> Self {
        Self::new()
            .with(Rule::count(ObjectKind::Listener, 1))
            .with(Rule::count(ObjectKind::Source, 1))
            .with(Rule::up_requires_view())
    }

    /// Adds `rule` after the existing ones. Rules already in the set are
    /// never replaced: an identical rule is skipped, and a different rule
    /// under a taken name is checked alongside the first.
    pub fn with(mut self, rule: Rule) -> Self {
        if !self.rules.contains(&rule) {
            self.rules.push(rule);
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.rules.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Names of all rules `settings` violates.
    pub fn failures(&self, settings: &ObjectSettings) -> Vec<String> {
        self.rules
            .iter()
            .filter(|r| !r.check(settings))
            .map(|r| r.name.clone())
            .collect()
    }

    /// Evaluates every rule.
    ///
    /// # Errors
    ///
    /// Returns [`ConventionError::ValidationFailed`] naming all failing rules.
    pub fn validate(&self, settings: &ObjectSettings) -> Result<()> {
        let rules = self.failures(settings);
        if rules.is_empty() {
            return Ok(());
        }
        tracing::debug!(object = %settings.kind, failed = ?rules, "Validation failed");
        Err(ConventionError::ValidationFailed {
            object: settings.kind,
            rules,
        })
    }
}
