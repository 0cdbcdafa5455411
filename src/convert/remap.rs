//! Mapping from COCO category ids to dense YOLO class ids.

use std::collections::HashMap;
use std::str::FromStr;

use crate::error::Coco2YoloError;
use crate::ir::{CategoryId, ClassId};

/// How COCO category ids become YOLO class ids.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClassIdPolicy {
    /// The k-th distinct `category_id - 1` encountered gets class id `k - 1`.
    ///
    /// Numbering depends on the order annotations are visited, so two
    /// documents listing the same annotations in a different order can
    /// number classes differently.
    #[default]
    EncounterOrder,
    /// Class id is `category_id - 1`, independent of visiting order.
    CategoryIdMinusOne,
}

impl ClassIdPolicy {
    /// Name used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            ClassIdPolicy::EncounterOrder => "encounter",
            ClassIdPolicy::CategoryIdMinusOne => "category",
        }
    }
}

impl FromStr for ClassIdPolicy {
    type Err = Coco2YoloError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "encounter" => Ok(ClassIdPolicy::EncounterOrder),
            "category" => Ok(ClassIdPolicy::CategoryIdMinusOne),
            other => Err(Coco2YoloError::InvalidClassIdPolicy(other.to_string())),
        }
    }
}

/// Run-local registry of class ids, built while annotations are visited.
#[derive(Clone, Debug, Default)]
pub struct CategoryRemap {
    policy: ClassIdPolicy,
    lookup: HashMap<i64, ClassId>,
    assigned: Vec<(ClassId, CategoryId)>,
}

impl CategoryRemap {
    pub fn new(policy: ClassIdPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    /// Resolves the class id for `category`, assigning one on first sight.
    ///
    /// Returns `None` only under [`ClassIdPolicy::CategoryIdMinusOne`] when
    /// `category_id - 1` is negative.
    pub fn class_id(&mut self, category: CategoryId) -> Option<ClassId> {
        let key = category.zero_based();
        if let Some(class_id) = self.lookup.get(&key) {
            return Some(*class_id);
        }

        let class_id = match self.policy {
            ClassIdPolicy::EncounterOrder => ClassId::new(self.lookup.len() as u64),
            ClassIdPolicy::CategoryIdMinusOne => ClassId::new(u64::try_from(key).ok()?),
        };
        self.lookup.insert(key, class_id);
        self.assigned.push((class_id, category));
        Some(class_id)
    }

    /// All assignments, ordered by class id.
    pub fn classes(&self) -> Vec<(ClassId, CategoryId)> {
        let mut classes = self.assigned.clone();
        classes.sort_by_key(|(class_id, _)| *class_id);
        classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encounter_order_assigns_dense_ids() {
        let mut remap = CategoryRemap::new(ClassIdPolicy::EncounterOrder);

        assert_eq!(remap.class_id(CategoryId(18)), Some(ClassId(0)));
        assert_eq!(remap.class_id(CategoryId(1)), Some(ClassId(1)));
        assert_eq!(remap.class_id(CategoryId(18)), Some(ClassId(0)));
        assert_eq!(remap.class_id(CategoryId(44)), Some(ClassId(2)));
        assert_eq!(remap.classes().len(), 3);

        assert_eq!(
            remap.classes(),
            vec![
                (ClassId(0), CategoryId(18)),
                (ClassId(1), CategoryId(1)),
                (ClassId(2), CategoryId(44)),
            ]
        );
    }

    #[test]
    fn encounter_order_accepts_category_zero() {
        let mut remap = CategoryRemap::new(ClassIdPolicy::EncounterOrder);
        assert_eq!(remap.class_id(CategoryId(0)), Some(ClassId(0)));
        assert_eq!(remap.class_id(CategoryId(1)), Some(ClassId(1)));
    }

    #[test]
    fn category_policy_uses_id_minus_one() {
        let mut remap = CategoryRemap::new(ClassIdPolicy::CategoryIdMinusOne);

        assert_eq!(remap.class_id(CategoryId(18)), Some(ClassId(17)));
        assert_eq!(remap.class_id(CategoryId(1)), Some(ClassId(0)));
        assert_eq!(remap.class_id(CategoryId(0)), None);
        assert_eq!(
            remap.classes(),
            vec![(ClassId(0), CategoryId(1)), (ClassId(17), CategoryId(18))]
        );
    }

    #[test]
    fn policy_parses_cli_names() {
        assert_eq!(
            "encounter".parse::<ClassIdPolicy>().unwrap(),
            ClassIdPolicy::EncounterOrder
        );
        assert_eq!(
            "category".parse::<ClassIdPolicy>().unwrap(),
            ClassIdPolicy::CategoryIdMinusOne
        );
        assert!(matches!(
            "sorted".parse::<ClassIdPolicy>(),
            Err(Coco2YoloError::InvalidClassIdPolicy(_))
        ));
    }
}
