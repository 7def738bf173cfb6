// ── Invalidation rules ──
//
// Static table from a completed write to the cache prefixes it makes
// stale. Applied by the mutation runner only after the remote call
// succeeds.

use std::collections::HashMap;

use crate::cache::CacheKey;
use crate::operation::OperationKind;
use crate::resource::ResourceKind;

/// Maps an [`OperationKind`] to the cache key prefixes it invalidates.
#[derive(Debug, Clone)]
pub struct InvalidationRouter {
    rules: HashMap<OperationKind, Vec<CacheKey>>,
}

impl InvalidationRouter {
    /// Build a router from explicit rules. Later rules for the same
    /// operation replace earlier ones.
    pub fn new(rules: impl IntoIterator<Item = (OperationKind, Vec<CacheKey>)>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    /// The built-in table for the admin API.
    pub fn standard() -> Self {
        use OperationKind as Op;
        use ResourceKind as R;

        let table: &[(OperationKind, &[ResourceKind])] = &[
            (Op::AddTeacher, &[R::Teachers]),
            (Op::EditTeacher, &[R::Teachers, R::Teacher, R::GroupTeachers]),
            (Op::DeleteTeacher, &[R::Teachers, R::Teacher, R::GroupTeachers]),
            (Op::AddGroup, &[R::Groups]),
            (Op::EditGroup, &[R::Groups, R::Group]),
            (Op::DeleteGroup, &[R::Groups, R::Group, R::GroupTeachers]),
            (Op::AssignTeacher, &[R::GroupTeachers, R::Group, R::Teachers]),
            (Op::UnassignTeacher, &[R::GroupTeachers, R::Group, R::Teachers]),
            (Op::AddUnit, &[R::Units]),
            (Op::EditUnit, &[R::Units, R::Unit]),
            (
                Op::DeleteUnit,
                &[R::Units, R::Unit, R::UnitVideos, R::UnitPdfs, R::UnitQuizzes],
            ),
            (Op::AddVideo, &[R::UnitVideos]),
            (Op::DeleteVideo, &[R::UnitVideos]),
            (Op::AddPdf, &[R::UnitPdfs]),
            (Op::DeletePdf, &[R::UnitPdfs]),
            (Op::AddQuiz, &[R::UnitQuizzes]),
            (Op::EditQuiz, &[R::UnitQuizzes]),
            (Op::DeleteQuiz, &[R::UnitQuizzes]),
            (Op::CancelReservation, &[R::Reservations]),
        ];

        Self::new(table.iter().map(|(op, kinds)| {
            (*op, kinds.iter().map(|kind| kind.prefix()).collect())
        }))
    }

    /// Prefixes to invalidate after `operation` succeeds. Unmapped
    /// operations invalidate nothing.
    pub fn rules_for(&self, operation: OperationKind) -> Vec<CacheKey> {
        self.rules.get(&operation).cloned().unwrap_or_default()
    }
}

impl Default for InvalidationRouter {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn delete_teacher_stales_teacher_lists() {
        let router = InvalidationRouter::standard();
        let prefixes = router.rules_for(OperationKind::DeleteTeacher);
        assert!(prefixes.contains(&CacheKey::new("teachers")));
        assert!(prefixes.contains(&CacheKey::new("groupTeachers")));
    }

    #[test]
    fn every_operation_is_mapped_in_standard_table() {
        let router = InvalidationRouter::standard();
        for op in OperationKind::iter() {
            assert!(!router.rules_for(op).is_empty(), "{op} has no rule");
        }
    }

    #[test]
    fn unmapped_operation_yields_nothing() {
        let router = InvalidationRouter::new([(
            OperationKind::AddPdf,
            vec![CacheKey::new("unitPdfs")],
        )]);
        assert_eq!(router.rules_for(OperationKind::AddPdf).len(), 1);
        assert!(router.rules_for(OperationKind::DeletePdf).is_empty());
    }

    #[test]
    fn prefixes_match_parameterised_keys() {
        let router = InvalidationRouter::standard();
        let key = CacheKey::new("unitVideos").with("12");
        assert!(
            router
                .rules_for(OperationKind::AddVideo)
                .iter()
                .any(|prefix| key.starts_with(prefix))
        );
    }
}
