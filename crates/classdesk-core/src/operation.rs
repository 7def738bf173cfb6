// ── Write operations ──
//
// Every write the dashboard can perform is one `OperationKind`. The kind
// decides the endpoint and which id field the target is sent under;
// payloads themselves are passed through as flat JSON objects.

use serde_json::{Map, Value};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::CoreError;
use crate::resource::Endpoint;

/// All write operations against the admin API.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "camelCase")]
pub enum OperationKind {
    // ── Teachers ─────────────────────────────────────────────────────
    AddTeacher,
    EditTeacher,
    DeleteTeacher,

    // ── Groups ───────────────────────────────────────────────────────
    AddGroup,
    EditGroup,
    DeleteGroup,
    AssignTeacher,
    UnassignTeacher,

    // ── Units ────────────────────────────────────────────────────────
    AddUnit,
    EditUnit,
    DeleteUnit,

    // ── Unit content ─────────────────────────────────────────────────
    AddVideo,
    DeleteVideo,
    AddPdf,
    DeletePdf,
    AddQuiz,
    EditQuiz,
    DeleteQuiz,

    // ── Reservations ─────────────────────────────────────────────────
    CancelReservation,
}

impl OperationKind {
    pub fn endpoint(self) -> Endpoint {
        Endpoint::post(match self {
            Self::AddTeacher => "teacher/add",
            Self::EditTeacher => "teacher/edit",
            Self::DeleteTeacher => "teacher/delete",
            Self::AddGroup => "group/add",
            Self::EditGroup => "group/edit",
            Self::DeleteGroup => "group/delete",
            Self::AssignTeacher => "group/assign-teacher",
            Self::UnassignTeacher => "group/unassign-teacher",
            Self::AddUnit => "unit/add",
            Self::EditUnit => "unit/edit",
            Self::DeleteUnit => "unit/delete",
            Self::AddVideo => "unit/video/add",
            Self::DeleteVideo => "unit/video/delete",
            Self::AddPdf => "unit/pdf/add",
            Self::DeletePdf => "unit/pdf/delete",
            Self::AddQuiz => "unit/quiz/add",
            Self::EditQuiz => "unit/quiz/edit",
            Self::DeleteQuiz => "unit/quiz/delete",
            Self::CancelReservation => "reservation/cancel",
        })
    }

    /// Body field the target id is sent under. `None` for creations that
    /// have no target.
    ///
    /// Content additions target the unit detail they are attached to.
    pub fn id_field(self) -> Option<&'static str> {
        match self {
            Self::AddTeacher | Self::AddGroup | Self::AddUnit => None,
            Self::EditTeacher | Self::DeleteTeacher => Some("teacher_id"),
            Self::EditGroup | Self::DeleteGroup | Self::AssignTeacher | Self::UnassignTeacher => {
                Some("group_id")
            }
            Self::EditUnit | Self::DeleteUnit => Some("unit_id"),
            Self::AddVideo | Self::AddPdf | Self::AddQuiz => Some("detail_id"),
            Self::DeleteVideo => Some("video_id"),
            Self::DeletePdf => Some("pdf_id"),
            Self::EditQuiz | Self::DeleteQuiz => Some("quiz_id"),
            Self::CancelReservation => Some("reservation_id"),
        }
    }

    /// Payload fields that must be present besides the target id.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            Self::AssignTeacher | Self::UnassignTeacher => &["teacher_id"],
            _ => &[],
        }
    }
}

/// One validated write, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRequest {
    pub operation: OperationKind,
    pub payload: Map<String, Value>,
    pub target_id: Option<String>,
}

impl MutationRequest {
    /// Validate `payload` for `operation`.
    ///
    /// The target is taken from `target_id`, else from the payload's id
    /// field, else from a bare `id` key (moved under the id field).
    /// Fails without touching the network when the payload is not an
    /// object or the target or a required field is missing.
    pub fn new(
        operation: OperationKind,
        payload: Value,
        target_id: Option<&str>,
    ) -> Result<Self, CoreError> {
        let Value::Object(mut payload) = payload else {
            return Err(CoreError::ValidationFailed {
                message: format!("{operation} payload must be a JSON object"),
            });
        };

        let target_id = match operation.id_field() {
            None => target_id.map(str::to_owned),
            Some(field) => {
                let resolved = target_id
                    .map(str::to_owned)
                    .or_else(|| payload.remove(field).and_then(id_string))
                    .or_else(|| payload.remove("id").and_then(id_string))
                    .filter(|id| !id.is_empty());
                match resolved {
                    Some(id) => Some(id),
                    None => {
                        return Err(CoreError::ValidationFailed {
                            message: format!("{operation} requires {field}"),
                        });
                    }
                }
            }
        };

        for field in operation.required_fields() {
            if payload.get(*field).is_none_or(Value::is_null) {
                return Err(CoreError::ValidationFailed {
                    message: format!("{operation} requires {field}"),
                });
            }
        }

        Ok(Self {
            operation,
            payload,
            target_id,
        })
    }

    /// Flat request body: the payload plus the target under its id field.
    pub fn body(&self) -> Value {
        let mut body = self.payload.clone();
        if let (Some(field), Some(id)) = (self.operation.id_field(), &self.target_id) {
            body.insert(field.to_owned(), Value::String(id.clone()));
        }
        Value::Object(body)
    }
}

/// Ids arrive as strings or numbers; both are sent as strings.
fn id_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;
    use serde_json::json;
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn names_are_camel_case() {
        assert_eq!(OperationKind::DeleteTeacher.to_string(), "deleteTeacher");
        assert_eq!(
            OperationKind::from_str("cancelReservation").unwrap(),
            OperationKind::CancelReservation
        );
    }

    #[test]
    fn every_operation_has_a_distinct_endpoint() {
        let mut paths: Vec<_> = OperationKind::iter().map(|op| op.endpoint().path).collect();
        let total = paths.len();
        paths.sort_unstable();
        paths.dedup();
        assert_eq!(paths.len(), total);
    }

    #[test]
    fn target_id_goes_under_id_field() {
        let req = MutationRequest::new(
            OperationKind::DeletePdf,
            json!({ "reason": "outdated" }),
            Some("31"),
        )
        .unwrap();
        assert_eq!(req.body(), json!({ "pdf_id": "31", "reason": "outdated" }));
    }

    #[test]
    fn target_can_come_from_payload() {
        let req = MutationRequest::new(OperationKind::DeleteTeacher, json!({ "id": "7" }), None)
            .unwrap();
        assert_eq!(req.target_id.as_deref(), Some("7"));
        assert_eq!(req.body(), json!({ "teacher_id": "7" }));

        let req =
            MutationRequest::new(OperationKind::EditQuiz, json!({ "quiz_id": 5, "title": "x" }), None)
                .unwrap();
        assert_eq!(req.body(), json!({ "quiz_id": "5", "title": "x" }));
    }

    #[test]
    fn missing_target_is_rejected() {
        let err = MutationRequest::new(OperationKind::DeleteUnit, json!({}), None).unwrap_err();
        assert!(matches!(err, CoreError::ValidationFailed { .. }));
        assert!(err.to_string().contains("unit_id"));
    }

    #[test]
    fn creations_need_no_target() {
        let req =
            MutationRequest::new(OperationKind::AddTeacher, json!({ "name": "Ada" }), None).unwrap();
        assert_eq!(req.body(), json!({ "name": "Ada" }));
    }

    #[test]
    fn assign_requires_teacher() {
        let err = MutationRequest::new(OperationKind::AssignTeacher, json!({}), Some("3"))
            .unwrap_err();
        assert!(err.to_string().contains("teacher_id"));

        let req = MutationRequest::new(
            OperationKind::AssignTeacher,
            json!({ "teacher_id": "8" }),
            Some("3"),
        )
        .unwrap();
        assert_eq!(req.body(), json!({ "group_id": "3", "teacher_id": "8" }));
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let err = MutationRequest::new(OperationKind::AddGroup, json!(["a"]), None).unwrap_err();
        assert!(matches!(err, CoreError::ValidationFailed { .. }));
    }
}
