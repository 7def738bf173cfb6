// ── Readable resources ──
//
// Catalogue of everything the dashboard can read from the admin API,
// with the endpoint each kind maps to and how its cache key is built.

use classdesk_api::{ApiClient, Method};
use serde_json::{Map, Value};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::cache::CacheKey;
use crate::error::CoreError;

/// HTTP method and path (relative to the API root) for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub method: Method,
    pub path: &'static str,
}

impl Endpoint {
    pub(crate) fn get(path: &'static str) -> Self {
        Self {
            method: Method::GET,
            path,
        }
    }

    pub(crate) fn post(path: &'static str) -> Self {
        Self {
            method: Method::POST,
            path,
        }
    }
}

/// A readable resource. The camelCase name is the first part of its
/// cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum ResourceKind {
    Teachers,
    Teacher,
    Groups,
    Group,
    GroupTeachers,
    Units,
    Unit,
    UnitVideos,
    UnitPdfs,
    UnitQuizzes,
    Reservations,
}

impl ResourceKind {
    /// Request field carrying the parameter this kind is keyed by, or
    /// `None` for unparameterised lists.
    pub fn param(self) -> Option<&'static str> {
        match self {
            Self::Teachers | Self::Groups | Self::Units | Self::Reservations => None,
            Self::Teacher => Some("teacher_id"),
            Self::Group | Self::GroupTeachers => Some("group_id"),
            Self::Unit => Some("unit_id"),
            Self::UnitVideos | Self::UnitPdfs | Self::UnitQuizzes => Some("detail_id"),
        }
    }

    pub fn endpoint(self) -> Endpoint {
        match self {
            Self::Teachers => Endpoint::get("teacher/list-select"),
            Self::Groups => Endpoint::get("group/list-select"),
            Self::Units => Endpoint::get("unit/list-select"),
            Self::Reservations => Endpoint::get("reservation/list-select"),
            Self::Teacher => Endpoint::post("teacher/detail"),
            Self::Group => Endpoint::post("group/detail"),
            Self::GroupTeachers => Endpoint::post("group/teachers"),
            Self::Unit => Endpoint::post("unit/detail"),
            Self::UnitVideos => Endpoint::post("unit/video/list"),
            Self::UnitPdfs => Endpoint::post("unit/pdf/list"),
            Self::UnitQuizzes => Endpoint::post("unit/quiz/list"),
        }
    }

    /// Prefix covering every key of this kind.
    pub fn prefix(self) -> CacheKey {
        CacheKey::new(<&'static str>::from(self))
    }
}

/// A kind plus the parameter it is read with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceQuery {
    pub kind: ResourceKind,
    pub param: Option<String>,
}

impl ResourceQuery {
    pub fn new(kind: ResourceKind) -> Self {
        Self { kind, param: None }
    }

    pub fn with_param(kind: ResourceKind, param: impl Into<String>) -> Self {
        Self {
            kind,
            param: Some(param.into()),
        }
    }

    /// `[kind]` or `[kind, param]`.
    pub fn key(&self) -> CacheKey {
        let key = self.kind.prefix();
        match &self.param {
            Some(param) => key.with(param.as_str()),
            None => key,
        }
    }

    /// A parameterised kind without a (non-empty) parameter must not be
    /// fetched.
    pub fn is_ready(&self) -> bool {
        self.kind.param().is_none() || self.param.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Request body for POST endpoints.
    pub fn body(&self) -> Value {
        let mut body = Map::new();
        if let (Some(field), Some(param)) = (self.kind.param(), &self.param) {
            body.insert(field.to_owned(), Value::String(param.clone()));
        }
        Value::Object(body)
    }

    /// Issue the read. Callers normally go through the cache instead.
    pub async fn fetch(&self, client: &ApiClient) -> Result<Value, CoreError> {
        if !self.is_ready() {
            return Err(CoreError::ValidationFailed {
                message: format!(
                    "{} requires {}",
                    self.kind,
                    self.kind.param().unwrap_or("a parameter")
                ),
            });
        }
        let endpoint = self.kind.endpoint();
        let body = (endpoint.method == Method::POST).then(|| self.body());
        let value = client
            .request(
                endpoint.method,
                endpoint.path,
                body.as_ref(),
                classdesk_api::RequestOptions::AUTHENTICATED,
            )
            .await?;
        Ok(value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use serde_json::json;
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn kinds_round_trip_camel_case_names() {
        assert_eq!(ResourceKind::UnitVideos.to_string(), "unitVideos");
        assert_eq!(
            ResourceKind::from_str("groupTeachers").unwrap(),
            ResourceKind::GroupTeachers
        );
        assert!(ResourceKind::from_str("nope").is_err());
    }

    #[test]
    fn list_kinds_are_gets_and_detail_kinds_posts() {
        for kind in ResourceKind::iter() {
            let endpoint = kind.endpoint();
            let expected = if kind.param().is_some() {
                Method::POST
            } else {
                Method::GET
            };
            assert_eq!(endpoint.method, expected, "{kind}");
        }
    }

    #[test]
    fn key_includes_param() {
        let query = ResourceQuery::with_param(ResourceKind::UnitVideos, "12");
        assert_eq!(query.key(), CacheKey::new("unitVideos").with("12"));
        assert!(query.key().starts_with(&ResourceKind::UnitVideos.prefix()));
        assert_eq!(
            ResourceQuery::new(ResourceKind::Teachers).key(),
            CacheKey::new("teachers")
        );
    }

    #[test]
    fn missing_param_is_not_ready() {
        assert!(ResourceQuery::new(ResourceKind::Teachers).is_ready());
        assert!(!ResourceQuery::new(ResourceKind::Unit).is_ready());
        assert!(!ResourceQuery::with_param(ResourceKind::Unit, "").is_ready());
        assert!(ResourceQuery::with_param(ResourceKind::Unit, "4").is_ready());
    }

    #[test]
    fn body_uses_kind_field() {
        let query = ResourceQuery::with_param(ResourceKind::UnitPdfs, "9");
        assert_eq!(query.body(), json!({ "detail_id": "9" }));
        assert_eq!(ResourceQuery::new(ResourceKind::Groups).body(), json!({}));
    }
}
