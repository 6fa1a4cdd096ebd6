use serde::Serialize;
use std::collections::BTreeMap;

/// Counts over the stored role table. Subjects on the default role are not
/// stored and therefore not counted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionStats {
    pub total: usize,
    pub by_role: BTreeMap<String, usize>,
}
