use serde::Deserialize;

/// A Bitbucket project as returned by the listing API. Immutable once
/// fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Project {
    pub key: String,
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default, rename = "type")]
    pub kind: String,
}
