use serde::{Deserialize, Serialize};

use crate::target::metadata::{AssemblyKind, TargetFramework};

/// Everything needed to create an [`super::assembly::AssemblyContext`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyOptions {
    pub name: String,
    pub kind: AssemblyKind,
    pub target_framework: Option<TargetFramework>,
    /// Names of libraries the artifact imports
    #[serde(default)]
    pub references: Vec<String>,
    pub namespace: Option<String>,
    /// Name of the sealed abstract type holding globals and functions.
    /// When absent everything is placed on the module type.
    pub global_type_name: Option<String>,
}

impl AssemblyOptions {
    pub fn new(name: &str, kind: AssemblyKind) -> Self {
        AssemblyOptions {
            name: String::from(name),
            kind,
            target_framework: None,
            references: vec![],
            namespace: None,
            global_type_name: None,
        }
    }
}
