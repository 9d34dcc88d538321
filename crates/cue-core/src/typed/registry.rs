//! Registries populated once at startup.
//!
//! - `RuleRegistry`: 名前 → TargetingRule（スキル定義から名前で参照する）
//!
//! 二重登録はエラー。実行中は読むだけなのでロック不要です。

use std::collections::HashMap;
use std::sync::Arc;

use crate::ports::TargetingRule;

/// RegistryError は登録系の操作エラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("'{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("'{0}' is not registered")]
    NotRegistered(String),
}

/// Named targeting rules a skill description can refer to.
#[derive(Default)]
pub struct RuleRegistry {
    rules: HashMap<String, Arc<dyn TargetingRule>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        rule: Arc<dyn TargetingRule>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.rules.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }
        self.rules.insert(name, rule);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn TargetingRule>> {
        self.rules.get(name).cloned()
    }

    pub fn registered_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.rules.keys().cloned().collect();
        names.sort();
        names
    }
}
