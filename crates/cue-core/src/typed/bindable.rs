//! Bindable parameters - 静的な値 + 任意の動的リゾルバ
//!
//! # 使い方
//! - スキル構築時に `bind` で名前付きリゾルバを結びつける（一度だけ）
//! - 実行時は毎回 `get(invocation)` で読む
//!
//! 読み出しは失敗しません。リゾルバが未登録・`None` を返した・型が
//! 合わない場合は静的な値を返します。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::registry::RegistryError;
use crate::domain::asset::AssetHandle;
use crate::domain::invocation::Invocation;
use crate::domain::params::{BlendTimes, ParamValue};
use crate::ports::BindingResolver;

/// Conversion from a resolver's output to a parameter type.
pub trait BindableValue: Clone + Send + Sync + 'static {
    fn from_param(value: &ParamValue) -> Option<Self>;
}

impl BindableValue for f32 {
    fn from_param(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f32),
            _ => None,
        }
    }
}

impl BindableValue for i32 {
    fn from_param(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl BindableValue for bool {
    fn from_param(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl BindableValue for String {
    fn from_param(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Name(Some(v)) => Some(v.clone()),
            _ => None,
        }
    }
}

/// Optional names: `Name(None)` clears the static value.
impl BindableValue for Option<String> {
    fn from_param(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Name(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl BindableValue for BlendTimes {
    fn from_param(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Blend(v) => Some(*v),
            _ => None,
        }
    }
}

impl BindableValue for Option<AssetHandle> {
    fn from_param(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Asset(v) => Some(Some(v.clone())),
            _ => None,
        }
    }
}

#[derive(Clone)]
struct Binding {
    parameter: String,
    resolver: Arc<dyn BindingResolver>,
}

/// A task parameter that may be overridden per invocation.
///
/// Serializes as the bare static value.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bindable<T> {
    value: T,
    #[serde(skip)]
    binding: Option<Binding>,
}

impl<T: BindableValue> Bindable<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            binding: None,
        }
    }

    /// The authored value, ignoring any binding.
    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    pub fn bound_parameter(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.parameter.as_str())
    }

    /// Attach the resolver registered under `parameter`, if any.
    pub fn bind(&mut self, parameter: &str, bindings: &SkillBindings) -> bool {
        match bindings.get(parameter) {
            Some(resolver) => {
                self.binding = Some(Binding {
                    parameter: parameter.to_string(),
                    resolver,
                });
                true
            }
            None => false,
        }
    }

    /// Current value for `invocation`.
    pub fn get(&self, invocation: &Invocation) -> T {
        let Some(binding) = &self.binding else {
            return self.value.clone();
        };
        let Some(resolved) = binding.resolver.resolve(&binding.parameter, invocation) else {
            return self.value.clone();
        };
        match T::from_param(&resolved) {
            Some(v) => v,
            None => {
                warn!(
                    parameter = %binding.parameter,
                    invocation = %invocation.id(),
                    ?resolved,
                    "binding produced a value of the wrong type; using the static value"
                );
                self.value.clone()
            }
        }
    }
}

impl<T: BindableValue> From<T> for Bindable<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: BindableValue + Default> Default for Bindable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Bindable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.binding {
            Some(b) => write!(f, "{:?} (bound to '{}')", self.value, b.parameter),
            None => write!(f, "{:?}", self.value),
        }
    }
}

/// Resolvers registered against one skill, keyed by parameter name.
#[derive(Default, Clone)]
pub struct SkillBindings {
    resolvers: HashMap<String, Arc<dyn BindingResolver>>,
}

impl SkillBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        parameter: impl Into<String>,
        resolver: Arc<dyn BindingResolver>,
    ) -> Result<(), RegistryError> {
        let parameter = parameter.into();
        if self.resolvers.contains_key(&parameter) {
            return Err(RegistryError::AlreadyRegistered(parameter));
        }
        self.resolvers.insert(parameter, resolver);
        Ok(())
    }

    pub fn get(&self, parameter: &str) -> Option<Arc<dyn BindingResolver>> {
        self.resolvers.get(parameter).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::InvocationId;

    fn invocation() -> Invocation {
        Invocation::new(InvocationId::from_u128(1), "skill")
    }

    #[test]
    fn unbound_returns_static_value() {
        let rate = Bindable::new(1.5_f32);
        assert_eq!(rate.get(&invocation()), 1.5);
        assert!(!rate.is_bound());
    }

    #[test]
    fn bound_value_overrides_static() {
        let mut bindings = SkillBindings::new();
        bindings
            .register(
                "Play Rate",
                Arc::new(|_: &str, _: &Invocation| Some(ParamValue::Float(2.0))),
            )
            .unwrap();

        let mut rate = Bindable::new(1.0_f32);
        assert!(rate.bind("Play Rate", &bindings));
        assert_eq!(rate.get(&invocation()), 2.0);
        assert_eq!(rate.bound_parameter(), Some("Play Rate"));
    }

    #[test]
    fn resolver_returning_none_falls_back() {
        let mut bindings = SkillBindings::new();
        bindings
            .register("Loops", Arc::new(|_: &str, _: &Invocation| -> Option<ParamValue> { None }))
            .unwrap();

        let mut loops = Bindable::new(3_i32);
        loops.bind("Loops", &bindings);
        assert_eq!(loops.get(&invocation()), 3);
    }

    #[test]
    fn wrong_type_falls_back() {
        let mut bindings = SkillBindings::new();
        bindings
            .register(
                "Slot Name",
                Arc::new(|_: &str, _: &Invocation| Some(ParamValue::Bool(true))),
            )
            .unwrap();

        let mut slot = Bindable::new("DefaultSlot".to_string());
        slot.bind("Slot Name", &bindings);
        assert_eq!(slot.get(&invocation()), "DefaultSlot");
    }

    #[test]
    fn resolver_sees_the_invocation() {
        let mut bindings = SkillBindings::new();
        bindings
            .register(
                "Time To Start At",
                Arc::new(|_: &str, inv: &Invocation| Some(ParamValue::Float(inv.current_time()))),
            )
            .unwrap();

        let mut start_at = Bindable::new(0.0_f32);
        start_at.bind("Time To Start At", &bindings);

        let mut inv = invocation();
        inv.advance(0.75);
        assert_eq!(start_at.get(&inv), 0.75);
    }

    #[test]
    fn serializes_as_bare_value() {
        let section: Bindable<Option<String>> = serde_json::from_str(r#""Recover""#).unwrap();
        assert_eq!(section.value().as_deref(), Some("Recover"));
        assert_eq!(serde_json::to_string(&section).unwrap(), r#""Recover""#);
    }
}
