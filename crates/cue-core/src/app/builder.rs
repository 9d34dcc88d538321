//! SkillBuilder - スキル（タスク一式）の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 開発体験の改善（明確なエラーメッセージ）
//!
//! # Fail-fast 設計
//! build() の時点で次をチェックし、不足があれば BuildError を返します。
//! - スキル定義が参照するターゲット探索ルールが全て登録されているか
//! - タスクが必要とする scratch pad の種類が全てプールに登録されているか

use std::sync::Arc;

use tracing::info;

use super::config::{SkillSpec, TaskSpec};
use crate::domain::ids::TaskId;
use crate::ports::{AssetResolver, BindingResolver, IdGenerator, SystemClock, UlidGenerator};
use crate::tasks::{FindTargetConfig, FindTargetTask, PlayAnimationTask, Targeting, TargetingSpec, TurnToTask};
use crate::typed::{RegistryError, RuleRegistry, ScratchPadPool, SkillBindings, Task};

type TaskFactory = Box<dyn FnOnce(TaskId) -> Box<dyn Task>>;

enum Entry {
    Spec(TaskSpec),
    Custom(TaskFactory),
}

/// SkillBuilder はスキルを構築
///
/// # 使用例
/// ```ignore
/// let skill = SkillBuilder::new("slash")
///     .task(TaskSpec::PlayAnimation(config))
///     .bind("play_rate", resolver)?
///     .build(&rules, &assets, &pool)?;
/// ```
pub struct SkillBuilder {
    name: String,
    ids: Box<dyn IdGenerator>,
    entries: Vec<Entry>,
    bindings: SkillBindings,
}

/// BuildError はスキル構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing scratch pad kinds: {0:?}. These pads are needed by tasks but not registered in the pool.")]
    MissingScratchPadKinds(Vec<String>),

    #[error("Unknown targeting rules: {0:?}. These rules are referenced but not registered.")]
    UnknownRules(Vec<String>),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl SkillBuilder {
    /// 新しい SkillBuilder を作成
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ids: Box::new(UlidGenerator::new(SystemClock)),
            entries: Vec::new(),
            bindings: SkillBindings::new(),
        }
    }

    /// スキル定義の全タスクを追加
    pub fn from_spec(spec: SkillSpec) -> Self {
        spec.tasks
            .into_iter()
            .fold(Self::new(spec.name), |builder, task| builder.task(task))
    }

    /// ID 生成器を差し替え（テストで決定的にしたいとき）
    pub fn with_id_generator(mut self, ids: Box<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn task(mut self, spec: TaskSpec) -> Self {
        self.entries.push(Entry::Spec(spec));
        self
    }

    /// Task types the skill description cannot express.
    pub fn custom_task<F>(mut self, factory: F) -> Self
    where
        F: FnOnce(TaskId) -> Box<dyn Task> + 'static,
    {
        self.entries.push(Entry::Custom(Box::new(factory)));
        self
    }

    /// Register a per-invocation override for a bindable parameter.
    ///
    /// 同じパラメータ名の二重登録はエラー。
    pub fn bind(
        mut self,
        parameter: impl Into<String>,
        resolver: Arc<dyn BindingResolver>,
    ) -> Result<Self, BuildError> {
        self.bindings.register(parameter, resolver)?;
        Ok(self)
    }

    /// SkillBuilder を構築して Skill を生成
    ///
    /// # 検証
    /// - 参照されたルール名が `rules` に全てあるか → `BuildError::UnknownRules`
    /// - 必要な pad の種類が `pool` に全てあるか → `BuildError::MissingScratchPadKinds`
    pub fn build(
        self,
        rules: &RuleRegistry,
        assets: &dyn AssetResolver,
        pool: &ScratchPadPool,
    ) -> Result<Skill, BuildError> {
        let mut unknown_rules: Vec<String> = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                Entry::Spec(TaskSpec::FindTarget(config)) => Some(config.targeting.rule_names()),
                _ => None,
            })
            .flatten()
            .filter(|name| rules.get(name).is_none())
            .map(str::to_string)
            .collect();
        if !unknown_rules.is_empty() {
            unknown_rules.sort();
            unknown_rules.dedup();
            return Err(BuildError::UnknownRules(unknown_rules));
        }

        let mut tasks: Vec<Box<dyn Task>> = Vec::with_capacity(self.entries.len());
        for entry in self.entries {
            let id = self.ids.generate_task_id();
            let task: Box<dyn Task> = match entry {
                Entry::Spec(TaskSpec::FindTarget(config)) => Box::new(find_target_task(id, config, rules)?),
                Entry::Spec(TaskSpec::TurnTo(config)) => Box::new(TurnToTask::new(id, config)),
                Entry::Spec(TaskSpec::PlayAnimation(config)) => Box::new(PlayAnimationTask::new(id, config)),
                Entry::Custom(factory) => factory(id),
            };
            tasks.push(task);
        }

        for task in &mut tasks {
            task.bind_dynamic(&self.bindings);
            task.resolve_assets(assets);
        }

        let mut missing_pads: Vec<String> = tasks
            .iter()
            .filter_map(|task| task.scratch_pad_kind())
            .filter(|kind| !pool.is_registered(kind))
            .map(str::to_string)
            .collect();
        if !missing_pads.is_empty() {
            missing_pads.sort();
            missing_pads.dedup();
            return Err(BuildError::MissingScratchPadKinds(missing_pads));
        }

        let skill = Skill {
            name: self.name,
            tasks: tasks.into_iter().map(Arc::from).collect(),
        };
        info!(skill = %skill.name, tasks = skill.tasks.len(), "skill built");
        Ok(skill)
    }
}

fn find_target_task(
    id: TaskId,
    config: FindTargetConfig,
    rules: &RuleRegistry,
) -> Result<FindTargetTask, BuildError> {
    let lookup = |name: &str| rules.get(name).ok_or_else(|| RegistryError::NotRegistered(name.to_string()));
    let targeting = match &config.targeting {
        TargetingSpec::Single { rule } => Targeting::Single(lookup(rule.as_str())?),
        TargetingSpec::Group { rules: names } => Targeting::Group(
            names
                .iter()
                .map(|name| lookup(name.as_str()))
                .collect::<Result<Vec<_>, _>>()?,
        ),
    };
    Ok(FindTargetTask::new(id, targeting)
        .with_timing(config.timing)
        .with_single_frame(config.single_frame))
}

/// Skill は構築済みのタスク一式
///
/// 全 invocation で共有される読み取り専用データです。
pub struct Skill {
    name: String,
    tasks: Vec<Arc<dyn Task>>,
}

impl Skill {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tasks(&self) -> &[Arc<dyn Task>] {
        &self.tasks
    }

    pub fn task(&self, id: TaskId) -> Option<&Arc<dyn Task>> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// One line per task, in authoring order.
    pub fn describe(&self) -> Vec<String> {
        self.tasks
            .iter()
            .map(|t| format!("[{:.2}..{:.2}] {}", t.start_time(), t.end_time(), t.describe()))
            .collect()
    }
}

impl std::fmt::Debug for Skill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Skill")
            .field("name", &self.name)
            .field("tasks", &self.describe())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asset::{AnimationAsset, AssetHandle, ClipAsset};
    use crate::domain::invocation::Invocation;
    use crate::domain::params::ParamValue;
    use crate::impls::{FixedTargets, InMemoryAssets};
    use crate::tasks::{PlayAnimationConfig, PlayAnimationScratchPad, TurnToConfig, TurnToScratchPad};
    use crate::typed::scratch::TypedScratchPad;
    use crate::typed::TaskTiming;

    fn pool() -> ScratchPadPool {
        let mut pool = ScratchPadPool::default();
        pool.register::<TurnToScratchPad>().unwrap();
        pool.register::<PlayAnimationScratchPad>().unwrap();
        pool
    }

    fn rules() -> RuleRegistry {
        let mut rules = RuleRegistry::new();
        rules.register("none", Arc::new(FixedTargets::new(vec![]))).unwrap();
        rules
    }

    fn assets() -> InMemoryAssets {
        InMemoryAssets::new().with(AnimationAsset::Clip(ClipAsset {
            handle: AssetHandle::new("Run"),
            length: 2.0,
        }))
    }

    fn find_target(spec: TargetingSpec) -> TaskSpec {
        TaskSpec::FindTarget(FindTargetConfig {
            timing: TaskTiming::default(),
            targeting: spec,
            single_frame: true,
        })
    }

    #[test]
    fn test_build_success() {
        let skill = SkillBuilder::new("slash")
            .task(find_target(TargetingSpec::Single { rule: "none".into() }))
            .task(TaskSpec::TurnTo(TurnToConfig::default()))
            .task(TaskSpec::PlayAnimation(PlayAnimationConfig::default().with_animation("Run")))
            .build(&rules(), &assets(), &pool())
            .unwrap();

        assert_eq!(skill.name(), "slash");
        assert_eq!(skill.len(), 3);
        let ids: Vec<TaskId> = skill.tasks().iter().map(|t| t.id()).collect();
        assert!(ids.iter().all(|id| skill.task(*id).is_some()));
        assert!(skill.describe()[2].contains("Play Animation: Run"));
    }

    #[test]
    fn test_build_unknown_rules() {
        let result = SkillBuilder::new("slash")
            .task(find_target(TargetingSpec::Group {
                rules: vec!["none".into(), "missing".into(), "missing".into()],
            }))
            .build(&rules(), &assets(), &pool());
        assert!(matches!(
            result,
            Err(BuildError::UnknownRules(missing)) if missing == vec!["missing".to_string()]
        ));
    }

    #[test]
    fn test_build_missing_scratch_pad_kinds() {
        let mut partial = ScratchPadPool::default();
        partial.register::<TurnToScratchPad>().unwrap();
        let result = SkillBuilder::new("slash")
            .task(TaskSpec::TurnTo(TurnToConfig::default()))
            .task(TaskSpec::PlayAnimation(PlayAnimationConfig::default()))
            .build(&rules(), &assets(), &partial);
        assert!(matches!(
            result,
            Err(BuildError::MissingScratchPadKinds(missing)) if missing == vec![PlayAnimationScratchPad::KIND.to_string()]
        ));
    }

    #[test]
    fn test_duplicate_binding_is_rejected() {
        let resolver: Arc<dyn BindingResolver> =
            Arc::new(|_: &str, _: &Invocation| -> Option<ParamValue> { None });
        let result = SkillBuilder::new("slash")
            .bind("play_rate", resolver.clone())
            .and_then(|b| b.bind("play_rate", resolver));
        assert!(matches!(
            result,
            Err(BuildError::Registry(RegistryError::AlreadyRegistered(p))) if p == "play_rate"
        ));
    }

    #[test]
    fn test_bindings_reach_tasks() {
        let resolver: Arc<dyn BindingResolver> =
            Arc::new(|_: &str, _: &Invocation| -> Option<ParamValue> { None });
        let skill = SkillBuilder::new("dyn")
            .task(TaskSpec::PlayAnimation(PlayAnimationConfig::default()))
            .bind("animation", resolver)
            .unwrap()
            .build(&rules(), &assets(), &pool())
            .unwrap();
        assert_eq!(skill.tasks()[0].describe(), "Play Animation: Dynamic");
    }

    #[test]
    fn test_custom_task_gets_an_id() {
        let skill = SkillBuilder::new("custom")
            .custom_task(|id| Box::new(TurnToTask::new(id, TurnToConfig::default())))
            .build(&rules(), &assets(), &pool())
            .unwrap();
        assert_eq!(skill.tasks()[0].kind(), TurnToTask::KIND);
    }

    #[test]
    fn test_from_spec() {
        let spec = SkillSpec::from_json(
            r#"{ "name": "from_json", "tasks": [ { "type": "turn_to" } ] }"#,
        )
        .unwrap();
        let skill = SkillBuilder::from_spec(spec)
            .build(&rules(), &assets(), &pool())
            .unwrap();
        assert_eq!(skill.name(), "from_json");
        assert_eq!(skill.len(), 1);
    }
}
