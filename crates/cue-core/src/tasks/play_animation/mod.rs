//! PlayAnimationTask - アニメーション再生の状態機械
//!
//! # モード（`AnimationMode`）
//! - **SingleNode**: グラフを迂回して直接再生
//! - **AbilityAnimationNode**: グラフ内の専用ノードで再生（plain clip のみ）
//! - **DynamicMontage**: composite を再生、または clip を slot 上の一時 composite として再生
//!
//! プレビュー（`!invocation.is_live()`）では後者 2 つは直接再生に縮退します。
//!
//! # 後片付け
//! `on_end` は start 1 回につき 1 回だけ呼ばれる唯一の片付けポイントです。
//! - コンポーネントごとの停止処理は重複なく 1 回
//! - off-screen tick 設定の復元は停止処理の有無にかかわらず必ず実行
//! - 途中で消えたコンポーネントは黙ってスキップ

mod config;
mod scratch;

pub use self::config::{AnimationMode, PlayAnimationConfig};
pub use self::scratch::{PlayAnimationScratchPad, PlayedComponent};

use tracing::{debug, warn};

use crate::domain::asset::{AnimationAsset, AssetHandle, SharedAsset};
use crate::domain::errors::TaskError;
use crate::domain::ids::{ComponentId, EntityId, TaskId};
use crate::domain::invocation::Invocation;
use crate::domain::outcome::TaskResult;
use crate::domain::params::PlaybackMode;
use crate::domain::realm::TaskRealm;
use crate::ports::{AssetResolver, CompositePlay, PlaybackComponent, SlotPlay, World};
use crate::typed::{
    RegistryError, ScratchPad, ScratchPadPool, SkillBindings, Task, TaskContext, TaskTiming,
    TypedScratchPad,
};

/// Loop count used when looping is requested with a count of one or less.
///
/// A synthesized composite ignores a plain "loop" flag, so looping is
/// expressed as a practically endless count. Nothing but this task's
/// `on_end` stops it: a scheduler that skips `on_end` leaves it looping.
pub const UNBOUNDED_LOOPS: i32 = i32::MAX;

/// Reason passed to `PlaybackComponent::request_tick`.
pub const VISIBILITY_TICK_REASON: &str = "play_animation.visibility_override";

/// Loop count actually handed to the slot player.
pub fn effective_loop_count(looping: bool, configured: i32) -> i32 {
    if looping && configured <= 1 {
        UNBOUNDED_LOOPS
    } else {
        configured
    }
}

#[derive(Debug)]
pub struct PlayAnimationTask {
    id: TaskId,
    config: PlayAnimationConfig,

    /// The statically configured asset, resolved when the skill is built.
    preloaded: Option<SharedAsset>,
}

impl PlayAnimationTask {
    pub const KIND: &'static str = "play_animation";

    pub fn new(id: TaskId, config: PlayAnimationConfig) -> Self {
        Self {
            id,
            config,
            preloaded: None,
        }
    }

    pub fn config(&self) -> &PlayAnimationConfig {
        &self.config
    }

    pub fn preloaded_asset(&self) -> Option<&AnimationAsset> {
        self.preloaded.as_deref()
    }

    /// Whether `result` calls for stopping playback.
    pub fn should_stop(&self, result: TaskResult) -> bool {
        if !self.config.stop_on_interrupt {
            return false;
        }
        let by_result = match result {
            TaskResult::Interrupted | TaskResult::StopAcross => true,
            TaskResult::BranchSegment => self.config.stop_on_branch,
            TaskResult::Successful => false,
        };
        by_result || (self.config.manual_length && self.config.manual_length_is_interrupt)
    }

    fn asset_for(&self, invocation: &Invocation, assets: &dyn AssetResolver) -> Result<SharedAsset, TaskError> {
        let handle = self.config.animation.get(invocation).ok_or(TaskError::NoAsset)?;
        if let Some(preloaded) = &self.preloaded
            && preloaded.handle() == &handle
        {
            return Ok(preloaded.clone());
        }
        assets
            .resolve(&handle)
            .ok_or(TaskError::UnresolvedAsset(handle))
    }

    fn effective_rate(&self, invocation: &Invocation, ability_rate: f32) -> f32 {
        let base = self.config.play_rate.get(invocation);
        if self.config.scale_with_ability_rate {
            base * ability_rate
        } else {
            base
        }
    }

    /// Components to play on: the world's preferred one, else all of them.
    fn components_for(&self, world: &dyn World, entity: EntityId) -> Vec<ComponentId> {
        match world.preferred_playback_component(entity, self.config.event_name.as_deref()) {
            Some(c) => vec![c],
            None => world.playback_components(entity),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn play_on(
        &self,
        world: &mut dyn World,
        invocation: &Invocation,
        asset: &AnimationAsset,
        entity: EntityId,
        component: ComponentId,
        rate: f32,
        pad: &mut PlayAnimationScratchPad,
    ) -> Result<(), TaskError> {
        let playback = world
            .playback(component)
            .ok_or(TaskError::StaleComponent(component))?;
        let mut node = None;
        let mut direct = false;

        match self.config.mode {
            AnimationMode::SingleNode => {
                if playback.mode() == PlaybackMode::GraphDriven {
                    pad.remember_for_cleanup(component);
                }
                match asset {
                    AnimationAsset::Composite(composite) => {
                        debug!(task = %self.id, entity = %entity, asset = %composite.handle, section = ?pad.section, "single node composite");
                        let request = CompositePlay {
                            rate,
                            start_at: self.config.start_at.get(invocation),
                            stop_others: self.config.stop_all_composites.get(invocation),
                        };
                        playback.play_composite(composite, &request);
                        pad.current_composite = Some(composite.handle.clone());

                        if let Some(section) = &pad.section {
                            if composite.is_valid_section_name(section) {
                                playback.jump_to_section(section);
                            } else {
                                let e = TaskError::InvalidSectionName {
                                    asset: composite.handle.clone(),
                                    section: section.clone(),
                                };
                                warn!(task = %self.id, entity = %entity, "{e}");
                            }
                        }
                    }
                    AnimationAsset::Clip(_) => {
                        debug!(task = %self.id, entity = %entity, asset = %asset.handle(), "single node clip");
                        if playback.has_direct_player() {
                            playback.retarget_direct(asset, self.config.looping, rate);
                        } else {
                            Self::start_direct(playback, asset, self.config.looping, rate);
                        }
                        direct = true;
                    }
                }
            }
            AnimationMode::AbilityAnimationNode => {
                Self::ensure_graph_driven(playback);
                if invocation.is_live() {
                    let clip = asset.as_clip().ok_or_else(|| TaskError::UnsupportedModeForAssetType {
                        mode: AnimationMode::AbilityAnimationNode.as_str(),
                        asset: asset.handle().clone(),
                    })?;
                    let state_machine = self.config.state_machine_name.get(invocation);
                    let state = self.config.ability_state_name.get(invocation);
                    let found = playback
                        .find_ability_node(&state_machine, &state)
                        .ok_or(TaskError::NodeNotFound { state_machine, state })?;

                    debug!(task = %self.id, entity = %entity, asset = %clip.handle, "ability node clip");
                    playback.node_play(found, clip, rate, self.config.blend_in, self.config.blend_out);
                    node = Some(found);
                } else {
                    Self::start_direct(playback, asset, self.config.looping, rate);
                    direct = true;
                }
            }
            AnimationMode::DynamicMontage => {
                Self::ensure_graph_driven(playback);
                let start_at = self.config.start_at.get(invocation);
                let stop_others = self.config.stop_all_composites.get(invocation);
                match asset {
                    AnimationAsset::Composite(composite) => {
                        debug!(task = %self.id, entity = %entity, asset = %composite.handle, "dynamic montage composite");
                        let request = CompositePlay {
                            rate,
                            start_at,
                            stop_others,
                        };
                        playback.play_composite(composite, &request);
                        pad.current_composite = Some(composite.handle.clone());
                    }
                    AnimationAsset::Clip(clip) if invocation.is_live() => {
                        let request = SlotPlay {
                            slot: self.config.slot_name.get(invocation),
                            blend: self.config.play_blend.get(invocation),
                            rate,
                            loop_count: effective_loop_count(
                                self.config.looping,
                                self.config.number_of_loops.get(invocation),
                            ),
                            blend_out_trigger: self.config.blend_out_trigger_time.get(invocation),
                            start_at,
                            stop_others,
                        };
                        debug!(task = %self.id, entity = %entity, asset = %clip.handle, slot = %request.slot, loops = request.loop_count, "dynamic montage slot");
                        pad.current_composite = playback.play_clip_as_composite(clip, &request);
                    }
                    AnimationAsset::Clip(_) => {
                        Self::start_direct(playback, asset, self.config.looping, rate);
                        direct = true;
                    }
                }
            }
        }

        if self.config.stop_on_interrupt {
            pad.remember_for_cleanup(component);
        }
        pad.played.push(PlayedComponent {
            entity,
            component,
            node,
            direct,
        });

        if let Some(node) = node
            && world.bind_ability_node(entity, component, node)
            && !pad.ability_bindings.contains(&(entity, component, node))
        {
            pad.ability_bindings.push((entity, component, node));
        }
        Ok(())
    }

    fn ensure_graph_driven(playback: &mut dyn PlaybackComponent) {
        if playback.mode() != PlaybackMode::GraphDriven {
            playback.set_mode(PlaybackMode::GraphDriven);
        }
    }

    fn start_direct(playback: &mut dyn PlaybackComponent, asset: &AnimationAsset, looping: bool, rate: f32) {
        playback.set_mode(PlaybackMode::Direct);
        playback.play_direct(asset, looping, rate);
    }

    fn override_visibility(
        &self,
        world: &mut dyn World,
        invocation: &Invocation,
        component: ComponentId,
        pad: &mut PlayAnimationScratchPad,
    ) {
        if pad.has_cached_visibility(component) {
            return;
        }
        let Some(playback) = world.playback(component) else {
            return;
        };
        pad.cached_visibility.push((component, playback.visibility_tick()));
        playback.set_visibility_tick(self.config.visibility_tick);
        if invocation.realm().is_dedicated_server() {
            playback.request_tick(VISIBILITY_TICK_REASON, true);
        }
    }

    /// Per-mode stop for one component.
    fn stop_component(&self, playback: &mut dyn PlaybackComponent, invocation: &Invocation, played: Option<&PlayedComponent>) {
        if played.is_some_and(|p| p.direct) && self.config.mode != AnimationMode::SingleNode {
            playback.set_mode(PlaybackMode::GraphDriven);
            playback.stop_direct();
            return;
        }
        match self.config.mode {
            AnimationMode::AbilityAnimationNode => {
                let node = played.and_then(|p| p.node).or_else(|| {
                    playback.find_ability_node(
                        &self.config.state_machine_name.get(invocation),
                        &self.config.ability_state_name.get(invocation),
                    )
                });
                if let Some(node) = node {
                    playback.node_abort(node, self.config.clear_queued_on_interrupt);
                }
            }
            AnimationMode::DynamicMontage => match self.config.on_end_section.get(invocation) {
                Some(section) => {
                    playback.jump_to_section(&section);
                }
                None => playback.blend_out_composite(self.config.play_blend.get(invocation).blend_out),
            },
            AnimationMode::SingleNode => {
                playback.set_mode(PlaybackMode::GraphDriven);
                if playback.has_direct_player() {
                    playback.stop_direct();
                }
            }
        }
    }

    fn seek_composite(
        playback: &mut dyn PlaybackComponent,
        pad: &PlayAnimationScratchPad,
        elapsed: f32,
    ) {
        let Some(handle) = &pad.current_composite else {
            return;
        };
        if playback.active_composite().as_ref() != Some(handle) {
            return;
        }
        let section_start = pad.section.as_deref().and_then(|name| {
            let composite = pad.asset.as_deref()?.as_composite()?;
            let index = composite.section_index(name)?;
            composite.section(index).map(|s| (name, s.start_time))
        });
        match section_start {
            Some((name, start)) => {
                if playback.jump_to_section(name) {
                    playback.set_composite_position(handle, start + elapsed);
                }
            }
            None => playback.set_composite_position(handle, elapsed),
        }
    }

    fn retarget_composite_rate(playback: &mut dyn PlaybackComponent, pad: &PlayAnimationScratchPad, rate: f32) {
        if let Some(handle) = &pad.current_composite
            && playback.active_composite().as_ref() == Some(handle)
        {
            playback.set_composite_play_rate(handle, rate);
        }
    }
}

impl Task for PlayAnimationTask {
    fn id(&self) -> TaskId {
        self.id
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn timing(&self) -> TaskTiming {
        self.config.timing
    }

    /// Duration follows the asset unless a manual length is configured.
    /// Uses the authored play rate, not a bound one.
    fn end_time(&self) -> f32 {
        let configured = self.config.timing.end_time;
        if self.config.manual_length {
            return configured;
        }
        let start = self.config.timing.start_time;
        let rate = *self.config.play_rate.value();
        let scale = if rate.abs() > f32::EPSILON { 1.0 / rate } else { 1.0 };

        let computed = match self.preloaded.as_deref() {
            Some(AnimationAsset::Composite(composite)) => {
                let section_length = self
                    .config
                    .section
                    .value()
                    .as_deref()
                    .and_then(|name| composite.section_index(name))
                    .and_then(|index| composite.section_length(index));
                start + section_length.unwrap_or_else(|| composite.play_length()) * scale
            }
            Some(AnimationAsset::Clip(clip)) => start + clip.length * scale,
            None => start + 1.0,
        };

        if self.config.looping {
            configured.max(computed)
        } else {
            computed
        }
    }

    fn is_done(&self, invocation: &Invocation) -> bool {
        invocation.current_time() * *self.config.play_rate.value() > self.end_time()
    }

    fn realm(&self) -> TaskRealm {
        if self.config.play_on_server {
            TaskRealm::ClientAndServer
        } else {
            TaskRealm::ClientOnly
        }
    }

    fn scratch_pad_kind(&self) -> Option<&'static str> {
        Some(PlayAnimationScratchPad::KIND)
    }

    fn create_scratch_pad(
        &self,
        pool: &ScratchPadPool,
    ) -> Result<Option<Box<dyn ScratchPad>>, RegistryError> {
        pool.acquire::<PlayAnimationScratchPad>().map(Some)
    }

    fn on_start(&self, ctx: &mut TaskContext<'_>) {
        let Some(pad) = ctx
            .pad
            .as_deref_mut()
            .and_then(|p| p.downcast_mut::<PlayAnimationScratchPad>())
        else {
            return;
        };
        pad.reset();

        let asset = match self.asset_for(ctx.invocation, ctx.assets) {
            Ok(asset) => asset,
            Err(e) => {
                warn!(task = %self.id, invocation = %ctx.invocation.id(), skill = ctx.invocation.skill_name(), "{e}");
                return;
            }
        };
        pad.asset = Some(asset.clone());
        pad.section = self.config.section.get(ctx.invocation);

        let rate = self.effective_rate(ctx.invocation, ctx.invocation.play_rate());
        let invocation: &Invocation = ctx.invocation;

        for entity in invocation.resolve_targets(&self.config.targets, &*ctx.world) {
            let components = self.components_for(&*ctx.world, entity);
            for &component in &components {
                if let Err(e) = self.play_on(ctx.world, invocation, &asset, entity, component, rate, pad) {
                    if !e.is_silent() {
                        warn!(task = %self.id, entity = %entity, component = %component, "{e}");
                    }
                }
            }
            if self.config.override_visibility_tick {
                for &component in &components {
                    self.override_visibility(ctx.world, invocation, component, pad);
                }
            }
        }
    }

    fn on_end(&self, ctx: &mut TaskContext<'_>, result: TaskResult) {
        let Some(pad) = ctx
            .pad
            .as_deref_mut()
            .and_then(|p| p.downcast_mut::<PlayAnimationScratchPad>())
        else {
            return;
        };
        let stop = self.should_stop(result);
        debug!(task = %self.id, ?result, stop, components = pad.cleanup.len(), "play animation end");

        for &component in &pad.cleanup {
            let Some(playback) = ctx.world.playback(component) else {
                continue;
            };
            if self.config.reset_state_on_end {
                playback.set_mode(PlaybackMode::GraphDriven);
            }
            if stop {
                self.stop_component(playback, ctx.invocation, pad.played(component));
            }
        }

        for &(entity, component, node) in &pad.ability_bindings {
            if ctx.world.is_alive(entity) {
                ctx.world.unbind_ability_node(entity, component, node);
            }
        }

        let dedicated = ctx.invocation.realm().is_dedicated_server();
        for (component, previous) in &pad.cached_visibility {
            if let Some(playback) = ctx.world.playback(*component) {
                playback.set_visibility_tick(*previous);
                if dedicated {
                    playback.request_tick(VISIBILITY_TICK_REASON, false);
                }
            }
        }

        pad.reset();
    }

    fn on_play_rate_changed(&self, ctx: &mut TaskContext<'_>, new_rate: f32) {
        if !self.config.scale_with_ability_rate {
            return;
        }
        let Some(pad) = ctx
            .pad
            .as_deref_mut()
            .and_then(|p| p.downcast_mut::<PlayAnimationScratchPad>())
        else {
            return;
        };
        let rate = self.effective_rate(ctx.invocation, new_rate);

        for played in &pad.played {
            let Some(playback) = ctx.world.playback(played.component) else {
                continue;
            };
            if played.direct {
                playback.set_direct_play_rate(rate);
                continue;
            }
            match self.config.mode {
                AnimationMode::SingleNode => Self::retarget_composite_rate(playback, pad, rate),
                AnimationMode::AbilityAnimationNode => {
                    if let Some(node) = played.node {
                        playback.node_set_play_rate(node, rate);
                    }
                }
                AnimationMode::DynamicMontage => Self::retarget_composite_rate(playback, pad, rate),
            }
        }
    }

    fn on_time_set(&self, ctx: &mut TaskContext<'_>) {
        let Some(pad) = ctx
            .pad
            .as_deref_mut()
            .and_then(|p| p.downcast_mut::<PlayAnimationScratchPad>())
        else {
            return;
        };
        let started = ctx
            .invocation
            .task_start_time(self.id)
            .unwrap_or_else(|| self.start_time());
        let elapsed = ctx.invocation.current_time() - started;

        for played in &pad.played {
            let Some(playback) = ctx.world.playback(played.component) else {
                continue;
            };
            if played.direct {
                playback.set_direct_position(elapsed);
                continue;
            }
            match self.config.mode {
                AnimationMode::SingleNode => Self::seek_composite(playback, pad, elapsed),
                AnimationMode::AbilityAnimationNode => {
                    if let Some(node) = played.node {
                        playback.node_set_time(node, elapsed);
                    }
                }
                AnimationMode::DynamicMontage => Self::seek_composite(playback, pad, elapsed),
            }
        }
    }

    fn bind_dynamic(&mut self, bindings: &SkillBindings) {
        let c = &mut self.config;
        c.animation.bind("animation", bindings);
        c.play_blend.bind("play_blend", bindings);
        c.play_rate.bind("play_rate", bindings);
        c.start_at.bind("start_at", bindings);
        c.blend_out_trigger_time.bind("blend_out_trigger_time", bindings);
        c.number_of_loops.bind("number_of_loops", bindings);
        c.stop_all_composites.bind("stop_all_composites", bindings);
        c.slot_name.bind("slot_name", bindings);
        c.state_machine_name.bind("state_machine_name", bindings);
        c.ability_state_name.bind("ability_state_name", bindings);
        c.section.bind("section", bindings);
        c.on_end_section.bind("on_end_section", bindings);
    }

    fn resolve_assets(&mut self, assets: &dyn AssetResolver) {
        let Some(handle) = self.config.animation.value().clone() else {
            return;
        };
        self.preloaded = assets.resolve(&handle);
        if self.preloaded.is_none() {
            warn!(task = %self.id, "{}", TaskError::UnresolvedAsset(handle));
        }
    }

    fn describe(&self) -> String {
        let name = match (self.config.animation.value(), self.preloaded.as_deref()) {
            (Some(handle), Some(asset)) => Self::describe_asset(handle, asset, self.config.section.value().as_deref()),
            (Some(handle), None) => handle.to_string(),
            (None, _) if self.config.animation.is_bound() => "Dynamic".to_string(),
            (None, _) => "<null>".to_string(),
        };
        format!("Play Animation: {name}")
    }
}

impl PlayAnimationTask {
    fn describe_asset(handle: &AssetHandle, asset: &AnimationAsset, section: Option<&str>) -> String {
        match (asset.as_composite(), section) {
            (Some(composite), Some(section)) if composite.is_valid_section_name(section) => {
                format!("{handle}({section})")
            }
            (Some(_), Some(_)) => format!("{handle}(<InvalidSection>)"),
            _ => handle.to_string(),
        }
    }
}
