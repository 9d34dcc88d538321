use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cue_core::app::{Runtime, RuntimeConfig, SkillBuilder, SkillSpec, Status, TimelineDriver};
use cue_core::domain::{
    AnimationAsset, AssetHandle, ClipAsset, CompositeAsset, CompositeSection, Invocation, Vec3,
};
use cue_core::impls::{FixedTargets, InMemoryAssets, InMemoryWorld, NearbyTargets};
use cue_core::ports::{IdGenerator, SystemClock, UlidGenerator};
use cue_core::typed::RuleRegistry;

/// 引数なしで走るデモ用スキル
const DEMO_SKILL: &str = r#"{
  "name": "slash",
  "tasks": [
    { "type": "find_target", "mode": "single", "rule": "nearby" },
    { "type": "turn_to", "blend_time": 0.15, "end_time": 0.3, "anim_turn_state": true },
    { "type": "play_animation", "animation": "Attack01", "start_time": 0.1 },
    { "type": "play_animation", "animation": "Run", "start_time": 1.2, "looping": true, "end_time": 2.0 }
  ]
}"#;

/// Drive skills against an in-memory world and print their status.
#[derive(Debug, Parser)]
#[command(name = "cue", version)]
struct Args {
    /// Skill description (JSON). Runs a built-in demo skill when omitted.
    skill: Option<PathBuf>,

    /// Runtime settings (JSON).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Concurrent invocations of the skill.
    #[arg(long, default_value_t = 1)]
    invocations: usize,

    /// Upper bound on frames per invocation.
    #[arg(long, default_value_t = 240)]
    frames: u32,

    /// Seconds per frame.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Log at debug level regardless of CUE_LOG.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct Report {
    index: usize,
    frames: u32,
    status: Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // (A) 設定 → ログ（--verbose > CUE_LOG > 設定ファイル）
    let config = match &args.config {
        Some(path) => RuntimeConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => RuntimeConfig::default(),
    };
    init_tracing(&args, &config);

    // (B) スキル定義を読み込み、共有ランタイムを用意
    let spec = match &args.skill {
        Some(path) => SkillSpec::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => SkillSpec::from_json(DEMO_SKILL).context("parsing demo skill")?,
    };
    let runtime = Arc::new(Runtime::from_config(&config).context("registering scratch pads")?);
    info!(skill = %spec.name, invocations = args.invocations, frames = args.frames, dt = args.dt, "starting");

    // (C) invocation ごとに world とドライバを持つタスクを起動
    let mut handles = Vec::with_capacity(args.invocations);
    for index in 0..args.invocations {
        let runtime = Arc::clone(&runtime);
        let spec = spec.clone();
        let (frames, dt) = (args.frames, args.dt);
        handles.push(tokio::spawn(async move { run_invocation(index, runtime, spec, frames, dt).await }));
    }

    // (D) 結果を JSON で出力
    for handle in handles {
        let report = handle.await.context("invocation task panicked")??;
        if !report.status.finished {
            warn!(index = report.index, frames = report.frames, "skill did not finish within the frame limit");
        }
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

fn init_tracing(args: &Args, config: &RuntimeConfig) {
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("CUE_LOG").unwrap_or_else(|_| EnvFilter::new(&config.log_filter))
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

async fn run_invocation(index: usize, runtime: Arc<Runtime>, spec: SkillSpec, frames: u32, dt: f32) -> Result<Report> {
    let mut world = InMemoryWorld::new();
    let hero = world.spawn("hero");
    world.add_playback_component(hero);
    world.add_turn_in_place(hero);

    let near = world.spawn("near");
    world.place(near, Vec3::new(120.0, 80.0, 0.0));
    let far = world.spawn("far");
    world.place(far, Vec3::new(4000.0, 0.0, 0.0));

    let mut rules = RuleRegistry::new();
    rules.register("nearby", Arc::new(NearbyTargets::new(vec![near, far], 500.0, true)))?;
    rules.register("fixed", Arc::new(FixedTargets::new(vec![far]).clearing()))?;

    let assets = demo_assets();
    let skill = SkillBuilder::from_spec(spec)
        .build(&rules, &assets, runtime.pool())
        .context("building skill")?;

    let id = UlidGenerator::new(SystemClock).generate_invocation_id();
    let invocation = Invocation::new(id, skill.name()).with_self_entity(hero);
    let mut driver = TimelineDriver::new(runtime, Arc::new(skill), invocation);

    // 1 フレーム = driver.advance → world.advance
    let mut ticker = interval(Duration::from_secs_f32(dt.max(0.001)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    driver.begin(&mut world, &assets);
    let mut frame = 0;
    while frame < frames && !driver.is_finished() {
        ticker.tick().await;
        driver.advance(dt, &mut world, &assets);
        world.advance(dt);
        frame += 1;
    }
    if !driver.is_finished() {
        driver.interrupt(&mut world, &assets);
    }

    Ok(Report {
        index,
        frames: frame,
        status: driver.status(),
    })
}

fn demo_assets() -> InMemoryAssets {
    InMemoryAssets::new()
        .with(AnimationAsset::Composite(CompositeAsset {
            handle: AssetHandle::new("Attack01"),
            sections: vec![
                CompositeSection {
                    name: "Windup".to_string(),
                    start_time: 0.0,
                    length: 0.4,
                },
                CompositeSection {
                    name: "Strike".to_string(),
                    start_time: 0.4,
                    length: 0.3,
                },
                CompositeSection {
                    name: "Recover".to_string(),
                    start_time: 0.7,
                    length: 0.5,
                },
            ],
        }))
        .with(AnimationAsset::Clip(ClipAsset {
            handle: AssetHandle::new("Run"),
            length: 0.8,
        }))
}
