//! Speaker Stage - scripted two-client session on an in-process hub.

use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use speaker_stage_domain::{ActorId, StageSettings};
use speaker_stage_player::infrastructure::platform::{
    DesktopNotifier, DesktopSoundPlayer, DesktopSpeakerSelector, DesktopStageView,
    InMemoryActorDirectory, InMemoryEmotionStore,
};
use speaker_stage_player::ports::outbound::{
    ChatMessage, DefaultInCharacterFilter, LayoutMetrics,
};
use speaker_stage_player::{
    BroadcastHub, LocalUser, StageCommand, StageController, StagePorts, StageRuntime,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "speaker_stage_player=debug,speaker_stage=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Speaker Stage");

    let settings = StageSettings::from_env();
    tracing::info!(
        typing_speed_ms = settings.typing_speed_ms,
        text_clear_delay_secs = settings.text_clear_delay_secs,
        "Loaded stage settings"
    );

    // Shared world documents
    let directory = InMemoryActorDirectory::new();
    let emotions = InMemoryEmotionStore::new();
    let narrator = directory.insert_speaker("narrator", "Narrator", "portraits/narrator.png");
    let hero = directory.insert("hero", "Hero", "portraits/hero.png");
    emotions.save(narrator.clone(), "smug", "portraits/narrator-smug.png");

    let hub = BroadcastHub::new();
    let client = |user: LocalUser, view: DesktopStageView| {
        let ports = StagePorts {
            directory: Box::new(directory.clone()),
            emotions: Box::new(emotions.clone()),
            channel: Box::new(hub.channel()),
            sound: Box::new(DesktopSoundPlayer),
            selector: Box::new(DesktopSpeakerSelector),
            notifier: Box::new(DesktopNotifier),
            settings: Box::new(settings.clone()),
            chat_filter: Box::new(DefaultInCharacterFilter),
            view: Box::new(view),
        };
        StageRuntime::new(StageController::new(user, ports), &hub)
    };

    let gm_view = DesktopStageView::new(LayoutMetrics::default());
    let player_view = DesktopStageView::new(LayoutMetrics::new(1280.0, None));
    let (gm_runtime, gm) = client(LocalUser::gm("gm"), gm_view);
    let (player_runtime, player) = client(
        LocalUser::anonymous_player(Some(hero.clone())),
        player_view.clone(),
    );
    let gm_task = tokio::spawn(gm_runtime.run());
    let player_task = tokio::spawn(player_runtime.run());

    // Both clients open the stage, then the GM and the player bring actors on
    gm.send(StageCommand::ToggleStage).await?;
    player.send(StageCommand::ToggleStage).await?;
    gm.send(StageCommand::BackstageLeftClick(narrator.clone()))
        .await?;
    tokio::time::sleep(Duration::from_millis(1200)).await;
    player.send(StageCommand::PlayerActorClick).await?;
    tokio::time::sleep(Duration::from_millis(1200)).await;

    let line = "Welcome, *traveller*. The [[東|ひがし]] gate is **closed**.";
    // Every client sees the chat message and types it on its own stage
    let message = ChatMessage::spoken_by(narrator.clone(), line);
    gm.send(StageCommand::Chat(message.clone())).await?;
    player.send(StageCommand::Chat(message)).await?;
    let typing = settings.typing_speed_ms * line.chars().count() as u64;
    tokio::time::sleep(Duration::from_millis(typing + 500)).await;
    tracing::info!(
        html = %player_view.dialogue(&narrator).unwrap_or_default(),
        "Narrator line on the player's stage"
    );

    gm.send(StageCommand::BackstageRightClick(ActorId::new("narrator")))
        .await?;
    tokio::time::sleep(Duration::from_secs(2)).await;

    drop(gm);
    drop(player);
    let gm = gm_task.await.context("GM runtime panicked")?;
    let player = player_task.await.context("player runtime panicked")?;

    tracing::info!(
        gm_on_stage = gm.store().len(),
        player_on_stage = player.store().len(),
        "Speaker Stage finished"
    );
    Ok(())
}
