//! Pandemic Seal demo
//!
//! Plays a short scripted session against the configured store: reveal a
//! hidden city, treat, research, and run a few turns.

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pandemic_seal::{
    ActionMode, DeterministicRng, GameSession, GameState, LocalWallet, RulesConfig, SessionConfig,
    VERSION, ViewState,
    game::turn::run_turns,
    session::PersistOutcome,
    store::StoreConfig,
};

const DEMO_TURNS: u32 = 5;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Pandemic Seal v{}", VERSION);

    let store = StoreConfig::from_env();
    let config = SessionConfig::from_env();
    info!(
        "Rules: spread {}bp, discover {}bp, {} actions/turn",
        config.rules.spread_chance.basis_points(),
        config.rules.discover_chance.basis_points(),
        config.rules.actions_per_turn
    );

    demo_session(&store, config).await?;
    verify_determinism();
    Ok(())
}

async fn demo_session(store: &StoreConfig, config: SessionConfig) -> Result<()> {
    info!("=== Starting Demo Session ===");

    let wallet = LocalWallet::generate();
    let mut view = ViewState::new();
    let mut session = GameSession::resume(store.open(), config)
        .await
        .context("failed to open game store")?;

    info!("Session {} as {}", session.id(), wallet.identity().address);

    if session.snapshot().is_sealed() {
        session
            .unlock(&wallet, &mut view)
            .await
            .context("failed to unlock stored game")?;
    }

    // Reveal the active player's city
    let home = session
        .state()
        .and_then(|s| s.player(view.active_player()))
        .map(|p| p.position.clone())
        .context("no active player")?;
    session.select_city(&mut view, &home)?;
    let levels = session.reveal_city(&wallet, &home, &mut view).await?;
    info!("{} disease levels: {:?}", home, levels);

    // Treat, then research
    for mode in [ActionMode::Treat, ActionMode::Discover] {
        view.set_action_mode(mode);
        match session.perform_action(&mut view).await {
            Ok(report) => info!("{}: {:?}", mode, report.effect),
            Err(e) => warn!("{} rejected: {}", mode, e),
        }
    }

    for _ in 0..DEMO_TURNS {
        let report = session.end_turn(&mut view).await?;
        if let PersistOutcome::Saved(receipt) = &report.persist {
            info!("Turn {} saved ({} bytes)", report.turn, receipt.bytes);
        }
    }

    // Print final results
    info!("=== Session Results ===");
    info!("Turn: {}", session.snapshot().turn());
    info!("Outbreaks: {}", session.snapshot().outbreak_count());
    for event in session.snapshot().outbreak_history() {
        info!("  {} (turn {})", event.city, event.turn);
    }
    for disease in session.snapshot().diseases() {
        info!("  {}: cured={} eradicated={}", disease.color(), disease.is_cured(), disease.is_eradicated());
    }
    if let Some(state) = session.state() {
        info!("Final State Hash: {}", hex::encode(state.compute_hash()));
    }

    Ok(())
}

/// Replay the same seed twice and compare hashes.
fn verify_determinism() {
    info!("=== Verifying Determinism ===");
    let rules = RulesConfig::default();

    let run = || {
        let mut rng = DeterministicRng::new(12345);
        let state = GameState::new_game(&mut rng);
        let (state, _) = run_turns(state, 50, &rules, &mut rng);
        state.compute_hash()
    };

    let (first, second) = (run(), run());
    info!("Replay State Hash: {}", hex::encode(first));

    if first == second {
        info!("DETERMINISM VERIFIED: Hashes match!");
    } else {
        warn!("DETERMINISM FAILURE: Hashes differ!");
    }
}
