//! Game Session
//!
//! The interaction boundary. A session owns the current snapshot, the
//! gateway, the codec, the random source and the reveal context; the caller
//! owns the [`ViewState`] and passes it in.
//!
//! Ordering rules:
//! - a mutation replaces the snapshot first and persists second;
//! - a failed persist leaves the replacement in place (no rollback) and is
//!   reported as a warning;
//! - a reveal is awaited to completion before the caller can issue the next
//!   call, since mutations take `&mut self`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::DISEASE_COUNT;
use crate::core::rng::{DeterministicRng, RandomSource};
use crate::game::action::{ActionEffect, ActionRequest, perform_action};
use crate::game::events::{GameEvent, OutbreakEvent};
use crate::game::rules::RulesConfig;
use crate::game::state::{Disease, DiseaseColor, GameState};
use crate::game::turn::end_turn;
use crate::privacy::codec::{ConfidentialCodec, SealedValue, TextSealCodec, unseal_intensity};
use crate::privacy::reveal::{AuthorizationToken, RevealConfig, RevealContext, authorize};
use crate::privacy::wallet::IdentityProvider;
use crate::session::status::{ErrorKind, SessionError, StatusReport};
use crate::session::view::{RevealedLevels, ViewState};
use crate::store::gateway::{PersistError, PersistenceGateway, SaveReceipt};
use crate::store::sealed::SealedGameState;

/// Session configuration.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Game rules
    pub rules: RulesConfig,
    /// Reveal challenge parameters
    pub reveal: RevealConfig,
}

impl SessionConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            rules: RulesConfig::from_env(),
            reveal: RevealConfig::from_env(),
        }
    }
}

/// The snapshot a session holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    /// Plaintext state the engine can act on.
    Live(GameState),
    /// Loaded from the gateway; read-only until unlocked.
    Sealed(SealedGameState),
}

impl Snapshot {
    /// Is this still sealed?
    pub fn is_sealed(&self) -> bool {
        matches!(self, Snapshot::Sealed(_))
    }

    /// The live state, if unlocked.
    pub fn live(&self) -> Option<&GameState> {
        match self {
            Snapshot::Live(state) => Some(state),
            Snapshot::Sealed(_) => None,
        }
    }

    /// Turn counter.
    pub fn turn(&self) -> u32 {
        match self {
            Snapshot::Live(state) => state.turn(),
            Snapshot::Sealed(sealed) => sealed.turn,
        }
    }

    /// Outbreak counter.
    pub fn outbreak_count(&self) -> u32 {
        match self {
            Snapshot::Live(state) => state.outbreak_count(),
            Snapshot::Sealed(sealed) => sealed.outbreak_count,
        }
    }

    /// Outbreak history, oldest first.
    pub fn outbreak_history(&self) -> &[OutbreakEvent] {
        match self {
            Snapshot::Live(state) => state.outbreak_history(),
            Snapshot::Sealed(sealed) => &sealed.outbreak_history,
        }
    }

    /// Cure progress per color.
    pub fn diseases(&self) -> &[Disease; DISEASE_COUNT] {
        match self {
            Snapshot::Live(state) => state.diseases(),
            Snapshot::Sealed(sealed) => &sealed.diseases,
        }
    }

    /// Is `name` on the board?
    pub fn has_city(&self, name: &str) -> bool {
        match self {
            Snapshot::Live(state) => state.city(name).is_some(),
            Snapshot::Sealed(sealed) => sealed.city(name).is_some(),
        }
    }
}

/// What happened to the persist that follows a mutation.
#[derive(Debug)]
pub enum PersistOutcome {
    /// Saved.
    Saved(SaveReceipt),
    /// Nothing changed, nothing written.
    Skipped,
    /// Save failed; the in-memory snapshot is still authoritative.
    Failed(PersistError),
}

impl PersistOutcome {
    /// Was the snapshot written?
    pub fn is_saved(&self) -> bool {
        matches!(self, PersistOutcome::Saved(_))
    }

    /// Did the write fail?
    pub fn is_failed(&self) -> bool {
        matches!(self, PersistOutcome::Failed(_))
    }
}

/// Result of [`GameSession::perform_action`].
#[derive(Debug)]
pub struct ActionReport {
    /// What the action did
    pub effect: ActionEffect,
    /// Did it spend a budget point?
    pub spent: bool,
    /// Event for the log, if any
    pub event: Option<GameEvent>,
    /// Persist result
    pub persist: PersistOutcome,
}

/// Result of [`GameSession::end_turn`].
#[derive(Debug)]
pub struct TurnReport {
    /// Turn counter after the transition
    pub turn: u32,
    /// Outbreaks triggered by spread
    pub outbreaks: Vec<OutbreakEvent>,
    /// Colors eradicated this turn
    pub eradicated: Vec<DiseaseColor>,
    /// Persist result
    pub persist: PersistOutcome,
}

/// One player's game, bound to a gateway.
pub struct GameSession<G, C = TextSealCodec, R = DeterministicRng> {
    id: Uuid,
    started_at: DateTime<Utc>,
    snapshot: Snapshot,
    gateway: G,
    codec: C,
    rng: R,
    rules: RulesConfig,
    reveal: RevealContext,
    decrypt_latency: Duration,
}

impl<G: PersistenceGateway> GameSession<G> {
    /// Start a fresh game seeded from a new session id.
    pub fn new(gateway: G, config: SessionConfig) -> Self {
        let id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut rng = DeterministicRng::for_session(id.as_bytes(), started_at.timestamp());
        let state = GameState::new_game(&mut rng);
        Self::assemble(id, started_at, Snapshot::Live(state), gateway, TextSealCodec, rng, config)
    }

    /// Resume the stored game if there is one, otherwise start fresh.
    ///
    /// A stored game comes back sealed; call [`unlock`](Self::unlock) before
    /// acting on it.
    pub async fn resume(gateway: G, config: SessionConfig) -> Result<Self, SessionError> {
        if !gateway.is_available().await {
            return Err(PersistError::Unavailable.into());
        }

        match gateway.load().await? {
            Some(sealed) => {
                let id = Uuid::new_v4();
                let started_at = Utc::now();
                let rng = DeterministicRng::for_session(id.as_bytes(), started_at.timestamp());
                info!("Resumed sealed game at turn {}", sealed.turn);
                Ok(Self::assemble(id, started_at, Snapshot::Sealed(sealed), gateway, TextSealCodec, rng, config))
            }
            None => Ok(Self::new(gateway, config)),
        }
    }
}

impl<G, C, R> GameSession<G, C, R>
where
    G: PersistenceGateway,
    C: ConfidentialCodec,
    R: RandomSource,
{
    /// Session over an explicit state, codec and random source.
    pub fn with_parts(gateway: G, codec: C, rng: R, state: GameState, config: SessionConfig) -> Self {
        Self::assemble(Uuid::new_v4(), Utc::now(), Snapshot::Live(state), gateway, codec, rng, config)
    }

    fn assemble(
        id: Uuid,
        started_at: DateTime<Utc>,
        snapshot: Snapshot,
        gateway: G,
        codec: C,
        rng: R,
        config: SessionConfig,
    ) -> Self {
        let reveal = RevealContext::new(id, &config.reveal, started_at);
        Self {
            id,
            started_at,
            snapshot,
            gateway,
            codec,
            rng,
            rules: config.rules,
            reveal,
            decrypt_latency: config.reveal.decrypt_latency,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Session id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When the session started.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Current live state, if unlocked.
    pub fn state(&self) -> Option<&GameState> {
        self.snapshot.live()
    }

    /// Rules in force.
    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    /// Parameters of the reveal challenge.
    pub fn reveal_context(&self) -> &RevealContext {
        &self.reveal
    }

    /// Backing gateway.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Reload the stored snapshot. It stays sealed until unlocked.
    ///
    /// Returns `false` when nothing is stored (the current snapshot is kept).
    pub async fn refresh(&mut self, view: &mut ViewState) -> Result<bool, SessionError> {
        if !self.gateway.is_available().await {
            return Err(fail(view, PersistError::Unavailable.into()));
        }

        match self.gateway.load().await {
            Ok(Some(sealed)) => {
                info!("Loaded sealed game at turn {}", sealed.turn);
                self.snapshot = Snapshot::Sealed(sealed);
                view.invalidate_reveals();
                view.set_status(StatusReport::success("Game state loaded"));
                Ok(true)
            }
            Ok(None) => {
                view.set_status(StatusReport::success("No stored game"));
                Ok(false)
            }
            Err(err) => Err(fail(view, err.into())),
        }
    }

    /// Unseal a loaded snapshot so the engine can act on it.
    ///
    /// One authorization covers every value. On failure the snapshot stays
    /// sealed.
    pub async fn unlock<P: IdentityProvider>(
        &mut self,
        provider: &P,
        view: &mut ViewState,
    ) -> Result<(), SessionError> {
        let Snapshot::Sealed(sealed) = &self.snapshot else {
            return Ok(());
        };

        view.set_status(StatusReport::pending("Decrypting game state"));
        let state = match self.authorize_reveal(provider).await {
            Ok(token) => sealed.unseal(&self.codec, &token),
            Err(err) => return Err(fail(view, err)),
        };

        match state {
            Ok(state) => {
                info!("Unlocked game at turn {}", state.turn());
                self.snapshot = Snapshot::Live(state);
                view.set_status(StatusReport::success("Game state decrypted"));
                Ok(())
            }
            Err(err) => Err(fail(view, err.into())),
        }
    }

    // =========================================================================
    // Reveal
    // =========================================================================

    /// Select a city after checking it is on the board.
    pub fn select_city(&self, view: &mut ViewState, name: &str) -> Result<(), SessionError> {
        if !self.snapshot.has_city(name) {
            return Err(fail(view, SessionError::UnknownCity(name.to_string())));
        }
        view.select_city(name);
        Ok(())
    }

    /// Reveal a city's intensities to the viewer.
    ///
    /// A city in outbreak is public and needs no authorization, whether the
    /// snapshot is live or sealed. Anything else needs one authorization for
    /// the whole city. Values that fail to decode come back as `None`.
    pub async fn reveal_city<P: IdentityProvider>(
        &self,
        provider: &P,
        name: &str,
        view: &mut ViewState,
    ) -> Result<RevealedLevels, SessionError> {
        view.set_status(StatusReport::pending("Decrypting disease data"));

        let levels = match self.reveal_levels(provider, name).await {
            Ok(levels) => levels,
            Err(err) => return Err(fail(view, err)),
        };

        view.record_reveal(name, levels);
        if levels.iter().any(Option::is_none) {
            view.set_status(StatusReport::warning(
                ErrorKind::DecodeError,
                format!("Some values for {name} could not be decoded"),
            ));
        } else {
            view.set_status(StatusReport::success("Disease spread decrypted"));
        }
        Ok(levels)
    }

    async fn reveal_levels<P: IdentityProvider>(
        &self,
        provider: &P,
        name: &str,
    ) -> Result<RevealedLevels, SessionError> {
        match &self.snapshot {
            Snapshot::Live(state) => {
                let city = state
                    .city(name)
                    .ok_or_else(|| SessionError::UnknownCity(name.to_string()))?;
                if let Some(levels) = city.public_levels() {
                    return Ok(levels.map(Some));
                }

                let sealed = city.levels().map(|level| self.codec.seal(i64::from(level)));
                let token = self.authorize_reveal(provider).await?;
                Ok(unseal_levels(&self.codec, &sealed, &token))
            }
            Snapshot::Sealed(stored) => {
                let city = stored
                    .city(name)
                    .ok_or_else(|| SessionError::UnknownCity(name.to_string()))?;
                let token = if city.outbreak {
                    AuthorizationToken::public_outbreak()
                } else {
                    self.authorize_reveal(provider).await?
                };
                Ok(unseal_levels(&self.codec, &city.disease_levels, &token))
            }
        }
    }

    async fn authorize_reveal<P: IdentityProvider>(
        &self,
        provider: &P,
    ) -> Result<AuthorizationToken, SessionError> {
        let token = authorize(provider, &self.reveal).await?;
        if !self.decrypt_latency.is_zero() {
            tokio::time::sleep(self.decrypt_latency).await;
        }
        debug!("Reveal token issued to {}", token.address());
        Ok(token)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Perform the selected action for the active player on the selected city.
    ///
    /// Persists only when the action changed the snapshot.
    pub async fn perform_action(&mut self, view: &mut ViewState) -> Result<ActionReport, SessionError> {
        let Snapshot::Live(state) = &self.snapshot else {
            return Err(fail(view, SessionError::SnapshotSealed));
        };

        let city = view.selected_city().map(str::to_string);
        let request = ActionRequest {
            player_index: view.active_player(),
            city: city.as_deref(),
            mode: view.action_mode(),
        };

        let outcome = match perform_action(state, &request, &self.rules, &mut self.rng) {
            Ok(outcome) => outcome,
            Err(err) => return Err(fail(view, err.into())),
        };

        let mutated = outcome.mutated();
        let message = describe(&outcome.effect);
        self.snapshot = Snapshot::Live(outcome.state);

        let persist = if mutated {
            view.invalidate_reveals();
            info!("Action {} applied: {}", request.mode, message);
            self.persist().await
        } else {
            debug!("Action {} was a no-op: {}", request.mode, message);
            PersistOutcome::Skipped
        };

        report_persist(view, &persist, message);
        Ok(ActionReport {
            effect: outcome.effect,
            spent: outcome.spent,
            event: outcome.event,
            persist,
        })
    }

    /// End the turn: spread, budgets, turn advance, view reset, persist.
    pub async fn end_turn(&mut self, view: &mut ViewState) -> Result<TurnReport, SessionError> {
        let Snapshot::Live(state) = &self.snapshot else {
            return Err(fail(view, SessionError::SnapshotSealed));
        };

        let outcome = end_turn(state.clone(), &self.rules, &mut self.rng);
        let turn = outcome.state.turn();
        self.snapshot = Snapshot::Live(outcome.state);

        view.reset_for_new_turn();
        view.invalidate_reveals();

        for outbreak in &outcome.outbreaks {
            warn!("Outbreak in {} on turn {}", outbreak.city, outbreak.turn);
        }

        let persist = self.persist().await;
        let message = match outcome.outbreaks.len() {
            0 => format!("Turn {turn} begins"),
            n => format!("Turn {turn} begins after {n} outbreak(s)"),
        };
        report_persist(view, &persist, message);

        Ok(TurnReport {
            turn,
            outbreaks: outcome.outbreaks,
            eradicated: outcome.eradicated,
            persist,
        })
    }

    /// Write the current snapshot through the gateway.
    ///
    /// A live snapshot is sealed first; a sealed one is written as loaded.
    pub async fn persist(&self) -> PersistOutcome {
        let sealed = match &self.snapshot {
            Snapshot::Live(state) => SealedGameState::seal(state, &self.codec),
            Snapshot::Sealed(sealed) => sealed.clone(),
        };

        match self.gateway.save(&sealed).await {
            Ok(receipt) => {
                debug!("Persisted turn {} ({} bytes, {})", sealed.turn, receipt.bytes, receipt.hash_hex());
                PersistOutcome::Saved(receipt)
            }
            Err(err) => {
                warn!("Persist failed, keeping in-memory state: {}", err);
                PersistOutcome::Failed(err)
            }
        }
    }
}

/// Unseal one city's values; a value that fails to decode becomes `None`.
fn unseal_levels<C: ConfidentialCodec>(
    codec: &C,
    sealed: &[SealedValue; DISEASE_COUNT],
    token: &AuthorizationToken,
) -> RevealedLevels {
    let mut levels = [None; DISEASE_COUNT];
    for (slot, value) in levels.iter_mut().zip(sealed) {
        *slot = unseal_intensity(codec, value, token).ok();
    }
    levels
}

/// Record an error status and hand the error back.
fn fail(view: &mut ViewState, err: SessionError) -> SessionError {
    warn!("{} ({})", err, err.kind());
    view.set_status(err.to_status());
    err
}

fn report_persist(view: &mut ViewState, persist: &PersistOutcome, message: String) {
    match persist {
        PersistOutcome::Failed(err) => view.set_status(StatusReport::warning(
            ErrorKind::PersistError,
            format!("{message}; not saved: {err}"),
        )),
        _ => view.set_status(StatusReport::success(message)),
    }
}

fn describe(effect: &ActionEffect) -> String {
    match effect {
        ActionEffect::Treated { color, remaining } => {
            format!("Treated {color} disease, {remaining} left")
        }
        ActionEffect::NoDisease => "No disease to treat here".to_string(),
        ActionEffect::Cured { color } => format!("Cure discovered for {color}"),
        ActionEffect::CureFailed => "Research failed, try again".to_string(),
        ActionEffect::AllCured => "Every disease is already cured".to_string(),
        ActionEffect::Moved { from, to } => format!("Moved from {from} to {to}"),
        ActionEffect::AlreadyThere => "Already in this city".to_string(),
        ActionEffect::Reserved(mode) => format!("{mode} is not available yet"),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::ScriptedRng;
    use crate::game::action::ActionMode;
    use crate::game::state::{City, Player, Role};
    use crate::privacy::wallet::{LocalWallet, SigningPolicy};
    use crate::session::status::StatusLevel;
    use crate::store::memory::MemoryGateway;

    fn board() -> GameState {
        GameState::new(
            vec![
                City::with_levels("Tokyo", [2, 1, 0, 0]).in_outbreak(),
                City::with_levels("Atlanta", [2, 0, 0, 0]),
                City::with_levels("London", [0, 0, 0, 0]),
            ],
            vec![
                Player::new(1, "Atlanta", Role::Scientist),
                Player::new(2, "London", Role::Medic),
            ],
        )
    }

    fn session(rng: ScriptedRng) -> GameSession<MemoryGateway, TextSealCodec, ScriptedRng> {
        GameSession::with_parts(MemoryGateway::new(), TextSealCodec, rng, board(), SessionConfig::default())
    }

    #[tokio::test]
    async fn test_treat_persists() {
        let mut session = session(ScriptedRng::never());
        let mut view = ViewState::new();
        session.select_city(&mut view, "Atlanta").unwrap();
        view.set_action_mode(ActionMode::Treat);

        let report = session.perform_action(&mut view).await.unwrap();

        assert_eq!(report.effect, ActionEffect::Treated { color: DiseaseColor::Red, remaining: 1 });
        assert!(report.persist.is_saved());
        assert_eq!(session.gateway().write_count(), 1);
        assert_eq!(session.state().unwrap().player(0).unwrap().actions, 3);
        assert_eq!(view.status().unwrap().level, StatusLevel::Success);
    }

    #[tokio::test]
    async fn test_no_op_skips_persist() {
        let mut session = session(ScriptedRng::never());
        let mut view = ViewState::new();
        session.select_city(&mut view, "London").unwrap();
        view.set_action_mode(ActionMode::Treat);

        let report = session.perform_action(&mut view).await.unwrap();
        assert_eq!(report.effect, ActionEffect::NoDisease);
        assert!(matches!(report.persist, PersistOutcome::Skipped));
        assert_eq!(session.gateway().write_count(), 0);
    }

    #[tokio::test]
    async fn test_rejected_action_sets_error_status() {
        let mut session = session(ScriptedRng::never());
        let mut view = ViewState::new();

        let err = session.perform_action(&mut view).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ActionRejected);
        assert_eq!(view.status().unwrap().kind, Some(ErrorKind::ActionRejected));

        let err = session.select_city(&mut view, "Atlantis").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownCity);
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_mutation() {
        let mut session = session(ScriptedRng::never());
        session.gateway().set_reject_writes(true);
        let mut view = ViewState::new();
        session.select_city(&mut view, "Atlanta").unwrap();
        view.set_action_mode(ActionMode::Treat);

        let report = session.perform_action(&mut view).await.unwrap();
        assert!(report.persist.is_failed());
        assert_eq!(session.state().unwrap().player(0).unwrap().actions, 3);

        let status = view.status().unwrap();
        assert_eq!(status.level, StatusLevel::Warning);
        assert_eq!(status.kind, Some(ErrorKind::PersistError));
    }

    #[tokio::test]
    async fn test_end_turn_resets_view() {
        let mut session = session(ScriptedRng::never());
        let mut view = ViewState::new();
        view.set_active_player(1);
        view.set_action_mode(ActionMode::Discover);

        let report = session.end_turn(&mut view).await.unwrap();
        assert_eq!(report.turn, 2);
        assert!(report.persist.is_saved());
        assert_eq!(view.active_player(), 0);
        assert_eq!(view.action_mode(), ActionMode::Move);
    }

    #[tokio::test]
    async fn test_reveal_outbreak_city_without_identity() {
        let session = session(ScriptedRng::never());
        let mut wallet = LocalWallet::from_seed([1u8; 32]);
        wallet.disconnect();
        let mut view = ViewState::new();

        let levels = session.reveal_city(&wallet, "Tokyo", &mut view).await.unwrap();
        assert_eq!(levels, [Some(2), Some(1), Some(0), Some(0)]);
    }

    #[tokio::test]
    async fn test_reveal_hidden_city() {
        let session = session(ScriptedRng::never());
        let wallet = LocalWallet::from_seed([1u8; 32]);
        let mut view = ViewState::new();

        let levels = session.reveal_city(&wallet, "Atlanta", &mut view).await.unwrap();
        assert_eq!(levels, [Some(2), Some(0), Some(0), Some(0)]);
        assert_eq!(view.revealed("Atlanta"), Some(&levels));
    }

    #[tokio::test]
    async fn test_reveal_declined() {
        let session = session(ScriptedRng::never());
        let wallet = LocalWallet::from_seed([1u8; 32]).with_policy(SigningPolicy::Decline);
        let mut view = ViewState::new();

        let err = session.reveal_city(&wallet, "Atlanta", &mut view).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthFailed);
        assert!(view.revealed("Atlanta").is_none());
        assert_eq!(view.status().unwrap().level, StatusLevel::Error);
    }

    #[tokio::test]
    async fn test_sealed_snapshot_flow() {
        let mut writer = session(ScriptedRng::never());
        let gateway = writer.gateway().clone();
        let mut view = ViewState::new();
        writer.end_turn(&mut view).await.unwrap();

        let mut reader = GameSession::resume(gateway, SessionConfig::default()).await.unwrap();
        assert!(reader.snapshot().is_sealed());
        assert_eq!(reader.snapshot().turn(), 2);

        let err = reader.end_turn(&mut view).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SnapshotSealed);

        let wallet = LocalWallet::from_seed([2u8; 32]);
        reader.unlock(&wallet, &mut view).await.unwrap();
        assert_eq!(reader.state(), writer.state());
    }
}
