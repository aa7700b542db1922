use spacetimedb::{
    ReducerContext, Identity, Table, Timestamp,
    table, reducer, view, SpacetimeType,
    client_visibility_filter, Filter,
};

pub mod answers;
pub mod daily;
mod restore;

use answers::{answers_match, codes_match};
use daily::{daily_challenges, day_bounds, is_active_on, rank_players, statuses};

use std::collections::HashSet;

// ==================== CONSTANTS ====================

/// Registration code seeded at init. Rotate with set_register_code before
/// the season opens - the default is only there so a fresh deploy works.
const DEFAULT_REGISTER_CODE: &str = "winterfest";

/// Max length for participant name parts, mirroring the gateway's own limit
const MAX_NAME_LEN: usize = 32;

// ==================== HELPER FUNCTIONS ====================

/// Get the registered player for the calling connection
/// This abstracts the session lookup pattern used throughout reducers
fn get_player(ctx: &ReducerContext) -> Result<Player, String> {
    let session = ctx.db.session()
        .connection_id()
        .find(&ctx.sender)
        .ok_or("No session found".to_string())?;

    ctx.db.player()
        .id()
        .find(&session.player_id)
        .ok_or("Not registered".to_string())
}

/// Authorization guard for gateway/admin reducers
pub(crate) fn require_worker(ctx: &ReducerContext, action: &str) -> Result<(), String> {
    if ctx.db.authorized_worker().identity().find(&ctx.sender).is_none() {
        log::warn!("[ADMIN] unauthorized {} attempt by {}", action, ctx.sender);
        return Err("Unauthorized".to_string());
    }
    Ok(())
}

/// Ledger key enforcing one award per (participant, target) pair.
/// The unique column on the award tables makes the storage layer reject the
/// second insert of a pair, so concurrent submissions cannot double-award.
pub(crate) fn award_key(player_id: &str, target_id: u64) -> String {
    format!("{}:{}", player_id, target_id)
}

/// Parse an RFC 3339 datetime from the admin surface into a Timestamp
fn parse_rfc3339(value: &str) -> Result<Timestamp, String> {
    let parsed = chrono::DateTime::parse_from_rfc3339(value.trim())
        .map_err(|e| format!("Invalid datetime '{}': {}", value, e))?;
    Ok(Timestamp::from_micros_since_unix_epoch(parsed.timestamp_micros()))
}

/// The day's challenges in stage order, one per kind
fn active_challenges_on(ctx: &ReducerContext, now: Timestamp) -> Vec<Challenge> {
    let (day_start, day_end) = day_bounds(now);
    daily_challenges(
        ctx.db.challenge()
            .iter()
            .filter(|c| is_active_on(c, day_start, day_end))
            .collect(),
    )
}

/// Ids of today's challenges the participant already has an award for.
/// Point lookups on the same unique award_key the engine writes, scoped to
/// the day's challenge ids - a same-kind challenge answered on another day
/// never counts as today's completion.
fn completed_today(ctx: &ReducerContext, player_id: &str, ordered: &[Challenge]) -> HashSet<u64> {
    ordered
        .iter()
        .filter(|c| {
            ctx.db.task_award()
                .award_key()
                .find(&award_key(player_id, c.id))
                .is_some()
        })
        .map(|c| c.id)
        .collect()
}

/// Apply a score delta and rebuild the leaderboard.
/// Runs inside the caller's reducer transaction, so the ledger insert and
/// the denormalized score can never be observed out of sync.
fn add_score(ctx: &ReducerContext, player_id: &str, delta: i64) {
    if let Some(mut player) = ctx.db.player().id().find(&player_id.to_string()) {
        player.score += delta;
        log::debug!("[SCORE] player:{} delta:{} total:{}", player_id, delta, player.score);
        ctx.db.player().id().update(player);
        refresh_leaderboard(ctx);
    } else {
        // Award rows reference players by id, so this means a player row
        // disappeared under a live session
        log::error!("[SCORE] player:{} missing while applying delta:{}", player_id, delta);
    }
}

/// Rebuild the public leaderboard from player scores (private helper,
/// called after every score change, not exposed as a reducer)
fn refresh_leaderboard(ctx: &ReducerContext) {
    for entry in ctx.db.leaderboard_entry().iter() {
        ctx.db.leaderboard_entry().id().delete(&entry.id);
    }

    let players: Vec<Player> = ctx.db.player().iter().collect();
    for (position, player) in rank_players(players) {
        ctx.db.leaderboard_entry().insert(LeaderboardEntry {
            id: 0, // auto_inc
            position,
            player_id: player.id.clone(),
            player_name: format!("{} {}", player.first_name, player.last_name),
            score: player.score,
        });
    }
}

// ==================== TABLES ====================

/// Session links ephemeral connection to stable participant id
/// PRIVATE: Links connection identity to player ID (no PII)
#[table(name = session)]
pub struct Session {
    #[primary_key]
    pub connection_id: Identity,

    /// Stable participant id (chat platform user id) - verified by gateway
    pub player_id: String,

    /// When this session was created
    pub connected_at: Timestamp,
}

/// Authorized identities that can access protected tables and admin reducers
/// Used for RLS filtering and reducer authorization checks
#[table(name = authorized_worker)]
pub struct AuthorizedWorker {
    #[primary_key]
    pub identity: Identity,
}

/// Singleton module configuration, seeded at init
#[table(name = config)]
pub struct Config {
    #[primary_key]
    pub id: u8,

    /// Shared secret participants must present to register
    pub register_code: String,
}

/// Participant profile with the denormalized running score
/// PRIVATE: Clients access via my_player view for RLS
#[table(name = player)]
#[derive(Clone)]
pub struct Player {
    #[primary_key]
    pub id: String,

    pub first_name: String,

    pub last_name: String,

    /// Running score, written only by the award engine and recompute_score.
    /// The award ledger stays the source of truth; this is derived data for
    /// fast leaderboard reads.
    pub score: i64,

    pub registered_at: Timestamp,
}

/// The three daily challenge kinds, in fixed stage order
#[derive(SpacetimeType, Debug, Clone, PartialEq)]
pub enum ChallengeKind {
    /// Stage 1: true-or-false claim, answered with a literal boolean token
    TrueFalse,
    /// Stage 2: name the film behind an AI-generated poster, exact match
    /// after normalization
    PosterGuess,
    /// Stage 3: invent a name for the holiday dish - answering at all is
    /// the success condition, every answer earns full points
    FreeAnswer,
}

impl ChallengeKind {
    /// Fixed position in the daily sequence
    pub fn stage(&self) -> u8 {
        match self {
            ChallengeKind::TrueFalse => 1,
            ChallengeKind::PosterGuess => 2,
            ChallengeKind::FreeAnswer => 3,
        }
    }

    /// Whether a submitted answer is correct for this kind
    pub fn evaluate(&self, submitted: &str, canonical: &str) -> bool {
        match self {
            ChallengeKind::TrueFalse => answers_match(submitted, canonical),
            ChallengeKind::PosterGuess => answers_match(submitted, canonical),
            ChallengeKind::FreeAnswer => true,
        }
    }

    /// Stable label for logs and restore payloads
    pub fn label(&self) -> &'static str {
        match self {
            ChallengeKind::TrueFalse => "true_false",
            ChallengeKind::PosterGuess => "poster_guess",
            ChallengeKind::FreeAnswer => "free_answer",
        }
    }

    pub fn from_label(label: &str) -> Option<ChallengeKind> {
        match label {
            "true_false" => Some(ChallengeKind::TrueFalse),
            "poster_guess" => Some(ChallengeKind::PosterGuess),
            "free_answer" => Some(ChallengeKind::FreeAnswer),
            _ => None,
        }
    }
}

/// Daily challenge definition. Immutable after creation - admins create and
/// delete, never edit, so an awarded answer can always be traced back to
/// the definition it was judged against.
#[table(name = challenge, public)]
#[derive(Clone)]
pub struct Challenge {
    #[primary_key]
    #[auto_inc]
    pub id: u64,

    /// Active window start
    pub starts_at: Timestamp,

    /// Active window end. A challenge is offered on every calendar day its
    /// window touches.
    pub ends_at: Timestamp,

    pub kind: ChallengeKind,

    /// Prompt text shown by the gateway (optional for kinds whose prompt is
    /// an image)
    pub description: Option<String>,

    /// Canonical correct answer; interpretation depends on kind
    pub answer: String,

    /// Points granted for a correct (or any, for FreeAnswer) submission
    pub points: u32,

    pub created_at: Timestamp,
}

/// Scheduled event participants check in to with a code word
#[table(name = event, public)]
pub struct Event {
    #[primary_key]
    #[auto_inc]
    pub id: u64,

    pub title: String,

    /// When the event takes place
    pub date: Timestamp,

    /// Secret code word announced at the event
    pub code: String,

    /// Points granted for checking in
    pub points: u32,
}

/// Ledger row: participant completed a daily challenge
/// Append-only; written only by submit_task_answer and bulk restore
#[table(name = task_award, public)]
pub struct TaskAward {
    #[primary_key]
    #[auto_inc]
    pub id: u64,

    /// "player_id:challenge_id" - the storage-enforced uniqueness constraint
    /// on the (participant, challenge) pair
    #[unique]
    pub award_key: String,

    #[index(btree)]
    pub player_id: String,

    #[index(btree)]
    pub challenge_id: u64,

    /// Points granted; 0 records an incorrect attempt that still consumed
    /// the challenge for the day
    pub points: u32,

    /// Raw submitted answer, kept for audits and disputes
    pub answer: String,

    pub awarded_at: Timestamp,
}

/// Ledger row: participant checked in at an event
#[table(name = event_award, public)]
pub struct EventAward {
    #[primary_key]
    #[auto_inc]
    pub id: u64,

    /// "player_id:event_id" - one check-in per (participant, event) pair
    #[unique]
    pub award_key: String,

    #[index(btree)]
    pub player_id: String,

    #[index(btree)]
    pub event_id: u64,

    pub points: u32,

    pub awarded_at: Timestamp,
}

/// Public leaderboard, rebuilt after every score change
#[table(name = leaderboard_entry, public)]
pub struct LeaderboardEntry {
    #[primary_key]
    #[auto_inc]
    pub id: u64,

    /// 1-based display position; tied scores share a position
    pub position: u32,

    pub player_id: String,

    /// Display name (denormalized for rendering)
    pub player_name: String,

    pub score: i64,
}

// ==================== VIEWS ====================

/// View: Returns only the current user's player data
/// This is the secure way for clients to access their own profile and score
#[view(name = my_player, public)]
fn my_player(ctx: &spacetimedb::ViewContext) -> Option<Player> {
    // Find session for this identity
    let session = ctx.db.session().connection_id().find(ctx.sender)?;
    // Return player data for this session
    ctx.db.player().id().find(&session.player_id)
}

// ==================== ROW-LEVEL SECURITY ====================

/// Challenge rows carry the canonical answer, so only the gateway may see
/// them; participants get the prompt rendered by the gateway
#[client_visibility_filter]
const CHALLENGE_VISIBILITY: Filter = Filter::Sql(
    "SELECT c.* FROM challenge c
     JOIN authorized_worker aw WHERE aw.identity = :sender"
);

/// Event rows carry the secret code word
#[client_visibility_filter]
const EVENT_VISIBILITY: Filter = Filter::Sql(
    "SELECT e.* FROM event e
     JOIN authorized_worker aw WHERE aw.identity = :sender"
);

/// Award ledgers stay gateway-only; raw answers are not for other players
#[client_visibility_filter]
const TASK_AWARD_VISIBILITY: Filter = Filter::Sql(
    "SELECT ta.* FROM task_award ta
     JOIN authorized_worker aw WHERE aw.identity = :sender"
);

#[client_visibility_filter]
const EVENT_AWARD_VISIBILITY: Filter = Filter::Sql(
    "SELECT ea.* FROM event_award ea
     JOIN authorized_worker aw WHERE aw.identity = :sender"
);

// ==================== REDUCERS ====================

/// Create a verified session for a client identity
/// Only the gateway may call this - it has already authenticated the chat
/// user and mapped them to a stable player_id
#[reducer]
pub fn create_session(ctx: &ReducerContext, client_identity: String, player_id: String) -> Result<(), String> {
    require_worker(ctx, "create_session")?;

    let identity = Identity::from_hex(&client_identity)
        .map_err(|_| "Invalid identity hex string".to_string())?;

    // Delete stale sessions: same player (unclean reconnect) OR same
    // connection_id (prevents PK conflict)
    let stale_sessions: Vec<_> = ctx.db.session()
        .iter()
        .filter(|s| s.player_id == player_id || s.connection_id == identity)
        .map(|s| s.connection_id)
        .collect();
    for conn_id in stale_sessions {
        ctx.db.session().connection_id().delete(&conn_id);
    }

    ctx.db.session().insert(Session {
        connection_id: identity,
        player_id: player_id.clone(),
        connected_at: ctx.timestamp,
    });

    log::info!("[SESSION] created player:{}", player_id);
    Ok(())
}

/// Clean up the session row when a connection drops
#[reducer(client_disconnected)]
pub fn client_disconnected(ctx: &ReducerContext) {
    if let Some(session) = ctx.db.session().connection_id().find(&ctx.sender) {
        ctx.db.session().connection_id().delete(&session.connection_id);
        log::info!("[SESSION] closed player:{}", session.player_id);
    }
}

/// Register the calling participant. Idempotent: re-registering an existing
/// participant is a no-op so a retried gateway call never resets a score.
#[reducer]
pub fn register(ctx: &ReducerContext, first_name: String, last_name: String, register_code: String) -> Result<(), String> {
    let session = ctx.db.session()
        .connection_id()
        .find(&ctx.sender)
        .ok_or("No session found".to_string())?;

    let config = ctx.db.config()
        .id()
        .find(&0)
        .ok_or("Module not initialized".to_string())?;

    if register_code.trim() != config.register_code {
        log::warn!("[REGISTER] rejected player:{} reason:bad_code", session.player_id);
        return Err("Invalid registration code".to_string());
    }

    let first_name = first_name.trim().to_string();
    let last_name = last_name.trim().to_string();
    if first_name.is_empty() || first_name.chars().count() > MAX_NAME_LEN {
        return Err(format!("First name must be 1-{} characters", MAX_NAME_LEN));
    }
    if last_name.is_empty() || last_name.chars().count() > MAX_NAME_LEN {
        return Err(format!("Last name must be 1-{} characters", MAX_NAME_LEN));
    }

    if ctx.db.player().id().find(&session.player_id).is_some() {
        log::info!("[REGISTER] already registered player:{}", session.player_id);
        return Ok(());
    }

    ctx.db.player().insert(Player {
        id: session.player_id.clone(),
        first_name: first_name.clone(),
        last_name,
        score: 0,
        registered_at: ctx.timestamp,
    });
    refresh_leaderboard(ctx);

    log::info!("[REGISTER] created player:{} name:\"{}\"", session.player_id, first_name);
    Ok(())
}

/// Submit an answer for a daily challenge.
///
/// The submission is judged on the challenge's own terms even when it is
/// not the participant's current challenge - the gateway only offers the
/// current one, but a direct call must stay correct.
///
/// A duplicate submission (including the losing side of a concurrent race)
/// is a benign outcome, not an error: the unique award_key rejects the
/// second ledger insert, nothing is scored again, and the reducer returns
/// Ok so the gateway can render "already completed" from its subscription.
#[reducer]
pub fn submit_task_answer(ctx: &ReducerContext, challenge_id: u64, raw_answer: String) -> Result<(), String> {
    let player = get_player(ctx)?;

    let challenge = ctx.db.challenge()
        .id()
        .find(&challenge_id)
        .ok_or("Task not found".to_string())?;

    if raw_answer.trim().is_empty() {
        return Err("Empty answer".to_string());
    }

    let is_correct = challenge.kind.evaluate(&raw_answer, &challenge.answer);
    let points = if is_correct { challenge.points } else { 0 };

    let inserted = ctx.db.task_award().try_insert(TaskAward {
        id: 0, // auto_inc
        award_key: award_key(&player.id, challenge.id),
        player_id: player.id.clone(),
        challenge_id: challenge.id,
        points,
        answer: raw_answer,
        awarded_at: ctx.timestamp,
    });

    if inserted.is_err() {
        // Lost the race or a straight duplicate: an award for this
        // (participant, challenge) pair already exists
        log::info!(
            "[TASK] duplicate player:{} challenge:{} kind:{}",
            player.id, challenge.id, challenge.kind.label()
        );
        return Ok(());
    }

    if points > 0 {
        add_score(ctx, &player.id, points as i64);
    }

    // Wide event: where the day's sequence stands after this submission
    let ordered = active_challenges_on(ctx, ctx.timestamp);
    let completed = completed_today(ctx, &player.id, &ordered);
    let status = statuses(&ordered, &completed);
    let done = status.iter().filter(|s| s.completed).count();
    let next = status
        .iter()
        .find(|s| s.is_current)
        .map(|s| s.challenge_id.to_string())
        .unwrap_or_else(|| "none".to_string());

    log::info!(
        "[TASK] answered player:{} challenge:{} kind:{} correct:{} points:{} progress:{}/{} next:{}",
        player.id,
        challenge.id,
        challenge.kind.label(),
        is_correct,
        points,
        done,
        status.len(),
        next,
    );
    Ok(())
}

/// Check in at an event with its code word.
///
/// The two failure verdicts are distinct errors because the gateway prompts
/// differently: a wrong code invites a retry, an existing check-in does
/// not. A failed reducer aborts its transaction, so neither failure leaves
/// a ledger row behind.
#[reducer]
pub fn submit_event_code(ctx: &ReducerContext, event_id: u64, raw_code: String) -> Result<(), String> {
    let player = get_player(ctx)?;

    let event = ctx.db.event()
        .id()
        .find(&event_id)
        .ok_or("Event not found".to_string())?;

    if !codes_match(&event.code, &raw_code) {
        log::info!("[CHECKIN] rejected player:{} event:{} reason:bad_code", player.id, event.id);
        return Err("Invalid code word".to_string());
    }

    let inserted = ctx.db.event_award().try_insert(EventAward {
        id: 0, // auto_inc
        award_key: award_key(&player.id, event.id),
        player_id: player.id.clone(),
        event_id: event.id,
        points: event.points,
        awarded_at: ctx.timestamp,
    });

    if inserted.is_err() {
        log::info!("[CHECKIN] duplicate player:{} event:{}", player.id, event.id);
        return Err("Already checked in to this event".to_string());
    }

    add_score(ctx, &player.id, event.points as i64);

    log::info!(
        "[CHECKIN] accepted player:{} event:{} points:{}",
        player.id, event.id, event.points
    );
    Ok(())
}

/// Reset a participant's score to the sum of their award ledger rows.
/// The ledger is the source of truth; this corrects any drift in the
/// denormalized score. Idempotent, safe to run at any time.
#[reducer]
pub fn recompute_score(ctx: &ReducerContext, player_id: String) -> Result<(), String> {
    require_worker(ctx, "recompute_score")?;

    let mut player = ctx.db.player()
        .id()
        .find(&player_id)
        .ok_or("Player not found".to_string())?;

    let task_points: i64 = ctx.db.task_award()
        .player_id()
        .filter(&player_id)
        .map(|a| a.points as i64)
        .sum();
    let event_points: i64 = ctx.db.event_award()
        .player_id()
        .filter(&player_id)
        .map(|a| a.points as i64)
        .sum();
    let recomputed = task_points + event_points;

    if recomputed != player.score {
        log::warn!(
            "[SCORE] drift corrected player:{} stored:{} recomputed:{}",
            player_id, player.score, recomputed
        );
    } else {
        log::info!("[SCORE] verified player:{} score:{}", player_id, recomputed);
    }

    player.score = recomputed;
    ctx.db.player().id().update(player);
    refresh_leaderboard(ctx);
    Ok(())
}

// ==================== ADMIN REDUCERS ====================

/// Grant a gateway/admin identity access to protected tables and reducers
#[reducer]
pub fn authorize_worker(ctx: &ReducerContext, identity_hex: String) -> Result<(), String> {
    require_worker(ctx, "authorize_worker")?;

    let identity = Identity::from_hex(&identity_hex)
        .map_err(|_| "Invalid identity hex string".to_string())?;

    if ctx.db.authorized_worker().identity().find(&identity).is_none() {
        ctx.db.authorized_worker().insert(AuthorizedWorker { identity });
        log::info!("[ADMIN] worker authorized {}", identity);
    }
    Ok(())
}

/// Rotate the registration code
#[reducer]
pub fn set_register_code(ctx: &ReducerContext, code: String) -> Result<(), String> {
    require_worker(ctx, "set_register_code")?;

    let code = code.trim().to_string();
    if code.is_empty() {
        return Err("Registration code must not be empty".to_string());
    }

    let mut config = ctx.db.config()
        .id()
        .find(&0)
        .ok_or("Module not initialized".to_string())?;
    config.register_code = code;
    ctx.db.config().id().update(config);

    log::info!("[ADMIN] registration code rotated");
    Ok(())
}

/// Create a daily challenge.
///
/// Rejects a second challenge of the same kind with an overlapping window:
/// the sequencer assumes at most one challenge per kind per day, and that
/// invariant is enforced here at write time rather than silently resolved
/// at read time.
#[reducer]
pub fn create_challenge(
    ctx: &ReducerContext,
    starts_at: String,
    ends_at: String,
    kind: ChallengeKind,
    description: Option<String>,
    answer: String,
    points: u32,
) -> Result<(), String> {
    require_worker(ctx, "create_challenge")?;

    let starts_at = parse_rfc3339(&starts_at)?;
    let ends_at = parse_rfc3339(&ends_at)?;
    let starts_micros = starts_at.to_micros_since_unix_epoch();
    let ends_micros = ends_at.to_micros_since_unix_epoch();
    if starts_micros >= ends_micros {
        return Err("starts_at must precede ends_at".to_string());
    }
    if answer.trim().is_empty() {
        return Err("Answer must not be empty".to_string());
    }

    if let Some(existing) = ctx.db.challenge().iter().find(|c| {
        c.kind == kind
            && c.starts_at.to_micros_since_unix_epoch() <= ends_micros
            && c.ends_at.to_micros_since_unix_epoch() >= starts_micros
    }) {
        return Err(format!(
            "Challenge {} ({}) already covers an overlapping window",
            existing.id,
            existing.kind.label()
        ));
    }

    let challenge = ctx.db.challenge().insert(Challenge {
        id: 0, // auto_inc
        starts_at,
        ends_at,
        kind,
        description,
        answer,
        points,
        created_at: ctx.timestamp,
    });

    log::info!(
        "[ADMIN] challenge created id:{} kind:{} points:{}",
        challenge.id, challenge.kind.label(), challenge.points
    );
    Ok(())
}

/// Delete a challenge and its award rows. Scores keep already-granted
/// points until recompute_score is run against the remaining ledger.
#[reducer]
pub fn delete_challenge(ctx: &ReducerContext, challenge_id: u64) -> Result<(), String> {
    require_worker(ctx, "delete_challenge")?;

    let challenge = ctx.db.challenge()
        .id()
        .find(&challenge_id)
        .ok_or("Task not found".to_string())?;

    let awards: Vec<_> = ctx.db.task_award().challenge_id().filter(&challenge_id).collect();
    let dropped = awards.len();
    for award in awards {
        ctx.db.task_award().id().delete(&award.id);
    }
    ctx.db.challenge().id().delete(&challenge.id);

    if dropped > 0 {
        log::warn!(
            "[ADMIN] challenge deleted id:{} kind:{} awards_dropped:{} - run recompute_score to settle scores",
            challenge_id, challenge.kind.label(), dropped
        );
    } else {
        log::info!("[ADMIN] challenge deleted id:{} kind:{}", challenge_id, challenge.kind.label());
    }
    Ok(())
}

/// Create an event participants can check in to
#[reducer]
pub fn create_event(
    ctx: &ReducerContext,
    title: String,
    date: String,
    code: String,
    points: u32,
) -> Result<(), String> {
    require_worker(ctx, "create_event")?;

    let date = parse_rfc3339(&date)?;
    let title = title.trim().to_string();
    let code = code.trim().to_string();
    if title.is_empty() {
        return Err("Title must not be empty".to_string());
    }
    if code.is_empty() {
        return Err("Code word must not be empty".to_string());
    }

    let event = ctx.db.event().insert(Event {
        id: 0, // auto_inc
        title,
        date,
        code,
        points,
    });

    log::info!("[ADMIN] event created id:{} title:\"{}\" points:{}", event.id, event.title, event.points);
    Ok(())
}

/// Delete an event and its check-in rows. Same score-drift note as
/// delete_challenge.
#[reducer]
pub fn delete_event(ctx: &ReducerContext, event_id: u64) -> Result<(), String> {
    require_worker(ctx, "delete_event")?;

    if ctx.db.event().id().find(&event_id).is_none() {
        return Err("Event not found".to_string());
    }

    let awards: Vec<_> = ctx.db.event_award().event_id().filter(&event_id).collect();
    let dropped = awards.len();
    for award in awards {
        ctx.db.event_award().id().delete(&award.id);
    }
    ctx.db.event().id().delete(&event_id);

    if dropped > 0 {
        log::warn!(
            "[ADMIN] event deleted id:{} awards_dropped:{} - run recompute_score to settle scores",
            event_id, dropped
        );
    } else {
        log::info!("[ADMIN] event deleted id:{}", event_id);
    }
    Ok(())
}

/// Initialize module - authorize the owner and seed configuration
#[reducer(init)]
pub fn init(ctx: &ReducerContext) {
    // Add module owner to authorized workers for RLS and reducer access
    // control. In init, ctx.sender is the module owner identity.
    if ctx.db.authorized_worker().identity().find(&ctx.sender).is_none() {
        ctx.db.authorized_worker().insert(AuthorizedWorker {
            identity: ctx.sender,
        });
    }

    // Seed the config row on first publish; hot-reloads keep the current code
    if ctx.db.config().id().find(&0).is_none() {
        ctx.db.config().insert(Config {
            id: 0,
            register_code: DEFAULT_REGISTER_CODE.to_string(),
        });
    }

    log::info!("Winterfest module initialized successfully");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_stage_order() {
        assert_eq!(ChallengeKind::TrueFalse.stage(), 1);
        assert_eq!(ChallengeKind::PosterGuess.stage(), 2);
        assert_eq!(ChallengeKind::FreeAnswer.stage(), 3);
    }

    #[test]
    fn test_kind_evaluate() {
        // Boolean tokens, case-insensitive
        assert!(ChallengeKind::TrueFalse.evaluate("True", "True"));
        assert!(ChallengeKind::TrueFalse.evaluate("true", "True"));
        assert!(!ChallengeKind::TrueFalse.evaluate("False", "True"));

        // Poster guesses get full normalization
        assert!(ChallengeKind::PosterGuess.evaluate(" чебурашка", "Чебурашка"));
        assert!(ChallengeKind::PosterGuess.evaluate("Ёлки", "елки"));
        assert!(!ChallengeKind::PosterGuess.evaluate("Чебурашка 2", "Чебурашка"));

        // FreeAnswer never judges
        assert!(ChallengeKind::FreeAnswer.evaluate("Оливье от бабушки", "anything"));
        assert!(ChallengeKind::FreeAnswer.evaluate("x", ""));
    }

    #[test]
    fn test_kind_labels_round_trip() {
        for kind in [
            ChallengeKind::TrueFalse,
            ChallengeKind::PosterGuess,
            ChallengeKind::FreeAnswer,
        ] {
            assert_eq!(ChallengeKind::from_label(kind.label()), Some(kind));
        }
        assert_eq!(ChallengeKind::from_label("karaoke"), None);
    }

    #[test]
    fn test_award_key_is_pair_unique() {
        assert_eq!(award_key("900001", 7), "900001:7");
        // Distinct pairs never collide on the synthesized key
        assert_ne!(award_key("900001", 17), award_key("90000", 117));
    }
}
