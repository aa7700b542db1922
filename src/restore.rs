// Bulk restore reducers for disaster recovery
// Accept JSON arrays exported from admin panel (TypeScript SDK format)

use spacetimedb::{reducer, ReducerContext, Timestamp, log, Table};
use crate::{award_key, require_worker, Challenge, ChallengeKind, Event, EventAward, Player, TaskAward};
use crate::{challenge, event, event_award, player, task_award};
use serde_json::Value;

/// Parse Timestamp from SDK JSON format: {"__timestamp_micros_since_unix_epoch__": "123456"}
fn parse_timestamp_json(val: &Value) -> Result<Timestamp, String> {
    let micros_str = val.get("__timestamp_micros_since_unix_epoch__")
        .and_then(|v| v.as_str())
        .ok_or("Missing or invalid timestamp field")?;

    let micros: i64 = micros_str.parse()
        .map_err(|e| format!("Invalid timestamp micros: {}", e))?;

    Ok(Timestamp::from_micros_since_unix_epoch(micros))
}

/// Parse u64 from SDK JSON, which encodes 64-bit ints either as numbers or
/// as decimal strings depending on SDK version
fn parse_u64_json(val: &Value) -> Option<u64> {
    val.as_u64()
        .or_else(|| val.as_str().and_then(|s| s.parse().ok()))
}

fn parse_array(json_data: &str) -> Result<Vec<Value>, String> {
    let data: Value = serde_json::from_str(json_data)
        .map_err(|e| format!("Invalid JSON: {}", e))?;
    data.as_array()
        .cloned()
        .ok_or("Expected a JSON array".to_string())
}

/// Bulk restore player table from JSON array
/// Protected by authorization check - only authorized workers can call this
#[reducer]
pub fn bulk_restore_player(ctx: &ReducerContext, json_data: String) -> Result<(), String> {
    require_worker(ctx, "bulk_restore_player")?;

    let mut count = 0;
    for (i, p) in parse_array(&json_data)?.iter().enumerate() {
        let player = Player {
            id: p.get("id").and_then(|v| v.as_str()).ok_or(format!("Player {}: missing id", i))?.to_string(),
            first_name: p.get("firstName").and_then(|v| v.as_str()).ok_or(format!("Player {}: missing firstName", i))?.to_string(),
            last_name: p.get("lastName").and_then(|v| v.as_str()).ok_or(format!("Player {}: missing lastName", i))?.to_string(),
            score: p.get("score").and_then(|v| v.as_i64()).ok_or(format!("Player {}: missing score", i))?,
            registered_at: parse_timestamp_json(p.get("registeredAt").ok_or(format!("Player {}: missing registeredAt", i))?)?,
        };

        ctx.db.player().insert(player);
        count += 1;
    }

    log::info!("✅ Restored {} player records", count);
    Ok(())
}

/// Bulk restore challenge catalog from JSON array
/// Ids are preserved so existing award rows keep pointing at the right rows
#[reducer]
pub fn bulk_restore_challenge(ctx: &ReducerContext, json_data: String) -> Result<(), String> {
    require_worker(ctx, "bulk_restore_challenge")?;

    let mut count = 0;
    for (i, c) in parse_array(&json_data)?.iter().enumerate() {
        let kind_label = c.get("kind").and_then(|v| v.as_str()).ok_or(format!("Challenge {}: missing kind", i))?;
        let kind = ChallengeKind::from_label(kind_label)
            .ok_or(format!("Challenge {}: unknown kind '{}'", i, kind_label))?;

        let challenge = Challenge {
            id: c.get("id").and_then(parse_u64_json).ok_or(format!("Challenge {}: missing id", i))?,
            starts_at: parse_timestamp_json(c.get("startsAt").ok_or(format!("Challenge {}: missing startsAt", i))?)?,
            ends_at: parse_timestamp_json(c.get("endsAt").ok_or(format!("Challenge {}: missing endsAt", i))?)?,
            kind,
            description: c.get("description").and_then(|v| v.as_str()).map(|s| s.to_string()),
            answer: c.get("answer").and_then(|v| v.as_str()).ok_or(format!("Challenge {}: missing answer", i))?.to_string(),
            points: c.get("points").and_then(|v| v.as_u64()).ok_or(format!("Challenge {}: missing points", i))? as u32,
            created_at: parse_timestamp_json(c.get("createdAt").ok_or(format!("Challenge {}: missing createdAt", i))?)?,
        };

        ctx.db.challenge().insert(challenge);
        count += 1;
    }

    log::info!("✅ Restored {} challenge records", count);
    Ok(())
}

/// Bulk restore event catalog from JSON array
#[reducer]
pub fn bulk_restore_event(ctx: &ReducerContext, json_data: String) -> Result<(), String> {
    require_worker(ctx, "bulk_restore_event")?;

    let mut count = 0;
    for (i, e) in parse_array(&json_data)?.iter().enumerate() {
        let event = Event {
            id: e.get("id").and_then(parse_u64_json).ok_or(format!("Event {}: missing id", i))?,
            title: e.get("title").and_then(|v| v.as_str()).ok_or(format!("Event {}: missing title", i))?.to_string(),
            date: parse_timestamp_json(e.get("date").ok_or(format!("Event {}: missing date", i))?)?,
            code: e.get("code").and_then(|v| v.as_str()).ok_or(format!("Event {}: missing code", i))?.to_string(),
            points: e.get("points").and_then(|v| v.as_u64()).ok_or(format!("Event {}: missing points", i))? as u32,
        };

        ctx.db.event().insert(event);
        count += 1;
    }

    log::info!("✅ Restored {} event records", count);
    Ok(())
}

/// Bulk restore the task award ledger from JSON array
/// The award_key is recomputed from the pair, so rows already present keep
/// their uniqueness guarantee and a double restore cannot double-award
#[reducer]
pub fn bulk_restore_task_award(ctx: &ReducerContext, json_data: String) -> Result<(), String> {
    require_worker(ctx, "bulk_restore_task_award")?;

    let mut count = 0;
    let mut skipped = 0;
    for (i, a) in parse_array(&json_data)?.iter().enumerate() {
        let player_id = a.get("playerId").and_then(|v| v.as_str()).ok_or(format!("Award {}: missing playerId", i))?.to_string();
        let challenge_id = a.get("challengeId").and_then(parse_u64_json).ok_or(format!("Award {}: missing challengeId", i))?;

        let award = TaskAward {
            id: 0, // auto_inc
            award_key: award_key(&player_id, challenge_id),
            player_id,
            challenge_id,
            points: a.get("points").and_then(|v| v.as_u64()).ok_or(format!("Award {}: missing points", i))? as u32,
            answer: a.get("answer").and_then(|v| v.as_str()).ok_or(format!("Award {}: missing answer", i))?.to_string(),
            awarded_at: parse_timestamp_json(a.get("awardedAt").ok_or(format!("Award {}: missing awardedAt", i))?)?,
        };

        match ctx.db.task_award().try_insert(award) {
            Ok(_) => count += 1,
            Err(_) => skipped += 1, // pair already in the ledger
        }
    }

    log::info!("✅ Restored {} task award records ({} already present)", count, skipped);
    Ok(())
}

/// Bulk restore the event award ledger from JSON array
#[reducer]
pub fn bulk_restore_event_award(ctx: &ReducerContext, json_data: String) -> Result<(), String> {
    require_worker(ctx, "bulk_restore_event_award")?;

    let mut count = 0;
    let mut skipped = 0;
    for (i, a) in parse_array(&json_data)?.iter().enumerate() {
        let player_id = a.get("playerId").and_then(|v| v.as_str()).ok_or(format!("Award {}: missing playerId", i))?.to_string();
        let event_id = a.get("eventId").and_then(parse_u64_json).ok_or(format!("Award {}: missing eventId", i))?;

        let award = EventAward {
            id: 0, // auto_inc
            award_key: award_key(&player_id, event_id),
            player_id,
            event_id,
            points: a.get("points").and_then(|v| v.as_u64()).ok_or(format!("Award {}: missing points", i))? as u32,
            awarded_at: parse_timestamp_json(a.get("awardedAt").ok_or(format!("Award {}: missing awardedAt", i))?)?,
        };

        match ctx.db.event_award().try_insert(award) {
            Ok(_) => count += 1,
            Err(_) => skipped += 1,
        }
    }

    log::info!("✅ Restored {} event award records ({} already present)", count, skipped);
    Ok(())
}
