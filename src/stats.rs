use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::{Integer, Text};
use serde::{Deserialize, Serialize};

use crate::config::AppState;
use crate::error::ServiceError;
use crate::models::ScoreRow;
use crate::schema::users;

/// Aggregate scoreboard across all games. Users with no recorded activity
/// still appear, with every numeric column coalesced to 0.
const SCORES_QUERY: &str = "\
    SELECT u.username, \
           COALESCE(s.score, 0) AS snake_high_score, \
           COALESCE(t.wins, 0) AS tic_tac_toe_wins, \
           COALESCE(t.losses, 0) AS tic_tac_toe_losses, \
           COALESCE(r.wins, 0) AS rps_wins, \
           COALESCE(r.losses, 0) AS rps_losses, \
           COALESCE(m.wins, 0) AS memory_game_wins, \
           COALESCE(m.losses, 0) AS memory_game_losses \
    FROM users u \
    LEFT JOIN snake_high_scores s ON u.id = s.user_id \
    LEFT JOIN games_stats t ON u.id = t.user_id AND t.game_type = 'tic-tac-toe' \
    LEFT JOIN games_stats r ON u.id = r.user_id AND r.game_type = 'rock-paper-scissors' \
    LEFT JOIN games_stats m ON u.id = m.user_id AND m.game_type = 'memory-game' \
    ORDER BY u.username";

/// Atomic max-aggregation upsert: ties and lower scores leave the row alone.
const SNAKE_UPSERT: &str = "\
    INSERT INTO snake_high_scores (user_id, score) VALUES ($1, $2) \
    ON CONFLICT (user_id) DO UPDATE SET score = EXCLUDED.score \
    WHERE snake_high_scores.score < EXCLUDED.score";

/// Atomic cumulative-aggregation upsert: deltas add onto stored totals.
const STATS_UPSERT: &str = "\
    INSERT INTO games_stats (user_id, game_type, wins, losses) VALUES ($1, $2, $3, $4) \
    ON CONFLICT (user_id, game_type) DO UPDATE \
    SET wins = games_stats.wins + EXCLUDED.wins, \
        losses = games_stats.losses + EXCLUDED.losses";

#[derive(Deserialize)]
pub struct SnakeScoreParams {
    score: i32,
}

#[derive(Deserialize)]
pub struct GameStatsParams {
    game_type: String,
    #[serde(default)]
    wins: i32,
    #[serde(default)]
    losses: i32,
}

#[derive(Serialize)]
struct StatusMessage {
    message: &'static str,
}

/// Resolve the acting identity from the `Authorization` header. Runs before
/// any database access so unauthorized requests never touch the pool.
fn authorized_username(req: &HttpRequest, secret: &str) -> Result<String, ServiceError> {
    let raw = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ServiceError::Unauthorized)?;
    crate::token::verify(secret, raw).ok_or(ServiceError::Unauthorized)
}

/// The token is trusted for authentication, but the username it names must
/// still exist in this service's users table.
pub fn lookup_user_id(conn: &mut PgConnection, name: &str) -> Result<i32, ServiceError> {
    users::table
        .filter(users::username.eq(name))
        .select(users::id)
        .first::<i32>(conn)
        .optional()?
        .ok_or(ServiceError::UserNotFound)
}

/// Load the aggregate scoreboard for every registered user.
pub fn load_scoreboard(conn: &mut PgConnection) -> Result<Vec<ScoreRow>, ServiceError> {
    Ok(diesel::sql_query(SCORES_QUERY).load(conn)?)
}

/// Record a snake score, keeping only the maximum per user.
pub fn record_snake_score(
    conn: &mut PgConnection,
    user_id: i32,
    score: i32,
) -> Result<(), ServiceError> {
    diesel::sql_query(SNAKE_UPSERT)
        .bind::<Integer, _>(user_id)
        .bind::<Integer, _>(score)
        .execute(conn)?;
    Ok(())
}

/// Add win/loss deltas onto a user's stored totals for one game type.
pub fn record_game_stats(
    conn: &mut PgConnection,
    user_id: i32,
    game_type: &str,
    wins: i32,
    losses: i32,
) -> Result<(), ServiceError> {
    diesel::sql_query(STATS_UPSERT)
        .bind::<Integer, _>(user_id)
        .bind::<Text, _>(game_type)
        .bind::<Integer, _>(wins)
        .bind::<Integer, _>(losses)
        .execute(conn)?;
    Ok(())
}

/// `GET /users/scores`
pub async fn get_scores(state: web::Data<AppState>) -> Result<HttpResponse, ServiceError> {
    let pool = state.pool.clone();
    let rows = web::block(move || -> Result<Vec<ScoreRow>, ServiceError> {
        let mut conn = pool.get()?;
        load_scoreboard(&mut conn)
    })
    .await??;

    Ok(HttpResponse::Ok().json(rows))
}

/// `POST /snake/score`
pub async fn update_snake_score(
    req: HttpRequest,
    params: web::Json<SnakeScoreParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let username = authorized_username(&req, &state.token_secret)?;
    let score = params.score;

    let pool = state.pool.clone();
    web::block(move || -> Result<(), ServiceError> {
        let mut conn = pool.get()?;
        let user_id = lookup_user_id(&mut conn, &username)?;
        record_snake_score(&mut conn, user_id, score)
    })
    .await??;

    Ok(HttpResponse::Ok().json(StatusMessage {
        message: "Score updated",
    }))
}

/// `POST /game/stats`
pub async fn update_game_stats(
    req: HttpRequest,
    params: web::Json<GameStatsParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let username = authorized_username(&req, &state.token_secret)?;
    let params = params.into_inner();
    if params.wins < 0 || params.losses < 0 {
        return Err(ServiceError::Validation(
            "wins and losses must be non-negative".to_string(),
        ));
    }

    let pool = state.pool.clone();
    web::block(move || -> Result<(), ServiceError> {
        let mut conn = pool.get()?;
        let user_id = lookup_user_id(&mut conn, &username)?;
        record_game_stats(
            &mut conn,
            user_id,
            &params.game_type,
            params.wins,
            params.losses,
        )
    })
    .await??;

    Ok(HttpResponse::Ok().json(StatusMessage {
        message: "Game stats updated",
    }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/users/scores").route(web::get().to(get_scores)))
        .service(web::resource("/snake/score").route(web::post().to(update_snake_score)))
        .service(web::resource("/game/stats").route(web::post().to(update_game_stats)));
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    fn test_stats_deltas_default_to_zero() {
        let params: GameStatsParams =
            serde_json::from_str(r#"{"game_type": "tic-tac-toe"}"#).unwrap();
        assert_eq!(params.game_type, "tic-tac-toe");
        assert_eq!(params.wins, 0);
        assert_eq!(params.losses, 0);
    }

    #[test]
    fn test_game_type_is_free_form() {
        let params: GameStatsParams =
            serde_json::from_str(r#"{"game_type": "checkers", "wins": 3, "losses": 1}"#).unwrap();
        assert_eq!(params.game_type, "checkers");
        assert_eq!(params.wins, 3);
        assert_eq!(params.losses, 1);
    }
}
