use crate::schema::users;
use diesel::prelude::*;
use diesel::sql_types::{Integer, Text};
use serde::Serialize;

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub password_hash: Vec<u8>,
}

#[derive(Queryable)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub password_hash: Vec<u8>,
}

/// One row of the aggregate scoreboard returned by `GET /users/scores`.
///
/// Produced by a raw join query; missing activity is coalesced to 0 in SQL,
/// so every field is non-nullable here.
#[derive(Debug, Serialize, QueryableByName)]
pub struct ScoreRow {
    #[diesel(sql_type = Text)]
    pub username: String,
    #[diesel(sql_type = Integer)]
    pub snake_high_score: i32,
    #[diesel(sql_type = Integer)]
    pub tic_tac_toe_wins: i32,
    #[diesel(sql_type = Integer)]
    pub tic_tac_toe_losses: i32,
    #[diesel(sql_type = Integer)]
    pub rps_wins: i32,
    #[diesel(sql_type = Integer)]
    pub rps_losses: i32,
    #[diesel(sql_type = Integer)]
    pub memory_game_wins: i32,
    #[diesel(sql_type = Integer)]
    pub memory_game_losses: i32,
}
