diesel::table! {
    users (id) {
        id -> Int4,
        username -> Varchar,
        password_hash -> Bytea,
    }
}

diesel::table! {
    snake_high_scores (user_id) {
        user_id -> Int4,
        score -> Int4,
    }
}

diesel::table! {
    games_stats (user_id, game_type) {
        user_id -> Int4,
        game_type -> Varchar,
        wins -> Int4,
        losses -> Int4,
    }
}

diesel::joinable!(snake_high_scores -> users (user_id));
diesel::joinable!(games_stats -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(users, snake_high_scores, games_stats);
