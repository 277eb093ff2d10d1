// src/handlers/profile.rs

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    ledger::{self, achievements, levels},
    models::user::{CreateProfileRequest, Preferences, ProfileResponse, UserProfile},
    utils::{dates, jwt::Claims},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakResponse {
    pub current_streak: i64,
    pub is_new_day: bool,
    pub streak_broken: bool,
    pub used_freeze: bool,
    /// Display-only daily bonus for the current streak length.
    pub streak_bonus: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FreezePurchaseResponse {
    pub purchased: bool,
    pub xp: i64,
    pub streak_freezes: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartsResponse {
    pub hearts_remaining: i64,
}

fn to_response(profile: UserProfile, progress: Vec<crate::models::user::TopicProgress>) -> ProfileResponse {
    ProfileResponse {
        uid: profile.uid,
        display_name: profile.display_name,
        email: profile.email,
        avatar_url: profile.avatar_url,
        age_group: profile.age_group,
        skill_level: profile.skill_level,
        preferences: Preferences {
            selected_topics: profile.selected_topics.0,
            interests: profile.interests.0,
        },
        xp: profile.xp,
        level: profile.level,
        level_title: levels::level_title(profile.level).as_str(),
        current_streak: profile.current_streak,
        longest_streak: profile.longest_streak,
        last_active_date: profile.last_active_date,
        streak_freezes: profile.streak_freezes,
        hearts_remaining: profile.hearts_remaining,
        hearts_regen_at: profile.hearts_regen_at,
        lessons_completed: profile.lessons_completed,
        perfect_lessons: profile.perfect_lessons,
        daily_xp: profile.daily_xp,
        weekly_xp: profile.weekly_xp,
        created_at: profile.created_at,
        progress,
    }
}

/// Bootstraps the profile document for a first sign-in. The uid comes from
/// the verified token; a second call returns 409.
pub async fn create_profile(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    ledger::create_profile(&pool, &claims.sub, &req).await?;

    let profile = ledger::fetch_profile(&pool, &claims.sub).await?;
    Ok((StatusCode::CREATED, Json(to_response(profile, Vec::new()))))
}

/// The current user's ledger read model: profile plus per-topic progress.
pub async fn get_me(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let profile = ledger::fetch_profile(&pool, &claims.sub).await?;
    let progress = ledger::fetch_topic_progress(&pool, &claims.sub).await?;
    Ok(Json(to_response(profile, progress)))
}

/// Daily streak check-in, called when the client comes to the foreground.
pub async fn check_streak(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let status = ledger::check_and_update_streak(&pool, &claims.sub, dates::today_utc()).await?;
    Ok(Json(StreakResponse {
        current_streak: status.current_streak,
        is_new_day: status.is_new_day,
        streak_broken: status.streak_broken,
        used_freeze: status.used_freeze,
        streak_bonus: levels::calculate_streak_bonus(status.current_streak),
    }))
}

/// Buys a streak freeze with XP. Insufficient XP is reported, not an error.
pub async fn purchase_streak_freeze(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let purchased = ledger::purchase_streak_freeze(&pool, &claims.sub).await?;
    let profile = ledger::fetch_profile(&pool, &claims.sub).await?;
    Ok(Json(FreezePurchaseResponse {
        purchased,
        xp: profile.xp,
        streak_freezes: profile.streak_freezes,
    }))
}

/// Restores hearts if the regeneration timer has elapsed; otherwise reports
/// the current count. Safe to call as often as the client likes.
pub async fn regen_hearts(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let hearts_remaining = ledger::check_heart_regen(&pool, &claims.sub).await?;
    Ok(Json(HeartsResponse { hearts_remaining }))
}

/// Achievements the current user has unlocked, oldest first.
pub async fn list_achievements(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let achievements = achievements::list_user_achievements(&pool, &claims.sub).await?;
    Ok(Json(achievements))
}
