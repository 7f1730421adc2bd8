use actix_web::{middleware, web, App, HttpRequest, HttpResponse, HttpServer, Result};
use chrono::Utc;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::info;

use crate::config::ExerciseConfig;
use crate::display::msel_to_bytes;
use crate::narrative::NarrativeBackend;
use crate::schedule::{generate_exercise, ExerciseSchedule, ScheduleSummary};

/// A generated exercise kept in memory for the history page.
pub struct StoredExercise {
    pub id: u64,
    pub created_at: String,
    pub schedule: ExerciseSchedule,
}

#[derive(Default)]
pub struct ExerciseHistory {
    next_id: u64,
    records: Vec<StoredExercise>,
}

impl ExerciseHistory {
    pub fn insert(&mut self, schedule: ExerciseSchedule) -> u64 {
        self.next_id += 1;
        self.records.push(StoredExercise {
            id: self.next_id,
            created_at: Utc::now().to_rfc3339(),
            schedule,
        });
        self.next_id
    }

    pub fn get(&self, id: u64) -> Option<&StoredExercise> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

// In-memory storage (durable storage is handled elsewhere)
pub struct AppState {
    pub history: Mutex<ExerciseHistory>,
    pub generator: NarrativeBackend,
    pub admin_password: String,
}

#[derive(Deserialize)]
pub struct GenerateRequest {
    #[serde(flatten)]
    pub config: ExerciseConfig,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Serialize)]
pub struct GenerateResponse {
    success: bool,
    id: u64,
    summary: ScheduleSummary,
}

#[derive(Serialize)]
pub struct ExerciseListItem {
    id: u64,
    name: String,
    created_at: String,
    duration: u32,
    environment: String,
    total_cases: usize,
}

#[derive(Serialize)]
pub struct ExerciseListResponse {
    exercises: Vec<ExerciseListItem>,
}

fn lock_error() -> actix_web::Error {
    actix_web::error::ErrorInternalServerError("exercise history unavailable")
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({"success": false, "error": "Exercise not found"}))
}

// Generate an exercise from a posted configuration
async fn create_exercise(
    req: web::Json<GenerateRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let GenerateRequest { config, seed } = req.into_inner();
    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let schedule = match generate_exercise(&config, &state.generator, &mut rng).await {
        Ok(schedule) => schedule,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": e.to_string()
            })))
        }
    };

    let summary = schedule.summary.clone();
    let id = state.history.lock().map_err(|_| lock_error())?.insert(schedule);
    info!(id, exercise = %config.exercise_name, "exercise stored");

    Ok(HttpResponse::Ok().json(GenerateResponse {
        success: true,
        id,
        summary,
    }))
}

// History list
async fn list_exercises(state: web::Data<AppState>) -> Result<HttpResponse> {
    let history = state.history.lock().map_err(|_| lock_error())?;
    let exercises = history
        .records
        .iter()
        .rev()
        .map(|r| ExerciseListItem {
            id: r.id,
            name: r.schedule.exercise_name.clone(),
            created_at: r.created_at.clone(),
            duration: r.schedule.duration,
            environment: r.schedule.environment.clone(),
            total_cases: r.schedule.summary.total_cases,
        })
        .collect();

    Ok(HttpResponse::Ok().json(ExerciseListResponse { exercises }))
}

async fn get_schedule(id: web::Path<u64>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let history = state.history.lock().map_err(|_| lock_error())?;
    match history.get(id.into_inner()) {
        Some(record) => Ok(HttpResponse::Ok().json(&record.schedule.entries)),
        None => Ok(not_found()),
    }
}

async fn get_cases(id: web::Path<u64>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let history = state.history.lock().map_err(|_| lock_error())?;
    match history.get(id.into_inner()) {
        Some(record) => Ok(HttpResponse::Ok().json(&record.schedule.cases)),
        None => Ok(not_found()),
    }
}

// MSEL download as CSV
async fn get_msel(id: web::Path<u64>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let history = state.history.lock().map_err(|_| lock_error())?;
    let Some(record) = history.get(id.into_inner()) else {
        return Ok(not_found());
    };

    let bytes = msel_to_bytes(&record.schedule.entries)
        .map_err(|e| actix_web::error::ErrorInternalServerError(format!("Failed to render MSEL: {}", e)))?;
    let filename = format!("{}_MSEL.csv", record.schedule.exercise_name.replace(' ', "_"));

    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(bytes))
}

// Admin: clear history
async fn clear_exercises(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    let password = req
        .headers()
        .get("X-Admin-Password")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if password != state.admin_password {
        return Ok(HttpResponse::Unauthorized().json(serde_json::json!({"success": false, "error": "Unauthorized"})));
    }

    state.history.lock().map_err(|_| lock_error())?.clear();
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/exercises", web::post().to(create_exercise))
        .route("/api/exercises", web::get().to(list_exercises))
        .route("/api/exercises", web::delete().to(clear_exercises))
        .route("/api/exercises/{id}/schedule", web::get().to(get_schedule))
        .route("/api/exercises/{id}/cases", web::get().to(get_cases))
        .route("/api/exercises/{id}/msel", web::get().to(get_msel));
}

pub async fn start_server(
    port: u16,
    admin_password: String,
    generator: NarrativeBackend,
) -> std::io::Result<()> {
    let app_state = web::Data::new(AppState {
        history: Mutex::new(ExerciseHistory::default()),
        generator,
        admin_password,
    });

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
