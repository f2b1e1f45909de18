use crate::{
    availability::{self, WorkerAvailability},
    db,
    error::AppError,
    grid::{GridCell, ScheduleGrid},
    matching::{self, MatchReport, RankedMatch},
    models::{JobPost, JobPostPatch, NewJobPost, NewWorkType, WorkType, WorkTypePatch},
    save_state::{EntityKey, EntityKind, SaveState},
    slots::{self, Day, TimeSlot},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

fn require_text(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

fn require_wage(wage: i64) -> Result<(), AppError> {
    if wage < 0 {
        return Err(AppError::BadRequest("hourlyWage cannot be negative".to_string()));
    }
    Ok(())
}

fn work_type_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("work type {id} does not exist"))
}

fn job_post_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("job post {id} does not exist"))
}

// work types

pub async fn list_work_types(
    State(app_state): State<AppState>,
    Path(employer_id): Path<String>,
) -> Result<Json<Vec<WorkType>>, AppError> {
    db::list_work_types_by_employer(&app_state.pool, &employer_id)
        .await
        .map(Json)
}

pub async fn create_work_type(
    State(app_state): State<AppState>,
    Path(employer_id): Path<String>,
    Json(payload): Json<NewWorkType>,
) -> Result<(StatusCode, Json<WorkType>), AppError> {
    require_text(&payload.name, "name")?;
    require_wage(payload.hourly_wage)?;
    slots::validate_all(&payload.time_slots)?;

    let work_type = db::create_work_type(&app_state.pool, &employer_id, &payload).await?;
    tracing::info!(id = %work_type.id, employer = %employer_id, slots = work_type.time_slots.len(), "work type created");
    Ok((StatusCode::CREATED, Json(work_type)))
}

pub async fn get_work_type(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WorkType>, AppError> {
    db::get_work_type(&app_state.pool, &id)
        .await?
        .map(Json)
        .ok_or_else(|| work_type_not_found(&id))
}

pub async fn update_work_type(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<WorkTypePatch>,
) -> Result<Json<WorkType>, AppError> {
    if let Some(name) = &patch.name {
        require_text(name, "name")?;
    }
    if let Some(wage) = patch.hourly_wage {
        require_wage(wage)?;
    }
    if let Some(time_slots) = &patch.time_slots {
        slots::validate_all(time_slots)?;
    }

    let guard = app_state.saves.begin(EntityKey::new(EntityKind::WorkType, &id))?;
    let updated = guard.settle(db::update_work_type(&app_state.pool, &id, &patch).await)?;
    updated.map(Json).ok_or_else(|| work_type_not_found(&id))
}

pub async fn delete_work_type(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let guard = app_state.saves.begin(EntityKey::new(EntityKind::WorkType, &id))?;
    if guard.settle(db::delete_work_type(&app_state.pool, &id).await)? {
        tracing::info!(%id, "work type deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(work_type_not_found(&id))
    }
}

// job posts

pub async fn list_job_posts(
    State(app_state): State<AppState>,
    Path(employer_id): Path<String>,
) -> Result<Json<Vec<JobPost>>, AppError> {
    db::list_job_posts_by_employer(&app_state.pool, &employer_id)
        .await
        .map(Json)
}

pub async fn list_job_posts_for_work_type(
    State(app_state): State<AppState>,
    Path(work_type_id): Path<String>,
) -> Result<Json<Vec<JobPost>>, AppError> {
    db::list_job_posts_by_work_type(&app_state.pool, &work_type_id)
        .await
        .map(Json)
}

pub async fn create_job_post(
    State(app_state): State<AppState>,
    Path(employer_id): Path<String>,
    Json(payload): Json<NewJobPost>,
) -> Result<(StatusCode, Json<JobPost>), AppError> {
    require_text(&payload.title, "title")?;
    let post = db::create_job_post(&app_state.pool, &employer_id, &payload).await?;
    tracing::info!(id = %post.id, employer = %employer_id, "job post created");
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_job_post(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobPost>, AppError> {
    db::get_job_post(&app_state.pool, &id)
        .await?
        .map(Json)
        .ok_or_else(|| job_post_not_found(&id))
}

pub async fn update_job_post(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<JobPostPatch>,
) -> Result<Json<JobPost>, AppError> {
    if let Some(title) = &patch.title {
        require_text(title, "title")?;
    }
    let guard = app_state.saves.begin(EntityKey::new(EntityKind::JobPost, &id))?;
    let updated = guard.settle(db::update_job_post(&app_state.pool, &id, &patch).await)?;
    updated.map(Json).ok_or_else(|| job_post_not_found(&id))
}

pub async fn delete_job_post(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let guard = app_state.saves.begin(EntityKey::new(EntityKind::JobPost, &id))?;
    if guard.settle(db::delete_job_post(&app_state.pool, &id).await)? {
        tracing::info!(%id, "job post deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(job_post_not_found(&id))
    }
}

// availability

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityView {
    worker_id: String,
    records: Vec<WorkerAvailability>,
    slots: Vec<TimeSlot>,
}

impl AvailabilityView {
    fn new(worker_id: String, records: Vec<WorkerAvailability>) -> Self {
        let slots = availability::compress_merged(&records);
        Self {
            worker_id,
            records,
            slots,
        }
    }
}

pub async fn get_availability(
    State(app_state): State<AppState>,
    Path(worker_id): Path<String>,
) -> Result<Json<AvailabilityView>, AppError> {
    let records = db::get_worker_availability(&app_state.pool, &worker_id).await?;
    Ok(Json(AvailabilityView::new(worker_id, records)))
}

#[derive(Deserialize)]
pub struct AvailabilityPayload {
    slots: Vec<TimeSlot>,
}

pub async fn replace_availability(
    State(app_state): State<AppState>,
    Path(worker_id): Path<String>,
    Json(payload): Json<AvailabilityPayload>,
) -> Result<Json<AvailabilityView>, AppError> {
    slots::validate_all(&payload.slots)?;

    let guard = app_state
        .saves
        .begin(EntityKey::new(EntityKind::Availability, &worker_id))?;
    let records = guard.settle(
        db::replace_worker_availability(&app_state.pool, &worker_id, &payload.slots).await,
    )?;
    tracing::info!(worker = %worker_id, hours = records.len(), "availability replaced");
    Ok(Json(AvailabilityView::new(worker_id, records)))
}

// matching

/// A missing or dangling work type reference scores as an empty schedule.
async fn requirements_for(app_state: &AppState, post: &JobPost) -> Result<Vec<TimeSlot>, AppError> {
    let Some(work_type_id) = post.work_type_id.as_deref() else {
        return Ok(Vec::new());
    };
    match db::get_work_type(&app_state.pool, work_type_id).await? {
        Some(work_type) => Ok(work_type.time_slots),
        None => {
            tracing::warn!(job_post = %post.id, %work_type_id, "job post references a missing work type");
            Ok(Vec::new())
        }
    }
}

pub async fn match_job_post(
    State(app_state): State<AppState>,
    Path((id, worker_id)): Path<(String, String)>,
) -> Result<Json<MatchReport>, AppError> {
    let post = db::get_job_post(&app_state.pool, &id)
        .await?
        .ok_or_else(|| job_post_not_found(&id))?;
    let requirements = requirements_for(&app_state, &post).await?;
    let availability = db::get_worker_availability(&app_state.pool, &worker_id).await?;

    let report = matching::report(&requirements, &availability);
    tracing::debug!(job_post = %id, worker = %worker_id, score = report.percentage.score, weighted = report.weighted_score, "match computed");
    Ok(Json(report))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    job_post: JobPost,
    work_type_name: String,
}

pub async fn recommend_job_posts(
    State(app_state): State<AppState>,
    Path(worker_id): Path<String>,
) -> Result<Json<Vec<RankedMatch<Recommendation>>>, AppError> {
    let availability = db::get_worker_availability(&app_state.pool, &worker_id).await?;
    let candidates = db::list_open_job_posts(&app_state.pool)
        .await?
        .into_iter()
        .map(|(job_post, work_type)| {
            let recommendation = Recommendation {
                job_post,
                work_type_name: work_type.name,
            };
            (recommendation, work_type.time_slots)
        });
    Ok(Json(matching::rank_matches(&availability, candidates)))
}

#[derive(Deserialize)]
pub struct ScorePayload {
    requirements: Vec<TimeSlot>,
    availability: Vec<TimeSlot>,
}

pub async fn score_slots(Json(payload): Json<ScorePayload>) -> Result<Json<MatchReport>, AppError> {
    slots::validate_all(&payload.requirements)?;
    slots::validate_all(&payload.availability)?;
    let records = availability::expand(&payload.availability);
    Ok(Json(matching::report(&payload.requirements, &records)))
}

// grid

#[derive(Deserialize)]
pub struct CellPayload {
    day: Day,
    hour: i64,
}

impl TryFrom<&CellPayload> for GridCell {
    type Error = AppError;

    fn try_from(payload: &CellPayload) -> Result<Self, Self::Error> {
        Ok(GridCell::new(payload.day, payload.hour)?)
    }
}

#[derive(Deserialize)]
pub struct ClickPayload {
    #[serde(default)]
    slots: Vec<TimeSlot>,
    day: Day,
    hour: i64,
}

#[derive(Deserialize)]
pub struct DragPayload {
    #[serde(default)]
    slots: Vec<TimeSlot>,
    anchor: CellPayload,
    current: CellPayload,
}

#[derive(Debug, Serialize)]
pub struct GridView {
    slots: Vec<TimeSlot>,
    merged: Vec<TimeSlot>,
}

impl From<&ScheduleGrid> for GridView {
    fn from(grid: &ScheduleGrid) -> Self {
        Self {
            slots: grid.slots(),
            merged: grid.merged_slots(),
        }
    }
}

pub async fn grid_click(Json(payload): Json<ClickPayload>) -> Result<Json<GridView>, AppError> {
    slots::validate_all(&payload.slots)?;
    let mut grid = ScheduleGrid::new(&payload.slots);
    grid.click(GridCell::new(payload.day, payload.hour)?);
    Ok(Json(GridView::from(&grid)))
}

pub async fn grid_drag(Json(payload): Json<DragPayload>) -> Result<Json<GridView>, AppError> {
    slots::validate_all(&payload.slots)?;
    let mut grid = ScheduleGrid::new(&payload.slots);
    grid.pointer_down(GridCell::try_from(&payload.anchor)?);
    grid.pointer_move(GridCell::try_from(&payload.current)?);
    grid.pointer_up();
    Ok(Json(GridView::from(&grid)))
}

// saves

pub async fn save_status(
    State(app_state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<SaveState>, AppError> {
    let kind: EntityKind = kind.parse()?;
    Ok(Json(app_state.saves.state_of(&EntityKey::new(kind, id))))
}
