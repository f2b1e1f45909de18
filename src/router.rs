use crate::{handlers, state::AppState};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub fn app(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/employers/{employer_id}/work-types",
            get(handlers::list_work_types).post(handlers::create_work_type),
        )
        .route(
            "/api/work-types/{id}",
            get(handlers::get_work_type)
                .patch(handlers::update_work_type)
                .delete(handlers::delete_work_type),
        )
        .route(
            "/api/work-types/{id}/job-posts",
            get(handlers::list_job_posts_for_work_type),
        )
        .route(
            "/api/employers/{employer_id}/job-posts",
            get(handlers::list_job_posts).post(handlers::create_job_post),
        )
        .route(
            "/api/job-posts/{id}",
            get(handlers::get_job_post)
                .patch(handlers::update_job_post)
                .delete(handlers::delete_job_post),
        )
        .route(
            "/api/job-posts/{id}/matches/{worker_id}",
            get(handlers::match_job_post),
        )
        .route(
            "/api/workers/{worker_id}/availability",
            get(handlers::get_availability).put(handlers::replace_availability),
        )
        .route(
            "/api/workers/{worker_id}/recommendations",
            get(handlers::recommend_job_posts),
        )
        .route("/api/matching/score", post(handlers::score_slots))
        .route("/api/grid/click", post(handlers::grid_click))
        .route("/api/grid/drag", post(handlers::grid_drag))
        .route("/api/saves/{kind}/{id}", get(handlers::save_status))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, save_state};
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn test_app() -> (Router, AppState) {
        let state = AppState::new(db::test_pool().await);
        (app(state.clone()), state)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();
        app.clone().oneshot(request).await.unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn work_type_crud() {
        let (app, _) = test_app().await;
        let created = send(
            &app,
            Method::POST,
            "/api/employers/emp-1/work-types",
            Some(json!({
                "name": "Weekday mornings",
                "hourlyWage": 1100,
                "timeSlots": [{"day": "monday", "start": 9, "end": 13, "priority": 1}]
            })),
        )
        .await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let created = body_json(created).await;
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["timeSlots"][0]["day"], 1);
        assert_eq!(created["isActive"], true);

        let patched = send(
            &app,
            Method::PATCH,
            &format!("/api/work-types/{id}"),
            Some(json!({"hourlyWage": 1300})),
        )
        .await;
        assert_eq!(patched.status(), StatusCode::OK);
        assert_eq!(body_json(patched).await["hourlyWage"], 1300);

        let listed = body_json(send(&app, Method::GET, "/api/employers/emp-1/work-types", None).await).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let deleted = send(&app, Method::DELETE, &format!("/api/work-types/{id}"), None).await;
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
        let missing = send(&app, Method::GET, &format!("/api/work-types/{id}"), None).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn validation_fails_before_the_store() {
        let (app, _) = test_app().await;
        let blank = send(
            &app,
            Method::POST,
            "/api/employers/emp-1/work-types",
            Some(json!({"name": "  "})),
        )
        .await;
        assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(blank).await["code"], "VALIDATION_ERROR");

        let bad_slot = send(
            &app,
            Method::POST,
            "/api/employers/emp-1/work-types",
            Some(json!({"name": "Late", "timeSlots": [{"day": 2, "start": 22, "end": 20}]})),
        )
        .await;
        assert_eq!(bad_slot.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(bad_slot).await["code"], "INVALID_SLOT");

        let listed = body_json(send(&app, Method::GET, "/api/employers/emp-1/work-types", None).await).await;
        assert!(listed.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn availability_is_replaced_and_read_back_merged() {
        let (app, _) = test_app().await;
        let saved = send(
            &app,
            Method::PUT,
            "/api/workers/w-1/availability",
            Some(json!({"slots": [
                {"day": 1, "start": 9, "end": 11, "priority": 1},
                {"day": 1, "start": 11, "end": 12, "priority": 2}
            ]})),
        )
        .await;
        assert_eq!(saved.status(), StatusCode::OK);

        let view = body_json(send(&app, Method::GET, "/api/workers/w-1/availability", None).await).await;
        assert_eq!(view["records"].as_array().unwrap().len(), 3);
        assert_eq!(
            view["slots"],
            json!([
                {"day": 1, "start": 9, "end": 11, "priority": 1},
                {"day": 1, "start": 11, "end": 12, "priority": 2}
            ])
        );
    }

    #[tokio::test]
    async fn overlapping_availability_is_saved_once_per_hour() {
        let (app, _) = test_app().await;
        let saved = send(
            &app,
            Method::PUT,
            "/api/workers/w-3/availability",
            Some(json!({"slots": [
                {"day": 1, "start": 9, "end": 11, "priority": 2},
                {"day": 1, "start": 10, "end": 12, "priority": 1}
            ]})),
        )
        .await;
        assert_eq!(saved.status(), StatusCode::OK);

        let view = body_json(send(&app, Method::GET, "/api/workers/w-3/availability", None).await).await;
        let records = view["records"].as_array().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records.iter().filter(|r| r["hour"] == 10).count(), 1);
        assert_eq!(
            view["slots"],
            json!([
                {"day": 1, "start": 9, "end": 10, "priority": 2},
                {"day": 1, "start": 10, "end": 12, "priority": 1}
            ])
        );
    }

    #[tokio::test]
    async fn job_post_match_and_recommendations() {
        let (app, _) = test_app().await;
        let work_type = body_json(
            send(
                &app,
                Method::POST,
                "/api/employers/emp-1/work-types",
                Some(json!({"name": "Day shift", "timeSlots": [{"day": 1, "start": 9, "end": 17}]})),
            )
            .await,
        )
        .await;
        let post = body_json(
            send(
                &app,
                Method::POST,
                "/api/employers/emp-1/job-posts",
                Some(json!({"title": "Cashier", "workTypeId": work_type["id"]})),
            )
            .await,
        )
        .await;
        send(
            &app,
            Method::PUT,
            "/api/workers/w-1/availability",
            Some(json!({"slots": [
                {"day": 1, "start": 9, "end": 13, "priority": 1},
                {"day": 1, "start": 13, "end": 17, "priority": 2}
            ]})),
        )
        .await;

        let uri = format!("/api/job-posts/{}/matches/w-1", post["id"].as_str().unwrap());
        let report = body_json(send(&app, Method::GET, &uri, None).await).await;
        assert_eq!(report["percentage"]["score"], 100);
        assert_eq!(report["percentage"]["matchedSlots"], 1);
        assert_eq!(report["percentage"]["totalSlots"], 1);
        assert_eq!(report["weightedScore"], 12);

        let ranked = body_json(send(&app, Method::GET, "/api/workers/w-1/recommendations", None).await).await;
        assert_eq!(ranked[0]["candidate"]["workTypeName"], "Day shift");
        assert_eq!(ranked[0]["report"]["percentage"]["score"], 100);
    }

    #[tokio::test]
    async fn dangling_work_type_scores_zero() {
        let (app, _) = test_app().await;
        let post = body_json(
            send(
                &app,
                Method::POST,
                "/api/employers/emp-1/job-posts",
                Some(json!({"title": "Ghost", "workTypeId": "missing"})),
            )
            .await,
        )
        .await;
        let uri = format!("/api/job-posts/{}/matches/w-1", post["id"].as_str().unwrap());
        let response = send(&app, Method::GET, &uri, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let report = body_json(response).await;
        assert_eq!(report["percentage"]["score"], 0);
        assert_eq!(report["weightedScore"], 0);
    }

    #[tokio::test]
    async fn ad_hoc_scoring() {
        let (app, _) = test_app().await;
        let report = body_json(
            send(
                &app,
                Method::POST,
                "/api/matching/score",
                Some(json!({
                    "requirements": [{"day": "Tue", "start": 8, "end": 10}, {"day": 3, "start": 8, "end": 10}],
                    "availability": [{"day": 2, "start": 9, "end": 12, "priority": 2}]
                })),
            )
            .await,
        )
        .await;
        assert_eq!(report["percentage"]["score"], 50);
        assert_eq!(report["weightedScore"], 1);
    }

    #[tokio::test]
    async fn grid_click_and_drag() {
        let (app, _) = test_app().await;
        let clicked = body_json(
            send(
                &app,
                Method::POST,
                "/api/grid/click",
                Some(json!({"slots": [{"day": 0, "start": 8, "end": 9, "priority": 1}], "day": 0, "hour": 8})),
            )
            .await,
        )
        .await;
        assert_eq!(clicked["slots"], json!([{"day": 0, "start": 8, "end": 9, "priority": 2}]));

        let dragged = body_json(
            send(
                &app,
                Method::POST,
                "/api/grid/drag",
                Some(json!({"anchor": {"day": 2, "hour": 5}, "current": {"day": 2, "hour": 7}})),
            )
            .await,
        )
        .await;
        assert_eq!(dragged["slots"].as_array().unwrap().len(), 3);
        assert_eq!(dragged["merged"], json!([{"day": 2, "start": 5, "end": 8, "priority": 1}]));

        let out_of_range = send(
            &app,
            Method::POST,
            "/api/grid/click",
            Some(json!({"day": 0, "hour": 24})),
        )
        .await;
        assert_eq!(out_of_range.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn concurrent_save_of_the_same_entity_conflicts() {
        let (app, state) = test_app().await;
        let _in_flight = state
            .saves
            .begin(save_state::EntityKey::new(save_state::EntityKind::Availability, "w-1"))
            .unwrap();

        let response = send(
            &app,
            Method::PUT,
            "/api/workers/w-1/availability",
            Some(json!({"slots": []})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let status = body_json(send(&app, Method::GET, "/api/saves/availability/w-1", None).await).await;
        assert_eq!(status["state"], "saving");
    }

    #[tokio::test]
    async fn save_state_returns_to_idle_after_success() {
        let (app, _) = test_app().await;
        send(
            &app,
            Method::PUT,
            "/api/workers/w-2/availability",
            Some(json!({"slots": [{"day": 4, "start": 10, "end": 11}]})),
        )
        .await;
        let status = body_json(send(&app, Method::GET, "/api/saves/availability/w-2", None).await).await;
        assert_eq!(status["state"], "idle");
    }
}
