//! Smoke run against a live server: `cargo run` in one shell, then
//! `cargo test --test quick_dev -- --ignored --nocapture` in another.

use anyhow::Result;
use serde_json::json;

#[tokio::test]
#[ignore]
async fn quick_dev() -> Result<()> {
    let hc = httpc_test::new_client("http://localhost:3000")?;

    hc.do_put(
        "/api/workers/demo-worker/availability",
        json!({"slots": [
            {"day": "monday", "start": 9, "end": 13, "priority": 1},
            {"day": "monday", "start": 13, "end": 17, "priority": 2}
        ]}),
    )
    .await?
    .print()
    .await?;

    hc.do_post(
        "/api/employers/demo-employer/work-types",
        json!({"name": "Day shift", "hourlyWage": 1200, "timeSlots": [{"day": 1, "start": 9, "end": 17}]}),
    )
    .await?
    .print()
    .await?;

    hc.do_get("/api/workers/demo-worker/recommendations")
        .await?
        .print()
        .await?;

    Ok(())
}
