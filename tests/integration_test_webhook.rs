mod common;

use axum::http::StatusCode;
use common::{parse_body, TestApp};
use serde_json::json;
use ticketing_backend::domain::models::job::{JOB_FAILURE_EMAIL, JOB_SHEET_SYNC, JOB_TICKET_EMAIL};

#[tokio::test]
async fn test_success_webhook_completes_booking_end_to_end() {
    let app = TestApp::new().await;

    let created = app.create_booking("SLANUP2025", "ultimate", 1).await;
    let order_id = created["booking"]["gateway_order_id"].as_str().unwrap().to_string();

    let payload = app.webhook_payload(&order_id, "1699.00", "pay_801", "SUCCESS");
    let response = app.post_json("/api/v1/payments/webhook", payload).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse_body(response).await["status"], "processed");

    let booking = parse_body(app.get(&format!("/api/v1/bookings/{}", order_id)).await).await;
    assert_eq!(booking["payment_status"], "completed");
    assert_eq!(booking["gateway_payment_id"], "pay_801");
    assert_eq!(booking["payment_method"], "UPI");
    assert!(booking["reference_number"].as_str().unwrap().starts_with("DIW"));

    app.run_jobs().await;

    assert_eq!(app.email.sent_count(), 1);
    assert_eq!(app.email.sent.lock().unwrap()[0].recipient, "asha@example.com");
    assert_eq!(app.sheet.rows.lock().unwrap().len(), 1);

    let booking = parse_body(app.get(&format!("/api/v1/bookings/{}", order_id)).await).await;
    assert_eq!(booking["email_sent"], true);

    // The code now reads as redeemed, with the same booking attached.
    let status = parse_body(app.post_json("/api/v1/invites/check", json!({"invite_code": "SLANUP2025"})).await).await;
    assert_eq!(status["is_used"], true);
    assert_eq!(status["booking"]["id"], booking["id"]);
}

#[tokio::test]
async fn test_webhook_replay_is_idempotent() {
    let app = TestApp::new().await;

    let created = app.create_booking("SLANUP2025", "ultimate", 1).await;
    let order_id = created["booking"]["gateway_order_id"].as_str().unwrap().to_string();

    let payload = app.webhook_payload(&order_id, "1699.00", "pay_802", "SUCCESS");

    let response = app.post_json("/api/v1/payments/webhook", payload.clone()).await;
    assert_eq!(parse_body(response).await["status"], "processed");

    let response = app.post_json("/api/v1/payments/webhook", payload.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse_body(response).await["status"], "already_processed");

    // Exactly one transition: one ticket-email job, one sheet-sync job.
    assert_eq!(app.job_statuses(JOB_TICKET_EMAIL).await.len(), 1);
    assert_eq!(app.job_statuses(JOB_SHEET_SYNC).await.len(), 1);

    app.run_jobs().await;
    assert_eq!(app.email.sent_count(), 1);

    let response = app.post_json("/api/v1/payments/webhook", payload).await;
    assert_eq!(parse_body(response).await["status"], "already_processed");
    app.run_jobs().await;
    assert_eq!(app.email.sent_count(), 1);
}

#[tokio::test]
async fn test_tampered_payload_is_rejected_without_mutation() {
    let app = TestApp::new().await;

    let created = app.create_booking("SLANUP2025", "ultimate", 1).await;
    let order_id = created["booking"]["gateway_order_id"].as_str().unwrap().to_string();

    let mut payload = app.webhook_payload(&order_id, "1699.00", "pay_803", "SUCCESS");
    payload["orderAmount"] = json!("1.00");

    let response = app.post_json("/api/v1/payments/webhook", payload).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let booking = parse_body(app.get(&format!("/api/v1/bookings/{}", order_id)).await).await;
    assert_eq!(booking["payment_status"], "pending");
    assert_eq!(app.job_statuses(JOB_TICKET_EMAIL).await.len(), 0);
}

#[tokio::test]
async fn test_garbage_signature_is_rejected() {
    let app = TestApp::new().await;

    let created = app.create_booking("SLANUP2025", "ultimate", 1).await;
    let order_id = created["booking"]["gateway_order_id"].as_str().unwrap().to_string();

    let mut payload = app.webhook_payload(&order_id, "1699.00", "pay_804", "SUCCESS");
    payload["signature"] = json!("not base64 at all!!!");

    let response = app.post_json("/api/v1/payments/webhook", payload).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_shape_never_reaches_reconciliation() {
    let app = TestApp::new().await;

    let response = app.post_json("/api/v1/payments/webhook", json!({
        "orderId": "whatever",
        "txStatus": "SUCCESS",
    })).await;

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_webhook_for_unknown_order_is_404() {
    let app = TestApp::new().await;

    let payload = app.webhook_payload("no-such-order", "1699.00", "pay_805", "SUCCESS");
    let response = app.post_json("/api/v1/payments/webhook", payload).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_failed_webhook_marks_failed_and_notifies_once() {
    let app = TestApp::new().await;

    let created = app.create_booking("SLANUP2025", "ultimate", 1).await;
    let order_id = created["booking"]["gateway_order_id"].as_str().unwrap().to_string();

    let payload = app.webhook_payload(&order_id, "1699.00", "pay_806", "FAILED");
    let response = app.post_json("/api/v1/payments/webhook", payload.clone()).await;
    assert_eq!(parse_body(response).await["status"], "processed");

    let booking = parse_body(app.get(&format!("/api/v1/bookings/{}", order_id)).await).await;
    assert_eq!(booking["payment_status"], "failed");

    app.run_jobs().await;
    assert_eq!(app.email.sent_count(), 1);
    assert_eq!(app.job_statuses(JOB_FAILURE_EMAIL).await, vec!["COMPLETED"]);
    assert_eq!(app.job_statuses(JOB_TICKET_EMAIL).await.len(), 0);

    // A retried failure webhook must not re-send the notice.
    let response = app.post_json("/api/v1/payments/webhook", payload).await;
    assert_eq!(parse_body(response).await["status"], "already_processed");
    app.run_jobs().await;
    assert_eq!(app.email.sent_count(), 1);

    // A failed payment frees the code for another attempt.
    let status = parse_body(app.post_json("/api/v1/invites/check", json!({"invite_code": "SLANUP2025"})).await).await;
    assert_eq!(status["is_used"], false);
}

#[tokio::test]
async fn test_non_terminal_webhook_status_is_ignored_not_recorded() {
    let app = TestApp::new().await;

    let created = app.create_booking("SLANUP2025", "ultimate", 1).await;
    let order_id = created["booking"]["gateway_order_id"].as_str().unwrap().to_string();

    let payload = app.webhook_payload(&order_id, "1699.00", "pay_807", "FLAGGED");
    let response = app.post_json("/api/v1/payments/webhook", payload).await;
    assert_eq!(parse_body(response).await["status"], "ignored");

    // A later terminal retry with the same reference must still apply.
    let payload = app.webhook_payload(&order_id, "1699.00", "pay_807", "SUCCESS");
    let response = app.post_json("/api/v1/payments/webhook", payload).await;
    assert_eq!(parse_body(response).await["status"], "processed");

    let booking = parse_body(app.get(&format!("/api/v1/bookings/{}", order_id)).await).await;
    assert_eq!(booking["payment_status"], "completed");
}
