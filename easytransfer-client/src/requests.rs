//! Transfer request endpoints

use crate::TransferClient;
use crate::error::Result;
use easytransfer_core::domain::job::{FetchResult, JobOutcome};
use easytransfer_core::dto::request::{NextRequestResponse, RequestStatus, ResultReport};
use tracing::debug;

impl TransferClient {
    // =============================================================================
    // Polling
    // =============================================================================

    /// Fetch the next pending transfer request
    ///
    /// Never fails: every network or parse problem is folded into the
    /// returned `FetchResult`. Failures where nothing was received are
    /// `TransportError`; anything the server did answer but which cannot be
    /// trusted (error status, non-JSON body, unknown status) is `ProtocolError`.
    pub async fn fetch_next_request(&self) -> FetchResult {
        match self.next_request_body().await {
            Ok(body) => NextRequestResponse::parse(&body),
            Err(e) if e.is_transport() => FetchResult::TransportError(e.to_string()),
            Err(e) => FetchResult::ProtocolError(e.to_string()),
        }
    }

    async fn next_request_body(&self) -> Result<String> {
        let response = self.get("/requests/next").send().await?;

        self.handle_text_response(response).await
    }

    // =============================================================================
    // Reporting
    // =============================================================================

    /// Report the terminal outcome of a transfer request
    ///
    /// # Arguments
    /// * `request_id` - The server's id for the request
    /// * `outcome` - What happened when the session ran
    ///
    /// # Returns
    /// The HTTP status code the server acknowledged with
    pub async fn report_result(&self, request_id: i64, outcome: &JobOutcome) -> Result<u16> {
        let path = format!("/requests/{}/result", request_id);
        let body = ResultReport::from(outcome);

        debug!("Reporting {} for request {}", body.status, request_id);

        let response = self.post(&path).json(&body).send().await?;

        self.handle_empty_response(response).await
    }

    // =============================================================================
    // Query
    // =============================================================================

    /// Get the server-side status of a transfer request
    pub async fn get_request_status(&self, request_id: i64) -> Result<RequestStatus> {
        let path = format!("/requests/status/{}", request_id);
        let response = self.get(&path).send().await?;

        self.handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server;
    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use easytransfer_core::domain::job::Job;
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    /// Requests the fake server saw: (path id, authorization header, body)
    type Seen = Arc<Mutex<Vec<(i64, String, Value)>>>;

    fn auth_header(headers: &HeaderMap) -> String {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    async fn serve_next(status: StatusCode, body: &'static str) -> String {
        let app = Router::new().route(
            "/requests/next",
            get(move |headers: HeaderMap| async move {
                if auth_header(&headers) != "Bearer token" {
                    return (StatusCode::UNAUTHORIZED, "missing token".to_string());
                }
                (status, body.to_string())
            }),
        );
        test_server::spawn(app).await
    }

    #[tokio::test]
    async fn test_fetch_empty() {
        let url = serve_next(StatusCode::OK, r#"{"status":"empty","message":"m"}"#).await;
        let client = TransferClient::new(url, "token");

        assert_eq!(
            client.fetch_next_request().await,
            FetchResult::NoJob("m".to_string())
        );
    }

    #[tokio::test]
    async fn test_fetch_job() {
        let url = serve_next(
            StatusCode::OK,
            r#"{"status":"ok","request_id":7,"amount":50.0,"phone_number":"0912345678"}"#,
        )
        .await;
        let client = TransferClient::new(url, "token");

        assert_eq!(
            client.fetch_next_request().await,
            FetchResult::Job(Job {
                request_id: 7,
                amount: 50.0,
                phone_number: "0912345678".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_fetch_sends_bearer_token() {
        let url = serve_next(StatusCode::OK, r#"{"status":"empty","message":"m"}"#).await;
        let client = TransferClient::new(url, "wrong");

        let result = client.fetch_next_request().await;
        assert!(matches!(result, FetchResult::ProtocolError(ref e) if e.contains("401")));
    }

    #[tokio::test]
    async fn test_fetch_malformed_body_is_protocol_error() {
        let url = serve_next(StatusCode::OK, "<html>oops</html>").await;
        let client = TransferClient::new(url, "token");

        assert!(matches!(
            client.fetch_next_request().await,
            FetchResult::ProtocolError(_)
        ));
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_protocol_error() {
        let url = serve_next(StatusCode::INTERNAL_SERVER_ERROR, "boom").await;
        let client = TransferClient::new(url, "token");

        assert!(matches!(
            client.fetch_next_request().await,
            FetchResult::ProtocolError(_)
        ));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_server_is_transport_error() {
        let url = test_server::closed_port_url().await;
        let client = TransferClient::new(url, "token");

        assert!(matches!(
            client.fetch_next_request().await,
            FetchResult::TransportError(_)
        ));
    }

    #[tokio::test]
    async fn test_fetch_repeated_empty_never_fabricates_job() {
        let url = serve_next(StatusCode::OK, r#"{"status":"empty","message":"m"}"#).await;
        let client = TransferClient::new(url, "token");

        for _ in 0..3 {
            assert!(matches!(
                client.fetch_next_request().await,
                FetchResult::NoJob(_)
            ));
        }
    }

    async fn serve_results(seen: Seen) -> String {
        let app = Router::new()
            .route(
                "/requests/{id}/result",
                post(
                    |State(seen): State<Seen>,
                     Path(id): Path<i64>,
                     headers: HeaderMap,
                     Json(body): Json<Value>| async move {
                        let status = body["status"].as_str().unwrap_or_default().to_string();
                        seen.lock().unwrap().push((id, auth_header(&headers), body));
                        Json(json!({"request_id": id, "final_status": status}))
                    },
                ),
            )
            .with_state(seen);
        test_server::spawn(app).await
    }

    #[tokio::test]
    async fn test_report_success() {
        let seen = Seen::default();
        let url = serve_results(seen.clone()).await;
        let client = TransferClient::new(url, "token");

        let code = client
            .report_result(7, &JobOutcome::Success("Balance sent".to_string()))
            .await
            .unwrap();
        assert_eq!(code, 200);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, 7);
        assert_eq!(seen[0].1, "Bearer token");
        assert_eq!(
            seen[0].2,
            json!({"status": "Success", "message": "Balance sent"})
        );
    }

    #[tokio::test]
    async fn test_report_permission_denied() {
        let seen = Seen::default();
        let url = serve_results(seen.clone()).await;
        let client = TransferClient::new(url, "token");

        client
            .report_result(9, &JobOutcome::permission_denied())
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].0, 9);
        assert_eq!(
            seen[0].2,
            json!({"status": "Failed", "message": "Permission denied"})
        );
    }

    #[tokio::test]
    async fn test_report_to_unreachable_server_fails() {
        let url = test_server::closed_port_url().await;
        let client = TransferClient::new(url, "token");

        let err = client
            .report_result(1, &JobOutcome::failure_code(-1))
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_request_status() {
        let app = Router::new().route(
            "/requests/status/{id}",
            get(|Path(id): Path<i64>| async move {
                if id != 7 {
                    return Err(StatusCode::NOT_FOUND);
                }
                Ok(Json(json!({
                    "request_id": 7,
                    "phone_number": "0912345678",
                    "amount": 50,
                    "status": "Success"
                })))
            }),
        );
        let client = TransferClient::new(test_server::spawn(app).await, "token");

        let status = client.get_request_status(7).await.unwrap();
        assert_eq!(status.status, "Success");
        assert_eq!(status.amount, 50.0);

        let err = client.get_request_status(8).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
