use axum::{extract::State, http::StatusCode, Json};
use soudan_api_structs::get_service_health::APIResponse;
use soudan_infra::SoudanContext;

/// Get the status of the service
pub async fn status_controller(
    State(ctx): State<SoudanContext>,
) -> Result<Json<APIResponse>, (StatusCode, Json<APIResponse>)> {
    match ctx.repos.status.check_connection().await {
        Ok(_) => Ok(Json(APIResponse {
            message: "Ok!\r\n".into(),
        })),
        Err(_) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(APIResponse {
                message: "Internal Server Error".into(),
            }),
        )),
    }
}
