use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Router,
};

use crate::api::rest::handlers::{self, VapidPublicKey};
use crate::domain::service::Service;

/// Room for base64 inflation (4/3) plus JSON framing around the screenshot.
fn screen_body_limit(max_screenshot_bytes: usize) -> usize {
    max_screenshot_bytes / 3 * 4 + 64 * 1024
}

pub fn register_routes(
    router: Router,
    service: Arc<Service>,
    vapid: VapidPublicKey,
    max_screenshot_bytes: usize,
) -> anyhow::Result<Router> {
    let router = router
        // whole record
        .route(
            "/user/{user_id}",
            get(handlers::get_user).delete(handlers::delete_user),
        )
        .route("/clear_all/{user_id}", post(handlers::clear_all))
        // profile
        .route(
            "/data_peek/{user_id}",
            get(handlers::get_profile).post(handlers::update_profile),
        )
        .route("/data_peek/{user_id}/clear", post(handlers::clear_profile))
        // note
        .route(
            "/note_peek/{user_id}",
            get(handlers::get_note).post(handlers::update_note),
        )
        .route("/note_peek/{user_id}/clear", post(handlers::clear_note))
        // screen
        .route(
            "/screen_peek/{user_id}",
            get(handlers::get_screen).post(handlers::update_screen).layer(
                DefaultBodyLimit::max(screen_body_limit(max_screenshot_bytes)),
            ),
        )
        .route("/screen_peek/{user_id}/clear", post(handlers::clear_screen))
        .route(
            "/screen_peek/{user_id}/screenshot",
            get(handlers::get_screenshot),
        )
        // command
        .route(
            "/commands/{user_id}",
            get(handlers::get_command).post(handlers::update_command),
        )
        .route("/commands/{user_id}/clear", post(handlers::clear_command))
        // push
        .route("/push/subscribe/{user_id}", post(handlers::subscribe))
        .route("/push/vapid_public_key", get(handlers::vapid_public_key))
        .layer(Extension(service))
        .layer(Extension(Arc::new(vapid)));

    Ok(router)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_limit_covers_base64_screenshot() {
        let max: usize = 10 * 1024 * 1024;
        let encoded_len = max.div_ceil(3) * 4;
        assert!(screen_body_limit(max) > encoded_len);
    }
}
