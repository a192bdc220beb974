use utoipa::OpenApi;

use crate::api::rest::{dto, handlers};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_user,
        handlers::delete_user,
        handlers::clear_all,
        handlers::get_profile,
        handlers::update_profile,
        handlers::clear_profile,
        handlers::get_note,
        handlers::update_note,
        handlers::clear_note,
        handlers::get_screen,
        handlers::update_screen,
        handlers::clear_screen,
        handlers::get_screenshot,
        handlers::get_command,
        handlers::update_command,
        handlers::clear_command,
        handlers::subscribe,
        handlers::vapid_public_key,
    ),
    components(schemas(
        dto::UserRecordDto,
        dto::ProfileDto,
        dto::NoteDto,
        dto::ScreenDto,
        dto::CommandDto,
        dto::UpdateProfileReq,
        dto::UpdateNoteReq,
        dto::UpdateScreenReq,
        dto::UpdateCommandReq,
        dto::SubscribeReq,
        dto::PushSubscriptionDto,
        dto::PushKeysDto,
        dto::StatusDto,
        dto::VapidKeyDto,
        modkit::Problem,
        modkit::ValidationError,
    )),
    tags(
        (name = "records", description = "Whole-record operations"),
        (name = "profile", description = "Profile split (data_peek)"),
        (name = "note", description = "Note split (note_peek)"),
        (name = "screen", description = "Screen split (screen_peek)"),
        (name = "command", description = "Command split (commands)"),
        (name = "push", description = "Web Push subscriptions")
    )
)]
pub struct UserRecordsApiDoc;
