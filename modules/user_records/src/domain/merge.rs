//! Field-level merge of partial updates into a stored record.

use crate::contract::model::{
    CommandPatch, NotePatch, ProfilePatch, ScreenPatch, Split, SplitPatch, UserRecord,
};

pub fn apply(record: &mut UserRecord, patch: SplitPatch) {
    match patch {
        SplitPatch::Profile(p) => apply_profile(record, p),
        SplitPatch::Note(p) => apply_note(record, p),
        SplitPatch::Screen(p) => apply_screen(record, p),
        SplitPatch::Command(p) => apply_command(record, p),
    }
}

fn apply_profile(record: &mut UserRecord, p: ProfilePatch) {
    let profile = &mut record.profile;
    p.first_name.apply_to(&mut profile.first_name);
    p.last_name.apply_to(&mut profile.last_name);
    p.job_title.apply_to(&mut profile.job_title);
    p.phone_number.apply_to(&mut profile.phone_number);
    p.birthday.apply_to(&mut profile.birthday);
    p.address.apply_to(&mut profile.address);
}

fn apply_note(record: &mut UserRecord, p: NotePatch) {
    p.note_name.apply_to(&mut record.note.note_name);
    p.note_body.apply_to(&mut record.note.note_body);
}

fn apply_screen(record: &mut UserRecord, p: ScreenPatch) {
    p.contact.apply_to(&mut record.screen.contact);
    p.url.apply_to(&mut record.screen.url);
}

fn apply_command(record: &mut UserRecord, p: CommandPatch) {
    p.command.apply_to(&mut record.command);
}

/// Null every field of `split`.
///
/// The screen split's `screenshot_ref` is nulled too; removing the asset
/// itself is the caller's job.
pub fn clear(record: &mut UserRecord, split: Split) {
    match split {
        Split::Profile => record.profile = Default::default(),
        Split::Note => record.note = Default::default(),
        Split::Screen => record.screen = Default::default(),
        Split::Command => record.command = None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::Patch;

    #[test]
    fn absent_fields_are_untouched() {
        let mut r = UserRecord::empty("Jordan");
        r.profile.first_name = Some("Jordan".into());
        r.profile.last_name = Some("Lee".into());

        apply(
            &mut r,
            SplitPatch::Profile(ProfilePatch {
                job_title: Patch::Value("Magician".into()),
                last_name: Patch::Null,
                ..Default::default()
            }),
        );

        assert_eq!(r.profile.first_name.as_deref(), Some("Jordan"));
        assert_eq!(r.profile.last_name, None);
        assert_eq!(r.profile.job_title.as_deref(), Some("Magician"));
    }

    #[test]
    fn empty_string_is_a_value() {
        let mut r = UserRecord::empty("Jordan");
        r.note.note_body = Some("body".into());
        apply(
            &mut r,
            SplitPatch::Note(NotePatch {
                note_body: Patch::Value(String::new()),
                ..Default::default()
            }),
        );
        assert_eq!(r.note.note_body.as_deref(), Some(""));
    }

    #[test]
    fn clear_touches_one_split_only() {
        let mut r = UserRecord::empty("Jordan");
        r.command = Some("open".into());
        r.screen.url = Some("https://example.com".into());
        r.screen.screenshot_ref = Some("abc".into());

        clear(&mut r, Split::Screen);

        assert_eq!(r.screen, Default::default());
        assert_eq!(r.command.as_deref(), Some("open"));
    }
}
