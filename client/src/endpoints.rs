//! REST paths, relative to the API base URL.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left alone by a URI component encoder.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub const TUTOR: &str = "/tutors/:id";
pub const STUDENT: &str = "/students/:id";
pub const ATTENDANCE: &str = "/tutors/attendance";
pub const BUTTON_STATUS: &str = "/attendance/buttonStatus";
pub const ATTENDANCE_RECENT: &str = "/attendance/recent";
pub const ANNOUNCEMENTS: &str = "/announcements/";
pub const VERSION_CHECK: &str = "/native/version-check";
pub const STUDENT_SUBJECTS_BY_STUDENT: &str = "/student-subjects/student/:studentId";
pub const STUDENT_SUBJECT_UPDATE: &str = "/student-subjects/update/:studentId/:subjectId";
pub const STUDENT_SUBJECT_DELETE_MARK: &str = "/student-subjects/delete/:markId/:subjectId";
pub const STUDENT_SUBJECT_ADD_MARKS: &str = "/student-subjects/marks/:studentId/:subjectId";

/// Substitutes `:name` placeholders with percent-encoded values. Unknown names
/// become empty segments.
pub fn build_path(template: &str, params: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    for (i, segment) in template.split('/').enumerate() {
        if i > 0 {
            out.push('/');
        }
        match segment.strip_prefix(':') {
            Some(name) => {
                let value = params
                    .iter()
                    .find(|(k, _)| *k == name)
                    .map(|(_, v)| *v)
                    .unwrap_or_default();
                out.extend(utf8_percent_encode(value, COMPONENT));
            }
            None => out.push_str(segment),
        }
    }
    out
}
