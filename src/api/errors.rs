use crate::types::errors::ErrorKind;

// Stable identifiers for reporting layers; keep SCREAMING_SNAKE_CASE to match emitted IDs.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorId {
    E_NOT_FOUND,
    E_IO,
    E_LOGIC,
}

#[must_use]
pub const fn id_for(kind: ErrorKind) -> ErrorId {
    match kind {
        ErrorKind::NotFound => ErrorId::E_NOT_FOUND,
        ErrorKind::Io => ErrorId::E_IO,
        ErrorKind::Logic => ErrorId::E_LOGIC,
    }
}

#[must_use]
pub const fn id_str(id: ErrorId) -> &'static str {
    match id {
        ErrorId::E_NOT_FOUND => "E_NOT_FOUND",
        ErrorId::E_IO => "E_IO",
        ErrorId::E_LOGIC => "E_LOGIC",
    }
}
