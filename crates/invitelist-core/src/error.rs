use std::fmt;

/// How a caller should surface an error: bad input, forbidden, missing, or
/// an internal fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Caller supplied input that failed validation (400-class).
    Validation,
    /// Caller is not allowed to perform the action (403-class).
    Authorization,
    /// The addressed record does not exist (404-class).
    NotFound,
    /// Storage, transport, or collaborator failure (500-class).
    Internal,
}

/// Machine-readable error codes for invitation list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    WorklistTooLarge,
    WorklistEmpty,
    InvalidTitles,
    NonexistentPages,
    NonMainspacePages,
    EmptyListName,
    ListNameTooLong,
    InvalidEventPage,
    EventDeleted,
    EventEnded,
    PermissionDenied,
    NotOrganizer,
    ListNotFound,
    InvalidStatusTransition,
    UnsupportedPayloadVersion,
    MalformedPayload,
    MissingJobParameter,
    StorageFailure,
    CollaboratorFailure,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::WorklistTooLarge => "E1001",
            Self::WorklistEmpty => "E1002",
            Self::InvalidTitles => "E1003",
            Self::NonexistentPages => "E1004",
            Self::NonMainspacePages => "E1005",
            Self::EmptyListName => "E1101",
            Self::ListNameTooLong => "E1102",
            Self::InvalidEventPage => "E1103",
            Self::EventDeleted => "E1104",
            Self::EventEnded => "E1105",
            Self::PermissionDenied => "E2001",
            Self::NotOrganizer => "E2002",
            Self::ListNotFound => "E3001",
            Self::InvalidStatusTransition => "E3002",
            Self::UnsupportedPayloadVersion => "E4001",
            Self::MalformedPayload => "E4002",
            Self::MissingJobParameter => "E4003",
            Self::StorageFailure => "E5001",
            Self::CollaboratorFailure => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and responses.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::WorklistTooLarge => "Worklist has too many pages",
            Self::WorklistEmpty => "Worklist is empty",
            Self::InvalidTitles => "Worklist contains invalid titles",
            Self::NonexistentPages => "Worklist contains pages that do not exist",
            Self::NonMainspacePages => "Worklist contains pages outside the main namespace",
            Self::EmptyListName => "Invitation list name is empty",
            Self::ListNameTooLong => "Invitation list name is too long",
            Self::InvalidEventPage => "Event page is not a valid event",
            Self::EventDeleted => "Event has been deleted",
            Self::EventEnded => "Event has already ended",
            Self::PermissionDenied => "Permission denied",
            Self::NotOrganizer => "Requester is not an organizer of the event",
            Self::ListNotFound => "Invitation list not found",
            Self::InvalidStatusTransition => "Invalid status transition",
            Self::UnsupportedPayloadVersion => "Unsupported job payload version",
            Self::MalformedPayload => "Malformed job payload",
            Self::MissingJobParameter => "Missing job parameter",
            Self::StorageFailure => "Storage failure",
            Self::CollaboratorFailure => "External service failure",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to callers.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::WorklistTooLarge => Some("Split the worklist into smaller lists."),
            Self::WorklistEmpty => Some("Add at least one page title to the worklist."),
            Self::InvalidTitles | Self::NonexistentPages => {
                Some("Check the spelling of the listed titles.")
            }
            Self::NonMainspacePages => Some("Only articles in the main namespace can be used."),
            Self::EmptyListName => Some("Give the invitation list a name."),
            Self::ListNameTooLong => Some("Use a shorter invitation list name."),
            Self::InvalidEventPage => Some("Use the title of a page with an event registration."),
            Self::EventEnded => Some("Invitation lists can only be created for upcoming events."),
            Self::NotOrganizer => Some("Ask an organizer of the event to create the list."),
            Self::UnsupportedPayloadVersion => {
                Some("Drain the queue with a build that understands this payload version.")
            }
            Self::StorageFailure | Self::CollaboratorFailure | Self::InternalUnexpected => {
                Some("Retry once. If persistent, report a bug with logs.")
            }
            Self::EventDeleted
            | Self::PermissionDenied
            | Self::ListNotFound
            | Self::InvalidStatusTransition
            | Self::MalformedPayload
            | Self::MissingJobParameter => None,
        }
    }

    /// Response class for this code.
    #[must_use]
    pub const fn class(self) -> ErrorClass {
        match self {
            Self::WorklistTooLarge
            | Self::WorklistEmpty
            | Self::InvalidTitles
            | Self::NonexistentPages
            | Self::NonMainspacePages
            | Self::EmptyListName
            | Self::ListNameTooLong
            | Self::InvalidEventPage
            | Self::EventDeleted
            | Self::EventEnded => ErrorClass::Validation,
            Self::PermissionDenied | Self::NotOrganizer => ErrorClass::Authorization,
            Self::ListNotFound => ErrorClass::NotFound,
            Self::InvalidStatusTransition
            | Self::UnsupportedPayloadVersion
            | Self::MalformedPayload
            | Self::MissingJobParameter
            | Self::StorageFailure
            | Self::CollaboratorFailure
            | Self::InternalUnexpected => ErrorClass::Internal,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorClass, ErrorCode};
    use std::collections::HashSet;

    const ALL: [ErrorCode; 20] = [
        ErrorCode::WorklistTooLarge,
        ErrorCode::WorklistEmpty,
        ErrorCode::InvalidTitles,
        ErrorCode::NonexistentPages,
        ErrorCode::NonMainspacePages,
        ErrorCode::EmptyListName,
        ErrorCode::ListNameTooLong,
        ErrorCode::InvalidEventPage,
        ErrorCode::EventDeleted,
        ErrorCode::EventEnded,
        ErrorCode::PermissionDenied,
        ErrorCode::NotOrganizer,
        ErrorCode::ListNotFound,
        ErrorCode::InvalidStatusTransition,
        ErrorCode::UnsupportedPayloadVersion,
        ErrorCode::MalformedPayload,
        ErrorCode::MissingJobParameter,
        ErrorCode::StorageFailure,
        ErrorCode::CollaboratorFailure,
        ErrorCode::InternalUnexpected,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ALL {
            let code = code.code();
            assert_eq!(code.len(), 5);
            assert!(code.starts_with('E'));
            assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn permission_errors_are_distinct_from_validation() {
        assert_eq!(ErrorCode::PermissionDenied.class(), ErrorClass::Authorization);
        assert_eq!(ErrorCode::NotOrganizer.class(), ErrorClass::Authorization);
        assert_eq!(ErrorCode::EmptyListName.class(), ErrorClass::Validation);
        assert_eq!(ErrorCode::ListNotFound.class(), ErrorClass::NotFound);
    }
}
