//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::ProjectNotFound
            | Self::BuildingNotFound
            | Self::ApartmentNotFound
            | Self::ZoneNotFound
            | Self::ZoneImageNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists | Self::DuplicateEntityBinding => StatusCode::CONFLICT,

            // 413 Payload Too Large
            Self::FileTooLarge => StatusCode::PAYLOAD_TOO_LARGE,

            // 422 Unprocessable Entity (well-formed request, unusable geometry)
            Self::InvalidGeometry
            | Self::PolygonTooFewPoints
            | Self::PolygonDegenerate
            | Self::EntityKindMismatch
            | Self::InvalidZoneContext
            | Self::InvalidTemplate => StatusCode::UNPROCESSABLE_ENTITY,

            // 502 Bad Gateway (external process misbehaved)
            Self::DetectionFailed => StatusCode::BAD_GATEWAY,

            // 504 Gateway Timeout
            Self::DetectionTimeout => StatusCode::GATEWAY_TIMEOUT,

            // 500 Internal Server Error
            Self::Unknown
            | Self::ImageStorageFailed
            | Self::ImageReplaceFailed
            | Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for request-shape errors)
            Self::ValidationFailed
            | Self::InvalidRequest
            | Self::RequiredField
            | Self::ValueOutOfRange
            | Self::MissingNavigationParameter
            | Self::InvalidViewbox
            | Self::UnsupportedImageFormat => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(ErrorCode::Success.http_status(), StatusCode::OK);
        assert_eq!(
            ErrorCode::MissingNavigationParameter.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::PolygonTooFewPoints.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ErrorCode::BuildingNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::DuplicateEntityBinding.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::DetectionTimeout.http_status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ErrorCode::ImageReplaceFailed.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
