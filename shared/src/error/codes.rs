//! Unified error codes for the zone navigation server
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Validation errors (geometry, navigation parameters, bindings)
//! - 2xxx: Not-found errors
//! - 3xxx: External process errors (detection)
//! - 4xxx: Storage errors (image store)
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so the frontend can switch on
/// them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Validation ====================
    /// Polygon point has an unrecognized shape
    InvalidGeometry = 1001,
    /// Polygon has fewer than three points
    PolygonTooFewPoints = 1002,
    /// Polygon area is below the minimum zone area
    PolygonDegenerate = 1003,
    /// Navigation level is missing a required identifier
    MissingNavigationParameter = 1004,
    /// Entity is already bound to another zone of the same type
    DuplicateEntityBinding = 1005,
    /// Bound entity kind does not match the zone type
    EntityKindMismatch = 1006,
    /// Zone type does not allow the given building context
    InvalidZoneContext = 1007,
    /// Viewbox is not a list of numbers
    InvalidViewbox = 1008,
    /// Uploaded file format is not supported
    UnsupportedImageFormat = 1009,
    /// Uploaded file exceeds the size limit
    FileTooLarge = 1010,
    /// Template replication request is invalid
    InvalidTemplate = 1011,

    // ==================== 2xxx: Not found ====================
    /// Project not found
    ProjectNotFound = 2001,
    /// Building not found
    BuildingNotFound = 2002,
    /// Apartment not found
    ApartmentNotFound = 2003,
    /// Zone not found
    ZoneNotFound = 2004,
    /// Zone image not found
    ZoneImageNotFound = 2005,

    // ==================== 3xxx: External process ====================
    /// Detection process failed or produced invalid output
    DetectionFailed = 3001,
    /// Detection process exceeded its timeout
    DetectionTimeout = 3002,

    // ==================== 4xxx: Storage ====================
    /// Storing or deleting an image object failed
    ImageStorageFailed = 4001,
    /// Image slot replacement failed mid-operation
    ImageReplaceFailed = 4002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            Self::Success => "Success",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",
            Self::RequiredField => "Required field missing",
            Self::ValueOutOfRange => "Value out of range",

            // Validation
            Self::InvalidGeometry => "Polygon point is neither [x, y] nor {x, y}",
            Self::PolygonTooFewPoints => "Polygon needs at least three points",
            Self::PolygonDegenerate => "Polygon area is too small",
            Self::MissingNavigationParameter => "Navigation level is missing a required parameter",
            Self::DuplicateEntityBinding => "Entity is already bound to another zone",
            Self::EntityKindMismatch => "Bound entity does not match the zone type",
            Self::InvalidZoneContext => "Zone context is invalid for this zone type",
            Self::InvalidViewbox => "Viewbox must contain numeric components",
            Self::UnsupportedImageFormat => "Unsupported image format",
            Self::FileTooLarge => "File is too large",
            Self::InvalidTemplate => "Template replication request is invalid",

            // Not found
            Self::ProjectNotFound => "Project not found",
            Self::BuildingNotFound => "Building not found",
            Self::ApartmentNotFound => "Apartment not found",
            Self::ZoneNotFound => "Zone not found",
            Self::ZoneImageNotFound => "Zone image not found",

            // External process
            Self::DetectionFailed => "Zone detection failed",
            Self::DetectionTimeout => "Zone detection timed out",

            // Storage
            Self::ImageStorageFailed => "Image storage failed",
            Self::ImageReplaceFailed => "Image replacement failed",

            // System
            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
            Self::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

/// Error returned when converting an unknown u16 into an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Success),
            1 => Ok(Self::Unknown),
            2 => Ok(Self::ValidationFailed),
            3 => Ok(Self::NotFound),
            4 => Ok(Self::AlreadyExists),
            5 => Ok(Self::InvalidRequest),
            7 => Ok(Self::RequiredField),
            8 => Ok(Self::ValueOutOfRange),

            1001 => Ok(Self::InvalidGeometry),
            1002 => Ok(Self::PolygonTooFewPoints),
            1003 => Ok(Self::PolygonDegenerate),
            1004 => Ok(Self::MissingNavigationParameter),
            1005 => Ok(Self::DuplicateEntityBinding),
            1006 => Ok(Self::EntityKindMismatch),
            1007 => Ok(Self::InvalidZoneContext),
            1008 => Ok(Self::InvalidViewbox),
            1009 => Ok(Self::UnsupportedImageFormat),
            1010 => Ok(Self::FileTooLarge),
            1011 => Ok(Self::InvalidTemplate),

            2001 => Ok(Self::ProjectNotFound),
            2002 => Ok(Self::BuildingNotFound),
            2003 => Ok(Self::ApartmentNotFound),
            2004 => Ok(Self::ZoneNotFound),
            2005 => Ok(Self::ZoneImageNotFound),

            3001 => Ok(Self::DetectionFailed),
            3002 => Ok(Self::DetectionTimeout),

            4001 => Ok(Self::ImageStorageFailed),
            4002 => Ok(Self::ImageReplaceFailed),

            9001 => Ok(Self::InternalError),
            9002 => Ok(Self::DatabaseError),
            9003 => Ok(Self::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}
