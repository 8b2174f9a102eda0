use bacnode_core::types::{ErrorClass, ErrorCode, ObjectId, ObjectType, PropertyId};
use bacnode_core::{DecodeError, EncodeError};
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a property access, mapped onto a BACnet error class/code pair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertyError {
    #[error("unknown object {0}")]
    UnknownObject(ObjectId),
    #[error("unknown property {0}")]
    UnknownProperty(PropertyId),
    #[error("unsupported object type {0}")]
    UnsupportedObjectType(ObjectType),
    #[error("object {0} already exists")]
    ObjectIdentifierAlreadyExists(ObjectId),
    #[error("invalid data type")]
    InvalidDataType,
    #[error("value out of range")]
    ValueOutOfRange,
    #[error("write access denied")]
    WriteAccessDenied,
    #[error("property is not an array")]
    PropertyIsNotAnArray,
    #[error("invalid array index")]
    InvalidArrayIndex,
    #[error("invalid time stamp")]
    InvalidTimeStamp,
    #[error("invalid event state")]
    InvalidEventState,
    #[error("duplicate object name {0:?}")]
    DuplicateName(String),
    #[error("no space to write property")]
    NoSpaceToWriteProperty,
    #[error("character set not supported")]
    CharacterSetNotSupported,
    #[error("no free instance for {0}")]
    NoFreeInstance(ObjectType),
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
}

impl PropertyError {
    pub fn error_class(&self) -> ErrorClass {
        match self {
            Self::UnknownObject(_)
            | Self::UnsupportedObjectType(_)
            | Self::ObjectIdentifierAlreadyExists(_) => ErrorClass::Object,
            Self::InvalidTimeStamp | Self::InvalidEventState => ErrorClass::Services,
            Self::NoSpaceToWriteProperty | Self::NoFreeInstance(_) | Self::Encode(_) => {
                ErrorClass::Resources
            }
            _ => ErrorClass::Property,
        }
    }

    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnknownObject(_) => ErrorCode::UnknownObject,
            Self::UnknownProperty(_) => ErrorCode::UnknownProperty,
            Self::UnsupportedObjectType(_) => ErrorCode::UnsupportedObjectType,
            Self::ObjectIdentifierAlreadyExists(_) => ErrorCode::ObjectIdentifierAlreadyExists,
            Self::InvalidDataType => ErrorCode::InvalidDataType,
            Self::ValueOutOfRange => ErrorCode::ValueOutOfRange,
            Self::WriteAccessDenied => ErrorCode::WriteAccessDenied,
            Self::PropertyIsNotAnArray => ErrorCode::PropertyIsNotAnArray,
            Self::InvalidArrayIndex => ErrorCode::InvalidArrayIndex,
            Self::InvalidTimeStamp => ErrorCode::InvalidTimeStamp,
            Self::InvalidEventState => ErrorCode::InvalidEventState,
            Self::DuplicateName(_) => ErrorCode::DuplicateName,
            Self::NoSpaceToWriteProperty => ErrorCode::NoSpaceToWriteProperty,
            Self::CharacterSetNotSupported => ErrorCode::CharacterSetNotSupported,
            Self::NoFreeInstance(_) | Self::Encode(_) => ErrorCode::Other,
        }
    }
}

/// Malformed request data reads as an out-of-range value; only a foreign
/// character set keeps its own code.
impl From<DecodeError> for PropertyError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::UnsupportedCharacterSet => Self::CharacterSetNotSupported,
            _ => Self::ValueOutOfRange,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{package}:{line}: {message}")]
    Parse {
        package: String,
        line: usize,
        message: String,
    },
    #[error("invalid {package}.{section}.{option} value {value:?}")]
    InvalidValue {
        package: String,
        section: String,
        option: String,
        value: String,
    },
    #[error("section {section:?} of {package} does not name an instance")]
    InvalidSection { package: String, section: String },
}
