//! Constants and URI helpers for the booking service's REST dialect.
//!
//! # Design
//! Everything that is fixed by the server (header names, reserved JSON keys,
//! special-type tags, operation names, error codes, endpoint paths) lives
//! here so the codec, entity and query layers never spell a wire string
//! themselves.

use std::borrow::Cow;

pub const DEFAULT_HOST: &str = "http://localhost:8011";
pub const DEFAULT_PATH: &str = "/booked/Web/Services/index.php";

pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_USER_AGENT: &str = "User-Agent";
/// Carries the authenticated actor id.
pub const HEADER_USER_ID: &str = "X-Booked-UserId";
/// Carries the session token issued by the login endpoint.
pub const HEADER_SESSION_TOKEN: &str = "X-Booked-SessionToken";

pub const CONTENT_TYPE_JSON: &str = "application/json";

pub const KEY_CLASS_NAME: &str = "className";
pub const KEY_OBJECT_ID: &str = "id";
pub const KEY_CREATED_AT: &str = "createdAt";
pub const KEY_UPDATED_AT: &str = "updatedAt";
pub const KEY_USER_SESSION_TOKEN: &str = "sessionToken";
pub const KEY_USER_ID: &str = "userId";
pub const KEY_RESULTS: &str = "results";
pub const KEY_COUNT: &str = "count";
pub const KEY_CODE: &str = "code";
pub const KEY_ERROR: &str = "error";
pub const KEY_TYPE: &str = "__type";
pub const KEY_OP: &str = "__op";
pub const KEY_OBJECTS: &str = "objects";
pub const KEY_AMOUNT: &str = "amount";
pub const KEY_ISO: &str = "iso";
pub const KEY_BASE64: &str = "base64";
pub const KEY_LATITUDE: &str = "latitude";
pub const KEY_LONGITUDE: &str = "longitude";
pub const KEY_NAME: &str = "name";
pub const KEY_URL: &str = "url";

/// Keys that are never written back to the server as plain field values.
pub const RESERVED_KEYS: [&str; 5] = [
    KEY_CLASS_NAME,
    KEY_CREATED_AT,
    KEY_OBJECT_ID,
    KEY_UPDATED_AT,
    KEY_USER_SESSION_TOKEN,
];

pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

pub const OP_DELETE: &str = "Delete";
pub const OP_INCREMENT: &str = "Increment";
pub const OP_ADD: &str = "Add";
pub const OP_ADD_UNIQUE: &str = "AddUnique";
pub const OP_REMOVE: &str = "Remove";
pub const OP_ADD_RELATION: &str = "AddRelation";
pub const OP_REMOVE_RELATION: &str = "RemoveRelation";

/// The `{"__op": "Delete"}` marker sent for fields set to null.
pub fn delete_op() -> serde_json::Value {
    serde_json::json!({ KEY_OP: OP_DELETE })
}

pub const TYPE_OBJECT: &str = "Object";
pub const TYPE_POINTER: &str = "Pointer";
pub const TYPE_BYTES: &str = "Bytes";
pub const TYPE_DATE: &str = "Date";
pub const TYPE_GEOPOINT: &str = "GeoPoint";
pub const TYPE_FILE: &str = "File";
pub const TYPE_RELATION: &str = "Relation";

pub const CLASS_USER: &str = "user";
pub const CLASS_RESOURCE: &str = "resource";
pub const CLASS_RESERVATION: &str = "reservation";
pub const CLASS_ACCESSORY: &str = "accessory";

pub const ERROR_INTERNAL: i64 = 1;
pub const ERROR_OBJECT_NOT_FOUND_FOR_GET: i64 = 101;
pub const ERROR_TIMEOUT: i64 = 124;
pub const ERROR_EXCEEDED_BURST_LIMIT: i64 = 155;

/// Codes that make a failed call eligible for another attempt.
pub const RETRYABLE_CODES: [i64; 3] = [ERROR_INTERNAL, ERROR_TIMEOUT, ERROR_EXCEEDED_BURST_LIMIT];

pub const USER_LOGIN_URI: &str = "/Authentication/Authenticate";
pub const RESOURCE_STATUSES_URI: &str = "/Resources/Status";
pub const RESOURCE_STATUS_REASONS_URI: &str = "/Resources/Status/Reasons";
pub const RESOURCE_TYPES_URI: &str = "/Resources/Types";
pub const RESOURCE_AVAILABILITY_URI: &str = "/Resources/Availability";
pub const RESOURCE_GROUPS_URI: &str = "/Resources/Groups";

/// Percent-encode a single path segment.
fn segment(raw: &str) -> Cow<'_, str> {
    urlencoding::encode(raw)
}

pub fn class_uri(class_name: &str, object_id: Option<&str>) -> String {
    let class_name = segment(class_name);
    match object_id {
        Some(id) => format!("/classes/{class_name}/{}", segment(id)),
        None => format!("/classes/{class_name}"),
    }
}

fn fixed_uri(base: &str, object_id: Option<&str>) -> String {
    match object_id {
        Some(id) => format!("/{base}/{}", segment(id)),
        None => format!("/{base}/"),
    }
}

pub fn user_uri(user_id: Option<&str>) -> String {
    fixed_uri("Users", user_id)
}

pub fn resource_uri(resource_id: Option<&str>) -> String {
    fixed_uri("Resources", resource_id)
}

pub fn reservation_uri(reservation_id: Option<&str>) -> String {
    fixed_uri("Reservations", reservation_id)
}

pub fn accessory_uri(accessory_id: Option<&str>) -> String {
    fixed_uri("Accessories", accessory_id)
}

pub fn reservation_approval_uri(reservation_id: &str) -> String {
    format!("/Reservations/{}/Approval", segment(reservation_id))
}

pub fn file_uri(file_name: &str) -> String {
    format!("/files/{}", segment(file_name))
}

/// Route a class to its collection or instance endpoint. The booking
/// classes have fixed resource paths; everything else lives under
/// `/classes`.
pub fn entity_uri(class_name: &str, object_id: Option<&str>) -> String {
    match class_name {
        CLASS_USER => user_uri(object_id),
        CLASS_RESOURCE => resource_uri(object_id),
        CLASS_RESERVATION => reservation_uri(object_id),
        CLASS_ACCESSORY => accessory_uri(object_id),
        _ => class_uri(class_name, object_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_uri_with_and_without_id() {
        assert_eq!(class_uri("Room", None), "/classes/Room");
        assert_eq!(class_uri("Room", Some("a1")), "/classes/Room/a1");
    }

    #[test]
    fn booking_classes_use_fixed_paths() {
        assert_eq!(entity_uri(CLASS_USER, None), "/Users/");
        assert_eq!(entity_uri(CLASS_RESOURCE, Some("7")), "/Resources/7");
        assert_eq!(entity_uri(CLASS_RESERVATION, Some("r")), "/Reservations/r");
        assert_eq!(entity_uri(CLASS_ACCESSORY, None), "/Accessories/");
        assert_eq!(entity_uri("Room", Some("1")), "/classes/Room/1");
    }

    #[test]
    fn path_segments_are_percent_encoded() {
        assert_eq!(file_uri("my notes/v1.txt"), "/files/my%20notes%2Fv1.txt");
        assert_eq!(entity_uri("Room", Some("a b")), "/classes/Room/a%20b");
        assert_eq!(entity_uri(CLASS_USER, Some("x/y")), "/Users/x%2Fy");
        assert_eq!(reservation_approval_uri("r 1"), "/Reservations/r%201/Approval");
    }

    #[test]
    fn reserved_keys() {
        assert!(is_reserved_key("id"));
        assert!(is_reserved_key("sessionToken"));
        assert!(!is_reserved_key("title"));
    }

    #[test]
    fn delete_marker_shape() {
        assert_eq!(delete_op(), serde_json::json!({"__op": "Delete"}));
    }
}
