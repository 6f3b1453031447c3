//! Trace identifiers for one engine pass.

use derive_more::Display;
use uuid::Uuid;

/// Tags every descriptor built in one engine pass, under
/// [`TRACE_TAG`](crate::descriptor::TRACE_TAG).
///
/// UUIDv7, so ids from later passes sort after earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display("{_0}")]
pub struct TraceId(Uuid);

impl TraceId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_id_renders_as_v7_uuid() {
        let rendered = TraceId::new().to_string();
        let uuid = Uuid::parse_str(&rendered).unwrap();
        assert_eq!(uuid.get_version_num(), 7);
        assert_eq!(rendered, uuid.hyphenated().to_string());
    }

    #[test]
    fn test_trace_ids_are_unique() {
        assert_ne!(TraceId::new(), TraceId::new());
    }
}
