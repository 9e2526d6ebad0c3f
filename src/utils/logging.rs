use serde::Serialize;
use tracing::Level;

/// Pretty JSON rendering of `value`, or `None` when DEBUG is off for the caller.
pub(crate) fn pretty_json_if_debug<T: Serialize>(value: &T) -> Option<String> {
    if !tracing::enabled!(Level::DEBUG) {
        return None;
    }
    Some(
        serde_json::to_string_pretty(value)
            .unwrap_or_else(|error| format!("<pretty serialize failed: {error}>")),
    )
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn renders_only_when_debug_is_enabled() {
        let props = BTreeMap::from([("schema.ddl_auto", "create")]);
        assert!(pretty_json_if_debug(&props).is_none());

        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_test_writer()
            .finish();
        let rendered =
            tracing::subscriber::with_default(subscriber, || pretty_json_if_debug(&props))
                .expect("debug enabled");
        assert!(rendered.contains("\"schema.ddl_auto\": \"create\""), "{rendered}");
    }
}
