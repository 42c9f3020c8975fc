use anyhow::Result;
use drilldown_protocol::{
    Capabilities, CapabilitiesServer, CommandAction, CAPABILITIES_SCHEMA_VERSION,
    DEFAULT_PAGE_SIZE,
};
use serde_json::Value;

pub(super) fn run() -> Result<Value> {
    let output = Capabilities {
        schema_version: CAPABILITIES_SCHEMA_VERSION,
        server: CapabilitiesServer {
            name: "drilldown".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        actions: CommandAction::ALL.to_vec(),
        profiles: vec!["default".to_string(), "grievances".to_string()],
        default_page_size: DEFAULT_PAGE_SIZE,
    };
    serde_json::to_value(output).map_err(Into::into)
}
