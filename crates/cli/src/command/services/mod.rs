mod capabilities;
mod suggest;
mod tree;

use crate::command::domain::ResponseMeta;
use anyhow::Result;
use drilldown_protocol::CommandAction;
use drilldown_tree::{TreeBuilder, TreeProfile};
use serde_json::Value;

pub(crate) use suggest::suggest;
pub(crate) use tree::{build, navigate};

pub struct Services {
    builder: TreeBuilder,
}

impl Services {
    pub fn new(profile: TreeProfile) -> Self {
        Self {
            builder: TreeBuilder::new(profile),
        }
    }

    pub fn profile_name(&self) -> &str {
        self.builder.profile().name()
    }

    pub fn meta(&self, action: CommandAction) -> ResponseMeta {
        ResponseMeta {
            action: Some(action),
            profile: Some(self.profile_name().to_string()),
            duration_ms: 0,
        }
    }

    pub fn route(&self, action: CommandAction, payload: Value) -> Result<Value> {
        match action {
            CommandAction::Capabilities => capabilities::run(),
            CommandAction::Build => to_value(build(&self.builder, serde_json::from_value(payload)?)?),
            CommandAction::Navigate => {
                to_value(navigate(&self.builder, serde_json::from_value(payload)?)?)
            }
            CommandAction::Suggest => to_value(suggest(serde_json::from_value(payload)?)),
        }
    }
}

fn to_value<T: serde::Serialize>(output: T) -> Result<Value> {
    serde_json::to_value(output).map_err(Into::into)
}
