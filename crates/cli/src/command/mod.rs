pub mod domain;
mod services;

pub use domain::{
    classify_error, BuildPayload, CommandRequest, CommandResponse, NavigatePayload,
    OptionEntry, SuggestPayload,
};

use drilldown_tree::TreeProfile;
use services::Services;
use std::time::Instant;

pub(crate) use services::{build, navigate, suggest};

pub struct CommandHandler {
    services: Services,
}

impl CommandHandler {
    pub fn new(profile: TreeProfile) -> Self {
        Self {
            services: Services::new(profile),
        }
    }

    pub fn execute(&self, request: CommandRequest) -> CommandResponse {
        let started = Instant::now();
        let CommandRequest { action, payload } = request;

        let mut meta = self.services.meta(action);
        let result = self.services.route(action, payload);
        meta.duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(data) => CommandResponse::ok(data, meta),
            Err(err) => {
                log::warn!("{} failed: {err:#}", action.as_str());
                let envelope = classify_error(&err, Some(self.services.profile_name()));
                CommandResponse::error(envelope, meta)
            }
        }
    }
}
