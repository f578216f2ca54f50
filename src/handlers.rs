// Framework-facing handlers: the link trigger and the admin commands

use std::sync::Arc;

use crate::chat::{ChatEvent, ChatSink};
use crate::config::Config;
use crate::downloader::orchestrator::Orchestrator;
use crate::downloader::traits::VideoProvider;
use crate::policy::PolicyStore;

/// Prefix the host registers the admin commands under.
pub const COMMAND_PREFIX: &str = "ytdl";
pub const CMD_SET_PROXY: &str = "proxy";
pub const CMD_SET_TIMEOUT: &str = "timeout";
pub const CMD_BAN_USER: &str = "ban";
pub const CMD_UNBAN_USER: &str = "unban";

/// Registration help text for the host framework.
pub const USAGE: &str = "\
Detects YouTube links and downloads the video.
Admin commands (privileged callers only, with the command prefix):
ytdl proxy [address] - set or clear the proxy
ytdl timeout [seconds] - set or reset the cleanup timeout
ytdl ban [user id] - add a user to the denylist
ytdl unban [user id] - remove a user from the denylist";

/// Plugin facade. The host adapter owns one of these and routes
/// trigger-matched messages and admin commands into it; privilege gating
/// for the admin commands stays on the host side.
pub struct TubeFetch {
    orchestrator: Orchestrator,
    policy: PolicyStore,
}

impl TubeFetch {
    pub fn new(
        config: Config,
        provider: Arc<dyn VideoProvider>,
        sink: Arc<dyn ChatSink>,
        self_id: impl Into<String>,
    ) -> Self {
        let policy = PolicyStore::new(config.into_policy());
        let orchestrator = Orchestrator::new(provider, sink, policy.clone(), self_id);
        Self {
            orchestrator,
            policy,
        }
    }

    pub fn policy(&self) -> &PolicyStore {
        &self.policy
    }

    /// Handler for messages matching
    /// [`TRIGGER_PATTERN`](crate::downloader::extract::TRIGGER_PATTERN).
    pub async fn on_message(&self, event: &ChatEvent) {
        self.orchestrator
            .handle_message(&event.text, &event.user_id)
            .await;
    }

    /// `ytdl proxy` - empty argument clears the proxy.
    pub async fn on_set_proxy(&self, arg: &str) -> String {
        match self.policy.set_proxy(arg).await {
            Ok(msg) => msg,
            Err(e) => format!("Failed to set proxy: {}", e),
        }
    }

    /// `ytdl timeout` - empty argument restores the default.
    pub async fn on_set_timeout(&self, arg: &str) -> String {
        match self.policy.set_timeout(arg).await {
            Ok(msg) => msg,
            Err(e) => format!("Failed to set timeout: {}", e),
        }
    }

    /// `ytdl ban`
    pub async fn on_ban_user(&self, arg: &str) -> String {
        match self.policy.ban_user(arg).await {
            Ok(msg) => msg,
            Err(e) => format!("Failed to ban user: {}", e),
        }
    }

    /// `ytdl unban`
    pub async fn on_unban_user(&self, arg: &str) -> String {
        match self.policy.unban_user(arg).await {
            Ok(msg) => msg,
            Err(e) => format!("Failed to unban user: {}", e),
        }
    }
}
