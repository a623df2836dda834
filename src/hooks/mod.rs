//! Extension hooks: the plugin trait, ordered plugin sets and the dispatcher.

mod builtin;
mod dispatcher;
mod plugin;

pub use builtin::{resolve_plugins, ConnectionLogPlugin, TeamActivityPlugin, UnknownPlugin};
pub use dispatcher::{DispatchReport, Hook, HookDispatcher};
pub use plugin::{BotPlugin, PluginSet};
