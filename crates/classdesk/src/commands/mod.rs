//! Command handlers. Each takes the dashboard built for the active
//! profile plus its parsed arguments.

pub mod read;
pub mod resources;
pub mod run;
pub mod session;

use classdesk_core::Dashboard;

use crate::cli::{Command, GlobalOpts};
use crate::config::ActiveProfile;
use crate::error::CliError;

/// Per-invocation context shared by handlers.
pub struct Ctx<'a> {
    pub global: &'a GlobalOpts,
    pub active: &'a ActiveProfile,
}

impl Ctx<'_> {
    pub fn profile(&self) -> &str {
        &self.active.name
    }

    pub fn print<T: serde::Serialize + ?Sized>(&self, data: &T) {
        let rendered = crate::output::render(&self.global.output, data);
        crate::output::print_output(&rendered, self.global.quiet);
    }
}

/// Route a command that needs a dashboard.
pub async fn dispatch(cmd: Command, dashboard: &Dashboard, ctx: &Ctx<'_>) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => session::login(args, dashboard, ctx).await,
        Command::Logout => {
            session::logout(dashboard, ctx);
            Ok(())
        }
        Command::Refresh => session::refresh(dashboard, ctx).await,
        Command::Status => {
            session::status(dashboard, ctx);
            Ok(())
        }
        Command::Read(args) => read::handle(args, dashboard, ctx).await,
        Command::Run(args) => run::handle(args, dashboard, ctx).await,
        // Resources and Completions are handled before dispatch
        Command::Resources | Command::Completions(_) => unreachable!(),
    }
}
