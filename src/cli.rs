use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cagnotte")]
#[command(author, version, about = "Telegram referral and rewards bot", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot in normal mode
    Run {
        /// Use webhook mode instead of long polling
        #[arg(long)]
        webhook: bool,
    },

    /// Insert or update a task users can complete for a reward
    AddTask {
        /// Opaque task identifier (must not contain '_')
        id: String,

        /// Link shown to users
        link: String,

        /// Reward in FCFA
        reward: i64,

        /// Selection priority (higher offered first)
        #[arg(long, default_value_t = 0)]
        priority: i64,

        /// Check completion via live channel membership instead of a join request
        #[arg(long)]
        membership: bool,

        /// Channel the task points at (chat id)
        #[arg(long)]
        chat_id: Option<i64>,
    },

    /// List configured tasks
    ListTasks,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
