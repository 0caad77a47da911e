use clap::Args;

/// Stderr logging flags shared by all commands.
#[derive(Args, Debug)]
pub struct LogArgs {
    /// Increase log verbosity.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Silence all log output.
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,
}

impl LogArgs {
    /// Initialize stderr logging at `base_verbosity` plus any `-v` flags.
    pub fn setup_logging(
        &self,
        base_verbosity: usize,
    ) -> anyhow::Result<()> {
        stderrlog::new()
            .quiet(self.quiet)
            .verbosity(base_verbosity + self.verbose as usize)
            .timestamp(stderrlog::Timestamp::Off)
            .init()?;
        Ok(())
    }
}
