mod build;
mod encode;

pub use build::BuildArgs;
pub use encode::EncodeArgs;

/// Subcommands.
#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Learn a subword dictionary from tokenized corpora.
    Build(BuildArgs),

    /// Encode parallel corpora with a learned dictionary.
    Encode(EncodeArgs),
}

impl Commands {
    pub fn run(&self) -> anyhow::Result<()> {
        match self {
            Commands::Build(args) => args.run(),
            Commands::Encode(args) => args.run(),
        }
    }
}
