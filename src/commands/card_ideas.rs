use anyhow::Result;
use tracing::info;

use crate::cli::CardIdeasArgs;
use crate::ideas::IdeaGenerator;

pub fn run(args: CardIdeasArgs) -> Result<()> {
    let mut generator = IdeaGenerator::new(args.seed);
    for (index, idea) in generator.ideas(args.count).iter().enumerate() {
        println!("{}. {}", index + 1, idea.render());
    }
    info!(count = args.count, seeded = args.seed.is_some(), "card ideas generated");
    Ok(())
}
