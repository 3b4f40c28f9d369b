pub mod card_ideas;
pub mod prepare_dataset;
pub mod run_evals;
