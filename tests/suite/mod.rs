mod cli;
mod persistence;
mod workflow;
