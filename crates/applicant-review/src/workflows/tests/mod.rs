mod allocation;
mod analytics;
mod common;
